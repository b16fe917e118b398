use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::PgPool;
use stockroom_catalog::{LockedHandle, Price, Product, ProductId, ProductPatch};
use stockroom_core::repository::PatchProduct;
use stockroom_core::{InventoryStore, ProductRepository, StoreError, StoreResult, TransactionRunner};
use tracing::debug;

use crate::transaction::{map_sqlx, PgTransactionRunner, PgTx};

#[derive(Clone)]
pub struct PgProductRepository {
    pool: PgPool,
}

impl PgProductRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// Internal struct for type-safe querying
#[derive(sqlx::FromRow)]
struct ProductRow {
    id: String,
    name: String,
    description: String,
    price: Decimal,
    stock: i32,
}

impl TryFrom<ProductRow> for Product {
    type Error = StoreError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        let stock = u32::try_from(row.stock)
            .map_err(|_| StoreError::backend(format!("negative stock {} for product {}", row.stock, row.id)))?;
        Ok(Product {
            price: Price::new(row.price).map_err(StoreError::backend)?,
            id: ProductId::new(row.id),
            name: row.name,
            description: row.description,
            stock,
        })
    }
}

fn stock_column(stock: u32) -> StoreResult<i32> {
    i32::try_from(stock).map_err(|_| StoreError::backend(format!("stock {stock} exceeds column range")))
}

const SELECT_PRODUCT: &str = "SELECT id, name, description, price, stock FROM products";

#[async_trait]
impl InventoryStore<PgTx> for PgProductRepository {
    async fn get_for_update(&self, tx: &mut PgTx, id: &ProductId) -> StoreResult<LockedHandle<Product>> {
        let row = sqlx::query_as::<_, ProductRow>(&format!("{SELECT_PRODUCT} WHERE id = $1 FOR UPDATE"))
            .bind(id.as_str())
            .fetch_optional(&mut **tx)
            .await
            .map_err(map_sqlx)?
            .ok_or(StoreError::NotFound)?;

        debug!(product_id = %id, "row locked");
        Ok(LockedHandle::new(Product::try_from(row)?))
    }

    async fn save(&self, tx: &mut PgTx, product: LockedHandle<Product>) -> StoreResult<()> {
        let product = product.into_inner();
        let result = sqlx::query(
            r#"
            UPDATE products
            SET name = $2, description = $3, price = $4, stock = $5, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(product.id.as_str())
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price.amount())
        .bind(stock_column(product.stock)?)
        .execute(&mut **tx)
        .await
        .map_err(map_sqlx)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}

#[async_trait]
impl ProductRepository for PgProductRepository {
    async fn create_product(&self, product: &Product) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO products (id, name, description, price, stock)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(product.id.as_str())
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price.amount())
        .bind(stock_column(product.stock)?)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx)?;

        Ok(())
    }

    async fn get_product(&self, id: &ProductId) -> StoreResult<Option<Product>> {
        let row = sqlx::query_as::<_, ProductRow>(&format!("{SELECT_PRODUCT} WHERE id = $1"))
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx)?;

        row.map(Product::try_from).transpose()
    }

    async fn list_products(&self, limit: u32) -> StoreResult<Vec<Product>> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!("{SELECT_PRODUCT} ORDER BY created_at, id LIMIT $1"))
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx)?;

        rows.into_iter().map(Product::try_from).collect()
    }

    async fn update_product(&self, id: &ProductId, patch: &ProductPatch) -> StoreResult<Product> {
        PgTransactionRunner::new(self.pool.clone())
            .run_in_transaction(PatchProduct {
                inventory: self,
                id,
                patch,
            })
            .await
    }

    async fn delete_product(&self, id: &ProductId) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id.as_str())
            .execute(&self.pool)
            .await
            .map_err(map_sqlx)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}
