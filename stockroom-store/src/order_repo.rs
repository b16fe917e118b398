use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use stockroom_catalog::{ProductId, Quantity};
use stockroom_core::{OrderRepository, OrderStore, StoreError, StoreResult};
use stockroom_order::{Order, OrderId};

use crate::transaction::{map_sqlx, PgTx};

#[derive(Clone)]
pub struct PgOrderRepository {
    pool: PgPool,
}

impl PgOrderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: String,
    product_id: String,
    quantity: i32,
    total: Decimal,
    created_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = StoreError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        Ok(Order {
            quantity: Quantity::try_from(i64::from(row.quantity)).map_err(StoreError::backend)?,
            id: OrderId::new(row.id),
            product_id: ProductId::new(row.product_id),
            total: row.total,
            created_at: row.created_at,
        })
    }
}

#[async_trait]
impl OrderStore<PgTx> for PgOrderRepository {
    async fn append(&self, tx: &mut PgTx, order: &Order) -> StoreResult<()> {
        let quantity = i32::try_from(order.quantity.get())
            .map_err(|_| StoreError::backend(format!("quantity {} exceeds column range", order.quantity.get())))?;

        sqlx::query(
            r#"
            INSERT INTO orders (id, product_id, quantity, total, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(order.id.as_str())
        .bind(order.product_id.as_str())
        .bind(quantity)
        .bind(order.total)
        .bind(order.created_at)
        .execute(&mut **tx)
        .await
        .map_err(map_sqlx)?;

        Ok(())
    }
}

#[async_trait]
impl OrderRepository for PgOrderRepository {
    async fn list_orders(&self) -> StoreResult<Vec<Order>> {
        let rows = sqlx::query_as::<_, OrderRow>(
            "SELECT id, product_id, quantity, total, created_at FROM orders ORDER BY created_at DESC, id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx)?;

        rows.into_iter().map(Order::try_from).collect()
    }
}
