use async_trait::async_trait;
use stockroom_catalog::{LockedHandle, Product, ProductId, ProductPatch};
use stockroom_order::Order;

use crate::transaction::UnitOfWork;
use crate::{StoreError, StoreResult};

/// Product rows as seen from inside a transaction
#[async_trait]
pub trait InventoryStore<Tx: Send>: Send + Sync {
    /// Read a product and hold an exclusive lock on it until `tx` ends.
    ///
    /// Other transactions calling this for the same product, or writing it, wait.
    /// Returns `StoreError::NotFound` when the product does not exist.
    async fn get_for_update(&self, tx: &mut Tx, id: &ProductId) -> StoreResult<LockedHandle<Product>>;

    /// Persist the full product state as part of `tx`.
    ///
    /// Returns `StoreError::NotFound` if no row was affected.
    async fn save(&self, tx: &mut Tx, product: LockedHandle<Product>) -> StoreResult<()>;
}

/// Append-only order log as seen from inside a transaction
#[async_trait]
pub trait OrderStore<Tx: Send>: Send + Sync {
    /// Insert a new order as part of `tx`. An identifier collision is a `Conflict`.
    async fn append(&self, tx: &mut Tx, order: &Order) -> StoreResult<()>;
}

/// Repository trait for product catalog access
#[async_trait]
pub trait ProductRepository: Send + Sync {
    async fn create_product(&self, product: &Product) -> StoreResult<()>;

    /// Plain read, takes no lock
    async fn get_product(&self, id: &ProductId) -> StoreResult<Option<Product>>;

    async fn list_products(&self, limit: u32) -> StoreResult<Vec<Product>>;

    /// Apply `patch` over the current record under a row lock and return the result
    async fn update_product(&self, id: &ProductId, patch: &ProductPatch) -> StoreResult<Product>;

    async fn delete_product(&self, id: &ProductId) -> StoreResult<()>;
}

/// Repository trait for order data access
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// All orders, newest first
    async fn list_orders(&self) -> StoreResult<Vec<Order>>;
}

/// Locking read, patch, save. Backends run this for `ProductRepository::update_product`.
pub struct PatchProduct<'a, I> {
    pub inventory: &'a I,
    pub id: &'a ProductId,
    pub patch: &'a ProductPatch,
}

#[async_trait]
impl<'a, Tx, I> UnitOfWork<Tx> for PatchProduct<'a, I>
where
    Tx: Send,
    I: InventoryStore<Tx>,
{
    type Output = Product;
    type Error = StoreError;

    async fn run(self, tx: &mut Tx) -> StoreResult<Product> {
        let mut product = self.inventory.get_for_update(tx, self.id).await?;
        product.mutate(|p| p.apply(self.patch));
        let updated = Product::clone(&product);
        self.inventory.save(tx, product).await?;
        Ok(updated)
    }
}
