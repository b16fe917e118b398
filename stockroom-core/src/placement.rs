//! Order placement: the locked read, stock check, decrement, save and append, run as a
//! single unit of work.
//!
//! Concurrent placements against the same product serialize on the row lock taken by the
//! locking read. A waiting placement sees the stock left by the one before it, so there is
//! nothing to retry and stock can never be oversold.

use async_trait::async_trait;
use stockroom_catalog::{InsufficientStock, ProductId, Quantity, TotalOverflow};
use stockroom_order::Order;
use tracing::{debug, info};

use crate::repository::{InventoryStore, OrderStore};
use crate::transaction::{TransactionRunner, UnitOfWork};
use crate::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum PlacementError {
    #[error("product not found: {0}")]
    ProductNotFound(ProductId),
    #[error(transparent)]
    InsufficientStock(#[from] InsufficientStock),
    #[error(transparent)]
    TotalOverflow(#[from] TotalOverflow),
    #[error("storage failure: {0}")]
    StorageFailure(#[from] StoreError),
    #[error("order placement cancelled before commit")]
    Cancelled,
}

/// Place an order against shared inventory
#[async_trait]
pub trait OrderPlacement: Send + Sync {
    async fn place_order(&self, product_id: &ProductId, quantity: Quantity) -> Result<Order, PlacementError>;
}

pub struct PlacementEngine<R, I, O> {
    runner: R,
    inventory: I,
    orders: O,
}

impl<R, I, O> PlacementEngine<R, I, O> {
    pub fn new(runner: R, inventory: I, orders: O) -> Self {
        Self {
            runner,
            inventory,
            orders,
        }
    }
}

#[async_trait]
impl<R, I, O> OrderPlacement for PlacementEngine<R, I, O>
where
    R: TransactionRunner,
    I: InventoryStore<R::Tx>,
    O: OrderStore<R::Tx>,
{
    async fn place_order(&self, product_id: &ProductId, quantity: Quantity) -> Result<Order, PlacementError> {
        let work = PlaceOrder {
            inventory: &self.inventory,
            orders: &self.orders,
            product_id,
            quantity,
        };

        let order = self.runner.run_in_transaction(work).await?;

        info!(
            order_id = %order.id,
            product_id = %product_id,
            quantity = quantity.get(),
            total = %order.total,
            "order placed"
        );
        Ok(order)
    }
}

struct PlaceOrder<'a, I, O> {
    inventory: &'a I,
    orders: &'a O,
    product_id: &'a ProductId,
    quantity: Quantity,
}

impl<I, O> PlaceOrder<'_, I, O> {
    fn missing_product(&self, err: StoreError) -> PlacementError {
        match err {
            StoreError::NotFound => PlacementError::ProductNotFound(self.product_id.clone()),
            other => PlacementError::StorageFailure(other),
        }
    }
}

#[async_trait]
impl<'a, Tx, I, O> UnitOfWork<Tx> for PlaceOrder<'a, I, O>
where
    Tx: Send,
    I: InventoryStore<Tx>,
    O: OrderStore<Tx>,
{
    type Output = Order;
    type Error = PlacementError;

    async fn run(self, tx: &mut Tx) -> Result<Order, PlacementError> {
        let mut product = self
            .inventory
            .get_for_update(tx, self.product_id)
            .await
            .map_err(|err| self.missing_product(err))?;

        // The row stays locked until rollback, so this answer cannot go stale.
        product.mutate(|p| p.take_stock(self.quantity))?;
        debug!(product_id = %self.product_id, remaining = product.stock, "stock reserved");

        let unit_price = product.price;
        self.inventory
            .save(tx, product)
            .await
            .map_err(|err| self.missing_product(err))?;

        let order = Order::place(self.product_id.clone(), unit_price, self.quantity)?;
        self.orders.append(tx, &order).await?;

        Ok(order)
    }
}
