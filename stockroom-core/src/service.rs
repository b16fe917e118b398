use std::sync::Arc;
use std::time::Duration;

use stockroom_catalog::{InventoryError, Product, ProductDraft, ProductError, ProductId, ProductPatch, Quantity};
use stockroom_order::Order;
use tracing::{info, warn};

use crate::placement::{OrderPlacement, PlacementError};
use crate::repository::{OrderRepository, ProductRepository};
use crate::StoreError;

pub const DEFAULT_LIST_LIMIT: u32 = 10;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("not found")]
    NotFound,
    #[error(transparent)]
    Placement(#[from] PlacementError),
    #[error(transparent)]
    Storage(StoreError),
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => Self::NotFound,
            other => Self::Storage(other),
        }
    }
}

impl From<ProductError> for ServiceError {
    fn from(err: ProductError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<InventoryError> for ServiceError {
    fn from(err: InventoryError) -> Self {
        Self::Validation(err.to_string())
    }
}

/// Order operations exposed to callers
pub struct OrderService {
    placement: Arc<dyn OrderPlacement>,
    orders: Arc<dyn OrderRepository>,
    placement_timeout: Option<Duration>,
}

impl OrderService {
    pub fn new(placement: Arc<dyn OrderPlacement>, orders: Arc<dyn OrderRepository>) -> Self {
        Self {
            placement,
            orders,
            placement_timeout: None,
        }
    }

    /// Give up on placements that have not committed within `timeout`.
    ///
    /// The in-flight transaction is dropped, which rolls it back.
    pub fn with_placement_timeout(mut self, timeout: Duration) -> Self {
        self.placement_timeout = Some(timeout);
        self
    }

    pub async fn create_order(&self, product_id: &str, quantity: i64) -> Result<Order, ServiceError> {
        let product_id = product_id.trim();
        if product_id.is_empty() {
            return Err(ServiceError::Validation("product_id must not be empty".to_string()));
        }
        let product_id = ProductId::new(product_id);
        let quantity = Quantity::try_from(quantity)?;

        let placement = self.placement.place_order(&product_id, quantity);
        let order = match self.placement_timeout {
            Some(limit) => match tokio::time::timeout(limit, placement).await {
                Ok(result) => result?,
                Err(_) => {
                    warn!(product_id = %product_id, ?limit, "order placement timed out");
                    return Err(PlacementError::Cancelled.into());
                }
            },
            None => placement.await?,
        };

        Ok(order)
    }

    pub async fn list_orders(&self) -> Result<Vec<Order>, ServiceError> {
        Ok(self.orders.list_orders().await?)
    }
}

/// Catalog operations exposed to callers
pub struct ProductService {
    products: Arc<dyn ProductRepository>,
}

impl ProductService {
    pub fn new(products: Arc<dyn ProductRepository>) -> Self {
        Self { products }
    }

    pub async fn create_product(&self, draft: ProductDraft) -> Result<Product, ServiceError> {
        draft.validate()?;
        let product = Product::from_draft(ProductId::generate(), draft);
        self.products.create_product(&product).await?;
        info!(product_id = %product.id, stock = product.stock, "product created");
        Ok(product)
    }

    pub async fn get_product(&self, id: &ProductId) -> Result<Product, ServiceError> {
        self.products.get_product(id).await?.ok_or(ServiceError::NotFound)
    }

    pub async fn list_products(&self, limit: u32) -> Result<Vec<Product>, ServiceError> {
        if limit == 0 {
            return Err(ServiceError::Validation("limit must be positive".to_string()));
        }
        Ok(self.products.list_products(limit).await?)
    }

    pub async fn update_product(&self, id: &ProductId, patch: ProductPatch) -> Result<Product, ServiceError> {
        if patch.is_empty() {
            return Err(ServiceError::Validation("update must change at least one field".to_string()));
        }
        patch.validate()?;
        let product = self.products.update_product(id, &patch).await?;
        info!(product_id = %id, "product updated");
        Ok(product)
    }

    pub async fn delete_product(&self, id: &ProductId) -> Result<(), ServiceError> {
        self.products.delete_product(id).await?;
        info!(product_id = %id, "product deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct ScriptedPlacement {
        calls: Mutex<Vec<(ProductId, u32)>>,
        stall: bool,
    }

    #[async_trait]
    impl OrderPlacement for ScriptedPlacement {
        async fn place_order(&self, product_id: &ProductId, quantity: Quantity) -> Result<Order, PlacementError> {
            self.calls.lock().unwrap().push((product_id.clone(), quantity.get()));
            if self.stall {
                tokio::time::sleep(Duration::from_secs(60)).await;
            }
            let price = stockroom_catalog::Price::new(rust_decimal::Decimal::ONE).unwrap();
            Ok(Order::place(product_id.clone(), price, quantity).unwrap())
        }
    }

    struct NoOrders;

    #[async_trait]
    impl OrderRepository for NoOrders {
        async fn list_orders(&self) -> crate::StoreResult<Vec<Order>> {
            Ok(Vec::new())
        }
    }

    fn service(placement: Arc<ScriptedPlacement>) -> OrderService {
        OrderService::new(placement, Arc::new(NoOrders))
    }

    #[tokio::test]
    async fn test_create_order_rejects_bad_input_before_placing() {
        let placement = Arc::new(ScriptedPlacement::default());
        let svc = service(placement.clone());

        for (id, qty) in [("", 1), ("   ", 1), ("product-123", 0), ("product-123", -3)] {
            let err = svc.create_order(id, qty).await.unwrap_err();
            assert!(matches!(err, ServiceError::Validation(_)), "{id:?} {qty}");
        }
        assert!(placement.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_order_trims_product_id() {
        let placement = Arc::new(ScriptedPlacement::default());
        let svc = service(placement.clone());

        let order = svc.create_order("  product-123 ", 2).await.unwrap();

        assert_eq!(order.product_id.as_str(), "product-123");
        assert_eq!(placement.calls.lock().unwrap()[0], (ProductId::new("product-123"), 2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_create_order_times_out_as_cancelled() {
        let placement = Arc::new(ScriptedPlacement {
            stall: true,
            ..Default::default()
        });
        let svc = service(placement).with_placement_timeout(Duration::from_millis(50));

        let err = svc.create_order("product-123", 1).await.unwrap_err();

        assert!(matches!(err, ServiceError::Placement(PlacementError::Cancelled)));
    }

    struct UnreachableProducts;

    #[async_trait]
    impl ProductRepository for UnreachableProducts {
        async fn create_product(&self, _product: &Product) -> crate::StoreResult<()> {
            unreachable!()
        }

        async fn get_product(&self, _id: &ProductId) -> crate::StoreResult<Option<Product>> {
            unreachable!()
        }

        async fn list_products(&self, _limit: u32) -> crate::StoreResult<Vec<Product>> {
            unreachable!()
        }

        async fn update_product(&self, _id: &ProductId, _patch: &ProductPatch) -> crate::StoreResult<Product> {
            unreachable!()
        }

        async fn delete_product(&self, _id: &ProductId) -> crate::StoreResult<()> {
            unreachable!()
        }
    }

    #[tokio::test]
    async fn test_update_rejects_empty_and_oversized_patches() {
        let svc = ProductService::new(Arc::new(UnreachableProducts));
        let id = ProductId::new("076e76d6-fc3e-4f95-a024-1b4984e76060");

        let empty = svc.update_product(&id, ProductPatch::default()).await.unwrap_err();
        assert!(matches!(empty, ServiceError::Validation(_)));

        let oversized = ProductPatch {
            stock: Some(stockroom_catalog::MAX_STOCK + 1),
            ..Default::default()
        };
        let err = svc.update_product(&id, oversized).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[test]
    fn test_store_not_found_maps_to_not_found() {
        assert!(matches!(ServiceError::from(StoreError::NotFound), ServiceError::NotFound));
        assert!(matches!(
            ServiceError::from(StoreError::Conflict("dup".into())),
            ServiceError::Storage(StoreError::Conflict(_))
        ));
    }
}
