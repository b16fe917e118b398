use std::sync::Arc;
use std::time::Duration;

use stockroom_core::{OrderPlacement, OrderRepository, OrderService, PlacementEngine, ProductRepository, ProductService};
use stockroom_store::{DbClient, MemoryStore, PgOrderRepository, PgProductRepository, PgTransactionRunner};

use crate::auth::TokenIssuer;

#[derive(Clone)]
pub struct AppState {
    pub products: Arc<ProductService>,
    pub orders: Arc<OrderService>,
    pub tokens: Arc<TokenIssuer>,
}

impl AppState {
    pub fn new(
        products: Arc<dyn ProductRepository>,
        placement: Arc<dyn OrderPlacement>,
        orders: Arc<dyn OrderRepository>,
        tokens: TokenIssuer,
        placement_timeout: Option<Duration>,
    ) -> Self {
        let mut order_service = OrderService::new(placement, orders);
        if let Some(timeout) = placement_timeout {
            order_service = order_service.with_placement_timeout(timeout);
        }

        Self {
            products: Arc::new(ProductService::new(products)),
            orders: Arc::new(order_service),
            tokens: Arc::new(tokens),
        }
    }

    /// Everything backed by one fresh `MemoryStore`
    pub fn in_memory(tokens: TokenIssuer, placement_timeout: Option<Duration>) -> Self {
        let store = MemoryStore::new();
        let engine = PlacementEngine::new(store.clone(), store.clone(), store.clone());

        Self::new(
            Arc::new(store.clone()),
            Arc::new(engine),
            Arc::new(store),
            tokens,
            placement_timeout,
        )
    }

    pub fn postgres(db: &DbClient, tokens: TokenIssuer, placement_timeout: Option<Duration>) -> Self {
        let products = PgProductRepository::new(db.pool.clone());
        let orders = PgOrderRepository::new(db.pool.clone());
        let engine = PlacementEngine::new(
            PgTransactionRunner::new(db.pool.clone()),
            products.clone(),
            orders.clone(),
        );

        Self::new(
            Arc::new(products),
            Arc::new(engine),
            Arc::new(orders),
            tokens,
            placement_timeout,
        )
    }
}
