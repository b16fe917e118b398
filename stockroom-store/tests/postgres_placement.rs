//! Needs a reachable PostgreSQL in `DATABASE_URL`. Run with `cargo test -- --ignored`.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;
use stockroom_catalog::{InsufficientStock, Price, Product, ProductId, ProductPatch, Quantity};
use stockroom_core::{
    InventoryStore, OrderPlacement, OrderRepository, OrderStore, PlacementEngine, PlacementError, ProductRepository,
    StoreError, StoreResult, TransactionRunner,
};
use stockroom_order::Order;
use stockroom_store::app_config::DatabaseConfig;
use stockroom_store::{DbClient, PgOrderRepository, PgProductRepository, PgTransactionRunner, PgTx, StorageBackend};

async fn connect() -> DbClient {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let db = DbClient::new(&DatabaseConfig {
        backend: StorageBackend::Postgres,
        url,
        max_connections: 12,
        acquire_timeout_seconds: 10,
    })
    .await
    .unwrap();
    db.migrate().await.unwrap();
    db
}

async fn seed(products: &PgProductRepository, stock: u32) -> ProductId {
    let product = Product {
        id: ProductId::generate(),
        name: "Gopher".to_string(),
        description: "Realistic replica of the Gopher animal".to_string(),
        price: Price::new(Decimal::new(6542, 2)).unwrap(),
        stock,
    };
    products.create_product(&product).await.unwrap();
    product.id
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore]
async fn test_postgres_concurrent_placements_never_oversell() {
    let db = connect().await;
    let products = PgProductRepository::new(db.pool.clone());
    let id = seed(&products, 50).await;
    let engine = Arc::new(PlacementEngine::new(
        PgTransactionRunner::new(db.pool.clone()),
        products.clone(),
        PgOrderRepository::new(db.pool.clone()),
    ));

    let mut handles = Vec::new();
    for _ in 0..10 {
        let engine = engine.clone();
        let id = id.clone();
        handles.push(tokio::spawn(async move {
            engine.place_order(&id, Quantity::new(6).unwrap()).await
        }));
    }

    let mut placed = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => placed += 1,
            Err(PlacementError::InsufficientStock(InsufficientStock { requested: 6, .. })) => {}
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    assert_eq!(placed, 8);
    assert_eq!(products.get_product(&id).await.unwrap().unwrap().stock, 2);

    let orders = PgOrderRepository::new(db.pool.clone()).list_orders().await.unwrap();
    assert_eq!(orders.iter().filter(|o| o.product_id == id).count(), 8);
}

#[tokio::test]
#[ignore]
async fn test_postgres_update_and_delete() {
    let db = connect().await;
    let products = PgProductRepository::new(db.pool.clone());
    let id = seed(&products, 5).await;

    let patch = ProductPatch {
        stock: Some(9),
        ..Default::default()
    };
    let updated = products.update_product(&id, &patch).await.unwrap();
    assert_eq!(updated.stock, 9);
    assert_eq!(updated.name, "Gopher");

    products.delete_product(&id).await.unwrap();
    assert!(products.get_product(&id).await.unwrap().is_none());
    assert!(products.delete_product(&id).await.is_err());
}

struct BrokenOrderLog;

#[async_trait]
impl OrderStore<PgTx> for BrokenOrderLog {
    async fn append(&self, _tx: &mut PgTx, _order: &Order) -> StoreResult<()> {
        Err(StoreError::backend("order log unavailable"))
    }
}

#[tokio::test]
#[ignore]
async fn test_postgres_failed_append_reverts_decrement() {
    let db = connect().await;
    let products = PgProductRepository::new(db.pool.clone());
    let id = seed(&products, 50).await;
    let engine = PlacementEngine::new(PgTransactionRunner::new(db.pool.clone()), products.clone(), BrokenOrderLog);

    let err = engine.place_order(&id, Quantity::new(6).unwrap()).await.unwrap_err();

    assert!(matches!(err, PlacementError::StorageFailure(StoreError::Backend(_))));
    assert_eq!(products.get_product(&id).await.unwrap().unwrap().stock, 50);
    let orders = PgOrderRepository::new(db.pool.clone()).list_orders().await.unwrap();
    assert!(orders.iter().all(|o| o.product_id != id));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
#[ignore]
async fn test_postgres_order_priced_from_locked_row() {
    let db = connect().await;
    let products = PgProductRepository::new(db.pool.clone());
    let id = seed(&products, 10).await;
    let runner = PgTransactionRunner::new(db.pool.clone());
    let engine = Arc::new(PlacementEngine::new(
        runner.clone(),
        products.clone(),
        PgOrderRepository::new(db.pool.clone()),
    ));

    let mut holder = runner.begin().await.unwrap();
    let mut handle = products.get_for_update(&mut holder, &id).await.unwrap();

    let placement = {
        let engine = engine.clone();
        let id = id.clone();
        tokio::spawn(async move { engine.place_order(&id, Quantity::new(3).unwrap()).await })
    };
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(!placement.is_finished());

    handle.mutate(|p| p.price = Price::new(Decimal::new(1000, 2)).unwrap());
    products.save(&mut holder, handle).await.unwrap();
    runner.commit(holder).await.unwrap();

    let order = placement.await.unwrap().unwrap();
    assert_eq!(order.total, Decimal::new(3000, 2));
    assert_eq!(products.get_product(&id).await.unwrap().unwrap().stock, 7);
}
