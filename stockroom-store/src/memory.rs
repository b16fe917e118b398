//! In-process backend with the same locking semantics as the PostgreSQL one.
//!
//! Each product row has its own async mutex. A locking read parks the owned guard in the
//! transaction, writes are staged there, and commit publishes them. Dropping a `MemoryTx`
//! discards staged writes and releases its row locks, which is a rollback.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use stockroom_catalog::{LockedHandle, Product, ProductId, ProductPatch};
use stockroom_core::repository::PatchProduct;
use stockroom_core::{
    InventoryStore, OrderRepository, OrderStore, ProductRepository, StoreError, StoreResult, TransactionRunner,
};
use stockroom_order::Order;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};
use tracing::debug;

#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    products: RwLock<HashMap<ProductId, Row>>,
    orders: RwLock<Vec<(u64, Order)>>,
    row_locks: Mutex<HashMap<ProductId, Arc<Mutex<()>>>>,
    seq: AtomicU64,
}

struct Row {
    product: Product,
    seq: u64,
}

/// Open transaction against a `MemoryStore`
#[derive(Default)]
pub struct MemoryTx {
    held: HashMap<ProductId, OwnedMutexGuard<()>>,
    staged: HashMap<ProductId, Product>,
    appended: Vec<Order>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_seq(&self) -> u64 {
        self.inner.seq.fetch_add(1, Ordering::Relaxed)
    }

    async fn row_lock(&self, id: &ProductId) -> Arc<Mutex<()>> {
        let mut locks = self.inner.row_locks.lock().await;
        locks.entry(id.clone()).or_default().clone()
    }

    async fn exists(&self, id: &ProductId) -> bool {
        self.inner.products.read().await.contains_key(id)
    }
}

#[async_trait]
impl TransactionRunner for MemoryStore {
    type Tx = MemoryTx;

    async fn begin(&self) -> StoreResult<MemoryTx> {
        Ok(MemoryTx::default())
    }

    async fn commit(&self, tx: MemoryTx) -> StoreResult<()> {
        let MemoryTx { held, staged, appended } = tx;
        let mut products = self.inner.products.write().await;
        let mut orders = self.inner.orders.write().await;

        if let Some(id) = staged.keys().find(|id| !products.contains_key(*id)) {
            return Err(StoreError::Conflict(format!("product {id} vanished before commit")));
        }
        for (id, product) in staged {
            if let Some(row) = products.get_mut(&id) {
                row.product = product;
            }
        }
        for order in appended {
            orders.push((self.next_seq(), order));
        }

        drop(held);
        Ok(())
    }

    async fn rollback(&self, tx: MemoryTx) -> StoreResult<()> {
        debug!(locks = tx.held.len(), "discarding staged writes");
        Ok(())
    }
}

#[async_trait]
impl InventoryStore<MemoryTx> for MemoryStore {
    async fn get_for_update(&self, tx: &mut MemoryTx, id: &ProductId) -> StoreResult<LockedHandle<Product>> {
        if !tx.held.contains_key(id) {
            if !self.exists(id).await {
                return Err(StoreError::NotFound);
            }
            let guard = self.row_lock(id).await.lock_owned().await;
            tx.held.insert(id.clone(), guard);
        }

        if let Some(staged) = tx.staged.get(id) {
            return Ok(LockedHandle::new(staged.clone()));
        }
        // Deleted while this transaction was waiting for the lock
        let products = self.inner.products.read().await;
        let row = products.get(id).ok_or(StoreError::NotFound)?;
        Ok(LockedHandle::new(row.product.clone()))
    }

    async fn save(&self, tx: &mut MemoryTx, product: LockedHandle<Product>) -> StoreResult<()> {
        let product = product.into_inner();
        if !tx.held.contains_key(&product.id) {
            return Err(StoreError::Conflict(format!("product {} saved without a locking read", product.id)));
        }
        if !self.exists(&product.id).await {
            return Err(StoreError::NotFound);
        }
        tx.staged.insert(product.id.clone(), product);
        Ok(())
    }
}

#[async_trait]
impl OrderStore<MemoryTx> for MemoryStore {
    async fn append(&self, tx: &mut MemoryTx, order: &Order) -> StoreResult<()> {
        let taken = self.inner.orders.read().await.iter().any(|(_, o)| o.id == order.id)
            || tx.appended.iter().any(|o| o.id == order.id);
        if taken {
            return Err(StoreError::Conflict(format!("order {} already exists", order.id)));
        }
        tx.appended.push(order.clone());
        Ok(())
    }
}

#[async_trait]
impl ProductRepository for MemoryStore {
    async fn create_product(&self, product: &Product) -> StoreResult<()> {
        let mut products = self.inner.products.write().await;
        if products.contains_key(&product.id) {
            return Err(StoreError::Conflict(format!("product {} already exists", product.id)));
        }
        let seq = self.next_seq();
        products.insert(product.id.clone(), Row { product: product.clone(), seq });
        Ok(())
    }

    async fn get_product(&self, id: &ProductId) -> StoreResult<Option<Product>> {
        Ok(self.inner.products.read().await.get(id).map(|row| row.product.clone()))
    }

    async fn list_products(&self, limit: u32) -> StoreResult<Vec<Product>> {
        let products = self.inner.products.read().await;
        let mut rows: Vec<&Row> = products.values().collect();
        rows.sort_by_key(|row| row.seq);
        Ok(rows
            .into_iter()
            .take(limit as usize)
            .map(|row| row.product.clone())
            .collect())
    }

    async fn update_product(&self, id: &ProductId, patch: &ProductPatch) -> StoreResult<Product> {
        self.run_in_transaction(PatchProduct {
            inventory: self,
            id,
            patch,
        })
        .await
    }

    async fn delete_product(&self, id: &ProductId) -> StoreResult<()> {
        let row_lock = self.row_lock(id).await;
        let _guard = row_lock.lock().await;
        let removed = self.inner.products.write().await.remove(id);

        // Two references: the map and this call. No transaction holds or awaits it
        let mut locks = self.inner.row_locks.lock().await;
        if Arc::strong_count(&row_lock) == 2 {
            locks.remove(id);
        }

        removed.map(|_| ()).ok_or(StoreError::NotFound)
    }
}

#[async_trait]
impl OrderRepository for MemoryStore {
    async fn list_orders(&self) -> StoreResult<Vec<Order>> {
        let orders = self.inner.orders.read().await;
        Ok(orders.iter().rev().map(|(_, order)| order.clone()).collect())
    }
}
