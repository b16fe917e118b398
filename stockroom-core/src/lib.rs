pub mod repository;
pub mod transaction;
pub mod placement;
pub mod service;

pub use placement::{OrderPlacement, PlacementEngine, PlacementError};
pub use repository::{InventoryStore, OrderRepository, OrderStore, ProductRepository};
pub use service::{OrderService, ProductService, ServiceError};
pub use transaction::{TransactionRunner, UnitOfWork};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Failure reported by a storage backend
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,
    #[error("conflicting write: {0}")]
    Conflict(String),
    #[error("storage backend error: {0}")]
    Backend(#[source] BoxError),
}

impl StoreError {
    pub fn backend(err: impl Into<BoxError>) -> Self {
        Self::Backend(err.into())
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
