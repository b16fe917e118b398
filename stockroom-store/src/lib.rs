pub mod app_config;
pub mod catalog_repo;
pub mod database;
pub mod memory;
pub mod order_repo;
pub mod transaction;

pub use app_config::{Config, StorageBackend};
pub use catalog_repo::PgProductRepository;
pub use database::DbClient;
pub use memory::{MemoryStore, MemoryTx};
pub use order_repo::PgOrderRepository;
pub use transaction::{PgTransactionRunner, PgTx};
