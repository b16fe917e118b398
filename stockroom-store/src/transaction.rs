use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use stockroom_core::{StoreError, StoreResult, TransactionRunner};

/// An open PostgreSQL transaction. Dropping it without commit rolls it back.
pub type PgTx = Transaction<'static, Postgres>;

#[derive(Clone)]
pub struct PgTransactionRunner {
    pool: PgPool,
}

impl PgTransactionRunner {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TransactionRunner for PgTransactionRunner {
    type Tx = PgTx;

    async fn begin(&self) -> StoreResult<PgTx> {
        self.pool.begin().await.map_err(map_sqlx)
    }

    async fn commit(&self, tx: PgTx) -> StoreResult<()> {
        tx.commit().await.map_err(map_sqlx)
    }

    async fn rollback(&self, tx: PgTx) -> StoreResult<()> {
        tx.rollback().await.map_err(map_sqlx)
    }
}

pub(crate) fn map_sqlx(err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::RowNotFound => StoreError::NotFound,
        sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::Conflict(db.message().to_string()),
        other => StoreError::backend(other),
    }
}
