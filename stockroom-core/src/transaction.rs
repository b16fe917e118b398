use std::fmt::Display;

use async_trait::async_trait;
use tracing::error;

use crate::{StoreError, StoreResult};

/// Work executed inside one transaction.
///
/// The open transaction is passed explicitly; every store call made by the work takes the
/// same `&mut Tx`, so they all share its locks and its fate.
#[async_trait]
pub trait UnitOfWork<Tx: Send>: Send + Sized {
    type Output: Send;
    type Error: From<StoreError> + Display + Send;

    async fn run(self, tx: &mut Tx) -> Result<Self::Output, Self::Error>;
}

/// Opens and closes transaction boundaries
#[async_trait]
pub trait TransactionRunner: Send + Sync {
    type Tx: Send;

    async fn begin(&self) -> StoreResult<Self::Tx>;

    async fn commit(&self, tx: Self::Tx) -> StoreResult<()>;

    async fn rollback(&self, tx: Self::Tx) -> StoreResult<()>;

    /// Run `work` in a fresh transaction: commit on `Ok`, roll back on `Err`.
    ///
    /// The work's error is returned unchanged. Begin, commit and rollback failures surface
    /// as `StoreError`; a failed rollback wins over the work's error, which is logged.
    /// Nothing is retried.
    async fn run_in_transaction<W>(&self, work: W) -> Result<W::Output, W::Error>
    where
        W: UnitOfWork<Self::Tx>,
    {
        let mut tx = self.begin().await?;

        match work.run(&mut tx).await {
            Ok(output) => {
                self.commit(tx).await?;
                Ok(output)
            }
            Err(err) => {
                if let Err(rollback_err) = self.rollback(tx).await {
                    error!(error = %err, rollback_error = %rollback_err, "rollback failed");
                    return Err(rollback_err.into());
                }
                Err(err)
            }
        }
    }
}
