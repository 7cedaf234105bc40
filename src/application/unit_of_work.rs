//! Transactional unit of work.
//!
//! [`UnitOfWork::run`] executes a closure against a transaction-bound
//! repository. When the caller already holds a transaction it is reused and
//! left open; otherwise a new one is begun, committed on success and rolled
//! back on failure.
//!
//! ```ignore
//! let link = uow
//!     .run(None, move |tx| Box::pin(async move { tx.find_by_id(&id).await }))
//!     .await?;
//! ```

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use crate::domain::repositories::{LinkStore, LinkTransaction};
use crate::error::AppError;

/// Future returned by unit-of-work closures, borrowing the transaction for `'t`.
pub type TxFuture<'t, T> = Pin<Box<dyn Future<Output = Result<T, AppError>> + Send + 't>>;

pub struct UnitOfWork<S: LinkStore> {
    store: Arc<S>,
    timeout: Option<Duration>,
}

impl<S: LinkStore> Clone for UnitOfWork<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            timeout: self.timeout,
        }
    }
}

impl<S: LinkStore> UnitOfWork<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            timeout: None,
        }
    }

    /// Bounds every transaction opened by [`Self::run`]. `None` disables the deadline.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Runs `work` inside a transaction.
    ///
    /// With `ambient = Some(tx)` the work runs on that transaction and nothing
    /// is committed or rolled back here. With `None` a fresh transaction is
    /// begun and finished according to the outcome of `work`.
    ///
    /// # Errors
    ///
    /// Returns the error produced by `work` unchanged (after rolling back an
    /// owned transaction), [`AppError::Store`] if begin or commit fails, or
    /// [`AppError::Cancelled`] if the configured deadline elapses first.
    pub async fn run<T, F>(&self, ambient: Option<&mut S::Tx>, work: F) -> Result<T, AppError>
    where
        T: Send,
        F: for<'t> FnOnce(&'t mut S::Tx) -> TxFuture<'t, T> + Send,
    {
        match ambient {
            Some(tx) => work(tx).await,
            None => self.run_owned(work).await,
        }
    }

    async fn run_owned<T, F>(&self, work: F) -> Result<T, AppError>
    where
        T: Send,
        F: for<'t> FnOnce(&'t mut S::Tx) -> TxFuture<'t, T> + Send,
    {
        let mut tx = self.store.begin().await?;

        let outcome = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, work(&mut tx))
                .await
                .unwrap_or_else(|_| {
                    Err(AppError::cancelled(format!(
                        "Transaction exceeded its {} ms deadline",
                        limit.as_millis()
                    )))
                }),
            None => work(&mut tx).await,
        };

        match outcome {
            Ok(value) => {
                tx.commit().await?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = tx.rollback().await {
                    tracing::warn!(error = %rollback_err, "Rollback failed");
                }
                Err(err)
            }
        }
    }
}
