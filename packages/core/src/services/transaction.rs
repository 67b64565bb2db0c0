//! Transaction Coordinator
//!
//! Runs a unit of work inside one store transaction:
//!
//! - `Ok` from the unit of work commits
//! - `Err` rolls back and returns the error unchanged
//! - a dropped (cancelled) or panicking unit of work drops the transaction
//!   handle, and the store discards the uncommitted work
//!
//! The transaction handle is passed to the unit of work explicitly; store
//! calls made with it land in this scope and no other.
//!
//! # Examples
//!
//! ```rust,no_run
//! # use answerdesk_core::db::{DatabaseError, NodeStore, TursoStore, TxMode};
//! # use answerdesk_core::services::TransactionCoordinator;
//! # use std::sync::Arc;
//! # async fn example(store: Arc<TursoStore>) -> Result<(), DatabaseError> {
//! let coordinator = TransactionCoordinator::new(Arc::clone(&store));
//! let count = coordinator
//!     .run(TxMode::Read, move |tx| {
//!         Box::pin(async move { Ok::<_, DatabaseError>(store.list_nodes(tx).await?.len()) })
//!     })
//!     .await?;
//! # Ok(())
//! # }
//! ```

use crate::db::{DatabaseError, NodeStore, TxMode};
use futures::future::BoxFuture;
use std::fmt;
use std::sync::Arc;

pub struct TransactionCoordinator<S: NodeStore> {
    store: Arc<S>,
}

impl<S: NodeStore> Clone for TransactionCoordinator<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: NodeStore> TransactionCoordinator<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Run `work` in a transaction of the given mode
    ///
    /// Errors from opening or committing the transaction are converted into
    /// `E`. A failed rollback is logged and otherwise ignored: the
    /// transaction's connection is dropped right after, which discards the
    /// uncommitted work anyway.
    pub async fn run<T, E, F>(&self, mode: TxMode, work: F) -> Result<T, E>
    where
        F: for<'t> FnOnce(&'t S::Tx) -> BoxFuture<'t, Result<T, E>> + Send,
        T: Send,
        E: From<DatabaseError> + fmt::Display + Send,
    {
        let tx = self.store.begin(mode).await?;

        let outcome = work(&tx).await;

        match outcome {
            Ok(value) => {
                self.store.commit(tx).await?;
                Ok(value)
            }
            Err(err) => {
                match mode {
                    TxMode::Write => tracing::warn!("Rolling back write transaction: {}", err),
                    TxMode::Read => tracing::debug!("Closing read transaction: {}", err),
                }
                if let Err(rollback_err) = self.store.rollback(tx).await {
                    tracing::warn!("Rollback failed, discarding connection: {}", rollback_err);
                }
                Err(err)
            }
        }
    }
}
