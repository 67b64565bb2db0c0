//! NodeStore Trait - Answer Tree Persistence Abstraction
//!
//! This module defines the `NodeStore` trait that abstracts persistence of
//! the self-referential answer table. Services depend on the trait, never on
//! a concrete backend.
//!
//! # Design Decisions
//!
//! 1. **Async-First**: All methods are async.
//! 2. **Explicit Transactions**: Every data method takes the active
//!    transaction handle (`Self::Tx`) as a parameter. There is no ambient
//!    "current transaction"; a call lands in exactly the scope it is given.
//! 3. **Bulk Conditional Rewrites**: `rewrite_id` and `rewrite_parent` update
//!    every matching row and report how many matched. Callers decide what
//!    count they expect.
//! 4. **Typed Errors**: Methods return `DatabaseError` so callers can tell
//!    lock contention (`is_busy()`) from other failures.
//!
//! # Examples
//!
//! ```rust,no_run
//! use answerdesk_core::db::{DatabaseService, NodeStore, TursoStore, TxMode};
//! use std::path::PathBuf;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Arc::new(DatabaseService::new(PathBuf::from("./answers.db")).await?);
//!     let store = TursoStore::new(db);
//!
//!     let tx = store.begin(TxMode::Read).await?;
//!     let node = store.find_by_id(&tx, 1).await?;
//!     store.rollback(tx).await?;
//!     Ok(())
//! }
//! ```

use crate::db::DatabaseError;
use crate::models::{NewNode, Node};
use async_trait::async_trait;

/// Access mode requested when opening a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxMode {
    /// Snapshot reads only; writes are rejected
    Read,
    /// Takes the write lock up front so no other writer interleaves
    Write,
}

/// Abstraction layer for answer tree persistence
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`; transaction handles must be
/// `Send + Sync` so units of work can be awaited on any runtime thread.
///
/// # Method Categories
///
/// - **Transactions**: begin, commit, rollback
/// - **Lookups**: find_by_id, find_by_key, list_nodes, max_id
/// - **Rewrites**: rewrite_id, rewrite_parent (identity swap primitives)
/// - **Lifecycle**: insert_node, delete_node
#[async_trait]
pub trait NodeStore: Send + Sync {
    /// Handle for one open transaction
    type Tx: Send + Sync;

    //
    // TRANSACTIONS
    //

    /// Open a transaction
    ///
    /// `TxMode::Write` must acquire the write lock before returning, so that
    /// a contended writer fails here rather than mid-way through its work.
    async fn begin(&self, mode: TxMode) -> Result<Self::Tx, DatabaseError>;

    /// Commit every statement issued through `tx`
    ///
    /// Deferred constraints are checked here; on failure the transaction is
    /// rolled back before the error is returned.
    async fn commit(&self, tx: Self::Tx) -> Result<(), DatabaseError>;

    /// Discard every statement issued through `tx`
    async fn rollback(&self, tx: Self::Tx) -> Result<(), DatabaseError>;

    //
    // LOOKUPS
    //

    /// Get node by id
    ///
    /// - `Ok(Some(node))` if the node exists
    /// - `Ok(None)` if it doesn't (not an error)
    async fn find_by_id(&self, tx: &Self::Tx, id: i64) -> Result<Option<Node>, DatabaseError>;

    /// Get node by its unique key
    async fn find_by_key(&self, tx: &Self::Tx, key: &str) -> Result<Option<Node>, DatabaseError>;

    /// All nodes ordered by id ascending
    async fn list_nodes(&self, tx: &Self::Tx) -> Result<Vec<Node>, DatabaseError>;

    /// Largest id in the table, `None` when empty
    async fn max_id(&self, tx: &Self::Tx) -> Result<Option<i64>, DatabaseError>;

    //
    // REWRITES
    //

    /// Set `id = new_id` on every row whose `id = match_id`
    ///
    /// Safe to call when zero or many rows match; returns the number of rows
    /// rewritten. Fails if `new_id` collides with an existing row.
    async fn rewrite_id(
        &self,
        tx: &Self::Tx,
        match_id: i64,
        new_id: i64,
    ) -> Result<u64, DatabaseError>;

    /// Set `parent_id = new_parent_id` on every row whose
    /// `parent_id = match_parent_id`; returns the number of rows rewritten
    async fn rewrite_parent(
        &self,
        tx: &Self::Tx,
        match_parent_id: i64,
        new_parent_id: i64,
    ) -> Result<u64, DatabaseError>;

    //
    // LIFECYCLE
    //

    /// Insert a node and return it with its assigned id
    ///
    /// Fails with `DatabaseError::ConstraintViolation` on a duplicate key.
    async fn insert_node(&self, tx: &Self::Tx, node: NewNode) -> Result<Node, DatabaseError>;

    /// Delete a node; its children follow through the cascading parent
    /// reference. Returns the number of rows matched by `id`.
    async fn delete_node(&self, tx: &Self::Tx, id: i64) -> Result<u64, DatabaseError>;
}
