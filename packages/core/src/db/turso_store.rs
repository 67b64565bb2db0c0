//! TursoStore - NodeStore Implementation for the libsql Backend
//!
//! Each transaction owns a dedicated connection. Dropping a
//! `TursoTransaction` without committing closes that connection, which makes
//! SQLite discard the uncommitted work; nothing is ever committed implicitly.
//!
//! # Examples
//!
//! ```rust,no_run
//! use answerdesk_core::db::{DatabaseService, NodeStore, TursoStore, TxMode};
//! use answerdesk_core::models::NewNode;
//! use std::path::PathBuf;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Arc::new(DatabaseService::new(PathBuf::from("./data/test.db")).await?);
//!     let store = TursoStore::new(db);
//!
//!     let tx = store.begin(TxMode::Write).await?;
//!     let node = store.insert_node(&tx, NewNode::category("Admissions")).await?;
//!     store.commit(tx).await?;
//!
//!     println!("created #{}", node.id);
//!     Ok(())
//! }
//! ```

use crate::db::node_store::{NodeStore, TxMode};
use crate::db::{DatabaseError, DatabaseService};
use crate::models::{NewNode, Node};
use async_trait::async_trait;
use libsql::Row;
use std::sync::Arc;
use tokio::time::{Duration, Instant};

const NODE_COLUMNS: &str = "id, quest, isnode, answer, answertype, parentid";

/// Retry delays while another connection holds the write lock
const INITIAL_LOCK_BACKOFF: Duration = Duration::from_millis(2);
const MAX_LOCK_BACKOFF: Duration = Duration::from_millis(50);

/// An open libsql transaction and the connection it runs on
pub struct TursoTransaction {
    conn: libsql::Connection,
    mode: TxMode,
}

impl TursoTransaction {
    fn ensure_writable(&self, operation: &str) -> Result<(), DatabaseError> {
        match self.mode {
            TxMode::Write => Ok(()),
            TxMode::Read => Err(DatabaseError::read_only(operation.to_string())),
        }
    }
}

/// TursoStore implements NodeStore for the libsql backend
#[derive(Debug, Clone)]
pub struct TursoStore {
    db: Arc<DatabaseService>,
}

impl TursoStore {
    pub fn new(db: Arc<DatabaseService>) -> Self {
        Self { db }
    }

    pub fn database(&self) -> &Arc<DatabaseService> {
        &self.db
    }

    /// Convert libsql::Row to Node model
    ///
    /// # Row Format
    ///
    /// Expected columns (in order), see `NODE_COLUMNS`:
    /// - id (INTEGER)
    /// - quest (TEXT)
    /// - isnode (BOOLEAN stored as INTEGER)
    /// - answer (TEXT, nullable)
    /// - answertype (TEXT, nullable)
    /// - parentid (INTEGER, nullable)
    fn row_to_node(row: &Row) -> Result<Node, DatabaseError> {
        let column = |name: &str, e: libsql::Error| {
            DatabaseError::sql_execution(format!("Failed to get {}: {}", name, e))
        };

        let id: i64 = row.get(0).map_err(|e| column("id", e))?;
        let key: String = row.get(1).map_err(|e| column("quest", e))?;
        let is_category: i64 = row.get(2).map_err(|e| column("isnode", e))?;
        let payload: Option<String> = row.get(3).map_err(|e| column("answer", e))?;
        let payload_type: Option<String> = row.get(4).map_err(|e| column("answertype", e))?;
        let parent_id: Option<i64> = row.get(5).map_err(|e| column("parentid", e))?;

        Ok(Node {
            id,
            key,
            is_category: is_category != 0,
            payload,
            payload_type,
            parent_id,
        })
    }

    async fn query_one(
        tx: &TursoTransaction,
        sql: &str,
        params: impl libsql::params::IntoParams + Send,
    ) -> Result<Option<Node>, DatabaseError> {
        let mut rows = tx
            .conn
            .query(sql, params)
            .await
            .map_err(|e| DatabaseError::from_libsql("Failed to execute node query", e))?;

        match rows
            .next()
            .await
            .map_err(|e| DatabaseError::from_libsql("Failed to read node row", e))?
        {
            Some(row) => Ok(Some(Self::row_to_node(&row)?)),
            None => Ok(None),
        }
    }

    /// Take the write lock with `BEGIN IMMEDIATE`
    ///
    /// The connection's busy timeout is 0, so a held lock fails at once and
    /// the wait happens here on the runtime timer. Dropping the returned
    /// future while it waits cancels the attempt with nothing written.
    async fn begin_immediate(&self, conn: &libsql::Connection) -> Result<(), DatabaseError> {
        let deadline = Instant::now() + Duration::from_millis(self.db.busy_timeout_ms());
        let mut backoff = INITIAL_LOCK_BACKOFF;

        loop {
            let err = match conn.execute("BEGIN IMMEDIATE", ()).await {
                Ok(_) => return Ok(()),
                Err(e) => DatabaseError::from_libsql("Failed to begin transaction", e),
            };

            let now = Instant::now();
            if !err.is_busy() || now >= deadline {
                return Err(err);
            }

            tracing::trace!("Write lock held elsewhere, retrying in {:?}", backoff);
            tokio::time::sleep(backoff.min(deadline - now)).await;
            backoff = (backoff * 2).min(MAX_LOCK_BACKOFF);
        }
    }
}

#[async_trait]
impl NodeStore for TursoStore {
    type Tx = TursoTransaction;

    async fn begin(&self, mode: TxMode) -> Result<TursoTransaction, DatabaseError> {
        let conn = match mode {
            TxMode::Read => {
                let conn = self.db.connect_with_timeout().await?;
                conn.execute("BEGIN DEFERRED", ())
                    .await
                    .map_err(|e| DatabaseError::from_libsql("Failed to begin transaction", e))?;
                conn
            }
            TxMode::Write => {
                let conn = self.db.connect_with_busy_timeout(0).await?;
                self.begin_immediate(&conn).await?;
                // Lock is held; later statements keep the configured timeout
                self.db
                    .set_busy_timeout(&conn, self.db.busy_timeout_ms())
                    .await?;
                conn
            }
        };

        tracing::debug!("Opened {:?} transaction", mode);

        Ok(TursoTransaction { conn, mode })
    }

    async fn commit(&self, tx: TursoTransaction) -> Result<(), DatabaseError> {
        if let Err(e) = tx.conn.execute("COMMIT", ()).await {
            // A failed COMMIT (e.g. deferred foreign key violation) leaves the
            // transaction open.
            if let Err(rollback_err) = tx.conn.execute("ROLLBACK", ()).await {
                tracing::warn!("Rollback after failed commit failed: {}", rollback_err);
            }
            return Err(DatabaseError::from_libsql("Failed to commit transaction", e));
        }

        tracing::debug!("Committed {:?} transaction", tx.mode);
        Ok(())
    }

    async fn rollback(&self, tx: TursoTransaction) -> Result<(), DatabaseError> {
        tx.conn
            .execute("ROLLBACK", ())
            .await
            .map_err(|e| DatabaseError::from_libsql("Failed to roll back transaction", e))?;

        tracing::debug!("Rolled back {:?} transaction", tx.mode);
        Ok(())
    }

    async fn find_by_id(
        &self,
        tx: &TursoTransaction,
        id: i64,
    ) -> Result<Option<Node>, DatabaseError> {
        Self::query_one(
            tx,
            &format!("SELECT {} FROM answers WHERE id = ?", NODE_COLUMNS),
            libsql::params![id],
        )
        .await
    }

    async fn find_by_key(
        &self,
        tx: &TursoTransaction,
        key: &str,
    ) -> Result<Option<Node>, DatabaseError> {
        Self::query_one(
            tx,
            &format!("SELECT {} FROM answers WHERE quest = ?", NODE_COLUMNS),
            libsql::params![key],
        )
        .await
    }

    async fn list_nodes(&self, tx: &TursoTransaction) -> Result<Vec<Node>, DatabaseError> {
        let mut rows = tx
            .conn
            .query(
                &format!("SELECT {} FROM answers ORDER BY id ASC", NODE_COLUMNS),
                (),
            )
            .await
            .map_err(|e| DatabaseError::from_libsql("Failed to list nodes", e))?;

        let mut nodes = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| DatabaseError::from_libsql("Failed to read node row", e))?
        {
            nodes.push(Self::row_to_node(&row)?);
        }

        Ok(nodes)
    }

    async fn max_id(&self, tx: &TursoTransaction) -> Result<Option<i64>, DatabaseError> {
        let mut rows = tx
            .conn
            .query("SELECT MAX(id) FROM answers", ())
            .await
            .map_err(|e| DatabaseError::from_libsql("Failed to query max id", e))?;

        match rows
            .next()
            .await
            .map_err(|e| DatabaseError::from_libsql("Failed to read max id", e))?
        {
            Some(row) => row
                .get::<Option<i64>>(0)
                .map_err(|e| DatabaseError::sql_execution(format!("Failed to get max id: {}", e))),
            None => Ok(None),
        }
    }

    async fn rewrite_id(
        &self,
        tx: &TursoTransaction,
        match_id: i64,
        new_id: i64,
    ) -> Result<u64, DatabaseError> {
        tx.ensure_writable("rewrite_id")?;

        tx.conn
            .execute(
                "UPDATE answers SET id = ? WHERE id = ?",
                libsql::params![new_id, match_id],
            )
            .await
            .map_err(|e| {
                DatabaseError::from_libsql(
                    format!("Failed to rewrite id {} -> {}", match_id, new_id),
                    e,
                )
            })
    }

    async fn rewrite_parent(
        &self,
        tx: &TursoTransaction,
        match_parent_id: i64,
        new_parent_id: i64,
    ) -> Result<u64, DatabaseError> {
        tx.ensure_writable("rewrite_parent")?;

        tx.conn
            .execute(
                "UPDATE answers SET parentid = ? WHERE parentid = ?",
                libsql::params![new_parent_id, match_parent_id],
            )
            .await
            .map_err(|e| {
                DatabaseError::from_libsql(
                    format!(
                        "Failed to rewrite parent {} -> {}",
                        match_parent_id, new_parent_id
                    ),
                    e,
                )
            })
    }

    async fn insert_node(
        &self,
        tx: &TursoTransaction,
        node: NewNode,
    ) -> Result<Node, DatabaseError> {
        tx.ensure_writable("insert_node")?;

        tx.conn
            .execute(
                "INSERT INTO answers (quest, isnode, answer, answertype, parentid)
                 VALUES (?, ?, ?, ?, ?)",
                libsql::params![
                    node.key.clone(),
                    i64::from(node.is_category),
                    node.payload.clone(),
                    node.payload_type.clone(),
                    node.parent_id
                ],
            )
            .await
            .map_err(|e| {
                DatabaseError::from_libsql(format!("Failed to insert node '{}'", node.key), e)
            })?;

        let id = tx.conn.last_insert_rowid();

        Ok(Node {
            id,
            key: node.key,
            is_category: node.is_category,
            payload: node.payload,
            payload_type: node.payload_type,
            parent_id: node.parent_id,
        })
    }

    async fn delete_node(&self, tx: &TursoTransaction, id: i64) -> Result<u64, DatabaseError> {
        tx.ensure_writable("delete_node")?;

        tx.conn
            .execute("DELETE FROM answers WHERE id = ?", libsql::params![id])
            .await
            .map_err(|e| DatabaseError::from_libsql(format!("Failed to delete node {}", id), e))
    }
}
