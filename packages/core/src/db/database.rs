//! Database Connection Management
//!
//! This module provides the database connection and initialization
//! functionality using libsql for the answer tree.
//!
//! # Architecture
//!
//! - **Path-agnostic**: Accepts any valid PathBuf
//! - **WAL mode**: Readers never block on the single writer
//! - **Immediate uniqueness**: `id` (primary key) and `quest` (UNIQUE) are
//!   checked per statement
//! - **Deferred parent references**: `parentid` is a foreign key checked at
//!   COMMIT, so a swap may break it transiently inside its transaction
//!
//! # Database Connection Patterns
//!
//! **ALWAYS use `connect_with_timeout()` in async functions.** It applies the
//! per-connection pragmas (busy timeout, foreign keys) that every store
//! operation relies on.
//!
//! ```no_run
//! # use answerdesk_core::db::DatabaseService;
//! # use std::path::PathBuf;
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let db_service = DatabaseService::new(PathBuf::from("./data/answers.db")).await?;
//! let conn = db_service.connect_with_timeout().await?;
//! # Ok(())
//! # }
//! ```

use crate::db::error::DatabaseError;
use libsql::{Builder, Database};
use std::path::PathBuf;
use std::sync::Arc;

/// Default time a connection waits for a lock before reporting SQLITE_BUSY
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5000;

/// Database service for managing libsql connection and schema
///
/// # Examples
///
/// ```no_run
/// use answerdesk_core::db::DatabaseService;
/// use std::path::PathBuf;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let db_path = PathBuf::from("/path/to/answers.db");
///     let db_service = DatabaseService::new(db_path).await?;
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct DatabaseService {
    /// libsql database handle (wrapped in Arc for sharing)
    pub db: Arc<Database>,

    /// Path to the database file
    pub db_path: PathBuf,

    /// Busy timeout applied to every connection
    busy_timeout_ms: u64,
}

impl DatabaseService {
    /// Create a new DatabaseService with the default busy timeout
    ///
    /// This will:
    /// 1. Ensure the parent directory exists (create if needed)
    /// 2. Open/create the database file
    /// 3. Initialize the schema (CREATE TABLE IF NOT EXISTS)
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if:
    /// - Parent directory cannot be created
    /// - Database connection fails
    /// - Schema initialization fails
    pub async fn new(db_path: PathBuf) -> Result<Self, DatabaseError> {
        Self::with_busy_timeout(db_path, DEFAULT_BUSY_TIMEOUT_MS).await
    }

    /// Create a new DatabaseService with an explicit busy timeout
    ///
    /// A short timeout makes contended writers fail fast with
    /// `DatabaseError::Busy` instead of waiting for the lock holder.
    pub async fn with_busy_timeout(
        db_path: PathBuf,
        busy_timeout_ms: u64,
    ) -> Result<Self, DatabaseError> {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    if e.kind() == std::io::ErrorKind::PermissionDenied {
                        DatabaseError::permission_denied(db_path.clone())
                    } else {
                        DatabaseError::DirectoryCreationFailed(e)
                    }
                })?;
            }
        }

        let db = Builder::new_local(&db_path)
            .build()
            .await
            .map_err(|e| DatabaseError::connection_failed(db_path.clone(), e))?;

        let service = Self {
            db: Arc::new(db),
            db_path,
            busy_timeout_ms,
        };

        service.initialize_schema().await?;

        Ok(service)
    }

    pub fn busy_timeout_ms(&self) -> u64 {
        self.busy_timeout_ms
    }

    /// Execute a PRAGMA statement
    ///
    /// PRAGMA statements return rows, so we must use query() instead of execute().
    async fn execute_pragma(
        &self,
        conn: &libsql::Connection,
        pragma: &str,
    ) -> Result<(), DatabaseError> {
        let mut stmt = conn.prepare(pragma).await.map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to execute '{}': {}", pragma, e))
        })?;
        let _ = stmt.query(()).await.map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to execute '{}': {}", pragma, e))
        })?;
        Ok(())
    }

    /// Initialize database schema and configuration
    ///
    /// Idempotent: safe to call on an existing database.
    ///
    /// # Schema
    ///
    /// - `answers` table: the self-referential answer tree
    /// - Indexes: parent lookup, category filter
    async fn initialize_schema(&self) -> Result<(), DatabaseError> {
        let conn = self.connect_with_timeout().await?;

        self.execute_pragma(&conn, "PRAGMA journal_mode = WAL").await?;

        // Parent reference is DEFERRABLE INITIALLY DEFERRED: identity swaps
        // move parent keys through a sentinel before children are rewritten.
        conn.execute(
            "CREATE TABLE IF NOT EXISTS answers (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                quest TEXT NOT NULL UNIQUE,
                isnode BOOLEAN NOT NULL DEFAULT FALSE,
                answer TEXT,
                answertype TEXT,
                parentid INTEGER,
                FOREIGN KEY (parentid) REFERENCES answers(id)
                    ON DELETE CASCADE
                    DEFERRABLE INITIALLY DEFERRED
            )",
            (),
        )
        .await
        .map_err(|e| {
            DatabaseError::initialization_failed(format!("Failed to create answers table: {}", e))
        })?;

        self.create_core_indexes(&conn).await?;

        tracing::debug!("Initialized answer schema at {}", self.db_path.display());

        Ok(())
    }

    /// Create core indexes for the answers table
    async fn create_core_indexes(&self, conn: &libsql::Connection) -> Result<(), DatabaseError> {
        // Index on parentid (children lookup, parent rotation)
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_answers_parent ON answers(parentid)",
            (),
        )
        .await
        .map_err(|e| {
            DatabaseError::initialization_failed(format!(
                "Failed to create index 'idx_answers_parent': {}",
                e
            ))
        })?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_answers_isnode ON answers(isnode)",
            (),
        )
        .await
        .map_err(|e| {
            DatabaseError::initialization_failed(format!(
                "Failed to create index 'idx_answers_isnode': {}",
                e
            ))
        })?;

        Ok(())
    }

    /// Get a raw connection without per-connection pragmas
    ///
    /// Only for schema inspection in tests and tools. Store operations must
    /// use `connect_with_timeout()`.
    pub fn connect(&self) -> Result<libsql::Connection, DatabaseError> {
        self.db.connect().map_err(DatabaseError::LibsqlError)
    }

    /// Get an async connection with busy timeout and foreign keys configured
    ///
    /// Sets the busy timeout so concurrent writers wait for the lock instead
    /// of failing immediately, and enables foreign key enforcement (a
    /// per-connection setting in SQLite).
    pub async fn connect_with_timeout(&self) -> Result<libsql::Connection, DatabaseError> {
        self.connect_with_busy_timeout(self.busy_timeout_ms).await
    }

    /// Like `connect_with_timeout()`, with an explicit busy timeout
    ///
    /// A timeout of 0 makes a contended lock fail with SQLITE_BUSY at once,
    /// for callers that wait on the async runtime instead.
    pub async fn connect_with_busy_timeout(
        &self,
        busy_timeout_ms: u64,
    ) -> Result<libsql::Connection, DatabaseError> {
        let conn = self.connect()?;

        self.set_busy_timeout(&conn, busy_timeout_ms).await?;
        self.execute_pragma(&conn, "PRAGMA foreign_keys = ON").await?;

        Ok(conn)
    }

    /// Change the busy timeout of an open connection
    pub async fn set_busy_timeout(
        &self,
        conn: &libsql::Connection,
        busy_timeout_ms: u64,
    ) -> Result<(), DatabaseError> {
        self.execute_pragma(conn, &format!("PRAGMA busy_timeout = {}", busy_timeout_ms))
            .await
    }
}
