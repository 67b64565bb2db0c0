//! Database Error Types
//!
//! This module defines error types for database operations, providing
//! clear error handling for connection, initialization, and query failures.
//!
//! libsql failures are classified by their primary SQLite result code so the
//! service layer can tell lock contention apart from other failures.

use std::path::PathBuf;
use thiserror::Error;

/// SQLite primary result codes we classify on
const SQLITE_BUSY: i32 = 5;
const SQLITE_LOCKED: i32 = 6;
const SQLITE_CONSTRAINT: i32 = 19;

/// Database operation errors
///
/// Covers all error cases for database connection, initialization,
/// and basic operations. Swap and answer specific failures are handled by
/// service-layer error types.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Failed to establish database connection
    #[error("Failed to connect to database at {path}: {source}")]
    ConnectionFailed {
        path: PathBuf,
        source: libsql::Error,
    },

    /// Failed to initialize database schema
    #[error("Failed to initialize database schema: {0}")]
    InitializationFailed(String),

    /// Permission denied when accessing database
    #[error("Permission denied for database path: {path}")]
    PermissionDenied { path: PathBuf },

    /// Failed to create parent directory
    #[error("Failed to create parent directory for database: {0}")]
    DirectoryCreationFailed(#[from] std::io::Error),

    /// libsql operation error
    #[error("Database operation failed: {0}")]
    LibsqlError(#[from] libsql::Error),

    /// Another connection holds a conflicting lock
    #[error("Database is busy: {context}")]
    Busy { context: String },

    /// A primary key, unique, or foreign key constraint rejected a statement
    #[error("Constraint violation: {context}")]
    ConstraintViolation { context: String },

    /// A write was issued through a read-only transaction
    #[error("Write attempted in read-only transaction: {context}")]
    ReadOnlyTransaction { context: String },

    /// SQL execution error with context
    #[error("SQL execution failed: {context}")]
    SqlExecutionError { context: String },
}

impl DatabaseError {
    /// Create a connection failed error
    pub fn connection_failed(path: PathBuf, source: libsql::Error) -> Self {
        Self::ConnectionFailed { path, source }
    }

    /// Create an initialization failed error
    pub fn initialization_failed(msg: impl Into<String>) -> Self {
        Self::InitializationFailed(msg.into())
    }

    /// Create a permission denied error
    pub fn permission_denied(path: PathBuf) -> Self {
        Self::PermissionDenied { path }
    }

    /// Create a read-only transaction error
    pub fn read_only(context: impl Into<String>) -> Self {
        Self::ReadOnlyTransaction {
            context: context.into(),
        }
    }

    /// Create a SQL execution error with context
    pub fn sql_execution(context: impl Into<String>) -> Self {
        Self::SqlExecutionError {
            context: context.into(),
        }
    }

    /// Classify a libsql failure, keeping `context` as the message prefix
    pub fn from_libsql(context: impl Into<String>, err: libsql::Error) -> Self {
        let context = format!("{}: {}", context.into(), err);
        match &err {
            libsql::Error::SqliteFailure(code, _) => match *code & 0xff {
                SQLITE_BUSY | SQLITE_LOCKED => Self::Busy { context },
                SQLITE_CONSTRAINT => Self::ConstraintViolation { context },
                _ => Self::SqlExecutionError { context },
            },
            _ => Self::SqlExecutionError { context },
        }
    }

    /// Whether the failure was caused by lock contention with another writer
    pub fn is_busy(&self) -> bool {
        match self {
            Self::Busy { .. } => true,
            Self::LibsqlError(libsql::Error::SqliteFailure(code, _)) => {
                matches!(*code & 0xff, SQLITE_BUSY | SQLITE_LOCKED)
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_busy_codes_are_classified_as_busy() {
        let err = DatabaseError::from_libsql(
            "Failed to begin transaction",
            libsql::Error::SqliteFailure(5, "database is locked".to_string()),
        );
        assert!(err.is_busy());
        assert!(err.to_string().contains("Failed to begin transaction"));

        // SQLITE_BUSY_SNAPSHOT is an extended code of SQLITE_BUSY
        let err = DatabaseError::from_libsql(
            "Failed to rewrite id",
            libsql::Error::SqliteFailure(517, "database is locked".to_string()),
        );
        assert!(err.is_busy());
    }

    #[test]
    fn test_constraint_codes_are_not_busy() {
        // SQLITE_CONSTRAINT_PRIMARYKEY
        let err = DatabaseError::from_libsql(
            "Failed to rewrite id",
            libsql::Error::SqliteFailure(1555, "UNIQUE constraint failed".to_string()),
        );
        assert!(matches!(err, DatabaseError::ConstraintViolation { .. }));
        assert!(!err.is_busy());
    }

    #[test]
    fn test_other_errors_fall_back_to_sql_execution() {
        let err = DatabaseError::sql_execution("boom");
        assert!(!err.is_busy());
        assert_eq!(err.to_string(), "SQL execution failed: boom");
    }
}
