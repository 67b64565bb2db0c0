//! Service Layer Error Types
//!
//! This module defines error types for service-layer operations:
//!
//! - `SwapError` - the identity swap taxonomy (not found, kind mismatch,
//!   conflict, internal)
//! - `AnswerServiceError` - node lifecycle operations, wrapping `SwapError`

use crate::db::DatabaseError;
use crate::models::{NodeKind, ValidationError};
use thiserror::Error;

/// Identity swap errors
///
/// `NotFound` and `KindMismatch` are reported before any write scope is
/// opened. `Conflict` and `Internal` are reported after the write scope has
/// been rolled back; in every case the tree is left exactly as it was.
#[derive(Error, Debug)]
pub enum SwapError {
    /// An operand id does not resolve to a node
    #[error("Node not found: {id}")]
    NotFound { id: i64 },

    /// An operand is not of the kind the swap requires
    #[error("Node {id} is a {actual}, expected a {expected}")]
    KindMismatch {
        id: i64,
        expected: NodeKind,
        actual: NodeKind,
    },

    /// A concurrent mutation interfered (lock contention, unexpected row
    /// count, operands changed under the write lock)
    #[error("Swap conflict: {0}")]
    Conflict(String),

    /// Any other failure inside the write scope
    #[error("Swap failed: {0}")]
    Internal(String),

    /// Engine constructed with an unusable configuration
    #[error("Invalid swap configuration: {0}")]
    InvalidConfig(String),
}

impl SwapError {
    /// Create a not found error
    pub fn not_found(id: i64) -> Self {
        Self::NotFound { id }
    }

    /// Create a kind mismatch error
    pub fn kind_mismatch(id: i64, expected: NodeKind, actual: NodeKind) -> Self {
        Self::KindMismatch {
            id,
            expected,
            actual,
        }
    }

    /// Create a conflict error
    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Whether the error was raised by validation, before any write scope
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::KindMismatch { .. })
    }
}

impl From<DatabaseError> for SwapError {
    fn from(err: DatabaseError) -> Self {
        if err.is_busy() {
            Self::Conflict(err.to_string())
        } else {
            Self::Internal(err.to_string())
        }
    }
}

/// Answer service errors
///
/// Provides high-level error types for node lifecycle operations,
/// with detailed context and proper error chaining.
#[derive(Error, Debug)]
pub enum AnswerServiceError {
    /// Node not found by ID
    #[error("Node not found: {id}")]
    NodeNotFound { id: i64 },

    /// A node with the same key already exists
    #[error("Node with key '{key}' already exists")]
    DuplicateKey { key: String },

    /// Parent does not exist or cannot have children
    #[error("Invalid parent node: {parent_id}")]
    InvalidParent { parent_id: i64 },

    /// Input failed field validation
    #[error("Node validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),

    /// Identity swap failed
    #[error(transparent)]
    Swap(#[from] SwapError),

    /// Database operation failed
    #[error("Database operation failed: {0}")]
    DatabaseError(#[from] DatabaseError),
}

impl AnswerServiceError {
    /// Create a node not found error
    pub fn node_not_found(id: i64) -> Self {
        Self::NodeNotFound { id }
    }

    /// Create a duplicate key error
    pub fn duplicate_key(key: impl Into<String>) -> Self {
        Self::DuplicateKey { key: key.into() }
    }

    /// Create an invalid parent error
    pub fn invalid_parent(parent_id: i64) -> Self {
        Self::InvalidParent { parent_id }
    }
}
