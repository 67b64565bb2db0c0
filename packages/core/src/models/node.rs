//! Answer Tree Node Structures
//!
//! This module defines the `Node` struct stored in the `answers` table and
//! the input type used to create one.
//!
//! # Wire Format
//!
//! Field names on the wire match the public answer API (`quest`, `isnode`,
//! `answer`, `answertype`, `parentid`), while the Rust field names describe
//! their role in the tree.
//!
//! # Examples
//!
//! ```rust
//! use answerdesk_core::models::{NewNode, NodeKind};
//!
//! let category = NewNode::category("Admissions");
//! let question = NewNode::subcategory("How do I apply?", "apply.pdf").with_parent(1);
//!
//! assert_eq!(category.kind(), NodeKind::Category);
//! assert_eq!(question.parent_id, Some(1));
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Validation errors for node input
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid parent reference: {0}")]
    InvalidParent(i64),
}

/// Category / subcategory distinction
///
/// A category may have children; a subcategory is a payload-bearing leaf.
/// Swaps are only allowed between two nodes of the same kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Category,
    Subcategory,
}

impl NodeKind {
    /// Value of the `isnode` flag for this kind
    pub fn is_category(self) -> bool {
        matches!(self, NodeKind::Category)
    }

    /// Whether swapping two nodes of this kind also rewrites their children
    pub fn cascades_to_children(self) -> bool {
        self.is_category()
    }

    fn from_flag(is_category: bool) -> Self {
        if is_category {
            NodeKind::Category
        } else {
            NodeKind::Subcategory
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeKind::Category => write!(f, "category"),
            NodeKind::Subcategory => write!(f, "subcategory"),
        }
    }
}

/// A row of the answer tree.
///
/// # Fields
///
/// - `id`: Positive primary key. Only the identity swap engine rewrites it.
/// - `key`: Globally unique question text or category name
/// - `is_category`: `true` for categories, `false` for payload leaves
/// - `payload`: Attached file name or literal answer text
/// - `payload_type`: Free-form content type tag supplied by the client
/// - `parent_id`: Parent node id, `None` for roots
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub id: i64,

    #[serde(rename = "quest")]
    pub key: String,

    #[serde(rename = "isnode", default)]
    pub is_category: bool,

    #[serde(rename = "answer", default)]
    pub payload: Option<String>,

    #[serde(rename = "answertype", default)]
    pub payload_type: Option<String>,

    #[serde(rename = "parentid", default)]
    pub parent_id: Option<i64>,
}

impl Node {
    pub fn kind(&self) -> NodeKind {
        NodeKind::from_flag(self.is_category)
    }

    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}

/// Input for creating a node. The id is assigned by the database.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewNode {
    #[serde(rename = "quest")]
    pub key: String,

    #[serde(rename = "isnode", default)]
    pub is_category: bool,

    #[serde(rename = "answer", default)]
    pub payload: Option<String>,

    #[serde(rename = "answertype", default)]
    pub payload_type: Option<String>,

    #[serde(rename = "parentid", default)]
    pub parent_id: Option<i64>,
}

impl NewNode {
    /// Create a root category
    pub fn category(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            is_category: true,
            ..Default::default()
        }
    }

    /// Create a root subcategory carrying `payload`
    pub fn subcategory(key: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            is_category: false,
            payload: Some(payload.into()),
            ..Default::default()
        }
    }

    pub fn with_parent(mut self, parent_id: i64) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    pub fn with_payload_type(mut self, payload_type: impl Into<String>) -> Self {
        self.payload_type = Some(payload_type.into());
        self
    }

    pub fn kind(&self) -> NodeKind {
        NodeKind::from_flag(self.is_category)
    }

    /// Check field-level constraints that do not require the database
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.key.trim().is_empty() {
            return Err(ValidationError::MissingField("quest".to_string()));
        }

        if let Some(parent_id) = self.parent_id {
            if parent_id <= 0 {
                return Err(ValidationError::InvalidParent(parent_id));
            }
        }

        Ok(())
    }
}

/// All nodes of the tree ordered by id, with their count
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeList {
    pub rows: Vec<Node>,
    pub count: usize,
}

impl From<Vec<Node>> for NodeList {
    fn from(rows: Vec<Node>) -> Self {
        let count = rows.len();
        Self { rows, count }
    }
}
