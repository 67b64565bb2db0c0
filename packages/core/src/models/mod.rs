//! Data Models
//!
//! This module contains the data structures of the answer tree:
//!
//! - `Node` - a row of the self-referential `answers` table
//! - `NewNode` - input for node creation
//! - `NodeKind` - category / subcategory distinction used by swaps
//!
//! Parent/child relations are plain data (`parent_id`), never in-memory
//! back-references.

mod node;

pub use node::{NewNode, Node, NodeKind, NodeList, ValidationError};
