//! AnswerDesk Core Business Logic Layer
//!
//! This crate provides the data model, persistence and service orchestration
//! for the AnswerDesk FAQ tree: categories that group other nodes, and
//! subcategories that carry an answer payload.
//!
//! # Architecture
//!
//! - **Self-referential table**: every node is a row of `answers`; the tree is
//!   expressed through `parentid`
//! - **libsql/Turso**: Embedded SQLite-compatible database
//! - **Explicit transactions**: store calls take the transaction handle they
//!   run in
//! - **Identity swap**: two nodes exchange ids through a three-step sentinel
//!   rotation inside one write transaction
//!
//! # Modules
//!
//! - [`models`] - Data structures (Node, NewNode, NodeKind)
//! - [`services`] - Business services (AnswerService, IdentitySwapEngine, ...)
//! - [`db`] - Database layer with libsql integration

pub mod db;
pub mod models;
pub mod services;

// Re-export commonly used types
pub use models::*;
pub use services::*;
