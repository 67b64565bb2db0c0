//! Database Layer
//!
//! This module handles all database interactions using libsql:
//!
//! - Database initialization and connection management
//! - The `answers` table: a flat, self-referential tree keyed by integer id
//! - The `NodeStore` abstraction with explicit transaction handles
//!
//! # Architecture
//!
//! The store enforces primary key and `quest` uniqueness per statement, and
//! the parent reference at commit. Services above this layer never see SQL;
//! they speak `NodeStore`.

mod database;
mod error;
mod node_store;
mod turso_store;

pub use database::{DatabaseService, DEFAULT_BUSY_TIMEOUT_MS};
pub use error::DatabaseError;
pub use node_store::{NodeStore, TxMode};
pub use turso_store::{TursoStore, TursoTransaction};
