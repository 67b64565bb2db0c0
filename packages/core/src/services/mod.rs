//! Business Services
//!
//! This module contains the core business logic services:
//!
//! - `AnswerService` - Node lifecycle and swap operations used by the server
//! - `IdentitySwapEngine` - Sentinel rotation of two node identities
//! - `ValidationGate` - Existence and kind checks on swap operands
//! - `TransactionCoordinator` - Commit/rollback scope around a unit of work
//!
//! Services coordinate between the database layer and application logic,
//! implementing business rules and orchestrating multi-statement operations.

pub mod answer_service;
pub mod error;
pub mod identity_swap;
pub mod swap_config;
pub mod transaction;
pub mod validation;

pub use answer_service::AnswerService;
pub use error::{AnswerServiceError, SwapError};
pub use identity_swap::{IdentitySwapEngine, SwapOutcome};
pub use swap_config::{SentinelStrategy, SwapConfig, DEFAULT_SENTINEL_ID};
pub use transaction::TransactionCoordinator;
pub use validation::ValidationGate;
