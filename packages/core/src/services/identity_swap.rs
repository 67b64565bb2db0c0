//! Identity Swap Engine
//!
//! Exchanges the primary identities of two nodes of the same kind. For
//! categories the parent pointers of their direct children are exchanged as
//! well, so every child keeps pointing at the same parent row under that
//! row's new id.
//!
//! # Sentinel Rotation
//!
//! The store checks primary key uniqueness per statement, so `A.id <-> B.id`
//! cannot be done in one step. Instead the rows are rotated through a
//! sentinel id that no node can hold:
//!
//! ```text
//! id:        A -> sentinel,  B -> A,  sentinel -> B
//! parentid:  A -> sentinel,  B -> A,  sentinel -> B   (categories only)
//! ```
//!
//! Each step's match condition depends on the previous step, so the steps
//! are issued strictly in order, all inside one write transaction. Any
//! failure rolls the whole transaction back; the engine never issues
//! compensating writes. A swap applied twice restores the original tree.
//!
//! Only direct children follow a category swap; grandchildren reference
//! their own parent's id, which does not change.

use crate::db::{NodeStore, TxMode};
use crate::models::NodeKind;
use crate::services::swap_config::{SentinelStrategy, SwapConfig};
use crate::services::transaction::TransactionCoordinator;
use crate::services::validation::ValidationGate;
use crate::services::SwapError;
use serde::Serialize;
use std::sync::Arc;

/// Result of a successful swap
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SwapOutcome {
    pub id_a: i64,
    pub id_b: i64,
    pub kind: NodeKind,
    /// Direct children whose parent pointer was exchanged
    pub children_rewritten: u64,
    /// `false` for the no-op swap of a node with itself
    pub changed: bool,
    /// Confirmation naming both ids
    pub message: String,
}

impl SwapOutcome {
    fn new(id_a: i64, id_b: i64, kind: NodeKind, children_rewritten: u64, changed: bool) -> Self {
        let message = match kind {
            NodeKind::Category => format!(
                "Categories #{} and #{} (and their direct children) were swapped",
                id_a, id_b
            ),
            NodeKind::Subcategory => {
                format!("Subcategories #{} and #{} were swapped", id_a, id_b)
            }
        };

        Self {
            id_a,
            id_b,
            kind,
            children_rewritten,
            changed,
            message,
        }
    }
}

/// The three ordered rewrites that exchange `id_a` and `id_b`
#[derive(Debug, Clone, Copy)]
struct Rotation {
    id_a: i64,
    id_b: i64,
    sentinel: i64,
}

impl Rotation {
    fn steps(&self) -> [(i64, i64); 3] {
        [
            (self.id_a, self.sentinel),
            (self.id_b, self.id_a),
            (self.sentinel, self.id_b),
        ]
    }

    /// Rotate the two rows' own ids. Every step must move exactly one row.
    async fn rotate_ids<S: NodeStore>(&self, store: &S, tx: &S::Tx) -> Result<(), SwapError> {
        for (step, (from, to)) in self.steps().into_iter().enumerate() {
            let rewritten = store.rewrite_id(tx, from, to).await?;
            tracing::debug!(
                "Swap id step {}: {} -> {} ({} rows)",
                step + 1,
                from,
                to,
                rewritten
            );

            if rewritten != 1 {
                return Err(SwapError::conflict(format!(
                    "expected exactly one node with id {} at step {}, found {}",
                    from,
                    step + 1,
                    rewritten
                )));
            }
        }
        Ok(())
    }

    /// Rotate the parent pointers of both rows' direct children.
    /// Returns how many children changed parent.
    async fn rotate_parents<S: NodeStore>(
        &self,
        store: &S,
        tx: &S::Tx,
    ) -> Result<u64, SwapError> {
        let mut counts = [0u64; 3];
        for (step, (from, to)) in self.steps().into_iter().enumerate() {
            counts[step] = store.rewrite_parent(tx, from, to).await?;
            tracing::debug!(
                "Swap parent step {}: {} -> {} ({} rows)",
                step + 1,
                from,
                to,
                counts[step]
            );
        }

        // The third step moves the first step's rows again
        if counts[2] != counts[0] {
            return Err(SwapError::conflict(format!(
                "parked {} children of #{} but restored {}",
                counts[0], self.id_a, counts[2]
            )));
        }

        Ok(counts[0] + counts[1])
    }
}

/// Picks the sentinel for one swap, inside its write transaction
async fn resolve_sentinel<S: NodeStore>(
    store: &S,
    tx: &S::Tx,
    strategy: SentinelStrategy,
) -> Result<i64, SwapError> {
    match strategy {
        SentinelStrategy::Reserved(id) => {
            if store.find_by_id(tx, id).await?.is_some() {
                return Err(SwapError::internal(format!(
                    "reserved sentinel id {} is held by a node",
                    id
                )));
            }
            Ok(id)
        }
        SentinelStrategy::ScratchAboveMax => {
            let max = store.max_id(tx).await?.unwrap_or(0);
            max.checked_add(1)
                .ok_or_else(|| SwapError::internal("id space exhausted, no scratch id available"))
        }
    }
}

/// Orchestrates validation and the sentinel rotation inside a transaction
pub struct IdentitySwapEngine<S: NodeStore> {
    store: Arc<S>,
    gate: ValidationGate<S>,
    coordinator: TransactionCoordinator<S>,
    config: SwapConfig,
}

impl<S: NodeStore + 'static> IdentitySwapEngine<S> {
    /// Create an engine with the default reserved sentinel
    pub fn new(store: Arc<S>) -> Self {
        Self {
            gate: ValidationGate::new(Arc::clone(&store)),
            coordinator: TransactionCoordinator::new(Arc::clone(&store)),
            store,
            config: SwapConfig::default(),
        }
    }

    pub fn with_config(store: Arc<S>, config: SwapConfig) -> Result<Self, SwapError> {
        config.validate().map_err(SwapError::InvalidConfig)?;

        let mut engine = Self::new(store);
        engine.config = config;
        Ok(engine)
    }

    /// Swap two categories and the parent pointers of their direct children
    pub async fn swap_categories(&self, id_a: i64, id_b: i64) -> Result<SwapOutcome, SwapError> {
        self.swap(id_a, id_b, NodeKind::Category).await
    }

    /// Swap the identities of two subcategories
    pub async fn swap_subcategories(
        &self,
        id_a: i64,
        id_b: i64,
    ) -> Result<SwapOutcome, SwapError> {
        self.swap(id_a, id_b, NodeKind::Subcategory).await
    }

    /// Swap the identities of two nodes of `kind`
    ///
    /// # Errors
    ///
    /// - `NotFound` / `KindMismatch`: operands rejected, nothing written
    /// - `Conflict`: write lock contention, or the operands changed between
    ///   validation and the write lock; rolled back, not retried
    /// - `Internal`: any other store failure; rolled back
    pub async fn swap(
        &self,
        id_a: i64,
        id_b: i64,
        kind: NodeKind,
    ) -> Result<SwapOutcome, SwapError> {
        let gate = self.gate.clone();
        self.coordinator
            .run(TxMode::Read, move |tx| {
                Box::pin(async move { gate.validate(tx, id_a, id_b, kind).await })
            })
            .await?;

        if id_a == id_b {
            tracing::debug!("Swap of {} #{} with itself is a no-op", kind, id_a);
            return Ok(SwapOutcome::new(id_a, id_b, kind, 0, false));
        }

        let store = Arc::clone(&self.store);
        let gate = self.gate.clone();
        let strategy = self.config.sentinel;

        let children_rewritten = self
            .coordinator
            .run(TxMode::Write, move |tx| {
                Box::pin(async move {
                    // Operands may have changed since the read check; under
                    // the write lock they no longer can.
                    gate.validate(tx, id_a, id_b, kind)
                        .await
                        .map_err(|e| {
                            if e.is_rejection() {
                                SwapError::conflict(format!(
                                    "operands of swap #{} <-> #{} changed concurrently: {}",
                                    id_a, id_b, e
                                ))
                            } else {
                                e
                            }
                        })?;

                    let sentinel = resolve_sentinel(store.as_ref(), tx, strategy).await?;
                    let rotation = Rotation {
                        id_a,
                        id_b,
                        sentinel,
                    };

                    rotation.rotate_ids(store.as_ref(), tx).await?;

                    let children = if kind.cascades_to_children() {
                        rotation.rotate_parents(store.as_ref(), tx).await?
                    } else {
                        0
                    };

                    Ok::<u64, SwapError>(children)
                })
            })
            .await?;

        tracing::info!(
            "Swapped {} #{} and #{} ({} children rewritten)",
            kind,
            id_a,
            id_b,
            children_rewritten
        );

        Ok(SwapOutcome::new(id_a, id_b, kind, children_rewritten, true))
    }
}

// Comprehensive tests in separate module
#[cfg(test)]
#[path = "identity_swap_test.rs"]
mod identity_swap_test;
