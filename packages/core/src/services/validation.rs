//! Swap operand validation
//!
//! Read-only checks run before a swap mutates anything: both operands must
//! exist and both must be of the requested kind.

use crate::db::NodeStore;
use crate::models::{Node, NodeKind};
use crate::services::SwapError;
use std::sync::Arc;

pub struct ValidationGate<S: NodeStore> {
    store: Arc<S>,
}

impl<S: NodeStore> Clone for ValidationGate<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: NodeStore> ValidationGate<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Look up both operands and check them against `kind`
    ///
    /// Existence is checked for both operands before kind, so a missing
    /// operand is always reported as `NotFound`.
    pub async fn validate(
        &self,
        tx: &S::Tx,
        id_a: i64,
        id_b: i64,
        kind: NodeKind,
    ) -> Result<(Node, Node), SwapError> {
        let a = self.store.find_by_id(tx, id_a).await?;
        let b = self.store.find_by_id(tx, id_b).await?;

        let a = a.ok_or_else(|| SwapError::not_found(id_a))?;
        let b = b.ok_or_else(|| SwapError::not_found(id_b))?;

        Self::check_kind(&a, kind)?;
        Self::check_kind(&b, kind)?;

        Ok((a, b))
    }

    fn check_kind(node: &Node, expected: NodeKind) -> Result<(), SwapError> {
        let actual = node.kind();
        if actual != expected {
            return Err(SwapError::kind_mismatch(node.id, expected, actual));
        }
        Ok(())
    }
}
