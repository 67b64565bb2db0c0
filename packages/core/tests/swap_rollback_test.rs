//! Swap Rollback Tests
//!
//! Injects a store failure at every rewrite step of a category swap and
//! verifies the tree is restored exactly. A busy failure is reported as
//! `Conflict`, any other failure as `Internal`.
//!
//! Also covers the swaps that must abort with `Conflict`: a rewrite that
//! matches an unexpected number of rows, and operands changed by another
//! writer between validation and the write scope.

#[cfg(test)]
mod swap_rollback_tests {
    use answerdesk_core::db::{
        DatabaseError, DatabaseService, NodeStore, TursoStore, TursoTransaction, TxMode,
    };
    use answerdesk_core::models::{NewNode, Node};
    use answerdesk_core::services::{IdentitySwapEngine, SwapError};
    use anyhow::Result;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Arc;
    use tempfile::TempDir;

    /// Rewrites issued by one category swap: three for ids, three for parents
    const CATEGORY_SWAP_REWRITES: usize = 6;

    /// What the wrapped store does wrong
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Fault {
        None,
        /// Fail the n-th rewrite (ids and parents counted together)
        FailRewrite { at: usize, busy: bool },
        /// Report 0 rows for the n-th rewrite without touching the table
        SkipRewrite { at: usize },
        /// Report one extra row for the last parent rewrite
        MiscountParentRestore,
        /// Another writer deletes this node just before the write scope opens
        DeleteBeforeWrite(i64),
        /// Another writer turns this category into a subcategory just before
        /// the write scope opens
        DemoteBeforeWrite(i64),
    }

    /// Delegates to `TursoStore` but misbehaves according to `fault`
    struct FailingStore {
        inner: TursoStore,
        rewrites: AtomicUsize,
        interfered: AtomicBool,
        fault: Fault,
    }

    impl FailingStore {
        fn new(inner: TursoStore, fault: Fault) -> Self {
            Self {
                inner,
                rewrites: AtomicUsize::new(0),
                interfered: AtomicBool::new(false),
                fault,
            }
        }

        /// Count a rewrite; fails it when it is the injected one
        fn next_rewrite(&self) -> Result<usize, DatabaseError> {
            let call = self.rewrites.fetch_add(1, Ordering::SeqCst) + 1;

            match self.fault {
                Fault::FailRewrite { at, busy } if at == call => {
                    let context = format!("injected failure at rewrite {}", call);
                    if busy {
                        Err(DatabaseError::Busy { context })
                    } else {
                        Err(DatabaseError::sql_execution(context))
                    }
                }
                _ => Ok(call),
            }
        }

        /// Commit a concurrent change on a separate connection, once
        async fn interfere(&self) -> Result<(), DatabaseError> {
            let (sql, id) = match self.fault {
                Fault::DeleteBeforeWrite(id) => ("DELETE FROM answers WHERE id = ?", id),
                Fault::DemoteBeforeWrite(id) => ("UPDATE answers SET isnode = 0 WHERE id = ?", id),
                _ => return Ok(()),
            };
            if self.interfered.swap(true, Ordering::SeqCst) {
                return Ok(());
            }

            let conn = self.inner.database().connect_with_timeout().await?;
            conn.execute(sql, libsql::params![id]).await?;
            Ok(())
        }
    }

    #[async_trait]
    impl NodeStore for FailingStore {
        type Tx = TursoTransaction;

        async fn begin(&self, mode: TxMode) -> Result<Self::Tx, DatabaseError> {
            if mode == TxMode::Write {
                self.interfere().await?;
            }
            self.inner.begin(mode).await
        }

        async fn commit(&self, tx: Self::Tx) -> Result<(), DatabaseError> {
            self.inner.commit(tx).await
        }

        async fn rollback(&self, tx: Self::Tx) -> Result<(), DatabaseError> {
            self.inner.rollback(tx).await
        }

        async fn find_by_id(&self, tx: &Self::Tx, id: i64) -> Result<Option<Node>, DatabaseError> {
            self.inner.find_by_id(tx, id).await
        }

        async fn find_by_key(
            &self,
            tx: &Self::Tx,
            key: &str,
        ) -> Result<Option<Node>, DatabaseError> {
            self.inner.find_by_key(tx, key).await
        }

        async fn list_nodes(&self, tx: &Self::Tx) -> Result<Vec<Node>, DatabaseError> {
            self.inner.list_nodes(tx).await
        }

        async fn max_id(&self, tx: &Self::Tx) -> Result<Option<i64>, DatabaseError> {
            self.inner.max_id(tx).await
        }

        async fn rewrite_id(
            &self,
            tx: &Self::Tx,
            match_id: i64,
            new_id: i64,
        ) -> Result<u64, DatabaseError> {
            let call = self.next_rewrite()?;
            if self.fault == (Fault::SkipRewrite { at: call }) {
                return Ok(0);
            }
            self.inner.rewrite_id(tx, match_id, new_id).await
        }

        async fn rewrite_parent(
            &self,
            tx: &Self::Tx,
            match_parent_id: i64,
            new_parent_id: i64,
        ) -> Result<u64, DatabaseError> {
            let call = self.next_rewrite()?;
            let rewritten = self
                .inner
                .rewrite_parent(tx, match_parent_id, new_parent_id)
                .await?;

            if self.fault == Fault::MiscountParentRestore && call == CATEGORY_SWAP_REWRITES {
                return Ok(rewritten + 1);
            }
            Ok(rewritten)
        }

        async fn insert_node(&self, tx: &Self::Tx, node: NewNode) -> Result<Node, DatabaseError> {
            self.inner.insert_node(tx, node).await
        }

        async fn delete_node(&self, tx: &Self::Tx, id: i64) -> Result<u64, DatabaseError> {
            self.inner.delete_node(tx, id).await
        }
    }

    /// Helper to create a seeded store
    /// Returns (store, cat1, cat2, _temp_dir)
    async fn create_seeded_store() -> Result<(TursoStore, i64, i64, TempDir)> {
        let temp_dir = TempDir::new()?;
        let db = DatabaseService::new(temp_dir.path().join("test.db")).await?;
        let store = TursoStore::new(Arc::new(db));

        let tx = store.begin(TxMode::Write).await?;
        let cat1 = store.insert_node(&tx, NewNode::category("cat1")).await?;
        let cat2 = store.insert_node(&tx, NewNode::category("cat2")).await?;
        store
            .insert_node(&tx, NewNode::subcategory("q1", "a1").with_parent(cat1.id))
            .await?;
        store
            .insert_node(&tx, NewNode::category("sub").with_parent(cat1.id))
            .await?;
        store
            .insert_node(&tx, NewNode::subcategory("q2", "a2").with_parent(cat2.id))
            .await?;
        store.commit(tx).await?;

        Ok((store, cat1.id, cat2.id, temp_dir))
    }

    async fn snapshot<S: NodeStore>(store: &S) -> Result<Vec<Node>> {
        let tx = store.begin(TxMode::Read).await?;
        let nodes = store.list_nodes(&tx).await?;
        store.rollback(tx).await?;
        Ok(nodes)
    }

    #[tokio::test]
    async fn test_failure_at_every_step_restores_tree() -> Result<()> {
        for fail_at in 1..=CATEGORY_SWAP_REWRITES {
            let (inner, cat1, cat2, _temp_dir) = create_seeded_store().await?;
            let before = snapshot(&inner).await?;

            let fault = Fault::FailRewrite {
                at: fail_at,
                busy: false,
            };
            let store = Arc::new(FailingStore::new(inner, fault));
            let engine = IdentitySwapEngine::new(Arc::clone(&store));

            let err = engine.swap_categories(cat1, cat2).await.unwrap_err();
            assert!(
                matches!(err, SwapError::Internal(_)),
                "step {}: expected Internal, got {:?}",
                fail_at,
                err
            );
            assert_eq!(
                snapshot(store.as_ref()).await?,
                before,
                "step {}: tree not restored",
                fail_at
            );
        }

        Ok(())
    }

    #[tokio::test]
    async fn test_busy_failure_mid_swap_is_conflict() -> Result<()> {
        let (inner, cat1, cat2, _temp_dir) = create_seeded_store().await?;
        let before = snapshot(&inner).await?;

        let store = Arc::new(FailingStore::new(inner, Fault::FailRewrite { at: 4, busy: true }));
        let engine = IdentitySwapEngine::new(Arc::clone(&store));

        let err = engine.swap_categories(cat1, cat2).await.unwrap_err();
        assert!(matches!(err, SwapError::Conflict(_)));
        assert_eq!(snapshot(store.as_ref()).await?, before);

        Ok(())
    }

    #[tokio::test]
    async fn test_no_failure_completes_all_rewrites() -> Result<()> {
        let (inner, cat1, cat2, _temp_dir) = create_seeded_store().await?;

        let store = Arc::new(FailingStore::new(inner, Fault::None));
        let engine = IdentitySwapEngine::new(Arc::clone(&store));

        let outcome = engine.swap_categories(cat1, cat2).await?;
        assert_eq!(outcome.children_rewritten, 3);
        assert_eq!(
            store.rewrites.load(Ordering::SeqCst),
            CATEGORY_SWAP_REWRITES
        );

        Ok(())
    }

    #[tokio::test]
    async fn test_unexpected_id_row_count_is_conflict() -> Result<()> {
        let (inner, cat1, cat2, _temp_dir) = create_seeded_store().await?;
        let before = snapshot(&inner).await?;

        // Step 1 really moved cat1 to the sentinel; step 2 claims no match
        let store = Arc::new(FailingStore::new(inner, Fault::SkipRewrite { at: 2 }));
        let engine = IdentitySwapEngine::new(Arc::clone(&store));

        let err = engine.swap_categories(cat1, cat2).await.unwrap_err();
        assert!(matches!(err, SwapError::Conflict(_)), "got {:?}", err);
        assert_eq!(snapshot(store.as_ref()).await?, before);

        Ok(())
    }

    #[tokio::test]
    async fn test_parent_restore_miscount_is_conflict() -> Result<()> {
        let (inner, cat1, cat2, _temp_dir) = create_seeded_store().await?;
        let before = snapshot(&inner).await?;

        let store = Arc::new(FailingStore::new(inner, Fault::MiscountParentRestore));
        let engine = IdentitySwapEngine::new(Arc::clone(&store));

        let err = engine.swap_categories(cat1, cat2).await.unwrap_err();
        assert!(matches!(err, SwapError::Conflict(_)), "got {:?}", err);
        assert_eq!(snapshot(store.as_ref()).await?, before);

        Ok(())
    }

    #[tokio::test]
    async fn test_operand_deleted_before_write_scope_is_conflict() -> Result<()> {
        let (inner, cat1, cat2, _temp_dir) = create_seeded_store().await?;
        let before = snapshot(&inner).await?;

        let store = Arc::new(FailingStore::new(inner, Fault::DeleteBeforeWrite(cat2)));
        let engine = IdentitySwapEngine::new(Arc::clone(&store));

        let err = engine.swap_categories(cat1, cat2).await.unwrap_err();
        assert!(matches!(err, SwapError::Conflict(_)), "got {:?}", err);

        // Only the concurrent delete (and its cascade) is visible
        let expected: Vec<Node> = before
            .into_iter()
            .filter(|n| n.id != cat2 && n.parent_id != Some(cat2))
            .collect();
        assert_eq!(snapshot(store.as_ref()).await?, expected);

        Ok(())
    }

    #[tokio::test]
    async fn test_operand_demoted_before_write_scope_is_conflict() -> Result<()> {
        let (inner, cat1, cat2, _temp_dir) = create_seeded_store().await?;
        let before = snapshot(&inner).await?;

        let store = Arc::new(FailingStore::new(inner, Fault::DemoteBeforeWrite(cat1)));
        let engine = IdentitySwapEngine::new(Arc::clone(&store));

        let err = engine.swap_categories(cat1, cat2).await.unwrap_err();
        assert!(matches!(err, SwapError::Conflict(_)), "got {:?}", err);

        let expected: Vec<Node> = before
            .into_iter()
            .map(|mut n| {
                if n.id == cat1 {
                    n.is_category = false;
                }
                n
            })
            .collect();
        assert_eq!(snapshot(store.as_ref()).await?, expected);

        Ok(())
    }
}
