//! Answer Service - Node Lifecycle and Swap Operations
//!
//! Front door used by the HTTP layer:
//!
//! - create, list, get and delete nodes of the answer tree
//! - swap two categories (with their direct children) or two subcategories
//!
//! Every operation runs inside one store transaction opened through the
//! `TransactionCoordinator`. Swaps are delegated to the `IdentitySwapEngine`.

use crate::db::{NodeStore, TxMode};
use crate::models::{NewNode, Node, NodeList};
use crate::services::error::AnswerServiceError;
use crate::services::identity_swap::{IdentitySwapEngine, SwapOutcome};
use crate::services::swap_config::SwapConfig;
use crate::services::transaction::TransactionCoordinator;
use std::sync::Arc;

pub struct AnswerService<S: NodeStore> {
    store: Arc<S>,
    coordinator: TransactionCoordinator<S>,
    swap_engine: IdentitySwapEngine<S>,
}

impl<S: NodeStore + 'static> AnswerService<S> {
    /// Create the service; fails if `swap_config` is unusable
    pub fn new(store: Arc<S>, swap_config: SwapConfig) -> Result<Self, AnswerServiceError> {
        let swap_engine = IdentitySwapEngine::with_config(Arc::clone(&store), swap_config)?;

        Ok(Self {
            coordinator: TransactionCoordinator::new(Arc::clone(&store)),
            swap_engine,
            store,
        })
    }

    /// Create a node
    ///
    /// The parent, when given, must be an existing category. A node created
    /// without a payload carries its own key as payload.
    ///
    /// # Errors
    ///
    /// - `ValidationFailed` if the key is blank or the parent id is not positive
    /// - `DuplicateKey` if another node already uses the key
    /// - `InvalidParent` if the parent does not exist or is not a category
    pub async fn create(&self, mut node: NewNode) -> Result<Node, AnswerServiceError> {
        node.validate()?;

        node.key = node.key.trim().to_string();
        if node.payload.is_none() {
            node.payload = Some(node.key.clone());
        }

        let store = Arc::clone(&self.store);
        let created = self
            .coordinator
            .run(TxMode::Write, move |tx| {
                Box::pin(async move {
                    if store.find_by_key(tx, &node.key).await?.is_some() {
                        return Err(AnswerServiceError::duplicate_key(node.key));
                    }

                    if let Some(parent_id) = node.parent_id {
                        match store.find_by_id(tx, parent_id).await? {
                            Some(parent) if parent.is_category => {}
                            _ => return Err(AnswerServiceError::invalid_parent(parent_id)),
                        }
                    }

                    let created = store.insert_node(tx, node).await?;
                    Ok::<Node, AnswerServiceError>(created)
                })
            })
            .await?;

        tracing::info!(
            "Created {} #{} '{}'",
            created.kind(),
            created.id,
            created.key
        );
        Ok(created)
    }

    /// All nodes ordered by id
    pub async fn list(&self) -> Result<NodeList, AnswerServiceError> {
        let store = Arc::clone(&self.store);
        let rows = self
            .coordinator
            .run(TxMode::Read, move |tx| {
                Box::pin(async move { Ok::<_, AnswerServiceError>(store.list_nodes(tx).await?) })
            })
            .await?;

        Ok(NodeList::from(rows))
    }

    pub async fn get(&self, id: i64) -> Result<Node, AnswerServiceError> {
        let store = Arc::clone(&self.store);
        self.coordinator
            .run(TxMode::Read, move |tx| {
                Box::pin(async move {
                    store
                        .find_by_id(tx, id)
                        .await?
                        .ok_or_else(|| AnswerServiceError::node_not_found(id))
                })
            })
            .await
    }

    /// Delete a node and, through the cascading parent reference, its subtree.
    /// Returns the deleted node.
    pub async fn delete(&self, id: i64) -> Result<Node, AnswerServiceError> {
        let store = Arc::clone(&self.store);
        let deleted = self
            .coordinator
            .run(TxMode::Write, move |tx| {
                Box::pin(async move {
                    let node = store
                        .find_by_id(tx, id)
                        .await?
                        .ok_or_else(|| AnswerServiceError::node_not_found(id))?;

                    if store.delete_node(tx, id).await? != 1 {
                        return Err(AnswerServiceError::node_not_found(id));
                    }
                    Ok::<Node, AnswerServiceError>(node)
                })
            })
            .await?;

        tracing::info!("Deleted {} #{} '{}'", deleted.kind(), deleted.id, deleted.key);
        Ok(deleted)
    }

    /// Swap two categories and the parent pointers of their direct children
    pub async fn swap_categories(
        &self,
        id_a: i64,
        id_b: i64,
    ) -> Result<SwapOutcome, AnswerServiceError> {
        Ok(self.swap_engine.swap_categories(id_a, id_b).await?)
    }

    /// Swap the identities of two subcategories
    pub async fn swap_subcategories(
        &self,
        id_a: i64,
        id_b: i64,
    ) -> Result<SwapOutcome, AnswerServiceError> {
        Ok(self.swap_engine.swap_subcategories(id_a, id_b).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{DatabaseService, TursoStore};
    use crate::models::ValidationError;
    use crate::services::swap_config::SentinelStrategy;
    use crate::services::SwapError;
    use tempfile::TempDir;

    async fn create_test_service() -> (AnswerService<TursoStore>, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");
        let db = Arc::new(DatabaseService::new(db_path).await.unwrap());
        let store = Arc::new(TursoStore::new(db));
        let service = AnswerService::new(store, SwapConfig::default()).unwrap();
        (service, temp_dir)
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let (service, _temp) = create_test_service().await;

        let category = service.create(NewNode::category("Billing")).await.unwrap();
        assert!(category.id > 0);
        assert!(category.is_category);
        // Key doubles as payload when none is given
        assert_eq!(category.payload.as_deref(), Some("Billing"));

        let leaf = service
            .create(
                NewNode::subcategory("How do I pay?", "invoice.pdf")
                    .with_parent(category.id)
                    .with_payload_type("file"),
            )
            .await
            .unwrap();
        assert_eq!(leaf.parent_id, Some(category.id));

        assert_eq!(service.get(leaf.id).await.unwrap(), leaf);
    }

    #[tokio::test]
    async fn test_create_rejects_duplicate_key() {
        let (service, _temp) = create_test_service().await;
        service.create(NewNode::category("Billing")).await.unwrap();

        let err = service
            .create(NewNode::category("Billing"))
            .await
            .unwrap_err();
        assert!(matches!(err, AnswerServiceError::DuplicateKey { key } if key == "Billing"));
        assert_eq!(service.list().await.unwrap().count, 1);
    }

    #[tokio::test]
    async fn test_create_rejects_bad_parent() {
        let (service, _temp) = create_test_service().await;

        let err = service
            .create(NewNode::category("orphan").with_parent(42))
            .await
            .unwrap_err();
        assert!(matches!(err, AnswerServiceError::InvalidParent { parent_id: 42 }));

        let leaf = service
            .create(NewNode::subcategory("leaf", "x"))
            .await
            .unwrap();
        let err = service
            .create(NewNode::subcategory("under leaf", "y").with_parent(leaf.id))
            .await
            .unwrap_err();
        assert!(matches!(err, AnswerServiceError::InvalidParent { .. }));
    }

    #[tokio::test]
    async fn test_create_rejects_blank_key() {
        let (service, _temp) = create_test_service().await;

        let err = service.create(NewNode::category("  ")).await.unwrap_err();
        assert!(matches!(
            err,
            AnswerServiceError::ValidationFailed(ValidationError::MissingField(_))
        ));
    }

    #[tokio::test]
    async fn test_list_is_ordered_by_id() {
        let (service, _temp) = create_test_service().await;
        let a = service.create(NewNode::category("a")).await.unwrap();
        let b = service.create(NewNode::category("b")).await.unwrap();

        service.swap_categories(a.id, b.id).await.unwrap();

        let list = service.list().await.unwrap();
        assert_eq!(list.count, 2);
        assert_eq!(list.rows[0].id, a.id);
        assert_eq!(list.rows[0].key, "b");
        assert_eq!(list.rows[1].key, "a");
    }

    #[tokio::test]
    async fn test_delete_cascades_to_children() {
        let (service, _temp) = create_test_service().await;
        let category = service.create(NewNode::category("cat")).await.unwrap();
        service
            .create(NewNode::subcategory("q", "a").with_parent(category.id))
            .await
            .unwrap();
        let keep = service.create(NewNode::category("keep")).await.unwrap();

        let deleted = service.delete(category.id).await.unwrap();
        assert_eq!(deleted, category);

        let list = service.list().await.unwrap();
        assert_eq!(list.rows, vec![keep]);

        let err = service.delete(category.id).await.unwrap_err();
        assert!(matches!(err, AnswerServiceError::NodeNotFound { .. }));
    }

    #[tokio::test]
    async fn test_swap_errors_pass_through() {
        let (service, _temp) = create_test_service().await;
        let category = service.create(NewNode::category("cat")).await.unwrap();

        let err = service
            .swap_subcategories(category.id, 7)
            .await
            .unwrap_err();
        assert!(matches!(err, AnswerServiceError::Swap(SwapError::NotFound { id: 7 })));
    }

    #[tokio::test]
    async fn test_invalid_swap_config_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let db = Arc::new(
            DatabaseService::new(temp_dir.path().join("test.db"))
                .await
                .unwrap(),
        );
        let store = Arc::new(TursoStore::new(db));

        let result = AnswerService::new(
            store,
            SwapConfig::with_sentinel(SentinelStrategy::Reserved(10)),
        );
        assert!(matches!(
            result,
            Err(AnswerServiceError::Swap(SwapError::InvalidConfig(_)))
        ));
    }
}
