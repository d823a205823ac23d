//! Persistence contract for admitted records.
//!
//! Storage engines are external; the pipeline only ever asks a store to
//! create a node. [`InMemoryKnowledgeStore`] is the local implementation
//! used by the CLI and the tests.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::node::{Category, KnowledgeNode, NodeError, NodeStatus, Placement};
use crate::types::TriDimensionalRecord;

/// Error types for store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Backend not reachable
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// Node not found
    #[error("Node not found: {0}")]
    NotFound(String),

    /// Lifecycle violation
    #[error(transparent)]
    Lifecycle(#[from] NodeError),
}

/// Creates knowledge nodes for admitted records.
#[async_trait]
pub trait KnowledgeStore: Send + Sync {
    /// Create a node for `record` at the given placement.
    async fn store(
        &self,
        record: TriDimensionalRecord,
        placement: Placement,
    ) -> Result<KnowledgeNode, StoreError>;
}

/// Node store kept in process memory.
pub struct InMemoryKnowledgeStore {
    nodes: Arc<RwLock<HashMap<String, KnowledgeNode>>>,
}

impl InMemoryKnowledgeStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            nodes: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Get a node by ID.
    pub async fn get(&self, id: &str) -> Option<KnowledgeNode> {
        let nodes = self.nodes.read().await;
        nodes.get(id).cloned()
    }

    /// Nodes in a category, oldest first.
    pub async fn list_by_category(&self, category: Category) -> Vec<KnowledgeNode> {
        let nodes = self.nodes.read().await;
        let mut found: Vec<_> = nodes
            .values()
            .filter(|n| n.category == category)
            .cloned()
            .collect();
        found.sort_by_key(|n| n.created_at);
        found
    }

    /// Move a node to its next lifecycle status.
    pub async fn transition(&self, id: &str, to: NodeStatus) -> Result<KnowledgeNode, StoreError> {
        let mut nodes = self.nodes.write().await;
        let node = nodes
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        node.transition(to)?;

        info!(node_id = %id, status = %to.as_str(), "Node status changed");
        Ok(node.clone())
    }

    /// Number of stored nodes.
    pub async fn count(&self) -> usize {
        let nodes = self.nodes.read().await;
        nodes.len()
    }
}

impl Default for InMemoryKnowledgeStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KnowledgeStore for InMemoryKnowledgeStore {
    async fn store(
        &self,
        record: TriDimensionalRecord,
        placement: Placement,
    ) -> Result<KnowledgeNode, StoreError> {
        let node = KnowledgeNode::new(record, placement);

        debug!(
            node_id = %node.id,
            category = %node.category,
            layer = %node.layer,
            "Storing knowledge node"
        );

        let mut nodes = self.nodes.write().await;
        nodes.insert(node.id.clone(), node.clone());
        Ok(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::StorageLayer;
    use crate::translator::{KnowledgeTranslator, Translator, KNOWLEDGE_TEMPLATE};
    use crate::types::ParsedContent;

    async fn record() -> TriDimensionalRecord {
        let translator = KnowledgeTranslator::with_knowledge_template();
        let parsed = ParsedContent::new(
            "raw-1",
            "Vaccination et immunité",
            "Les données hospitalières confirment la baisse des infections après la campagne.",
        );
        translator.translate(KNOWLEDGE_TEMPLATE, &parsed).await.unwrap()
    }

    fn placement() -> Placement {
        Placement {
            category: Category::Health,
            layer: StorageLayer::Narratives,
            position: 42,
            created_by: "test".to_string(),
        }
    }

    #[tokio::test]
    async fn test_store_creates_active_node() {
        let store = InMemoryKnowledgeStore::new();
        let node = store.store(record().await, placement()).await.unwrap();

        assert_eq!(node.status, NodeStatus::Active);
        assert_eq!(node.depth, 2);
        assert_eq!(node.parent_id.as_deref(), Some("health/narratives"));
        assert_eq!(node.title, "Vaccination et immunité");
        assert_eq!(store.list_by_category(Category::Health).await.len(), 1);
    }

    #[tokio::test]
    async fn test_status_transitions_are_one_way() {
        let store = InMemoryKnowledgeStore::new();
        let node = store.store(record().await, placement()).await.unwrap();

        // Skipping polishing is not allowed.
        assert!(store.transition(&node.id, NodeStatus::Archived).await.is_err());

        store.transition(&node.id, NodeStatus::Polishing).await.unwrap();
        let archived = store.transition(&node.id, NodeStatus::Archived).await.unwrap();
        assert_eq!(archived.status, NodeStatus::Archived);

        // No way back.
        assert!(store.transition(&node.id, NodeStatus::Active).await.is_err());
    }

    #[tokio::test]
    async fn test_transition_unknown_node() {
        let store = InMemoryKnowledgeStore::new();
        let err = store.transition("missing", NodeStatus::Polishing).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }
}
