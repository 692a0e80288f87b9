//! Direct node management outside the conversational pipeline.

use crate::models::{Frequency, Node, NodeId, NodePatch};
use crate::storage::DocumentStore;
use crate::{Error, Result};
use chrono::Utc;
use std::sync::Arc;

/// Service for listing, editing and deleting nodes.
#[derive(Clone)]
pub struct NodeService {
    store: Arc<dyn DocumentStore>,
}

impl NodeService {
    /// Creates a new node service.
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Lists the caller's live nodes, optionally for a single frequency.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub fn list(&self, user_id: &str, frequency: Option<Frequency>) -> Result<Vec<Node>> {
        self.store.list_nodes(user_id, frequency, false)
    }

    /// Applies a patch and bumps `updated_at` and `last_touched`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] for an empty title, [`Error::NotFound`]
    /// when the node is missing and [`Error::Forbidden`] when it is foreign.
    pub fn update(&self, user_id: &str, node_id: &NodeId, patch: NodePatch) -> Result<Node> {
        let mut node = self.owned(user_id, node_id)?;

        if let Some(title) = patch.title {
            let title = title.trim();
            if title.is_empty() {
                return Err(Error::InvalidInput("Title cannot be empty".to_string()));
            }
            node.title = title.to_string();
        }
        if let Some(content) = patch.content {
            node.content = content;
        }
        if let Some(tags) = patch.tags {
            node.tags = tags;
        }
        if let Some(position) = patch.position {
            node.position = position;
        }
        if let Some(node_type) = patch.node_type {
            node.node_type = node_type;
        }

        let now = Utc::now();
        node.updated_at = now;
        node.last_touched = now;
        self.store.upsert_node(&node)?;
        Ok(node)
    }

    /// Hard-deletes a node.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] when the node is missing and
    /// [`Error::Forbidden`] when it is foreign.
    pub fn delete(&self, user_id: &str, node_id: &NodeId) -> Result<()> {
        let node = self.owned(user_id, node_id)?;
        self.store.delete_node(&node.id)?;
        tracing::debug!(node_id = %node.id, "Deleted node");
        Ok(())
    }

    fn owned(&self, user_id: &str, node_id: &NodeId) -> Result<Node> {
        let node = self
            .store
            .get_node(node_id)?
            .ok_or_else(|| Error::NotFound("Node not found".to_string()))?;
        if node.user_id != user_id {
            return Err(Error::Forbidden("Unauthorized".to_string()));
        }
        Ok(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NodeType, Position};
    use crate::storage::{NodeStore, SqliteStore};

    fn setup() -> (NodeService, Arc<SqliteStore>, Node) {
        let store = Arc::new(SqliteStore::in_memory().unwrap());
        let node = Node::new("u1", "Quiet Harbor", NodeType::Thought, Frequency::Dream, Position::ORIGIN);
        store.upsert_node(&node).unwrap();
        (NodeService::new(store.clone()), store, node)
    }

    #[test]
    fn test_list_by_frequency() {
        let (service, store, _) = setup();
        let other = Node::new("u1", "Plan", NodeType::Project, Frequency::Focus, Position::ORIGIN);
        store.upsert_node(&other).unwrap();

        assert_eq!(service.list("u1", None).unwrap().len(), 2);
        assert_eq!(service.list("u1", Some(Frequency::Focus)).unwrap(), vec![other]);
        assert!(service.list("u2", None).unwrap().is_empty());
    }

    #[test]
    fn test_update_bumps_timestamps() {
        let (service, _, node) = setup();
        let patch = NodePatch {
            title: Some("  Still Harbor ".to_string()),
            position: Some(Position::new(10.0, 20.0)),
            ..Default::default()
        };
        let updated = service.update("u1", &node.id, patch).unwrap();
        assert_eq!(updated.title, "Still Harbor");
        assert_eq!(updated.position, Position::new(10.0, 20.0));
        assert!(updated.updated_at >= node.updated_at);
        assert_eq!(updated.updated_at, updated.last_touched);
        assert_eq!(updated.created_at, node.created_at);
    }

    #[test]
    fn test_update_rules() {
        let (service, _, node) = setup();
        let blank = NodePatch {
            title: Some("   ".to_string()),
            ..Default::default()
        };
        assert!(matches!(service.update("u1", &node.id, blank), Err(Error::InvalidInput(_))));
        assert!(matches!(
            service.update("u2", &node.id, NodePatch::default()),
            Err(Error::Forbidden(_))
        ));
        assert!(matches!(
            service.update("u1", &NodeId::new("missing"), NodePatch::default()),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn test_delete() {
        let (service, store, node) = setup();
        assert!(matches!(service.delete("u2", &node.id), Err(Error::Forbidden(_))));
        service.delete("u1", &node.id).unwrap();
        assert!(store.get_node(&node.id).unwrap().is_none());
        assert!(matches!(service.delete("u1", &node.id), Err(Error::NotFound(_))));
    }
}
