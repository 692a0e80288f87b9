//! Bulk archive and selective restore of a frequency's nodes.
//!
//! Archiving never deletes: it writes an immutable [`ArchiveRecord`] holding
//! copies of every live node and flags the originals as archived. Restore
//! upserts chosen copies back as live nodes and leaves the record untouched.

use crate::models::{ArchiveOutcome, ArchiveRecord, ArchiveSummary, Frequency, Node, NodeId, NodeType};
use crate::storage::DocumentStore;
use crate::{Error, Result};
use chrono::Utc;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use tracing::instrument;

/// Service for archive records.
#[derive(Clone)]
pub struct ArchiveService {
    store: Arc<dyn DocumentStore>,
}

impl ArchiveService {
    /// Creates a new archive service.
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Archives every live node of `frequency` owned by `user_id`.
    ///
    /// Returns a zero-count outcome, and writes nothing, when there are no
    /// live nodes.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    #[instrument(skip(self), fields(operation = "archive_frequency"))]
    pub fn archive_frequency(&self, user_id: &str, frequency: Frequency) -> Result<ArchiveOutcome> {
        let nodes = self.store.list_live_nodes(user_id, frequency)?;
        if nodes.is_empty() {
            tracing::debug!("Nothing to archive");
            return Ok(ArchiveOutcome::empty());
        }

        let now = Utc::now();
        let record = ArchiveRecord {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            frequency,
            name: archive_name(&nodes),
            node_count: nodes.len(),
            type_counts: type_counts(&nodes),
            archived_at: now,
            nodes,
        };

        self.store.insert_archive(&record)?;
        let ids: Vec<NodeId> = record.nodes.iter().map(|n| n.id.clone()).collect();
        let flagged = self.store.mark_archived(&ids, now)?;

        tracing::info!(
            archive_id = %record.id,
            node_count = record.node_count,
            flagged,
            "Archived frequency"
        );

        Ok(ArchiveOutcome {
            archive_id: Some(record.id),
            name: Some(record.name),
            node_count: record.node_count,
        })
    }

    /// Restores the listed nodes from an archive owned by `user_id`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] when the archive is missing or foreign, or
    /// when none of `node_ids` is in it.
    #[instrument(skip(self, node_ids), fields(operation = "restore", requested = node_ids.len()))]
    pub fn restore(&self, user_id: &str, archive_id: &str, node_ids: &[NodeId]) -> Result<Vec<Node>> {
        let record = self.get(user_id, archive_id)?;
        let wanted: HashSet<&NodeId> = node_ids.iter().collect();

        let now = Utc::now();
        let restored: Vec<Node> = record
            .nodes
            .into_iter()
            .filter(|n| wanted.contains(&n.id))
            .map(|mut n| {
                n.archived = false;
                n.archived_at = None;
                n.restored_at = Some(now);
                n
            })
            .collect();

        if restored.is_empty() {
            return Err(Error::NotFound("No matching nodes in archive".to_string()));
        }

        for node in &restored {
            self.store.upsert_node(node)?;
        }

        tracing::info!(restored = restored.len(), "Restored nodes from archive");
        Ok(restored)
    }

    /// Lists the caller's archives, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub fn list(&self, user_id: &str) -> Result<Vec<ArchiveSummary>> {
        Ok(self
            .store
            .list_archives(user_id)?
            .iter()
            .map(ArchiveSummary::from)
            .collect())
    }

    /// Fetches one archive; a foreign archive reads as missing.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] when absent or not owned by `user_id`.
    pub fn get(&self, user_id: &str, archive_id: &str) -> Result<ArchiveRecord> {
        self.store
            .get_archive(archive_id)?
            .filter(|r| r.user_id == user_id)
            .ok_or_else(|| Error::NotFound("Archive not found".to_string()))
    }
}

/// Names an archive after its first two titles.
fn archive_name(nodes: &[Node]) -> String {
    let head: Vec<&str> = nodes.iter().take(2).map(|n| n.title.as_str()).collect();
    let name = head.join(", ");
    match nodes.len().saturating_sub(head.len()) {
        0 => name,
        rest => format!("{name} +{rest} more"),
    }
}

fn type_counts(nodes: &[Node]) -> BTreeMap<NodeType, usize> {
    nodes.iter().fold(BTreeMap::new(), |mut counts, n| {
        *counts.entry(n.node_type).or_insert(0) += 1;
        counts
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Position;
    use crate::storage::{ArchiveStore, NodeStore, SqliteStore};

    fn service() -> (ArchiveService, Arc<SqliteStore>) {
        let store = Arc::new(SqliteStore::in_memory().unwrap());
        (ArchiveService::new(store.clone()), store)
    }

    fn plant(store: &SqliteStore, user: &str, title: &str, node_type: NodeType, frequency: Frequency) -> Node {
        let node = Node::new(user, title, node_type, frequency, Position::ORIGIN);
        store.upsert_node(&node).unwrap();
        node
    }

    #[test]
    fn test_archive_empty_frequency() {
        let (service, store) = service();
        let outcome = service.archive_frequency("u1", Frequency::Dream).unwrap();
        assert_eq!(outcome, ArchiveOutcome::empty());
        assert!(store.list_archives("u1").unwrap().is_empty());
    }

    #[test]
    fn test_archive_then_restore_subset() {
        let (service, store) = service();
        let a = plant(&store, "u1", "Morning Anchor", NodeType::Ritual, Frequency::Reflect);
        let b = plant(&store, "u1", "Quiet Harbor", NodeType::Thought, Frequency::Reflect);
        let c = plant(&store, "u1", "Tide Cycle", NodeType::Pattern, Frequency::Reflect);
        plant(&store, "u1", "Other", NodeType::Thought, Frequency::Focus);
        plant(&store, "u2", "Not mine", NodeType::Thought, Frequency::Reflect);

        let outcome = service.archive_frequency("u1", Frequency::Reflect).unwrap();
        assert_eq!(outcome.node_count, 3);
        assert_eq!(outcome.name.as_deref(), Some("Morning Anchor, Quiet Harbor +1 more"));
        assert!(store.list_live_nodes("u1", Frequency::Reflect).unwrap().is_empty());
        assert_eq!(store.list_live_nodes("u1", Frequency::Focus).unwrap().len(), 1);
        assert_eq!(store.list_live_nodes("u2", Frequency::Reflect).unwrap().len(), 1);

        let archive_id = outcome.archive_id.unwrap();
        let record = service.get("u1", &archive_id).unwrap();
        assert_eq!(record.nodes.len(), 3);
        assert_eq!(record.type_counts.get(&NodeType::Ritual), Some(&1));

        let restored = service
            .restore("u1", &archive_id, &[a.id.clone(), c.id.clone()])
            .unwrap();
        assert_eq!(restored.len(), 2);

        assert!(!store.get_node(&a.id).unwrap().unwrap().archived);
        assert!(store.get_node(&a.id).unwrap().unwrap().restored_at.is_some());
        assert!(!store.get_node(&c.id).unwrap().unwrap().archived);
        assert!(store.get_node(&b.id).unwrap().unwrap().archived);

        // The record itself is untouched
        assert_eq!(service.get("u1", &archive_id).unwrap(), record);
    }

    #[test]
    fn test_restore_rules() {
        let (service, store) = service();
        let a = plant(&store, "u1", "Only One", NodeType::Thought, Frequency::Focus);
        let archive_id = service
            .archive_frequency("u1", Frequency::Focus)
            .unwrap()
            .archive_id
            .unwrap();

        assert!(matches!(
            service.restore("u2", &archive_id, std::slice::from_ref(&a.id)),
            Err(Error::NotFound(_))
        ));
        assert!(matches!(
            service.restore("u1", "missing", std::slice::from_ref(&a.id)),
            Err(Error::NotFound(_))
        ));
        assert!(matches!(
            service.restore("u1", &archive_id, &[NodeId::new("nope")]),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn test_archive_name_short_lists() {
        let one = [Node::new("u", "Solo", NodeType::Thought, Frequency::Dream, Position::ORIGIN)];
        assert_eq!(archive_name(&one), "Solo");
        let two = [one[0].clone(), Node::new("u", "Duet", NodeType::Thought, Frequency::Dream, Position::ORIGIN)];
        assert_eq!(archive_name(&two), "Solo, Duet");
    }

    #[test]
    fn test_list_is_owner_scoped() {
        let (service, store) = service();
        plant(&store, "u1", "Mine", NodeType::Thought, Frequency::Dream);
        plant(&store, "u2", "Theirs", NodeType::Thought, Frequency::Dream);
        service.archive_frequency("u1", Frequency::Dream).unwrap();
        service.archive_frequency("u2", Frequency::Dream).unwrap();

        let listed = service.list("u1").unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].name, "Mine");
    }
}
