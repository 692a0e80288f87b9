//! Archive snapshots.

use super::{Frequency, Node, NodeType};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// An immutable snapshot of every live node in one frequency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchiveRecord {
    /// Unique identifier.
    pub id: String,
    /// Owner.
    pub user_id: String,
    /// Frequency that was archived.
    pub frequency: Frequency,
    /// Display name built from the first titles.
    pub name: String,
    /// Embedded copies of the archived nodes, as they were before archiving.
    pub nodes: Vec<Node>,
    /// Number of embedded nodes.
    pub node_count: usize,
    /// Count per node type.
    pub type_counts: BTreeMap<NodeType, usize>,
    /// When the snapshot was taken.
    pub archived_at: DateTime<Utc>,
}

/// Result of a bulk archive.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArchiveOutcome {
    /// Record identifier, absent when nothing was archived.
    pub archive_id: Option<String>,
    /// Display name, absent when nothing was archived.
    pub name: Option<String>,
    /// Number of nodes archived.
    pub node_count: usize,
}

impl ArchiveOutcome {
    /// The result of archiving an empty frequency.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            archive_id: None,
            name: None,
            node_count: 0,
        }
    }
}

/// Lightweight listing entry for `GET /api/archives`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArchiveSummary {
    /// Record identifier.
    pub id: String,
    /// Frequency.
    pub frequency: Frequency,
    /// Display name.
    pub name: String,
    /// Number of nodes.
    pub node_count: usize,
    /// Count per node type.
    pub type_counts: BTreeMap<NodeType, usize>,
    /// Snapshot time.
    pub archived_at: DateTime<Utc>,
}

impl From<&ArchiveRecord> for ArchiveSummary {
    fn from(record: &ArchiveRecord) -> Self {
        Self {
            id: record.id.clone(),
            frequency: record.frequency,
            name: record.name.clone(),
            node_count: record.node_count,
            type_counts: record.type_counts.clone(),
            archived_at: record.archived_at,
        }
    }
}
