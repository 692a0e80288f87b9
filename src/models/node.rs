//! Canvas nodes and their identifiers.

use super::{Frequency, NodeType};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    /// Creates a node ID from an existing string.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generates a fresh random (v4) node ID.
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Returns the ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for NodeId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A point on the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    /// Horizontal coordinate.
    pub x: f64,
    /// Vertical coordinate.
    pub y: f64,
}

impl Position {
    /// Canvas center used when a frequency has no live nodes.
    pub const ORIGIN: Self = Self { x: 600.0, y: 400.0 };

    /// Creates a position.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Rounds both coordinates to the nearest integer.
    #[must_use]
    pub fn rounded(self) -> Self {
        Self {
            x: self.x.round(),
            y: self.y.round(),
        }
    }

    /// Euclidean distance to another point.
    #[must_use]
    pub fn distance(&self, other: &Self) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// A stored unit of user content on the canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Unique identifier.
    pub id: NodeId,
    /// Owner.
    pub user_id: String,
    /// Display title; never empty.
    pub title: String,
    /// Free-form body text.
    #[serde(default)]
    pub content: String,
    /// Inferred kind.
    pub node_type: NodeType,
    /// Tags.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Canvas position.
    pub position: Position,
    /// Attentional category.
    pub frequency: Frequency,
    /// Optional lineage parent.
    #[serde(default)]
    pub parent_id: Option<NodeId>,
    /// Nodes that were folded into this one.
    #[serde(default)]
    pub merged_from: Vec<NodeId>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
    /// Last time the user interacted with the node.
    pub last_touched: DateTime<Utc>,
    /// Hidden from default listings when set.
    #[serde(default)]
    pub archived: bool,
    /// When the node was archived.
    #[serde(default)]
    pub archived_at: Option<DateTime<Utc>>,
    /// When the node was last restored from an archive.
    #[serde(default)]
    pub restored_at: Option<DateTime<Utc>>,
}

impl Node {
    /// Creates a live node with fresh identifiers and timestamps.
    #[must_use]
    pub fn new(
        user_id: impl Into<String>,
        title: impl Into<String>,
        node_type: NodeType,
        frequency: Frequency,
        position: Position,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: NodeId::generate(),
            user_id: user_id.into(),
            title: title.into(),
            content: String::new(),
            node_type,
            tags: Vec::new(),
            position,
            frequency,
            parent_id: None,
            merged_from: Vec::new(),
            created_at: now,
            updated_at: now,
            last_touched: now,
            archived: false,
            archived_at: None,
            restored_at: None,
        }
    }

    /// Sets the content.
    #[must_use]
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    /// Sets the lineage parent.
    #[must_use]
    pub fn with_parent(mut self, parent_id: Option<NodeId>) -> Self {
        self.parent_id = parent_id;
        self
    }
}

/// Partial update applied by `PATCH /api/nodes/{id}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NodePatch {
    /// New title.
    pub title: Option<String>,
    /// New content.
    pub content: Option<String>,
    /// Replacement tag list.
    pub tags: Option<Vec<String>>,
    /// New position.
    pub position: Option<Position>,
    /// New type.
    pub node_type: Option<NodeType>,
}

impl NodePatch {
    /// Returns true when no field is set.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.content.is_none()
            && self.tags.is_none()
            && self.position.is_none()
            && self.node_type.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_rounded() {
        let p = Position::new(600.4, 399.6).rounded();
        assert!((p.x - 600.0).abs() < f64::EPSILON);
        assert!((p.y - 400.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_node_new_is_live() {
        let node = Node::new(
            "user-1",
            "Morning Anchor",
            NodeType::Ritual,
            Frequency::Reflect,
            Position::ORIGIN,
        );
        assert!(!node.archived);
        assert!(node.archived_at.is_none());
        assert_eq!(node.created_at, node.updated_at);
        assert!(uuid::Uuid::parse_str(node.id.as_str()).is_ok());
    }

    #[test]
    fn test_node_patch_is_empty() {
        assert!(NodePatch::default().is_empty());
        let patch = NodePatch {
            title: Some("x".to_string()),
            ..Default::default()
        };
        assert!(!patch.is_empty());
    }
}
