//! Types flowing through the conversational pipeline.

use super::{Action, Affect, Frequency, ModelPreference, Node, NodeId, NodeType};
use serde::{Deserialize, Serialize};

/// A node-to-be scraped out of the oracle's reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Candidate {
    /// Proposed title.
    pub title: String,
    /// Type inferred from the title text.
    pub node_type: NodeType,
}

/// A relation from a new candidate to an existing node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Link {
    /// Title of the new candidate.
    pub from_title: String,
    /// Existing node the candidate points at.
    pub to: NodeId,
    /// Title of that existing node.
    pub to_title: String,
}

/// Whether a duplicate shares its type with the existing node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CollisionKind {
    /// Same type; the candidate was suppressed.
    SameType,
    /// Different type; the candidate was still created.
    CrossType,
}

/// A fuzzy-duplicate warning.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Collision {
    /// Same-type or cross-type.
    pub kind: CollisionKind,
    /// Candidate title as proposed.
    pub candidate: String,
    /// Title of the existing node it collided with.
    pub existing: String,
    /// Type of the existing node.
    pub existing_type: NodeType,
    /// Similarity score in `[0, 1]`.
    pub similarity: f64,
}

impl Collision {
    /// Human-readable warning line appended to the reply.
    #[must_use]
    pub fn warning(&self) -> String {
        match self.kind {
            CollisionKind::SameType => format!(
                "\"{}\" already lives here as \"{}\" ({}), so it was not planted again.",
                self.candidate, self.existing, self.existing_type
            ),
            CollisionKind::CrossType => format!(
                "\"{}\" echoes the existing {} \"{}\"; planted anyway as a separate node.",
                self.candidate, self.existing_type, self.existing
            ),
        }
    }
}

/// Structured view of one oracle reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedResponse {
    /// Coarse action.
    pub action: Action,
    /// Affect of the user's utterance.
    pub affect: Affect,
    /// Candidates, deduplicated and bounded.
    pub candidates: Vec<Candidate>,
    /// Links to existing nodes.
    pub links: Vec<Link>,
    /// Oracle text, verbatim.
    pub message: String,
}

/// Body of `POST /api/converse`.
#[derive(Debug, Clone, Deserialize)]
pub struct ConverseRequest {
    /// The user's utterance.
    pub text: String,
    /// Frequency the conversation happens in.
    #[serde(default)]
    pub current_frequency: Frequency,
    /// Preferred model.
    #[serde(default)]
    pub model_preference: ModelPreference,
}

/// Response of `POST /api/converse`.
#[derive(Debug, Clone, Serialize)]
pub struct ConverseResponse {
    /// Oracle text, plus a warning paragraph when collisions occurred.
    pub message: String,
    /// Inferred action.
    pub action: Action,
    /// Inferred affect.
    pub affect: Affect,
    /// Nodes that were created.
    pub nodes: Vec<Node>,
    /// Links to existing nodes.
    pub links: Vec<Link>,
    /// Duplicate warnings.
    pub collisions: Vec<Collision>,
    /// Model that answered.
    pub model: String,
}
