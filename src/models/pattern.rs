//! Append-only conversation telemetry.

use super::{Action, Affect, Frequency};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One entry per conversational turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternLog {
    /// Unique identifier.
    pub id: String,
    /// Owner.
    pub user_id: String,
    /// Frequency the turn happened in.
    pub frequency: Frequency,
    /// Inferred action.
    pub action: Action,
    /// Inferred affect.
    pub affect: Affect,
    /// The user's utterance.
    pub text: String,
    /// Model that answered.
    pub model: String,
    /// Number of nodes created by the turn.
    pub node_count: usize,
    /// When the turn happened.
    pub created_at: DateTime<Utc>,
}
