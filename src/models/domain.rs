//! Classification enums shared across the conversational pipeline.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Attentional category a node lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    /// Looking back, noticing.
    #[default]
    Reflect,
    /// Narrow, task-oriented attention.
    Focus,
    /// Open-ended, associative attention.
    Dream,
    /// Combining threads into something new.
    Synthesize,
}

impl Frequency {
    /// Returns all frequency variants.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Reflect, Self::Focus, Self::Dream, Self::Synthesize]
    }

    /// Returns the frequency as a string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Reflect => "reflect",
            Self::Focus => "focus",
            Self::Dream => "dream",
            Self::Synthesize => "synthesize",
        }
    }

    /// Parses a frequency from a string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "reflect" => Some(Self::Reflect),
            "focus" => Some(Self::Focus),
            "dream" => Some(Self::Dream),
            "synthesize" | "synthesise" => Some(Self::Synthesize),
            _ => None,
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Inferred kind of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
    /// Default kind.
    #[default]
    Thought,
    /// Cycles, habits and recurring loops.
    Pattern,
    /// Practices and routines.
    Ritual,
    /// Goals and plans.
    Project,
    /// Open questions.
    Question,
}

impl NodeType {
    /// Returns the node type as a string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Thought => "thought",
            Self::Pattern => "pattern",
            Self::Ritual => "ritual",
            Self::Project => "project",
            Self::Question => "question",
        }
    }

    /// Parses a node type from a string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "thought" => Some(Self::Thought),
            "pattern" => Some(Self::Pattern),
            "ritual" => Some(Self::Ritual),
            "project" => Some(Self::Project),
            "question" => Some(Self::Question),
            _ => None,
        }
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Coarse action inferred from the oracle's reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    /// New nodes are being planted.
    #[default]
    Create,
    /// Existing nodes are being connected.
    Link,
    /// Earlier material is being revisited.
    Recall,
    /// Material is being put to rest.
    Archive,
    /// Existing material is being reshaped.
    Modify,
}

impl Action {
    /// Returns the action as a string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Link => "link",
            Self::Recall => "recall",
            Self::Archive => "archive",
            Self::Modify => "modify",
        }
    }

    /// Parses an action from a string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "create" => Some(Self::Create),
            "link" => Some(Self::Link),
            "recall" => Some(Self::Recall),
            "archive" => Some(Self::Archive),
            "modify" => Some(Self::Modify),
            _ => None,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Emotional tone inferred from the user's utterance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Affect {
    /// Stuck, blocked, overwhelmed.
    Friction,
    /// Energized and moving.
    Flow,
    /// Curious, asking.
    Inquiry,
    /// Something new is forming.
    Emergence,
    /// Nothing detected.
    #[default]
    Neutral,
}

impl Affect {
    /// Returns the affect as a string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Friction => "friction",
            Self::Flow => "flow",
            Self::Inquiry => "inquiry",
            Self::Emergence => "emergence",
            Self::Neutral => "neutral",
        }
    }

    /// Parses an affect from a string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "friction" => Some(Self::Friction),
            "flow" => Some(Self::Flow),
            "inquiry" => Some(Self::Inquiry),
            "emergence" => Some(Self::Emergence),
            "neutral" => Some(Self::Neutral),
            _ => None,
        }
    }
}

impl fmt::Display for Affect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Which hosted model the caller would like to talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelPreference {
    /// Nous Hermes through its OpenAI-compatible endpoint.
    #[default]
    Hermes,
    /// `OpenAI` chat completions.
    #[serde(alias = "gpt")]
    Openai,
    /// Anthropic messages.
    #[serde(alias = "anthropic")]
    Claude,
}

impl ModelPreference {
    /// Fallback order used when the preferred backend is not configured.
    pub const FALLBACK_ORDER: [Self; 3] = [Self::Hermes, Self::Openai, Self::Claude];

    /// Returns the preference as a string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Hermes => "hermes",
            Self::Openai => "openai",
            Self::Claude => "claude",
        }
    }

    /// Parses a preference from a string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "hermes" | "nous" => Some(Self::Hermes),
            "openai" | "gpt" => Some(Self::Openai),
            "claude" | "anthropic" => Some(Self::Claude),
            _ => None,
        }
    }
}

impl fmt::Display for ModelPreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
