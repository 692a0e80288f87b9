//! Keyword heuristics for action, affect and node type.
//!
//! Each classifier is a pure function from text to a tagged enum. Signals
//! are checked in a fixed priority order and the first hit wins.
// Allow expect() on static regex patterns - these are guaranteed to compile
#![allow(clippy::expect_used)]

use crate::models::{Action, Affect, NodeType};
use regex::Regex;
use std::sync::LazyLock;

/// A keyword group that maps onto one enum value.
struct Signal<T> {
    pattern: Regex,
    value: T,
}

/// Inflectional endings accepted after a keyword's stem.
const INFLECTIONS: &str = "s|es|d|ed|ing|ion|ions";

/// Builds a case-insensitive alternation over `words`, anchored at word
/// boundaries, where the last word may carry an inflectional ending.
fn word_pattern(words: &[&str]) -> Regex {
    let alternation = words
        .iter()
        .map(|w| {
            w.split_whitespace()
                .map(regex::escape)
                .collect::<Vec<_>>()
                .join(r"\s+")
        })
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r"(?i)\b(?:{alternation})(?:{INFLECTIONS})?\b")).expect("static keyword regex")
}

fn signal<T>(words: &[&str], value: T) -> Signal<T> {
    Signal {
        pattern: word_pattern(words),
        value,
    }
}

/// Action signals in priority order.
static ACTION_SIGNALS: LazyLock<Vec<Signal<Action>>> = LazyLock::new(|| {
    vec![
        signal(
            &["create", "new", "start", "begin", "capture", "plant"],
            Action::Create,
        ),
        signal(&["connect", "link", "relate", "bridge", "weave"], Action::Link),
        signal(
            &["remember", "recall", "revisit", "earlier", "previous"],
            Action::Recall,
        ),
        signal(
            &["archive", "rest", "put away", "release", "let go"],
            Action::Archive,
        ),
        signal(
            &["change", "update", "modify", "refine", "edit", "rename"],
            Action::Modify,
        ),
    ]
});

/// Affect signals in priority order. Inquiry also fires on a literal `?`.
static AFFECT_SIGNALS: LazyLock<Vec<Signal<Affect>>> = LazyLock::new(|| {
    vec![
        signal(
            &[
                "stuck",
                "frustrated",
                "blocked",
                "overwhelmed",
                "tired",
                "anxious",
                "struggling",
                "can't",
                "can’t",
                "cannot",
            ],
            Affect::Friction,
        ),
        signal(
            &["flow", "excited", "energized", "momentum", "clear", "ready"],
            Affect::Flow,
        ),
        signal(
            &["wonder", "curious", "how", "why", "what if"],
            Affect::Inquiry,
        ),
        signal(
            &["new", "start", "begin", "idea", "exploring", "emerging"],
            Affect::Emergence,
        ),
    ]
});

/// Node type signals in priority order. Question also fires on a literal `?`.
static NODE_TYPE_SIGNALS: LazyLock<Vec<Signal<NodeType>>> = LazyLock::new(|| {
    vec![
        signal(
            &["pattern", "cycle", "rhythm", "habit", "loop", "recurring"],
            NodeType::Pattern,
        ),
        signal(
            &[
                "ritual",
                "practice",
                "routine",
                "morning",
                "evening",
                "meditation",
                "ceremony",
            ],
            NodeType::Ritual,
        ),
        signal(
            &["project", "goal", "plan", "build", "launch", "milestone"],
            NodeType::Project,
        ),
        signal(
            &["how", "why", "what", "when", "where", "who", "which", "whether"],
            NodeType::Question,
        ),
    ]
});

/// Infers the coarse action from the oracle's reply. Defaults to [`Action::Create`].
#[must_use]
pub fn infer_action(oracle_text: &str) -> Action {
    ACTION_SIGNALS
        .iter()
        .find(|s| s.pattern.is_match(oracle_text))
        .map_or(Action::Create, |s| s.value)
}

/// Infers the affect of the user's utterance. Defaults to [`Affect::Neutral`].
#[must_use]
pub fn infer_affect(utterance: &str) -> Affect {
    for s in AFFECT_SIGNALS.iter() {
        if s.value == Affect::Inquiry && utterance.contains('?') {
            return Affect::Inquiry;
        }
        if s.pattern.is_match(utterance) {
            return s.value;
        }
    }
    Affect::Neutral
}

/// Infers a node type from a candidate's own text. Defaults to [`NodeType::Thought`].
#[must_use]
pub fn infer_node_type(text: &str) -> NodeType {
    for s in NODE_TYPE_SIGNALS.iter() {
        if s.value == NodeType::Question && text.contains('?') {
            return NodeType::Question;
        }
        if s.pattern.is_match(text) {
            return s.value;
        }
    }
    NodeType::Thought
}
