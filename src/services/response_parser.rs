//! Scrapes candidate nodes out of the oracle's free-text reply.
//!
//! The oracle is asked to wrap new concepts in double quotes, but replies
//! are free text, so extraction falls back through single quotes and runs
//! of capitalized words before synthesizing a candidate from the utterance.
// Allow expect() on static regex patterns - these are guaranteed to compile
#![allow(clippy::expect_used)]

use super::heuristics::{infer_action, infer_affect, infer_node_type};
use crate::models::{Action, Candidate, Link, Node, ParsedResponse};
use regex::Regex;
use std::collections::HashSet;
use std::ops::Range;
use std::sync::LazyLock;

/// Cap for each quote style.
pub const MAX_QUOTED: usize = 5;

/// Cap for capitalized-run extraction.
pub const MAX_TITLE_CASE: usize = 3;

/// Cap for the final candidate list.
pub const MAX_CANDIDATES: usize = 8;

/// Candidates of this many characters or fewer are dropped.
pub const MIN_TITLE_CHARS: usize = 3;

/// Length of the fallback candidate taken from the utterance.
pub const FALLBACK_CHARS: usize = 60;

static DOUBLE_QUOTED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"["“]([^"“”\n]+)["”]"#).expect("static regex: double quotes")
});

static TITLE_CASE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b([A-Z][a-z]+(?:[ \t]+[A-Z][a-z]+)+)\b").expect("static regex: title case")
});

/// Parses one oracle reply.
///
/// `existing` is the caller's live nodes; their titles become link targets
/// when the inferred action is [`Action::Link`].
#[must_use]
pub fn parse_response(oracle_text: &str, utterance: &str, existing: &[Node]) -> ParsedResponse {
    let action = infer_action(oracle_text);
    let affect = infer_affect(utterance);
    let candidates = extract_candidates(oracle_text, utterance);
    let links = if action == Action::Link {
        infer_links(oracle_text, &candidates, existing)
    } else {
        Vec::new()
    };

    ParsedResponse {
        action,
        affect,
        candidates,
        links,
        message: oracle_text.to_string(),
    }
}

/// Extracts, filters and bounds candidate titles.
#[must_use]
pub fn extract_candidates(oracle_text: &str, utterance: &str) -> Vec<Candidate> {
    let mut raw: Vec<String> = Vec::new();

    raw.extend(captures(&DOUBLE_QUOTED, oracle_text, MAX_QUOTED));
    let without_double = DOUBLE_QUOTED.replace_all(oracle_text, " ");

    let single = single_quoted_spans(&without_double);
    raw.extend(single.iter().take(MAX_QUOTED).map(|(_, inner)| inner.clone()));

    // Capitalized runs inside quoted spans were already captured whole
    let mut unquoted = without_double.into_owned();
    for (range, _) in single.iter().rev() {
        unquoted.replace_range(range.clone(), " ");
    }
    raw.extend(captures(&TITLE_CASE, &unquoted, MAX_TITLE_CASE));

    let mut seen = HashSet::new();
    let mut candidates: Vec<Candidate> = raw
        .into_iter()
        .map(|title| title.trim().to_string())
        .filter(|title| title.chars().count() > MIN_TITLE_CHARS)
        .filter(|title| seen.insert(title.to_lowercase()))
        .map(|title| Candidate {
            node_type: infer_node_type(&title),
            title,
        })
        .collect();

    if candidates.is_empty() {
        let title = fallback_title(utterance);
        if !title.is_empty() {
            candidates.push(Candidate {
                node_type: infer_node_type(&title),
                title,
            });
        }
    }

    candidates.truncate(MAX_CANDIDATES);
    candidates
}

/// The first characters of the utterance, trimmed.
#[must_use]
pub fn fallback_title(utterance: &str) -> String {
    utterance
        .trim()
        .chars()
        .take(FALLBACK_CHARS)
        .collect::<String>()
        .trim_end()
        .to_string()
}

fn captures(pattern: &Regex, text: &str, cap: usize) -> Vec<String> {
    pattern
        .captures_iter(text)
        .filter_map(|c| c.get(1).map(|m| m.as_str().to_string()))
        .take(cap)
        .collect()
}

/// Finds single-quoted spans, returning each span's byte range and inner text.
///
/// An opening quote must follow the start of text, whitespace or a bracket,
/// and a closing quote must precede the end of text, whitespace or
/// punctuation, so apostrophes inside words ("don't", "it's") never delimit
/// a span.
fn single_quoted_spans(text: &str) -> Vec<(Range<usize>, String)> {
    const OPEN: [char; 2] = ['\'', '‘'];
    const CLOSE: [char; 2] = ['\'', '’'];

    let chars: Vec<(usize, char)> = text.char_indices().collect();
    let opens_after =
        |prev: Option<char>| prev.is_none_or(|p| p.is_whitespace() || p == '(' || p == '[');
    let closes_before = |next: Option<char>| {
        next.is_none_or(|n| n.is_whitespace() || ".,;:!?)]".contains(n))
    };

    let mut spans = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        let (start, c) = chars[i];
        let prev = i.checked_sub(1).map(|p| chars[p].1);
        if OPEN.contains(&c) && opens_after(prev) {
            let close = (i + 2..chars.len())
                .take_while(|&j| chars[j].1 != '\n')
                .find(|&j| {
                    CLOSE.contains(&chars[j].1) && closes_before(chars.get(j + 1).map(|n| n.1))
                });
            if let Some(j) = close {
                let (end, quote) = chars[j];
                let inner = text[start + c.len_utf8()..end].to_string();
                spans.push((start..end + quote.len_utf8(), inner));
                i = j + 1;
                continue;
            }
        }
        i += 1;
    }
    spans
}

/// Links every candidate to each existing node whose title appears in the reply.
///
/// A candidate never links to a node carrying its own title.
fn infer_links(oracle_text: &str, candidates: &[Candidate], existing: &[Node]) -> Vec<Link> {
    let haystack = oracle_text.to_lowercase();
    let targets: Vec<(&Node, String)> = existing
        .iter()
        .filter(|n| n.title.chars().count() > MIN_TITLE_CHARS)
        .map(|n| (n, n.title.to_lowercase()))
        .filter(|(_, key)| haystack.contains(key.as_str()))
        .collect();

    candidates
        .iter()
        .flat_map(|c| {
            let own = c.title.to_lowercase();
            targets
                .iter()
                .filter(move |(_, key)| *key != own)
                .map(move |(t, _)| Link {
                    from_title: c.title.clone(),
                    to: t.id.clone(),
                    to_title: t.title.clone(),
                })
        })
        .collect()
}
