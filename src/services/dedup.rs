//! Fuzzy title deduplication against a user's live nodes.
//!
//! Titles are compared after normalization (NFKC, lowercase, punctuation
//! and leading article removed, whitespace collapsed). Two titles collide
//! when their normalized forms are equal or when the share of matching
//! character positions reaches [`SIMILARITY_THRESHOLD`].

use crate::models::{Candidate, Collision, CollisionKind, Node};
use unicode_normalization::UnicodeNormalization;

/// Positional match ratio at which two titles count as duplicates.
pub const SIMILARITY_THRESHOLD: f64 = 0.85;

const LEADING_ARTICLES: [&str; 3] = ["the ", "an ", "a "];

/// Candidates that survived dedup, plus every collision found.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DedupOutcome {
    /// Candidates to persist, in input order.
    pub kept: Vec<Candidate>,
    /// Same-type collisions (suppressed) and cross-type collisions (kept).
    pub collisions: Vec<Collision>,
}

/// Normalizes a title for comparison.
#[must_use]
pub fn normalize_title(title: &str) -> String {
    let folded: String = title
        .nfkc()
        .flat_map(char::to_lowercase)
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect();
    let collapsed = folded.split_whitespace().collect::<Vec<_>>().join(" ");

    LEADING_ARTICLES
        .iter()
        .find_map(|article| collapsed.strip_prefix(article))
        .map_or(collapsed.clone(), str::to_string)
}

/// Share of character positions at which `a` and `b` agree, over the longer length.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn positional_similarity(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let longest = a.len().max(b.len());
    if longest == 0 {
        return 1.0;
    }
    let matching = a.iter().zip(&b).filter(|(x, y)| x == y).count();
    matching as f64 / longest as f64
}

/// Similarity between two raw titles after normalization.
#[must_use]
pub fn title_similarity(a: &str, b: &str) -> f64 {
    let (a, b) = (normalize_title(a), normalize_title(b));
    if a == b {
        1.0
    } else {
        positional_similarity(&a, &b)
    }
}

/// Splits candidates into kept and suppressed against the existing nodes.
///
/// A candidate that matches an existing node of the same type is dropped
/// and recorded as a [`CollisionKind::SameType`] collision. A candidate
/// that only matches nodes of other types is kept and recorded as a
/// [`CollisionKind::CrossType`] collision against the closest one.
#[must_use]
pub fn check_candidates(candidates: Vec<Candidate>, existing: &[Node]) -> DedupOutcome {
    let mut outcome = DedupOutcome::default();

    for candidate in candidates {
        let matches: Vec<(&Node, f64)> = existing
            .iter()
            .map(|node| (node, title_similarity(&candidate.title, &node.title)))
            .filter(|(_, score)| *score >= SIMILARITY_THRESHOLD)
            .collect();

        let same_type = best(
            matches
                .iter()
                .filter(|(node, _)| node.node_type == candidate.node_type),
        );
        if let Some((node, similarity)) = same_type {
            tracing::debug!(
                candidate = %candidate.title,
                existing = %node.title,
                similarity,
                "Suppressing same-type duplicate"
            );
            outcome
                .collisions
                .push(collision(CollisionKind::SameType, &candidate, node, similarity));
            continue;
        }

        if let Some((node, similarity)) = best(matches.iter()) {
            outcome
                .collisions
                .push(collision(CollisionKind::CrossType, &candidate, node, similarity));
        }
        outcome.kept.push(candidate);
    }

    outcome
}

fn best<'a, I>(matches: I) -> Option<(&'a Node, f64)>
where
    I: Iterator<Item = &'a (&'a Node, f64)>,
{
    matches
        .copied()
        .max_by(|(_, a), (_, b)| a.total_cmp(b))
}

fn collision(kind: CollisionKind, candidate: &Candidate, node: &Node, similarity: f64) -> Collision {
    Collision {
        kind,
        candidate: candidate.title.clone(),
        existing: node.title.clone(),
        existing_type: node.node_type,
        similarity,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Frequency, NodeType, Position};
    use test_case::test_case;

    fn node(title: &str, node_type: NodeType) -> Node {
        Node::new("u1", title, node_type, Frequency::Reflect, Position::ORIGIN)
    }

    fn candidate(title: &str, node_type: NodeType) -> Candidate {
        Candidate {
            title: title.to_string(),
            node_type,
        }
    }

    #[test_case("Morning Ritual", "morning ritual"; "lowercase")]
    #[test_case("  The   Quiet Harbor!", "quiet harbor"; "article punctuation and spacing")]
    #[test_case("An Idea", "idea"; "an")]
    #[test_case("Ｆｕｌｌ Ｗｉｄｔｈ", "full width"; "nfkc")]
    #[test_case("Theory", "theory"; "article only as a whole word")]
    fn test_normalize_title(input: &str, expected: &str) {
        assert_eq!(normalize_title(input), expected);
    }

    #[test]
    fn test_positional_similarity() {
        assert!((positional_similarity("abcd", "abcd") - 1.0).abs() < f64::EPSILON);
        assert!((positional_similarity("abcd", "abce") - 0.75).abs() < f64::EPSILON);
        assert!((positional_similarity("ab", "abcd") - 0.5).abs() < f64::EPSILON);
        assert!((positional_similarity("", "") - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_near_miss_above_threshold() {
        // One differing position out of ten
        assert!(title_similarity("Slow Dance", "Slow Dancy") >= SIMILARITY_THRESHOLD);
        assert!(title_similarity("Slow Dance", "Fast Dance") < SIMILARITY_THRESHOLD);
    }

    #[test]
    fn test_same_type_collision_suppresses() {
        let existing = [node("Morning Ritual", NodeType::Ritual)];
        let outcome = check_candidates(
            vec![candidate("morning ritual", NodeType::Ritual)],
            &existing,
        );

        assert!(outcome.kept.is_empty());
        assert_eq!(outcome.collisions.len(), 1);
        assert_eq!(outcome.collisions[0].kind, CollisionKind::SameType);
        assert_eq!(outcome.collisions[0].existing, "Morning Ritual");
    }

    #[test]
    fn test_cross_type_collision_still_creates() {
        let existing = [node("Morning Ritual", NodeType::Ritual)];
        let outcome = check_candidates(
            vec![candidate("morning ritual", NodeType::Pattern)],
            &existing,
        );

        assert_eq!(outcome.kept.len(), 1);
        assert_eq!(outcome.collisions.len(), 1);
        assert_eq!(outcome.collisions[0].kind, CollisionKind::CrossType);
        assert!(outcome.collisions[0].warning().contains("planted anyway"));
    }

    #[test]
    fn test_same_type_match_wins_over_closer_cross_type() {
        let existing = [
            node("Quiet Harbor", NodeType::Thought),
            node("Quiet Harbors", NodeType::Pattern),
        ];
        let outcome = check_candidates(
            vec![candidate("Quiet Harbors", NodeType::Thought)],
            &existing,
        );
        assert!(outcome.kept.is_empty());
        assert_eq!(outcome.collisions[0].existing, "Quiet Harbor");
    }

    #[test]
    fn test_unrelated_titles_pass_through() {
        let existing = [node("Evening Walk", NodeType::Ritual)];
        let outcome = check_candidates(
            vec![
                candidate("Tidal Memory", NodeType::Thought),
                candidate("Launch plan", NodeType::Project),
            ],
            &existing,
        );
        assert_eq!(outcome.kept.len(), 2);
        assert!(outcome.collisions.is_empty());
    }
}
