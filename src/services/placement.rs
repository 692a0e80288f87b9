//! Geometric placement of new nodes on the canvas.
//!
//! New nodes are laid out around the centroid of the frequency's live
//! nodes using one of four patterns. The action picks a natural pattern
//! most of the time; the rest of the time the pattern is drawn uniformly.
//! Every offset is clamped to the configured radius before rounding.

use crate::config::PlacementConfig;
use crate::models::{Action, Node, Position};
use rand::Rng;
use std::f64::consts::TAU;

/// Probability of using the action's natural pattern.
pub const NATURAL_PATTERN_PROBABILITY: f64 = 0.7;

/// Half-width of the organic scatter band on each axis.
pub const ORGANIC_BAND: f64 = 200.0;

/// Layout pattern for a batch of new nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutPattern {
    /// Outward spiral, evenly spread in angle.
    Spiral,
    /// Random angles at a mid-range radius.
    Constellation,
    /// A single arm growing outward from the center.
    RadialBranch,
    /// Uniform scatter inside a square band.
    Organic,
}

impl LayoutPattern {
    /// All patterns.
    pub const ALL: [Self; 4] = [
        Self::Spiral,
        Self::Constellation,
        Self::RadialBranch,
        Self::Organic,
    ];

    /// The pattern that fits an action.
    #[must_use]
    pub const fn natural_for(action: Action) -> Self {
        match action {
            Action::Create => Self::Spiral,
            Action::Link => Self::RadialBranch,
            Action::Recall => Self::Constellation,
            Action::Archive | Action::Modify => Self::Organic,
        }
    }
}

/// Assigns canvas positions to new nodes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacementEngine {
    max_radius: f64,
}

impl PlacementEngine {
    /// Creates an engine with an explicit radius cap.
    #[must_use]
    pub const fn new(max_radius: f64) -> Self {
        Self { max_radius }
    }

    /// Creates an engine from configuration.
    #[must_use]
    pub const fn from_config(config: &PlacementConfig) -> Self {
        Self::new(config.max_radius)
    }

    /// Returns the radius cap.
    #[must_use]
    pub const fn max_radius(&self) -> f64 {
        self.max_radius
    }

    /// Mean position of `existing`, or [`Position::ORIGIN`] when empty.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn center(existing: &[Node]) -> Position {
        if existing.is_empty() {
            return Position::ORIGIN;
        }
        let n = existing.len() as f64;
        let (sx, sy) = existing
            .iter()
            .fold((0.0, 0.0), |(sx, sy), node| (sx + node.position.x, sy + node.position.y));
        Position::new(sx / n, sy / n)
    }

    /// Picks the natural pattern for `action` or, with the remaining probability, any pattern.
    pub fn choose_pattern<R: Rng + ?Sized>(action: Action, rng: &mut R) -> LayoutPattern {
        if rng.random_bool(NATURAL_PATTERN_PROBABILITY) {
            LayoutPattern::natural_for(action)
        } else {
            LayoutPattern::ALL[rng.random_range(0..LayoutPattern::ALL.len())]
        }
    }

    /// Places `count` new nodes around the live nodes of a frequency.
    pub fn place<R: Rng + ?Sized>(
        &self,
        action: Action,
        existing: &[Node],
        count: usize,
        rng: &mut R,
    ) -> Vec<Position> {
        let pattern = Self::choose_pattern(action, rng);
        tracing::debug!(?pattern, count, existing = existing.len(), "Placing nodes");
        self.place_with(pattern, Self::center(existing), existing.len(), count, rng)
    }

    /// Places `count` nodes with a fixed pattern around `center`.
    #[allow(clippy::cast_precision_loss)]
    pub fn place_with<R: Rng + ?Sized>(
        &self,
        pattern: LayoutPattern,
        center: Position,
        existing_count: usize,
        count: usize,
        rng: &mut R,
    ) -> Vec<Position> {
        let existing = existing_count as f64;
        let n = count.max(1) as f64;
        let radial_base = rng.random_range(0.0..TAU);

        (0..count)
            .map(|i| {
                let i = i as f64;
                let (dx, dy) = match pattern {
                    LayoutPattern::Spiral => {
                        let angle = i * TAU / n + rng.random_range(-0.3..=0.3);
                        let radius = 8.0f64.mul_add(existing, 40.0f64.mul_add(i, 120.0))
                            + rng.random_range(-20.0..=20.0);
                        polar(angle, radius)
                    },
                    LayoutPattern::Constellation => {
                        let angle = rng.random_range(0.0..TAU);
                        let radius = 5.0f64.mul_add(existing, rng.random_range(150.0..300.0));
                        polar(angle, radius)
                    },
                    LayoutPattern::RadialBranch => {
                        polar(0.35f64.mul_add(i, radial_base), 60.0f64.mul_add(i, 100.0))
                    },
                    LayoutPattern::Organic => (
                        rng.random_range(-ORGANIC_BAND..=ORGANIC_BAND),
                        rng.random_range(-ORGANIC_BAND..=ORGANIC_BAND),
                    ),
                };
                let (dx, dy) = self.clamp(dx, dy);
                Position::new(center.x + dx, center.y + dy).rounded()
            })
            .collect()
    }

    fn clamp(&self, dx: f64, dy: f64) -> (f64, f64) {
        let length = dx.hypot(dy);
        if length <= self.max_radius || length == 0.0 {
            (dx, dy)
        } else {
            let scale = self.max_radius / length;
            (dx * scale, dy * scale)
        }
    }
}

impl Default for PlacementEngine {
    fn default() -> Self {
        Self::from_config(&PlacementConfig::default())
    }
}

fn polar(angle: f64, radius: f64) -> (f64, f64) {
    let radius = radius.max(0.0);
    (radius * angle.cos(), radius * angle.sin())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Frequency, NodeType};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    /// Rounding can move a clamped point by at most half a unit per axis.
    const ROUNDING_SLACK: f64 = 1.0;

    fn at(x: f64, y: f64) -> Node {
        Node::new("u1", "n", NodeType::Thought, Frequency::Focus, Position::new(x, y))
    }

    #[test]
    fn test_center_defaults_to_origin() {
        assert_eq!(PlacementEngine::center(&[]), Position::new(600.0, 400.0));
    }

    #[test]
    fn test_center_is_mean_position() {
        let nodes = [at(0.0, 0.0), at(100.0, 50.0), at(200.0, 100.0)];
        assert_eq!(PlacementEngine::center(&nodes), Position::new(100.0, 50.0));
    }

    #[test]
    fn test_natural_patterns() {
        assert_eq!(LayoutPattern::natural_for(Action::Create), LayoutPattern::Spiral);
        assert_eq!(LayoutPattern::natural_for(Action::Link), LayoutPattern::RadialBranch);
        assert_eq!(LayoutPattern::natural_for(Action::Recall), LayoutPattern::Constellation);
        assert_eq!(LayoutPattern::natural_for(Action::Archive), LayoutPattern::Organic);
        assert_eq!(LayoutPattern::natural_for(Action::Modify), LayoutPattern::Organic);
    }

    #[test]
    fn test_every_pattern_respects_radius() {
        let engine = PlacementEngine::new(420.0);
        let mut rng = StdRng::seed_from_u64(7);
        for pattern in LayoutPattern::ALL {
            // Many existing nodes push the unclamped spiral radius well past the cap
            let positions = engine.place_with(pattern, Position::ORIGIN, 60, 8, &mut rng);
            assert_eq!(positions.len(), 8);
            for p in positions {
                assert!(
                    p.distance(&Position::ORIGIN) <= engine.max_radius() + ROUNDING_SLACK,
                    "{pattern:?} placed {p:?} too far out"
                );
            }
        }
    }

    #[test]
    fn test_positions_are_rounded() {
        let engine = PlacementEngine::default();
        let mut rng = StdRng::seed_from_u64(1);
        for p in engine.place(Action::Create, &[], 5, &mut rng) {
            assert!((p.x - p.x.round()).abs() < f64::EPSILON);
            assert!((p.y - p.y.round()).abs() < f64::EPSILON);
        }
    }

    #[test]
    fn test_single_node_on_empty_field_lands_near_origin() {
        let engine = PlacementEngine::default();
        let mut rng = StdRng::seed_from_u64(42);
        let positions = engine.place(Action::Create, &[], 1, &mut rng);
        assert_eq!(positions.len(), 1);
        assert!(positions[0].distance(&Position::ORIGIN) <= engine.max_radius() + ROUNDING_SLACK);
    }

    #[test]
    fn test_seeded_placement_is_reproducible() {
        let engine = PlacementEngine::default();
        let a = engine.place(Action::Recall, &[], 4, &mut StdRng::seed_from_u64(9));
        let b = engine.place(Action::Recall, &[], 4, &mut StdRng::seed_from_u64(9));
        assert_eq!(a, b);
    }

    #[test]
    fn test_zero_count_places_nothing() {
        let engine = PlacementEngine::default();
        let mut rng = StdRng::seed_from_u64(3);
        assert!(engine.place(Action::Link, &[], 0, &mut rng).is_empty());
    }
}
