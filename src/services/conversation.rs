//! The conversational pipeline.
//!
//! utterance → prompt → oracle → heuristic parse → dedup → placement →
//! persist → pattern log. Calls block on the oracle; async callers should
//! run [`ConversationService::converse`] on the blocking pool.

use super::dedup::check_candidates;
use super::placement::PlacementEngine;
use super::prompt_composer::compose;
use super::response_parser::parse_response;
use crate::llm::ModelRegistry;
use crate::models::{ConverseRequest, ConverseResponse, Link, Node, PatternLog};
use crate::storage::DocumentStore;
use crate::{Error, Result};
use chrono::Utc;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::sync::Arc;
use tracing::instrument;

/// Service that turns utterances into nodes.
#[derive(Clone)]
pub struct ConversationService {
    store: Arc<dyn DocumentStore>,
    registry: Arc<ModelRegistry>,
    placement: PlacementEngine,
    seed: Option<u64>,
}

impl ConversationService {
    /// Creates a new conversation service.
    #[must_use]
    pub fn new(
        store: Arc<dyn DocumentStore>,
        registry: Arc<ModelRegistry>,
        placement: PlacementEngine,
    ) -> Self {
        Self {
            store,
            registry,
            placement,
            seed: None,
        }
    }

    /// Seeds placement jitter so layouts are reproducible.
    #[must_use]
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    fn rng(&self) -> StdRng {
        self.seed
            .map_or_else(|| StdRng::from_rng(&mut rand::rng()), StdRng::seed_from_u64)
    }

    /// Runs one conversational turn for `user_id`.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidInput`] for empty text
    /// - [`Error::ServiceUnavailable`] when no oracle backend is configured
    /// - [`Error::OperationFailed`] when the oracle or the store fails
    #[instrument(
        skip(self, request),
        fields(
            operation = "converse",
            frequency = %request.current_frequency,
            model_preference = %request.model_preference
        )
    )]
    pub fn converse(&self, user_id: &str, request: &ConverseRequest) -> Result<ConverseResponse> {
        let text = request.text.as_str();
        if text.trim().is_empty() {
            return Err(Error::InvalidInput("Text cannot be empty".to_string()));
        }
        let (model, _) = self.registry.resolve(request.model_preference)?;

        let frequency = request.current_frequency;
        let all_live = self.store.list_nodes(user_id, None, false)?;
        let frequency_live: Vec<Node> = all_live
            .iter()
            .filter(|n| n.frequency == frequency)
            .cloned()
            .collect();
        let titles: Vec<String> = frequency_live.iter().map(|n| n.title.clone()).collect();

        let prompt = compose(text, frequency, model, &titles)?;
        let completion = self.registry.complete(model, &prompt)?;

        let parsed = parse_response(&completion.text, text, &all_live);
        let outcome = check_candidates(parsed.candidates, &all_live);

        let positions = self.placement.place(
            parsed.action,
            &frequency_live,
            outcome.kept.len(),
            &mut self.rng(),
        );

        let mut nodes = Vec::with_capacity(outcome.kept.len());
        for (candidate, position) in outcome.kept.iter().zip(positions) {
            let parent = parsed
                .links
                .iter()
                .find(|l| l.from_title == candidate.title)
                .map(|l| l.to.clone());
            let node = Node::new(user_id, &candidate.title, candidate.node_type, frequency, position)
                .with_parent(parent);
            self.store.upsert_node(&node)?;
            nodes.push(node);
        }

        let links: Vec<Link> = parsed
            .links
            .into_iter()
            .filter(|l| outcome.kept.iter().any(|c| c.title == l.from_title))
            .collect();

        let mut message = parsed.message;
        if !outcome.collisions.is_empty() {
            let warnings: Vec<String> = outcome.collisions.iter().map(|c| c.warning()).collect();
            message.push_str("\n\n");
            message.push_str(&warnings.join(" "));
        }

        self.store.append_pattern(&PatternLog {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            frequency,
            action: parsed.action,
            affect: parsed.affect,
            text: text.trim().to_string(),
            model: model.as_str().to_string(),
            node_count: nodes.len(),
            created_at: Utc::now(),
        })?;

        metrics::counter!("converse_nodes_created_total", "frequency" => frequency.as_str())
            .increment(nodes.len() as u64);
        tracing::info!(
            action = %parsed.action,
            affect = %parsed.affect,
            created = nodes.len(),
            collisions = outcome.collisions.len(),
            model = %model,
            "Conversation turn complete"
        );

        Ok(ConverseResponse {
            message,
            action: parsed.action,
            affect: parsed.affect,
            nodes,
            links,
            collisions: outcome.collisions,
            model: model.as_str().to_string(),
        })
    }
}
