//! Short observations about a user's recent conversational patterns.

use crate::llm::{CompletionRequest, ModelRegistry};
use crate::models::{ModelPreference, PatternLog};
use crate::storage::DocumentStore;
use crate::Result;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::sync::Arc;

/// Number of recent pattern logs examined.
pub const RECENT_LOGS: usize = 20;

/// Fewer logs than this yield no insights and no oracle call.
pub const MIN_LOGS: usize = 3;

/// Maximum number of observations returned.
pub const MAX_INSIGHTS: usize = 3;

const SYSTEM: &str = "You notice gentle patterns in how a person thinks over time. \
    Reply with at most three short observations, one per line, with no preamble.";

/// Insight result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PatternInsights {
    /// Up to three observations.
    pub insights: Vec<String>,
    /// Logs per frequency.
    pub frequency_counts: BTreeMap<String, usize>,
    /// Logs per action.
    pub action_counts: BTreeMap<String, usize>,
    /// Number of logs examined.
    pub total: usize,
}

/// Service for pattern insights.
#[derive(Clone)]
pub struct InsightService {
    store: Arc<dyn DocumentStore>,
    registry: Arc<ModelRegistry>,
}

impl InsightService {
    /// Creates a new insight service.
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>, registry: Arc<ModelRegistry>) -> Self {
        Self { store, registry }
    }

    /// Summarizes the caller's recent pattern logs and asks the oracle for observations.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails, or, when there are enough logs,
    /// if no oracle is configured or the call fails.
    pub fn insights(&self, user_id: &str, model: ModelPreference) -> Result<PatternInsights> {
        let logs = self.store.recent_patterns(user_id, RECENT_LOGS)?;
        let mut result = PatternInsights {
            frequency_counts: count_by(&logs, |l| l.frequency.as_str()),
            action_counts: count_by(&logs, |l| l.action.as_str()),
            total: logs.len(),
            ..Default::default()
        };

        if logs.len() < MIN_LOGS {
            tracing::debug!(logs = logs.len(), "Too few pattern logs for insights");
            return Ok(result);
        }

        let prompt = CompletionRequest::new(SYSTEM, summarize(&result, &logs))
            .with_sampling(0.6, 1.0, 300);
        let completion = self.registry.complete(model, &prompt)?;
        result.insights = parse_observations(&completion.text);
        Ok(result)
    }
}

fn count_by(logs: &[PatternLog], key: impl Fn(&PatternLog) -> &'static str) -> BTreeMap<String, usize> {
    logs.iter().fold(BTreeMap::new(), |mut counts, log| {
        *counts.entry(key(log).to_string()).or_insert(0) += 1;
        counts
    })
}

fn summarize(result: &PatternInsights, logs: &[PatternLog]) -> String {
    let mut summary = format!("Across the last {} conversations:\n", result.total);
    for (label, counts) in [("Frequencies", &result.frequency_counts), ("Actions", &result.action_counts)] {
        let parts: Vec<String> = counts.iter().map(|(k, v)| format!("{k} {v}")).collect();
        let _ = writeln!(summary, "{label}: {}", parts.join(", "));
    }
    summary.push_str("Recent utterances:\n");
    for log in logs.iter().take(5) {
        let _ = writeln!(summary, "- [{}] {}", log.affect, log.text);
    }
    summary
}

/// Takes up to three non-empty lines, stripping bullets and numbering.
fn parse_observations(text: &str) -> Vec<String> {
    text.lines()
        .map(|line| {
            line.trim()
                .trim_start_matches(['-', '*', '•'])
                .trim_start_matches(|c: char| c.is_ascii_digit())
                .trim_start_matches(['.', ')'])
                .trim()
                .to_string()
        })
        .filter(|line| !line.is_empty())
        .take(MAX_INSIGHTS)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::LlmProvider;
    use crate::models::{Action, Affect, Frequency};
    use crate::storage::{PatternStore, SqliteStore};
    use chrono::{Duration, Utc};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Counting {
        calls: AtomicUsize,
    }

    impl LlmProvider for Counting {
        fn name(&self) -> &'static str {
            "counting"
        }

        fn model(&self) -> &str {
            "counting"
        }

        fn complete(&self, request: &CompletionRequest) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            assert!(request.user.contains("Frequencies: "));
            Ok("1. You return to mornings often.\n\n- Focus follows friction.\n* Dreams cluster late.\nA fourth line".to_string())
        }
    }

    fn setup(logs: usize) -> (InsightService, Arc<Counting>) {
        let store = Arc::new(SqliteStore::in_memory().unwrap());
        for i in 0..logs {
            store
                .append_pattern(&PatternLog {
                    id: format!("p{i}"),
                    user_id: "u1".to_string(),
                    frequency: if i % 2 == 0 { Frequency::Reflect } else { Frequency::Focus },
                    action: Action::Create,
                    affect: Affect::Neutral,
                    text: format!("utterance {i}"),
                    model: "openai".to_string(),
                    node_count: 1,
                    created_at: Utc::now() + Duration::seconds(i64::try_from(i).unwrap()),
                })
                .unwrap();
        }
        let oracle = Arc::new(Counting {
            calls: AtomicUsize::new(0),
        });
        let registry = ModelRegistry::new().with_provider(ModelPreference::Openai, oracle.clone());
        (InsightService::new(store, Arc::new(registry)), oracle)
    }

    #[test]
    fn test_too_few_logs_skip_oracle() {
        let (service, oracle) = setup(2);
        let result = service.insights("u1", ModelPreference::Openai).unwrap();
        assert!(result.insights.is_empty());
        assert_eq!(result.total, 2);
        assert_eq!(oracle.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_insights_parsed_and_counted() {
        let (service, oracle) = setup(4);
        let result = service.insights("u1", ModelPreference::Hermes).unwrap();
        assert_eq!(oracle.calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            result.insights,
            vec![
                "You return to mornings often.",
                "Focus follows friction.",
                "Dreams cluster late."
            ]
        );
        assert_eq!(result.frequency_counts.get("reflect"), Some(&2));
        assert_eq!(result.frequency_counts.get("focus"), Some(&2));
        assert_eq!(result.action_counts.get("create"), Some(&4));
    }

    #[test]
    fn test_parse_observations_keeps_plain_lines() {
        assert_eq!(parse_observations("Just one thought"), vec!["Just one thought"]);
        assert!(parse_observations("  \n - \n").is_empty());
    }
}
