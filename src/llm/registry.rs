//! Maps model preferences to configured providers.

use super::{AnthropicClient, CompletionRequest, LlmHttpConfig, LlmProvider, OpenAiClient};
use crate::config::LlmConfig;
use crate::models::ModelPreference;
use crate::{Error, Result};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

/// The text of one completion plus which backend produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    /// Completion text, verbatim.
    pub text: String,
    /// Backend that answered.
    pub model: ModelPreference,
}

/// Configured LLM backends, keyed by preference.
#[derive(Clone, Default)]
pub struct ModelRegistry {
    providers: HashMap<ModelPreference, Arc<dyn LlmProvider>>,
}

impl ModelRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a client for every backend that has an API key.
    #[must_use]
    pub fn from_config(config: &LlmConfig) -> Self {
        let http = LlmHttpConfig::from_config(config);
        let mut registry = Self::new();

        if config.hermes.is_configured() {
            registry = registry.with_provider(
                ModelPreference::Hermes,
                Arc::new(OpenAiClient::from_backend("hermes", &config.hermes, http)),
            );
        }
        if config.openai.is_configured() {
            registry = registry.with_provider(
                ModelPreference::Openai,
                Arc::new(OpenAiClient::from_backend("openai", &config.openai, http)),
            );
        }
        if config.anthropic.is_configured() {
            registry = registry.with_provider(
                ModelPreference::Claude,
                Arc::new(AnthropicClient::from_backend(&config.anthropic, http)),
            );
        }

        tracing::info!(
            backends = ?registry.configured(),
            "LLM backends configured"
        );
        registry
    }

    /// Registers (or replaces) the provider for one preference.
    #[must_use]
    pub fn with_provider(mut self, preference: ModelPreference, provider: Arc<dyn LlmProvider>) -> Self {
        self.providers.insert(preference, provider);
        self
    }

    /// Configured preferences in fallback order.
    #[must_use]
    pub fn configured(&self) -> Vec<ModelPreference> {
        ModelPreference::FALLBACK_ORDER
            .into_iter()
            .filter(|p| self.providers.contains_key(p))
            .collect()
    }

    /// Returns true when no backend is configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Picks the preferred backend, or the first configured one in fallback order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ServiceUnavailable`] when no backend is configured.
    pub fn resolve(
        &self,
        preference: ModelPreference,
    ) -> Result<(ModelPreference, Arc<dyn LlmProvider>)> {
        if let Some(provider) = self.providers.get(&preference) {
            return Ok((preference, Arc::clone(provider)));
        }

        ModelPreference::FALLBACK_ORDER
            .into_iter()
            .find_map(|p| self.providers.get(&p).map(|provider| (p, Arc::clone(provider))))
            .ok_or_else(|| Error::ServiceUnavailable("No LLM backend configured".to_string()))
    }

    /// Runs one completion on the resolved backend and records request metrics.
    ///
    /// Blocks on network I/O; call from a blocking context.
    ///
    /// # Errors
    ///
    /// Propagates resolution and provider errors.
    pub fn complete(
        &self,
        preference: ModelPreference,
        request: &CompletionRequest,
    ) -> Result<Completion> {
        let (model, provider) = self.resolve(preference)?;
        if model != preference {
            tracing::info!(requested = %preference, using = %model, "Preferred model not configured, falling back");
        }

        let start = Instant::now();
        let result = provider.complete(request);
        let status = if result.is_ok() { "success" } else { "error" };
        metrics::counter!(
            "llm_requests_total",
            "provider" => provider.name(),
            "status" => status
        )
        .increment(1);
        metrics::histogram!("llm_request_duration_ms", "provider" => provider.name())
            .record(start.elapsed().as_secs_f64() * 1000.0);

        result.map(|text| Completion { text, model })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(&'static str);

    impl LlmProvider for Fixed {
        fn name(&self) -> &'static str {
            self.0
        }

        fn model(&self) -> &str {
            self.0
        }

        fn complete(&self, _request: &CompletionRequest) -> Result<String> {
            Ok(format!("from {}", self.0))
        }
    }

    #[test]
    fn test_empty_registry_is_unavailable() {
        let registry = ModelRegistry::new();
        assert!(registry.is_empty());
        assert!(matches!(
            registry.resolve(ModelPreference::Hermes),
            Err(Error::ServiceUnavailable(_))
        ));
    }

    #[test]
    fn test_preferred_backend_wins() {
        let registry = ModelRegistry::new()
            .with_provider(ModelPreference::Hermes, Arc::new(Fixed("hermes")))
            .with_provider(ModelPreference::Claude, Arc::new(Fixed("claude")));

        let (model, _) = registry.resolve(ModelPreference::Claude).unwrap();
        assert_eq!(model, ModelPreference::Claude);
    }

    #[test]
    fn test_fallback_order() {
        let registry = ModelRegistry::new()
            .with_provider(ModelPreference::Claude, Arc::new(Fixed("claude")))
            .with_provider(ModelPreference::Openai, Arc::new(Fixed("openai")));

        let completion = registry
            .complete(ModelPreference::Hermes, &CompletionRequest::new("s", "u"))
            .unwrap();
        assert_eq!(completion.model, ModelPreference::Openai);
        assert_eq!(completion.text, "from openai");
        assert_eq!(
            registry.configured(),
            vec![ModelPreference::Openai, ModelPreference::Claude]
        );
    }

    #[test]
    fn test_from_config_skips_unconfigured() {
        let mut config = LlmConfig::default();
        config.hermes.api_key = Some("nous-key".to_string());
        let registry = ModelRegistry::from_config(&config);
        assert_eq!(registry.configured(), vec![ModelPreference::Hermes]);
    }
}
