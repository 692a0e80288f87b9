//! LLM client abstraction.
//!
//! The oracle is an opaque text-completion service: a system instruction and
//! a user message go in, one free-text completion comes out. Clients use a
//! blocking HTTP client; async callers run them on tokio's blocking pool.

mod anthropic;
mod openai;
mod registry;

pub use anthropic::AnthropicClient;
pub use openai::OpenAiClient;
pub use registry::{Completion, ModelRegistry};

use crate::Result;
use crate::config::LlmConfig;
use std::time::Duration;

/// One completion call.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    /// System instruction.
    pub system: String,
    /// User message.
    pub user: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// Nucleus-sampling threshold.
    pub top_p: f32,
    /// Output token limit.
    pub max_tokens: u32,
}

impl CompletionRequest {
    /// Creates a request with moderate default sampling.
    #[must_use]
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
            temperature: 0.7,
            top_p: 1.0,
            max_tokens: 1024,
        }
    }

    /// Overrides the sampling parameters.
    #[must_use]
    pub const fn with_sampling(mut self, temperature: f32, top_p: f32, max_tokens: u32) -> Self {
        self.temperature = temperature;
        self.top_p = top_p;
        self.max_tokens = max_tokens;
        self
    }
}

/// Trait for LLM providers.
pub trait LlmProvider: Send + Sync {
    /// Returns the provider name.
    fn name(&self) -> &'static str;

    /// Returns the model identifier sent upstream.
    fn model(&self) -> &str;

    /// Generates a completion.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::OperationFailed`] on transport failures,
    /// non-success statuses, or responses without text.
    fn complete(&self, request: &CompletionRequest) -> Result<String>;
}

/// HTTP client configuration for LLM requests.
#[derive(Debug, Clone, Copy)]
pub struct LlmHttpConfig {
    /// Request timeout in milliseconds (0 to disable).
    pub timeout_ms: u64,
    /// Connect timeout in milliseconds (0 to disable).
    pub connect_timeout_ms: u64,
}

impl Default for LlmHttpConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 30_000,
            connect_timeout_ms: 3_000,
        }
    }
}

impl LlmHttpConfig {
    /// Takes the timeouts from the LLM configuration section.
    #[must_use]
    pub const fn from_config(config: &LlmConfig) -> Self {
        Self {
            timeout_ms: config.timeout_ms,
            connect_timeout_ms: config.connect_timeout_ms,
        }
    }
}

/// Builds a blocking HTTP client with the configured timeouts.
#[must_use]
pub fn build_http_client(config: LlmHttpConfig) -> reqwest::blocking::Client {
    let mut builder = reqwest::blocking::Client::builder();
    if config.timeout_ms > 0 {
        builder = builder.timeout(Duration::from_millis(config.timeout_ms));
    }
    if config.connect_timeout_ms > 0 {
        builder = builder.connect_timeout(Duration::from_millis(config.connect_timeout_ms));
    }

    builder.build().unwrap_or_else(|err| {
        tracing::warn!("Failed to build LLM HTTP client: {err}");
        reqwest::blocking::Client::new()
    })
}

/// Classifies a transport error for logs.
fn error_kind(e: &reqwest::Error) -> &'static str {
    if e.is_timeout() {
        "timeout"
    } else if e.is_connect() {
        "connect"
    } else if e.is_request() {
        "request"
    } else {
        "unknown"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_config_from_llm_config() {
        let llm = LlmConfig {
            timeout_ms: 1_234,
            connect_timeout_ms: 56,
            ..LlmConfig::default()
        };
        let http = LlmHttpConfig::from_config(&llm);
        assert_eq!(http.timeout_ms, 1_234);
        assert_eq!(http.connect_timeout_ms, 56);
    }

    #[test]
    fn test_completion_request_sampling() {
        let request = CompletionRequest::new("sys", "user").with_sampling(0.9, 0.95, 300);
        assert!((request.temperature - 0.9).abs() < f32::EPSILON);
        assert!((request.top_p - 0.95).abs() < f32::EPSILON);
        assert_eq!(request.max_tokens, 300);
    }
}
