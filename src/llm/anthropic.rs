//! Anthropic Messages API client.

use super::{CompletionRequest, LlmHttpConfig, LlmProvider, build_http_client, error_kind};
use crate::config::BackendConfig;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Anthropic Claude LLM client.
pub struct AnthropicClient {
    /// API key.
    api_key: Option<String>,
    /// API base URL.
    endpoint: String,
    /// Model to use.
    model: String,
    /// HTTP client.
    client: reqwest::blocking::Client,
}

impl AnthropicClient {
    /// Default API endpoint.
    pub const DEFAULT_ENDPOINT: &'static str = "https://api.anthropic.com/v1";

    /// Default model.
    pub const DEFAULT_MODEL: &'static str = "claude-sonnet-4-20250514";

    /// Protocol version header value.
    const API_VERSION: &'static str = "2023-06-01";

    /// Creates a client without credentials.
    #[must_use]
    pub fn new() -> Self {
        Self {
            api_key: None,
            endpoint: Self::DEFAULT_ENDPOINT.to_string(),
            model: Self::DEFAULT_MODEL.to_string(),
            client: build_http_client(LlmHttpConfig::default()),
        }
    }

    /// Creates a client from a backend section.
    #[must_use]
    pub fn from_backend(backend: &BackendConfig, http: LlmHttpConfig) -> Self {
        Self {
            api_key: backend.api_key.clone(),
            endpoint: backend.base_url.trim_end_matches('/').to_string(),
            model: backend.model.clone(),
            client: build_http_client(http),
        }
    }

    /// Sets the API key.
    #[must_use]
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Sets the model.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    fn validate(&self) -> Result<&str> {
        let key = self
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| Error::ServiceUnavailable("anthropic API key not configured".to_string()))?;

        if !Self::is_valid_api_key_format(key) {
            return Err(Error::failed(
                "anthropic_request",
                "Invalid API key format: expected 'sk-ant-' prefix",
            ));
        }
        Ok(key)
    }

    /// Keys start with `sk-ant-` and contain only alphanumerics, hyphens and underscores.
    fn is_valid_api_key_format(key: &str) -> bool {
        key.starts_with("sk-ant-")
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    }

    fn build_request(&self, request: &CompletionRequest) -> MessagesRequest {
        MessagesRequest {
            model: self.model.clone(),
            max_tokens: request.max_tokens,
            system: request.system.clone(),
            temperature: request.temperature,
            top_p: request.top_p,
            messages: vec![Message {
                role: "user".to_string(),
                content: request.user.clone(),
            }],
        }
    }
}

impl Default for AnthropicClient {
    fn default() -> Self {
        Self::new()
    }
}

impl LlmProvider for AnthropicClient {
    fn name(&self) -> &'static str {
        "anthropic"
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn complete(&self, request: &CompletionRequest) -> Result<String> {
        let api_key = self.validate()?;

        tracing::debug!(provider = "anthropic", model = %self.model, "Making LLM request");

        let response = self
            .client
            .post(format!("{}/messages", self.endpoint))
            .header("x-api-key", api_key)
            .header("anthropic-version", Self::API_VERSION)
            .header("content-type", "application/json")
            .json(&self.build_request(request))
            .send()
            .map_err(|e| {
                let kind = error_kind(&e);
                tracing::error!(
                    provider = "anthropic",
                    model = %self.model,
                    error = %e,
                    error_kind = kind,
                    "LLM request failed"
                );
                Error::failed("anthropic_request", format!("{kind} error: {e}"))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().unwrap_or_default();
            tracing::error!(
                provider = "anthropic",
                model = %self.model,
                status = %status,
                body = %body,
                "LLM API returned error status"
            );
            return Err(Error::failed(
                "anthropic_request",
                format!("API returned status: {status}"),
            ));
        }

        let response: MessagesResponse = response
            .json()
            .map_err(|e| Error::failed("anthropic_response", e))?;

        response
            .content
            .into_iter()
            .find(|block| block.block_type == "text")
            .map(|block| block.text)
            .ok_or_else(|| Error::failed("anthropic_response", "No text content in response"))
    }
}

#[derive(Debug, Serialize)]
struct MessagesRequest {
    model: String,
    max_tokens: u32,
    system: String,
    temperature: f32,
    top_p: f32,
    messages: Vec<Message>,
}

#[derive(Debug, Serialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    #[serde(default)]
    text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = AnthropicClient::new().with_model("claude-3-haiku");
        assert_eq!(client.name(), "anthropic");
        assert_eq!(client.model(), "claude-3-haiku");
    }

    #[test]
    fn test_validate_no_key() {
        let client = AnthropicClient::new();
        assert!(matches!(client.validate(), Err(Error::ServiceUnavailable(_))));
    }

    #[test]
    fn test_validate_key_format() {
        let client = AnthropicClient::new().with_api_key("not-an-anthropic-key");
        assert!(matches!(client.validate(), Err(Error::OperationFailed { .. })));

        let client = AnthropicClient::new().with_api_key("sk-ant-api03-abc_DEF-123");
        assert!(client.validate().is_ok());
    }

    #[test]
    fn test_system_goes_in_top_level_field() {
        let client = AnthropicClient::new();
        let json = serde_json::to_value(
            client.build_request(&CompletionRequest::new("persona", "utterance")),
        )
        .unwrap();
        assert_eq!(json["system"], "persona");
        assert_eq!(json["messages"].as_array().unwrap().len(), 1);
        assert_eq!(json["messages"][0]["content"], "utterance");
    }
}
