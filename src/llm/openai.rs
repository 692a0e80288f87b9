//! OpenAI-compatible chat completions client.
//!
//! Serves both `OpenAI` itself and Nous Hermes, which exposes the same
//! `/chat/completions` contract at a different base URL.

use super::{CompletionRequest, LlmHttpConfig, LlmProvider, build_http_client, error_kind};
use crate::config::BackendConfig;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// OpenAI-compatible LLM client.
pub struct OpenAiClient {
    /// Provider label used in logs and metrics.
    name: &'static str,
    /// API key.
    api_key: Option<String>,
    /// API base URL.
    endpoint: String,
    /// Model to use.
    model: String,
    /// HTTP client.
    client: reqwest::blocking::Client,
}

impl OpenAiClient {
    /// Default `OpenAI` endpoint.
    pub const DEFAULT_ENDPOINT: &'static str = "https://api.openai.com/v1";

    /// Default `OpenAI` model.
    pub const DEFAULT_MODEL: &'static str = "gpt-4o";

    /// Creates an `OpenAI` client without credentials.
    #[must_use]
    pub fn new() -> Self {
        Self {
            name: "openai",
            api_key: None,
            endpoint: Self::DEFAULT_ENDPOINT.to_string(),
            model: Self::DEFAULT_MODEL.to_string(),
            client: build_http_client(LlmHttpConfig::default()),
        }
    }

    /// Creates a client from a backend section.
    #[must_use]
    pub fn from_backend(name: &'static str, backend: &BackendConfig, http: LlmHttpConfig) -> Self {
        Self {
            name,
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

    /// Sets the API endpoint.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Sets the model.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    fn validate(&self) -> Result<&str> {
        match self.api_key.as_deref() {
            Some(key) if !key.trim().is_empty() => Ok(key),
            _ => Err(Error::ServiceUnavailable(format!(
                "{} API key not configured",
                self.name
            ))),
        }
    }

    /// Reasoning-model families reject `max_tokens`, `temperature` and `top_p`.
    fn is_reasoning_model(&self) -> bool {
        self.model.starts_with("gpt-5") || self.model.starts_with("o1") || self.model.starts_with("o3")
    }

    fn build_request(&self, request: &CompletionRequest) -> ChatCompletionRequest {
        let messages = vec![
            ChatMessage {
                role: "system".to_string(),
                content: request.system.clone(),
            },
            ChatMessage {
                role: "user".to_string(),
                content: request.user.clone(),
            },
        ];

        if self.is_reasoning_model() {
            ChatCompletionRequest {
                model: self.model.clone(),
                messages,
                max_tokens: None,
                max_completion_tokens: Some(request.max_tokens),
                temperature: None,
                top_p: None,
            }
        } else {
            ChatCompletionRequest {
                model: self.model.clone(),
                messages,
                max_tokens: Some(request.max_tokens),
                max_completion_tokens: None,
                temperature: Some(request.temperature),
                top_p: Some(request.top_p),
            }
        }
    }
}

impl Default for OpenAiClient {
    fn default() -> Self {
        Self::new()
    }
}

impl LlmProvider for OpenAiClient {
    fn name(&self) -> &'static str {
        self.name
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn complete(&self, request: &CompletionRequest) -> Result<String> {
        let api_key = self.validate()?;
        let operation = format!("{}_request", self.name);

        tracing::debug!(provider = self.name, model = %self.model, "Making LLM request");

        let response = self
            .client
            .post(format!("{}/chat/completions", self.endpoint))
            .header("Authorization", format!("Bearer {api_key}"))
            .header("Content-Type", "application/json")
            .json(&self.build_request(request))
            .send()
            .map_err(|e| {
                let kind = error_kind(&e);
                tracing::error!(
                    provider = self.name,
                    model = %self.model,
                    error = %e,
                    error_kind = kind,
                    "LLM request failed"
                );
                Error::OperationFailed {
                    operation: operation.clone(),
                    cause: format!("{kind} error: {e}"),
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().unwrap_or_default();
            tracing::error!(
                provider = self.name,
                model = %self.model,
                status = %status,
                body = %body,
                "LLM API returned error status"
            );
            return Err(Error::OperationFailed {
                operation,
                cause: format!("API returned status: {status}"),
            });
        }

        let response: ChatCompletionResponse = response
            .json()
            .map_err(|e| Error::failed(&format!("{}_response", self.name), e))?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| Error::failed(&format!("{}_response", self.name), "No choices in response"))
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_completion_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_configuration() {
        let client = OpenAiClient::new()
            .with_api_key("test-key")
            .with_endpoint("https://custom.endpoint")
            .with_model("gpt-4");

        assert_eq!(client.name(), "openai");
        assert_eq!(client.api_key, Some("test-key".to_string()));
        assert_eq!(client.endpoint, "https://custom.endpoint");
        assert_eq!(client.model(), "gpt-4");
    }

    #[test]
    fn test_from_backend_hermes() {
        let backend = crate::config::LlmConfig::default().hermes;
        let client = OpenAiClient::from_backend("hermes", &backend, LlmHttpConfig::default());
        assert_eq!(client.name(), "hermes");
        assert_eq!(client.model(), "Hermes-4-70B");
        assert_eq!(client.endpoint, "https://inference-api.nousresearch.com/v1");
    }

    #[test]
    fn test_missing_key_is_service_unavailable() {
        let client = OpenAiClient::new();
        let result = client.complete(&CompletionRequest::new("sys", "hi"));
        assert!(matches!(result, Err(Error::ServiceUnavailable(_))));
    }

    #[test]
    fn test_request_carries_sampling() {
        let client = OpenAiClient::new().with_model("gpt-4o");
        let body = client.build_request(
            &CompletionRequest::new("be brief", "hello").with_sampling(0.8, 0.9, 150),
        );
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "hello");
        assert_eq!(json["max_tokens"], 150);
        assert!(json.get("max_completion_tokens").is_none());
    }

    #[test]
    fn test_reasoning_model_drops_sampling() {
        let client = OpenAiClient::new().with_model("o3-mini");
        let json = serde_json::to_value(client.build_request(&CompletionRequest::new("s", "u")))
            .unwrap();
        assert!(json.get("temperature").is_none());
        assert!(json.get("top_p").is_none());
        assert_eq!(json["max_completion_tokens"], 1024);
    }
}
