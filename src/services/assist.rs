//! Writing assistance for the page editor.

use crate::llm::{CompletionRequest, ModelRegistry};
use crate::models::ModelPreference;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const SYSTEM: &str = "You are a helpful writing assistant. Provide clear, concise responses.";

/// `POST /api/ai/assist` body.
#[derive(Debug, Clone, Deserialize)]
pub struct AssistRequest {
    /// Text to work on.
    pub prompt: String,
    /// `complete`, `improve`, `summarize`, or anything else for a plain prompt.
    #[serde(default)]
    pub action: String,
}

/// `POST /api/ai/assist` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssistResponse {
    /// Completion text.
    pub result: String,
}

/// Builds the user message for an assist action.
#[must_use]
pub fn assist_prompt(action: &str, prompt: &str) -> String {
    match action {
        "complete" => format!("Continue this text naturally: {prompt}"),
        "improve" => format!("Improve and refine this text: {prompt}"),
        "summarize" => format!("Summarize this text: {prompt}"),
        _ => prompt.to_string(),
    }
}

/// Service for writing assistance.
#[derive(Clone)]
pub struct AssistService {
    registry: Arc<ModelRegistry>,
    model: ModelPreference,
}

impl AssistService {
    /// Creates a new assist service using `model` (with fallback).
    #[must_use]
    pub fn new(registry: Arc<ModelRegistry>, model: ModelPreference) -> Self {
        Self { registry, model }
    }

    /// Runs one assist request.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] for an empty prompt,
    /// [`Error::ServiceUnavailable`] without a backend, and
    /// [`Error::OperationFailed`] when the oracle fails.
    pub fn assist(&self, request: &AssistRequest) -> Result<AssistResponse> {
        if request.prompt.trim().is_empty() {
            return Err(Error::InvalidInput("Prompt cannot be empty".to_string()));
        }
        let completion = self.registry.complete(
            self.model,
            &CompletionRequest::new(SYSTEM, assist_prompt(&request.action, &request.prompt)),
        )?;
        Ok(AssistResponse {
            result: completion.text,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::LlmProvider;
    use test_case::test_case;

    struct Echo;

    impl LlmProvider for Echo {
        fn name(&self) -> &'static str {
            "echo"
        }

        fn model(&self) -> &str {
            "echo"
        }

        fn complete(&self, request: &CompletionRequest) -> Result<String> {
            assert_eq!(request.system, SYSTEM);
            Ok(request.user.clone())
        }
    }

    #[test_case("complete", "Continue this text naturally: Once"; "complete")]
    #[test_case("improve", "Improve and refine this text: Once"; "improve")]
    #[test_case("summarize", "Summarize this text: Once"; "summarize")]
    #[test_case("translate", "Once"; "passthrough")]
    fn test_assist_prompt(action: &str, expected: &str) {
        assert_eq!(assist_prompt(action, "Once"), expected);
    }

    #[test]
    fn test_assist_round_trip() {
        let registry = ModelRegistry::new().with_provider(ModelPreference::Claude, Arc::new(Echo));
        let service = AssistService::new(Arc::new(registry), ModelPreference::Openai);
        let response = service
            .assist(&AssistRequest {
                prompt: "a draft".to_string(),
                action: "improve".to_string(),
            })
            .unwrap();
        assert_eq!(response.result, "Improve and refine this text: a draft");
    }

    #[test]
    fn test_assist_errors() {
        let service = AssistService::new(Arc::new(ModelRegistry::new()), ModelPreference::Openai);
        let empty = AssistRequest {
            prompt: " ".to_string(),
            action: String::new(),
        };
        assert!(matches!(service.assist(&empty), Err(Error::InvalidInput(_))));

        let request = AssistRequest {
            prompt: "hi".to_string(),
            action: String::new(),
        };
        assert!(matches!(service.assist(&request), Err(Error::ServiceUnavailable(_))));
    }
}
