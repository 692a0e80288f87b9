//! Builds the system/user prompt pair for a conversational turn.

use crate::llm::CompletionRequest;
use crate::models::{Frequency, ModelPreference};
use crate::{Error, Result};

/// Maximum number of existing titles quoted back to the oracle.
pub const MAX_CONTEXT_TITLES: usize = 10;

/// Voice and sampling for one backend.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Persona {
    /// Opening of the system instruction.
    pub voice: &'static str,
    /// Sampling temperature.
    pub temperature: f32,
    /// Nucleus-sampling threshold.
    pub top_p: f32,
    /// Output token limit.
    pub max_tokens: u32,
}

impl Persona {
    /// Returns the persona used for a backend.
    #[must_use]
    pub const fn for_model(model: ModelPreference) -> Self {
        match model {
            ModelPreference::Hermes => Self {
                voice: "You are Flowtion, a contemplative companion who listens for the shape \
                        beneath what people say. Answer in a few calm sentences.",
                temperature: 0.8,
                top_p: 0.95,
                max_tokens: 400,
            },
            ModelPreference::Openai => Self {
                voice: "You are Flowtion, a clear and warm thinking partner. Reflect the user's \
                        idea back in plain language and suggest one gentle next step.",
                temperature: 0.7,
                top_p: 1.0,
                max_tokens: 350,
            },
            ModelPreference::Claude => Self {
                voice: "You are Flowtion, a thoughtful guide for a living map of ideas. Notice \
                        connections, name them precisely, and keep replies brief.",
                temperature: 0.6,
                top_p: 0.9,
                max_tokens: 400,
            },
        }
    }
}

/// How each frequency colors the conversation.
const fn frequency_guidance(frequency: Frequency) -> &'static str {
    match frequency {
        Frequency::Reflect => "The user is in reflect mode: slow down and mirror what matters.",
        Frequency::Focus => "The user is in focus mode: favor concrete, actionable framing.",
        Frequency::Dream => "The user is in dream mode: follow associations and images freely.",
        Frequency::Synthesize => {
            "The user is in synthesize mode: look for threads that tie existing ideas together."
        },
    }
}

const NODE_INSTRUCTION: &str = "When a concept deserves its own place on the user's map, wrap \
    its short title in double quotes, like \"Morning Anchor\". Only quote titles you mean to plant.";

/// Composes the completion request for one utterance.
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] when `text` is empty or whitespace.
pub fn compose(
    text: &str,
    frequency: Frequency,
    model: ModelPreference,
    existing_titles: &[String],
) -> Result<CompletionRequest> {
    if text.trim().is_empty() {
        return Err(Error::InvalidInput("Text cannot be empty".to_string()));
    }

    let persona = Persona::for_model(model);
    let mut system = format!(
        "{}\n\n{}\n\n{}",
        persona.voice,
        frequency_guidance(frequency),
        NODE_INSTRUCTION
    );

    let context: Vec<&str> = existing_titles
        .iter()
        .map(String::as_str)
        .filter(|t| !t.trim().is_empty())
        .take(MAX_CONTEXT_TITLES)
        .collect();
    if !context.is_empty() {
        system.push_str("\n\nAlready on the map: ");
        system.push_str(&context.join(", "));
        system.push('.');
    }

    Ok(CompletionRequest::new(system, text).with_sampling(
        persona.temperature,
        persona.top_p,
        persona.max_tokens,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn titles(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("Title {i}")).collect()
    }

    #[test]
    fn test_empty_text_rejected() {
        let result = compose("   ", Frequency::Reflect, ModelPreference::Hermes, &[]);
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_user_message_is_raw_utterance() {
        let text = r#"I want to start exploring "Morning Anchor""#;
        let request = compose(text, Frequency::Reflect, ModelPreference::Openai, &[]).unwrap();
        assert_eq!(request.user, text);
        assert!(!request.system.contains("Already on the map"));
    }

    #[test]
    fn test_every_persona_asks_for_double_quotes() {
        for model in ModelPreference::FALLBACK_ORDER {
            let request = compose("hello", Frequency::Dream, model, &[]).unwrap();
            assert!(request.system.contains("double quotes"), "{model}");
            assert!(request.system.contains("dream mode"));
        }
    }

    #[test]
    fn test_context_capped_at_ten_titles() {
        let request =
            compose("hi", Frequency::Focus, ModelPreference::Claude, &titles(14)).unwrap();
        assert!(request.system.contains("Title 9"));
        assert!(!request.system.contains("Title 10"));
    }

    #[test]
    fn test_personas_carry_their_own_sampling() {
        let hermes = compose("hi", Frequency::Reflect, ModelPreference::Hermes, &[]).unwrap();
        let claude = compose("hi", Frequency::Reflect, ModelPreference::Claude, &[]).unwrap();
        assert!((hermes.temperature - 0.8).abs() < f32::EPSILON);
        assert!((claude.top_p - 0.9).abs() < f32::EPSILON);
        assert_ne!(hermes.system, claude.system);
    }
}
