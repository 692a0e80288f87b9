//! # Flowtion
//!
//! A conversational workspace backend.
//!
//! Flowtion stores pages and blocks like a classic note editor, and adds a
//! canvas of "nodes" that grow out of short conversations with a hosted LLM.
//! The oracle's free-text replies are scraped with lexical heuristics into
//! candidate nodes, deduplicated against what the user already has, and
//! placed near the centroid of the existing canvas.
//!
//! ## Features
//!
//! - JWT-authenticated JSON API (axum)
//! - Ownership-scoped page, block and node CRUD over an embedded `SQLite` store
//! - Pluggable LLM backends (Nous Hermes, `OpenAI`, Anthropic)
//! - Heuristic response parsing, fuzzy title dedup and geometric placement
//! - Non-destructive archive and selective restore per frequency
//!
//! ## Example
//!
//! ```rust,ignore
//! use flowtion::services::ServiceContainer;
//! use flowtion::FlowtionConfig;
//!
//! use flowtion::server::{self, AppState};
//!
//! let config = FlowtionConfig::load_default();
//! let services = ServiceContainer::from_config(&config)?;
//! let app = server::router(AppState::new(services), &config.server);
//! server::serve(app, &config.server).await?;
//! ```

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(missing_docs)]
#![forbid(unsafe_code)]
#![allow(clippy::multiple_crate_versions)]

use thiserror::Error as ThisError;

// Module declarations
pub mod config;
pub mod llm;
pub mod models;
pub mod observability;
pub mod server;
pub mod services;
pub mod storage;

// Re-exports for convenience
pub use config::FlowtionConfig;
pub use llm::LlmProvider;
pub use models::{
    Action, Affect, ArchiveRecord, Block, Frequency, ModelPreference, Node, NodeId, NodeType,
    Page, PatternLog, Position, User,
};
pub use services::ServiceContainer;
pub use storage::{DocumentStore, SqliteStore};

/// Error type for flowtion operations.
///
/// Every variant maps onto exactly one HTTP status at the request boundary
/// (see `server::error`).
///
/// | Variant | Raised When |
/// |---------|-------------|
/// | `InvalidInput` | Empty text, unknown frequency, malformed patch, duplicate email |
/// | `Unauthorized` | Missing/expired/invalid bearer token, bad credentials |
/// | `NotFound` | Entity absent, or not owned by the caller |
/// | `Forbidden` | Entity exists but belongs to another user |
/// | `ServiceUnavailable` | No LLM backend configured |
/// | `OperationFailed` | Store failures, oracle failures, anything unexpected |
#[derive(Debug, ThisError)]
pub enum Error {
    /// Invalid input was provided.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Authentication failed.
    ///
    /// Raised when:
    /// - The bearer token is missing, malformed, or expired
    /// - JWT signature verification fails
    /// - Login credentials do not match
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// The requested entity does not exist for this caller.
    #[error("not found: {0}")]
    NotFound(String),

    /// The entity exists but is owned by someone else.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// A required upstream service is not configured.
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),

    /// An operation failed.
    ///
    /// Raised when:
    /// - `SQLite` operations fail
    /// - The LLM oracle times out or returns an error status
    /// - Configuration files cannot be read or parsed
    #[error("operation '{operation}' failed: {cause}")]
    OperationFailed {
        /// The operation that failed.
        operation: String,
        /// The underlying cause.
        cause: String,
    },
}

impl Error {
    /// Builds an [`Error::OperationFailed`] from an operation name and any displayable cause.
    pub fn failed(operation: &str, cause: impl std::fmt::Display) -> Self {
        Self::OperationFailed {
            operation: operation.to_string(),
            cause: cause.to_string(),
        }
    }
}

/// Result type alias for flowtion operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::InvalidInput("test error".to_string());
        assert_eq!(err.to_string(), "invalid input: test error");

        let err = Error::OperationFailed {
            operation: "test".to_string(),
            cause: "failed".to_string(),
        };
        assert_eq!(err.to_string(), "operation 'test' failed: failed");

        let err = Error::NotFound("Page not found".to_string());
        assert_eq!(err.to_string(), "not found: Page not found");
    }

    #[test]
    fn test_failed_helper() {
        let err = Error::failed("open_sqlite", "disk full");
        assert!(matches!(
            err,
            Error::OperationFailed { ref operation, ref cause }
                if operation == "open_sqlite" && cause == "disk full"
        ));
    }
}
