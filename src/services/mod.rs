//! Business logic services.
//!
//! Services orchestrate the document store and the LLM registry and provide
//! the operations behind every HTTP route. They are synchronous; handlers
//! run oracle-bound calls on tokio's blocking pool.

mod archive;
mod assist;
mod auth;
mod conversation;
mod insights;
mod nodes;
mod pages;
mod password;

pub mod dedup;
pub mod heuristics;
pub mod placement;
pub mod prompt_composer;
pub mod response_parser;

pub use archive::ArchiveService;
pub use assist::{AssistRequest, AssistResponse, AssistService, assist_prompt};
pub use auth::{AuthResponse, AuthService, Claims, JwtAuthenticator, LoginRequest, RegisterRequest};
pub use conversation::ConversationService;
pub use insights::{InsightService, PatternInsights};
pub use nodes::NodeService;
pub use pages::PageService;
pub use password::{hash_password, verify_password};
pub use placement::PlacementEngine;

use crate::Result;
use crate::config::FlowtionConfig;
use crate::llm::ModelRegistry;
use crate::models::ModelPreference;
use crate::storage::{DocumentStore, SqliteStore};
use std::sync::Arc;

/// Every service, wired to one store and one model registry.
#[derive(Clone)]
pub struct ServiceContainer {
    /// Accounts and tokens.
    pub auth: AuthService,
    /// Pages and blocks.
    pub pages: PageService,
    /// Direct node management.
    pub nodes: NodeService,
    /// Archive records.
    pub archive: ArchiveService,
    /// The conversational pipeline.
    pub conversation: ConversationService,
    /// Pattern insights.
    pub insights: InsightService,
    /// Writing assist.
    pub assist: AssistService,
    /// Backend used when a request names none.
    pub default_model: ModelPreference,
}

impl ServiceContainer {
    /// Opens the configured database and builds every service.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened.
    pub fn from_config(config: &FlowtionConfig) -> Result<Self> {
        let path = config.database_path();
        tracing::info!(path = %path.display(), "Opening document store");
        let store: Arc<dyn DocumentStore> = Arc::new(SqliteStore::new(path)?);
        let registry = Arc::new(ModelRegistry::from_config(&config.llm));
        Ok(Self::with_parts(config, store, registry))
    }

    /// Builds every service over an explicit store and registry.
    #[must_use]
    pub fn with_parts(
        config: &FlowtionConfig,
        store: Arc<dyn DocumentStore>,
        registry: Arc<ModelRegistry>,
    ) -> Self {
        let jwt = JwtAuthenticator::from_config(&config.auth);
        let default_model = config.llm.default_model;

        Self {
            auth: AuthService::new(Arc::clone(&store), jwt, config.auth.password_iterations),
            pages: PageService::new(Arc::clone(&store)),
            nodes: NodeService::new(Arc::clone(&store)),
            archive: ArchiveService::new(Arc::clone(&store)),
            conversation: ConversationService::new(
                Arc::clone(&store),
                Arc::clone(&registry),
                PlacementEngine::from_config(&config.placement),
            ),
            insights: InsightService::new(store, Arc::clone(&registry)),
            assist: AssistService::new(registry, default_model),
            default_model,
        }
    }

    /// Seeds placement jitter so layouts are reproducible.
    #[must_use]
    pub fn with_placement_seed(mut self, seed: u64) -> Self {
        self.conversation = self.conversation.with_seed(seed);
        self
    }
}
