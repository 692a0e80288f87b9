//! HTTP API.
//!
//! Every route lives under `/api` and answers JSON. Errors use the
//! `{"detail": "..."}` shape from [`error`]. Responses carry the OWASP
//! security headers and are traced per request.

mod error;
mod extract;
mod handlers;

pub use extract::{ApiJson, AuthUser};

use crate::config::ServerConfig;
use crate::services::ServiceContainer;
use crate::{Error, Result};
use axum::Router;
use axum::http::{HeaderValue, Method, header};
use axum::routing::{get, post};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    /// Every service, wired to one store.
    pub services: Arc<ServiceContainer>,
    /// Prometheus render handle; `/metrics` answers 404 without one.
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    /// Creates state with metrics disabled.
    #[must_use]
    pub fn new(services: ServiceContainer) -> Self {
        Self {
            services: Arc::new(services),
            metrics: None,
        }
    }

    /// Serves `/metrics` from the given handle.
    #[must_use]
    pub fn with_metrics(mut self, handle: Option<PrometheusHandle>) -> Self {
        self.metrics = handle;
        self
    }
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/api", get(handlers::root))
        .route("/api/", get(handlers::root))
        .route("/api/auth/register", post(handlers::register))
        .route("/api/auth/login", post(handlers::login))
        .route("/api/auth/me", get(handlers::me))
        .route("/api/pages", post(handlers::create_page).get(handlers::list_pages))
        .route(
            "/api/pages/{id}",
            get(handlers::get_page)
                .patch(handlers::update_page)
                .delete(handlers::delete_page),
        )
        .route("/api/blocks", post(handlers::create_block))
        .route(
            "/api/blocks/{id}",
            get(handlers::list_blocks)
                .patch(handlers::update_block)
                .delete(handlers::delete_block),
        )
        .route("/api/ai/assist", post(handlers::assist))
        .route("/api/converse", post(handlers::converse))
        .route("/api/nodes", get(handlers::list_nodes))
        .route(
            "/api/nodes/{key}",
            get(handlers::list_frequency_nodes)
                .patch(handlers::update_node)
                .delete(handlers::delete_node),
        )
        .route("/api/archive", post(handlers::archive))
        .route("/api/archives", get(handlers::list_archives))
        .route("/api/archives/{id}", get(handlers::get_archive))
        .route("/api/archives/{id}/restore", post(handlers::restore))
        .route("/api/patterns/insights", get(handlers::insights))
}

fn cors_layer(config: &ServerConfig) -> CorsLayer {
    if config.cors_origins.is_empty() {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    }

    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            },
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
}

/// Builds the full application router.
pub fn router(state: AppState, config: &ServerConfig) -> Router {
    Router::new()
        .merge(api_routes())
        .route("/metrics", get(handlers::metrics))
        // Security headers (OWASP recommendations)
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::CONTENT_SECURITY_POLICY,
            HeaderValue::from_static("default-src 'none'; frame-ancestors 'none'"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::HeaderName::from_static("x-permitted-cross-domain-policies"),
            HeaderValue::from_static("none"),
        ))
        .layer(cors_layer(config))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Binds `host:port` and serves until ctrl-c.
///
/// # Errors
///
/// Returns an error if the address cannot be bound or the server fails.
pub async fn serve(app: Router, config: &ServerConfig) -> Result<()> {
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| Error::failed("bind", e))?;
    tracing::info!(addr = %addr, "Starting Flowtion API server");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| Error::failed("serve", e))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
