//! Observability and telemetry.
//!
//! One `tracing` subscriber per process (pretty or JSON, filtered by
//! `RUST_LOG` or configuration) plus an optional Prometheus recorder whose
//! exposition is served at `/metrics`.

mod logging;
mod metrics;

pub use logging::build_filter;
pub use metrics::{global_handle as metrics_handle, install_prometheus};

use crate::config::{FlowtionConfig, LogFormat};
use crate::{Error, Result};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::OnceLock;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

static OBSERVABILITY_INIT: OnceLock<()> = OnceLock::new();

/// Options from the command line.
#[derive(Debug, Clone, Copy, Default)]
pub struct InitOptions {
    /// Whether verbose output was requested via CLI.
    pub verbose: bool,
}

/// Handle for observability runtime components.
#[derive(Clone, Default)]
pub struct ObservabilityHandle {
    /// Prometheus render handle when metrics are enabled.
    pub metrics: Option<PrometheusHandle>,
}

/// Initializes logging and, when enabled, the metrics recorder.
///
/// # Errors
///
/// Returns an error if observability has already been initialized or if the
/// subscriber or recorder cannot be installed.
pub fn init(config: &FlowtionConfig, options: InitOptions) -> Result<ObservabilityHandle> {
    if OBSERVABILITY_INIT.get().is_some() {
        return Err(Error::failed(
            "observability_init",
            "observability already initialized",
        ));
    }

    let filter = build_filter(&config.logging, options.verbose);
    match config.logging.format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_current_span(true)
                    .with_span_list(true)
                    .with_target(true)
                    .with_thread_ids(true),
            )
            .with(filter)
            .try_init()
            .map_err(init_error)?,
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true),
            )
            .with(filter)
            .try_init()
            .map_err(init_error)?,
    }

    let metrics = if config.server.metrics_enabled {
        Some(install_prometheus()?)
    } else {
        None
    };

    OBSERVABILITY_INIT
        .set(())
        .map_err(|()| Error::failed("observability_init", "failed to mark observability initialized"))?;

    tracing::debug!(
        format = ?config.logging.format,
        metrics = metrics.is_some(),
        "Observability initialized"
    );
    Ok(ObservabilityHandle { metrics })
}

/// Helper to convert init errors.
#[allow(clippy::needless_pass_by_value)]
fn init_error(e: tracing_subscriber::util::TryInitError) -> Error {
    Error::failed("observability_init", e)
}
