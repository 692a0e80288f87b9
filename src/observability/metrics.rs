//! Prometheus metrics recorder.

use crate::{Error, Result};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;

static GLOBAL_METRICS: OnceLock<PrometheusHandle> = OnceLock::new();

/// Installs the global Prometheus recorder once and returns its render handle.
///
/// Later calls return the handle installed by the first.
///
/// # Errors
///
/// Returns an error if another recorder is already installed.
pub fn install_prometheus() -> Result<PrometheusHandle> {
    if let Some(handle) = GLOBAL_METRICS.get() {
        return Ok(handle.clone());
    }

    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| Error::failed("metrics_recorder_install", e))?;
    describe();

    Ok(GLOBAL_METRICS.get_or_init(|| handle).clone())
}

/// Returns the installed handle, if any.
#[must_use]
pub fn global_handle() -> Option<PrometheusHandle> {
    GLOBAL_METRICS.get().cloned()
}

fn describe() {
    metrics::describe_counter!("storage_operations_total", "Document store operations by status");
    metrics::describe_histogram!("storage_operation_duration_ms", "Document store latency");
    metrics::describe_counter!("llm_requests_total", "Oracle calls by provider and status");
    metrics::describe_histogram!("llm_request_duration_ms", "Oracle latency");
    metrics::describe_counter!("converse_nodes_created_total", "Nodes planted by conversation");
    metrics::describe_counter!("auth_failures_total", "Rejected credentials and tokens");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_registry_smoke() {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();
        metrics::with_local_recorder(&recorder, || {
            metrics::counter!("test_metrics_registry_total").increment(1);
        });
        assert!(handle.render().contains("test_metrics_registry_total"));
    }
}
