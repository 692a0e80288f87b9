//! Structured logging settings.

use crate::config::LoggingConfig;
use tracing_subscriber::EnvFilter;

/// Resolves the effective filter: `RUST_LOG` wins, then the configured
/// filter, raised to debug for flowtion when `verbose` is set.
#[must_use]
pub fn build_filter(config: &LoggingConfig, verbose: bool) -> EnvFilter {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return filter;
    }

    let directives = if verbose {
        format!("{},flowtion=debug", config.filter)
    } else {
        config.filter.clone()
    };
    EnvFilter::try_new(&directives).unwrap_or_else(|e| {
        // The subscriber is not up yet, so this cannot go through tracing
        #[allow(clippy::print_stderr)]
        {
            eprintln!("Invalid log filter {directives:?}: {e}; falling back to info");
        }
        EnvFilter::new("info")
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbose_adds_debug_directive() {
        let config = LoggingConfig::default();
        let filter = build_filter(&config, true);
        // RUST_LOG may be set in CI; only assert when it is not
        if std::env::var_os("RUST_LOG").is_none() {
            assert!(filter.to_string().contains("flowtion=debug"));
        }
    }

    #[test]
    fn test_invalid_filter_falls_back() {
        let config = LoggingConfig {
            filter: "flowtion=loud".to_string(),
            ..LoggingConfig::default()
        };
        if std::env::var_os("RUST_LOG").is_none() {
            assert_eq!(build_filter(&config, false).to_string(), "info");
        }
    }
}
