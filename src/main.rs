//! Binary entry point for flowtion.
//!
//! Runs the HTTP API or prints the resolved configuration.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(missing_docs)]
// Allow print_stderr in main binary for CLI output
#![allow(clippy::print_stderr)]
#![allow(clippy::print_stdout)]
// Allow multiple crate versions from transitive dependencies
#![allow(clippy::multiple_crate_versions)]

use anyhow::Context;
use clap::{Parser, Subcommand};
use flowtion::FlowtionConfig;
use flowtion::observability::{self, InitOptions};
use flowtion::server::{self, AppState};
use flowtion::services::ServiceContainer;
use std::path::PathBuf;
use std::process::ExitCode;

/// Flowtion - a conversational workspace backend.
#[derive(Parser)]
#[command(name = "flowtion")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to configuration file.
    #[arg(short, long, global = true, env = "FLOWTION_CONFIG_PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API server.
    Serve {
        /// Bind address (overrides configuration).
        #[arg(long)]
        host: Option<String>,

        /// Bind port (overrides configuration).
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Manage configuration.
    Config {
        /// Show current configuration.
        #[arg(long)]
        show: bool,
    },
}

/// Main entry point.
#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match FlowtionConfig::resolve(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            return ExitCode::FAILURE;
        },
    };

    let result = match cli.command {
        Commands::Serve { host, port } => cmd_serve(config, cli.verbose, host, port).await,
        Commands::Config { show } => {
            cmd_config(&config, show);
            Ok(())
        },
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        },
    }
}

/// Serve command.
async fn cmd_serve(
    mut config: FlowtionConfig,
    verbose: bool,
    host: Option<String>,
    port: Option<u16>,
) -> anyhow::Result<()> {
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    let handle = observability::init(&config, InitOptions { verbose })
        .context("failed to initialize observability")?;

    let services = ServiceContainer::from_config(&config).context("failed to open services")?;
    if !config.llm.any_configured() {
        tracing::warn!("No LLM backend configured; /api/converse will answer 503");
    }

    let state = AppState::new(services).with_metrics(handle.metrics);
    let app = server::router(state, &config.server);
    server::serve(app, &config.server).await?;
    Ok(())
}

/// Config command.
fn cmd_config(config: &FlowtionConfig, show: bool) {
    if show {
        println!("Current Configuration");
        println!("=====================");
        println!();
        println!("Data Directory: {}", config.data_dir.display());
        println!("Database: {}", config.database_path().display());
        println!("Listen: {}:{}", config.server.host, config.server.port);
        println!("CORS Origins: {:?}", config.server.cors_origins);
        println!("Metrics: {}", config.server.metrics_enabled);
        println!();
        println!("Auth:");
        println!(
            "  JWT Secret: {}",
            if config.auth.jwt_secret.is_some() {
                "[REDACTED]"
            } else {
                "(ephemeral)"
            }
        );
        println!("  Token TTL (hours): {}", config.auth.token_ttl_hours);
        println!("  Password Iterations: {}", config.auth.password_iterations);
        println!();
        println!("LLM Configuration:");
        println!("  Default Model: {:?}", config.llm.default_model);
        println!("  Timeout (ms): {}", config.llm.timeout_ms);
        for (name, backend) in [
            ("Hermes", &config.llm.hermes),
            ("OpenAI", &config.llm.openai),
            ("Anthropic", &config.llm.anthropic),
        ] {
            println!(
                "  {name}: model={} base_url={} configured={}",
                backend.model,
                backend.base_url,
                backend.is_configured()
            );
        }
        println!();
        println!("Logging: {:?} ({})", config.logging.format, config.logging.filter);
        println!("Placement Max Radius: {}", config.placement.max_radius);
    } else {
        println!("Use --show to display configuration");
    }
}
