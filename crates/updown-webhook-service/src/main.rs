//! # updown-webhook Service
//!
//! Binary entry point for the updown.io webhook receiver.
//!
//! This executable:
//! - Parses command-line flags and loads configuration from files and environment
//! - Initializes logging
//! - Resolves the provider's notification addresses once
//! - Starts the HTTP server from updown-webhook-api

use anyhow::Context;
use clap::Parser;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use updown_webhook_api::{start_server, LoggingConfig, ServiceConfig, ServiceError};
use updown_webhook_core::ProviderIpResolver;

/// Receives updown.io webhooks, validates them and counts events by kind
#[derive(Debug, Parser)]
#[command(name = "updown-webhook")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "UPDOWN_WEBHOOK_CONFIG")]
    config: Option<String>,

    /// Port to bind the HTTP server, overrides server.port
    #[arg(short, long, env = "UPDOWN_WEBHOOK_PORT")]
    port: Option<u16>,

    /// Host to bind the HTTP server, overrides server.host
    #[arg(long)]
    host: Option<String>,

    /// Logging level, overrides logging.level
    #[arg(short, long)]
    log_level: Option<String>,

    /// Enable JSON logging
    #[arg(long)]
    json_logs: bool,
}

impl Cli {
    /// Apply flag values on top of loaded configuration
    fn apply_overrides(&self, config: &mut ServiceConfig) {
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(host) = &self.host {
            config.server.host = host.clone();
        }
        if let Some(level) = &self.log_level {
            config.logging.level = level.clone();
        }
        if self.json_logs {
            config.logging.json_format = true;
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let loaded = load_config(&cli);

    let logging = loaded
        .as_ref()
        .map(|config| config.logging.clone())
        .unwrap_or_default();
    if let Err(e) = init_tracing(&logging) {
        eprintln!("updown-webhook: {e:#}");
        std::process::exit(1);
    }

    let result = match loaded {
        Ok(config) => run(config).await,
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        error!(error = %e, "updown-webhook stopped with an error");
        std::process::exit(e.exit_code());
    }
}

fn load_config(cli: &Cli) -> Result<ServiceConfig, ServiceError> {
    let mut config = ServiceConfig::load(cli.config.as_deref())?;
    cli.apply_overrides(&mut config);
    config.validate()?;
    Ok(config)
}

fn init_tracing(logging: &LoggingConfig) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.level))
        .with_context(|| format!("invalid log level '{}'", logging.level))?;

    let registry = tracing_subscriber::registry().with(filter);
    let installed = if logging.json_format {
        registry.with(fmt::layer().json()).try_init()
    } else {
        registry.with(fmt::layer()).try_init()
    };

    installed.context("failed to install tracing subscriber")
}

async fn run(config: ServiceConfig) -> Result<(), ServiceError> {
    info!(
        host = %config.server.host,
        port = config.server.port,
        subsystem = %config.metrics.subsystem,
        "Starting updown-webhook"
    );

    // a failed lookup is fatal; the whitelist is never refreshed
    let provider_ips = ProviderIpResolver::system()
        .resolve(&config.provider.whitelist_host)
        .await?;

    start_server(config, Arc::new(provider_ips)).await
}

#[cfg(test)]
#[path = "main_tests.rs"]
mod tests;
