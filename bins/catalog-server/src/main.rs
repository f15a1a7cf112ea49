//! Catalog server - product catalog HTTP service
//!
//! Loads configuration, starts logging and serves the catalog API until
//! interrupted.

use catalog_api::{AppState, ProductRepository, ProductService};
use catalog_core::prelude::*;
use catalog_telemetry::TelemetryConfig;
use clap::{Parser, ValueEnum};
use std::process::ExitCode;
use std::sync::Arc;

/// Product catalog HTTP server with fuzzy name search
#[derive(Parser)]
#[command(name = "catalog-server")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long, env = "CATALOG_CONFIG")]
    config: Option<String>,

    /// Interface to listen on (overrides config and HOST)
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on (overrides config and PORT)
    #[arg(short, long, value_parser = clap::value_parser!(u16).range(1..))]
    port: Option<u16>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    /// Log output format
    #[arg(long, value_enum)]
    log_format: Option<LogFormat>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => exit_code(exit_codes::SUCCESS),
        Err(e) => {
            eprintln!("{}", e);
            if let Ok(report) = serde_json::to_string(&e.to_report()) {
                tracing::error!(report = %report, "Server failed");
            }
            let code = if e.code.category() == "Configuration" {
                exit_codes::CONFIG_ERROR
            } else {
                exit_codes::FAILURE
            };
            exit_code(code)
        }
    }
}

fn exit_code(code: i32) -> ExitCode {
    ExitCode::from(u8::try_from(code).unwrap_or(1))
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = Config::load(cli.config.as_deref())?;
    apply_cli_overrides(&mut config, &cli);
    config.validate()?;

    catalog_telemetry::init_with_config(telemetry_config(&config.schema))
        .map_err(|e| Error::internal(e.to_string()))?;

    if let Some(path) = &config.path {
        tracing::info!(path = %path, "Loaded configuration");
    }

    let repository = Arc::new(ProductRepository::seeded()?);
    tracing::info!(products = repository.len(), "Catalog ready");

    let service = ProductService::from_config(Arc::clone(&repository), &config.schema);
    let limiter = RateLimiter::new(RateLimitConfig::from(&config.schema.rate_limit));
    let state = Arc::new(AppState::new(service, limiter));

    let address = config.bind_address();
    let listener = catalog_api::bind(&address)?;
    tracing::info!(
        address = %address,
        environment = %config.schema.server.environment,
        max_distance = config.schema.search.max_distance,
        "Starting catalog server"
    );

    catalog_api::serve(listener, Arc::clone(&state), shutdown_signal()).await?;

    let snapshot = state.metrics.snapshot();
    tracing::info!(
        total_requests = snapshot.total_requests,
        error_responses = snapshot.error_responses,
        uptime_secs = snapshot.uptime_secs,
        p95_ms = snapshot.latency.p95,
        "Server stopped"
    );
    Ok(())
}

fn apply_cli_overrides(config: &mut Config, cli: &Cli) {
    if let Some(host) = &cli.host {
        config.schema.server.host = host.clone();
    }
    if let Some(port) = cli.port {
        config.schema.server.port = port;
    }
    if cli.verbose {
        config.schema.logging.level = "debug".to_string();
    }
    if let Some(format) = cli.log_format {
        config.schema.logging.json = format == LogFormat::Json;
    }
}

fn telemetry_config(schema: &ConfigSchema) -> TelemetryConfig {
    TelemetryConfig {
        log_level: schema.logging.level.clone(),
        json: schema.logging.json,
        show_target: schema.logging.level == "debug" || schema.logging.level == "trace",
        ..TelemetryConfig::default()
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown requested");
}
