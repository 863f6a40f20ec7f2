//! CLI entry point for the NYC green-taxi revenue pipeline.
//!
//! Provides subcommands for staging the monthly trip files into object
//! storage, aggregating the staged months into the revenue report, and
//! running both stages back to back.

use anyhow::Result;
use clap::{Parser, Subcommand};
use nyc_taxi_pipeline::aggregate::run_aggregation;
use nyc_taxi_pipeline::config::PipelineConfig;
use nyc_taxi_pipeline::fetch::BasicClient;
use nyc_taxi_pipeline::ingest::run_ingestion;
use nyc_taxi_pipeline::storage::S3Store;
use std::ffi::OsStr;
use std::path::Path;
use tracing::info;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "nyc_taxi_pipeline")]
#[command(about = "Stage NYC green-taxi trip files and report revenue per day", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Download the configured months and stage them under the raw prefix
    Ingest,
    /// Aggregate the staged months into the revenue-per-day CSV report
    Aggregate,
    /// Run ingestion and aggregation back to back
    Run,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path = std::env::var("LOG_FILE_PATH")
        .unwrap_or_else(|_| "logs/nyc_taxi_pipeline.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("nyc_taxi_pipeline.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse().unwrap()));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse().unwrap()));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    let cfg = PipelineConfig::from_env()?;
    let store = S3Store::from_env(cfg.bucket.clone()).await;

    match cli.command {
        Commands::Ingest => {
            let http = BasicClient::new();
            run_ingestion(&cfg, &http, &store).await?;
        }
        Commands::Aggregate => {
            run_aggregation(&cfg, &store).await?;
        }
        Commands::Run => {
            let http = BasicClient::new();
            run_ingestion(&cfg, &http, &store).await?;
            info!("Ingestion finished, starting aggregation");
            run_aggregation(&cfg, &store).await?;
        }
    }

    Ok(())
}
