//! Earnings Pulse entry point.
//!
//! This binary is the composition root. It loads configuration, installs the
//! tracing subscriber, builds the concrete adapters (filesystem stores, HTTP
//! classifier, Ollama provider, transcript fetcher) and hands them to the
//! [`nodes::PipelineExecutor`]. Nothing outside this crate names a concrete
//! adapter type.
//!
//! ## Commands
//!
//! - `earnings-pulse serve` (default) starts the HTTP API
//! - `earnings-pulse run` runs the pipeline once in the foreground
//! - `earnings-pulse status` prints the persisted status record

mod config;
mod telemetry;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use classifier::HttpClassifier;
use fetcher::HttpTranscriptFetcher;
use llm::OllamaProvider;
use nodes::{PipelineExecutor, PipelineStages, StageDependencies};
use pipeline::SentimentScorer;
use store::{read_status_snapshot, FileStatusStore, FsArtifactStore};
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use crate::config::{AppConfig, LogFormat, Overrides};

#[derive(Debug, Parser)]
#[command(name = "earnings-pulse")]
#[command(author, version, about = "Earnings-call sentiment pipeline and API", long_about = None)]
struct Cli {
    /// Configuration file (default: ./earnings-pulse.toml if present).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding artifacts and the status file.
    #[arg(long, env = "EARNINGS_PULSE_DATA_DIR", global = true)]
    data_dir: Option<PathBuf>,

    /// Console log format.
    #[arg(long, value_enum, global = true)]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Serve the HTTP API (default).
    Serve {
        /// Listen address.
        #[arg(long, env = "EARNINGS_PULSE_BIND")]
        bind: Option<String>,
    },
    /// Run the pipeline once and exit.
    Run,
    /// Print the persisted pipeline status.
    Status,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Command::Serve { bind: None });

    let bind = match &command {
        Command::Serve { bind } => bind.clone(),
        _ => None,
    };
    let config = AppConfig::load(
        cli.config.as_deref(),
        Overrides {
            data_dir: cli.data_dir,
            bind,
            log_format: cli.log_format,
        },
    )?;

    let telemetry = telemetry::init(config.log_format)?;
    let result = dispatch(command, config).await;
    if let Err(e) = &result {
        error!(error = %format!("{e:#}"), "Command failed");
    }
    telemetry.shutdown();
    result
}

async fn dispatch(command: Command, config: AppConfig) -> anyhow::Result<()> {
    match command {
        Command::Serve { .. } => serve(config).await,
        Command::Run => run_once(config).await,
        Command::Status => print_status(config).await,
    }
}

async fn serve(config: AppConfig) -> anyhow::Result<()> {
    let (executor, artifacts) = build_executor(&config).await?;
    let listener = TcpListener::bind(&config.bind)
        .await
        .with_context(|| format!("failed to bind {}", config.bind))?;

    server::serve(listener, server::AppState::new(executor, artifacts), shutdown_signal())
        .await
        .context("HTTP server failed")?;
    info!("Server stopped");
    Ok(())
}

async fn run_once(config: AppConfig) -> anyhow::Result<()> {
    let (executor, _) = build_executor(&config).await?;
    let ticket = executor.trigger().await?;
    info!(run_id = %ticket.run_id, "Pipeline run started");

    let report = ticket.wait().await?;
    info!(
        run_id = %report.run_id,
        stages = report.stages.len(),
        elapsed_ms = (report.finished_at.as_datetime() - report.started_at.as_datetime())
            .num_milliseconds(),
        "Pipeline run complete"
    );
    Ok(())
}

async fn print_status(config: AppConfig) -> anyhow::Result<()> {
    let status = read_status_snapshot(&config.data_dir)
        .await
        .with_context(|| format!("failed to read status under {}", config.data_dir.display()))?;
    println!("{}", serde_json::to_string_pretty(&status)?);
    Ok(())
}

async fn build_executor(
    config: &AppConfig,
) -> anyhow::Result<(Arc<PipelineExecutor>, Arc<FsArtifactStore>)> {
    let status = FileStatusStore::open(&config.data_dir)
        .await
        .with_context(|| format!("failed to open status store under {}", config.data_dir.display()))?;
    let artifacts = Arc::new(FsArtifactStore::new(&config.data_dir));

    let classifier =
        HttpClassifier::new(&config.classifier).context("failed to build sentiment classifier")?;
    let llm = OllamaProvider::new(&config.llm).context("failed to build LLM client")?;
    let fetcher =
        HttpTranscriptFetcher::new(config.fetch.clone()).context("failed to build fetcher")?;

    let stages = PipelineStages::standard(StageDependencies {
        artifacts: artifacts.clone(),
        fetcher: Arc::new(fetcher),
        scorer: SentimentScorer::new(Arc::new(classifier), config.scoring.limits),
        llm: Arc::new(llm),
        preprocess: config.preprocess.clone(),
        company: config.company.clone(),
        score_concurrency: config.scoring.concurrency,
    });

    info!(
        data_dir = %config.data_dir.display(),
        model = %config.llm.model,
        "Pipeline assembled"
    );
    Ok((Arc::new(PipelineExecutor::new(stages, Arc::new(status))), artifacts))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
