mod cli;
mod config;
mod enrichment;
mod errors;
mod ingest;
mod llm_client;
mod models;
mod pipeline;
mod report;
mod retry;
mod routes;
mod scoring;
mod search;
mod state;
mod verification;

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::cli::{Cli, Cmd};
use crate::config::Config;
use crate::pipeline::{Pipeline, PipelineSettings, Services};
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration first so RUST_LOG from .env applies to the filter
    let config = Config::load(cli.config.as_deref())?;

    let filter = if cli.verbose {
        EnvFilter::new(format!("{}=debug", env!("CARGO_PKG_NAME")))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        })
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting screener v{}", env!("CARGO_PKG_VERSION"));

    match cli.cmd {
        Cmd::Screen { csv, jd, output } => screen(&config, &csv, &jd, output.as_deref()).await,
        Cmd::Serve { port } => serve(&config, port.unwrap_or(config.port)).await,
    }
}

fn build_pipeline(config: &Config) -> Result<Pipeline> {
    // Missing ANTHROPIC_API_KEY stops here, before any candidate is touched
    let services = Services::from_config(config)?;
    info!(
        "Services ready (model: {}, scorer: {}, search: {})",
        config.model,
        services.scorer.backend(),
        if services.lookup.is_enabled() { "tavily" } else { "disabled" }
    );
    Ok(Pipeline::new(Arc::new(services), PipelineSettings::from_config(config)))
}

async fn screen(config: &Config, csv: &Path, jd: &Path, output: Option<&Path>) -> Result<()> {
    let pipeline = build_pipeline(config)?;

    let candidates = ingest::load_candidates(csv, &config.column_mapping)
        .with_context(|| format!("Failed to load candidates from {}", csv.display()))?;
    if candidates.is_empty() {
        warn!("No candidates found in {}", csv.display());
        return Ok(());
    }
    info!("Loaded {} candidates from {}", candidates.len(), csv.display());

    let job = ingest::load_job_description(jd)
        .with_context(|| format!("Failed to load job description from {}", jd.display()))?;
    let job = pipeline.services().prepare_job(job).await;
    info!("Screening for role: {}", job.display_title());

    let run = pipeline.run(candidates, job.clone()).await;

    let content = report::render_report(&run, &job, &jd.display().to_string(), config.report.top_n);
    let path = match output {
        Some(path) => path.to_path_buf(),
        None => report::default_report_path(&config.report.output_dir, run.started_at),
    };
    let saved = report::save_report(&content, &path)?;

    let summary = run.summary();
    info!(
        "Report saved to {} ({} scored, {} flagged, {} errored)",
        saved.display(),
        summary.scored,
        summary.flagged,
        summary.errored
    );
    Ok(())
}

async fn serve(config: &Config, port: u16) -> Result<()> {
    let state = AppState {
        pipeline: build_pipeline(config)?,
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{port}").parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
