//! Invitation video worker binary.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use invite_media::{check_ffmpeg, check_ffprobe, FfmpegTranscoder};
use invite_models::{GenerationJob, GenerationRequest, JobStatus};
use invite_style::{HttpStyleAdapter, StyleAdapter, StyleClientConfig};
use invite_worker::{metrics, InMemoryCatalog, JobManager, TemplateCatalog, WorkerConfig};

#[derive(Parser)]
#[command(name = "invite-worker", version, about = "Wedding invitation video generator")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate a video from a JSON request and print the final job status
    Generate {
        /// Path to a generation request JSON file
        #[arg(long, short)]
        request: PathBuf,
        /// Status poll interval in milliseconds
        #[arg(long, default_value_t = 500)]
        poll_ms: u64,
    },
    /// List available templates
    Templates {
        #[arg(long)]
        category: Option<String>,
    },
    /// Print the JSON Schema of the request and job status types
    Schema,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing()?;

    let cli = Cli::parse();
    let config = WorkerConfig::from_env();
    let catalog = load_catalog(&config)?;

    match cli.command {
        Command::Templates { category } => {
            let templates = match category {
                Some(category) => catalog.by_category(&category),
                None => catalog.list(),
            };
            println!("{}", serde_json::to_string_pretty(&templates)?);
        }
        Command::Schema => {
            let schema = serde_json::json!({
                "request": schemars::schema_for!(GenerationRequest),
                "job": schemars::schema_for!(GenerationJob),
            });
            println!("{}", serde_json::to_string_pretty(&schema)?);
        }
        Command::Generate { request, poll_ms } => {
            generate(config, catalog, request, Duration::from_millis(poll_ms.max(50))).await?;
        }
    }

    Ok(())
}

fn init_tracing() -> anyhow::Result<()> {
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::from_default_env().add_directive("invite=info".parse()?);

    // Logs go to stderr so stdout carries only JSON output
    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_ansi(true)
                    .with_target(true)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }
    Ok(())
}

fn load_catalog(config: &WorkerConfig) -> anyhow::Result<Arc<dyn TemplateCatalog>> {
    let catalog = match &config.templates_path {
        Some(path) => InMemoryCatalog::from_path(path)
            .with_context(|| format!("loading templates from {}", path.display()))?,
        None => InMemoryCatalog::builtin().context("loading built-in templates")?,
    };
    Ok(Arc::new(catalog))
}

async fn generate(
    config: WorkerConfig,
    catalog: Arc<dyn TemplateCatalog>,
    request_path: PathBuf,
    poll: Duration,
) -> anyhow::Result<()> {
    check_ffmpeg().context("ffmpeg is required for generation")?;
    check_ffprobe().context("ffprobe is required for generation")?;

    if let Ok(addr) = std::env::var("METRICS_ADDR") {
        let addr = addr
            .parse::<std::net::SocketAddr>()
            .with_context(|| format!("invalid METRICS_ADDR '{}'", addr))?;
        metrics::init_metrics(addr)?;
        info!("Serving metrics on {}", addr);
    }

    let body = tokio::fs::read_to_string(&request_path)
        .await
        .with_context(|| format!("reading {}", request_path.display()))?;
    let request: GenerationRequest = serde_json::from_str(&body).context("parsing request")?;

    let style_adapter: Option<Arc<dyn StyleAdapter>> = match StyleClientConfig::from_env() {
        Some(style_config) => {
            info!("Style service: {}", style_config.base_url);
            let adapter = HttpStyleAdapter::new(style_config)?;
            if !adapter.health_check().await? {
                warn!("Style service is not healthy, styling may fall back to the unstyled video");
            }
            Some(Arc::new(adapter))
        }
        None => {
            warn!("STYLE_SERVICE_URL not set, non-default styles will be skipped");
            None
        }
    };

    let transcoder = Arc::new(FfmpegTranscoder::new(config.render_profile.clone()));
    info!("Worker config: {:?}", config);
    let manager = JobManager::new(config, catalog, transcoder, style_adapter);

    let job_id = manager.submit(request).await?;
    info!("Submitted job {}", job_id);

    let Some(job) = manager.wait_for(&job_id, poll).await else {
        bail!("job {} disappeared", job_id);
    };
    println!("{}", serde_json::to_string_pretty(&job)?);

    if job.status == JobStatus::Failed {
        bail!(job.error.unwrap_or_else(|| "generation failed".to_string()));
    }
    Ok(())
}
