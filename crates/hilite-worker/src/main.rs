//! Highlight render CLI.
//!
//! Reads a render request as JSON from the file named on the command line
//! (or stdin when omitted or `-`) and prints the render report to stdout.

use std::sync::Arc;

use anyhow::Context;
use tokio::io::AsyncReadExt;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use hilite_models::RenderRequest;
use hilite_storage::{LocalUploader, R2Config, R2Uploader, Uploader};
use hilite_worker::{HttpPlaybackProvisioner, PlaybackConfig, RenderConfig, RenderPipeline};

async fn read_request(path: Option<&str>) -> anyhow::Result<RenderRequest> {
    let raw = match path {
        Some(path) if path != "-" => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read request file {}", path))?,
        _ => {
            let mut buf = String::new();
            tokio::io::stdin()
                .read_to_string(&mut buf)
                .await
                .context("failed to read request from stdin")?;
            buf
        }
    };
    serde_json::from_str(&raw).context("request is not a valid render request")
}

fn build_uploader(config: &RenderConfig) -> anyhow::Result<Arc<dyn Uploader>> {
    if R2Config::is_configured() {
        let r2 = R2Config::from_env()?;
        info!(bucket = %r2.bucket_name, "Uploading to R2");
        return Ok(Arc::new(R2Uploader::from_config(&r2)?));
    }
    info!(dir = %config.output_dir.display(), "R2 not configured, keeping renders locally");
    Ok(Arc::new(LocalUploader::new(&config.output_dir)))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Install rustls crypto provider (required for TLS/HTTPS)
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        anyhow::bail!("failed to install rustls crypto provider");
    }

    dotenvy::dotenv().ok();

    // Colored output for dev, JSON for production
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::from_default_env().add_directive("hilite=info".parse()?);

    // Logs go to stderr; stdout carries the report
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
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }

    info!("Starting hilite-worker");

    let config = RenderConfig::from_env();
    info!("Render config: {:?}", config);

    if let Err(e) = hilite_media::check_ffmpeg() {
        warn!("{}", e);
    }

    let path = std::env::args().nth(1);
    let request = read_request(path.as_deref()).await?;

    let mut pipeline = RenderPipeline::new(config.clone(), build_uploader(&config)?);
    if let Some(playback) = PlaybackConfig::from_env()? {
        pipeline = pipeline.with_playback(Arc::new(HttpPlaybackProvisioner::new(playback)?));
    }

    let on_progress = |stage: &str, percent: f64| {
        info!(stage, progress = %format!("{:.1}", percent), "Progress");
    };

    let shutdown = async {
        if tokio::signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
    };

    // Dropping the in-flight render removes its work directory
    let Some(report) = pipeline.render_until(&request, on_progress, shutdown).await? else {
        warn!("Received shutdown signal, abandoned request");
        anyhow::bail!("interrupted before request {} finished", request.request_id);
    };

    println!("{}", serde_json::to_string_pretty(&report)?);

    if let Some(failure) = report.first_failure() {
        error!(
            failed = report.failed_count(),
            "First failure in part {}: {}", failure.id, failure.message
        );
        std::process::exit(2);
    }

    info!("Render complete");
    Ok(())
}
