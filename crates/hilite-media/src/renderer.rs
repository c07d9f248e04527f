//! Renderer abstraction over the FFmpeg process.

use async_trait::async_trait;
use tracing::{debug, info};

use crate::command::FfmpegRunner;
use crate::error::MediaResult;
use crate::plan::RenderPlan;
use crate::progress::ProgressCallback;

/// Executes render plans.
#[async_trait]
pub trait MediaRenderer: Send + Sync {
    /// Run `plan` to completion, reporting progress as it goes.
    async fn render(&self, plan: &RenderPlan, progress: ProgressCallback) -> MediaResult<()>;
}

/// Renders by spawning `ffmpeg`.
#[derive(Debug, Clone, Default)]
pub struct FfmpegRenderer {
    runner: FfmpegRunner,
}

impl FfmpegRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Kill the process after `timeout_secs`; `None` waits indefinitely.
    pub fn with_timeout(timeout_secs: Option<u64>) -> Self {
        let runner = match timeout_secs {
            Some(secs) => FfmpegRunner::new().with_timeout(secs),
            None => FfmpegRunner::new(),
        };
        Self { runner }
    }

    pub fn with_runner(runner: FfmpegRunner) -> Self {
        Self { runner }
    }
}

#[async_trait]
impl MediaRenderer for FfmpegRenderer {
    async fn render(&self, plan: &RenderPlan, progress: ProgressCallback) -> MediaResult<()> {
        if let Some(parent) = plan.output.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let cmd = plan.to_command();
        debug!(
            stages = ?plan.stages,
            segments = plan.extraction.segments.len(),
            "Starting render"
        );

        self.runner.run_with_progress(&cmd, progress).await?;

        info!(output = %plan.output.display(), "Render complete");
        Ok(())
    }
}
