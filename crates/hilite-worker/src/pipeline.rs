//! Render orchestration.
//!
//! One call renders every part of a request in order: the source is fetched
//! and probed once, then each part is planned, rendered, uploaded and
//! (for video) registered with the playback host. A failing part is
//! recorded in the report and the next part still runs.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tokio::sync::mpsc;
use tracing::{debug, warn, Instrument};

use hilite_media::filters::compose_filters;
use hilite_media::{
    get_preset_config, merge_continuous_utterances, normalize_within_segments, ExtractionPlan,
    FfmpegProgress, FfmpegRenderer, FfprobeProber, MediaProber, MediaRenderer, ProgressCallback,
    RenderPlan, StreamLayout, FALLBACK_DIMENSIONS,
};
use hilite_models::{
    artifact_stem, MediaType, PartFailure, PartOutcome, RenderReport, RenderRequest, RenderedPart,
};
use hilite_storage::{upload_single, Uploader};

use crate::config::RenderConfig;
use crate::error::{WorkerError, WorkerResult};
use crate::logging::RenderLogger;
use crate::metrics;
use crate::playback::PlaybackProvisioner;
use crate::progress::{stages, ProgressTracker};
use crate::source::{HttpSourceFetcher, SourceFetcher};

/// Share of a part's progress spent in the renderer.
const RENDER_SHARE: f64 = 0.85;
/// Part progress once the upload finishes.
const UPLOADED_SHARE: f64 = 0.95;

/// What the probe established about the source.
#[derive(Debug, Clone)]
struct SourceFacts {
    path: PathBuf,
    resolution: String,
    streams: StreamLayout,
}

/// Renders highlight requests with pluggable collaborators.
#[derive(Clone)]
pub struct RenderPipeline {
    config: RenderConfig,
    fetcher: Arc<dyn SourceFetcher>,
    prober: Arc<dyn MediaProber>,
    renderer: Arc<dyn MediaRenderer>,
    uploader: Arc<dyn Uploader>,
    playback: Option<Arc<dyn PlaybackProvisioner>>,
}

impl RenderPipeline {
    /// Pipeline using FFmpeg, FFprobe and HTTP source fetching.
    pub fn new(config: RenderConfig, uploader: Arc<dyn Uploader>) -> Self {
        let renderer = FfmpegRenderer::with_timeout(config.renderer_timeout_secs());
        Self {
            config,
            fetcher: Arc::new(HttpSourceFetcher::default()),
            prober: Arc::new(FfprobeProber::default()),
            renderer: Arc::new(renderer),
            uploader,
            playback: None,
        }
    }

    pub fn with_fetcher(mut self, fetcher: Arc<dyn SourceFetcher>) -> Self {
        self.fetcher = fetcher;
        self
    }

    pub fn with_prober(mut self, prober: Arc<dyn MediaProber>) -> Self {
        self.prober = prober;
        self
    }

    pub fn with_renderer(mut self, renderer: Arc<dyn MediaRenderer>) -> Self {
        self.renderer = renderer;
        self
    }

    pub fn with_playback(mut self, playback: Arc<dyn PlaybackProvisioner>) -> Self {
        self.playback = Some(playback);
        self
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Render every part of `request`.
    ///
    /// Validation and source download failures abort the request. Probe
    /// failures fall back to 1280x720. Part failures are reported per part.
    pub async fn render<F>(&self, request: &RenderRequest, on_progress: F) -> WorkerResult<RenderReport>
    where
        F: FnMut(&str, f64) + Send,
    {
        let logger = RenderLogger::new(&request.request_id, "render_request");
        let span = logger.create_span();
        self.render_request(request, on_progress, logger)
            .instrument(span)
            .await
    }

    /// Render `request` unless `shutdown` resolves first.
    ///
    /// On shutdown the in-flight work is dropped: the renderer process is
    /// killed and the request's work directory removed. Returns `None` when
    /// interrupted.
    pub async fn render_until<F, S>(
        &self,
        request: &RenderRequest,
        on_progress: F,
        shutdown: S,
    ) -> WorkerResult<Option<RenderReport>>
    where
        F: FnMut(&str, f64) + Send,
        S: Future<Output = ()>,
    {
        tokio::select! {
            result = self.render(request, on_progress) => result.map(Some),
            _ = shutdown => Ok(None),
        }
    }

    async fn render_request<F>(
        &self,
        request: &RenderRequest,
        on_progress: F,
        logger: RenderLogger,
    ) -> WorkerResult<RenderReport>
    where
        F: FnMut(&str, f64) + Send,
    {
        request.check()?;

        let mut tracker = ProgressTracker::new(on_progress, request.parts.len());
        tracker.start();
        logger.log_start(&format!("{} part(s) from {}", request.parts.len(), request.source));

        tokio::fs::create_dir_all(&self.config.work_dir).await?;
        let work = tempfile::Builder::new()
            .prefix("hilite-")
            .tempdir_in(&self.config.work_dir)?;

        let source = self.prepare_source(request, work.path(), &logger, &mut tracker).await?;
        let namespace = request
            .namespace
            .clone()
            .unwrap_or_else(|| self.config.default_namespace.clone());

        let mut outcomes = Vec::with_capacity(request.parts.len());
        for index in 0..request.parts.len() {
            let part_logger = logger.for_operation("render_part");
            let id = request.part_id(index);

            match self
                .render_part(request, index, &source, work.path(), &namespace, &mut tracker)
                .await
            {
                Ok(part) => {
                    part_logger.log_progress(&format!("part {} published at {}", part.id, part.url));
                    outcomes.push(PartOutcome::Rendered(part));
                }
                Err(e) => {
                    let kind = e.kind();
                    part_logger.log_error(&format!("part {} failed: {}", id, e));
                    metrics::record_part_failed(kind.as_str());
                    outcomes.push(PartOutcome::Failed(PartFailure {
                        id,
                        kind,
                        message: e.to_string(),
                        diagnostics: e.diagnostics(),
                    }));
                    tracker.part(stages::RENDER, index, 1.0);
                }
            }
        }

        tracker.finish();

        let report = RenderReport {
            request_id: request.request_id.clone(),
            parts: outcomes,
            completed_at: Utc::now(),
        };
        logger.log_completion(&format!(
            "{} rendered, {} failed",
            report.rendered_count(),
            report.failed_count()
        ));
        Ok(report)
    }

    async fn prepare_source<F>(
        &self,
        request: &RenderRequest,
        work_dir: &Path,
        logger: &RenderLogger,
        tracker: &mut ProgressTracker<F>,
    ) -> WorkerResult<SourceFacts>
    where
        F: FnMut(&str, f64) + Send,
    {
        tracker.report(stages::DOWNLOAD, 0.0);
        let started = Instant::now();
        let path = self
            .fetcher
            .fetch(&request.source, work_dir)
            .await
            .map_err(|e| match e {
                WorkerError::DownloadFailed(_) => e,
                other => WorkerError::download_failed(other.to_string()),
            })?;
        metrics::record_download(started.elapsed().as_secs_f64());

        let facts = match self.prober.probe(&path).await {
            Ok(info) => {
                let resolution = info.resolution().unwrap_or_else(|| {
                    if info.has_video {
                        logger.log_warning("source video has no frame size, assuming 1280x720");
                    }
                    FALLBACK_DIMENSIONS.resolution()
                });
                SourceFacts {
                    path,
                    resolution,
                    streams: StreamLayout {
                        has_video: info.has_video,
                        has_audio: info.has_audio,
                    },
                }
            }
            Err(e) => {
                logger.log_warning(&format!("probe failed ({}), assuming 1280x720", e));
                metrics::record_probe_fallback();
                SourceFacts {
                    path,
                    resolution: FALLBACK_DIMENSIONS.resolution(),
                    streams: StreamLayout::default(),
                }
            }
        };

        debug!(resolution = %facts.resolution, streams = ?facts.streams, "Source ready");
        tracker.source_ready();
        Ok(facts)
    }

    async fn render_part<F>(
        &self,
        request: &RenderRequest,
        index: usize,
        source: &SourceFacts,
        work_dir: &Path,
        namespace: &str,
        tracker: &mut ProgressTracker<F>,
    ) -> WorkerResult<RenderedPart>
    where
        F: FnMut(&str, f64) + Send,
    {
        let part = request
            .parts
            .get(index)
            .ok_or_else(|| WorkerError::validation(format!("no part at index {}", index)))?;
        let id = request.part_id(index);
        let options = &request.options;
        tracker.part(stages::RENDER, index, 0.0);

        let segments = merge_continuous_utterances(&part.segments, self.config.gap_threshold_secs);
        let utterances = normalize_within_segments(&request.utterances, &segments);
        let preset = get_preset_config(&source.resolution, options.aspect_ratio, options.caption_style);
        let graph = compose_filters(options, &preset, &utterances, &self.config.fonts);

        let output = work_dir.join(format!(
            "{}.{}",
            artifact_stem(&id),
            options.media_type.extension()
        ));
        let plan = RenderPlan::compile(
            &source.path,
            &output,
            ExtractionPlan::new(segments)?,
            source.streams,
            &graph,
            options.media_type,
            &self.config.encoding,
        )?;

        if self.config.capture_payloads {
            self.capture_plan(&request.request_id, &id, &plan).await;
        }

        let started = Instant::now();
        self.run_renderer(&plan, index, tracker).await?;
        let render_secs = started.elapsed().as_secs_f64();

        let started = Instant::now();
        let url = upload_single(self.uploader.as_ref(), &plan.output, namespace).await?;
        metrics::record_upload(started.elapsed().as_secs_f64());
        release_artifact(&plan.output).await;
        tracker.part(stages::UPLOAD, index, UPLOADED_SHARE);

        let playback_id = match (&self.playback, options.media_type) {
            (Some(playback), MediaType::Video) => match playback.provision(&url, &id).await {
                Ok(playback_id) => Some(playback_id),
                Err(e) => {
                    warn!(part_id = %id, error = %e, "Playback provisioning failed, continuing without it");
                    None
                }
            },
            _ => None,
        };

        metrics::record_part_rendered(options.media_type.extension(), render_secs);
        tracker.part(stages::UPLOAD, index, 1.0);

        let (start_timestamp, end_timestamp) = plan.extraction.span();
        Ok(RenderedPart {
            id,
            url,
            duration: plan.extraction.total_duration(),
            start_timestamp,
            end_timestamp,
            playback_id,
            rendered_at: Utc::now(),
        })
    }

    /// Run the renderer, forwarding its progress through a channel so the
    /// tracker is only touched from this task.
    async fn run_renderer<F>(
        &self,
        plan: &RenderPlan,
        index: usize,
        tracker: &mut ProgressTracker<F>,
    ) -> WorkerResult<()>
    where
        F: FnMut(&str, f64) + Send,
    {
        let (tx, mut rx) = mpsc::unbounded_channel::<f64>();
        let total_ms = plan.expected_duration_ms();
        let callback: ProgressCallback = Box::new(move |progress: FfmpegProgress| {
            let _ = tx.send(progress.fraction(total_ms));
        });

        let render = self.renderer.render(plan, callback);
        tokio::pin!(render);

        let result = loop {
            tokio::select! {
                result = &mut render => break result,
                Some(fraction) = rx.recv() => {
                    tracker.part(stages::RENDER, index, fraction * RENDER_SHARE);
                }
            }
        };

        while let Ok(fraction) = rx.try_recv() {
            tracker.part(stages::RENDER, index, fraction * RENDER_SHARE);
        }

        result?;
        Ok(())
    }

    async fn capture_plan(&self, request_id: &str, part_id: &str, plan: &RenderPlan) {
        let dir = self.config.capture_dir();
        let path = dir.join(format!(
            "{}-{}.json",
            artifact_stem(request_id),
            artifact_stem(part_id)
        ));

        let result = async {
            tokio::fs::create_dir_all(&dir).await?;
            let json = serde_json::to_vec_pretty(plan)?;
            tokio::fs::write(&path, json).await?;
            Ok::<_, WorkerError>(())
        }
        .await;

        match result {
            Ok(()) => debug!(path = %path.display(), "Captured render plan"),
            Err(e) => warn!(path = %path.display(), error = %e, "Failed to capture render plan"),
        }
    }
}

/// Drop the local render once the uploader has it. Uploaders that move the
/// file leave nothing behind.
async fn release_artifact(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => debug!(path = %path.display(), "Removed uploaded render"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!(path = %path.display(), error = %e, "Failed to remove uploaded render"),
    }
}
