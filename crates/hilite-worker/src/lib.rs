//! Highlight render orchestrator.
//!
//! This crate provides:
//! - Source download and probing
//! - Per-part planning, rendering and upload
//! - Monotonic progress reporting
//! - Optional playback provisioning for rendered video
//! - Per-part failure reports

pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod pipeline;
pub mod playback;
pub mod progress;
pub mod source;

pub use config::RenderConfig;
pub use error::{WorkerError, WorkerResult};
pub use logging::RenderLogger;
pub use pipeline::RenderPipeline;
pub use playback::{HttpPlaybackProvisioner, PlaybackConfig, PlaybackProvisioner};
pub use progress::ProgressTracker;
pub use source::{HttpSourceFetcher, SourceFetcher};
