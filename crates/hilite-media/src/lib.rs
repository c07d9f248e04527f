//! FFmpeg CLI wrapper and filter-graph compiler for highlight rendering.
//!
//! This crate provides:
//! - Type-safe FFmpeg command building and execution
//! - Progress parsing from `-progress pipe:2`
//! - Timeline normalization of transcript utterances
//! - Text layout (escaping, wrapping, font fitting)
//! - Resolution presets
//! - Typed filter graphs for portrait reformat, speaker overlays and captions
//! - Render plans combining extraction, filters and encoding

pub mod command;
pub mod error;
pub mod filters;
pub mod plan;
pub mod presets;
pub mod probe;
pub mod progress;
pub mod renderer;
pub mod text_layout;
pub mod timeline;

pub use command::{check_ffmpeg, check_ffprobe, FfmpegCommand, FfmpegRunner};
pub use error::{MediaError, MediaResult};
pub use filters::{compose_filters, ComposedGraph, FilterFragment, FontSet, Stage};
pub use plan::{ExtractionPlan, RenderPlan, StreamLayout};
pub use presets::{get_preset_config, Dimensions, PresetConfig, FALLBACK_DIMENSIONS};
pub use probe::{probe_media, FfprobeProber, MediaInfo, MediaProber};
pub use progress::{FfmpegProgress, ProgressCallback};
pub use renderer::{FfmpegRenderer, MediaRenderer};
pub use timeline::{
    merge_continuous_utterances, normalize_utterance_timestamps, normalize_within_segments,
    DEFAULT_GAP_THRESHOLD_SECS,
};
