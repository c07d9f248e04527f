//! Shared data models for the highlight renderer.
//!
//! This crate provides Serde-serializable types for:
//! - Transcript utterances, speakers and source segments
//! - Declarative render options (aspect ratio, captions, speaker overlay)
//! - Encoding configuration
//! - Render requests and per-part reports

pub mod encoding;
pub mod options;
pub mod request;
pub mod segment;
pub mod timestamp;
pub mod utterance;

// Re-export common types
pub use encoding::EncodingConfig;
pub use options::{
    AspectRatio, CaptionStyle, HexColor, MarginType, MediaType, OptionsParseError,
    RenderOptions, SocialOptions, SpeakerOverlayMode,
};
pub use request::{
    artifact_stem, FailureKind, PartFailure, PartOutcome, PartRequest, RenderReport, RenderRequest,
    RequestError,
};
pub use segment::{RenderedPart, Segment};
pub use utterance::{NormalizedUtterance, Speaker, TimeSpan, Utterance};
