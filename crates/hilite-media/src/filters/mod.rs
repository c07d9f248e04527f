//! Filter-graph composition.
//!
//! Each visual stage has its own composer returning an optional
//! [`FilterFragment`]; [`compose_filters`] slots them into a
//! [`ComposedGraph`] in the fixed order aspect, speaker overlay, captions.

pub mod captions;
pub mod graph;
pub mod social;
pub mod speaker;

use serde::{Deserialize, Serialize};

use hilite_models::{NormalizedUtterance, RenderOptions};

use crate::presets::PresetConfig;

pub use captions::generate_caption_filters;
pub use graph::{ComposedGraph, Filter, FilterChain, FilterFragment, FilterValue, Pad, Stage};
pub use social::generate_social_filter;
pub use speaker::{
    calculate_speaker_display_segments, format_speaker_info, generate_speaker_overlay_filter,
    wrap_speaker_text, SpeakerDisplaySegment, SpeakerInfo,
};

/// Font files for drawtext; FFmpeg's default font is used when unset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FontSet {
    pub regular: Option<String>,
    pub bold: Option<String>,
}

impl FontSet {
    pub(crate) fn regular_value(&self) -> Option<FilterValue> {
        self.regular.clone().map(FilterValue::Path)
    }

    pub(crate) fn bold_value(&self) -> Option<FilterValue> {
        self.bold
            .clone()
            .or_else(|| self.regular.clone())
            .map(FilterValue::Path)
    }
}

/// Timeline `enable` expression for `[start, end)` in clip seconds.
pub fn enable_between(start: f64, end: f64) -> FilterValue {
    FilterValue::Quoted(format!("gte(t,{:.3})*lt(t,{:.3})", start, end))
}

/// Build every visual stage requested by `options`.
///
/// Audio renders never get a graph. `utterances` must already be in clip
/// time; the preset must describe the output frame.
pub fn compose_filters(
    options: &RenderOptions,
    preset: &PresetConfig,
    utterances: &[NormalizedUtterance],
    fonts: &FontSet,
) -> ComposedGraph {
    if !options.needs_video_filters() {
        return ComposedGraph::default();
    }

    let aspect = options
        .social()
        .map(|social| generate_social_filter(&social, preset.dimensions));

    let overlay = options
        .include_speaker_overlay
        .then(|| {
            generate_speaker_overlay_filter(utterances, options.speaker_overlay_mode, preset, fonts)
        })
        .flatten();

    let captions = options
        .include_captions
        .then(|| generate_caption_filters(utterances, preset, options.caption_style, fonts))
        .flatten();

    ComposedGraph {
        aspect,
        overlay,
        captions,
    }
}
