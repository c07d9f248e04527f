//! Resolution presets for caption and overlay geometry.

use serde::{Deserialize, Serialize};
use std::fmt;

use hilite_models::{AspectRatio, CaptionStyle};

/// Frame size in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Same frame rotated a quarter turn.
    pub fn swapped(self) -> Self {
        Self {
            width: self.height,
            height: self.width,
        }
    }

    /// Parse a `WxH` string.
    pub fn parse(resolution: &str) -> Option<Self> {
        let (w, h) = resolution.trim().to_ascii_lowercase().split_once('x').map(|(w, h)| {
            (w.trim().parse::<u32>(), h.trim().parse::<u32>())
        })?;
        match (w, h) {
            (Ok(width), Ok(height)) if width > 0 && height > 0 => Some(Self { width, height }),
            _ => None,
        }
    }

    pub fn resolution(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Caption font bounds and placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptionLayout {
    pub start_font: u32,
    pub max_font: u32,
    pub min_font: u32,
    pub max_lines: usize,
    /// Distance between the caption box and the bottom edge
    pub bottom_margin: u32,
    /// Horizontal margin on each side
    pub side_margin: u32,
    pub box_padding: u32,
}

impl CaptionLayout {
    /// Width available to caption text in a frame of `frame_width` pixels.
    pub fn available_width(&self, frame_width: u32) -> u32 {
        frame_width.saturating_sub(2 * self.side_margin).max(1)
    }
}

/// Speaker lower-third geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeakerLayout {
    pub name_font: u32,
    pub detail_font: u32,
    pub margin_x: u32,
    pub margin_y: u32,
    pub padding: u32,
    pub line_spacing: u32,
    /// Width of the party colour bar
    pub accent_width: u32,
}

/// Everything the composers need to lay out one frame size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresetConfig {
    /// Output frame, already rotated for portrait targets
    pub dimensions: Dimensions,
    pub caption: CaptionLayout,
    pub speaker: SpeakerLayout,
}

struct PresetEntry {
    dimensions: Dimensions,
    classic: CaptionLayout,
    bold: CaptionLayout,
    speaker: SpeakerLayout,
}

const fn caption(
    start_font: u32,
    max_font: u32,
    min_font: u32,
    bottom_margin: u32,
    side_margin: u32,
    box_padding: u32,
) -> CaptionLayout {
    CaptionLayout {
        start_font,
        max_font,
        min_font,
        max_lines: 2,
        bottom_margin,
        side_margin,
        box_padding,
    }
}

const fn speaker(name_font: u32, detail_font: u32, margin: u32, padding: u32, accent_width: u32) -> SpeakerLayout {
    SpeakerLayout {
        name_font,
        detail_font,
        margin_x: margin,
        margin_y: margin,
        padding,
        line_spacing: padding / 2,
        accent_width,
    }
}

/// Known presets; the first entry is the fallback.
const PRESETS: &[PresetEntry] = &[
    PresetEntry {
        dimensions: Dimensions::new(1280, 720),
        classic: caption(40, 48, 24, 48, 64, 12),
        bold: caption(44, 52, 26, 48, 64, 14),
        speaker: speaker(30, 22, 40, 14, 8),
    },
    PresetEntry {
        dimensions: Dimensions::new(1920, 1080),
        classic: caption(60, 72, 36, 72, 96, 18),
        bold: caption(66, 78, 39, 72, 96, 21),
        speaker: speaker(45, 33, 60, 21, 12),
    },
    PresetEntry {
        dimensions: Dimensions::new(854, 480),
        classic: caption(27, 32, 16, 32, 43, 8),
        bold: caption(29, 35, 17, 32, 43, 9),
        speaker: speaker(20, 15, 27, 9, 5),
    },
    PresetEntry {
        dimensions: Dimensions::new(640, 360),
        classic: caption(20, 24, 12, 24, 32, 6),
        bold: caption(22, 26, 13, 24, 32, 7),
        speaker: speaker(15, 11, 20, 7, 4),
    },
    PresetEntry {
        dimensions: Dimensions::new(3840, 2160),
        classic: caption(120, 144, 72, 144, 192, 36),
        bold: caption(132, 156, 78, 144, 192, 42),
        speaker: speaker(90, 66, 120, 42, 24),
    },
];

/// Resolution used when the source cannot be probed.
pub const FALLBACK_DIMENSIONS: Dimensions = Dimensions::new(1280, 720);

/// Resolve layout for a source resolution and output options.
///
/// Unknown resolutions use the first preset. Portrait targets get the same
/// fonts on a rotated frame.
pub fn get_preset_config(resolution: &str, aspect_ratio: AspectRatio, style: CaptionStyle) -> PresetConfig {
    let wanted = Dimensions::parse(resolution);
    let entry = PRESETS
        .iter()
        .find(|p| Some(p.dimensions) == wanted)
        .unwrap_or(&PRESETS[0]);

    let dimensions = if aspect_ratio.is_portrait() {
        entry.dimensions.swapped()
    } else {
        entry.dimensions
    };

    let caption = match style {
        CaptionStyle::Classic => entry.classic,
        CaptionStyle::Bold => entry.bold,
    };

    PresetConfig {
        dimensions,
        caption,
        speaker: entry.speaker,
    }
}

/// Resolutions with a dedicated preset, in lookup order.
pub fn known_resolutions() -> impl Iterator<Item = Dimensions> {
    PRESETS.iter().map(|p| p.dimensions)
}
