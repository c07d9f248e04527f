//! Declarative render options.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Lower bound for the social foreground zoom.
pub const MIN_ZOOM_FACTOR: f64 = 0.6;
/// Upper bound for the social foreground zoom.
pub const MAX_ZOOM_FACTOR: f64 = 1.0;

/// Target aspect ratio of the rendered clip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
pub enum AspectRatio {
    /// Keep the source geometry
    #[default]
    #[serde(rename = "default")]
    Default,
    /// Portrait 9:16 for short-form social platforms
    #[serde(rename = "social-9x16")]
    Social9x16,
}

impl AspectRatio {
    pub fn as_str(&self) -> &'static str {
        match self {
            AspectRatio::Default => "default",
            AspectRatio::Social9x16 => "social-9x16",
        }
    }

    /// Whether the output frame is taller than wide.
    pub fn is_portrait(&self) -> bool {
        matches!(self, AspectRatio::Social9x16)
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for AspectRatio {
    type Err = OptionsParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "default" => Ok(AspectRatio::Default),
            "social-9x16" => Ok(AspectRatio::Social9x16),
            _ => Err(OptionsParseError::AspectRatio(s.to_string())),
        }
    }
}

/// How the area around the scaled source is filled in portrait output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum MarginType {
    /// Blurred, zoomed copy of the source
    #[default]
    Blur,
    /// Flat background colour
    Solid,
}

/// A colour in `#RRGGBB` form, validated on construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(try_from = "String", into = "String")]
pub struct HexColor(String);

impl HexColor {
    pub const BLACK: &'static str = "#000000";

    /// Six upper-case hex digits without prefix.
    pub fn digits(&self) -> &str {
        &self.0[1..]
    }

    /// Colour in FFmpeg's `0xRRGGBB` notation.
    pub fn to_ffmpeg(&self) -> String {
        format!("0x{}", self.digits())
    }
}

impl Default for HexColor {
    fn default() -> Self {
        Self(Self::BLACK.to_string())
    }
}

impl FromStr for HexColor {
    type Err = OptionsParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = trimmed
            .strip_prefix('#')
            .or_else(|| trimmed.strip_prefix("0x"))
            .unwrap_or(trimmed);
        if digits.len() == 6 && digits.chars().all(|c| c.is_ascii_hexdigit()) {
            Ok(Self(format!("#{}", digits.to_ascii_uppercase())))
        } else {
            Err(OptionsParseError::Color(s.to_string()))
        }
    }
}

impl TryFrom<String> for HexColor {
    type Error = OptionsParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<HexColor> for String {
    fn from(color: HexColor) -> Self {
        color.0
    }
}

impl fmt::Display for HexColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Options for the portrait reformat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SocialOptions {
    #[serde(default)]
    pub margin_type: MarginType,
    #[serde(default)]
    pub background_color: HexColor,
    /// Foreground scale; anything outside `[0.6, 1.0]` is clamped before use.
    #[serde(default = "default_zoom")]
    pub zoom_factor: f64,
}

fn default_zoom() -> f64 {
    MAX_ZOOM_FACTOR
}

impl Default for SocialOptions {
    fn default() -> Self {
        Self {
            margin_type: MarginType::Blur,
            background_color: HexColor::default(),
            zoom_factor: MAX_ZOOM_FACTOR,
        }
    }
}

impl SocialOptions {
    /// Zoom clamped to the supported band. NaN falls back to full size.
    pub fn effective_zoom(&self) -> f64 {
        if self.zoom_factor.is_nan() {
            return MAX_ZOOM_FACTOR;
        }
        self.zoom_factor.clamp(MIN_ZOOM_FACTOR, MAX_ZOOM_FACTOR)
    }
}

/// When the speaker lower-third is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum SpeakerOverlayMode {
    /// For every utterance
    #[default]
    Always,
    /// Only when the speaker differs from the previous utterance
    OnSpeakerChange,
}

/// Caption typography preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum CaptionStyle {
    #[default]
    Classic,
    Bold,
}

impl CaptionStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            CaptionStyle::Classic => "classic",
            CaptionStyle::Bold => "bold",
        }
    }
}

impl fmt::Display for CaptionStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Kind of artifact produced per part.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum MediaType {
    #[default]
    Video,
    Audio,
}

impl MediaType {
    /// Container extension for rendered parts.
    pub fn extension(&self) -> &'static str {
        match self {
            MediaType::Video => "mp4",
            MediaType::Audio => "m4a",
        }
    }
}

/// Everything that shapes the visual output of a render.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RenderOptions {
    #[serde(default)]
    pub aspect_ratio: AspectRatio,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub social_options: Option<SocialOptions>,
    #[serde(default)]
    pub include_captions: bool,
    #[serde(default)]
    pub include_speaker_overlay: bool,
    #[serde(default)]
    pub speaker_overlay_mode: SpeakerOverlayMode,
    #[serde(default)]
    pub caption_style: CaptionStyle,
    #[serde(default)]
    pub media_type: MediaType,
}

impl RenderOptions {
    /// Social options to use for a portrait render, defaulted when omitted.
    pub fn social(&self) -> Option<SocialOptions> {
        match self.aspect_ratio {
            AspectRatio::Social9x16 => Some(self.social_options.clone().unwrap_or_default()),
            AspectRatio::Default => None,
        }
    }

    /// Whether any visual stage applies.
    pub fn needs_video_filters(&self) -> bool {
        self.media_type == MediaType::Video
            && (self.aspect_ratio.is_portrait()
                || self.include_captions
                || self.include_speaker_overlay)
    }

    /// Reject combinations that cannot be rendered.
    pub fn validate(&self) -> Result<(), OptionsParseError> {
        if self.media_type == MediaType::Audio && self.aspect_ratio.is_portrait() {
            return Err(OptionsParseError::Conflict(
                "audio renders cannot use a social aspect ratio".to_string(),
            ));
        }
        if let Some(social) = &self.social_options {
            if !social.zoom_factor.is_finite() {
                return Err(OptionsParseError::Conflict(
                    "zoomFactor must be a finite number".to_string(),
                ));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum OptionsParseError {
    #[error("Unknown aspect ratio: {0}")]
    AspectRatio(String),
    #[error("Invalid colour '{0}', expected #RRGGBB")]
    Color(String),
    #[error("Invalid render options: {0}")]
    Conflict(String),
}
