//! Render configuration.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use hilite_media::{FontSet, DEFAULT_GAP_THRESHOLD_SECS};
use hilite_models::EncodingConfig;

/// Orchestrator configuration.
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Root for per-request temporary directories
    pub work_dir: PathBuf,
    /// Maximum silence bridged when merging a part's segments
    pub gap_threshold_secs: f64,
    /// Kill the renderer after this long; `None` waits for it
    pub renderer_timeout: Option<Duration>,
    /// Write each render plan as JSON before invoking the renderer
    pub capture_payloads: bool,
    /// Where captured plans go; defaults to `<work_dir>/captures`
    pub capture_dir: Option<PathBuf>,
    /// Font files for captions and overlays
    pub fonts: FontSet,
    /// Upload namespace when a request does not name one
    pub default_namespace: String,
    /// Destination for the local uploader
    pub output_dir: PathBuf,
    pub encoding: EncodingConfig,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            work_dir: std::env::temp_dir().join("hilite"),
            gap_threshold_secs: DEFAULT_GAP_THRESHOLD_SECS,
            renderer_timeout: None,
            capture_payloads: false,
            capture_dir: None,
            fonts: FontSet::default(),
            default_namespace: "highlights".to_string(),
            output_dir: PathBuf::from("rendered"),
            encoding: EncodingConfig::default(),
        }
    }
}

fn env_parse<T: FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|s| s.trim().parse().ok())
}

fn env_string(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.trim().is_empty())
}

/// Accepts `1`, `true`, `yes` and `on`, case-insensitively.
pub(crate) fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

impl RenderConfig {
    /// Create config from `HILITE_*` environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let mut encoding = defaults.encoding.clone();
        if std::env::var("HILITE_USE_NVENC").map(|v| parse_flag(&v)).unwrap_or(false) {
            encoding = encoding.with_nvenc();
        }
        if let Some(codec) = env_string("HILITE_VIDEO_CODEC") {
            encoding.codec = codec;
        }
        if let Some(preset) = env_string("HILITE_ENCODE_PRESET") {
            encoding.preset = preset;
        }
        if let Some(crf) = env_parse("HILITE_CRF") {
            encoding.crf = crf;
        }
        if let Some(bitrate) = env_string("HILITE_AUDIO_BITRATE") {
            encoding.audio_bitrate = bitrate;
        }

        Self {
            work_dir: env_string("HILITE_WORK_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.work_dir),
            gap_threshold_secs: env_parse::<f64>("HILITE_GAP_THRESHOLD_SECS")
                .filter(|g| g.is_finite() && *g >= 0.0)
                .unwrap_or(defaults.gap_threshold_secs),
            renderer_timeout: env_parse::<u64>("HILITE_RENDER_TIMEOUT_SECS")
                .filter(|s| *s > 0)
                .map(Duration::from_secs),
            capture_payloads: std::env::var("HILITE_CAPTURE_PAYLOADS")
                .map(|v| parse_flag(&v))
                .unwrap_or(false),
            capture_dir: env_string("HILITE_CAPTURE_DIR").map(PathBuf::from),
            fonts: FontSet {
                regular: env_string("HILITE_FONT_REGULAR"),
                bold: env_string("HILITE_FONT_BOLD"),
            },
            default_namespace: env_string("HILITE_NAMESPACE").unwrap_or(defaults.default_namespace),
            output_dir: env_string("HILITE_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.output_dir),
            encoding,
        }
    }

    /// Directory for captured render plans.
    pub fn capture_dir(&self) -> PathBuf {
        self.capture_dir
            .clone()
            .unwrap_or_else(|| self.work_dir.join("captures"))
    }

    pub fn renderer_timeout_secs(&self) -> Option<u64> {
        self.renderer_timeout.map(|d| d.as_secs().max(1))
    }
}
