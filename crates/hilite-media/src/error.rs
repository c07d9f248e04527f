//! Error types for media operations.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for media operations.
pub type MediaResult<T> = Result<T, MediaError>;

/// Errors that can occur while probing or rendering.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("FFmpeg not found in PATH")]
    FfmpegNotFound,

    #[error("FFprobe not found in PATH")]
    FfprobeNotFound,

    #[error("FFmpeg command failed: {message}")]
    FfmpegFailed {
        message: String,
        stderr: Option<String>,
        stdout: Option<String>,
        exit_code: Option<i32>,
    },

    #[error("FFprobe command failed: {message}")]
    FfprobeFailed {
        message: String,
        stderr: Option<String>,
    },

    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    #[error("FFmpeg timed out after {secs} seconds")]
    Timeout {
        secs: u64,
        stderr: Option<String>,
        stdout: Option<String>,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("Invalid media file: {0}")]
    InvalidMedia(String),

    #[error("Invalid render plan: {0}")]
    InvalidPlan(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl MediaError {
    /// Create an FFmpeg failure error.
    pub fn ffmpeg_failed(
        message: impl Into<String>,
        stderr: Option<String>,
        stdout: Option<String>,
        exit_code: Option<i32>,
    ) -> Self {
        Self::FfmpegFailed {
            message: message.into(),
            stderr,
            stdout,
            exit_code,
        }
    }

    /// Create a timeout error carrying whatever the process printed.
    pub fn timeout(secs: u64, stderr: Option<String>, stdout: Option<String>) -> Self {
        Self::Timeout {
            secs,
            stderr,
            stdout,
        }
    }

    pub fn invalid_plan(message: impl Into<String>) -> Self {
        Self::InvalidPlan(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Captured process output attached to this error, if any.
    pub fn diagnostics(&self) -> Option<String> {
        match self {
            Self::FfmpegFailed { stderr, stdout, .. } | Self::Timeout { stderr, stdout, .. } => {
                let parts: Vec<&str> = [stderr.as_deref(), stdout.as_deref()]
                    .into_iter()
                    .flatten()
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .collect();
                (!parts.is_empty()).then(|| parts.join("\n"))
            }
            Self::FfprobeFailed { stderr, .. } => stderr.clone(),
            _ => None,
        }
    }

    /// Whether this failure came from the external renderer process.
    pub fn is_renderer_failure(&self) -> bool {
        matches!(self, Self::FfmpegFailed { .. } | Self::Timeout { .. } | Self::FfmpegNotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostics_joins_streams() {
        let err = MediaError::ffmpeg_failed(
            "exit 1",
            Some("Invalid argument\n".to_string()),
            Some("  ".to_string()),
            Some(1),
        );
        assert_eq!(err.diagnostics().as_deref(), Some("Invalid argument"));
        assert!(err.is_renderer_failure());
        assert!(MediaError::internal("x").diagnostics().is_none());
    }

    #[test]
    fn test_timeout_keeps_process_output() {
        let err = MediaError::timeout(5, Some("Error while filtering".to_string()), None);
        assert_eq!(err.diagnostics().as_deref(), Some("Error while filtering"));
        assert!(err.is_renderer_failure());
        assert!(MediaError::timeout(5, None, None).diagnostics().is_none());
    }
}
