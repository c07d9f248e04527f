//! Worker error types.

use thiserror::Error;

use hilite_models::FailureKind;

pub type WorkerResult<T> = Result<T, WorkerError>;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("Probe failed: {0}")]
    ProbeFailed(String),

    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Playback provisioning failed: {0}")]
    PlaybackFailed(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Storage error: {0}")]
    Storage(#[from] hilite_storage::StorageError),

    #[error("Media error: {0}")]
    Media(#[from] hilite_media::MediaError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<hilite_models::RequestError> for WorkerError {
    fn from(e: hilite_models::RequestError) -> Self {
        Self::Validation(e.to_string())
    }
}

impl WorkerError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn download_failed(msg: impl Into<String>) -> Self {
        Self::DownloadFailed(msg.into())
    }

    pub fn upload_failed(msg: impl Into<String>) -> Self {
        Self::UploadFailed(msg.into())
    }

    pub fn playback_failed(msg: impl Into<String>) -> Self {
        Self::PlaybackFailed(msg.into())
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    /// Classification reported to callers.
    pub fn kind(&self) -> FailureKind {
        match self {
            WorkerError::Validation(_) => FailureKind::Validation,
            WorkerError::DownloadFailed(_) | WorkerError::Http(_) => FailureKind::Download,
            WorkerError::ProbeFailed(_) => FailureKind::Probe,
            WorkerError::UploadFailed(_) | WorkerError::Storage(_) => FailureKind::Upload,
            WorkerError::Media(e) if e.is_renderer_failure() => FailureKind::Render,
            WorkerError::Media(hilite_media::MediaError::InvalidPlan(_)) => FailureKind::Validation,
            WorkerError::Media(_) => FailureKind::Render,
            WorkerError::PlaybackFailed(_)
            | WorkerError::ConfigError(_)
            | WorkerError::Json(_)
            | WorkerError::Io(_) => FailureKind::Internal,
        }
    }

    /// Captured renderer output, if this error carries any.
    pub fn diagnostics(&self) -> Option<String> {
        match self {
            WorkerError::Media(e) => e.diagnostics(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hilite_media::MediaError;

    #[test]
    fn test_kind_classification() {
        let render = WorkerError::from(MediaError::ffmpeg_failed(
            "exit 1",
            Some("No such filter: 'drawtxt'".to_string()),
            None,
            Some(1),
        ));
        assert_eq!(render.kind(), FailureKind::Render);
        assert_eq!(render.diagnostics().as_deref(), Some("No such filter: 'drawtxt'"));

        let plan = WorkerError::from(MediaError::invalid_plan("no segments"));
        assert_eq!(plan.kind(), FailureKind::Validation);

        let upload = WorkerError::from(hilite_storage::StorageError::upload_failed("503"));
        assert_eq!(upload.kind(), FailureKind::Upload);

        assert_eq!(WorkerError::download_failed("404").kind(), FailureKind::Download);
        assert_eq!(
            WorkerError::from(hilite_models::RequestError::Invalid("x".into())).kind(),
            FailureKind::Validation
        );
    }
}
