//! Structured request logging.

use tracing::{error, info, warn, Span};

/// Logger carrying the request id and operation on every event.
#[derive(Debug, Clone)]
pub struct RenderLogger {
    request_id: String,
    operation: String,
}

impl RenderLogger {
    pub fn new(request_id: &str, operation: &str) -> Self {
        Self {
            request_id: request_id.to_string(),
            operation: operation.to_string(),
        }
    }

    /// Same request, different operation.
    pub fn for_operation(&self, operation: &str) -> Self {
        Self::new(&self.request_id, operation)
    }

    pub fn log_start(&self, message: &str) {
        info!(
            request_id = %self.request_id,
            operation = %self.operation,
            "Render started: {}", message
        );
    }

    pub fn log_progress(&self, message: &str) {
        info!(
            request_id = %self.request_id,
            operation = %self.operation,
            "Render progress: {}", message
        );
    }

    pub fn log_warning(&self, message: &str) {
        warn!(
            request_id = %self.request_id,
            operation = %self.operation,
            "Render warning: {}", message
        );
    }

    pub fn log_error(&self, message: &str) {
        error!(
            request_id = %self.request_id,
            operation = %self.operation,
            "Render error: {}", message
        );
    }

    pub fn log_completion(&self, message: &str) {
        info!(
            request_id = %self.request_id,
            operation = %self.operation,
            "Render completed: {}", message
        );
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    pub fn operation(&self) -> &str {
        &self.operation
    }

    /// Span for instrumenting the request's futures.
    pub fn create_span(&self) -> Span {
        tracing::info_span!(
            "render",
            request_id = %self.request_id,
            operation = %self.operation
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_operation_keeps_request() {
        let logger = RenderLogger::new("req-7", "render_request");
        let part = logger.for_operation("render_part");
        assert_eq!(part.request_id(), "req-7");
        assert_eq!(part.operation(), "render_part");
    }
}
