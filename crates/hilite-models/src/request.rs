//! Render requests and their per-part report.

use chrono::{DateTime, Utc};
use std::collections::HashSet;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;
use validator::Validate;

use crate::options::RenderOptions;
use crate::segment::{RenderedPart, Segment};
use crate::utterance::Utterance;

fn new_request_id() -> String {
    Uuid::new_v4().to_string()
}

/// File- and key-safe form of an identifier.
///
/// Part artifacts are named after this, so two ids with the same stem
/// would share one file.
pub fn artifact_stem(id: &str) -> String {
    let stem: String = id
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    if stem.is_empty() {
        "part".to_string()
    } else {
        stem
    }
}

/// One output artifact to produce: one or more ranges of the source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PartRequest {
    /// Caller identifier; generated when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 128))]
    pub id: Option<String>,
    #[validate(length(min = 1, message = "a part needs at least one segment"))]
    pub segments: Vec<Segment>,
}

impl PartRequest {
    pub fn single(start: f64, end: f64) -> Self {
        Self {
            id: None,
            segments: vec![Segment::new(start, end)],
        }
    }
}

/// A complete render request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RenderRequest {
    #[serde(default = "new_request_id")]
    #[validate(length(min = 1, max = 128))]
    pub request_id: String,
    /// Local path or http(s) URL of the source media
    #[validate(length(min = 1, message = "source is required"))]
    pub source: String,
    #[validate(length(min = 1, message = "at least one part is required"), nested)]
    pub parts: Vec<PartRequest>,
    /// Transcript of the whole source, used for captions and speaker overlays
    #[serde(default)]
    pub utterances: Vec<Utterance>,
    #[serde(default)]
    pub options: RenderOptions,
    /// Upload namespace; the configured default applies when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

impl RenderRequest {
    pub fn new(source: impl Into<String>, parts: Vec<PartRequest>) -> Self {
        Self {
            request_id: new_request_id(),
            source: source.into(),
            parts,
            utterances: Vec::new(),
            options: RenderOptions::default(),
            namespace: None,
        }
    }

    /// Full validation: shape, segment bounds and option consistency.
    pub fn check(&self) -> Result<(), RequestError> {
        self.validate()
            .map_err(|e| RequestError::Invalid(e.to_string()))?;

        for (idx, part) in self.parts.iter().enumerate() {
            if let Some(bad) = part.segments.iter().find(|s| !s.is_valid()) {
                return Err(RequestError::Invalid(format!(
                    "part {} has an empty or inverted segment [{:.3}, {:.3}]",
                    idx, bad.start_timestamp, bad.end_timestamp
                )));
            }
        }

        let mut stems = HashSet::with_capacity(self.parts.len());
        for idx in 0..self.parts.len() {
            let id = self.part_id(idx);
            if !stems.insert(artifact_stem(&id)) {
                return Err(RequestError::Invalid(format!(
                    "part {} id {:?} collides with an earlier part",
                    idx, id
                )));
            }
        }

        self.options
            .validate()
            .map_err(|e| RequestError::Invalid(e.to_string()))
    }

    /// Stable id for the part at `index`.
    pub fn part_id(&self, index: usize) -> String {
        self.parts
            .get(index)
            .and_then(|p| p.id.clone())
            .unwrap_or_else(|| format!("{}-part-{}", self.request_id, index + 1))
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RequestError {
    #[error("Invalid render request: {0}")]
    Invalid(String),
}

/// Failure classification surfaced to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Validation,
    Download,
    Probe,
    Render,
    Upload,
    Internal,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::Validation => "validation",
            FailureKind::Download => "download",
            FailureKind::Probe => "probe",
            FailureKind::Render => "render",
            FailureKind::Upload => "upload",
            FailureKind::Internal => "internal",
        }
    }
}

/// Why a part did not produce an artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PartFailure {
    pub id: String,
    pub kind: FailureKind,
    pub message: String,
    /// Captured renderer output, when available
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diagnostics: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PartOutcome {
    Rendered(RenderedPart),
    Failed(PartFailure),
}

impl PartOutcome {
    pub fn is_rendered(&self) -> bool {
        matches!(self, PartOutcome::Rendered(_))
    }

    pub fn rendered(&self) -> Option<&RenderedPart> {
        match self {
            PartOutcome::Rendered(part) => Some(part),
            PartOutcome::Failed(_) => None,
        }
    }
}

/// Outcome of a whole request, one entry per requested part, in order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RenderReport {
    pub request_id: String,
    pub parts: Vec<PartOutcome>,
    pub completed_at: DateTime<Utc>,
}

impl RenderReport {
    pub fn rendered_count(&self) -> usize {
        self.parts.iter().filter(|p| p.is_rendered()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.parts.len() - self.rendered_count()
    }

    /// First failure, if any part failed.
    pub fn first_failure(&self) -> Option<&PartFailure> {
        self.parts.iter().find_map(|p| match p {
            PartOutcome::Failed(f) => Some(f),
            PartOutcome::Rendered(_) => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_parses_and_checks() {
        let json = r#"{
            "source": "/media/session.mp4",
            "parts": [{"segments": [{"startTimestamp": 10, "endTimestamp": "00:00:20"}]}],
            "options": {"aspectRatio": "social-9x16", "includeCaptions": true}
        }"#;
        let request: RenderRequest = serde_json::from_str(json).unwrap();
        assert!(!request.request_id.is_empty());
        assert!(request.check().is_ok());
        assert!(request.part_id(0).ends_with("-part-1"));
    }

    #[test]
    fn test_empty_parts_rejected() {
        let request = RenderRequest::new("/media/a.mp4", vec![]);
        assert!(matches!(request.check(), Err(RequestError::Invalid(_))));
    }

    #[test]
    fn test_part_without_segments_rejected() {
        let request = RenderRequest::new(
            "/media/a.mp4",
            vec![PartRequest {
                id: Some("p".to_string()),
                segments: vec![],
            }],
        );
        assert!(request.check().is_err());
    }

    #[test]
    fn test_inverted_segment_rejected() {
        let request = RenderRequest::new("/media/a.mp4", vec![PartRequest::single(20.0, 10.0)]);
        let err = request.check().unwrap_err();
        assert!(err.to_string().contains("inverted"));
    }

    #[test]
    fn test_duplicate_part_ids_rejected() {
        let part = |id: &str, start: f64| PartRequest {
            id: Some(id.to_string()),
            segments: vec![Segment::new(start, start + 5.0)],
        };

        let same = RenderRequest::new("/media/a.mp4", vec![part("clip", 0.0), part("clip", 50.0)]);
        assert!(same.check().unwrap_err().to_string().contains("collides"));

        let same_stem = RenderRequest::new("/media/a.mp4", vec![part("a/b", 0.0), part("a_b", 50.0)]);
        assert!(same_stem.check().is_err());

        let distinct = RenderRequest::new("/media/a.mp4", vec![part("a", 0.0), part("b", 50.0)]);
        assert!(distinct.check().is_ok());
    }

    #[test]
    fn test_generated_id_cannot_shadow_explicit_id() {
        let mut request = RenderRequest::new(
            "/media/a.mp4",
            vec![
                PartRequest::single(0.0, 5.0),
                PartRequest {
                    id: Some("req-part-1".to_string()),
                    segments: vec![Segment::new(10.0, 15.0)],
                },
            ],
        );
        request.request_id = "req".to_string();
        assert!(request.check().is_err());
    }

    #[test]
    fn test_artifact_stem() {
        assert_eq!(artifact_stem("req-1-part-1"), "req-1-part-1");
        assert_eq!(artifact_stem("a/b c"), "a_b_c");
        assert_eq!(artifact_stem(""), "part");
    }

    #[test]
    fn test_outcome_serializes_with_status_tag() {
        let outcome = PartOutcome::Failed(PartFailure {
            id: "p1".to_string(),
            kind: FailureKind::Render,
            message: "exit 1".to_string(),
            diagnostics: None,
        });
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["status"], "failed");
        assert_eq!(json["kind"], "render");
    }
}
