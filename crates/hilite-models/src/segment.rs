//! Segments of the source to extract, and the parts rendered from them.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::timestamp::deserialize_seconds;
use crate::utterance::TimeSpan;

/// A time range on the source timeline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Segment {
    #[serde(deserialize_with = "deserialize_seconds")]
    pub start_timestamp: f64,
    #[serde(deserialize_with = "deserialize_seconds")]
    pub end_timestamp: f64,
}

impl Segment {
    pub fn new(start: f64, end: f64) -> Self {
        Self {
            start_timestamp: start,
            end_timestamp: end,
        }
    }

    /// Whether `other` overlaps this segment by a non-zero amount.
    pub fn overlaps(&self, other: &impl TimeSpan) -> bool {
        other.start() < self.end_timestamp && other.end() > self.start_timestamp
    }

    /// Whether the segment has positive length.
    pub fn is_valid(&self) -> bool {
        self.end_timestamp > self.start_timestamp
    }
}

impl TimeSpan for Segment {
    fn start(&self) -> f64 {
        self.start_timestamp
    }

    fn end(&self) -> f64 {
        self.end_timestamp
    }
}

/// Final artifact for one requested part.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RenderedPart {
    pub id: String,
    /// Externally reachable URL returned by the upload collaborator
    pub url: String,
    /// Seconds of media in the artifact
    pub duration: f64,
    /// Start of the first extracted range, source timeline
    pub start_timestamp: f64,
    /// End of the last extracted range, source timeline
    pub end_timestamp: f64,
    /// Hosting playback identifier (video only, best effort)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub playback_id: Option<String>,
    pub rendered_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Utterance;

    #[test]
    fn test_overlaps() {
        let seg = Segment::new(10.0, 20.0);
        assert!(seg.overlaps(&Utterance::new("a", 19.0, 25.0)));
        assert!(seg.overlaps(&Utterance::new("a", 5.0, 10.5)));
        assert!(!seg.overlaps(&Utterance::new("a", 20.0, 25.0)));
        assert!(!seg.overlaps(&Utterance::new("a", 1.0, 10.0)));
    }

    #[test]
    fn test_segment_accepts_timestamp_strings() {
        let seg: Segment =
            serde_json::from_str(r#"{"startTimestamp": "00:00:05", "endTimestamp": 7.5}"#)
                .unwrap();
        assert_eq!(seg, Segment::new(5.0, 7.5));
        assert!(seg.is_valid());
        assert!(!Segment::new(3.0, 3.0).is_valid());
    }
}
