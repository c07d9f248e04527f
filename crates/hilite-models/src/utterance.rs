//! Transcript utterances and speakers.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::timestamp::deserialize_seconds;

/// Anything occupying a `[start, end)` range on the source timeline.
pub trait TimeSpan {
    /// Start time in seconds.
    fn start(&self) -> f64;
    /// End time in seconds.
    fn end(&self) -> f64;

    /// Length of the span, never negative.
    fn duration(&self) -> f64 {
        (self.end() - self.start()).max(0.0)
    }
}

/// Identity of a person speaking in the recording.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Speaker {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role_label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub party_label: Option<String>,
    /// Accent colour as `#RRGGBB`; invalid values are ignored at render time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub party_color_hex: Option<String>,
}

impl Speaker {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            role_label: None,
            party_label: None,
            party_color_hex: None,
        }
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role_label = Some(role.into());
        self
    }

    pub fn with_party(mut self, party: impl Into<String>, color_hex: Option<&str>) -> Self {
        self.party_label = Some(party.into());
        self.party_color_hex = color_hex.map(str::to_string);
        self
    }
}

/// A single speaker's contiguous span of speech, timed against the source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Utterance {
    pub text: String,
    #[serde(deserialize_with = "deserialize_seconds")]
    pub start_timestamp: f64,
    #[serde(deserialize_with = "deserialize_seconds")]
    pub end_timestamp: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speaker: Option<Speaker>,
}

impl Utterance {
    pub fn new(text: impl Into<String>, start: f64, end: f64) -> Self {
        Self {
            text: text.into(),
            start_timestamp: start,
            end_timestamp: end,
            speaker: None,
        }
    }

    pub fn with_speaker(mut self, speaker: Speaker) -> Self {
        self.speaker = Some(speaker);
        self
    }

    /// Speaker id, if any.
    pub fn speaker_id(&self) -> Option<&str> {
        self.speaker.as_ref().map(|s| s.id.as_str())
    }
}

impl TimeSpan for Utterance {
    fn start(&self) -> f64 {
        self.start_timestamp
    }

    fn end(&self) -> f64 {
        self.end_timestamp
    }
}

/// An utterance re-timed against the extracted clip, which starts at zero.
///
/// The original timestamps are kept on `utterance` for traceability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedUtterance {
    #[serde(flatten)]
    pub utterance: Utterance,
    pub normalized_start: f64,
    pub normalized_end: f64,
}

impl NormalizedUtterance {
    pub fn text(&self) -> &str {
        &self.utterance.text
    }

    pub fn speaker(&self) -> Option<&Speaker> {
        self.utterance.speaker.as_ref()
    }

    pub fn speaker_id(&self) -> Option<&str> {
        self.utterance.speaker_id()
    }

    pub fn normalized_duration(&self) -> f64 {
        self.normalized_end - self.normalized_start
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_utterance_deserializes_camel_case() {
        let json = r#"{
            "text": "Point of order",
            "startTimestamp": "00:01:40",
            "endTimestamp": 105,
            "speaker": {"id": "s1", "name": "Ada", "roleLabel": "Chair"}
        }"#;
        let u: Utterance = serde_json::from_str(json).unwrap();
        assert_eq!(u.start_timestamp, 100.0);
        assert_eq!(u.end_timestamp, 105.0);
        assert_eq!(u.speaker_id(), Some("s1"));
        assert_eq!(u.speaker.unwrap().role_label.as_deref(), Some("Chair"));
    }

    #[test]
    fn test_time_span_duration_never_negative() {
        let u = Utterance::new("x", 10.0, 8.0);
        assert_eq!(u.duration(), 0.0);
        assert_eq!(Utterance::new("x", 1.0, 3.5).duration(), 2.5);
    }
}
