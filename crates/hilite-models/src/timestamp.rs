//! Timestamp parsing utilities.
//!
//! Segment and utterance times are carried as seconds (`f64`), but requests
//! may spell them as `HH:MM:SS(.mmm)`, `MM:SS` or plain seconds. This module
//! accepts all of those forms.

use serde::{Deserialize, Deserializer};
use thiserror::Error;

/// Maximum reasonable source duration (24 hours in seconds).
pub const MAX_SOURCE_DURATION_SECS: f64 = 86400.0;

/// Parse a timestamp string to total seconds.
///
/// # Examples
/// ```
/// use hilite_models::timestamp::parse_timestamp;
/// assert_eq!(parse_timestamp("01:30:00").unwrap(), 5400.0);
/// assert_eq!(parse_timestamp("05:30").unwrap(), 330.0);
/// assert_eq!(parse_timestamp("90.5").unwrap(), 90.5);
/// ```
pub fn parse_timestamp(ts: &str) -> Result<f64, TimestampError> {
    let ts = ts.trim();
    if ts.is_empty() {
        return Err(TimestampError::Empty);
    }

    let parts: Vec<&str> = ts.split(':').collect();
    if parts.len() > 3 {
        return Err(TimestampError::InvalidFormat(ts.to_string()));
    }

    // Fold from the most significant field: h -> m -> s
    let mut total = 0.0;
    for (idx, part) in parts.iter().enumerate() {
        let value: f64 = part
            .parse()
            .map_err(|_| TimestampError::InvalidValue(part.to_string()))?;
        if value < 0.0 || !value.is_finite() {
            return Err(TimestampError::Negative);
        }
        total = if idx == 0 { value } else { total * 60.0 + value };
    }

    if total > MAX_SOURCE_DURATION_SECS {
        return Err(TimestampError::ExceedsMaxDuration(total));
    }

    Ok(total)
}

/// Format seconds into `HH:MM:SS` or `HH:MM:SS.mmm`.
pub fn format_seconds(total_secs: f64) -> String {
    let hours = (total_secs / 3600.0).floor() as u32;
    let mins = ((total_secs % 3600.0) / 60.0).floor() as u32;
    let secs = total_secs % 60.0;

    if (secs - secs.floor()).abs() > 0.0001 {
        format!("{:02}:{:02}:{:06.3}", hours, mins, secs)
    } else {
        format!("{:02}:{:02}:{:02}", hours, mins, secs.floor() as u32)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawSeconds {
    Number(f64),
    Text(String),
}

/// Serde helper accepting either a number of seconds or a timestamp string.
pub fn deserialize_seconds<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    match RawSeconds::deserialize(deserializer)? {
        RawSeconds::Number(secs) if secs >= 0.0 && secs.is_finite() => Ok(secs),
        RawSeconds::Number(secs) => Err(serde::de::Error::custom(format!(
            "timestamp must be a non-negative number, got {secs}"
        ))),
        RawSeconds::Text(text) => parse_timestamp(&text).map_err(serde::de::Error::custom),
    }
}

/// Timestamp parsing error.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TimestampError {
    #[error("Timestamp is empty")]
    Empty,
    #[error("Invalid timestamp format: {0}")]
    InvalidFormat(String),
    #[error("Invalid timestamp component: {0}")]
    InvalidValue(String),
    #[error("Timestamp cannot be negative")]
    Negative,
    #[error("Timestamp {0:.1}s exceeds the 24h maximum")]
    ExceedsMaxDuration(f64),
}
