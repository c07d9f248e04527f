//! Render metrics, recorded through the `metrics` facade.

use metrics::{counter, histogram};

/// Metric names as constants for consistency.
pub mod names {
    pub const PARTS_RENDERED_TOTAL: &str = "hilite_parts_rendered_total";
    pub const PARTS_FAILED_TOTAL: &str = "hilite_parts_failed_total";
    pub const RENDER_DURATION_SECONDS: &str = "hilite_render_duration_seconds";
    pub const UPLOAD_DURATION_SECONDS: &str = "hilite_upload_duration_seconds";
    pub const DOWNLOAD_DURATION_SECONDS: &str = "hilite_download_duration_seconds";
    pub const PROBE_FALLBACKS_TOTAL: &str = "hilite_probe_fallbacks_total";
}

pub fn record_part_rendered(media_type: &str, render_secs: f64) {
    let labels = [("media_type", media_type.to_string())];
    counter!(names::PARTS_RENDERED_TOTAL, &labels).increment(1);
    histogram!(names::RENDER_DURATION_SECONDS, &labels).record(render_secs);
}

pub fn record_part_failed(kind: &str) {
    let labels = [("kind", kind.to_string())];
    counter!(names::PARTS_FAILED_TOTAL, &labels).increment(1);
}

pub fn record_upload(duration_secs: f64) {
    histogram!(names::UPLOAD_DURATION_SECONDS).record(duration_secs);
}

pub fn record_download(duration_secs: f64) {
    histogram!(names::DOWNLOAD_DURATION_SECONDS).record(duration_secs);
}

pub fn record_probe_fallback() {
    counter!(names::PROBE_FALLBACKS_TOTAL).increment(1);
}
