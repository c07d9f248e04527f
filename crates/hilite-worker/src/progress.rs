//! Request-level progress reporting.

/// Share of overall progress reserved for fetching and probing the source.
const SOURCE_SHARE: f64 = 5.0;
/// Share reserved for the parts; the rest is the final report.
const PARTS_SHARE: f64 = 90.0;

/// Stage labels passed to progress sinks.
pub mod stages {
    pub const START: &str = "start";
    pub const DOWNLOAD: &str = "download";
    pub const PROBE: &str = "probe";
    pub const RENDER: &str = "render";
    pub const UPLOAD: &str = "upload";
    pub const COMPLETE: &str = "complete";
}

/// Forwards progress to a sink, never letting the percentage go backwards.
pub struct ProgressTracker<F>
where
    F: FnMut(&str, f64),
{
    sink: F,
    last: f64,
    parts: usize,
}

impl<F> ProgressTracker<F>
where
    F: FnMut(&str, f64),
{
    pub fn new(sink: F, parts: usize) -> Self {
        Self {
            sink,
            last: 0.0,
            parts: parts.max(1),
        }
    }

    /// Report `percent`, clamped to `[last, 100]`.
    pub fn report(&mut self, stage: &str, percent: f64) {
        if percent.is_nan() {
            return;
        }
        let percent = percent.clamp(0.0, 100.0).max(self.last);
        self.last = percent;
        (self.sink)(stage, percent);
    }

    pub fn start(&mut self) {
        self.report(stages::START, 0.0);
    }

    pub fn source_ready(&mut self) {
        self.report(stages::PROBE, SOURCE_SHARE);
    }

    /// Progress within part `index`, `fraction` in `[0, 1]`.
    pub fn part(&mut self, stage: &str, index: usize, fraction: f64) {
        let fraction = if fraction.is_nan() { 0.0 } else { fraction.clamp(0.0, 1.0) };
        let overall = (index as f64 + fraction) / self.parts as f64;
        self.report(stage, SOURCE_SHARE + PARTS_SHARE * overall);
    }

    pub fn finish(&mut self) {
        self.report(stages::COMPLETE, 100.0);
    }

    pub fn last(&self) -> f64 {
        self.last
    }
}
