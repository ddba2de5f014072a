//! Metrics for external tool invocations.

use metrics::{counter, histogram};

/// Metric names as constants for consistency.
pub mod names {
    pub const FFMPEG_RUNS_TOTAL: &str = "cutline_ffmpeg_runs_total";
    pub const FFMPEG_FAILURES_TOTAL: &str = "cutline_ffmpeg_failures_total";
    pub const FFMPEG_DURATION_SECONDS: &str = "cutline_ffmpeg_duration_seconds";
    pub const PROBES_TOTAL: &str = "cutline_probes_total";
    pub const EXPORT_STAGE_DURATION_SECONDS: &str = "cutline_export_stage_duration_seconds";
}

/// Record one finished FFmpeg process.
pub fn record_ffmpeg_run(operation: &'static str, success: bool, duration_secs: f64) {
    let labels = [("operation", operation)];
    counter!(names::FFMPEG_RUNS_TOTAL, &labels).increment(1);
    if !success {
        counter!(names::FFMPEG_FAILURES_TOTAL, &labels).increment(1);
    }
    histogram!(names::FFMPEG_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Record a duration probe and whether it produced a value.
pub fn record_probe(found: bool) {
    let labels = [("result", if found { "ok" } else { "unknown" })];
    counter!(names::PROBES_TOTAL, &labels).increment(1);
}

/// Record how long one export stage took.
pub fn record_export_stage(stage: &'static str, duration_secs: f64) {
    let labels = [("stage", stage)];
    histogram!(names::EXPORT_STAGE_DURATION_SECONDS, &labels).record(duration_secs);
}
