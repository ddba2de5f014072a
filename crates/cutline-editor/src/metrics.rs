//! Prometheus metrics for the editing session.

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::error::{EditorError, EditorResult};

/// Install the Prometheus recorder.
/// Returns a handle that can be used to render metrics.
pub fn init_metrics() -> EditorResult<PrometheusHandle> {
    PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| EditorError::config(format!("Failed to install Prometheus recorder: {}", e)))
}

/// Metric names as constants for consistency.
pub mod names {
    // Preview jobs
    pub const PREVIEW_JOBS_TOTAL: &str = "cutline_preview_jobs_total";
    pub const PREVIEW_JOB_DURATION_SECONDS: &str = "cutline_preview_job_duration_seconds";
    pub const PREVIEW_JOBS_ACTIVE: &str = "cutline_preview_jobs_active";
    pub const PREVIEW_RESULTS_DROPPED_TOTAL: &str = "cutline_preview_results_dropped_total";

    // Artifact cache
    pub const CACHE_LOOKUPS_TOTAL: &str = "cutline_cache_lookups_total";

    // Export
    pub const EXPORTS_TOTAL: &str = "cutline_exports_total";
    pub const EXPORT_DURATION_SECONDS: &str = "cutline_export_duration_seconds";
}

/// Record a finished preview job.
pub fn record_preview_job(kind: &str, outcome: &str, duration_secs: f64) {
    let labels = [("kind", kind.to_string()), ("outcome", outcome.to_string())];
    counter!(names::PREVIEW_JOBS_TOTAL, &labels).increment(1);
    histogram!(names::PREVIEW_JOB_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Update the number of preview jobs holding a worker slot.
pub fn set_active_preview_jobs(count: usize) {
    gauge!(names::PREVIEW_JOBS_ACTIVE).set(count as f64);
}

/// Record a preview result dropped because a newer job superseded it.
pub fn record_superseded_result(kind: &str) {
    let labels = [("kind", kind.to_string())];
    counter!(names::PREVIEW_RESULTS_DROPPED_TOTAL, &labels).increment(1);
}

/// Record an artifact cache lookup.
pub fn record_cache_lookup(artifact: &str, hit: bool) {
    let labels = [
        ("artifact", artifact.to_string()),
        ("result", if hit { "hit" } else { "miss" }.to_string()),
    ];
    counter!(names::CACHE_LOOKUPS_TOTAL, &labels).increment(1);
}

/// Record a finished export.
pub fn record_export(success: bool, duration_secs: f64) {
    let labels = [("status", if success { "success" } else { "failure" }.to_string())];
    counter!(names::EXPORTS_TOTAL, &labels).increment(1);
    histogram!(names::EXPORT_DURATION_SECONDS, &labels).record(duration_secs);
}
