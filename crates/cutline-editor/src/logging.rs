//! Structured job logging utilities.
//!
//! Provides consistent, structured logging for preview jobs and exports
//! with tracing spans and contextual information.

use tracing::{error, info, warn, Span};

use cutline_models::ClipId;

/// Job logger for structured logging with consistent formatting.
///
/// Every line carries the target (a clip ID, or `project` for exports) and
/// the operation name.
#[derive(Debug, Clone)]
pub struct JobLogger {
    target: String,
    operation: String,
}

impl JobLogger {
    /// Logger for a job that works on one clip.
    pub fn for_clip(clip_id: &ClipId, operation: &str) -> Self {
        Self {
            target: clip_id.to_string(),
            operation: operation.to_string(),
        }
    }

    /// Logger for a whole-project operation such as export.
    pub fn for_project(operation: &str) -> Self {
        Self {
            target: "project".to_string(),
            operation: operation.to_string(),
        }
    }

    pub fn log_start(&self, message: &str) {
        info!(
            target_id = %self.target,
            operation = %self.operation,
            "Job started: {}", message
        );
    }

    pub fn log_progress(&self, message: &str) {
        info!(
            target_id = %self.target,
            operation = %self.operation,
            "Job progress: {}", message
        );
    }

    pub fn log_warning(&self, message: &str) {
        warn!(
            target_id = %self.target,
            operation = %self.operation,
            "Job warning: {}", message
        );
    }

    pub fn log_error(&self, message: &str) {
        error!(
            target_id = %self.target,
            operation = %self.operation,
            "Job error: {}", message
        );
    }

    pub fn log_completion(&self, message: &str) {
        info!(
            target_id = %self.target,
            operation = %self.operation,
            "Job completed: {}", message
        );
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn operation(&self) -> &str {
        &self.operation
    }

    /// Span to instrument the job's future with.
    pub fn create_span(&self) -> Span {
        tracing::info_span!(
            "job",
            target_id = %self.target,
            operation = %self.operation
        )
    }
}
