//! Error types for media operations.

use std::path::PathBuf;
use thiserror::Error;

use cutline_models::MediaKind;

use crate::export::ExportStage;

/// Result type for media operations.
pub type MediaResult<T> = Result<T, MediaError>;

/// Errors that can occur during media processing.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("FFmpeg not found in PATH")]
    FfmpegNotFound,

    #[error("FFprobe not found in PATH")]
    FfprobeNotFound,

    #[error("FFmpeg command failed: {message}")]
    FfmpegFailed {
        message: String,
        stderr: Option<String>,
        exit_code: Option<i32>,
    },

    #[error("FFprobe command failed: {message}")]
    FfprobeFailed {
        message: String,
        stderr: Option<String>,
    },

    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Operation timed out after {0} seconds")]
    Timeout(u64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Nothing to export: the timeline is empty")]
    NothingToExport,

    #[error("Cannot render {kind} media as a video clip: {}", path.display())]
    UnsupportedMedia { path: PathBuf, kind: MediaKind },

    #[error("Export failed during {stage}: {diagnostic}")]
    ExportFailed {
        stage: ExportStage,
        diagnostic: String,
    },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl MediaError {
    /// Create an FFmpeg failure error.
    pub fn ffmpeg_failed(
        message: impl Into<String>,
        stderr: Option<String>,
        exit_code: Option<i32>,
    ) -> Self {
        Self::FfmpegFailed {
            message: message.into(),
            stderr,
            exit_code,
        }
    }

    /// Wrap any failure as the single export-level report for `stage`.
    pub fn export_failed(stage: ExportStage, source: MediaError) -> Self {
        Self::ExportFailed {
            stage,
            diagnostic: source.diagnostic(),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Human-readable diagnostic, preferring the tool's own stderr text.
    pub fn diagnostic(&self) -> String {
        match self {
            Self::FfmpegFailed {
                stderr: Some(stderr),
                ..
            }
            | Self::FfprobeFailed {
                stderr: Some(stderr),
                ..
            } if !stderr.trim().is_empty() => stderr.trim().to_string(),
            Self::ExportFailed { diagnostic, .. } => diagnostic.clone(),
            other => other.to_string(),
        }
    }
}
