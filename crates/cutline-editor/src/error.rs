//! Editor error types.

use std::path::PathBuf;
use thiserror::Error;

use cutline_models::ClipId;

pub type EditorResult<T> = Result<T, EditorError>;

#[derive(Debug, Error)]
pub enum EditorError {
    #[error(transparent)]
    Edit(#[from] cutline_models::EditError),

    #[error("Media error: {0}")]
    Media(#[from] cutline_media::MediaError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Project file error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Clip not found: {0}")]
    ClipNotFound(ClipId),

    #[error("Media not found: {}", .0.display())]
    MediaNotFound(PathBuf),

    #[error("An export is already running for this project")]
    ExportInProgress,

    #[error("Timeline is empty")]
    EmptyTimeline,

    #[error("Configuration error: {0}")]
    Config(String),
}

impl EditorError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Single-line message for the user, with the tool diagnostic when there is one.
    pub fn user_message(&self) -> String {
        match self {
            EditorError::Media(e @ cutline_media::MediaError::ExportFailed { .. }) => e.to_string(),
            EditorError::Media(e) => e.diagnostic(),
            other => other.to_string(),
        }
    }
}
