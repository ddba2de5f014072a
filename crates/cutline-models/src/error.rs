//! Errors raised at the clip edit boundary.

use thiserror::Error;

use crate::transition::TransitionParseError;

/// Result type for clip edits.
pub type EditResult<T> = Result<T, EditError>;

/// A rejected edit. The clip keeps its previous valid values.
#[derive(Debug, Error)]
pub enum EditError {
    #[error("Invalid value for {field}: {value}")]
    InvalidNumber { field: &'static str, value: f64 },

    #[error("Trim start {start:.3}s leaves no room before media end {duration:.3}s")]
    TrimOutOfRange { start: f64, duration: f64 },

    #[error("Title size must be positive, got {0}")]
    InvalidTitleSize(u32),

    #[error(transparent)]
    Transition(#[from] TransitionParseError),
}

impl EditError {
    pub fn invalid_number(field: &'static str, value: f64) -> Self {
        Self::InvalidNumber { field, value }
    }
}
