//! Shared data models for the Cutline editor.
//!
//! This crate provides the pure, I/O-free half of the editor:
//! - Media assets and their probed metadata
//! - Timeline clips and the effective-duration arithmetic
//! - Transition styles
//! - The ordered timeline and its global/local time mapping
//! - Encoding and render configuration
//! - The persisted project file schema

pub mod asset;
pub mod clip;
pub mod duration;
pub mod encoding;
pub mod error;
pub mod project;
pub mod timeline;
pub mod transition;

// Re-export common types
pub use asset::{MediaAsset, MediaKind};
pub use clip::{Clip, ClipArtifacts, ClipId, DEFAULT_TITLE_POSITION, DEFAULT_TITLE_SIZE, LUT_NONE};
pub use duration::{
    effective_duration, normalize_speed, DEFAULT_STILL_DURATION, MIN_CLIP_DURATION,
};
pub use encoding::{EncodingConfig, RenderConfig, StageTimeouts};
pub use error::{EditError, EditResult};
pub use project::{ClipRecord, ProjectFile};
pub use timeline::{Timeline, SPLIT_EDGE_EPSILON};
pub use transition::Transition;
