//! Editing session for the Cutline editor.
//!
//! This crate provides:
//! - The media library and the command-driven editing session
//! - Background preview jobs on a bounded worker pool
//! - A per-asset artifact cache with on-disk invalidation
//! - Project save/load and export orchestration
//! - Structured job logging and Prometheus metrics

pub mod config;
pub mod error;
pub mod library;
pub mod logging;
pub mod luts;
pub mod metrics;
pub mod preview;
pub mod project;
pub mod session;

pub use config::EditorConfig;
pub use error::{EditorError, EditorResult};
pub use library::MediaLibrary;
pub use logging::JobLogger;
pub use luts::list_luts;
pub use preview::{ArtifactCache, JobKind, PreviewEvent, PreviewJobRunner};
pub use session::{CommandOutcome, EditCommand, EditSession, ExportJob, LoadReport};
