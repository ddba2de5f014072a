//! Background preview artifacts: the per-asset cache, the jobs and the pool running them.

pub mod cache;
pub mod jobs;
pub mod runner;

pub use cache::ArtifactCache;
pub use jobs::{decoration_window, JobKind};
pub use runner::{PreviewEvent, PreviewJobRunner};
