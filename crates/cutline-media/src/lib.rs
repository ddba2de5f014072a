#![deny(unreachable_patterns)]
//! FFmpeg CLI wrapper for the Cutline editor.
//!
//! This crate provides:
//! - Type-safe FFmpeg command building and a runner with timeouts
//! - Progress parsing from `-progress pipe:2`
//! - Duration probing through FFprobe
//! - Filter chains for clip edits (LUT, title, speed)
//! - Preview artifacts: thumbnails, waveforms, proxies, effect previews
//! - The project export pipeline

pub mod command;
pub mod concat;
pub mod effect_preview;
pub mod error;
pub mod export;
pub mod filters;
pub mod fs_utils;
pub mod metrics;
pub mod probe;
pub mod progress;
pub mod proxy;
pub mod segment;
pub mod thumbnail;
pub mod waveform;

pub use command::{check_ffmpeg, check_ffprobe, FfmpegCommand, FfmpegRunner};
pub use concat::{safe_path_for_concat, unescape_concat_path};
pub use effect_preview::{effect_preview_path, render_effect_preview};
pub use error::{MediaError, MediaResult};
pub use export::{AssemblyMode, ExportReport, ExportStage, RenderPipeline};
pub use filters::{tempo_chain, FilterChainBuilder, FilterChains};
pub use probe::{probe_duration, probe_duration_strict};
pub use progress::FfmpegProgress;
pub use proxy::{generate_proxy, proxy_path_for};
pub use thumbnail::{generate_image_thumbnail, generate_thumbnails};
pub use waveform::{generate_waveform, WaveformStyle};
