//! Filtered single-segment renders.
//!
//! Both the per-clip export render and the effect preview cut one window out
//! of a source, run it through the clip's [`FilterChains`] and re-encode it.

use std::path::Path;

use cutline_models::{EncodingConfig, MediaKind, DEFAULT_STILL_DURATION};

use crate::command::FfmpegCommand;
use crate::filters::FilterChains;

/// Silent stereo track paired with still images so every segment has audio.
const SILENT_AUDIO_SOURCE: &str = "anullsrc=channel_layout=stereo:sample_rate=44100";

/// Portion of a source to read, in source seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentWindow {
    pub start: f64,
    /// `None` reads to the end of the source
    pub duration: Option<f64>,
}

impl SegmentWindow {
    pub fn new(start: f64, duration: Option<f64>) -> Self {
        Self { start, duration }
    }
}

/// Build the render command for one segment.
///
/// Still images are looped for the window's duration (or the default still
/// duration) and get a silent audio track.
pub fn segment_command(
    source: &Path,
    kind: MediaKind,
    window: SegmentWindow,
    chains: &FilterChains,
    encoding: &EncodingConfig,
    output: &Path,
) -> FfmpegCommand {
    let mut cmd = FfmpegCommand::new(source, output);

    if kind == MediaKind::Image {
        let length = window.duration.unwrap_or(DEFAULT_STILL_DURATION);
        cmd = cmd
            .loop_input()
            .duration(length)
            .input(SILENT_AUDIO_SOURCE)
            .format("lavfi")
            .duration(length)
            .map("0:v")
            .map("1:a")
            .output_args(["-pix_fmt", "yuv420p"]);
    } else {
        if window.start > 0.0 {
            cmd = cmd.seek(window.start);
        }
        if let Some(duration) = window.duration {
            cmd = cmd.duration(duration);
        }
    }

    if let Some(vf) = chains.video_graph() {
        cmd = cmd.video_filter(vf);
    }
    if let Some(af) = chains.audio_graph() {
        cmd = cmd.audio_filter(af);
    }

    cmd.output_args(encoding.to_ffmpeg_args())
}
