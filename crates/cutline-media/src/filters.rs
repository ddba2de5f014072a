//! FFmpeg filter expressions.
//!
//! [`FilterChainBuilder`] turns a clip's edit parameters into the ordered
//! visual and audio stages applied to its trimmed segment. Export and the
//! effect preview both go through it so they render identically.

use std::path::{Path, PathBuf};
use tracing::warn;

use cutline_models::{normalize_speed, Clip};

/// Largest ratio a single `atempo` stage accepts.
pub const ATEMPO_MAX: f64 = 2.0;
/// Smallest ratio a single `atempo` stage accepts.
pub const ATEMPO_MIN: f64 = 0.5;

/// Pixels between the title baseline and the bottom edge.
const TITLE_BOTTOM_MARGIN: u32 = 40;

/// Ordered filter stages for one clip.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterChains {
    /// Visual stages (`-vf`)
    pub video: Vec<String>,
    /// Audio stages (`-af`)
    pub audio: Vec<String>,
    /// Non-fatal problems hit while building, e.g. a missing LUT
    pub warnings: Vec<String>,
}

impl FilterChains {
    /// Joined `-vf` graph, if there are visual stages.
    pub fn video_graph(&self) -> Option<String> {
        (!self.video.is_empty()).then(|| self.video.join(","))
    }

    /// Joined `-af` graph, if there are audio stages.
    pub fn audio_graph(&self) -> Option<String> {
        (!self.audio.is_empty()).then(|| self.audio.join(","))
    }

    pub fn is_empty(&self) -> bool {
        self.video.is_empty() && self.audio.is_empty()
    }
}

/// Builds [`FilterChains`] for clips, resolving LUT names against a directory.
#[derive(Debug, Clone)]
pub struct FilterChainBuilder {
    lut_dir: PathBuf,
}

impl FilterChainBuilder {
    pub fn new(lut_dir: impl Into<PathBuf>) -> Self {
        Self {
            lut_dir: lut_dir.into(),
        }
    }

    pub fn lut_dir(&self) -> &Path {
        &self.lut_dir
    }

    /// Build the stages for a clip: LUT, then title, then speed.
    pub fn build(&self, clip: &Clip) -> FilterChains {
        let mut chains = FilterChains::default();

        if let Some(lut) = clip.lut.as_deref() {
            let lut_path = self.lut_dir.join(lut);
            if lut_path.exists() {
                chains.video.push(lut_filter(&lut_path));
            } else {
                let message = format!("LUT not found, skipping color grade: {}", lut_path.display());
                warn!(clip_id = %clip.id(), lut = %lut, "{}", message);
                chains.warnings.push(message);
            }
        }

        if !clip.title.is_empty() {
            chains
                .video
                .push(title_filter(&clip.title, clip.title_size, &clip.title_position));
        }

        let speed = normalize_speed(clip.speed());
        if speed != 1.0 {
            chains.video.push(setpts_filter(speed));
            chains.audio.extend(atempo_stages(speed));
        }

        chains
    }
}

/// 3D LUT color grade stage.
pub fn lut_filter(lut_path: &Path) -> String {
    format!("lut3d=file='{}'", escape_filter_path(&lut_path.to_string_lossy()))
}

/// Bottom-anchored white title with a drop shadow.
pub fn title_filter(text: &str, size: u32, x_position: &str) -> String {
    format!(
        "drawtext=text='{}':fontcolor=white:fontsize={size}:x={x_position}:y=(h-{size}-{margin}):shadowcolor=black:shadowx=2:shadowy=2",
        escape_title_text(text),
        margin = TITLE_BOTTOM_MARGIN,
    )
}

/// Presentation-timestamp scaling for a playback rate.
pub fn setpts_filter(speed: f64) -> String {
    format!("setpts=PTS/{}", speed)
}

/// Decompose a playback rate into `atempo` ratios each within
/// [`ATEMPO_MIN`]..=[`ATEMPO_MAX`].
///
/// The product of the returned ratios equals the (normalized) input.
pub fn tempo_chain(speed: f64) -> Vec<f64> {
    let mut remaining = normalize_speed(speed);
    let mut chain = Vec::new();

    while remaining > ATEMPO_MAX {
        chain.push(ATEMPO_MAX);
        remaining /= ATEMPO_MAX;
    }
    while remaining < ATEMPO_MIN {
        chain.push(ATEMPO_MIN);
        remaining /= ATEMPO_MIN;
    }
    chain.push(remaining);

    chain
}

/// `atempo` stages for a playback rate, in application order.
pub fn atempo_stages(speed: f64) -> Vec<String> {
    let chain = tempo_chain(speed);
    let last = chain.len() - 1;

    chain
        .iter()
        .enumerate()
        .map(|(i, ratio)| {
            if i < last {
                format!("atempo={:.1}", ratio)
            } else {
                format!("atempo={:.6}", ratio)
            }
        })
        .collect()
}

/// Escape a title for a single-quoted `drawtext` value.
pub fn escape_title_text(text: &str) -> String {
    text.replace('\'', "\\'")
}

/// Escape a path for use inside a single-quoted filter option.
pub fn escape_filter_path(path: &str) -> String {
    path.replace('\\', "\\\\").replace('\'', "\\'").replace(':', "\\:")
}

/// Scale to a width, keeping aspect ratio with an even height.
pub fn scale_to_width(width: u32) -> String {
    format!("scale={}:-2", width)
}

/// Waveform image of the first audio stream over a solid background.
pub fn waveform_graph(width: u32, height: u32, foreground: &str, background: &str) -> String {
    format!(
        "[0:a]showwavespic=s={w}x{h}:colors={foreground}[fg];color=s={w}x{h}:color={background}[bg];[bg][fg]overlay=format=auto",
        w = width,
        h = height,
    )
}

/// Join two inputs end to end, video and audio.
pub fn concat_pair_graph() -> &'static str {
    "[0:v][0:a][1:v][1:a]concat=n=2:v=1:a=1[v][a]"
}

/// Video-only transition from input 0 into input 1.
pub fn xfade_graph(transition: &str, duration: f64, offset: f64) -> String {
    format!(
        "[0:v][1:v]xfade=transition={}:duration={}:offset={},format=yuv420p",
        transition, duration, offset
    )
}

/// Additive mix of a video's audio with a pre-attenuated music track.
pub fn music_mix_graph(dropout_transition: u32) -> String {
    format!(
        "[0:a]volume=1[a0];[1:a]volume=1[a1];[a0][a1]amix=inputs=2:duration=longest:dropout_transition={}[aout]",
        dropout_transition
    )
}
