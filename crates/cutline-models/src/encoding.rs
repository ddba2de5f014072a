//! Encoding and render configuration.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Default video codec (H.264)
pub const DEFAULT_VIDEO_CODEC: &str = "libx264";
/// Default audio codec
pub const DEFAULT_AUDIO_CODEC: &str = "aac";
/// Default encoding preset for export
pub const DEFAULT_PRESET: &str = "fast";
/// Default CRF for export
pub const DEFAULT_CRF: u8 = 20;
/// Default audio bitrate for export
pub const DEFAULT_AUDIO_BITRATE: &str = "192k";

/// Cross-dissolve length between transitioned clips, in seconds
pub const DEFAULT_CROSSFADE_DURATION: f64 = 1.0;
/// Offset into the accumulated stream where a transition starts, in seconds
pub const DEFAULT_TRANSITION_OFFSET: f64 = 1.0;
/// Gain applied to background music before mixing
pub const DEFAULT_MUSIC_VOLUME: f64 = 0.6;
/// `amix` dropout transition, in seconds
pub const DEFAULT_DROPOUT_TRANSITION: u32 = 2;

/// Video encoding configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct EncodingConfig {
    /// Video codec (e.g., "libx264")
    #[serde(default = "default_video_codec")]
    pub codec: String,

    /// Encoding preset (e.g., "fast", "veryfast")
    #[serde(default = "default_preset")]
    pub preset: String,

    /// Constant Rate Factor (quality, 0-51, lower is better)
    #[serde(default = "default_crf")]
    pub crf: u8,

    /// Audio codec
    #[serde(default = "default_audio_codec")]
    pub audio_codec: String,

    /// Audio bitrate
    #[serde(default = "default_audio_bitrate")]
    pub audio_bitrate: String,

    /// Additional FFmpeg output arguments
    #[serde(default)]
    pub extra_args: Vec<String>,
}

fn default_video_codec() -> String {
    DEFAULT_VIDEO_CODEC.to_string()
}
fn default_preset() -> String {
    DEFAULT_PRESET.to_string()
}
fn default_crf() -> u8 {
    DEFAULT_CRF
}
fn default_audio_codec() -> String {
    DEFAULT_AUDIO_CODEC.to_string()
}
fn default_audio_bitrate() -> String {
    DEFAULT_AUDIO_BITRATE.to_string()
}

impl Default for EncodingConfig {
    fn default() -> Self {
        Self {
            codec: DEFAULT_VIDEO_CODEC.to_string(),
            preset: DEFAULT_PRESET.to_string(),
            crf: DEFAULT_CRF,
            audio_codec: DEFAULT_AUDIO_CODEC.to_string(),
            audio_bitrate: DEFAULT_AUDIO_BITRATE.to_string(),
            extra_args: Vec::new(),
        }
    }
}

impl EncodingConfig {
    /// Settings for final export renders.
    pub fn for_export() -> Self {
        Self::default()
    }

    /// Settings for the single-clip effect preview (speed over quality).
    pub fn for_effect_preview() -> Self {
        Self {
            preset: "veryfast".to_string(),
            crf: 25,
            audio_bitrate: "128k".to_string(),
            ..Default::default()
        }
    }

    /// Settings for low-resolution proxy transcodes.
    pub fn for_proxy() -> Self {
        Self {
            preset: "veryfast".to_string(),
            crf: 28,
            audio_bitrate: "128k".to_string(),
            ..Default::default()
        }
    }

    /// Returns a new config with updated CRF.
    pub fn with_crf(mut self, crf: u8) -> Self {
        self.crf = crf;
        self
    }

    /// Returns a new config with updated preset.
    pub fn with_preset(mut self, preset: impl Into<String>) -> Self {
        self.preset = preset.into();
        self
    }

    /// Convert to FFmpeg command arguments.
    pub fn to_ffmpeg_args(&self) -> Vec<String> {
        let mut args = vec![
            "-c:v".to_string(),
            self.codec.clone(),
            "-preset".to_string(),
            self.preset.clone(),
            "-crf".to_string(),
            self.crf.to_string(),
            "-c:a".to_string(),
            self.audio_codec.clone(),
            "-b:a".to_string(),
            self.audio_bitrate.clone(),
        ];

        args.extend(self.extra_args.clone());

        args
    }
}

/// Per-stage external tool timeouts, in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct StageTimeouts {
    pub probe: u64,
    pub thumbnail: u64,
    pub waveform: u64,
    pub proxy: u64,
    /// Per-clip render, concat, transition step, music mix and finalize copy
    pub render: u64,
    pub effect_preview: u64,
}

impl Default for StageTimeouts {
    fn default() -> Self {
        Self {
            probe: 5,
            thumbnail: 10,
            waveform: 30,
            proxy: 300,
            render: 300,
            effect_preview: 600,
        }
    }
}

/// Everything the export pipeline needs besides the clips themselves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct RenderConfig {
    pub encoding: EncodingConfig,
    /// Transition length, in seconds
    pub crossfade_duration: f64,
    /// Where each transition starts in the accumulated stream, in seconds
    pub transition_offset: f64,
    /// Background music gain before mixing
    pub music_volume: f64,
    /// `amix` dropout transition, in seconds
    pub dropout_transition: u32,
    pub timeouts: StageTimeouts,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            encoding: EncodingConfig::for_export(),
            crossfade_duration: DEFAULT_CROSSFADE_DURATION,
            transition_offset: DEFAULT_TRANSITION_OFFSET,
            music_volume: DEFAULT_MUSIC_VOLUME,
            dropout_transition: DEFAULT_DROPOUT_TRANSITION,
            timeouts: StageTimeouts::default(),
        }
    }
}
