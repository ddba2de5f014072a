//! Editor configuration.

use std::path::PathBuf;
use std::str::FromStr;

use cutline_media::WaveformStyle;
use cutline_models::{EncodingConfig, RenderConfig};

/// Editor configuration.
#[derive(Debug, Clone)]
pub struct EditorConfig {
    /// Root for preview directories and proxies
    pub temp_root: PathBuf,
    /// Directory scanned for `.cube` LUT files
    pub lut_dir: PathBuf,
    /// Maximum preview jobs running at once
    pub max_preview_jobs: usize,
    /// Thumbnails per clip
    pub thumbnail_count: u32,
    /// Thumbnail width in pixels
    pub thumbnail_width: u32,
    pub waveform: WaveformStyle,
    /// Generate a proxy for every imported video
    pub proxy_enabled: bool,
    /// Proxy width in pixels
    pub proxy_width: u32,
    /// Run background preview jobs at all; batch tools turn this off
    pub previews_enabled: bool,
    /// Re-render the baked effect preview after edits
    pub effect_preview_enabled: bool,
    pub preview_encoding: EncodingConfig,
    pub proxy_encoding: EncodingConfig,
    /// Export settings, including every stage timeout
    pub render: RenderConfig,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            temp_root: std::env::temp_dir().join("cutline"),
            lut_dir: PathBuf::from("luts"),
            max_preview_jobs: 3,
            thumbnail_count: 6,
            thumbnail_width: 240,
            waveform: WaveformStyle::default(),
            proxy_enabled: false,
            proxy_width: 640,
            previews_enabled: true,
            effect_preview_enabled: true,
            preview_encoding: EncodingConfig::for_effect_preview(),
            proxy_encoding: EncodingConfig::for_proxy(),
            render: RenderConfig::default(),
        }
    }
}

impl EditorConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let mut render = defaults.render.clone();
        render.crossfade_duration = env_or("CUTLINE_CROSSFADE_DURATION", render.crossfade_duration);
        render.transition_offset = env_or("CUTLINE_TRANSITION_OFFSET", render.transition_offset);
        render.music_volume = env_or("CUTLINE_MUSIC_VOLUME", render.music_volume);
        render.encoding.crf = env_or("CUTLINE_EXPORT_CRF", render.encoding.crf);
        if let Ok(preset) = std::env::var("CUTLINE_EXPORT_PRESET") {
            render.encoding.preset = preset;
        }
        render.timeouts.probe = env_or("CUTLINE_PROBE_TIMEOUT", render.timeouts.probe);
        render.timeouts.render = env_or("CUTLINE_RENDER_TIMEOUT", render.timeouts.render);
        render.timeouts.proxy = env_or("CUTLINE_PROXY_TIMEOUT", render.timeouts.proxy);
        render.timeouts.effect_preview =
            env_or("CUTLINE_EFFECT_PREVIEW_TIMEOUT", render.timeouts.effect_preview);

        let mut waveform = defaults.waveform.clone();
        waveform.width = env_or("CUTLINE_WAVEFORM_WIDTH", waveform.width);
        waveform.height = env_or("CUTLINE_WAVEFORM_HEIGHT", waveform.height);

        Self {
            temp_root: std::env::var("CUTLINE_TEMP_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.temp_root),
            lut_dir: std::env::var("CUTLINE_LUT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.lut_dir),
            max_preview_jobs: env_or("CUTLINE_PREVIEW_WORKERS", defaults.max_preview_jobs).max(1),
            thumbnail_count: env_or("CUTLINE_THUMBNAIL_COUNT", defaults.thumbnail_count),
            thumbnail_width: env_or("CUTLINE_THUMBNAIL_WIDTH", defaults.thumbnail_width),
            waveform,
            proxy_enabled: env_or("CUTLINE_PROXY_ENABLED", defaults.proxy_enabled),
            proxy_width: env_or("CUTLINE_PROXY_WIDTH", defaults.proxy_width),
            previews_enabled: env_or("CUTLINE_PREVIEWS", defaults.previews_enabled),
            effect_preview_enabled: env_or("CUTLINE_EFFECT_PREVIEW", defaults.effect_preview_enabled),
            preview_encoding: defaults.preview_encoding,
            proxy_encoding: defaults.proxy_encoding,
            render,
        }
    }

    /// Preview directory for one clip.
    pub fn clip_preview_dir(&self, clip_id: &cutline_models::ClipId) -> PathBuf {
        self.temp_root.join(format!("clip_{}", clip_id.0.simple()))
    }

    /// Directory holding per-asset proxies.
    pub fn proxy_dir(&self) -> PathBuf {
        self.temp_root.join("proxies")
    }

    /// Directory export work directories are created under.
    pub fn export_work_dir(&self) -> PathBuf {
        self.temp_root.join("export")
    }
}

/// Parse `key` from the environment, falling back to `default` when unset or malformed.
fn env_or<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}
