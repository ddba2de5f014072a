//! The work each preview job performs.
//!
//! Jobs operate on a snapshot of the clip and return the updated snapshot;
//! the session merges the artifacts back into the live clip.

use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;

use cutline_media::{
    effect_preview_path, generate_image_thumbnail, generate_proxy, generate_thumbnails,
    generate_waveform, render_effect_preview, FilterChainBuilder, MediaResult,
};
use cutline_media::waveform::WAVEFORM_FILE_NAME;
use cutline_models::{Clip, MediaKind, MIN_CLIP_DURATION};

use crate::config::EditorConfig;
use crate::logging::JobLogger;
use crate::preview::cache::ArtifactCache;

/// Kind of preview job. At most one result per (clip, kind) is current.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    /// Thumbnails, waveform and, when enabled, the asset proxy
    Decorations,
    /// Baked LUT/title/speed render of the trimmed window
    EffectPreview,
    /// Proxy transcode on request
    Proxy,
}

impl JobKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobKind::Decorations => "decorations",
            JobKind::EffectPreview => "effect_preview",
            JobKind::Proxy => "proxy",
        }
    }
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Start and length of the window thumbnails and waveform cover.
///
/// This is the raw trim window, not the speed-scaled one.
pub fn decoration_window(clip: &Clip) -> (f64, f64) {
    let start = clip.start();
    let media_duration = clip.media().duration().unwrap_or(0.0);
    let end = clip.end().unwrap_or(media_duration);
    let length = if end > start { end - start } else { media_duration };
    (start, length.max(MIN_CLIP_DURATION))
}

/// Thumbnails, waveform and optional proxy for one clip.
///
/// Never fails: anything that cannot be produced is simply left unset.
/// Cached artifacts are reused per asset even if they were generated for
/// another clip's trim window.
pub async fn decorate(mut clip: Clip, config: &EditorConfig, cache: &ArtifactCache) -> Clip {
    let logger = JobLogger::for_clip(&clip.id(), JobKind::Decorations.as_str());
    let media = clip.media().clone();
    let asset = media.path();
    let timeouts = &config.render.timeouts;

    if let Some(waveform) = cache.waveform(asset).await {
        clip.artifacts.waveform_path = Some(waveform);
    }
    if let Some(thumbnails) = cache.thumbnails(asset).await {
        clip.artifacts.thumbnail_paths = thumbnails;
    }
    let wants_waveform = media.kind().has_audio();
    if !clip.artifacts.thumbnail_paths.is_empty()
        && (clip.artifacts.waveform_path.is_some() || !wants_waveform)
        && !config.proxy_enabled
    {
        debug!(clip_id = %clip.id(), "Decorations served from cache");
        return clip;
    }

    let clip_dir = config.clip_preview_dir(&clip.id());
    if let Err(e) = tokio::fs::create_dir_all(&clip_dir).await {
        logger.log_warning(&format!("Cannot create preview directory: {}", e));
        return clip;
    }
    clip.artifacts.preview_dir = Some(clip_dir.clone());

    let proxy_dir = config.proxy_dir();
    let proxy = if config.proxy_enabled && media.kind() == MediaKind::Video {
        cache
            .proxy_or_compute(asset, || {
                generate_proxy(
                    asset,
                    &proxy_dir,
                    config.proxy_width,
                    &config.proxy_encoding,
                    timeouts.proxy,
                )
            })
            .await
    } else {
        None
    };
    let source: PathBuf = proxy.clone().unwrap_or_else(|| asset.to_path_buf());
    let (start, length) = decoration_window(&clip);

    if clip.artifacts.thumbnail_paths.is_empty() {
        clip.artifacts.thumbnail_paths = cache
            .thumbnails_or_compute(asset, || thumbnails_for(&source, media.kind(), &clip_dir, start, length, config))
            .await;
    }

    if clip.artifacts.waveform_path.is_none() && wants_waveform {
        let waveform_path = clip_dir.join(WAVEFORM_FILE_NAME);
        clip.artifacts.waveform_path = cache
            .waveform_or_compute(asset, || {
                generate_waveform(
                    &source,
                    &waveform_path,
                    start,
                    length,
                    &config.waveform,
                    timeouts.waveform,
                )
            })
            .await;
    }

    if proxy.is_some() {
        clip.artifacts.proxy_path = proxy;
    }

    if clip.artifacts.thumbnail_paths.is_empty() && clip.artifacts.waveform_path.is_none() {
        logger.log_warning("No thumbnails or waveform produced");
    }
    clip
}

async fn thumbnails_for(
    source: &Path,
    kind: MediaKind,
    clip_dir: &Path,
    start: f64,
    length: f64,
    config: &EditorConfig,
) -> Vec<PathBuf> {
    let timeout = config.render.timeouts.thumbnail;
    match kind {
        MediaKind::Video => {
            generate_thumbnails(
                source,
                clip_dir,
                start,
                length,
                config.thumbnail_count,
                config.thumbnail_width,
                timeout,
            )
            .await
        }
        MediaKind::Image => generate_image_thumbnail(source, clip_dir, config.thumbnail_width, timeout)
            .await
            .into_iter()
            .collect(),
        MediaKind::Audio | MediaKind::Unknown => Vec::new(),
    }
}

/// Render the clip's baked effect preview for `generation`.
pub async fn bake_effect_preview(
    mut clip: Clip,
    config: &EditorConfig,
    filters: &FilterChainBuilder,
    generation: u64,
) -> MediaResult<Clip> {
    let clip_dir = clip
        .artifacts
        .preview_dir
        .clone()
        .unwrap_or_else(|| config.clip_preview_dir(&clip.id()));
    let chains = filters.build(&clip);
    for warning in &chains.warnings {
        debug!(clip_id = %clip.id(), "{}", warning);
    }

    let output = effect_preview_path(&clip_dir, generation);
    let rendered = render_effect_preview(
        &clip,
        &chains,
        &output,
        &config.preview_encoding,
        config.render.timeouts.effect_preview,
    )
    .await?;

    clip.artifacts.preview_dir = Some(clip_dir);
    clip.artifacts.effect_preview_path = Some(rendered);
    Ok(clip)
}

/// Transcode (or reuse) the proxy for the clip's asset and attach it.
pub async fn attach_proxy(mut clip: Clip, config: &EditorConfig, cache: &ArtifactCache) -> Clip {
    let media = clip.media().clone();
    if media.kind() != MediaKind::Video {
        return clip;
    }

    let asset = media.path();
    let proxy_dir = config.proxy_dir();
    clip.artifacts.proxy_path = cache
        .proxy_or_compute(asset, || {
            generate_proxy(
                asset,
                &proxy_dir,
                config.proxy_width,
                &config.proxy_encoding,
                config.render.timeouts.proxy,
            )
        })
        .await;
    clip
}
