//! Low-resolution proxy transcodes.
//!
//! Proxies are per asset: one file per source path and width, shared by
//! every clip of that asset.

use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use cutline_models::EncodingConfig;

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::filters::scale_to_width;
use crate::fs_utils::{move_file, remove_file_if_exists};

/// `<stem>_proxy_<width>w.mp4` inside `output_dir`.
pub fn proxy_path_for(media: &Path, output_dir: &Path, width: u32) -> PathBuf {
    let stem = media
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "media".to_string());
    output_dir.join(format!("{}_proxy_{}w.mp4", stem, width))
}

/// Command transcoding the whole source at `width`.
pub fn proxy_command(media: &Path, width: u32, encoding: &EncodingConfig, output: &Path) -> FfmpegCommand {
    FfmpegCommand::new(media, output)
        .video_filter(scale_to_width(width))
        .output_args(encoding.to_ffmpeg_args())
}

/// Return the proxy for `media`, transcoding it if it does not exist yet.
///
/// The transcode writes to a side file and is renamed into place, so an
/// interrupted run never leaves a truncated proxy that would be reused.
pub async fn generate_proxy(
    media: &Path,
    output_dir: &Path,
    width: u32,
    encoding: &EncodingConfig,
    timeout_secs: u64,
) -> Option<PathBuf> {
    let proxy = proxy_path_for(media, output_dir, width);
    if proxy.exists() {
        debug!(proxy = %proxy.display(), "Reusing existing proxy");
        return Some(proxy);
    }

    if let Err(e) = tokio::fs::create_dir_all(output_dir).await {
        warn!(dir = %output_dir.display(), "Cannot create proxy directory: {}", e);
        return None;
    }

    let partial = proxy.with_extension("partial.mp4");
    let cmd = proxy_command(media, width, encoding, &partial);
    let result = FfmpegRunner::new()
        .with_timeout(timeout_secs)
        .with_operation("proxy")
        .run(&cmd)
        .await;

    if let Err(e) = result {
        warn!(media = %media.display(), "Proxy transcode failed: {}", e);
        let _ = remove_file_if_exists(&partial).await;
        return None;
    }

    match move_file(&partial, &proxy).await {
        Ok(()) => {
            info!(media = %media.display(), proxy = %proxy.display(), "Proxy ready");
            Some(proxy)
        }
        Err(e) => {
            warn!(media = %media.display(), "Cannot place proxy: {}", e);
            None
        }
    }
}
