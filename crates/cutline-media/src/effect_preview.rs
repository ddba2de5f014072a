//! Single-clip effect preview renders.

use std::path::{Path, PathBuf};
use tracing::debug;

use cutline_models::{Clip, EncodingConfig, MediaKind, DEFAULT_STILL_DURATION};

use crate::command::FfmpegRunner;
use crate::error::{MediaError, MediaResult};
use crate::filters::FilterChains;
use crate::segment::{segment_command, SegmentWindow};

/// File name of the baked preview inside a clip's preview directory.
pub const EFFECT_PREVIEW_FILE_NAME: &str = "effect_preview.mp4";

/// Preview file for one render generation of a clip.
///
/// Generation 0 uses the plain name; later generations get their own file
/// so a superseded render never overwrites the current one.
pub fn effect_preview_path(output_dir: &Path, generation: u64) -> PathBuf {
    if generation == 0 {
        output_dir.join(EFFECT_PREVIEW_FILE_NAME)
    } else {
        output_dir.join(format!("effect_preview_{}.mp4", generation))
    }
}

/// Shortest preview segment, in seconds.
const MIN_PREVIEW_DURATION: f64 = 0.1;

/// Source file and window for a clip's effect preview.
///
/// Prefers the proxy when one is attached and still on disk.
pub fn preview_source(clip: &Clip) -> (PathBuf, MediaKind, SegmentWindow) {
    let (source, kind) = match clip.artifacts.proxy_path.as_ref().filter(|p| p.exists()) {
        Some(proxy) => (proxy.clone(), MediaKind::Video),
        None => (clip.media().path().to_path_buf(), clip.media().kind()),
    };

    let start = clip.start();
    let duration = match clip.end() {
        Some(end) => end - start,
        None => clip
            .media()
            .duration()
            .map(|total| total - start)
            .unwrap_or(DEFAULT_STILL_DURATION),
    };

    (
        source,
        kind,
        SegmentWindow::new(start, Some(duration.max(MIN_PREVIEW_DURATION))),
    )
}

/// Render the clip's trimmed window with its filters baked in.
///
/// Returns `output` once the file is on disk.
pub async fn render_effect_preview(
    clip: &Clip,
    chains: &FilterChains,
    output: &Path,
    encoding: &EncodingConfig,
    timeout_secs: u64,
) -> MediaResult<PathBuf> {
    if let Some(parent) = output.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let (source, kind, window) = preview_source(clip);
    debug!(clip_id = %clip.id(), source = %source.display(), "Rendering effect preview");

    let cmd = segment_command(&source, kind, window, chains, encoding, output);
    FfmpegRunner::new()
        .with_timeout(timeout_secs)
        .with_operation("effect_preview")
        .run(&cmd)
        .await?;

    if !output.exists() {
        return Err(MediaError::FileNotFound(output.to_path_buf()));
    }

    Ok(output.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cutline_models::MediaAsset;
    use std::sync::Arc;

    #[test]
    fn test_window_from_trim() {
        let mut clip = Clip::new(Arc::new(MediaAsset::new("/m/a.mp4", Some(10.0))));
        clip.set_trim(3.0, Some(7.5)).unwrap();

        let (source, kind, window) = preview_source(&clip);
        assert_eq!(source, PathBuf::from("/m/a.mp4"));
        assert_eq!(kind, MediaKind::Video);
        assert_eq!(window, SegmentWindow::new(3.0, Some(4.5)));
    }

    #[test]
    fn test_window_without_end() {
        let clip = Clip::new(Arc::new(MediaAsset::new("/m/a.mp4", Some(8.0))));
        assert_eq!(preview_source(&clip).2.duration, Some(8.0));

        let unknown = Clip::new(Arc::new(MediaAsset::new("/m/broken.mp4", None)));
        assert_eq!(preview_source(&unknown).2.duration, Some(5.0));
    }

    #[test]
    fn test_generation_paths_are_distinct() {
        let dir = Path::new("/tmp/clip_1");
        assert_eq!(effect_preview_path(dir, 0), dir.join("effect_preview.mp4"));
        assert_eq!(effect_preview_path(dir, 3), dir.join("effect_preview_3.mp4"));
    }

    #[test]
    fn test_stale_proxy_falls_back_to_source() {
        let mut clip = Clip::new(Arc::new(MediaAsset::new("/m/a.mp4", Some(8.0))));
        clip.artifacts.proxy_path = Some(PathBuf::from("/nonexistent/a_proxy_640w.mp4"));
        assert_eq!(preview_source(&clip).0, PathBuf::from("/m/a.mp4"));

        let dir = tempfile::tempdir().unwrap();
        let proxy = dir.path().join("a_proxy_640w.mp4");
        std::fs::write(&proxy, b"x").unwrap();
        clip.artifacts.proxy_path = Some(proxy.clone());
        assert_eq!(preview_source(&clip).0, proxy);
    }
}
