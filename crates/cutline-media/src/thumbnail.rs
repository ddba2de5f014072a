//! Timeline thumbnails.

use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::filters::scale_to_width;

/// Evenly spaced timestamps across `[start, start + duration)`.
pub fn thumbnail_timestamps(start: f64, duration: f64, count: u32) -> Vec<f64> {
    if duration <= 0.0 || count == 0 {
        return Vec::new();
    }
    let interval = duration / f64::from(count);
    (0..count).map(|i| start + f64::from(i) * interval).collect()
}

/// File name of the `index`-th thumbnail.
pub fn thumbnail_file_name(index: usize) -> String {
    format!("thumb_{:02}.jpg", index)
}

/// Command extracting one scaled frame at `timestamp`.
pub fn frame_command(source: &Path, timestamp: f64, width: u32, output: &Path) -> FfmpegCommand {
    FfmpegCommand::new(source, output)
        .seek(timestamp)
        .single_frame()
        .video_filter(scale_to_width(width))
}

/// Extract `count` thumbnails across a window of a video.
///
/// Frames that fail to extract are skipped; the result may be shorter than
/// `count` or empty.
pub async fn generate_thumbnails(
    source: &Path,
    output_dir: &Path,
    start: f64,
    duration: f64,
    count: u32,
    width: u32,
    timeout_secs: u64,
) -> Vec<PathBuf> {
    let runner = FfmpegRunner::new()
        .with_timeout(timeout_secs)
        .with_operation("thumbnail");
    let mut paths = Vec::new();

    for (i, timestamp) in thumbnail_timestamps(start, duration, count).into_iter().enumerate() {
        let output = output_dir.join(thumbnail_file_name(i));
        let cmd = frame_command(source, timestamp, width, &output);

        match runner.run(&cmd).await {
            Ok(()) if output.exists() => paths.push(output),
            Ok(()) => debug!(timestamp, "No frame extracted at timestamp"),
            Err(e) => warn!(source = %source.display(), timestamp, "Thumbnail failed: {}", e),
        }
    }

    paths
}

/// Single thumbnail of a still image.
pub async fn generate_image_thumbnail(
    image: &Path,
    output_dir: &Path,
    width: u32,
    timeout_secs: u64,
) -> Option<PathBuf> {
    let output = output_dir.join(thumbnail_file_name(0));
    let cmd = FfmpegCommand::new(image, &output)
        .loop_input()
        .single_frame()
        .video_filter(scale_to_width(width));

    let result = FfmpegRunner::new()
        .with_timeout(timeout_secs)
        .with_operation("thumbnail")
        .run(&cmd)
        .await;

    match result {
        Ok(()) if output.exists() => Some(output),
        Ok(()) => None,
        Err(e) => {
            warn!(image = %image.display(), "Image thumbnail failed: {}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamps_evenly_spaced() {
        let stamps = thumbnail_timestamps(2.0, 6.0, 6);
        assert_eq!(stamps, vec![2.0, 3.0, 4.0, 5.0, 6.0, 7.0]);
    }

    #[test]
    fn test_degenerate_window() {
        assert!(thumbnail_timestamps(0.0, 0.0, 6).is_empty());
        assert!(thumbnail_timestamps(0.0, 5.0, 0).is_empty());
    }

    #[test]
    fn test_frame_command() {
        let args = frame_command(Path::new("a.mp4"), 1.5, 240, Path::new("thumb_03.jpg")).build_args();
        assert!(args.contains(&"scale=240:-2".to_string()));
        assert!(args.contains(&"1.500".to_string()));
        assert!(args.contains(&"-frames:v".to_string()));
        assert_eq!(thumbnail_file_name(3), "thumb_03.jpg");
    }
}
