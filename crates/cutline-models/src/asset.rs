//! Source media assets.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Extensions recognised as video containers.
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "mkv", "avi", "webm"];
/// Extensions recognised as audio files.
pub const AUDIO_EXTENSIONS: &[&str] = &["mp3", "wav", "aac", "m4a", "ogg"];
/// Extensions recognised as still images.
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "gif"];

/// Kind of media, derived from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Video,
    Audio,
    Image,
    #[default]
    Unknown,
}

impl MediaKind {
    /// Detect the media kind from a path's extension (case-insensitive).
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        let ext = path
            .as_ref()
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        match ext.as_deref() {
            Some(e) if VIDEO_EXTENSIONS.contains(&e) => MediaKind::Video,
            Some(e) if AUDIO_EXTENSIONS.contains(&e) => MediaKind::Audio,
            Some(e) if IMAGE_EXTENSIONS.contains(&e) => MediaKind::Image,
            _ => MediaKind::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Video => "video",
            MediaKind::Audio => "audio",
            MediaKind::Image => "image",
            MediaKind::Unknown => "unknown",
        }
    }

    /// Whether a duration probe makes sense for this kind.
    pub fn is_timed(&self) -> bool {
        matches!(self, MediaKind::Video | MediaKind::Audio)
    }

    /// Whether the media can carry an audio stream worth drawing a waveform for.
    pub fn has_audio(&self) -> bool {
        matches!(self, MediaKind::Video | MediaKind::Audio)
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One imported source file.
///
/// Assets are immutable after creation and shared by `Arc` between every
/// clip that places them on the timeline. The duration is probed exactly
/// once by the caller; `None` means "unknown" (images, unknown files, or a
/// failed probe) and every consumer must tolerate it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaAsset {
    path: PathBuf,
    kind: MediaKind,
    duration: Option<f64>,
}

impl MediaAsset {
    /// Create an asset from a path and an already-probed duration.
    ///
    /// Durations are dropped for kinds that are never probed, and negative or
    /// non-finite values are treated as a failed probe.
    pub fn new(path: impl Into<PathBuf>, duration: Option<f64>) -> Self {
        let path = path.into();
        let kind = MediaKind::from_path(&path);
        let duration = if kind.is_timed() {
            duration.filter(|d| d.is_finite() && *d >= 0.0)
        } else {
            None
        };

        Self { path, kind, duration }
    }

    /// Source path; this is the asset's identity key.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn kind(&self) -> MediaKind {
        self.kind
    }

    /// Probed container duration in seconds.
    pub fn duration(&self) -> Option<f64> {
        self.duration
    }

    /// File name for display.
    pub fn name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.to_string_lossy().into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_from_extension() {
        assert_eq!(MediaKind::from_path("a/b/clip.MP4"), MediaKind::Video);
        assert_eq!(MediaKind::from_path("song.m4a"), MediaKind::Audio);
        assert_eq!(MediaKind::from_path("still.jpeg"), MediaKind::Image);
        assert_eq!(MediaKind::from_path("notes.txt"), MediaKind::Unknown);
        assert_eq!(MediaKind::from_path("no_extension"), MediaKind::Unknown);
    }

    #[test]
    fn test_duration_dropped_for_untimed_kinds() {
        let image = MediaAsset::new("still.png", Some(12.0));
        assert_eq!(image.kind(), MediaKind::Image);
        assert!(image.duration().is_none());

        let video = MediaAsset::new("clip.mov", Some(12.0));
        assert_eq!(video.duration(), Some(12.0));
    }

    #[test]
    fn test_invalid_probe_values_become_unknown() {
        assert!(MediaAsset::new("clip.mp4", Some(f64::NAN)).duration().is_none());
        assert!(MediaAsset::new("clip.mp4", Some(-1.0)).duration().is_none());
    }

    #[test]
    fn test_name() {
        let asset = MediaAsset::new("/media/holiday.mkv", None);
        assert_eq!(asset.name(), "holiday.mkv");
    }
}
