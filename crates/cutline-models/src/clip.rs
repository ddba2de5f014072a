//! Timeline clips.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use uuid::Uuid;

use crate::asset::MediaAsset;
use crate::duration::{self, MIN_CLIP_DURATION};
use crate::error::{EditError, EditResult};
use crate::transition::Transition;

/// Default title font size in points.
pub const DEFAULT_TITLE_SIZE: u32 = 36;

/// Default title x-anchor: horizontally centered.
pub const DEFAULT_TITLE_POSITION: &str = "(w-text_w)/2";

/// Name used for "no LUT" in project files and menus.
pub const LUT_NONE: &str = "none";

/// Unique identifier for a clip instance on the timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClipId(pub Uuid);

impl ClipId {
    /// Generate a new random clip ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ClipId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ClipId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Derived files produced in the background for a clip.
///
/// None of these are needed for a correct export; they only speed up or
/// decorate the interactive session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClipArtifacts {
    /// Per-clip scratch directory
    pub preview_dir: Option<PathBuf>,
    /// Evenly spaced thumbnails across the trim window
    pub thumbnail_paths: Vec<PathBuf>,
    /// Waveform image for the trim window
    pub waveform_path: Option<PathBuf>,
    /// Low-resolution transcode of the whole asset
    pub proxy_path: Option<PathBuf>,
    /// Rendered segment with LUT/title/speed baked in
    pub effect_preview_path: Option<PathBuf>,
}

impl ClipArtifacts {
    /// Whether both timeline decorations are present.
    pub fn has_decorations(&self) -> bool {
        !self.thumbnail_paths.is_empty() && self.waveform_path.is_some()
    }
}

/// One placed, edited instance of a [`MediaAsset`].
///
/// The trim window and speed are private so the invariants hold:
/// `speed > 0`, `end >= start + MIN_CLIP_DURATION`, and `end` never exceeds
/// the probed media duration.
#[derive(Debug, Clone)]
pub struct Clip {
    id: ClipId,
    media: Arc<MediaAsset>,
    start: f64,
    end: Option<f64>,
    speed: f64,
    /// Overlay text; empty means no title
    pub title: String,
    /// Overlay font size in points
    pub title_size: u32,
    /// Horizontal anchor expression for the overlay
    pub title_position: String,
    /// LUT file name inside the LUT directory
    pub lut: Option<String>,
    /// Hand-off into the next clip
    pub transition: Transition,
    /// Lane index
    pub track: u32,
    pub artifacts: ClipArtifacts,
}

impl Clip {
    /// Place an asset on the timeline with default edit parameters.
    pub fn new(media: Arc<MediaAsset>) -> Self {
        Self {
            id: ClipId::new(),
            media,
            start: 0.0,
            end: None,
            speed: 1.0,
            title: String::new(),
            title_size: DEFAULT_TITLE_SIZE,
            title_position: DEFAULT_TITLE_POSITION.to_string(),
            lut: None,
            transition: Transition::None,
            track: 0,
            artifacts: ClipArtifacts::default(),
        }
    }

    pub fn id(&self) -> ClipId {
        self.id
    }

    pub fn media(&self) -> &Arc<MediaAsset> {
        &self.media
    }

    /// Trim start in media seconds.
    pub fn start(&self) -> f64 {
        self.start
    }

    /// Trim end in media seconds; `None` runs to the end of the media.
    pub fn end(&self) -> Option<f64> {
        self.end
    }

    /// Playback-rate multiplier, always positive.
    pub fn speed(&self) -> f64 {
        self.speed
    }

    /// LUT name as stored on disk, `"none"` when unset.
    pub fn lut_name(&self) -> &str {
        self.lut.as_deref().unwrap_or(LUT_NONE)
    }

    /// Set the LUT by name; `"none"` or an empty name clears it.
    pub fn set_lut_name(&mut self, name: &str) {
        let name = name.trim();
        self.lut = if name.is_empty() || name.eq_ignore_ascii_case(LUT_NONE) {
            None
        } else {
            Some(name.to_string())
        };
    }

    /// Apply a trim window.
    ///
    /// `start` is clamped at zero. Without an explicit `end` the window runs to
    /// the probed duration (or stays open if unknown). An explicit `end` is
    /// capped at the probed duration and kept at least [`MIN_CLIP_DURATION`]
    /// after `start`. On error nothing changes.
    pub fn set_trim(&mut self, start: f64, end: Option<f64>) -> EditResult<()> {
        if !start.is_finite() {
            return Err(EditError::invalid_number("start", start));
        }
        if let Some(e) = end.filter(|e| !e.is_finite()) {
            return Err(EditError::invalid_number("end", e));
        }

        let start = start.max(0.0);
        let total = self.media.duration();

        if let Some(total) = total {
            if start + MIN_CLIP_DURATION > total {
                return Err(EditError::TrimOutOfRange { start, duration: total });
            }
        }

        let end = match (end, total) {
            (None, total) => total,
            (Some(e), total) => Some(e.min(total.unwrap_or(e)).max(start + MIN_CLIP_DURATION)),
        };

        self.start = start;
        self.end = end;
        Ok(())
    }

    /// Set the playback rate, coercing invalid input to `1.0`.
    ///
    /// Returns the value actually applied.
    pub fn set_speed(&mut self, speed: f64) -> f64 {
        self.speed = duration::normalize_speed(speed);
        self.speed
    }

    /// Raw (pre-speed) length of the trim window.
    pub fn base_duration(&self) -> f64 {
        duration::base_duration(self.media.duration(), self.start, self.end)
    }

    /// On-timeline duration after trim and speed.
    pub fn effective_duration(&self) -> f64 {
        duration::effective_duration(self.media.duration(), self.start, self.end, self.speed)
    }

    /// Explicit trim length for the external tool's `-t`, if the window is closed.
    pub fn trim_duration(&self) -> Option<f64> {
        self.end
            .filter(|end| *end > self.start)
            .map(|end| end - self.start)
    }

    /// Media timestamp shown at `local` seconds into this clip's effective span.
    pub fn media_time_at(&self, local: f64) -> f64 {
        self.start + local * self.speed
    }

    /// Offset into the effective span for a media timestamp (inverse of [`Clip::media_time_at`]).
    pub fn local_time_for_media(&self, media_seconds: f64) -> f64 {
        ((media_seconds - self.start) / self.speed).max(0.0)
    }

    /// Copy this clip's edits into a fresh clip with its own identity.
    ///
    /// Derived artifacts are not carried over.
    pub fn duplicate(&self) -> Self {
        Self {
            id: ClipId::new(),
            artifacts: ClipArtifacts::default(),
            ..self.clone()
        }
    }

    /// Partition the trim window at an absolute media timestamp.
    ///
    /// The left half ends mid-sequence so it gets a hard cut; the right half
    /// keeps this clip's transition. Callers are responsible for rejecting
    /// split points too close to either edge.
    pub fn split_at_media_time(&self, media_time: f64) -> (Clip, Clip) {
        let mut left = self.duplicate();
        left.end = Some(media_time);
        left.transition = Transition::None;

        let mut right = self.duplicate();
        right.start = media_time;
        right.end = self.end;
        right.transition = self.transition;

        (left, right)
    }

    /// Restore a trim window and speed exactly as persisted.
    ///
    /// Used when loading a project; values are sanitized but not re-clamped
    /// against the media so an old project reproduces its saved timing.
    pub(crate) fn restore_window(&mut self, start: f64, end: Option<f64>, speed: f64) {
        self.start = if start.is_finite() { start.max(0.0) } else { 0.0 };
        self.end = end.filter(|e| e.is_finite());
        self.speed = duration::normalize_speed(speed);
    }

    /// Forget the baked effect preview after an edit that changes its content.
    pub fn invalidate_effect_preview(&mut self) {
        self.artifacts.effect_preview_path = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn video(duration: f64) -> Arc<MediaAsset> {
        Arc::new(MediaAsset::new("/media/clip.mp4", Some(duration)))
    }

    #[test]
    fn test_defaults() {
        let clip = Clip::new(video(10.0));
        assert_eq!(clip.start(), 0.0);
        assert!(clip.end().is_none());
        assert_eq!(clip.speed(), 1.0);
        assert_eq!(clip.title_size, 36);
        assert_eq!(clip.title_position, "(w-text_w)/2");
        assert_eq!(clip.lut_name(), "none");
        assert!(clip.transition.is_none());
    }

    #[test]
    fn test_trim_caps_end_at_media_duration() {
        let mut clip = Clip::new(video(10.0));
        clip.set_trim(2.0, Some(25.0)).unwrap();
        assert_eq!(clip.start(), 2.0);
        assert_eq!(clip.end(), Some(10.0));
    }

    #[test]
    fn test_trim_enforces_min_duration() {
        let mut clip = Clip::new(video(10.0));
        clip.set_trim(4.0, Some(4.05)).unwrap();
        assert!((clip.end().unwrap() - 4.2).abs() < 1e-9);
    }

    #[test]
    fn test_trim_without_end_uses_media_duration() {
        let mut clip = Clip::new(video(10.0));
        clip.set_trim(-3.0, None).unwrap();
        assert_eq!(clip.start(), 0.0);
        assert_eq!(clip.end(), Some(10.0));
    }

    #[test]
    fn test_invalid_trim_keeps_previous_window() {
        let mut clip = Clip::new(video(10.0));
        clip.set_trim(1.0, Some(5.0)).unwrap();

        assert!(clip.set_trim(f64::NAN, Some(6.0)).is_err());
        assert!(clip.set_trim(2.0, Some(f64::INFINITY)).is_err());
        assert!(clip.set_trim(11.0, None).is_err());

        assert_eq!(clip.start(), 1.0);
        assert_eq!(clip.end(), Some(5.0));
    }

    #[test]
    fn test_speed_coercion() {
        let mut clip = Clip::new(video(10.0));
        assert_eq!(clip.set_speed(0.0), 1.0);
        assert_eq!(clip.set_speed(2.5), 2.5);
        assert!((clip.effective_duration() - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_media_time_round_trip() {
        let mut clip = Clip::new(video(20.0));
        clip.set_trim(4.0, Some(12.0)).unwrap();
        clip.set_speed(2.0);

        let media = clip.media_time_at(1.5);
        assert!((media - 7.0).abs() < 1e-9);
        assert!((clip.local_time_for_media(media) - 1.5).abs() < 1e-9);
        assert_eq!(clip.local_time_for_media(1.0), 0.0);
    }

    #[test]
    fn test_duplicate_drops_artifacts() {
        let mut clip = Clip::new(video(10.0));
        clip.title = "Intro".to_string();
        clip.artifacts.waveform_path = Some(PathBuf::from("/tmp/wave.png"));

        let copy = clip.duplicate();
        assert_ne!(copy.id(), clip.id());
        assert_eq!(copy.title, "Intro");
        assert!(copy.artifacts.waveform_path.is_none());
    }

    #[test]
    fn test_split_partitions_window() {
        let mut clip = Clip::new(video(10.0));
        clip.set_trim(0.0, Some(10.0)).unwrap();
        clip.transition = Transition::WipeLeft;
        clip.set_lut_name("teal.cube");
        clip.artifacts.thumbnail_paths = vec![PathBuf::from("/tmp/t.jpg")];

        let (left, right) = clip.split_at_media_time(4.0);
        assert_eq!((left.start(), left.end()), (0.0, Some(4.0)));
        assert_eq!((right.start(), right.end()), (4.0, Some(10.0)));
        assert_eq!(left.transition, Transition::None);
        assert_eq!(right.transition, Transition::WipeLeft);
        assert_eq!(left.lut_name(), "teal.cube");
        assert!(left.artifacts.thumbnail_paths.is_empty());
        assert!(right.artifacts.thumbnail_paths.is_empty());
    }

    #[test]
    fn test_lut_name_none_clears() {
        let mut clip = Clip::new(video(10.0));
        clip.set_lut_name("warm.cube");
        assert_eq!(clip.lut.as_deref(), Some("warm.cube"));
        clip.set_lut_name("None");
        assert!(clip.lut.is_none());
    }
}
