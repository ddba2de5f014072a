//! Persisted project file.
//!
//! A flat JSON document listing the media library, the ordered timeline and
//! the optional background music track. Reading is lenient: missing fields
//! take their defaults, an unknown transition becomes a hard cut and a
//! null or non-numeric number falls back to its default (`1.0` for speed).

use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

use crate::asset::MediaAsset;
use crate::clip::{Clip, DEFAULT_TITLE_POSITION, DEFAULT_TITLE_SIZE, LUT_NONE};
use crate::transition::Transition;

/// Top-level project document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ProjectFile {
    /// Absolute paths of every imported asset
    #[serde(default)]
    pub media: Vec<PathBuf>,

    /// Clip records in timeline order
    #[serde(default)]
    pub timeline: Vec<ClipRecord>,

    /// Background music mixed under the whole export
    #[serde(default)]
    pub bg_music: Option<PathBuf>,
}

impl ProjectFile {
    /// Parse a project document.
    pub fn from_json(data: &str) -> serde_json::Result<Self> {
        serde_json::from_str(data)
    }

    /// Serialize as indented JSON.
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// JSON schema of the document.
    pub fn schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(ProjectFile)
    }
}

/// One clip as stored on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ClipRecord {
    pub media_path: PathBuf,

    #[serde(default, deserialize_with = "lenient_start")]
    pub start: f64,

    #[serde(default, deserialize_with = "lenient_end")]
    pub end: Option<f64>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,

    #[serde(default = "default_title_size", deserialize_with = "lenient_title_size")]
    pub title_size: u32,

    #[serde(default = "default_title_pos", deserialize_with = "null_as_title_pos")]
    pub title_pos: String,

    #[serde(default, deserialize_with = "lenient_track")]
    pub track: u32,

    #[serde(default = "default_lut", deserialize_with = "null_as_lut")]
    pub lut: String,

    #[serde(default = "default_transition", deserialize_with = "null_as_transition")]
    pub transition: String,

    #[serde(default)]
    pub proxy_path: Option<PathBuf>,

    #[serde(default = "default_speed", deserialize_with = "lenient_speed")]
    #[schemars(with = "f64")]
    pub speed: f64,
}

fn default_title_size() -> u32 {
    DEFAULT_TITLE_SIZE
}
fn default_title_pos() -> String {
    DEFAULT_TITLE_POSITION.to_string()
}
fn default_lut() -> String {
    LUT_NONE.to_string()
}
fn default_transition() -> String {
    Transition::None.as_str().to_string()
}
fn default_speed() -> f64 {
    1.0
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn null_as_title_pos<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_else(default_title_pos))
}

fn null_as_lut<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_else(default_lut))
}

fn null_as_transition<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_else(default_transition))
}

/// A number or a numeric string; `None` for null or anything else.
fn lenient_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    let value = serde_json::Value::deserialize(deserializer)?;
    let number = match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    Ok(number.filter(|n| n.is_finite()))
}

/// Whole non-negative count, truncating fractions (`36.0` is `36`).
fn lenient_count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u32>, D::Error> {
    Ok(lenient_number(deserializer)?
        .filter(|n| *n >= 0.0 && *n <= f64::from(u32::MAX))
        .map(|n| n.trunc() as u32))
}

/// Anything non-numeric is `1.0`.
fn lenient_speed<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    Ok(lenient_number(deserializer)?.unwrap_or(1.0))
}

fn lenient_start<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    Ok(lenient_number(deserializer)?.unwrap_or(0.0))
}

fn lenient_end<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    lenient_number(deserializer)
}

fn lenient_title_size<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    Ok(lenient_count(deserializer)?.unwrap_or(DEFAULT_TITLE_SIZE))
}

fn lenient_track<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    Ok(lenient_count(deserializer)?.unwrap_or(0))
}

impl ClipRecord {
    /// Snapshot a clip for saving.
    pub fn from_clip(clip: &Clip) -> Self {
        Self {
            media_path: clip.media().path().to_path_buf(),
            start: clip.start(),
            end: clip.end(),
            title: clip.title.clone(),
            title_size: clip.title_size,
            title_pos: clip.title_position.clone(),
            track: clip.track,
            lut: clip.lut_name().to_string(),
            transition: clip.transition.as_str().to_string(),
            proxy_path: clip.artifacts.proxy_path.clone(),
            speed: clip.speed(),
        }
    }

    /// Rebuild a clip against an already-resolved asset.
    ///
    /// A stored proxy is only reattached if the file still exists.
    pub fn to_clip(&self, media: Arc<MediaAsset>) -> Clip {
        let mut clip = Clip::new(media);
        clip.restore_window(self.start, self.end, self.speed);
        clip.title = self.title.clone();
        clip.title_size = if self.title_size == 0 {
            DEFAULT_TITLE_SIZE
        } else {
            self.title_size
        };
        clip.title_position = self.title_pos.clone();
        clip.track = self.track;
        clip.set_lut_name(&self.lut);
        clip.transition = self.transition.parse().unwrap_or_default();
        clip.artifacts.proxy_path = self.proxy_path.clone().filter(|p| p.exists());
        clip
    }
}
