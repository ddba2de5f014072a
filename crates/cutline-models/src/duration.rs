//! Effective-duration arithmetic.
//!
//! Timeline layout, playhead mapping and export all go through
//! [`effective_duration`]; they must never compute clip length any other way.

/// Shortest on-timeline duration a clip may have, in seconds.
pub const MIN_CLIP_DURATION: f64 = 0.2;

/// Base duration used when the asset has no known duration (still images).
pub const DEFAULT_STILL_DURATION: f64 = 5.0;

/// Coerce a playback-rate multiplier into a usable value.
///
/// Non-positive and non-finite inputs become `1.0`.
pub fn normalize_speed(speed: f64) -> f64 {
    if speed.is_finite() && speed > 0.0 {
        speed
    } else {
        1.0
    }
}

/// Raw (pre-speed) duration of a trim window.
///
/// With an unknown media duration the trim window is ignored and the fixed
/// still duration is used.
pub fn base_duration(media_duration: Option<f64>, start: f64, end: Option<f64>) -> f64 {
    match media_duration {
        None => DEFAULT_STILL_DURATION,
        Some(total) => {
            let end = end.unwrap_or(total);
            (end - start).max(MIN_CLIP_DURATION)
        }
    }
}

/// On-timeline duration after trim and speed, floored at [`MIN_CLIP_DURATION`].
pub fn effective_duration(
    media_duration: Option<f64>,
    start: f64,
    end: Option<f64>,
    speed: f64,
) -> f64 {
    let base = base_duration(media_duration, start, end);
    (base / normalize_speed(speed)).max(MIN_CLIP_DURATION)
}
