//! Clip-to-clip transition styles.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// How a clip hands off to the clip after it.
///
/// A transition belongs to the *outgoing* clip and has no meaning on the last
/// clip of the timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "lowercase")]
pub enum Transition {
    /// Hard cut
    #[default]
    None,
    /// Cross-dissolve
    #[serde(alias = "fade")]
    Crossfade,
    WipeLeft,
    WipeRight,
    WipeUp,
    WipeDown,
    SlideLeft,
    SlideRight,
    CircleOpen,
    CircleClose,
}

impl Transition {
    /// Every selectable transition, in menu order.
    pub const ALL: &'static [Transition] = &[
        Transition::None,
        Transition::Crossfade,
        Transition::WipeLeft,
        Transition::WipeRight,
        Transition::WipeUp,
        Transition::WipeDown,
        Transition::SlideLeft,
        Transition::SlideRight,
        Transition::CircleOpen,
        Transition::CircleClose,
    ];

    /// Name as stored in project files.
    pub fn as_str(&self) -> &'static str {
        match self {
            Transition::None => "none",
            Transition::Crossfade => "crossfade",
            Transition::WipeLeft => "wipeleft",
            Transition::WipeRight => "wiperight",
            Transition::WipeUp => "wipeup",
            Transition::WipeDown => "wipedown",
            Transition::SlideLeft => "slideleft",
            Transition::SlideRight => "slideright",
            Transition::CircleOpen => "circleopen",
            Transition::CircleClose => "circleclose",
        }
    }

    /// Name of the `xfade` transition implementing this style.
    ///
    /// Returns `None` for a hard cut.
    pub fn xfade_name(&self) -> Option<&'static str> {
        match self {
            Transition::None => None,
            Transition::Crossfade => Some("fade"),
            other => Some(other.as_str()),
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Transition::None)
    }

    /// Whether this transition switches export into pairwise transition assembly.
    pub fn is_crossfade(&self) -> bool {
        matches!(self, Transition::Crossfade)
    }
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Transition {
    type Err = TransitionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "" | "none" => Ok(Transition::None),
            "crossfade" | "fade" => Ok(Transition::Crossfade),
            "wipeleft" => Ok(Transition::WipeLeft),
            "wiperight" => Ok(Transition::WipeRight),
            "wipeup" => Ok(Transition::WipeUp),
            "wipedown" => Ok(Transition::WipeDown),
            "slideleft" => Ok(Transition::SlideLeft),
            "slideright" => Ok(Transition::SlideRight),
            "circleopen" => Ok(Transition::CircleOpen),
            "circleclose" => Ok(Transition::CircleClose),
            _ => Err(TransitionParseError(s.to_string())),
        }
    }
}

#[derive(Debug, Error)]
#[error("Unknown transition: {0}")]
pub struct TransitionParseError(pub String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_aliases() {
        assert_eq!("fade".parse::<Transition>().unwrap(), Transition::Crossfade);
        assert_eq!("Crossfade".parse::<Transition>().unwrap(), Transition::Crossfade);
        assert_eq!("".parse::<Transition>().unwrap(), Transition::None);
        assert!("spin".parse::<Transition>().is_err());
    }

    #[test]
    fn test_round_trip_names() {
        for t in Transition::ALL {
            assert_eq!(t.as_str().parse::<Transition>().unwrap(), *t);
        }
    }

    #[test]
    fn test_xfade_names() {
        assert_eq!(Transition::None.xfade_name(), None);
        assert_eq!(Transition::Crossfade.xfade_name(), Some("fade"));
        assert_eq!(Transition::CircleOpen.xfade_name(), Some("circleopen"));
    }

    #[test]
    fn test_serde_alias() {
        let t: Transition = serde_json::from_str("\"fade\"").unwrap();
        assert_eq!(t, Transition::Crossfade);
        assert_eq!(serde_json::to_string(&Transition::WipeUp).unwrap(), "\"wipeup\"");
    }
}
