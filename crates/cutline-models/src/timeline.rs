//! Ordered clip sequence and global/local time mapping.

use crate::clip::{Clip, ClipId};
use crate::transition::Transition;

/// Splits closer than this to either clip edge (in effective seconds) are ignored.
pub const SPLIT_EDGE_EPSILON: f64 = 0.05;

/// The narrative sequence of clips.
///
/// Clips play back-to-back in vector order; every time computation walks the
/// list accumulating [`Clip::effective_duration`].
#[derive(Debug, Clone, Default)]
pub struct Timeline {
    clips: Vec<Clip>,
}

impl Timeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_clips(clips: Vec<Clip>) -> Self {
        Self { clips }
    }

    pub fn clips(&self) -> &[Clip] {
        &self.clips
    }

    pub fn clips_mut(&mut self) -> impl Iterator<Item = &mut Clip> {
        self.clips.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.clips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }

    pub fn index_of(&self, id: ClipId) -> Option<usize> {
        self.clips.iter().position(|c| c.id() == id)
    }

    pub fn get(&self, id: ClipId) -> Option<&Clip> {
        self.clips.iter().find(|c| c.id() == id)
    }

    pub fn get_mut(&mut self, id: ClipId) -> Option<&mut Clip> {
        self.clips.iter_mut().find(|c| c.id() == id)
    }

    /// Append a clip and return its id.
    pub fn push(&mut self, clip: Clip) -> ClipId {
        let id = clip.id();
        self.clips.push(clip);
        id
    }

    /// Insert at `index`, clamped to the end of the sequence.
    pub fn insert(&mut self, index: usize, clip: Clip) -> ClipId {
        let id = clip.id();
        let index = index.min(self.clips.len());
        self.clips.insert(index, clip);
        id
    }

    pub fn remove(&mut self, id: ClipId) -> Option<Clip> {
        let index = self.index_of(id)?;
        Some(self.clips.remove(index))
    }

    /// Move a clip to a new position. Returns false if the clip is unknown.
    pub fn move_clip(&mut self, id: ClipId, to_index: usize) -> bool {
        let Some(from) = self.index_of(id) else {
            return false;
        };
        let clip = self.clips.remove(from);
        let to = to_index.min(self.clips.len());
        self.clips.insert(to, clip);
        true
    }

    /// Insert a copy right after the original.
    pub fn duplicate(&mut self, id: ClipId) -> Option<ClipId> {
        let index = self.index_of(id)?;
        let copy = self.clips[index].duplicate();
        Some(self.insert(index + 1, copy))
    }

    /// Sum of every clip's effective duration.
    pub fn total_duration(&self) -> f64 {
        self.clips.iter().map(Clip::effective_duration).sum()
    }

    /// Whether export needs pairwise transition assembly.
    pub fn has_crossfade(&self) -> bool {
        self.clips.iter().any(|c| c.transition.is_crossfade())
    }

    /// Find the clip under a global playhead time.
    ///
    /// Spans are half-open, so a time exactly on a boundary belongs to the
    /// later clip. Returns `None` for negative times and past the end.
    pub fn locate(&self, global_seconds: f64) -> Option<(&Clip, f64)> {
        if !global_seconds.is_finite() || global_seconds < 0.0 {
            return None;
        }

        let mut acc = 0.0;
        for clip in &self.clips {
            let duration = clip.effective_duration();
            if global_seconds < acc + duration {
                return Some((clip, global_seconds - acc));
            }
            acc += duration;
        }
        None
    }

    /// Global time at which a clip starts; 0 for the first or an unknown clip.
    pub fn cumulative_start(&self, id: ClipId) -> f64 {
        let mut acc = 0.0;
        for clip in &self.clips {
            if clip.id() == id {
                return acc;
            }
            acc += clip.effective_duration();
        }
        0.0
    }

    /// Resolve a global playhead time to `(clip, raw media timestamp)`.
    pub fn media_time_at(&self, global_seconds: f64) -> Option<(ClipId, f64)> {
        self.locate(global_seconds)
            .map(|(clip, local)| (clip.id(), clip.media_time_at(local)))
    }

    /// Global playhead time for a media timestamp reported by a player
    /// showing `id`.
    pub fn global_time_for_media(&self, id: ClipId, media_seconds: f64) -> Option<f64> {
        let clip = self.get(id)?;
        Some(self.cumulative_start(id) + clip.local_time_for_media(media_seconds))
    }

    /// Split the clip under `global_seconds` in two.
    ///
    /// No-op (returns `None`) past the end, within [`SPLIT_EDGE_EPSILON`]
    /// of either edge of the owning clip, or when the clip's media has no
    /// known duration. Each half of such a clip would get the full still
    /// duration, growing the timeline instead of dividing it.
    pub fn split_at(&mut self, global_seconds: f64) -> Option<(ClipId, ClipId)> {
        let (clip, local) = self.locate(global_seconds)?;
        if clip.media().duration().is_none() {
            return None;
        }
        let duration = clip.effective_duration();
        if local <= SPLIT_EDGE_EPSILON || local >= duration - SPLIT_EDGE_EPSILON {
            return None;
        }

        let index = self.index_of(clip.id())?;
        let split_point = clip.media_time_at(local);
        let (left, right) = clip.split_at_media_time(split_point);
        let ids = (left.id(), right.id());

        self.clips.splice(index..=index, [left, right]);
        Some(ids)
    }

    /// Transition leading out of the clip at `index`; the last clip has none.
    pub fn outgoing_transition(&self, index: usize) -> Transition {
        if index + 1 >= self.clips.len() {
            Transition::None
        } else {
            self.clips[index].transition
        }
    }
}
