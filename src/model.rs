use std::time::{SystemTime, UNIX_EPOCH};

use crate::{
    ease::Ease,
    error::{KeylineError, KeylineResult},
    value::{Value, interpolate},
};

/// Milliseconds from sequence start.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct TimeMs(pub u64);

impl TimeMs {
    pub const ZERO: TimeMs = TimeMs(0);

    pub fn as_f64(self) -> f64 {
        self.0 as f64
    }
}

/// The fixed set of animatable element properties.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub enum Property {
    PositionX,
    PositionY,
    Width,
    Height,
    Rotation,
    Scale,
    ScaleX,
    ScaleY,
    Opacity,
    Fill,
    Stroke,
    StrokeWidth,
    BorderRadius,
    Blur,
    Shadow,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Keyframe {
    pub id: String,
    pub time: TimeMs,
    pub value: Value,
    /// Easing for the segment from this keyframe to the next one in time order.
    pub easing: Ease,
}

/// One property's animation on one external element.
///
/// The element is a weak reference: the engine never creates, deletes, or
/// assumes the lifetime of whatever `element_id` names.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Track {
    pub id: String,
    pub element_id: String,
    pub property: Property,
    /// Sorted ascending by `time`; no two keyframes share a time.
    pub keyframes: Vec<Keyframe>,
    pub enabled: bool,
}

impl Track {
    pub fn new(element_id: impl Into<String>, property: Property) -> Self {
        Self {
            id: fresh_id(),
            element_id: element_id.into(),
            property,
            keyframes: Vec::new(),
            enabled: true,
        }
    }

    /// Insert a keyframe, keeping the list sorted. Inserting at a time that
    /// already holds a keyframe overwrites its value and easing in place
    /// (same id, same count). Returns the id of the affected keyframe.
    pub fn insert_keyframe(&mut self, time: TimeMs, value: Value, easing: Ease) -> String {
        let idx = self.keyframes.partition_point(|k| k.time < time);
        if let Some(existing) = self.keyframes.get_mut(idx)
            && existing.time == time
        {
            existing.value = value;
            existing.easing = easing;
            return existing.id.clone();
        }
        let kf = Keyframe {
            id: fresh_id(),
            time,
            value,
            easing,
        };
        let id = kf.id.clone();
        self.keyframes.insert(idx, kf);
        id
    }

    /// Overwrite a keyframe's value and easing. `false` if the id is stale.
    pub fn update_keyframe(&mut self, keyframe_id: &str, value: Value, easing: Ease) -> bool {
        match self.keyframes.iter_mut().find(|k| k.id == keyframe_id) {
            Some(kf) => {
                kf.value = value;
                kf.easing = easing;
                true
            }
            None => false,
        }
    }

    /// Move a keyframe to a new time, clamped into `[0, max_time]` and
    /// optionally snapped to the nearest multiple of `snap_ms`. Landing on
    /// another keyframe's time replaces that keyframe. `false` if the id is
    /// stale.
    pub fn move_keyframe(
        &mut self,
        keyframe_id: &str,
        new_time: TimeMs,
        max_time: TimeMs,
        snap_ms: Option<u64>,
    ) -> bool {
        let Some(pos) = self.keyframes.iter().position(|k| k.id == keyframe_id) else {
            return false;
        };

        let mut t = new_time.0.min(max_time.0);
        if let Some(grid) = snap_ms
            && grid > 0
        {
            t = ((t + grid / 2) / grid) * grid;
            t = t.min(max_time.0);
        }

        let mut kf = self.keyframes.remove(pos);
        kf.time = TimeMs(t);
        self.keyframes.retain(|k| k.time != kf.time);
        let idx = self.keyframes.partition_point(|k| k.time < kf.time);
        self.keyframes.insert(idx, kf);
        true
    }

    /// Remove a keyframe by id. `false` if the id is stale.
    pub fn remove_keyframe(&mut self, keyframe_id: &str) -> bool {
        let before = self.keyframes.len();
        self.keyframes.retain(|k| k.id != keyframe_id);
        self.keyframes.len() != before
    }

    pub fn max_keyframe_time(&self) -> TimeMs {
        self.keyframes
            .last()
            .map(|k| k.time)
            .unwrap_or(TimeMs::ZERO)
    }

    /// Sampled value at `t` milliseconds.
    ///
    /// - no keyframes: `None` (absence, not zero)
    /// - one keyframe: that value for all `t`
    /// - outside the keyframed span: clamped to the boundary value
    /// - between two keyframes: interpolated with the earlier key's easing
    pub fn value_at(&self, t: f64) -> Option<Value> {
        if self.keyframes.is_empty() {
            return None;
        }

        let idx = self.keyframes.partition_point(|k| k.time.as_f64() <= t);
        if idx == 0 {
            return Some(self.keyframes[0].value.clone());
        }
        if idx >= self.keyframes.len() {
            return Some(self.keyframes[self.keyframes.len() - 1].value.clone());
        }

        let prev = &self.keyframes[idx - 1];
        let next = &self.keyframes[idx];
        let denom = next.time.as_f64() - prev.time.as_f64();
        if denom <= 0.0 {
            // Cannot occur while the unique-time invariant holds.
            return Some(next.value.clone());
        }

        let p = (t - prev.time.as_f64()) / denom;
        Some(interpolate(&prev.value, &next.value, p, prev.easing))
    }

    pub fn validate(&self) -> KeylineResult<()> {
        if self.element_id.trim().is_empty() {
            return Err(KeylineError::validation(format!(
                "track '{}' has an empty element id",
                self.id
            )));
        }
        if !self.keyframes.windows(2).all(|w| w[0].time < w[1].time) {
            return Err(KeylineError::validation(format!(
                "track '{}' keyframes must be strictly ascending by time",
                self.id
            )));
        }
        Ok(())
    }
}

/// A named timeline: a duration and the tracks evaluated against it.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Sequence {
    pub id: String,
    pub name: String,
    pub duration: TimeMs,
    #[serde(rename = "loop")]
    pub looped: bool,
    pub auto_play: bool,
    /// Pass-through attribute; the engine does not schedule around it.
    pub delay: TimeMs,
    pub tracks: Vec<Track>,
}

impl Sequence {
    pub fn new(name: impl Into<String>, duration: TimeMs) -> Self {
        Self {
            id: fresh_id(),
            name: name.into(),
            duration,
            looped: false,
            auto_play: false,
            delay: TimeMs::ZERO,
            tracks: Vec::new(),
        }
    }

    pub fn track(&self, track_id: &str) -> Option<&Track> {
        self.tracks.iter().find(|t| t.id == track_id)
    }

    pub fn track_mut(&mut self, track_id: &str) -> Option<&mut Track> {
        self.tracks.iter_mut().find(|t| t.id == track_id)
    }

    pub fn max_keyframe_time(&self) -> TimeMs {
        self.tracks
            .iter()
            .map(Track::max_keyframe_time)
            .max()
            .unwrap_or(TimeMs::ZERO)
    }

    /// Grow `duration` to cover the latest keyframe. Never shrinks.
    pub fn reconcile_duration(&mut self) {
        let max = self.max_keyframe_time();
        if max > self.duration {
            self.duration = max;
        }
    }

    /// Deep copy with fresh ids for the sequence, every track, and every
    /// keyframe. All non-id fields are preserved.
    pub fn duplicate(&self) -> Sequence {
        let mut copy = self.clone();
        copy.id = fresh_id();
        for track in &mut copy.tracks {
            track.id = fresh_id();
            for kf in &mut track.keyframes {
                kf.id = fresh_id();
            }
        }
        copy
    }

    pub fn validate(&self) -> KeylineResult<()> {
        for track in &self.tracks {
            track.validate()?;
        }
        if self.max_keyframe_time() > self.duration {
            return Err(KeylineError::validation(format!(
                "sequence '{}' has keyframes past its duration",
                self.id
            )));
        }
        Ok(())
    }
}

/// Root container and unit of persistence. One per engine instance.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Project {
    pub sequences: Vec<Sequence>,
    pub active_sequence: Option<String>,
    pub frame_rate: u32,
    pub created_at_ms: u64,
    pub updated_at_ms: u64,
}

impl Project {
    pub fn new() -> Self {
        let now = now_epoch_ms();
        Self {
            sequences: Vec::new(),
            active_sequence: None,
            frame_rate: 60,
            created_at_ms: now,
            updated_at_ms: now,
        }
    }

    pub fn sequence(&self, sequence_id: &str) -> Option<&Sequence> {
        self.sequences.iter().find(|s| s.id == sequence_id)
    }

    pub fn sequence_mut(&mut self, sequence_id: &str) -> Option<&mut Sequence> {
        self.sequences.iter_mut().find(|s| s.id == sequence_id)
    }

    pub fn active(&self) -> Option<&Sequence> {
        let id = self.active_sequence.as_deref()?;
        self.sequence(id)
    }

    pub fn validate(&self) -> KeylineResult<()> {
        if self.frame_rate == 0 {
            return Err(KeylineError::validation("frame_rate must be > 0"));
        }
        for seq in &self.sequences {
            seq.validate()?;
        }
        if let Some(id) = &self.active_sequence
            && self.sequence(id).is_none()
        {
            return Err(KeylineError::validation(format!(
                "active sequence '{id}' does not exist"
            )));
        }
        Ok(())
    }
}

impl Default for Project {
    fn default() -> Self {
        Self::new()
    }
}

pub fn fresh_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

pub fn now_epoch_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
