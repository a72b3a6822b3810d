//! Keyframe animation with linear interpolation.
//!
//! A [`KeyframeTrack`] holds the samples of one animated property, kept
//! sorted by time with at most one keyframe per time (within
//! [`KEYFRAME_TIME_TOLERANCE`]). Evaluation is pure and safe to call every
//! frame.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Two keyframe times closer than this are considered the same time.
pub const KEYFRAME_TIME_TOLERANCE: f64 = 1e-4;

/// How to interpolate from a keyframe to the next one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Interpolation {
    #[default]
    Linear,
}

/// A single keyframe at a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Keyframe {
    /// Time of this keyframe in seconds, relative to the owning segment's start.
    pub time: f64,
    /// Value at this keyframe.
    pub value: f64,
    #[serde(default)]
    pub interpolation: Interpolation,
}

impl Keyframe {
    /// Create a new linear keyframe.
    pub fn new(time: f64, value: f64) -> Self {
        Self {
            time,
            value,
            interpolation: Interpolation::Linear,
        }
    }
}

/// Evaluate a sorted keyframe list at `time`.
///
/// Returns `default` for an empty list, holds the first/last value outside
/// the keyed range, and interpolates linearly between the bracketing pair.
pub fn value_at(keyframes: &[Keyframe], time: f64, default: f64) -> f64 {
    let (first, last) = match (keyframes.first(), keyframes.last()) {
        (Some(first), Some(last)) => (first, last),
        _ => return default,
    };
    if time <= first.time {
        return first.value;
    }
    if time >= last.time {
        return last.value;
    }

    // first.time < time < last.time, so idx + 1 is always in bounds
    let idx = keyframes
        .partition_point(|kf| kf.time <= time)
        .saturating_sub(1);
    let a = &keyframes[idx];
    let b = &keyframes[idx + 1];
    interpolate(a, b, time)
}

fn interpolate(a: &Keyframe, b: &Keyframe, time: f64) -> f64 {
    let span = b.time - a.time;
    if span <= 0.0 {
        return a.value;
    }
    match a.interpolation {
        Interpolation::Linear => a.value + (time - a.time) / span * (b.value - a.value),
    }
}

/// Outcome of [`KeyframeTrack::toggle`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum KeyframeToggle {
    /// A keyframe was inserted with the given value.
    Inserted(Keyframe),
    /// The keyframe that existed at the time was removed.
    Removed(Keyframe),
}

/// The keyframes of a single animated property.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyframeTrack {
    keyframes: Vec<Keyframe>,
}

impl KeyframeTrack {
    /// Create a new empty keyframe track.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a track from arbitrary keyframes; later duplicates of a time win.
    pub fn from_keyframes(keyframes: impl IntoIterator<Item = Keyframe>) -> Self {
        let mut track = Self::new();
        for kf in keyframes {
            track.set(kf.time, kf.value);
        }
        track
    }

    /// Index of the keyframe at `time`, within tolerance.
    pub fn position(&self, time: f64) -> Option<usize> {
        self.keyframes
            .iter()
            .position(|kf| (kf.time - time).abs() < KEYFRAME_TIME_TOLERANCE)
    }

    /// Insert a keyframe, replacing any keyframe at the same time.
    pub fn set(&mut self, time: f64, value: f64) {
        if let Some(idx) = self.position(time) {
            self.keyframes[idx] = Keyframe::new(self.keyframes[idx].time, value);
            return;
        }
        let pos = self.keyframes.partition_point(|kf| kf.time < time);
        self.keyframes.insert(pos, Keyframe::new(time, value));
    }

    /// Replace the value of the keyframe at `time`. No-op (returns `false`)
    /// when no keyframe exists there.
    pub fn update(&mut self, time: f64, value: f64) -> bool {
        match self.position(time) {
            Some(idx) => {
                self.keyframes[idx].value = value;
                true
            }
            None => false,
        }
    }

    /// Remove the keyframe at `time`.
    pub fn remove(&mut self, time: f64) -> Option<Keyframe> {
        self.position(time).map(|idx| self.keyframes.remove(idx))
    }

    /// Remove the keyframe at `time` if there is one, otherwise insert one
    /// holding `current`.
    pub fn toggle(&mut self, time: f64, current: f64) -> KeyframeToggle {
        match self.remove(time) {
            Some(removed) => KeyframeToggle::Removed(removed),
            None => {
                self.set(time, current);
                KeyframeToggle::Inserted(Keyframe::new(time, current))
            }
        }
    }

    /// Evaluate the track, falling back to `default` when it is empty.
    pub fn value_or(&self, time: f64, default: f64) -> f64 {
        value_at(&self.keyframes, time, default)
    }

    /// Evaluate the track, or `None` when it has no keyframes.
    pub fn value_at(&self, time: f64) -> Option<f64> {
        if self.keyframes.is_empty() {
            None
        } else {
            Some(value_at(&self.keyframes, time, 0.0))
        }
    }

    /// Split the track at `at`: keyframes before `at` stay, keyframes at or
    /// after `at` move to the returned track with times shifted by `-at`.
    ///
    /// Both halves receive a keyframe at the cut holding the value the track
    /// had there, so evaluation on either side is unchanged.
    pub fn split_at(&mut self, at: f64) -> KeyframeTrack {
        if self.keyframes.is_empty() {
            return KeyframeTrack::new();
        }
        let boundary = value_at(&self.keyframes, at, 0.0);

        let idx = self.keyframes.partition_point(|kf| kf.time < at);
        let tail: Vec<Keyframe> = self
            .keyframes
            .split_off(idx)
            .into_iter()
            .map(|kf| Keyframe::new(kf.time - at, kf.value))
            .collect();
        let mut right = KeyframeTrack { keyframes: tail };

        self.set(at, boundary);
        right.set(0.0, boundary);
        right
    }

    /// Drop keyframes outside `[0, duration]`.
    pub fn retain_within(&mut self, duration: f64) {
        self.keyframes.retain(|kf| {
            kf.time >= -KEYFRAME_TIME_TOLERANCE && kf.time <= duration + KEYFRAME_TIME_TOLERANCE
        });
    }

    /// Get all keyframes (read-only).
    pub fn keyframes(&self) -> &[Keyframe] {
        &self.keyframes
    }

    /// Number of keyframes.
    pub fn len(&self) -> usize {
        self.keyframes.len()
    }

    /// Whether the track has no keyframes.
    pub fn is_empty(&self) -> bool {
        self.keyframes.is_empty()
    }
}

impl fmt::Display for KeyframeTrack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KeyframeTrack({} keyframes)", self.keyframes.len())
    }
}

// ── Tests ───────────────────────────────────────────────────────
