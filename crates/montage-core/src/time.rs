//! Time representation for timeline editing.
//!
//! Timeline positions are seconds as `f64`. Persisted values are rounded to
//! millisecond precision with [`round_time`] so that every write path agrees
//! on the same representation.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Shortest duration a segment may have, in seconds.
pub const MIN_SEGMENT_DURATION: f64 = 0.1;

/// Tolerance used when comparing two time values for equality.
pub const TIME_EPSILON: f64 = 1e-4;

/// Round a time value to three decimals (millisecond precision).
#[inline]
pub fn round_time(seconds: f64) -> f64 {
    (seconds * 1000.0).round() / 1000.0
}

/// Half-open span `[start, start + duration)` on the timeline.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TimeRange {
    /// Start time in seconds (inclusive)
    pub start: f64,
    /// Duration of the range in seconds
    pub duration: f64,
}

impl TimeRange {
    #[inline]
    pub fn new(start: f64, duration: f64) -> Self {
        Self { start, duration }
    }

    /// End time (exclusive).
    #[inline]
    pub fn end(self) -> f64 {
        self.start + self.duration
    }

    #[inline]
    pub fn contains(self, time: f64) -> bool {
        time >= self.start && time < self.end()
    }

    /// Like [`contains`](Self::contains) but also true at the end.
    #[inline]
    pub fn contains_inclusive(self, time: f64) -> bool {
        time >= self.start && time <= self.end()
    }

    /// Ranges that only touch do not overlap; contact closer than
    /// [`TIME_EPSILON`] counts as touching.
    pub fn overlaps(self, other: Self) -> bool {
        self.start < other.end() - TIME_EPSILON && other.start < self.end() - TIME_EPSILON
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:.3}s, {:.3}s)", self.start, self.end())
    }
}
