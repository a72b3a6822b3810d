//! Transitions anchored to a segment edge.

use montage_core::{round_time, TimeRange};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{TimelineError, TimelineResult};
use crate::id::{LayerIndex, SegmentId, TransitionId};
use crate::segment::Segment;

/// Transition effect type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransitionKind {
    Fade,
    Slide,
    Wipe,
    Zoom,
    Rotate,
    Push,
}

impl TransitionKind {
    pub const ALL: [TransitionKind; 6] = [
        TransitionKind::Fade,
        TransitionKind::Slide,
        TransitionKind::Wipe,
        TransitionKind::Zoom,
        TransitionKind::Rotate,
        TransitionKind::Push,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Fade => "Fade",
            Self::Slide => "Slide",
            Self::Wipe => "Wipe",
            Self::Zoom => "Zoom",
            Self::Rotate => "Rotate",
            Self::Push => "Push",
        }
    }

    /// Direction used when none is given.
    pub fn default_direction(self) -> Direction {
        match self {
            Self::Zoom => Direction::In,
            Self::Rotate => Direction::Right,
            _ => Direction::Left,
        }
    }
}

impl fmt::Display for TransitionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Which edge of the segment the transition is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Boundary {
    /// Incoming, plays from the segment start
    Start,
    /// Outgoing, plays up to the segment end
    End,
}

/// Direction parameter of directional transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Left,
    Right,
    Top,
    Bottom,
    In,
    Out,
}

/// A transition attached to one edge of one segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transition {
    pub id: TransitionId,
    pub segment_id: SegmentId,
    pub layer: LayerIndex,
    pub boundary: Boundary,
    #[serde(rename = "type")]
    pub kind: TransitionKind,
    /// Duration in seconds
    pub duration: f64,
    pub timeline_start_time: f64,
    pub direction: Direction,
}

impl Transition {
    /// Create a transition on `boundary` of `segment`.
    ///
    /// The duration is limited to the segment's own duration.
    pub fn anchored(
        segment: &Segment,
        boundary: Boundary,
        kind: TransitionKind,
        duration: f64,
        direction: Option<Direction>,
    ) -> TimelineResult<Self> {
        if !(duration > 0.0) {
            return Err(TimelineError::InvalidTransitionDuration(duration));
        }
        let mut transition = Self {
            id: TransitionId::new(),
            segment_id: segment.id.clone(),
            layer: segment.layer,
            boundary,
            kind,
            duration: round_time(duration),
            timeline_start_time: 0.0,
            direction: direction.unwrap_or_else(|| kind.default_direction()),
        };
        transition.reanchor(segment);
        Ok(transition)
    }

    pub fn end_time(&self) -> f64 {
        self.timeline_start_time + self.duration
    }

    pub fn range(&self) -> TimeRange {
        TimeRange::new(self.timeline_start_time, self.duration)
    }

    /// Whether the transition plays at `time`. Both ends are inclusive.
    pub fn is_active(&self, time: f64) -> bool {
        self.range().contains_inclusive(time)
    }

    /// Progress through the transition at `time`, clamped to [0, 1].
    pub fn progress(&self, time: f64) -> f64 {
        ((time - self.timeline_start_time) / self.duration).clamp(0.0, 1.0)
    }

    /// Recompute placement from the segment's current edges.
    pub fn reanchor(&mut self, segment: &Segment) {
        self.segment_id = segment.id.clone();
        self.layer = segment.layer;
        self.duration = self.duration.min(segment.duration);
        self.timeline_start_time = match self.boundary {
            Boundary::Start => segment.start_time,
            Boundary::End => round_time(segment.end_time() - self.duration),
        };
    }

    pub fn validate(&self) -> TimelineResult<()> {
        if !(self.duration > 0.0) {
            return Err(TimelineError::InvalidTransitionDuration(self.duration));
        }
        Ok(())
    }
}
