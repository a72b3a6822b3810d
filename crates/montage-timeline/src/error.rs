//! Timeline model errors.

use std::fmt;
use thiserror::Error;

use crate::id::{LayerIndex, SegmentId, TransitionId};
use crate::segment::{Property, SegmentKind};

/// Axis of a crop constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CropAxis {
    Horizontal,
    Vertical,
}

impl fmt::Display for CropAxis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Horizontal => f.write_str("left + right"),
            Self::Vertical => f.write_str("top + bottom"),
        }
    }
}

/// Reasons a timeline mutation is rejected. A rejected mutation leaves the
/// timeline untouched.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TimelineError {
    #[error("Segment not found: {0}")]
    SegmentNotFound(SegmentId),

    #[error("Segment already exists: {0}")]
    DuplicateSegment(SegmentId),

    #[error("Transition not found: {0}")]
    TransitionNotFound(TransitionId),

    #[error("Crop inset {value} is outside [0, 100]")]
    CropOutOfRange { value: f64 },

    #[error("Crop {axis} is {sum}, must stay below 100")]
    CropTooLarge { axis: CropAxis, sum: f64 },

    #[error("Speed {0} is outside [0.1, 5.0]")]
    SpeedOutOfRange(f64),

    #[error("Opacity {0} is outside [0, 1]")]
    OpacityOutOfRange(f64),

    #[error("Duration {0:.3}s is below the 0.1s minimum")]
    DurationTooShort(f64),

    #[error("Start time {0:.3}s is negative")]
    NegativeStart(f64),

    #[error("Source window [{start:.3}, {end:.3}] is invalid")]
    InvalidSourceWindow { start: f64, end: f64 },

    #[error("Source window of {window:.3}s does not match duration x speed ({expected:.3}s)")]
    SourceWindowMismatch { window: f64, expected: f64 },

    #[error("Segment {segment} overlaps {other} on layer {layer}")]
    Overlap {
        segment: SegmentId,
        other: SegmentId,
        layer: LayerIndex,
    },

    #[error("Layer {layer} cannot hold {kind} segments")]
    LayerKindMismatch { layer: LayerIndex, kind: SegmentKind },

    #[error("Split at {at:.3}s is within 0.1s of an edge of {segment}")]
    SplitAtEdge { segment: SegmentId, at: f64 },

    #[error("Keyframe at {time:.3}s is outside the segment's {duration:.3}s")]
    KeyframeOutOfRange { time: f64, duration: f64 },

    #[error("No {property} keyframe at {time:.3}s")]
    KeyframeNotFound { property: Property, time: f64 },

    #[error("{property} is not animatable on {kind} segments")]
    PropertyNotApplicable { property: Property, kind: SegmentKind },

    #[error("Transition duration must be positive, got {0}")]
    InvalidTransitionDuration(f64),

    #[error("Invalid timeline data: {0}")]
    InvalidData(String),
}

/// Result type for timeline operations.
pub type TimelineResult<T> = std::result::Result<T, TimelineError>;
