//! Model constraints shared by every mutation path.

use montage_core::{MIN_SEGMENT_DURATION, TIME_EPSILON};

use crate::error::{CropAxis, TimelineError, TimelineResult};
use crate::id::LayerIndex;
use crate::layer::Layer;
use crate::segment::{Crop, Segment, SegmentKind};

/// Allowed playback speeds.
pub const SPEED_RANGE: std::ops::RangeInclusive<f64> = 0.1..=5.0;

/// A split must leave at least this much on both sides of the cut.
pub const MIN_SPLIT_MARGIN: f64 = MIN_SEGMENT_DURATION;

/// Tolerance between a source window and `duration x speed`.
const SOURCE_WINDOW_TOLERANCE: f64 = 1e-2;

/// Each inset within [0, 100], and opposing insets leave something visible.
pub fn validate_crop(crop: &Crop) -> TimelineResult<()> {
    for value in [crop.left, crop.right, crop.top, crop.bottom] {
        if !(0.0..=100.0).contains(&value) {
            return Err(TimelineError::CropOutOfRange { value });
        }
    }
    let horizontal = crop.left + crop.right;
    if horizontal >= 100.0 {
        return Err(TimelineError::CropTooLarge {
            axis: CropAxis::Horizontal,
            sum: horizontal,
        });
    }
    let vertical = crop.top + crop.bottom;
    if vertical >= 100.0 {
        return Err(TimelineError::CropTooLarge {
            axis: CropAxis::Vertical,
            sum: vertical,
        });
    }
    Ok(())
}

pub fn validate_speed(speed: f64) -> TimelineResult<()> {
    if SPEED_RANGE.contains(&speed) {
        Ok(())
    } else {
        Err(TimelineError::SpeedOutOfRange(speed))
    }
}

/// Audio segments live on negative layers, everything else on non-negative.
pub fn validate_layer_kind(layer: LayerIndex, kind: SegmentKind) -> TimelineResult<()> {
    if layer.is_audio() == kind.is_audio() {
        Ok(())
    } else {
        Err(TimelineError::LayerKindMismatch { layer, kind })
    }
}

/// The segment must not overlap any other segment of `layer`.
pub fn validate_overlap(layer: &Layer, segment: &Segment) -> TimelineResult<()> {
    match layer.overlapping(segment.range(), Some(&segment.id)) {
        Some(other) => Err(TimelineError::Overlap {
            segment: segment.id.clone(),
            other: other.id.clone(),
            layer: layer.index(),
        }),
        None => Ok(()),
    }
}

/// Every constraint a segment must satisfy on its own.
pub fn validate_segment(segment: &Segment) -> TimelineResult<()> {
    if segment.start_time < -TIME_EPSILON {
        return Err(TimelineError::NegativeStart(segment.start_time));
    }
    if segment.duration < MIN_SEGMENT_DURATION - TIME_EPSILON {
        return Err(TimelineError::DurationTooShort(segment.duration));
    }
    validate_layer_kind(segment.layer, segment.kind())?;
    validate_crop(&segment.crop)?;

    let opacity = segment.transform.opacity;
    if !(0.0..=1.0).contains(&opacity) {
        return Err(TimelineError::OpacityOutOfRange(opacity));
    }

    if let Some(speed) = segment.speed() {
        validate_speed(speed)?;
    }
    if let (Some(trim), Some(factor)) = (segment.source_trim(), segment.trim_factor()) {
        if trim.start_within_source < -TIME_EPSILON || trim.is_empty() {
            return Err(TimelineError::InvalidSourceWindow {
                start: trim.start_within_source,
                end: trim.end_within_source,
            });
        }
        let expected = segment.duration * factor;
        if (trim.len() - expected).abs() > SOURCE_WINDOW_TOLERANCE {
            return Err(TimelineError::SourceWindowMismatch {
                window: trim.len(),
                expected,
            });
        }
    }

    for track in segment.keyframes.values() {
        if let Some(kf) = track
            .keyframes()
            .iter()
            .find(|kf| kf.time < -TIME_EPSILON || kf.time > segment.duration + TIME_EPSILON)
        {
            return Err(TimelineError::KeyframeOutOfRange {
                time: kf.time,
                duration: segment.duration,
            });
        }
    }
    Ok(())
}
