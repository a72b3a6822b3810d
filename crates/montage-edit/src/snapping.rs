//! Snap and collision resolution for drag and resize.
//!
//! A placement is first clamped into the free window between its same-layer
//! neighbors, then pulled onto the nearest snap anchor within the capture
//! radius, then clamped again so snapping never creates an overlap.

use montage_core::config::SnapConfig;
use montage_core::{round_time, MIN_SEGMENT_DURATION, TIME_EPSILON};
use montage_timeline::{LayerIndex, Segment, SegmentId, SourceTrim, Timeline};
use smallvec::SmallVec;

/// Where a snap anchor comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapKind {
    SegmentEdge,
    TransitionEdge,
    /// Timeline origin, t = 0
    Origin,
    Playhead,
}

impl SnapKind {
    /// Synthetic anchors capture from twice the normal radius.
    fn radius_factor(self) -> f64 {
        match self {
            Self::Origin | Self::Playhead => 2.0,
            Self::SegmentEdge | Self::TransitionEdge => 1.0,
        }
    }
}

/// A time on the timeline that placements can snap to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnapPoint {
    pub time: f64,
    pub kind: SnapKind,
}

/// Which edge of the manipulated segment snapped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapEdge {
    Start,
    End,
}

/// Active snap, for UI feedback.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnapIndicator {
    pub time: f64,
    pub edge: SnapEdge,
    pub source: SnapKind,
}

/// Free window for a segment's start time on one layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacementBounds {
    /// End of the nearest neighbor on the left, at least 0
    pub min_start: f64,
    /// Start of the nearest neighbor on the right, `INFINITY` if none
    pub right_limit: f64,
}

impl PlacementBounds {
    /// Latest start that still fits `duration` before the right neighbor.
    pub fn max_start(&self, duration: f64) -> f64 {
        self.right_limit - duration
    }

    pub fn fits(&self, duration: f64) -> bool {
        self.min_start <= self.max_start(duration) + TIME_EPSILON
    }

    pub fn clamp(&self, start: f64, duration: f64) -> f64 {
        start.max(self.min_start).min(self.max_start(duration))
    }
}

/// Result of resolving a drag position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub start_time: f64,
    pub layer: LayerIndex,
    /// The free window was empty; `start_time` is the fallback position
    pub invalid: bool,
    pub snap: Option<SnapIndicator>,
}

/// Side of a segment being resized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeEdge {
    Left,
    Right,
}

/// Result of resolving a resize.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResizeResult {
    pub start_time: f64,
    pub duration: f64,
    /// New source window for video and audio
    pub trim: Option<SourceTrim>,
    pub snap: Option<SnapIndicator>,
}

type SnapPoints = SmallVec<[SnapPoint; 32]>;

/// Snap and collision resolver.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnapResolver {
    pub enabled: bool,
    /// Capture radius ε in seconds
    pub threshold: f64,
}

impl SnapResolver {
    pub fn new(config: &SnapConfig) -> Self {
        Self {
            enabled: config.enabled,
            threshold: config.threshold,
        }
    }

    /// Collect snap anchors: edges of every other segment and of every
    /// transition not attached to `exclude`, plus the origin and playhead.
    pub fn collect_snap_points(timeline: &Timeline, exclude: &SegmentId, playhead: f64) -> SnapPoints {
        let mut points = SnapPoints::new();
        points.push(SnapPoint {
            time: 0.0,
            kind: SnapKind::Origin,
        });
        points.push(SnapPoint {
            time: playhead,
            kind: SnapKind::Playhead,
        });

        for segment in timeline.segments().filter(|s| &s.id != exclude) {
            points.push(SnapPoint {
                time: segment.start_time,
                kind: SnapKind::SegmentEdge,
            });
            points.push(SnapPoint {
                time: segment.end_time(),
                kind: SnapKind::SegmentEdge,
            });
        }

        for transition in timeline.transitions().iter().filter(|t| &t.segment_id != exclude) {
            points.push(SnapPoint {
                time: transition.timeline_start_time,
                kind: SnapKind::TransitionEdge,
            });
            points.push(SnapPoint {
                time: transition.end_time(),
                kind: SnapKind::TransitionEdge,
            });
        }

        points
    }

    /// Free window on `layer` for a segment tentatively starting at
    /// `tentative_start`.
    ///
    /// Neighbors starting at or before the tentative start bound the window
    /// on the left by their end; neighbors starting after it bound the
    /// window on the right by their start.
    pub fn bounds(timeline: &Timeline, layer: LayerIndex, exclude: &SegmentId, tentative_start: f64) -> PlacementBounds {
        let mut bounds = PlacementBounds {
            min_start: 0.0,
            right_limit: f64::INFINITY,
        };
        let Some(layer) = timeline.layer(layer) else {
            return bounds;
        };
        for other in layer.segments().iter().filter(|s| &s.id != exclude) {
            if other.start_time <= tentative_start + TIME_EPSILON {
                bounds.min_start = bounds.min_start.max(other.end_time());
            } else {
                bounds.right_limit = bounds.right_limit.min(other.start_time);
            }
        }
        bounds
    }

    /// Nearest anchor for a segment spanning `[start, start + duration)`.
    ///
    /// Returns the snapped start and the indicator. Ties go to the smaller
    /// distance, then to the start edge.
    pub fn find_snap(&self, start: f64, duration: f64, points: &[SnapPoint]) -> Option<(f64, SnapIndicator)> {
        if !self.enabled || self.threshold <= 0.0 {
            return None;
        }
        self.best_snap(points, |point| {
            let from_start = ((point.time - start).abs(), SnapEdge::Start, point.time);
            let from_end = ((point.time - (start + duration)).abs(), SnapEdge::End, point.time - duration);
            [Some(from_start), Some(from_end)]
        })
    }

    /// Nearest anchor for one free-moving edge at `time`.
    fn find_edge_snap(&self, time: f64, edge: SnapEdge, points: &[SnapPoint]) -> Option<(f64, SnapIndicator)> {
        if !self.enabled || self.threshold <= 0.0 {
            return None;
        }
        self.best_snap(points, |point| [Some(((point.time - time).abs(), edge, point.time)), None])
    }

    fn best_snap<F>(&self, points: &[SnapPoint], mut candidates: F) -> Option<(f64, SnapIndicator)>
    where
        F: FnMut(&SnapPoint) -> [Option<(f64, SnapEdge, f64)>; 2],
    {
        let mut best: Option<(f64, f64, SnapIndicator)> = None; // (distance, snapped value, indicator)
        for point in points {
            let radius = self.threshold * point.kind.radius_factor();
            for (distance, edge, value) in candidates(point).into_iter().flatten() {
                if distance > radius {
                    continue;
                }
                let better = match &best {
                    None => true,
                    Some((best_distance, _, indicator)) => {
                        distance < best_distance - TIME_EPSILON
                            || ((distance - best_distance).abs() <= TIME_EPSILON
                                && edge == SnapEdge::Start
                                && indicator.edge == SnapEdge::End)
                    }
                };
                if better {
                    let indicator = SnapIndicator {
                        time: point.time,
                        edge,
                        source: point.kind,
                    };
                    best = Some((distance, value, indicator));
                }
            }
        }
        best.map(|(_, value, indicator)| (value, indicator))
    }

    /// Resolve a tentative drag of `segment` to `tentative_start` on `layer`.
    ///
    /// When no valid window exists the placement is flagged invalid and
    /// falls back to `last_valid`.
    pub fn resolve_drag(
        &self,
        timeline: &Timeline,
        segment: &Segment,
        layer: LayerIndex,
        tentative_start: f64,
        playhead: f64,
        last_valid: (LayerIndex, f64),
    ) -> Placement {
        let duration = segment.duration;
        let bounds = Self::bounds(timeline, layer, &segment.id, tentative_start.max(0.0));
        if !bounds.fits(duration) {
            return Placement {
                start_time: last_valid.1,
                layer: last_valid.0,
                invalid: true,
                snap: None,
            };
        }

        let mut start = bounds.clamp(tentative_start, duration);
        let mut snap = None;
        let points = Self::collect_snap_points(timeline, &segment.id, playhead);
        if let Some((snapped, indicator)) = self.find_snap(start, duration, &points) {
            start = bounds.clamp(snapped, duration);
            if (start - snapped).abs() <= TIME_EPSILON {
                snap = Some(indicator);
            }
        }

        Placement {
            start_time: round_time(start.max(0.0)),
            layer,
            invalid: false,
            snap,
        }
    }

    /// Resolve resizing `original` by dragging `edge` to `pointer_time`.
    ///
    /// Only the moving side is bounded by neighbors. Duration never drops
    /// below the minimum, and for video and audio the source window stays
    /// within `[0, source_duration]`; when it would not, the window is
    /// clamped and the duration recomputed from it.
    pub fn resolve_resize(
        &self,
        timeline: &Timeline,
        original: &Segment,
        edge: ResizeEdge,
        pointer_time: f64,
        playhead: f64,
        source_duration: Option<f64>,
    ) -> ResizeResult {
        let points = Self::collect_snap_points(timeline, &original.id, playhead);
        let neighbors = timeline
            .layer(original.layer)
            .map(|layer| layer.segments())
            .unwrap_or_default();
        let others = || neighbors.iter().filter(|s| s.id != original.id);
        let factor = original.trim_factor();
        let trim = original.source_trim();
        let end = original.end_time();

        match edge {
            ResizeEdge::Right => {
                let right_limit = others()
                    .filter(|s| s.start_time >= end - TIME_EPSILON)
                    .map(|s| s.start_time)
                    .fold(f64::INFINITY, f64::min);
                let min_end = original.start_time + MIN_SEGMENT_DURATION;
                let clamp = |t: f64| t.min(right_limit).max(min_end);

                let mut new_end = clamp(pointer_time);
                let mut snap = None;
                if let Some((snapped, indicator)) = self.find_edge_snap(new_end, SnapEdge::End, &points) {
                    new_end = clamp(snapped);
                    if (new_end - snapped).abs() <= TIME_EPSILON {
                        snap = Some(indicator);
                    }
                }

                let mut duration = new_end - original.start_time;
                let mut new_trim = None;
                if let (Some(trim), Some(factor)) = (trim, factor) {
                    let mut start_within = trim.start_within_source;
                    let mut end_within = start_within + duration * factor;
                    if let Some(limit) = source_duration {
                        if end_within > limit {
                            end_within = limit;
                            duration = ((end_within - start_within) / factor).max(MIN_SEGMENT_DURATION);
                            // A window shorter than the minimum grows backwards
                            start_within = (end_within - duration * factor).max(0.0).min(start_within);
                            snap = None;
                        }
                    }
                    new_trim = Some(SourceTrim::new(round_time(start_within), round_time(end_within)));
                }

                ResizeResult {
                    start_time: original.start_time,
                    duration: round_time(duration.max(MIN_SEGMENT_DURATION)),
                    trim: new_trim,
                    snap,
                }
            }
            ResizeEdge::Left => {
                let min_start = others()
                    .filter(|s| s.start_time < original.start_time)
                    .map(|s| s.end_time())
                    .fold(0.0, f64::max);
                let max_start = end - MIN_SEGMENT_DURATION;
                let clamp = |t: f64| t.max(min_start).min(max_start);

                let mut new_start = clamp(pointer_time);
                let mut snap = None;
                if let Some((snapped, indicator)) = self.find_edge_snap(new_start, SnapEdge::Start, &points) {
                    new_start = clamp(snapped);
                    if (new_start - snapped).abs() <= TIME_EPSILON {
                        snap = Some(indicator);
                    }
                }

                let mut new_trim = None;
                if let (Some(trim), Some(factor)) = (trim, factor) {
                    let mut start_within = trim.start_within_source + (new_start - original.start_time) * factor;
                    if start_within < 0.0 {
                        start_within = 0.0;
                        new_start = original.start_time - trim.start_within_source / factor;
                        snap = None;
                    }
                    new_trim = Some(SourceTrim::new(
                        round_time(start_within),
                        round_time(trim.end_within_source),
                    ));
                }

                let new_start = round_time(new_start);
                ResizeResult {
                    start_time: new_start,
                    duration: round_time((end - new_start).max(MIN_SEGMENT_DURATION)),
                    trim: new_trim,
                    snap,
                }
            }
        }
    }
}

impl Default for SnapResolver {
    fn default() -> Self {
        Self::new(&SnapConfig::default())
    }
}
