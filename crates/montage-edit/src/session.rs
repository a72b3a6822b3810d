//! Pointer-session state machine for drag and resize, plus split.
//!
//! A session captures the segment's original placement on `begin`, keeps
//! the tentative placement on `move` without touching the model, and only
//! writes to the timeline on `end`.

use montage_core::config::SnapConfig;
use montage_core::{round_time, TIME_EPSILON};
use montage_timeline::{LayerIndex, Segment, SegmentId, Timeline};
use tracing::{debug, info};

use crate::error::{EditError, EditResult, SessionKind};
use crate::snapping::{Placement, ResizeEdge, ResizeResult, SnapIndicator, SnapResolver};
use crate::source::SourceDurationCache;

/// Open drag session.
#[derive(Debug, Clone, PartialEq)]
pub struct DragSession {
    pub segment: SegmentId,
    /// Pointer time minus segment start at `begin`
    pub pointer_offset: f64,
    pub original_layer: LayerIndex,
    pub original_start: f64,
    pub tentative: Placement,
}

/// Open resize session.
#[derive(Debug, Clone, PartialEq)]
pub struct ResizeSession {
    pub segment: SegmentId,
    pub edge: ResizeEdge,
    /// Segment as it was at `begin`
    pub original: Segment,
    pub tentative: ResizeResult,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Session {
    Drag(DragSession),
    Resize(ResizeSession),
}

impl Session {
    pub fn kind(&self) -> SessionKind {
        match self {
            Self::Drag(_) => SessionKind::Drag,
            Self::Resize(_) => SessionKind::Resize,
        }
    }

    pub fn segment(&self) -> &SegmentId {
        match self {
            Self::Drag(drag) => &drag.segment,
            Self::Resize(resize) => &resize.segment,
        }
    }

    fn segment_mut(&mut self) -> &mut SegmentId {
        match self {
            Self::Drag(drag) => &mut drag.segment,
            Self::Resize(resize) => &mut resize.segment,
        }
    }
}

/// Live feedback for a drag move.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragPreview {
    pub layer: LayerIndex,
    pub start_time: f64,
    pub invalid: bool,
    pub snap: Option<SnapIndicator>,
}

/// Live feedback for a resize move.
pub type ResizePreview = ResizeResult;

/// How a session ended.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionOutcome {
    /// The tentative placement was written to the timeline
    Committed(SegmentId),
    /// The segment is back at its original placement
    Reverted(SegmentId),
    /// Nothing moved
    Unchanged(SegmentId),
}

impl SessionOutcome {
    pub fn segment(&self) -> &SegmentId {
        match self {
            Self::Committed(id) | Self::Reverted(id) | Self::Unchanged(id) => id,
        }
    }

    pub fn is_committed(&self) -> bool {
        matches!(self, Self::Committed(_))
    }
}

/// Drives drag, resize and split against a timeline.
#[derive(Debug, Clone, Default)]
pub struct ManipulationEngine {
    resolver: SnapResolver,
    session: Option<Session>,
    durations: SourceDurationCache,
}

impl ManipulationEngine {
    pub fn new(config: &SnapConfig) -> Self {
        Self {
            resolver: SnapResolver::new(config),
            session: None,
            durations: SourceDurationCache::new(),
        }
    }

    pub fn resolver(&self) -> &SnapResolver {
        &self.resolver
    }

    pub fn source_durations_mut(&mut self) -> &mut SourceDurationCache {
        &mut self.durations
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    fn ensure_idle(&self) -> EditResult<()> {
        match &self.session {
            Some(session) => Err(EditError::SessionActive(session.kind())),
            None => Ok(()),
        }
    }

    fn expect_session(&self, kind: SessionKind) -> EditResult<()> {
        match &self.session {
            Some(session) if session.kind() == kind => Ok(()),
            Some(_) => Err(EditError::WrongSession(kind)),
            None => Err(EditError::NoSession),
        }
    }

    fn find<'a>(timeline: &'a Timeline, id: &SegmentId) -> EditResult<&'a Segment> {
        timeline
            .segment(id)
            .ok_or_else(|| montage_timeline::TimelineError::SegmentNotFound(id.clone()).into())
    }

    // ── Drag ───────────────────────────────────────────────────

    /// Open a drag session; `pointer_time` is where the pointer grabbed the
    /// segment.
    pub fn begin_drag(&mut self, timeline: &Timeline, id: &SegmentId, pointer_time: f64) -> EditResult<()> {
        self.ensure_idle()?;
        let segment = Self::find(timeline, id)?;
        debug!(segment = %id, "Begin drag");
        self.session = Some(Session::Drag(DragSession {
            segment: id.clone(),
            pointer_offset: pointer_time - segment.start_time,
            original_layer: segment.layer,
            original_start: segment.start_time,
            tentative: Placement {
                start_time: segment.start_time,
                layer: segment.layer,
                invalid: false,
                snap: None,
            },
        }));
        Ok(())
    }

    /// Move the drag pointer. `target_layer` switches layers when it is of
    /// the same class (visual or audio) as the segment's own layer.
    pub fn move_drag(
        &mut self,
        timeline: &Timeline,
        pointer_time: f64,
        target_layer: Option<LayerIndex>,
        playhead: f64,
    ) -> EditResult<DragPreview> {
        self.expect_session(SessionKind::Drag)?;
        let Some(Session::Drag(drag)) = self.session.as_mut() else {
            return Err(EditError::NoSession);
        };
        let segment = Self::find(timeline, &drag.segment)?;

        let layer = match target_layer {
            Some(layer) if layer.is_audio() == drag.original_layer.is_audio() => layer,
            _ => drag.tentative.layer,
        };
        let last_valid = if drag.tentative.invalid {
            (drag.original_layer, drag.original_start)
        } else {
            (drag.tentative.layer, drag.tentative.start_time)
        };
        let placement = self.resolver.resolve_drag(
            timeline,
            segment,
            layer,
            pointer_time - drag.pointer_offset,
            playhead,
            last_valid,
        );
        drag.tentative = placement;

        Ok(DragPreview {
            layer: placement.layer,
            start_time: placement.start_time,
            invalid: placement.invalid,
            snap: placement.snap,
        })
    }

    // ── Resize ─────────────────────────────────────────────────

    pub fn begin_resize(&mut self, timeline: &Timeline, id: &SegmentId, edge: ResizeEdge) -> EditResult<()> {
        self.ensure_idle()?;
        let segment = Self::find(timeline, id)?;
        debug!(segment = %id, ?edge, "Begin resize");
        self.session = Some(Session::Resize(ResizeSession {
            segment: id.clone(),
            edge,
            original: segment.clone(),
            tentative: ResizeResult {
                start_time: segment.start_time,
                duration: segment.duration,
                trim: segment.source_trim(),
                snap: None,
            },
        }));
        Ok(())
    }

    /// Move the resize pointer to `pointer_time` on the timeline.
    pub fn move_resize(&mut self, timeline: &Timeline, pointer_time: f64, playhead: f64) -> EditResult<ResizePreview> {
        self.expect_session(SessionKind::Resize)?;
        let Some(Session::Resize(resize)) = self.session.as_mut() else {
            return Err(EditError::NoSession);
        };
        let source_duration = resize
            .original
            .media()
            .filter(|_| resize.original.kind().has_source_window())
            .and_then(|media| self.durations.get(media));
        let result = self.resolver.resolve_resize(
            timeline,
            &resize.original,
            resize.edge,
            pointer_time,
            playhead,
            source_duration,
        );
        resize.tentative = result;
        Ok(result)
    }

    // ── Commit ─────────────────────────────────────────────────

    /// Close the open session, committing its tentative placement when it
    /// is valid. The session is cleared whatever the outcome.
    pub fn end(&mut self, timeline: &mut Timeline) -> EditResult<SessionOutcome> {
        let session = self.session.take().ok_or(EditError::NoSession)?;
        match session {
            Session::Drag(drag) => Ok(Self::commit_drag(timeline, drag)),
            Session::Resize(resize) => Ok(Self::commit_resize(timeline, resize)),
        }
    }

    fn commit_drag(timeline: &mut Timeline, drag: DragSession) -> SessionOutcome {
        let id = drag.segment;
        if drag.tentative.invalid {
            info!(segment = %id, "Drag ended without a valid placement, reverted");
            return SessionOutcome::Reverted(id);
        }
        let target = drag.tentative;
        if target.layer == drag.original_layer && (target.start_time - drag.original_start).abs() < TIME_EPSILON {
            return SessionOutcome::Unchanged(id);
        }
        match timeline.move_segment(&id, target.layer, target.start_time) {
            Ok(()) => {
                info!(segment = %id, layer = %target.layer, start = target.start_time, "Drag committed");
                SessionOutcome::Committed(id)
            }
            Err(err) => {
                info!(segment = %id, error = %err, "Drag rejected, reverted");
                SessionOutcome::Reverted(id)
            }
        }
    }

    fn commit_resize(timeline: &mut Timeline, resize: ResizeSession) -> SessionOutcome {
        let id = resize.segment;
        let target = resize.tentative;
        let original = &resize.original;
        if (target.start_time - original.start_time).abs() < TIME_EPSILON
            && (target.duration - original.duration).abs() < TIME_EPSILON
        {
            return SessionOutcome::Unchanged(id);
        }
        let result = timeline.update_segment(&id, |segment| {
            segment.set_bounds(target.start_time, target.duration);
            if let Some(trim) = target.trim {
                segment.set_source_trim(trim);
            }
        });
        match result {
            Ok(()) => {
                info!(
                    segment = %id,
                    start = target.start_time,
                    duration = target.duration,
                    "Resize committed"
                );
                SessionOutcome::Committed(id)
            }
            Err(err) => {
                info!(segment = %id, error = %err, "Resize rejected, reverted");
                SessionOutcome::Reverted(id)
            }
        }
    }

    /// Drop the open session without committing.
    pub fn cancel(&mut self) -> Option<SegmentId> {
        self.session.take().map(|session| session.segment().clone())
    }

    // ── Split ──────────────────────────────────────────────────

    /// Split a segment at timeline time `at`. Returns the provisional id of
    /// the new right-hand sibling.
    pub fn split(&mut self, timeline: &mut Timeline, id: &SegmentId, at: f64) -> EditResult<SegmentId> {
        self.ensure_idle()?;
        let right_id = SegmentId::provisional();
        timeline.split_segment(id, round_time(at), right_id.clone())?;
        info!(segment = %id, sibling = %right_id, at, "Split committed");
        Ok(right_id)
    }

    // ── Identity and cancellation ──────────────────────────────

    /// Point an open session at a segment's new id.
    pub fn retarget(&mut self, old: &SegmentId, new: &SegmentId) {
        if let Some(session) = self.session.as_mut() {
            if session.segment() == old {
                *session.segment_mut() = new.clone();
            }
        }
    }

    /// Drop the open session if it manipulates `id`.
    pub fn clear_for(&mut self, id: &SegmentId) -> bool {
        if self.session.as_ref().map_or(false, |s| s.segment() == id) {
            debug!(segment = %id, "Cleared pointer session");
            self.session = None;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use montage_core::MIN_SEGMENT_DURATION;
    use montage_timeline::{SourceTrim, TimelineError};

    fn image(layer: u32, start: f64, duration: f64) -> Segment {
        Segment::image("i.png", LayerIndex::visual(layer), start, duration, (10, 10))
    }

    fn setup(segments: Vec<Segment>) -> (Timeline, ManipulationEngine) {
        (
            Timeline::from_parts(segments, Vec::new()).unwrap(),
            ManipulationEngine::new(&SnapConfig::default()),
        )
    }

    #[test]
    fn test_drag_commits_on_end() {
        let b = image(0, 10.0, 2.0);
        let id = b.id.clone();
        let (mut tl, mut engine) = setup(vec![image(0, 0.0, 5.0), b]);

        engine.begin_drag(&tl, &id, 11.0).unwrap();
        let preview = engine.move_drag(&tl, 21.0, None, 0.0).unwrap();
        assert_eq!(preview.start_time, 20.0);
        assert_eq!(tl.segment(&id).unwrap().start_time, 10.0);

        let outcome = engine.end(&mut tl).unwrap();
        assert!(outcome.is_committed());
        assert_eq!(tl.segment(&id).unwrap().start_time, 20.0);
        assert!(!engine.is_active());
    }

    #[test]
    fn test_drag_onto_occupant_lands_after_it() {
        let b = image(0, 10.0, 4.0);
        let id = b.id.clone();
        let (mut tl, mut engine) = setup(vec![image(0, 0.0, 5.0), b]);

        engine.begin_drag(&tl, &id, 10.0).unwrap();
        engine.move_drag(&tl, 3.0, None, 30.0).unwrap();
        engine.end(&mut tl).unwrap();
        assert_eq!(tl.segment(&id).unwrap().start_time, 5.0);
    }

    #[test]
    fn test_invalid_drag_reverts() {
        let b = image(0, 20.0, 4.0);
        let id = b.id.clone();
        let (mut tl, mut engine) = setup(vec![image(0, 0.0, 5.0), image(0, 6.0, 5.0), b]);
        let before = tl.clone();

        engine.begin_drag(&tl, &id, 20.0).unwrap();
        let preview = engine.move_drag(&tl, 4.0, None, 30.0).unwrap();
        assert!(preview.invalid);
        let outcome = engine.end(&mut tl).unwrap();
        assert_eq!(outcome, SessionOutcome::Reverted(id));
        assert_eq!(tl, before);
        assert!(!engine.is_active());
    }

    #[test]
    fn test_cross_layer_drag_ignores_other_class() {
        let b = image(0, 0.0, 2.0);
        let id = b.id.clone();
        let (mut tl, mut engine) = setup(vec![b]);

        engine.begin_drag(&tl, &id, 0.0).unwrap();
        let preview = engine.move_drag(&tl, 4.0, Some(LayerIndex::audio(0)), 30.0).unwrap();
        assert_eq!(preview.layer, LayerIndex::visual(0));
        let preview = engine.move_drag(&tl, 4.0, Some(LayerIndex::visual(2)), 30.0).unwrap();
        assert_eq!(preview.layer, LayerIndex::visual(2));
        engine.end(&mut tl).unwrap();
        assert_eq!(tl.segment(&id).unwrap().layer, LayerIndex::visual(2));
    }

    #[test]
    fn test_only_one_session() {
        let a = image(0, 0.0, 2.0);
        let id = a.id.clone();
        let (mut tl, mut engine) = setup(vec![a]);

        engine.begin_drag(&tl, &id, 0.5).unwrap();
        assert_eq!(
            engine.begin_resize(&tl, &id, ResizeEdge::Left),
            Err(EditError::SessionActive(SessionKind::Drag))
        );
        assert!(matches!(
            engine.split(&mut tl, &id, 1.0),
            Err(EditError::SessionActive(_))
        ));
        assert_eq!(engine.move_resize(&tl, 1.0, 0.0), Err(EditError::WrongSession(SessionKind::Resize)));
        assert_eq!(engine.cancel(), Some(id));
        assert_eq!(engine.end(&mut tl), Err(EditError::NoSession));
    }

    #[test]
    fn test_resize_uses_source_duration_cache() {
        let v = Segment::video("take.mp4", LayerIndex::visual(0), 0.0, 4.0, 1.0, (10, 10));
        let id = v.id.clone();
        let (mut tl, mut engine) = setup(vec![v]);
        engine.source_durations_mut().insert("take.mp4", 6.0);

        engine.begin_resize(&tl, &id, ResizeEdge::Right).unwrap();
        let preview = engine.move_resize(&tl, 9.0, 30.0).unwrap();
        assert_eq!(preview.duration, 5.0);
        engine.end(&mut tl).unwrap();

        let seg = tl.segment(&id).unwrap();
        assert_eq!(seg.duration, 5.0);
        assert_eq!(seg.source_trim(), Some(SourceTrim::new(1.0, 6.0)));
    }

    #[test]
    fn test_split_rejects_edges() {
        let a = image(0, 0.0, 4.0);
        let id = a.id.clone();
        let (mut tl, mut engine) = setup(vec![a]);

        let err = engine.split(&mut tl, &id, 0.05).unwrap_err();
        assert!(matches!(err, EditError::Timeline(TimelineError::SplitAtEdge { .. })));
        let right = engine.split(&mut tl, &id, 1.5).unwrap();
        assert!(right.is_provisional());
        assert_eq!(tl.segment(&right).unwrap().start_time, 1.5);
        assert_eq!(tl.segment(&id).unwrap().duration, 1.5);
    }

    #[test]
    fn test_retarget_and_clear() {
        let a = image(0, 0.0, 4.0);
        let old = a.id.clone();
        let (mut tl, mut engine) = setup(vec![a]);
        engine.begin_drag(&tl, &old, 1.0).unwrap();

        let new = SegmentId::canonical("seg_7");
        tl.reassign_id(&old, new.clone()).unwrap();
        engine.retarget(&old, &new);
        assert_eq!(engine.session().map(Session::segment), Some(&new));

        assert!(!engine.clear_for(&old));
        assert!(engine.clear_for(&new));
        assert!(!engine.is_active());
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn prop_resize_never_below_floor(
                start in 0.0f64..20.0,
                duration in 0.1f64..10.0,
                pointer in -30.0f64..60.0,
                left in any::<bool>(),
            ) {
                let seg = Segment::video("v.mp4", LayerIndex::visual(0), start, duration, 0.5, (10, 10));
                let id = seg.id.clone();
                let (mut tl, mut engine) = setup(vec![seg, image(0, 40.0, 1.0)]);
                let edge = if left { ResizeEdge::Left } else { ResizeEdge::Right };

                engine.begin_resize(&tl, &id, edge).unwrap();
                let preview = engine.move_resize(&tl, pointer, 25.0).unwrap();
                prop_assert!(preview.duration >= MIN_SEGMENT_DURATION - 1e-9);
                engine.end(&mut tl).unwrap();
                prop_assert!(tl.segment(&id).unwrap().duration >= MIN_SEGMENT_DURATION - 1e-9);
            }
        }
    }
}
