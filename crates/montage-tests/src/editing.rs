//! Integration tests for the editing session.
//!
//! Drives montage-sync's `EditorSession` over an in-memory store, so
//! pointer gestures from montage-edit, the montage-timeline model and the
//! write-through path are checked together.

use montage_core::{EditorConfig, Filter, MIN_SEGMENT_DURATION};
use montage_edit::ResizeEdge;
use montage_sync::{
    EditorSession, InMemoryStore, ProjectData, RetryPolicy, StoreCall, StoreError,
};
use montage_timeline::{
    Boundary, LayerIndex, Property, Segment, SegmentId, TimelineFile, Transition, TransitionKind,
};
use std::time::{Duration, Instant};

// ── Helpers ────────────────────────────────────────────────────

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

fn image(start: f64, duration: f64) -> Segment {
    Segment::image("still.png", LayerIndex::visual(0), start, duration, (640, 480))
}

fn open(segments: Vec<Segment>) -> EditorSession<InMemoryStore> {
    let store = InMemoryStore::with_project(ProjectData {
        segments,
        transitions: Vec::new(),
    });
    EditorSession::open(store, &EditorConfig::default())
        .unwrap()
        .with_retry(RetryPolicy::new(2, Duration::ZERO))
}

fn segment_starting_at(session: &EditorSession<InMemoryStore>, start: f64) -> SegmentId {
    session
        .timeline()
        .segments()
        .find(|seg| seg.start_time == start)
        .map(|seg| seg.id.clone())
        .unwrap()
}

// ── Pointer gestures ───────────────────────────────────────────

#[test]
fn drag_onto_neighbor_clamps_and_persists() {
    let mut session = open(vec![image(0.0, 5.0), image(10.0, 4.0)]);
    let b = segment_starting_at(&session, 10.0);
    let t0 = Instant::now();

    session.begin_drag(&b, 10.0).unwrap();
    let preview = session.move_drag(3.0, None, 30.0).unwrap();
    assert_eq!(preview.start_time, 5.0);
    assert!(!preview.invalid);
    assert!(session.end_pointer(t0).unwrap().is_committed());

    session.store_mut().clear_calls();
    assert_eq!(session.flush_due(t0 + ms(799)), 0);
    assert_eq!(session.flush_due(t0 + ms(800)), 1);
    let stored = session.store().segment(b.as_canonical().unwrap()).unwrap();
    assert_eq!(stored.start_time, 5.0);
}

#[test]
fn resize_stops_at_minimum_duration() {
    let mut session = open(vec![image(10.0, 4.0)]);
    let id = segment_starting_at(&session, 10.0);

    session.begin_resize(&id, ResizeEdge::Right).unwrap();
    let preview = session.move_resize(2.0, 50.0).unwrap();
    assert_eq!(preview.duration, MIN_SEGMENT_DURATION);
    session.end_pointer(Instant::now()).unwrap();
    assert_eq!(session.timeline().segment(&id).unwrap().duration, MIN_SEGMENT_DURATION);
}

#[test]
fn cancelled_drag_leaves_timeline_and_store_alone() {
    let mut session = open(vec![image(0.0, 5.0)]);
    let id = segment_starting_at(&session, 0.0);
    let before = session.timeline().clone();

    session.begin_drag(&id, 1.0).unwrap();
    session.move_drag(20.0, None, 0.0).unwrap();
    assert_eq!(session.cancel_pointer(), Some(id));
    assert_eq!(session.timeline(), &before);
    assert!(session.pending().is_empty());
}

// ── Creation and split ─────────────────────────────────────────

#[test]
fn split_creates_canonical_sibling_in_store() {
    let mut session = open(vec![image(0.0, 6.0)]);
    let id = segment_starting_at(&session, 0.0);
    let t0 = Instant::now();

    let right = session.split(&id, 2.5, t0).unwrap();
    assert!(!right.is_provisional());
    assert_eq!(session.store().segment_count(), 2);
    assert_eq!(session.timeline().segment(&id).unwrap().duration, 2.5);
    assert_eq!(session.timeline().segment(&right).unwrap().start_time, 2.5);

    session.flush_all(t0);
    let left = session.store().segment(id.as_canonical().unwrap()).unwrap();
    assert_eq!(left.duration, 2.5);
}

#[test]
fn transition_on_new_segment_reaches_store() {
    let mut session = open(Vec::new());
    let id = session.create_segment(image(0.0, 5.0)).unwrap();
    let seg = session.timeline().segment(&id).unwrap().clone();
    let t0 = Instant::now();

    let fade = Transition::anchored(&seg, Boundary::Start, TransitionKind::Fade, 1.0, None).unwrap();
    session.add_transition(fade, t0).unwrap();
    assert_eq!(session.flush_due(t0 + ms(500)), 0);
    assert_eq!(session.flush_due(t0 + ms(1000)), 1);
    assert_eq!(session.store().transitions().len(), 1);

    session.delete_segment(&id).unwrap();
    assert!(session.store().transitions().is_empty());
    assert_eq!(session.store().segment_count(), 0);
}

#[test]
fn split_survives_server_error_on_sibling_create() {
    let mut session = open(vec![image(0.0, 6.0)]);
    let id = segment_starting_at(&session, 0.0);
    session.store_mut().fail_next(StoreError::from_status(503, "unavailable"));

    let right = session.split(&id, 2.5, Instant::now()).unwrap();
    assert!(session.is_flagged(&right));
    assert_eq!(session.timeline().segment_count(), 2);
    assert_eq!(session.timeline().segment(&right).unwrap().duration, 3.5);
    let stored_left = session.store().segment(id.as_canonical().unwrap()).unwrap();
    assert_eq!(stored_left.duration, 2.5);
}

// ── Write-through ──────────────────────────────────────────────

#[test]
fn filter_and_property_writes_use_their_own_windows() {
    let mut session = open(vec![image(0.0, 5.0)]);
    let id = segment_starting_at(&session, 0.0);
    let t0 = Instant::now();

    session.set_filters(&id, vec![Filter::new("blur", 4.0)], t0).unwrap();
    session.set_property(&id, Property::Opacity, 0.5, t0).unwrap();
    session.store_mut().clear_calls();

    assert_eq!(session.flush_due(t0 + ms(500)), 1);
    assert_eq!(session.flush_due(t0 + ms(800)), 1);
    let stored = session.store().segment(id.as_canonical().unwrap()).unwrap();
    assert_eq!(stored.filters.len(), 1);
    assert_eq!(stored.transform.opacity, 0.5);
    assert_eq!(session.store().calls().len(), 2);
}

#[test]
fn keyframe_edits_write_through_immediately() {
    let mut session = open(vec![image(0.0, 5.0)]);
    let id = segment_starting_at(&session, 0.0);
    let canonical = id.as_canonical().unwrap().to_string();
    let t0 = Instant::now();

    session.add_keyframe(&id, Property::Scale, 1.0, 2.0, t0).unwrap();
    session.toggle_keyframe(&id, Property::Scale, 3.0, t0).unwrap();
    assert_eq!(session.store().segment(&canonical).unwrap().keyframes_for(Property::Scale).len(), 2);

    session.toggle_keyframe(&id, Property::Scale, 3.0, t0).unwrap();
    assert_eq!(session.store().segment(&canonical).unwrap().keyframes_for(Property::Scale).len(), 1);
}

// ── Undo / redo ────────────────────────────────────────────────

#[test]
fn undo_redo_round_trip_through_store_snapshots() {
    let mut session = open(vec![image(0.0, 5.0)]);
    let id = segment_starting_at(&session, 0.0);
    let original = session.timeline().clone();
    let t0 = Instant::now();

    session.begin_drag(&id, 0.0).unwrap();
    session.move_drag(8.0, Some(LayerIndex::visual(1)), 30.0).unwrap();
    session.end_pointer(t0).unwrap();
    let moved = session.timeline().clone();
    assert_ne!(moved, original);

    assert!(session.undo().unwrap());
    assert_eq!(session.timeline(), &original);
    assert!(session.redo().unwrap());
    assert_eq!(session.timeline(), &moved);

    let last = session.store().snapshots().last().unwrap();
    assert_eq!(TimelineFile::from_json(last).unwrap().timeline, moved);
}

#[test]
fn edits_after_undoing_past_a_create_still_reach_store() {
    let mut session = open(Vec::new());
    let t0 = Instant::now();
    let id = session.create_segment(image(2.0, 4.0)).unwrap();
    session.begin_drag(&id, 2.0).unwrap();
    session.move_drag(7.0, None, 30.0).unwrap();
    session.end_pointer(t0).unwrap();
    session.flush_all(t0);

    assert!(session.undo().unwrap());
    let restored = session.timeline().segment(&id).unwrap();
    assert_eq!(restored.start_time, 2.0);
    assert!(!restored.id.is_provisional());

    session.set_property(&id, Property::Opacity, 0.25, t0).unwrap();
    assert_eq!(session.flush_due(t0 + ms(800)), 1);
    let stored = session.store().segment(id.as_canonical().unwrap()).unwrap();
    assert_eq!(stored.transform.opacity, 0.25);
}

#[test]
fn failed_snapshot_write_surfaces_notice() {
    let mut session = open(vec![image(0.0, 5.0)]);
    let id = segment_starting_at(&session, 0.0);
    session.set_property(&id, Property::Scale, 2.0, Instant::now()).unwrap();

    session.store_mut().fail_next(StoreError::from_status(503, "unavailable"));
    session.store_mut().fail_next(StoreError::from_status(503, "unavailable"));
    session.store_mut().clear_calls();
    assert!(session.undo().unwrap());

    assert_eq!(session.store().calls(), &[StoreCall::Snapshot, StoreCall::Snapshot]);
    assert_eq!(session.timeline().segment(&id).unwrap().transform.scale, 1.0);
    let notices = session.drain_notices();
    assert_eq!(notices.len(), 1);
    assert!(notices[0].message.contains("undo"));
}
