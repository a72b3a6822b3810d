//! Integration tests for the timeline model.
//!
//! Exercises montage-core keyframes and geometry through the
//! montage-timeline model and its serialized form.

use montage_core::{KeyframeToggle, MIN_SEGMENT_DURATION, TIME_EPSILON};
use montage_timeline::{
    Boundary, Crop, CropAxis, History, LayerIndex, Property, Segment, SegmentId, SegmentKind, SourceTrim,
    Timeline, TimelineError, TimelineFile, Transition, TransitionKind,
};

// ── Helpers ────────────────────────────────────────────────────

fn clip(layer: u32, start: f64, duration: f64) -> Segment {
    Segment::video("clip.mp4", LayerIndex::visual(layer), start, duration, 0.0, (1280, 720))
}

fn build_timeline() -> Timeline {
    let mut timeline = Timeline::new();
    timeline.add_segment(clip(0, 0.0, 5.0)).unwrap();
    timeline.add_segment(clip(0, 5.0, 10.0)).unwrap();
    timeline
        .add_segment(Segment::text("Title", LayerIndex::visual(1), 1.0, 3.0))
        .unwrap();
    timeline
        .add_segment(Segment::audio("music.mp3", LayerIndex::audio(0), 0.0, 15.0, 0.0))
        .unwrap();
    timeline
}

/// Id of the earliest video segment on the lowest visual layer.
fn first_clip(timeline: &Timeline) -> SegmentId {
    timeline
        .segments()
        .find(|seg| seg.kind() == SegmentKind::Video)
        .map(|seg| seg.id.clone())
        .unwrap()
}

fn assert_no_overlap(timeline: &Timeline) {
    for layer in timeline.layers() {
        for pair in layer.segments().windows(2) {
            assert!(
                pair[0].end_time() <= pair[1].start_time + TIME_EPSILON,
                "{} overlaps {} on {}",
                pair[0].id,
                pair[1].id,
                layer.index()
            );
        }
    }
}

// ── Layout ─────────────────────────────────────────────────────

#[test]
fn duration_is_latest_segment_end() {
    let timeline = build_timeline();
    assert_eq!(timeline.duration(), 15.0);
    assert_eq!(timeline.segment_count(), 4);
}

#[test]
fn overlapping_insert_leaves_timeline_untouched() {
    let mut timeline = build_timeline();
    let before = timeline.clone();

    let err = timeline.add_segment(clip(0, 4.0, 2.0)).unwrap_err();
    assert!(matches!(err, TimelineError::Overlap { .. }));
    assert_eq!(timeline, before);
    assert_no_overlap(&timeline);
}

#[test]
fn touching_segments_do_not_overlap() {
    let mut timeline = build_timeline();
    timeline.add_segment(clip(0, 15.0, 1.0)).unwrap();
    assert_no_overlap(&timeline);
}

#[test]
fn audio_segment_rejected_on_visual_layer() {
    let mut timeline = Timeline::new();
    let song = Segment::audio("song.mp3", LayerIndex::visual(0), 0.0, 2.0, 0.0);
    assert!(timeline.add_segment(song).is_err());
    assert!(timeline.is_empty());
}

// ── Keyframes ──────────────────────────────────────────────────

#[test]
fn keyframes_interpolate_linearly_between_neighbors() {
    let mut timeline = Timeline::new();
    let seg = clip(0, 2.0, 12.0);
    let id = seg.id.clone();
    timeline.add_segment(seg).unwrap();
    timeline.add_keyframe(&id, Property::PositionX, 0.0, 0.0).unwrap();
    timeline.add_keyframe(&id, Property::PositionX, 10.0, 100.0).unwrap();

    let seg = timeline.segment(&id).unwrap();
    assert_eq!(seg.value_at(Property::PositionX, 5.0), 50.0);
    assert_eq!(seg.value_at(Property::PositionX, 11.0), 100.0);
    assert_eq!(seg.value_at(Property::Scale, 5.0), 1.0);
}

#[test]
fn toggle_twice_is_identity() {
    let mut timeline = build_timeline();
    let id = first_clip(&timeline);
    timeline.add_keyframe(&id, Property::Opacity, 1.0, 0.4).unwrap();
    let before = timeline.segment(&id).unwrap().keyframes.clone();

    let first = timeline.toggle_keyframe(&id, Property::Opacity, 3.0).unwrap();
    assert!(matches!(first, KeyframeToggle::Inserted(_)));
    let second = timeline.toggle_keyframe(&id, Property::Opacity, 3.0).unwrap();
    assert!(matches!(second, KeyframeToggle::Removed(_)));
    assert_eq!(timeline.segment(&id).unwrap().keyframes, before);
}

// ── Split ──────────────────────────────────────────────────────

#[test]
fn split_conserves_duration_and_source_window() {
    let mut timeline = Timeline::new();
    let mut seg = Segment::video("clip.mp4", LayerIndex::visual(0), 2.0, 8.0, 1.0, (1280, 720));
    seg.set_speed(2.0).unwrap();
    let id = seg.id.clone();
    let original = seg.clone();
    timeline.add_segment(seg).unwrap();

    let right_id = SegmentId::provisional();
    timeline.split_segment(&id, 4.0, right_id.clone()).unwrap();
    let left = timeline.segment(&id).unwrap();
    let right = timeline.segment(&right_id).unwrap();

    assert!((left.duration + right.duration - original.duration).abs() < TIME_EPSILON);
    assert_eq!(right.start_time, left.end_time());
    let (l, r) = (left.source_trim().unwrap(), right.source_trim().unwrap());
    let whole = original.source_trim().unwrap();
    assert_eq!(l.start_within_source, whole.start_within_source);
    assert_eq!(l.end_within_source, r.start_within_source);
    assert_eq!(r.end_within_source, whole.end_within_source);
    assert_eq!(l, SourceTrim::new(1.0, 5.0));
    assert_no_overlap(&timeline);
}

#[test]
fn split_moves_end_transition_to_right_half() {
    let mut timeline = Timeline::new();
    let seg = clip(0, 0.0, 10.0);
    let id = seg.id.clone();
    let fade_out = Transition::anchored(&seg, Boundary::End, TransitionKind::Fade, 1.0, None).unwrap();
    timeline.add_segment(seg).unwrap();
    timeline.add_transition(fade_out).unwrap();

    let right_id = SegmentId::provisional();
    timeline.split_segment(&id, 6.0, right_id.clone()).unwrap();
    assert_eq!(timeline.transitions_for(&id).count(), 0);
    let moved = timeline.transitions_for(&right_id).next().unwrap();
    assert_eq!(moved.timeline_start_time, 9.0);
}

// ── Validation ─────────────────────────────────────────────────

#[test]
fn crop_over_full_axis_rejected() {
    let mut timeline = build_timeline();
    let id = first_clip(&timeline);
    let before = timeline.clone();

    let err = timeline
        .update_segment(&id, |seg| seg.crop = Crop::new(60.0, 50.0, 0.0, 0.0))
        .unwrap_err();
    assert!(matches!(err, TimelineError::CropTooLarge { axis: CropAxis::Horizontal, .. }));
    assert_eq!(timeline, before);

    timeline
        .update_segment(&id, |seg| seg.crop = Crop::new(60.0, 30.0, 10.0, 10.0))
        .unwrap();
}

#[test]
fn shrink_below_minimum_rejected() {
    let mut timeline = build_timeline();
    let id = first_clip(&timeline);
    let result = timeline.update_segment(&id, |seg| seg.set_bounds(0.0, MIN_SEGMENT_DURATION / 2.0));
    assert!(result.is_err());
    assert_eq!(timeline.segment(&id).unwrap().duration, 5.0);
}

// ── History & persistence ──────────────────────────────────────

#[test]
fn undo_redo_restores_exact_states() {
    let mut timeline = build_timeline();
    let initial = timeline.clone();
    let mut history = History::new(timeline.clone(), 10);
    let id = first_clip(&timeline);

    timeline.move_segment(&id, LayerIndex::visual(2), 20.0).unwrap();
    history.record(timeline.clone());
    let moved = timeline.clone();

    timeline.restore(history.undo().unwrap().clone());
    assert_eq!(timeline, initial);
    timeline.restore(history.redo().unwrap().clone());
    assert_eq!(timeline, moved);
    assert!(history.redo().is_none());
}

#[test]
fn file_roundtrip_preserves_timeline() {
    let mut timeline = build_timeline();
    let id = first_clip(&timeline);
    timeline.add_keyframe(&id, Property::Scale, 2.0, 1.5).unwrap();
    let seg = timeline.segment(&id).unwrap().clone();
    timeline
        .add_transition(Transition::anchored(&seg, Boundary::Start, TransitionKind::Zoom, 1.0, None).unwrap())
        .unwrap();

    let json = TimelineFile::new(timeline.clone()).to_json().unwrap();
    let loaded = TimelineFile::from_json(&json).unwrap();
    assert_eq!(loaded.timeline, timeline);
}

// ── Properties ─────────────────────────────────────────────────

mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn split_anywhere_inside_conserves_duration(at in 0.5f64..9.5) {
            let mut timeline = Timeline::new();
            let seg = clip(0, 3.0, 10.0);
            let id = seg.id.clone();
            timeline.add_segment(seg).unwrap();

            let right_id = SegmentId::provisional();
            timeline.split_segment(&id, 3.0 + at, right_id.clone()).unwrap();
            let left = timeline.segment(&id).unwrap();
            let right = timeline.segment(&right_id).unwrap();
            prop_assert!((left.duration + right.duration - 10.0).abs() < TIME_EPSILON);
            prop_assert!((right.end_time() - 13.0).abs() < TIME_EPSILON);
            assert_no_overlap(&timeline);
        }

        #[test]
        fn random_inserts_never_overlap(starts in prop::collection::vec((0u32..3, 0.0f64..30.0, 0.1f64..6.0), 1..20)) {
            let mut timeline = Timeline::new();
            for (layer, start, duration) in starts {
                let _ = timeline.add_segment(clip(layer, start, duration));
            }
            assert_no_overlap(&timeline);
        }
    }
}
