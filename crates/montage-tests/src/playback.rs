//! Integration tests for playback.
//!
//! Composes frames and plans audio from timelines assembled with
//! montage-timeline, checking montage-effects transitions as the
//! compositor applies them.

use montage_compositor::{AudioInstruction, AudioTransport, Compositor, RenderContent, TransportStatus};
use montage_core::{EditorConfig, Filter};
use montage_timeline::{
    Boundary, LayerIndex, Property, Segment, SegmentId, Timeline, Transition, TransitionKind,
};
use std::collections::HashMap;

// ── Helpers ────────────────────────────────────────────────────

const FPS: f64 = 30.0;

fn compositor() -> Compositor {
    Compositor::new(&EditorConfig::default(), "demo project")
}

fn faded_clip() -> (Timeline, SegmentId) {
    let mut timeline = Timeline::new();
    let seg = Segment::video("intro.mp4", LayerIndex::visual(0), 10.0, 5.0, 0.0, (1920, 1080));
    let id = seg.id.clone();
    let fade_in = Transition::anchored(&seg, Boundary::Start, TransitionKind::Fade, 2.0, None).unwrap();
    let fade_out = Transition::anchored(&seg, Boundary::End, TransitionKind::Fade, 2.0, None).unwrap();
    timeline.add_segment(seg).unwrap();
    timeline.add_transition(fade_in).unwrap();
    timeline.add_transition(fade_out).unwrap();
    (timeline, id)
}

/// Plays `timeline` frame by frame against transports that advance in real
/// time, returning every instruction issued.
fn play_through(timeline: &Timeline, transport: &AudioTransport, seconds: f64) -> Vec<AudioInstruction> {
    let mut players: HashMap<SegmentId, TransportStatus> = HashMap::new();
    let mut issued = Vec::new();
    let step = 1.0 / FPS;
    for frame in 0..(seconds * FPS) as u64 {
        let time = frame as f64 * step;
        let plan = transport.plan(timeline, time, |id| players.get(id).copied());
        for instruction in &plan {
            let id = instruction.segment().clone();
            match instruction {
                AudioInstruction::Play { source_offset, .. } | AudioInstruction::Seek { source_offset, .. } => {
                    players.insert(
                        id,
                        TransportStatus {
                            playing: true,
                            position: *source_offset,
                        },
                    );
                }
                AudioInstruction::Pause { .. } => {
                    players.insert(
                        id,
                        TransportStatus {
                            playing: false,
                            position: 0.0,
                        },
                    );
                }
                AudioInstruction::SetVolume { .. } => {}
            }
        }
        for player in players.values_mut().filter(|p| p.playing) {
            player.position += step;
        }
        issued.extend(plan);
    }
    issued
}

// ── Compositing ────────────────────────────────────────────────

#[test]
fn fade_in_and_out_over_clip() {
    let (timeline, id) = faded_clip();
    let c = compositor();
    let opacity_at = |t: f64| c.visible_at(&timeline, t)[0].opacity;

    assert_eq!(opacity_at(10.0), 0.0);
    assert_eq!(opacity_at(11.0), 0.5);
    assert_eq!(opacity_at(12.0), 1.0);
    assert_eq!(opacity_at(12.5), 1.0);
    assert_eq!(opacity_at(14.0), 0.5);
    assert!(c.visible_at(&timeline, 9.99).is_empty());
    assert!(c.visible_at(&timeline, 15.0).is_empty());
    assert_eq!(c.visible_at(&timeline, 11.0)[0].segment, id);
}

#[test]
fn layers_draw_bottom_up() {
    let mut timeline = Timeline::new();
    timeline
        .add_segment(Segment::text("Caption", LayerIndex::visual(1), 0.0, 4.0))
        .unwrap();
    timeline
        .add_segment(Segment::image("bg.png", LayerIndex::visual(0), 0.0, 4.0, (1920, 1080)))
        .unwrap();
    timeline
        .add_segment(Segment::audio("vo.wav", LayerIndex::audio(0), 0.0, 4.0, 0.0))
        .unwrap();

    let frame = compositor().visible_at(&timeline, 2.0);
    assert_eq!(frame.len(), 2);
    assert!(matches!(frame[0].content, RenderContent::Image { .. }));
    assert!(matches!(frame[1].content, RenderContent::Text(_)));
}

#[test]
fn media_urls_are_project_scoped() {
    let (timeline, _) = faded_clip();
    let frame = compositor().visible_at(&timeline, 12.0);
    let RenderContent::Video { url, source_time } = &frame[0].content else {
        panic!("expected video content");
    };
    assert_eq!(url, "https://cdn.montage.local/media/demo%20project/intro.mp4");
    assert_eq!(*source_time, 2.0);
}

#[test]
fn keyframed_scale_drives_bounds() {
    let mut timeline = Timeline::new();
    let seg = Segment::image("logo.png", LayerIndex::visual(0), 0.0, 10.0, (200, 100));
    let id = seg.id.clone();
    timeline.add_segment(seg).unwrap();
    timeline.add_keyframe(&id, Property::Scale, 0.0, 1.0).unwrap();
    timeline.add_keyframe(&id, Property::Scale, 10.0, 3.0).unwrap();
    timeline
        .update_segment(&id, |seg| seg.filters.push(Filter::new("grayscale", 100.0)))
        .unwrap();

    let frame = compositor().visible_at(&timeline, 5.0);
    assert_eq!(frame[0].bounds.size(), montage_core::Vec2::new(400.0, 200.0));
    assert_eq!(frame[0].filters.len(), 1);
}

// ── Audio ──────────────────────────────────────────────────────

#[test]
fn audio_plays_once_and_pauses_after_end() {
    let mut timeline = Timeline::new();
    timeline
        .add_segment(Segment::audio("music.mp3", LayerIndex::audio(0), 1.0, 2.0, 30.0))
        .unwrap();
    let c = compositor();
    let transport = AudioTransport::new(&EditorConfig::default().audio, c.media().clone());

    let issued = play_through(&timeline, &transport, 4.0);
    let plays: Vec<_> = issued
        .iter()
        .filter_map(|i| match i {
            AudioInstruction::Play { source_offset, url, .. } => Some((*source_offset, url.clone())),
            _ => None,
        })
        .collect();
    assert_eq!(plays, vec![(30.0, "https://cdn.montage.local/media/demo%20project/music.mp3".to_string())]);
    assert!(!issued.iter().any(|i| matches!(i, AudioInstruction::Seek { .. })));
    assert!(matches!(issued.last(), Some(AudioInstruction::Pause { .. })));
}

#[test]
fn stalled_transport_is_seeked_back() {
    let mut timeline = Timeline::new();
    let song = Segment::audio("music.mp3", LayerIndex::audio(0), 0.0, 10.0, 0.0);
    let id = song.id.clone();
    timeline.add_segment(song).unwrap();
    let transport = AudioTransport::new(&EditorConfig::default().audio, compositor().media().clone());

    let stalled = TransportStatus {
        playing: true,
        position: 1.0,
    };
    let plan = transport.plan(&timeline, 4.0, |_| Some(stalled));
    assert_eq!(
        plan,
        vec![AudioInstruction::Seek {
            segment: id,
            source_offset: 4.0,
            volume: 1.0,
        }]
    );
}
