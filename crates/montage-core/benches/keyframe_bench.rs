//! Benchmarks for montage-core keyframe evaluation.
//!
//! Run with: cargo bench -p montage-core

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use montage_core::{Keyframe, KeyframeTrack, TimeRange};

fn bench_keyframe_evaluation(c: &mut Criterion) {
    // 100 keyframes, one per second
    let track = KeyframeTrack::from_keyframes(
        (0..100).map(|i| Keyframe::new(i as f64, (i as f64 * 0.1).sin())),
    );

    c.bench_function("keyframe_value_at_100kf_mid", |bencher| {
        bencher.iter(|| track.value_or(black_box(50.5), 0.0));
    });

    c.bench_function("keyframe_value_at_100kf_edge", |bencher| {
        bencher.iter(|| track.value_or(black_box(250.0), 0.0));
    });

    c.bench_function("keyframe_toggle_100kf", |bencher| {
        bencher.iter(|| {
            let mut t = track.clone();
            t.toggle(black_box(42.5), 0.0);
            t
        });
    });
}

fn bench_time_range(c: &mut Criterion) {
    let a = TimeRange::new(10.0, 5.0);
    let b = TimeRange::new(14.0, 3.0);

    c.bench_function("time_range_overlaps", |bencher| {
        bencher.iter(|| black_box(a).overlaps(black_box(b)));
    });
}

criterion_group!(benches, bench_keyframe_evaluation, bench_time_range);
criterion_main!(benches);
