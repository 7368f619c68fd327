//! Benchmarks for delta frame reconstruction
//!
//! Tests the patch step applied to every delta frame:
//! - Byte-wise wrapping addition against the patch base
//! - Full delta decode through the codec, patch plus draw-list decode
//!
//! Platform: Cross-platform (synthetic frames, CI-safe)

use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use remote_imgui::codec::{FrameCodec, apply_delta, diff_against};
use remote_imgui::geometry::{GeometryStore, MAX_DRAW_LISTS, MAX_TRIANGLES};
use remote_imgui::test_utils::triangle_frame;
use std::hint::black_box;

fn bench_apply_delta(c: &mut Criterion) {
    let base: Vec<u8> = (0..256 * 1024).map(|i| (i * 31 % 251) as u8).collect();
    let next: Vec<u8> =
        base.iter().enumerate().map(|(i, byte)| byte.wrapping_add((i % 3) as u8)).collect();
    let delta = diff_against(&base, &next);

    let mut group = c.benchmark_group("apply_delta");
    group.throughput(Throughput::Bytes(delta.len() as u64));
    group.bench_function("256k", |b| {
        b.iter(|| {
            let mut patched = delta.clone();
            apply_delta(black_box(&mut patched), black_box(&base));
            black_box(patched)
        })
    });
    group.finish();
}

fn bench_delta_decode(c: &mut Criterion) {
    let first = triangle_frame(MAX_DRAW_LISTS);
    let second = triangle_frame(MAX_DRAW_LISTS - 1);
    let forward = diff_against(&first, &second);
    let backward = diff_against(&second, &first);

    let mut store = GeometryStore::new(MAX_DRAW_LISTS, MAX_TRIANGLES);
    let mut codec = FrameCodec::new(false);
    codec.decode(first, &mut store).expect("key frame decodes");

    c.bench_function("delta_decode_alternating", |b| {
        b.iter(|| {
            let shrink = codec.decode(black_box(forward.clone()), &mut store).is_ok();
            let grow = codec.decode(black_box(backward.clone()), &mut store).is_ok();
            black_box((shrink, grow))
        })
    });
}

criterion_group!(benches, bench_apply_delta, bench_delta_decode);
criterion_main!(benches);
