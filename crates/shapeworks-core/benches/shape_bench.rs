//! Criterion benchmarks for the shape algebra and the processing engine.
//!
//! Three benchmark groups:
//! - `shape_algebra`: uncached derivations on a fresh store vs. cache hits
//! - `short_key`: parsing and interning four-layer keys
//! - `processing_line`: 500 cutter/rotater/stacker lines ticked at 60 Hz

use criterion::{Criterion, criterion_group, criterion_main};
use shapeworks_core::definitions::ShapeStore;
use shapeworks_core::engine::Engine;
use shapeworks_core::id::StructureId;
use shapeworks_core::ports::Direction;
use shapeworks_core::processor::ProcessorKind;
use shapeworks_core::signal::{DiscardGoals, NoSignals};
use shapeworks_core::test_utils::*;

const FULL: &str = "CrRgSbWy:RuCuRuCu:SpSpScSc:WwWwCrCr";

// ===========================================================================
// Factory builders
// ===========================================================================

/// One line per entry: a cutter feeding a rotater and a stacker. Items are
/// moved by hand between the structures each tick.
struct Line {
    cutter: StructureId,
    rotater: StructureId,
    stacker: StructureId,
}

fn build_lines(count: usize) -> (Engine, Vec<Line>) {
    let mut engine = engine_with_uniform_speed(4.0);
    let lines = (0..count)
        .map(|_| Line {
            cutter: add_default(&mut engine, ProcessorKind::Cutter),
            rotater: add_default(&mut engine, ProcessorKind::Rotater),
            stacker: add_default(&mut engine, ProcessorKind::Stacker),
        })
        .collect();
    (engine, lines)
}

fn tick_lines(engine: &mut Engine, lines: &[Line]) {
    let input = shape_item(engine, FULL);
    for line in lines {
        engine.accept_item(line.cutter, 0, input, &NoSignals);
        if let Some(left) = engine.take_output(line.cutter, 0) {
            engine.accept_item(line.rotater, 0, left, &NoSignals);
        }
        if let Some(right) = engine.take_output(line.cutter, 1) {
            engine.accept_item(line.stacker, 1, right, &NoSignals);
        }
        if let Some(rotated) = engine.take_output(line.rotater, 0) {
            engine.accept_item(line.stacker, 0, rotated, &NoSignals);
        }
        engine.take_output(line.stacker, 0);
    }
    engine.step(fixed(1.0 / 60.0), &NoSignals, &mut DiscardGoals);
}

// ===========================================================================
// Benchmarks
// ===========================================================================

fn bench_shape_algebra(c: &mut Criterion) {
    let mut group = c.benchmark_group("shape_algebra");

    group.bench_function("derive_uncached", |b| {
        b.iter(|| {
            let mut store = ShapeStore::new();
            let a = store.from_short_key(FULL).unwrap();
            let [left, right] = store.cut_half(a, Direction::Top);
            let rotated = store.rotate_cw(left);
            let merged = store.merge(rotated, right);
            std::hint::black_box(store.stack(merged, a))
        })
    });

    let mut store = ShapeStore::new();
    let a = store.from_short_key(FULL).unwrap();
    group.bench_function("derive_cached", |b| {
        b.iter(|| {
            let [left, right] = store.cut_half(a, Direction::Top);
            let rotated = store.rotate_cw(left);
            let merged = store.merge(rotated, right);
            std::hint::black_box(store.stack(merged, a))
        })
    });

    group.finish();
}

fn bench_short_key(c: &mut Criterion) {
    c.bench_function("short_key/parse_and_intern", |b| {
        b.iter(|| {
            let mut store = ShapeStore::new();
            std::hint::black_box(store.from_short_key(std::hint::black_box(FULL)).unwrap())
        })
    });
}

fn bench_processing_line(c: &mut Criterion) {
    let (mut engine, lines) = build_lines(500);
    // Warm up so every structure has work queued.
    for _ in 0..30 {
        tick_lines(&mut engine, &lines);
    }
    c.bench_function("processing_line/500_lines", |b| {
        b.iter(|| tick_lines(&mut engine, &lines))
    });
}

criterion_group!(
    benches,
    bench_shape_algebra,
    bench_short_key,
    bench_processing_line
);
criterion_main!(benches);
