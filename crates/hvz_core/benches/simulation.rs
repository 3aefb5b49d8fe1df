//! Simulation benchmarks for hvz_core.
//!
//! Run with: `cargo bench -p hvz_core`

// Benchmark binaries don't need docs on macro-generated functions
#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use hvz_core::camera::{Camera, Viewport};
use hvz_core::render::unit_draw_commands;
use hvz_test_utils::fixtures::crowd;

/// Full ticks (movement, seek, attack, wander) at several crowd sizes.
pub fn tick_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("tick");
    for count in [100usize, 500, 2000] {
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &count| {
            let mut sim = crowd(42, count);
            b.iter(|| black_box(sim.tick()));
        });
    }
    group.finish();
}

/// Radius queries against a populated grid.
pub fn grid_benchmark(c: &mut Criterion) {
    let sim = crowd(7, 2000);
    let cells: Vec<_> = sim.units().iter().map(|u| u.cell()).collect();
    c.bench_function("grid_query_radius_5", |b| {
        b.iter(|| {
            let mut found = 0usize;
            for cell in &cells {
                found += sim.grid().query_radius(*cell, 5).len();
            }
            black_box(found)
        });
    });
}

/// Unit layer emission for one viewport.
pub fn render_benchmark(c: &mut Criterion) {
    let sim = crowd(9, 2000);
    let camera = Camera::new();
    let viewport = Viewport::new(1280, 720);
    c.bench_function("unit_draw_commands", |b| {
        b.iter(|| black_box(unit_draw_commands(&sim, &camera, viewport)));
    });
}

criterion_group!(benches, tick_benchmark, grid_benchmark, render_benchmark);
criterion_main!(benches);
