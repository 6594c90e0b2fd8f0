//! # Filter Benchmarks
//!
//! Performance benchmarks for the filter algebra.
//!
//! Run with: `cargo bench -p satchel-core`

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use satchel_core::filter::{intersect_all, invert, union_all};
use std::hint::black_box;

/// `count` lists of `size` ids, overlapping on every third id.
fn overlapping_lists(count: u64, size: u64) -> Vec<Vec<u64>> {
    (0..count)
        .map(|i| (0..size).map(|j| if j % 3 == 0 { j } else { i * size + j }).collect())
        .collect()
}

// =============================================================================
// BENCHMARKS
// =============================================================================

fn bench_intersect_all(c: &mut Criterion) {
    let mut group = c.benchmark_group("intersect_all");
    for size in [100u64, 1_000, 10_000] {
        let lists = overlapping_lists(8, size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &lists, |b, lists| {
            b.iter(|| intersect_all(black_box(lists)));
        });
    }
    group.finish();
}

fn bench_union_all(c: &mut Criterion) {
    let mut group = c.benchmark_group("union_all");
    for size in [100u64, 1_000, 10_000] {
        let lists = overlapping_lists(8, size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &lists, |b, lists| {
            b.iter(|| union_all(black_box(lists)));
        });
    }
    group.finish();
}

fn bench_invert(c: &mut Criterion) {
    let superset: Vec<u64> = (0..10_000).collect();
    let subset: Vec<u64> = (0..10_000).step_by(2).collect();
    c.bench_function("invert_half", |b| {
        b.iter(|| invert(black_box(&superset), black_box(&subset)));
    });
}

criterion_group!(benches, bench_intersect_all, bench_union_all, bench_invert);
criterion_main!(benches);
