//! Criterion benchmarks for hull construction.
//!
//! Runs the adapter with the built-in enumeration kernel on seeded point
//! clouds of growing size, in 2-D (monotone chain) and 3-D (plane enumeration).
//! The largest 2-D case crosses the large-input prefilter threshold.

use criterion::{black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use hullquery::special::random_cloud;
use hullquery::{build_hull, OptionMap};

fn bench_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("build_hull");
    for &(dim, n) in &[(2usize, 32usize), (2, 512), (3, 12), (3, 24)] {
        let id = BenchmarkId::new(format!("{dim}d"), n);
        group.bench_with_input(id, &(dim, n), |b, &(dim, n)| {
            b.iter_batched(
                || random_cloud(dim, n, 1.0, 17 + n as u64),
                |pts| {
                    let _ = black_box(build_hull(&pts, &OptionMap::new()));
                },
                BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

criterion_group!(benches, bench_build);
criterion_main!(benches);
