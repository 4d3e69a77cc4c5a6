//! Criterion benchmarks for hull queries.
//!
//! - membership and boundary distance on a 3-D hull (interior and exterior);
//! - exact and estimated coordinate-product search.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use hullquery::special::random_cloud;
use hullquery::{build_hull, OptionMap, Resolution};
use nalgebra::dvector;

fn bench_distance(c: &mut Criterion) {
    let hull = build_hull(&random_cloud(3, 20, 1.0, 7), &OptionMap::new()).unwrap();
    let inside = dvector![0.05, -0.02, 0.01];
    let outside = dvector![2.0, 1.5, -1.0];
    let mut group = c.benchmark_group("distance3d");
    group.bench_function("is_inside", |b| b.iter(|| hull.is_inside(black_box(&outside))));
    group.bench_function("boundary_distance/inside", |b| {
        b.iter(|| hull.boundary_distance(black_box(&inside)))
    });
    group.bench_function("boundary_distance/outside", |b| {
        b.iter(|| hull.boundary_distance(black_box(&outside)))
    });
    group.finish();
}

fn bench_coord_prod(c: &mut Criterion) {
    let hull = build_hull(&random_cloud(3, 20, 1.0, 11), &OptionMap::new()).unwrap();
    let mut group = c.benchmark_group("coord_prod3d");
    group.bench_function("exact", |b| b.iter(|| hull.max_coord_product().unwrap()));
    for &res in &[25usize, 100] {
        let r = Resolution::new(res).unwrap();
        group.bench_with_input(BenchmarkId::new("estimate", res), &r, |b, &r| {
            b.iter(|| hull.estimate_max_coord_product(r).unwrap())
        });
    }
    group.finish();
}

criterion_group!(benches, bench_distance, bench_coord_prod);
criterion_main!(benches);
