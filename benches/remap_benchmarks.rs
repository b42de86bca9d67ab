//! Benchmarks for the remapping engine.
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use polyremap::catalog::{catalog, CatalogConfig};
use polyremap::ir::Grid;
use polyremap::polyhedral::{IterationDomain, TransformMatrix};
use polyremap::utils::IntMatrix;

/// Benchmark the HNF solver on a few 2x2 and 3x3 matrices.
fn bench_hnf(c: &mut Criterion) {
    let small = IntMatrix::from_rows(vec![vec![3, 2], vec![3, 4]]).unwrap();
    let large = IntMatrix::from_rows(vec![vec![2, 3, 6], vec![-4, 1, 9], vec![7, 0, -5]]).unwrap();

    c.bench_function("hnf_2x2", |b| b.iter(|| polyremap::hnf(black_box(&small)).unwrap()));
    c.bench_function("hnf_3x3", |b| b.iter(|| polyremap::hnf(black_box(&large)).unwrap()));
}

/// Benchmark bound derivation and a full walk of the derived nest.
fn bench_derive(c: &mut Criterion) {
    let domain = IterationDomain::rect(1, 100, 1, 100).unwrap();
    let wavefront = TransformMatrix::from_rows(vec![vec![1, 1], vec![0, 1]]).unwrap();
    let general = TransformMatrix::from_rows(vec![vec![3, 2], vec![3, 4]]).unwrap();

    c.bench_function("derive_wavefront", |b| {
        b.iter(|| polyremap::derive_bounds(black_box(&domain), black_box(&wavefront)).unwrap())
    });

    let nest = polyremap::derive_bounds(&domain, &general).unwrap();
    c.bench_function("walk_general_100x100", |b| {
        b.iter(|| nest.transformed_points().unwrap().len())
    });
}

/// Benchmark catalog construction and one oracle check per case.
fn bench_oracle(c: &mut Criterion) {
    let config = CatalogConfig::default();
    c.bench_function("catalog_build", |b| b.iter(|| catalog(black_box(&config)).unwrap()));

    let cases = catalog(&config).unwrap();
    c.bench_function("oracle_check_all", |b| {
        b.iter(|| {
            for case in &cases {
                let input = Grid::random(case.array_shape.clone(), 0, 10);
                let verdict = case.oracle().check(&input, case.aux.as_ref()).unwrap();
                black_box(verdict);
            }
        })
    });
}

criterion_group!(benches, bench_hnf, bench_derive, bench_oracle);
criterion_main!(benches);
