//! Benchmarks for wire-inflate.
//!
//! Run with: cargo bench -p wire-inflate
//!
//! To compare against baseline:
//! 1. First run: cargo bench -p wire-inflate -- --save-baseline main
//! 2. After changes: cargo bench -p wire-inflate -- --baseline main

#![allow(missing_docs, clippy::cast_precision_loss, clippy::unwrap_used)]

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use wire_inflate::{
    InflatorConfig, InflatorEngine, LoopRefiner, PhantomMeshGenerator, WireProfile,
};
use wire_params::TargetType;
use wire_types::{Point3, WireNetwork};

// =============================================================================
// Test Network Generation
// =============================================================================

/// A body-centred cubic cell: cube edges plus the eight half-diagonals.
fn bcc_cell() -> WireNetwork {
    let mut vertices: Vec<Point3<f64>> = (0..8)
        .map(|i| Point3::new(f64::from(i & 1), f64::from((i >> 1) & 1), f64::from((i >> 2) & 1)))
        .collect();
    vertices.push(Point3::new(0.5, 0.5, 0.5));

    let mut edges = Vec::new();
    for a in 0..8_usize {
        for bit in [1, 2, 4] {
            let b = a | bit;
            if b != a {
                edges.push([a, b]);
            }
        }
        edges.push([a, 8]);
    }
    WireNetwork::from_parts(3, vertices, edges).unwrap()
}

/// An `n x n x n` block of unit cubes.
fn cube_grid(n: usize) -> WireNetwork {
    let side = n + 1;
    let index = |i: usize, j: usize, k: usize| (k * side + j) * side + i;
    let mut vertices = Vec::with_capacity(side * side * side);
    for k in 0..side {
        for j in 0..side {
            for i in 0..side {
                vertices.push(Point3::new(i as f64, j as f64, k as f64));
            }
        }
    }
    let mut edges = Vec::new();
    for k in 0..side {
        for j in 0..side {
            for i in 0..side {
                if i + 1 < side {
                    edges.push([index(i, j, k), index(i + 1, j, k)]);
                }
                if j + 1 < side {
                    edges.push([index(i, j, k), index(i, j + 1, k)]);
                }
                if k + 1 < side {
                    edges.push([index(i, j, k), index(i, j, k + 1)]);
                }
            }
        }
    }
    WireNetwork::from_parts(3, vertices, edges).unwrap()
}

// =============================================================================
// Inflation Benchmarks
// =============================================================================

fn bench_inflation(c: &mut Criterion) {
    let mut group = c.benchmark_group("Inflation");
    let engine = InflatorEngine::default();

    let bcc = bcc_cell();
    let field = vec![0.05; bcc.num_vertices()];
    group.throughput(Throughput::Elements(bcc.num_edges() as u64));
    group.bench_function("bcc_cell", |b| {
        b.iter(|| {
            engine.inflate_with_fields(black_box(&bcc), black_box(&field), TargetType::Vertex)
        });
    });

    let grid = cube_grid(4);
    let field = vec![0.1; grid.num_edges()];
    group.throughput(Throughput::Elements(grid.num_edges() as u64));
    group.bench_function("cube_grid_4", |b| {
        b.iter(|| {
            engine.inflate_with_fields(black_box(&grid), black_box(&field), TargetType::Edge)
        });
    });

    let square = engine.clone().with_profile(WireProfile::square());
    group.bench_function("bcc_cell_square_profile", |b| {
        let field = vec![0.05; bcc.num_vertices()];
        b.iter(|| {
            square.inflate_with_fields(black_box(&bcc), black_box(&field), TargetType::Vertex)
        });
    });

    group.finish();
}

fn bench_variants(c: &mut Criterion) {
    let mut group = c.benchmark_group("Variants");
    group.sample_size(10);

    let bcc = bcc_cell();
    let field = vec![0.05; bcc.num_vertices()];

    let reflective = InflatorEngine::new(InflatorConfig::reflective());
    group.bench_function("reflective_bcc", |b| {
        b.iter(|| {
            reflective.inflate_with_fields(black_box(&bcc), black_box(&field), TargetType::Vertex)
        });
    });

    let phantom = PhantomMeshGenerator::default();
    group.bench_function("phantom_bcc", |b| {
        b.iter(|| {
            phantom.inflate_with_fields(black_box(&bcc), black_box(&field), TargetType::Vertex)
        });
    });

    group.finish();
}

fn bench_refinement(c: &mut Criterion) {
    let mut group = c.benchmark_group("Refinement");
    group.sample_size(10);

    let bcc = bcc_cell();
    let field = vec![0.05; bcc.num_vertices()];
    let mesh = InflatorEngine::default()
        .inflate_with_fields(&bcc, &field, TargetType::Vertex)
        .unwrap();
    group.throughput(Throughput::Elements(mesh.num_faces() as u64));

    group.bench_function("loop_2_rounds", |b| {
        b.iter(|| {
            let mut refined = mesh.clone();
            refined.refine(&LoopRefiner, 2).unwrap();
            black_box(refined)
        });
    });

    group.finish();
}

// =============================================================================
// Criterion Setup
// =============================================================================

criterion_group!(benches, bench_inflation, bench_variants, bench_refinement);
criterion_main!(benches);
