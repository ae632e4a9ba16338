//! Benchmarks for steady and transient solves.

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use thermovox_core::{
    BoundaryPolicy, ConductanceAssembler, HeatCapacityField, MaterialField, SourceField, VoxelGrid,
};
use thermovox_solver::linear::{CachedSparseLu, solve_sparse};
use thermovox_solver::transient::{ConstantPower, PeakValue, TransientIntegrator, TransientParams};

const STACK_K: [f64; 5] = [150.0, 400.0, 60.0, 10.0, 0.5];

fn stack_system(size: usize) -> thermovox_core::SparseSystem {
    let grid = VoxelGrid::square(size, 5, 50.0, 20.0).unwrap();
    let sources = SourceField::point(&grid, 0, size / 2, size / 2, 100.0);
    ConductanceAssembler::new(grid)
        .assemble(&MaterialField::per_layer(STACK_K), &sources, &BoundaryPolicy::default())
        .unwrap()
}

fn bench_solve_sparse(c: &mut Criterion) {
    let mut group = c.benchmark_group("solve_sparse");

    for size in [16, 32, 64] {
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |bencher, &size| {
            let system = stack_system(size);
            bencher.iter(|| {
                solve_sparse(
                    black_box(system.size()),
                    black_box(&system.triplets),
                    black_box(system.rhs()),
                )
                .unwrap()
            });
        });
    }

    group.finish();
}

fn bench_cached_lu(c: &mut Criterion) {
    let mut group = c.benchmark_group("cached_lu");

    for size in [16, 32, 64] {
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |bencher, &size| {
            let system = stack_system(size);
            let lu = CachedSparseLu::new();
            lu.solve(system.size(), &system.triplets, system.rhs()).unwrap();
            bencher.iter(|| {
                lu.solve(
                    black_box(system.size()),
                    black_box(&system.triplets),
                    black_box(system.rhs()),
                )
                .unwrap()
            });
        });
    }

    group.finish();
}

fn bench_transient_steps(c: &mut Criterion) {
    let mut group = c.benchmark_group("transient_100_steps");

    for size in [16, 32] {
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |bencher, &size| {
            let system = stack_system(size);
            let grid = *system.grid();
            let caps =
                HeatCapacityField::from_volumetric_layers(&grid, &[1.6e6, 3.4e6, 2.0e6, 2.0e6, 2.0e6])
                    .unwrap();
            let power = ConstantPower(SourceField::point(&grid, 0, size / 2, size / 2, 100.0));
            let mut integrator = TransientIntegrator::new(system, &caps).unwrap();
            let dt = 0.5 * integrator.dt_max();
            let params = TransientParams::new(100.0 * dt, dt).with_sample_every(100);

            bencher.iter(|| {
                integrator
                    .run(black_box(&power), &mut PeakValue, &params, None)
                    .unwrap()
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_solve_sparse, bench_cached_lu, bench_transient_steps);
criterion_main!(benches);
