//! Benchmarks for derivative evaluation.
//!
//! Run with: `cargo bench --bench evolution_bench`
//!
//! Compares the monotone schemes with and without FCT on periodic 2D meshes.

use std::f64::consts::PI;

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use dg_remap::{
    CartesianMesh, DgSpace, EvolutionConfig, EvolutionOperator, ExecMode,
    MonotoneScheme, TimeScheme,
};

fn drift(_: &[f64]) -> [f64; 3] {
    [1.0, 0.5, 0.0]
}

/// Setup an operator and a smooth state on an n x n periodic mesh.
fn setup_operator(n: usize, order: usize, config: EvolutionConfig) -> (EvolutionOperator<DgSpace>, Vec<f64>) {
    let mesh = CartesianMesh::rectangle_periodic(0.0, 1.0, 0.0, 1.0, n, n);
    let space = DgSpace::new(mesh, order, config, drift);
    let u = space.project(|x| {
        let r2 = (x[0] - 0.5).powi(2) + (x[1] - 0.5).powi(2);
        (-40.0 * r2).exp()
    });
    let mut op = EvolutionOperator::new(space, config).expect("valid configuration");
    let dt = 0.5 * op.low_order_time_step_limit();
    op.set_time_step(dt).expect("positive time step");
    (op, u)
}

/// Benchmark one derivative evaluation per scheme.
fn bench_schemes(c: &mut Criterion) {
    let mut group = c.benchmark_group("derivative_scheme");
    let schemes = [
        ("high_order", EvolutionConfig::high_order(ExecMode::Transport)),
        (
            "du",
            EvolutionConfig::low_order(ExecMode::Transport, MonotoneScheme::DiscreteUpwind),
        ),
        (
            "du_fct",
            EvolutionConfig::fct(ExecMode::Transport, MonotoneScheme::DiscreteUpwind),
        ),
        (
            "pdu_fct",
            EvolutionConfig::fct(ExecMode::Transport, MonotoneScheme::DiscreteUpwind).with_subcell(true),
        ),
        (
            "rd_fct",
            EvolutionConfig::fct(ExecMode::Transport, MonotoneScheme::ResidualDistribution),
        ),
        ("rd_subcell_fct", EvolutionConfig::new(ExecMode::Transport)),
    ];

    for (name, config) in schemes {
        let (mut op, u) = setup_operator(16, 2, config);
        let mut y = vec![0.0; u.len()];
        group.bench_function(name, |b| {
            b.iter(|| op.evaluate_derivative_into(black_box(&u), 0.0, black_box(&mut y)));
        });
    }

    group.finish();
}

/// Benchmark the default scheme across mesh sizes.
fn bench_mesh_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("derivative_scaling");
    let config = EvolutionConfig::new(ExecMode::Transport);

    for n in [8, 16, 32] {
        let n_elements = n * n;
        let (mut op, u) = setup_operator(n, 2, config);
        let mut y = vec![0.0; u.len()];

        group.bench_with_input(
            BenchmarkId::new("rd_subcell_fct", format!("{}_elements", n_elements)),
            &n_elements,
            |b, _| {
                b.iter(|| op.evaluate_derivative_into(black_box(&u), 0.0, black_box(&mut y)));
            },
        );
    }

    group.finish();
}

/// Benchmark polynomial order at fixed mesh size.
fn bench_order(c: &mut Criterion) {
    let mut group = c.benchmark_group("derivative_order");
    let config = EvolutionConfig::fct(ExecMode::Transport, MonotoneScheme::DiscreteUpwind);

    for order in [1, 2, 3, 4] {
        let (mut op, u) = setup_operator(8, order, config);
        let mut y = vec![0.0; u.len()];

        group.bench_with_input(BenchmarkId::new("du_fct", format!("p{}", order)), &order, |b, _| {
            b.iter(|| op.evaluate_derivative_into(black_box(&u), 0.0, black_box(&mut y)));
        });
    }

    group.finish();
}

/// Benchmark a full SSP-RK3 step in remap mode, including mesh motion.
fn bench_remap_step(c: &mut Criterion) {
    let mut group = c.benchmark_group("remap_step");
    let config = EvolutionConfig::fct(ExecMode::Remap, MonotoneScheme::DiscreteUpwind);
    let vortex = |x: &[f64]| {
        [
            (PI * x[0]).sin() * (PI * x[1]).cos(),
            -(PI * x[0]).cos() * (PI * x[1]).sin(),
            0.0,
        ]
    };

    for n in [8, 16] {
        let n_elements = n * n;
        let mesh = CartesianMesh::rectangle(0.0, 1.0, 0.0, 1.0, n, n);
        let space = DgSpace::new(mesh, 2, config, vortex);
        let u0 = space.project(|x| if x[0] < 0.5 { 1.0 } else { 0.0 });
        let mut op = EvolutionOperator::new(space, config).expect("valid configuration");
        let dt = 0.25 * op.low_order_time_step_limit();

        group.bench_with_input(
            BenchmarkId::new("ssp_rk3", format!("{}_elements", n_elements)),
            &n_elements,
            |b, _| {
                let mut u = u0.clone();
                b.iter(|| {
                    u.copy_from_slice(&u0);
                    op.advance(black_box(&mut u), 0.0, dt, TimeScheme::SspRk3)
                });
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_schemes,
    bench_mesh_scaling,
    bench_order,
    bench_remap_step
);
criterion_main!(benches);
