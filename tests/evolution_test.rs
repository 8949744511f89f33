//! End-to-end tests of the evolution operator.
//!
//! Each test assembles a reference discretization, wraps it in an
//! [`EvolutionOperator`] and checks bounds or conservation of the stepped
//! solution.

use approx::assert_relative_eq;
use dg_remap::solver::{ResidualWeights, value_range};
use dg_remap::{
    CartesianMesh, ConfigError, DgRemapError, DgSpace, Discretization, EvolutionConfig,
    EvolutionOperator, ExecMode, MonotoneScheme, Problem, TimeScheme,
};

const TOL: f64 = 1e-12;

fn unit_x(_: &[f64]) -> [f64; 3] {
    [1.0, 0.0, 0.0]
}

/// Closed, divergence-free flow on the unit square.
fn closed_vortex(x: &[f64]) -> [f64; 3] {
    [
        x[0] * (1.0 - x[0]) * (1.0 - 2.0 * x[1]),
        -(1.0 - 2.0 * x[0]) * x[1] * (1.0 - x[1]),
        0.0,
    ]
}

#[test]
fn test_step_profile_stays_bounded_1d() {
    let config = EvolutionConfig::fct(ExecMode::Transport, MonotoneScheme::DiscreteUpwind);
    let space = DgSpace::new(CartesianMesh::segment(0.0, 1.0, 4), 3, config, unit_x);
    let mut u = space.project(|x| if x[0] < 0.5 { 1.0 } else { 0.0 });
    let (lo, hi) = value_range(&u);

    let mut op = EvolutionOperator::new(space, config).unwrap();
    let dt = 0.5 * op.low_order_time_step_limit();
    assert!(dt.is_finite() && dt > 0.0);
    op.advance(&mut u, 0.0, dt, TimeScheme::ForwardEuler).unwrap();

    let (new_lo, new_hi) = value_range(&u);
    assert!(new_lo >= lo - TOL, "undershoot {new_lo}");
    assert!(new_hi <= hi + TOL, "overshoot {new_hi}");
    // The step actually moved
    assert!(u.iter().any(|&v| v > 0.0 && v < 1.0));
}

#[test]
fn test_closed_element_conserves_mass() {
    let config = EvolutionConfig::fct(ExecMode::Transport, MonotoneScheme::DiscreteUpwind);
    let mesh = CartesianMesh::rectangle(0.0, 1.0, 0.0, 1.0, 1, 1);
    let space = DgSpace::new(mesh, 2, config, closed_vortex);
    let mut u = space.project(|x| (x[0] - 0.3).powi(2) + 0.5 * x[1]);
    let (lo, hi) = value_range(&u);

    let mut op = EvolutionOperator::new(space, config).unwrap();
    let mass0 = op.lumped_mass_integral(&u);
    let dt = 0.5 * op.low_order_time_step_limit();

    let mut t = 0.0;
    for _ in 0..100 {
        op.advance(&mut u, t, dt, TimeScheme::SspRk3).unwrap();
        t += dt;
    }

    assert_relative_eq!(op.lumped_mass_integral(&u), mass0, max_relative = 1e-10);
    let (new_lo, new_hi) = value_range(&u);
    assert!(new_lo >= lo - TOL && new_hi <= hi + TOL);
}

#[test]
fn test_residual_distribution_linear_1d() {
    let config = EvolutionConfig::low_order(ExecMode::Transport, MonotoneScheme::ResidualDistribution);
    let space = DgSpace::new(CartesianMesh::segment_periodic(0.0, 1.0, 2), 1, config, unit_x);
    let x = vec![0.2, 0.9, 0.4, 0.1];

    // Element weights follow the distance to the element maximum
    let weights = ResidualWeights::element(&x[0..2]);
    let sum_p = 2.0 * 0.9 - (0.2 + 0.9) + 1e-15;
    assert_relative_eq!(weights.node(0, 0.2).0, (0.9 - 0.2) / sum_p);
    assert_eq!(weights.node(1, 0.9).0, 0.0);

    let mut op = EvolutionOperator::new(space, config).unwrap();
    let dt = 0.5 * op.low_order_time_step_limit();
    let y = op.evaluate_derivative(&x, 0.0);

    let topology = &op.context().topology;
    let ranges = op.element_ranges();
    for (dof, (xi, yi)) in x.iter().zip(&y).enumerate() {
        let range = topology.dof_range(dof, ranges);
        let updated = xi + dt * yi;
        assert!(range.contains(updated, TOL), "dof {dof}: {updated} not in {range:?}");
    }

    // Total residual is redistributed: no mass is created
    let mass: f64 = op
        .discretization()
        .lumped_mass()
        .iter()
        .zip(&y)
        .map(|(m, v)| m * v)
        .sum();
    assert!(mass.abs() < TOL);
}

#[test]
fn test_remap_keeps_bounds() {
    let problem = Problem::new(14, 2, [0.0; 3], [1.0; 3]).unwrap();
    let config = EvolutionConfig::fct(ExecMode::Remap, MonotoneScheme::DiscreteUpwind);
    let mesh = CartesianMesh::rectangle(0.0, 1.0, 0.0, 1.0, 3, 3);
    let space = DgSpace::new(mesh, 2, config, move |x: &[f64]| problem.velocity(x));
    let mut u = space.project(|x| problem.initial_value(x));
    let (lo, hi) = value_range(&u);
    let start = space.node_positions().to_vec();

    let mut op = EvolutionOperator::new(space, config).unwrap();
    let dt = 0.25 * op.low_order_time_step_limit();
    let mut t = 0.0;
    for _ in 0..5 {
        op.advance(&mut u, t, dt, TimeScheme::SspRk3).unwrap();
        t += dt;
    }

    let (new_lo, new_hi) = value_range(&u);
    assert!(new_lo >= lo - TOL && new_hi <= hi + TOL);

    // Mesh sits at x0 + t v
    let disc = op.discretization();
    for ((p, x0), v) in disc.node_positions().iter().zip(&start).zip(disc.mesh_velocity()) {
        assert_relative_eq!(*p, x0 + t * v, epsilon = 1e-14);
    }
    assert!(disc.mesh_velocity().iter().any(|&v| v != 0.0));
}

#[test]
fn test_remap_residual_distribution_runs() {
    let problem = Problem::new(13, 2, [0.0; 3], [1.0; 3]).unwrap();
    let config = EvolutionConfig::new(ExecMode::Remap);
    let mesh = CartesianMesh::rectangle(0.0, 1.0, 0.0, 1.0, 2, 2);
    let space = DgSpace::new(mesh, 3, config, move |x: &[f64]| problem.velocity(x));
    let mut u = space.project(|x| problem.initial_value(x));

    let mut op = EvolutionOperator::new(space, config).unwrap();
    assert!(op.context().stencils.current().has_subcell_weights());
    let dt = 0.1 * op.low_order_time_step_limit();
    op.advance(&mut u, 0.0, dt, TimeScheme::SspRk3).unwrap();
    assert!(u.iter().all(|v| v.is_finite()));
    assert!(op.last_neumann_outcome().is_some());
}

#[test]
fn test_high_order_only_reports_mass_solve() {
    let config = EvolutionConfig::high_order(ExecMode::Transport);
    let space = DgSpace::new(CartesianMesh::segment_periodic(0.0, 1.0, 8), 2, config, unit_x);
    let u = space.project(|x| (2.0 * std::f64::consts::PI * x[0]).sin());
    let mut op = EvolutionOperator::new(space, config).unwrap();
    let y = op.evaluate_derivative(&u, 0.0);
    assert!(y.iter().all(|v| v.is_finite()));
    let outcome = op.last_neumann_outcome().unwrap();
    assert!(outcome.residual.is_finite());
}

#[test]
fn test_mismatched_assembly_rejected() {
    let assembled = EvolutionConfig::fct(ExecMode::Transport, MonotoneScheme::DiscreteUpwind);
    let space = DgSpace::new(CartesianMesh::segment(0.0, 1.0, 3), 2, assembled, unit_x);
    let requested = EvolutionConfig::new(ExecMode::Transport);
    match EvolutionOperator::new(space, requested) {
        Err(DgRemapError::Config(ConfigError::AssemblyMismatch(_))) => {}
        Err(other) => panic!("unexpected error {other}"),
        Ok(_) => panic!("mismatch accepted"),
    }
}

#[test]
fn test_time_step_must_be_positive() {
    let config = EvolutionConfig::new(ExecMode::Transport);
    let space = DgSpace::new(CartesianMesh::segment(0.0, 1.0, 3), 2, config, unit_x);
    let mut op = EvolutionOperator::new(space, config).unwrap();
    assert_eq!(
        op.set_time_step(0.0),
        Err(DgRemapError::Config(ConfigError::InvalidTimeStep(0.0)))
    );
    assert!(op.set_time_step(1e-3).is_ok());
}

#[test]
fn test_derivative_before_time_step_is_set() {
    let config = EvolutionConfig::new(ExecMode::Transport);
    let space = DgSpace::new(CartesianMesh::segment_periodic(0.0, 1.0, 4), 2, config, unit_x);
    let u = space.project(|x| (2.0 * std::f64::consts::PI * x[0]).sin());
    let mut op = EvolutionOperator::new(space, config).unwrap();

    // Seeded with the low-order limit
    assert_eq!(op.time_step(), op.low_order_time_step_limit());
    assert!(op.time_step() > 0.0);
    let y = op.evaluate_derivative(&u, 0.0);
    assert!(y.iter().all(|v| v.is_finite()));
}

#[test]
fn test_still_flow_seeds_unit_time_step() {
    let config = EvolutionConfig::new(ExecMode::Transport);
    let space = DgSpace::new(CartesianMesh::segment_periodic(0.0, 1.0, 4), 2, config, |_: &[f64]| {
        [0.0; 3]
    });
    let u = space.project(|x| x[0]);
    let mut op = EvolutionOperator::new(space, config).unwrap();
    assert_eq!(op.time_step(), 1.0);
    let y = op.evaluate_derivative(&u, 0.0);
    assert!(y.iter().all(|v| v.abs() < TOL));
}
