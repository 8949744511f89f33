//! High-order Galerkin derivative.
//!
//! M y = K x + b (+ high-order face fluxes), solved by a lumped-mass
//! preconditioned fixed-point iteration.

use log::debug;

use crate::operators::CsrMatrix;
use crate::parallel::for_each_element;
use crate::stencil::StencilSnapshot;
use crate::topology::TopologyIndex;

use super::low_order::linear_flux_lumping;

/// Iteration cap of the mass solve.
pub const NEUMANN_MAX_ITERATIONS: usize = 20;
/// Residual 2-norm accepted by the mass solve.
pub const NEUMANN_TOLERANCE: f64 = 1e-4;

/// Result of a mass solve. Hitting the iteration cap is not an error.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NeumannOutcome {
    /// Updates applied
    pub iterations: usize,
    /// 2-norm of M x - rhs at exit
    pub residual: f64,
    pub converged: bool,
}

/// Solve M x = rhs with x <- x - (M x - rhs) / m_L starting from zero.
pub fn neumann_solve(
    mass: &CsrMatrix,
    lumped_mass: &[f64],
    rhs: &[f64],
    x: &mut [f64],
) -> NeumannOutcome {
    x.fill(0.0);
    let mut r = vec![0.0; rhs.len()];
    let mut outcome = NeumannOutcome {
        iterations: 0,
        residual: f64::INFINITY,
        converged: false,
    };
    for iter in 0..=NEUMANN_MAX_ITERATIONS {
        mass.mat_vec_mul(x, &mut r);
        for (ri, bi) in r.iter_mut().zip(rhs) {
            *ri -= bi;
        }
        outcome.iterations = iter;
        outcome.residual = r.iter().map(|v| v * v).sum::<f64>().sqrt();
        if outcome.residual <= NEUMANN_TOLERANCE {
            outcome.converged = true;
            break;
        }
        if iter == NEUMANN_MAX_ITERATIONS {
            break;
        }
        for ((xi, ri), mi) in x.iter_mut().zip(&r).zip(lumped_mass) {
            *xi -= ri / mi;
        }
    }
    debug!(
        "mass solve: {} iterations, residual {:.3e}{}",
        outcome.iterations,
        outcome.residual,
        if outcome.converged { "" } else { " (not converged)" }
    );
    outcome
}

/// High-order derivative into `y`.
///
/// `lumping` adds the alpha = 1 face fluxes; leave it unset when K already
/// carries the face terms. `rhs` is scratch space.
#[allow(clippy::too_many_arguments)]
pub fn high_order_derivative(
    convection: &CsrMatrix,
    inflow: &[f64],
    mass: &CsrMatrix,
    lumped_mass: &[f64],
    lumping: Option<(&TopologyIndex, &StencilSnapshot)>,
    nd: usize,
    x: &[f64],
    rhs: &mut [f64],
    y: &mut [f64],
) -> NeumannOutcome {
    convection.mat_vec_mul(x, rhs);
    for_each_element(rhs, nd, |k, z_e| {
        let base = k * nd;
        for (i, zi) in z_e.iter_mut().enumerate() {
            *zi += inflow[base + i];
        }
        if let Some((topology, stencils)) = lumping {
            linear_flux_lumping(topology, stencils, k, x, 1.0, z_e);
        }
    });
    neumann_solve(mass, lumped_mass, rhs, y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn sample_mass() -> CsrMatrix {
        CsrMatrix::from_triplets(2, 2, &[(0, 0, 1.0), (0, 1, 0.1), (1, 0, 0.1), (1, 1, 1.0)])
    }

    #[test]
    fn test_neumann_converges_on_mass_matrix() {
        let m = sample_mass();
        let lumped = m.row_sums();
        let rhs = [0.5, -0.25];
        let mut x = [0.0; 2];
        let out = neumann_solve(&m, &lumped, &rhs, &mut x);
        assert!(out.converged);
        assert!(out.iterations < NEUMANN_MAX_ITERATIONS);
        // Exact solution of M x = rhs
        assert_relative_eq!(x[0], 0.525 / 0.99, epsilon = 1e-3);
        assert_relative_eq!(x[1], -0.3 / 0.99, epsilon = 1e-3);
    }

    #[test]
    fn test_neumann_zero_rhs_needs_no_iterations() {
        let m = sample_mass();
        let lumped = m.row_sums();
        let mut x = [1.0, 1.0];
        let out = neumann_solve(&m, &lumped, &[0.0, 0.0], &mut x);
        assert_eq!(out.iterations, 0);
        assert!(out.converged);
        assert_eq!(x, [0.0, 0.0]);
    }

    #[test]
    fn test_neumann_reports_cap() {
        // Strongly non-diagonal matrix: the iteration diverges
        let m = CsrMatrix::from_triplets(2, 2, &[(0, 0, 1.0), (0, 1, 3.0), (1, 0, 3.0), (1, 1, 1.0)]);
        let lumped = [1.0, 1.0];
        let mut x = [0.0; 2];
        let out = neumann_solve(&m, &lumped, &[1.0, 0.0], &mut x);
        assert!(!out.converged);
        assert_eq!(out.iterations, NEUMANN_MAX_ITERATIONS);
    }
}
