//! Derivative evaluation: low-order, high-order, FCT and their driver.
//!
//! - [`low_order`]: discrete upwinding and residual distribution
//! - [`high_order`]: Galerkin convection with a Neumann mass solve
//! - [`fct`]: bound-preserving conservative blend of the two
//! - [`EvolutionOperator`]: the per-stage entry point

mod evolution;
pub mod fct;
pub mod high_order;
pub mod low_order;

pub use evolution::{EvolutionContext, EvolutionOperator, value_range};
pub use fct::{FctInput, fct_blend};
pub use high_order::{NeumannOutcome, high_order_derivative, neumann_solve};
pub use low_order::{
    DiscreteUpwinding, ResidualWeights, discrete_upwind_derivative, discrete_upwind_matrix,
    forward_euler_limit, linear_flux_lumping, residual_distribution_derivative,
};

/// Guard for divisions by vanishing sums and for negligible residuals.
pub const EPS: f64 = 1e-15;
