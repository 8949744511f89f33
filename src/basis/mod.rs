//! Polynomial basis representations.
//!
//! This module provides the tensor-product Bernstein basis used by the
//! reference discretization and the dof lattice shared with the topology.

mod bernstein;
mod lattice;

pub use bernstein::{Bernstein, bernstein_1d, bernstein_1d_with_derivative};
pub use lattice::TensorLattice;
