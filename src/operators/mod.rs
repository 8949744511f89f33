//! Global operators of the discretization.
//!
//! This module provides:
//! - [`CsrMatrix`], the sparse storage of the global operators
//! - the [`Discretization`] trait through which the limiter core reads them
//! - [`DgSpace`], a Bernstein reference discretization on structured meshes

mod discretization;
mod space;
mod sparse;

pub use discretization::{
    Discretization, FaceQuadrature, ScalarField, SubcellQuadrature, VelocityField,
};
pub use space::DgSpace;
pub use sparse::CsrMatrix;
