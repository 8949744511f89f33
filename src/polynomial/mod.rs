//! Quadrature.
//!
//! Gauss-Legendre rules on [0, 1] and their tensor products over the reference
//! element and its faces.

mod quadrature;

pub use quadrature::{QuadratureRule, gauss_legendre};
