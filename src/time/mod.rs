//! Time integration methods.
//!
//! The steppers are generic over a derivative callback `L(u, t)` and call it
//! with the absolute stage time, which the evolution operator uses to place
//! the mesh in remap mode.

mod ssp_rk3;

pub use ssp_rk3::{forward_euler_step, ssp_rk3_step};

/// Explicit one-step method.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TimeScheme {
    ForwardEuler,
    #[default]
    SspRk3,
}

impl TimeScheme {
    /// Advance `u` from `t` to `t + dt`.
    pub fn step<F>(self, u: &mut [f64], rhs_fn: F, t: f64, dt: f64)
    where
        F: FnMut(&[f64], f64) -> Vec<f64>,
    {
        match self {
            TimeScheme::ForwardEuler => forward_euler_step(u, rhs_fn, t, dt),
            TimeScheme::SspRk3 => ssp_rk3_step(u, rhs_fn, t, dt),
        }
    }
}
