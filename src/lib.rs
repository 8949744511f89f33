//! # dg-remap
//!
//! Bound-preserving, mass-conservative time derivatives for discontinuous
//! Galerkin transport and remap.
//!
//! This crate provides:
//! - Dof topology of conforming segment, quadrilateral and hexahedral meshes
//!   (face-neighbor pairing, bound influence lists, subcells)
//! - Upwind face-flux stencils and subcell residual weights
//! - Low-order schemes: discrete upwinding and residual distribution
//! - A high-order Galerkin derivative with a Neumann mass solve
//! - Flux-corrected transport blending the two
//! - [`EvolutionOperator`], evaluated once per explicit Runge-Kutta stage
//! - A Bernstein reference discretization on structured meshes
//! - Benchmark velocity fields and initial conditions
//!
//! ## Example
//!
//! ```no_run
//! use dg_remap::{
//!     CartesianMesh, DgSpace, EvolutionConfig, EvolutionOperator, ExecMode, TimeScheme,
//! };
//!
//! let config = EvolutionConfig::new(ExecMode::Transport);
//! let mesh = CartesianMesh::rectangle_periodic(0.0, 1.0, 0.0, 1.0, 8, 8);
//! let space = DgSpace::new(mesh, 2, config, |_: &[f64]| [1.0, 0.5, 0.0]);
//! let mut u = space.project(|x| (x[0] * 6.0).sin().max(0.0));
//!
//! let mut op = EvolutionOperator::new(space, config)?;
//! let dt = 0.5 * op.low_order_time_step_limit();
//! let mut t = 0.0;
//! for _ in 0..10 {
//!     op.advance(&mut u, t, dt, TimeScheme::SspRk3)?;
//!     t += dt;
//! }
//! # Ok::<(), dg_remap::DgRemapError>(())
//! ```

pub mod basis;
pub mod config;
pub mod error;
pub mod mesh;
pub mod operators;
mod parallel;
pub mod polynomial;
pub mod problems;
pub mod solver;
pub mod stencil;
pub mod time;
pub mod topology;

pub use config::{EvolutionConfig, ExecMode, MonotoneScheme};
pub use error::{ConfigError, DgRemapError, Result, SparsityError, TopologyError};
pub use mesh::{CartesianMesh, Geometry, MeshTopology};
pub use operators::{CsrMatrix, DgSpace, Discretization};
pub use problems::{InitialCondition, Problem, VelocityProfile};
pub use solver::{EvolutionContext, EvolutionOperator, NeumannOutcome};
pub use stencil::{StencilAssembly, StencilSnapshot};
pub use time::TimeScheme;
pub use topology::TopologyIndex;
