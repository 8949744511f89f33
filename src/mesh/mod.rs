//! Mesh representation.
//!
//! Provides the pieces the dof topology and the reference discretization need:
//! - Reference element geometry and local face numbering
//! - The [`MeshTopology`] connectivity trait
//! - Jacobians of the reference-to-physical map
//! - Structured segment, quadrilateral and hexahedral meshes

mod cartesian;
mod geometry;
mod jacobian;
mod topology;

pub use cartesian::CartesianMesh;
pub use geometry::Geometry;
pub use jacobian::Jacobian;
pub use topology::{MeshTopology, Neighbor};
