//! Error types.
//!
//! All errors are configuration errors detected at construction time. Once an
//! [`EvolutionOperator`](crate::solver::EvolutionOperator) exists, derivative
//! evaluation is infallible.

use thiserror::Error;

use crate::mesh::Geometry;

/// Errors raised while building the dof topology from a mesh.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TopologyError {
    /// The mesh has hanging nodes.
    #[error("non-conforming meshes are not supported")]
    NonConforming,

    /// Only segments, quadrilaterals and hexahedra carry a tensor-product lattice.
    #[error("unsupported element geometry: {0:?}")]
    UnsupportedGeometry(Geometry),

    /// Polynomial order and dofs per element disagree.
    #[error("order {order} in {dim}D implies {expected} dofs per element, got {actual}")]
    DofCountMismatch {
        order: usize,
        dim: usize,
        expected: usize,
        actual: usize,
    },

    /// A corner or edge has more than one diagonal neighbor.
    #[error(
        "elements {first} and {second} are both common neighbors of {a} and {b} (excluding {element})"
    )]
    AmbiguousCommonNeighbor {
        element: usize,
        a: usize,
        b: usize,
        first: usize,
        second: usize,
    },

    /// A face neighbor does not point back across any of its faces.
    #[error("element {neighbor} is a neighbor of element {element} but not vice versa")]
    AsymmetricNeighbors { element: usize, neighbor: usize },

    /// The mesh contains no elements.
    #[error("mesh has no elements")]
    EmptyMesh,
}

/// Errors raised while decoding or validating a configuration.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    /// Legacy monotonicity codes run from 0 to 4.
    #[error("unknown monotonicity code {0} (expected 0..=4)")]
    UnknownSchemeCode(i32),

    /// Problem numbers below 10 are transport, below 20 remap.
    #[error("problem {0} maps to no execution mode")]
    UnknownProblem(u32),

    /// The problem is not defined in this dimension.
    #[error("problem {problem} is not defined in {dim}D")]
    UnsupportedDimension { problem: u32, dim: usize },

    /// Time step must be positive.
    #[error("time step must be positive, got {0}")]
    InvalidTimeStep(f64),

    /// The discretization was assembled for a different scheme.
    #[error("discretization does not match the configuration: {0}")]
    AssemblyMismatch(&'static str),
}

/// Errors raised by sparse matrix utilities.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SparsityError {
    /// The matrix pattern is not structurally symmetric.
    #[error("entry ({row}, {col}) has no mirror entry ({col}, {row})")]
    MissingMirror { row: usize, col: usize },

    /// A row has no stored diagonal entry.
    #[error("row {0} has no diagonal entry")]
    MissingDiagonal(usize),
}

/// Crate-level error.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DgRemapError {
    #[error(transparent)]
    Topology(#[from] TopologyError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Sparsity(#[from] SparsityError),
}

/// Result alias for fallible constructors.
pub type Result<T> = std::result::Result<T, DgRemapError>;
