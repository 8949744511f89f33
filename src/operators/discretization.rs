//! The finite element layer consumed by the evolution operator.
//!
//! The limiter core never assembles anything itself. It reads element
//! counts, face and subcell quadrature data and the assembled global
//! operators through [`Discretization`], and asks the discretization to move
//! its nodes and reassemble in remap mode.

use crate::config::ExecMode;
use crate::mesh::MeshTopology;

use super::CsrMatrix;

/// A velocity field evaluable at any physical point.
pub trait VelocityField: Send + Sync {
    /// Velocity at `x` (first `dim` entries used, the rest zero).
    fn velocity(&self, x: &[f64]) -> [f64; 3];
}

impl<F> VelocityField for F
where
    F: Fn(&[f64]) -> [f64; 3] + Send + Sync,
{
    fn velocity(&self, x: &[f64]) -> [f64; 3] {
        self(x)
    }
}

/// A scalar field evaluable at any physical point.
pub trait ScalarField: Send + Sync {
    fn value(&self, x: &[f64]) -> f64;
}

impl<F> ScalarField for F
where
    F: Fn(&[f64]) -> f64 + Send + Sync,
{
    fn value(&self, x: &[f64]) -> f64 {
        self(x)
    }
}

/// Quadrature data of one element face.
#[derive(Clone, Debug, Default)]
pub struct FaceQuadrature {
    n_dofs: usize,
    /// Quadrature weight times face Jacobian
    pub weights: Vec<f64>,
    /// Outward unit normals
    pub normals: Vec<[f64; 3]>,
    /// Advection velocity
    pub velocities: Vec<[f64; 3]>,
    /// Element shape values, `n_dofs` per point
    pub shapes: Vec<f64>,
}

impl FaceQuadrature {
    /// Empty the buffers for an element with `n_dofs` dofs.
    pub fn reset(&mut self, n_dofs: usize) {
        self.n_dofs = n_dofs;
        self.weights.clear();
        self.normals.clear();
        self.velocities.clear();
        self.shapes.clear();
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// Shape values at point `q`.
    #[inline]
    pub fn shape(&self, q: usize) -> &[f64] {
        &self.shapes[q * self.n_dofs..(q + 1) * self.n_dofs]
    }

    /// Normal advection velocity w.n at point `q`.
    #[inline]
    pub fn normal_velocity(&self, q: usize) -> f64 {
        let (w, n) = (&self.velocities[q], &self.normals[q]);
        w[0] * n[0] + w[1] * n[1] + w[2] * n[2]
    }
}

/// Quadrature data of one subcell, with the gradients of the multilinear
/// functions attached to the subcell corners.
#[derive(Clone, Debug, Default)]
pub struct SubcellQuadrature {
    n_corners: usize,
    /// Quadrature weight times Jacobian
    pub weights: Vec<f64>,
    /// Advection velocity
    pub velocities: Vec<[f64; 3]>,
    /// Physical gradients of the corner functions, `n_corners` per point
    pub gradients: Vec<[f64; 3]>,
}

impl SubcellQuadrature {
    pub fn reset(&mut self, n_corners: usize) {
        self.n_corners = n_corners;
        self.weights.clear();
        self.velocities.clear();
        self.gradients.clear();
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    #[inline]
    pub fn gradients_at(&self, q: usize) -> &[[f64; 3]] {
        &self.gradients[q * self.n_corners..(q + 1) * self.n_corners]
    }
}

/// Element layer of a discontinuous discretization.
///
/// Global dof `k * dofs_per_element() + i` is local dof `i` of element `k`.
/// The convection matrix K discretizes -w.grad(u) with the advection
/// velocity w (the velocity field in transport mode, the negated mesh
/// velocity in remap mode), so M du/dt = K u + b.
pub trait Discretization: Sync {
    type Mesh: MeshTopology;

    /// Static connectivity.
    fn mesh(&self) -> &Self::Mesh;

    /// Execution mode the operators were assembled for.
    fn mode(&self) -> ExecMode;

    /// Polynomial order.
    fn order(&self) -> usize;

    /// Dofs per element.
    fn dofs_per_element(&self) -> usize;

    /// Number of elements.
    fn n_elements(&self) -> usize {
        self.mesh().n_elements()
    }

    /// Total number of dofs.
    fn n_dofs(&self) -> usize {
        self.n_elements() * self.dofs_per_element()
    }

    /// Whether K already contains the upwind face terms.
    fn convection_has_face_terms(&self) -> bool;

    /// Quadrature data of face `face` of `element`.
    fn face_quadrature(&self, element: usize, face: usize, out: &mut FaceQuadrature);

    /// Quadrature data of subcell `subcell` of `element`.
    fn subcell_quadrature(&self, element: usize, subcell: usize, out: &mut SubcellQuadrature);

    /// Convection matrix K.
    fn convection(&self) -> &CsrMatrix;

    /// Element-preconditioned convection matrix M_L M^{-1} K, when assembled.
    fn preconditioned_convection(&self) -> Option<&CsrMatrix>;

    /// Consistent mass matrix M.
    fn mass(&self) -> &CsrMatrix;

    /// Row sums of M.
    fn lumped_mass(&self) -> &[f64];

    /// Inflow boundary vector b.
    fn boundary_inflow(&self) -> &[f64];

    /// Mesh node coordinates, `dim` values per node.
    fn node_positions(&self) -> &[f64];

    /// Mesh node velocity, laid out like the positions.
    fn mesh_velocity(&self) -> &[f64];

    /// Move the nodes and reassemble K, M, the lumped mass and b.
    fn set_node_positions(&mut self, positions: &[f64]);
}
