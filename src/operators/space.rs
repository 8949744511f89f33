//! Reference discretization: Bernstein elements on a structured mesh.
//!
//! Assembles, element by element,
//! - the mass matrix M_ij = int phi_i phi_j and its row sums
//! - the convection matrix K_ij = -int phi_i w.grad(phi_j)
//! - the inflow vector b_i = -int_{inflow boundary} (w.n) u_in phi_i
//!
//! Basic discrete upwinding needs the upwind face terms inside K. They are
//! added as own-block entries int min(0, w.n) phi_i phi_j and neighbor-block
//! entries -int min(0, w.n) phi_i phi_j^nbr, which widens the pattern to the
//! face neighbors. The preconditioned variant of discrete upwinding works on
//! the element matrices M_L M_e^{-1} K_e instead.
//!
//! Element matrices are dense `faer` matrices scattered into CSR storage.

use faer::{Mat, linalg::solvers::Solve};
use log::info;

use crate::basis::Bernstein;
use crate::config::{EvolutionConfig, ExecMode};
use crate::mesh::{CartesianMesh, MeshTopology};
use crate::polynomial::QuadratureRule;
use crate::topology::SubcellMap;

use super::{
    CsrMatrix, Discretization, FaceQuadrature, ScalarField, SubcellQuadrature, VelocityField,
};

/// Bernstein DG space with its assembled operators.
pub struct DgSpace {
    mesh: CartesianMesh,
    basis: Bernstein,
    mode: ExecMode,
    face_terms: bool,
    velocity: Box<dyn VelocityField>,
    inflow: Box<dyn ScalarField>,
    mesh_velocity: Vec<f64>,
    volume_rule: QuadratureRule,
    face_rules: Vec<QuadratureRule>,
    subcell_rule: QuadratureRule,
    subcells: SubcellMap,
    convection: CsrMatrix,
    preconditioned: Option<CsrMatrix>,
    mass: CsrMatrix,
    lumped_mass: Vec<f64>,
    inflow_vector: Vec<f64>,
}

impl DgSpace {
    /// Assemble an order-`order` space on `mesh` for the given scheme.
    ///
    /// In transport mode `velocity` advects the field. In remap mode it is
    /// sampled at the mesh vertices to give the mesh velocity, zeroed on
    /// vertices of non-periodic boundaries.
    pub fn new(
        mesh: CartesianMesh,
        order: usize,
        config: EvolutionConfig,
        velocity: impl VelocityField + 'static,
    ) -> Self {
        let config = config.resolve(order);
        let dim = mesh.dim();
        let geometry = mesh.geometry();
        let basis = Bernstein::new(dim, order);
        let nd = basis.n_dofs();
        let ne = mesh.n_elements();
        let n_points = order + 2;

        let mesh_velocity = match config.mode {
            ExecMode::Transport => vec![0.0; mesh.positions().len()],
            ExecMode::Remap => vertex_velocities(&mesh, &velocity),
        };

        let block_rows = |couplings: &dyn Fn(usize) -> Vec<usize>| {
            let mut rows = Vec::with_capacity(ne * nd);
            for k in 0..ne {
                let cols: Vec<usize> = couplings(k)
                    .into_iter()
                    .flat_map(|e| e * nd..(e + 1) * nd)
                    .collect();
                rows.extend(std::iter::repeat_n(cols, nd));
            }
            CsrMatrix::from_pattern(ne * nd, ne * nd, rows)
        };
        let mass = block_rows(&|k| vec![k]);
        let face_terms = config.face_terms_in_convection();
        let convection = if face_terms {
            block_rows(&|k| {
                let mut elems = vec![k];
                elems.extend((0..geometry.n_faces()).filter_map(|f| mesh.face_neighbor(k, f)));
                elems
            })
        } else {
            mass.zeros_like()
        };
        let preconditioned = config
            .preconditioned_upwinding()
            .then(|| mass.zeros_like());

        let mut space = Self {
            basis,
            mode: config.mode,
            face_terms,
            velocity: Box::new(velocity),
            inflow: Box::new(|_: &[f64]| 0.0),
            mesh_velocity,
            volume_rule: QuadratureRule::volume(dim, n_points),
            face_rules: (0..geometry.n_faces())
                .map(|f| QuadratureRule::face(geometry, f, n_points))
                .collect(),
            subcell_rule: QuadratureRule::volume(dim, 3),
            subcells: SubcellMap::new(dim, order),
            convection,
            preconditioned,
            mass,
            lumped_mass: vec![0.0; ne * nd],
            inflow_vector: vec![0.0; ne * nd],
            mesh,
        };
        space.reassemble();

        info!(
            "assembled {:?} space: {} elements, order {}, {} dofs, nnz(K) = {}",
            space.mode,
            ne,
            order,
            ne * nd,
            space.convection.nnz()
        );
        space
    }

    /// Set the inflow boundary value and reassemble b.
    pub fn with_inflow(mut self, inflow: impl ScalarField + 'static) -> Self {
        self.inflow = Box::new(inflow);
        self.reassemble();
        self
    }

    pub fn cartesian_mesh(&self) -> &CartesianMesh {
        &self.mesh
    }

    pub fn basis(&self) -> &Bernstein {
        &self.basis
    }

    #[inline]
    fn dim(&self) -> usize {
        self.basis.dim()
    }

    /// Coefficients taking the values of `f` at the equispaced lattice points.
    ///
    /// Bernstein coefficients obtained this way stay within the range of `f`.
    pub fn project(&self, f: impl Fn(&[f64]) -> f64) -> Vec<f64> {
        let dim = self.dim();
        let lattice = self.basis.lattice();
        let p = self.basis.order();
        let nd = lattice.n_dofs();
        let mut u = Vec::with_capacity(self.mesh.n_elements() * nd);
        for k in 0..self.mesh.n_elements() {
            for i in 0..nd {
                let c = lattice.coords(i);
                let mut xi = [0.5; 3];
                if p > 0 {
                    for d in 0..dim {
                        xi[d] = c[d] as f64 / p as f64;
                    }
                }
                let x = self.mesh.map_point(k, &xi[..dim]);
                u.push(f(&x[..dim]));
            }
        }
        u
    }

    /// Advection velocity at reference point `xi` of element `k`.
    fn advection_velocity(&self, k: usize, xi: &[f64; 3]) -> [f64; 3] {
        let dim = self.dim();
        let v = match self.mode {
            ExecMode::Transport => {
                let x = self.mesh.map_point(k, &xi[..dim]);
                self.velocity.velocity(&x[..dim])
            }
            ExecMode::Remap => self
                .mesh
                .interpolate_vertex_field(&self.mesh_velocity, k, &xi[..dim]),
        };
        let sign = self.mode.advection_sign();
        let mut w = [0.0; 3];
        for d in 0..dim {
            w[d] = sign * v[d];
        }
        w
    }

    /// Reassemble every operator on the current node positions.
    pub fn reassemble(&mut self) {
        let dim = self.dim();
        let nd = self.basis.n_dofs();
        let geometry = self.mesh.geometry();

        self.convection.fill(0.0);
        self.mass.fill(0.0);
        if let Some(p) = self.preconditioned.as_mut() {
            p.fill(0.0);
        }
        self.inflow_vector.fill(0.0);

        let mut values = vec![0.0; nd];
        let mut grads = vec![[0.0; 3]; nd];
        let mut nbr_values = vec![0.0; nd];
        let mut face = FaceQuadrature::default();

        for k in 0..self.mesh.n_elements() {
            let base = k * nd;
            let mut m_e = Mat::<f64>::zeros(nd, nd);
            let mut k_e = Mat::<f64>::zeros(nd, nd);

            for (xi, w) in self.volume_rule.iter() {
                let jac = self.mesh.jacobian(k, &xi[..dim]);
                let inv_t = jac.inverse_transpose();
                let wq = w * jac.det().abs();
                let vel = self.advection_velocity(k, xi);
                self.basis.eval_with_gradient(&xi[..dim], &mut values, &mut grads);
                for j in 0..nd {
                    let g = jac.physical_gradient(&inv_t, &grads[j][..dim]);
                    let adv = vel[0] * g[0] + vel[1] * g[1] + vel[2] * g[2];
                    for i in 0..nd {
                        m_e[(i, j)] += wq * values[i] * values[j];
                        k_e[(i, j)] -= wq * values[i] * adv;
                    }
                }
            }

            for f in 0..geometry.n_faces() {
                self.face_quadrature(k, f, &mut face);
                let neighbor = self.mesh.neighbor(k, f);
                for q in 0..face.len() {
                    let wn = face.normal_velocity(q);
                    if wn >= 0.0 {
                        continue;
                    }
                    let rate = face.weights[q] * wn;
                    let phi = face.shape(q);
                    let xi = self.face_rules[f].points()[q];

                    if self.face_terms {
                        for i in 0..nd {
                            for j in 0..nd {
                                k_e[(i, j)] += rate * phi[i] * phi[j];
                            }
                        }
                    }
                    match neighbor {
                        None => {
                            let x = self.mesh.map_point(k, &xi[..dim]);
                            let u_in = self.inflow.value(&x[..dim]);
                            for i in 0..nd {
                                self.inflow_vector[base + i] -= rate * u_in * phi[i];
                            }
                        }
                        Some(nbr) if self.face_terms => {
                            // Same physical point seen from the neighbor
                            let (axis, side) = geometry.face_axis(nbr.face);
                            debug_assert_eq!(axis, geometry.face_axis(f).0);
                            let mut xi_nbr = xi;
                            xi_nbr[axis] = side as f64;
                            self.basis.eval(&xi_nbr[..dim], &mut nbr_values);
                            let nbr_base = nbr.element * nd;
                            for i in 0..nd {
                                for j in 0..nd {
                                    self.convection.add(
                                        base + i,
                                        nbr_base + j,
                                        -rate * phi[i] * nbr_values[j],
                                    );
                                }
                            }
                        }
                        Some(_) => {}
                    }
                }
            }

            let mut lumped_e = vec![0.0; nd];
            for i in 0..nd {
                for j in 0..nd {
                    self.mass.add(base + i, base + j, m_e[(i, j)]);
                    self.convection.add(base + i, base + j, k_e[(i, j)]);
                    lumped_e[i] += m_e[(i, j)];
                }
            }
            self.lumped_mass[base..base + nd].copy_from_slice(&lumped_e);

            if let Some(p) = self.preconditioned.as_mut() {
                let lu = m_e.as_ref().full_piv_lu();
                let minv_k = lu.solve(&k_e);
                for i in 0..nd {
                    for j in 0..nd {
                        p.add(base + i, base + j, lumped_e[i] * minv_k[(i, j)]);
                    }
                }
            }
        }
    }
}

/// Velocity sampled at the mesh vertices, zero on non-periodic boundaries.
fn vertex_velocities(mesh: &CartesianMesh, velocity: &dyn VelocityField) -> Vec<f64> {
    let dim = mesh.dim();
    let mut out = vec![0.0; mesh.n_vertices() * dim];
    for v in 0..mesh.n_vertices() {
        if mesh.is_boundary_vertex(v) {
            continue;
        }
        let u = velocity.velocity(mesh.vertex(v));
        out[v * dim..(v + 1) * dim].copy_from_slice(&u[..dim]);
    }
    out
}

impl Discretization for DgSpace {
    type Mesh = CartesianMesh;

    fn mesh(&self) -> &CartesianMesh {
        &self.mesh
    }

    fn mode(&self) -> ExecMode {
        self.mode
    }

    fn order(&self) -> usize {
        self.basis.order()
    }

    fn dofs_per_element(&self) -> usize {
        self.basis.n_dofs()
    }

    fn convection_has_face_terms(&self) -> bool {
        self.face_terms
    }

    fn face_quadrature(&self, element: usize, face: usize, out: &mut FaceQuadrature) {
        let dim = self.dim();
        let nd = self.basis.n_dofs();
        let (axis, side) = self.mesh.geometry().face_axis(face);
        out.reset(nd);
        for (xi, w) in self.face_rules[face].iter() {
            let jac = self.mesh.jacobian(element, &xi[..dim]);
            let (normal, area) = jac.face_normal(axis, side);
            out.weights.push(w * area);
            out.normals.push(normal);
            out.velocities.push(self.advection_velocity(element, xi));
            let start = out.shapes.len();
            out.shapes.resize(start + nd, 0.0);
            self.basis.eval(&xi[..dim], &mut out.shapes[start..]);
        }
    }

    fn subcell_quadrature(&self, element: usize, subcell: usize, out: &mut SubcellQuadrature) {
        let dim = self.dim();
        let n_corners = 1 << dim;
        let p = self.basis.order() as f64;
        let cell = self.subcells.cell(subcell);
        out.reset(n_corners);
        for (eta, w) in self.subcell_rule.iter() {
            let mut xi = [0.0; 3];
            for d in 0..dim {
                xi[d] = (cell[d] as f64 + eta[d]) / p;
            }
            let jac = self.mesh.jacobian(element, &xi[..dim]);
            let inv_t = jac.inverse_transpose();
            out.weights.push(w * jac.det().abs() / p.powi(dim as i32));
            out.velocities.push(self.advection_velocity(element, &xi));
            for j in 0..n_corners {
                // Gradient of the multilinear corner function, d/dxi = p d/deta
                let mut g_ref = [0.0; 3];
                for (a, ga) in g_ref.iter_mut().enumerate().take(dim) {
                    let mut v = if (j >> a) & 1 == 1 { p } else { -p };
                    for d in (0..dim).filter(|&d| d != a) {
                        v *= if (j >> d) & 1 == 1 { eta[d] } else { 1.0 - eta[d] };
                    }
                    *ga = v;
                }
                out.gradients.push(jac.physical_gradient(&inv_t, &g_ref[..dim]));
            }
        }
    }

    fn convection(&self) -> &CsrMatrix {
        &self.convection
    }

    fn preconditioned_convection(&self) -> Option<&CsrMatrix> {
        self.preconditioned.as_ref()
    }

    fn mass(&self) -> &CsrMatrix {
        &self.mass
    }

    fn lumped_mass(&self) -> &[f64] {
        &self.lumped_mass
    }

    fn boundary_inflow(&self) -> &[f64] {
        &self.inflow_vector
    }

    fn node_positions(&self) -> &[f64] {
        self.mesh.positions()
    }

    fn mesh_velocity(&self) -> &[f64] {
        &self.mesh_velocity
    }

    fn set_node_positions(&mut self, positions: &[f64]) {
        self.mesh.set_positions(positions);
        self.reassemble();
    }
}
