//! Upwind face-flux stencils and subcell residual weights.
//!
//! Both are integrals of the advection velocity against the geometry, so they
//! are fixed in transport mode and rebuilt after every mesh move in remap
//! mode. A rebuild produces a complete new [`StencilSnapshot`] before it is
//! published; readers holding the previous `Arc` keep a consistent view.

use std::sync::Arc;

use log::debug;

use crate::config::EvolutionConfig;
use crate::operators::{Discretization, FaceQuadrature, SubcellQuadrature};
use crate::parallel::for_each_element;
use crate::topology::TopologyIndex;

/// Immutable set of per-element coefficients for one mesh configuration.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StencilSnapshot {
    n_faces: usize,
    n_face_dofs: usize,
    n_subcells: usize,
    n_corners: usize,
    /// Indexed `((k * n_faces + f) * n_face_dofs + i) * n_face_dofs + j`
    flux: Vec<f64>,
    /// Indexed `(k * n_subcells + m) * n_corners + j`
    subcell_weights: Vec<f64>,
}

impl StencilSnapshot {
    /// Integrate the stencils the scheme needs on the current geometry.
    ///
    /// The flux stencil of face `f` couples face dofs `i` and `j`:
    /// F(k, f, i, j) = -sum_q w_q min(0, w.n) phi_i phi_j, nonnegative.
    /// The subcell weight of corner `j` is -int_m w.grad(psi_j).
    pub fn build<D: Discretization>(
        disc: &D,
        topology: &TopologyIndex,
        config: &EvolutionConfig,
    ) -> Self {
        let ne = topology.n_elements();
        let n_faces = topology.n_faces();
        let n_face_dofs = topology.n_face_dofs();
        let subcells = topology.subcells();

        let mut snapshot = Self {
            n_faces,
            n_face_dofs,
            n_subcells: 0,
            n_corners: subcells.n_corners(),
            flux: Vec::new(),
            subcell_weights: Vec::new(),
        };

        if config.needs_flux_stencils() {
            let size = n_face_dofs * n_face_dofs;
            let block = n_faces * size;
            snapshot.flux = vec![0.0; ne * block];
            for_each_element(&mut snapshot.flux, block, |k, out| {
                let mut face = FaceQuadrature::default();
                for f in 0..n_faces {
                    disc.face_quadrature(k, f, &mut face);
                    let fd = topology.face_dofs(f);
                    let out_f = &mut out[f * size..(f + 1) * size];
                    for q in 0..face.len() {
                        let wn = face.normal_velocity(q);
                        if wn >= 0.0 {
                            continue;
                        }
                        let rate = -face.weights[q] * wn;
                        let phi = face.shape(q);
                        for (i, &di) in fd.iter().enumerate() {
                            let ri = rate * phi[di];
                            for (j, &dj) in fd.iter().enumerate() {
                                out_f[i * n_face_dofs + j] += ri * phi[dj];
                            }
                        }
                    }
                }
            });
        }

        if config.needs_subcell_weights() && subcells.n_subcells() > 0 {
            let n_subcells = subcells.n_subcells();
            let n_corners = subcells.n_corners();
            let block = n_subcells * n_corners;
            snapshot.n_subcells = n_subcells;
            snapshot.subcell_weights = vec![0.0; ne * block];
            for_each_element(&mut snapshot.subcell_weights, block, |k, out| {
                let mut sub = SubcellQuadrature::default();
                for m in 0..n_subcells {
                    disc.subcell_quadrature(k, m, &mut sub);
                    let row = &mut out[m * n_corners..(m + 1) * n_corners];
                    for q in 0..sub.len() {
                        let v = sub.velocities[q];
                        for (j, g) in sub.gradients_at(q).iter().enumerate() {
                            row[j] -= sub.weights[q] * (v[0] * g[0] + v[1] * g[1] + v[2] * g[2]);
                        }
                    }
                }
            });
        }

        snapshot
    }

    pub fn has_flux(&self) -> bool {
        !self.flux.is_empty()
    }

    pub fn has_subcell_weights(&self) -> bool {
        !self.subcell_weights.is_empty()
    }

    #[inline]
    pub fn n_face_dofs(&self) -> usize {
        self.n_face_dofs
    }

    #[inline]
    pub fn n_subcells(&self) -> usize {
        self.n_subcells
    }

    /// Flux stencil entry F(k, f, i, j).
    #[inline]
    pub fn flux(&self, k: usize, f: usize, i: usize, j: usize) -> f64 {
        let n = self.n_face_dofs;
        self.flux[((k * self.n_faces + f) * n + i) * n + j]
    }

    /// Row-major `n_face_dofs x n_face_dofs` block of face `f` of element `k`.
    #[inline]
    pub fn face_block(&self, k: usize, f: usize) -> &[f64] {
        let size = self.n_face_dofs * self.n_face_dofs;
        &self.flux[(k * self.n_faces + f) * size..][..size]
    }

    /// Subcell weight W(k, m, j).
    #[inline]
    pub fn subcell_weight(&self, k: usize, m: usize, j: usize) -> f64 {
        self.subcell_weights[(k * self.n_subcells + m) * self.n_corners + j]
    }

    /// Corner weights of subcell `m` of element `k`.
    #[inline]
    pub fn subcell_row(&self, k: usize, m: usize) -> &[f64] {
        let start = (k * self.n_subcells + m) * self.n_corners;
        &self.subcell_weights[start..start + self.n_corners]
    }
}

/// Owner of the current stencil snapshot.
#[derive(Clone, Debug)]
pub struct StencilAssembly {
    current: Arc<StencilSnapshot>,
}

impl StencilAssembly {
    /// Build the initial snapshot.
    pub fn new<D: Discretization>(
        disc: &D,
        topology: &TopologyIndex,
        config: &EvolutionConfig,
    ) -> Self {
        Self {
            current: Arc::new(StencilSnapshot::build(disc, topology, config)),
        }
    }

    /// Shared handle to the published snapshot.
    pub fn snapshot(&self) -> Arc<StencilSnapshot> {
        Arc::clone(&self.current)
    }

    #[inline]
    pub fn current(&self) -> &StencilSnapshot {
        &self.current
    }

    /// Recompute on the discretization's current geometry, then publish.
    pub fn rebuild<D: Discretization>(
        &mut self,
        disc: &D,
        topology: &TopologyIndex,
        config: &EvolutionConfig,
    ) {
        let next = StencilSnapshot::build(disc, topology, config);
        debug!(
            "stencils rebuilt: {} flux, {} subcell coefficients",
            next.flux.len(),
            next.subcell_weights.len()
        );
        self.current = Arc::new(next);
    }
}
