//! Monotone low-order derivatives.
//!
//! Discrete upwinding adds the minimal artificial diffusion to K that makes
//! every off-diagonal coupling nonnegative. Residual distribution keeps the
//! element residual of K x and hands it out to the element's nodes with
//! weights favouring nodes far from the element extremum the residual pushes
//! towards. Both are local extremum diminishing under the forward Euler limit
//! returned by [`forward_euler_limit`].

use crate::error::SparsityError;
use crate::operators::CsrMatrix;
use crate::parallel::for_each_element;
use crate::stencil::StencilSnapshot;
use crate::topology::TopologyIndex;

use super::EPS;

/// Blending strength of subcell and element weights.
const SUBCELL_GAMMA: f64 = 10.0;

/// Discrete upwind matrix D of a convection matrix, kept in sync on reassembly.
#[derive(Clone, Debug)]
pub struct DiscreteUpwinding {
    transpose: Vec<usize>,
    matrix: CsrMatrix,
}

impl DiscreteUpwinding {
    /// Build D from K.
    ///
    /// K must have a structurally symmetric pattern with every diagonal entry
    /// stored.
    pub fn new(k: &CsrMatrix) -> Result<Self, SparsityError> {
        let transpose = k.transpose_map()?;
        if let Some(row) = (0..k.n_rows()).find(|&i| k.find(i, i).is_none()) {
            return Err(SparsityError::MissingDiagonal(row));
        }
        let mut matrix = k.zeros_like();
        discrete_upwind_matrix(k, &transpose, &mut matrix);
        Ok(Self { transpose, matrix })
    }

    /// Recompute D from a reassembled K on the same sparsity pattern.
    pub fn update(&mut self, k: &CsrMatrix) {
        assert!(
            k.same_pattern(&self.matrix),
            "convection pattern changed after construction"
        );
        discrete_upwind_matrix(k, &self.transpose, &mut self.matrix);
    }

    #[inline]
    pub fn matrix(&self) -> &CsrMatrix {
        &self.matrix
    }

    /// Forward Euler limit of y = M_L^{-1} D x.
    pub fn stable_time_step(&self, lumped_mass: &[f64]) -> f64 {
        forward_euler_limit(&self.matrix.diagonal(), lumped_mass)
    }
}

/// Write the discrete upwind matrix of `k` into `d`.
///
/// For i != j, d_ij = max(0, -K_ij, -K_ji), D_ij = K_ij + d_ij, and the
/// diagonal absorbs the added diffusion so row sums of D equal those of K.
/// `transpose` is the mirror map from [`CsrMatrix::transpose_map`].
///
/// # Panics
///
/// Panics if a row of `k` has no stored diagonal entry.
pub fn discrete_upwind_matrix(k: &CsrMatrix, transpose: &[usize], d: &mut CsrMatrix) {
    debug_assert!(k.same_pattern(d));
    let kv = k.values();
    let cols = k.col_indices();
    for i in 0..k.n_rows() {
        let mut diag = None;
        let mut added = 0.0;
        for idx in k.row_range(i) {
            if cols[idx] == i {
                diag = Some(idx);
                continue;
            }
            let dij = 0.0_f64.max(-kv[idx]).max(-kv[transpose[idx]]);
            d.values_mut()[idx] = kv[idx] + dij;
            added += dij;
        }
        let idx = diag.unwrap_or_else(|| panic!("row {i} has no diagonal entry"));
        d.values_mut()[idx] = kv[idx] - added;
    }
}

/// Diagonal of the discrete upwind matrix of `k`, without building D.
pub fn upwind_diagonal(k: &CsrMatrix) -> Vec<f64> {
    (0..k.n_rows())
        .map(|i| {
            let (cols, vals) = k.row(i);
            cols.iter()
                .zip(vals)
                .map(|(&j, &kij)| {
                    if j == i {
                        kij
                    } else {
                        -(0.0_f64.max(-kij).max(-k.get(j, i)))
                    }
                })
                .sum()
        })
        .collect()
}

/// Largest dt keeping x + dt M_L^{-1} A x a convex combination, given the
/// diagonal of A. Rows with a nonnegative diagonal impose no limit.
pub fn forward_euler_limit(diagonal: &[f64], lumped_mass: &[f64]) -> f64 {
    diagonal
        .iter()
        .zip(lumped_mass)
        .filter(|(d, _)| **d < 0.0)
        .map(|(d, m)| m / -d)
        .fold(f64::INFINITY, f64::min)
}

/// Per dof, the total flux stencil coupling of its faces.
///
/// Flux lumping with alpha = 0 contributes minus this to the diagonal of the
/// low-order operator.
pub fn lumped_flux_diagonal(topology: &TopologyIndex, stencils: &StencilSnapshot) -> Vec<f64> {
    let nd = topology.dofs_per_element();
    let n = topology.n_face_dofs();
    let mut out = vec![0.0; topology.n_dofs()];
    if !stencils.has_flux() {
        return out;
    }
    for k in 0..topology.n_elements() {
        for f in 0..topology.n_faces() {
            let block = stencils.face_block(k, f);
            for (i, &di) in topology.face_dofs(f).iter().enumerate() {
                out[k * nd + di] += block[i * n..(i + 1) * n].iter().sum::<f64>();
            }
        }
    }
    out
}

/// Add the lumped face fluxes of element `k` to its local rows `y`.
///
/// With face differences xDiff = x_neighbor - x_own (neighbor value 0 on the
/// boundary), y_i += sum_j F(k, f, i, j) (xDiff_i + (xDiff_j - xDiff_i) alpha^2).
/// alpha = 0 gives the monotone low-order flux, alpha = 1 the high-order one.
pub fn linear_flux_lumping(
    topology: &TopologyIndex,
    stencils: &StencilSnapshot,
    k: usize,
    x: &[f64],
    alpha: f64,
    y: &mut [f64],
) {
    let nd = topology.dofs_per_element();
    let n = topology.n_face_dofs();
    let base = k * nd;
    let neighbors = topology.face_neighbors();
    let a2 = alpha * alpha;
    let mut diff = vec![0.0; n];

    for f in 0..topology.n_faces() {
        let fd = topology.face_dofs(f);
        for (i, &di) in fd.iter().enumerate() {
            let outside = neighbors.neighbor_dof(k, f, i).map_or(0.0, |g| x[g]);
            diff[i] = outside - x[base + di];
        }
        let block = stencils.face_block(k, f);
        for (i, &di) in fd.iter().enumerate() {
            let row = &block[i * n..(i + 1) * n];
            y[di] += row
                .iter()
                .zip(&diff)
                .map(|(fij, dj)| fij * (diff[i] + (dj - diff[i]) * a2))
                .sum::<f64>();
        }
    }
}

/// Discrete upwinding: y = M_L^{-1} (D x + b [+ lumped low-order fluxes]).
///
/// `lumping` is set for the preconditioned variant, whose D carries no face
/// terms.
pub fn discrete_upwind_derivative(
    upwind: &CsrMatrix,
    inflow: &[f64],
    lumped_mass: &[f64],
    lumping: Option<(&TopologyIndex, &StencilSnapshot)>,
    nd: usize,
    x: &[f64],
    y: &mut [f64],
) {
    upwind.mat_vec_mul(x, y);
    for_each_element(y, nd, |k, y_e| {
        let base = k * nd;
        if let Some((topology, stencils)) = lumping {
            linear_flux_lumping(topology, stencils, k, x, 0.0, y_e);
        }
        for (i, yi) in y_e.iter_mut().enumerate() {
            *yi = (*yi + inflow[base + i]) / lumped_mass[base + i];
        }
    });
}

/// Residual distribution with optional subcell fluctuations.
///
/// The subcell variant is used when `stencils` carries subcell weights.
/// `residual` is scratch space for K x.
#[allow(clippy::too_many_arguments)]
pub fn residual_distribution_derivative(
    convection: &CsrMatrix,
    inflow: &[f64],
    lumped_mass: &[f64],
    topology: &TopologyIndex,
    stencils: &StencilSnapshot,
    x: &[f64],
    residual: &mut [f64],
    y: &mut [f64],
) {
    let nd = topology.dofs_per_element();
    convection.mat_vec_mul(x, residual);
    let z: &[f64] = residual;
    let subcell = stencils.has_subcell_weights();

    for_each_element(y, nd, |k, y_e| {
        let base = k * nd;
        let x_e = &x[base..base + nd];
        let z_e = &z[base..base + nd];

        y_e.copy_from_slice(&inflow[base..base + nd]);
        linear_flux_lumping(topology, stencils, k, x, 0.0, y_e);

        let weights = if subcell {
            ResidualWeights::with_subcells(topology, stencils, k, x_e, z_e)
        } else {
            ResidualWeights::element(x_e)
        };

        for (i, yi) in y_e.iter_mut().enumerate() {
            let (wp, wn) = weights.node(i, x_e[i]);
            for &zj in z_e {
                if zj > EPS {
                    *yi += wp * zj;
                } else if zj < -EPS {
                    *yi += wn * zj;
                }
            }
            *yi /= lumped_mass[base + i];
        }
    });
}

/// Distribution weights of one element.
#[derive(Clone, Debug, PartialEq)]
pub struct ResidualWeights {
    /// Element maximum and minimum
    pub x_max: f64,
    pub x_min: f64,
    /// sum_i (x_max - x_i) + eps
    pub sum_p: f64,
    /// sum_i (x_min - x_i) - eps
    pub sum_n: f64,
    subcell: Option<SubcellBlend>,
}

#[derive(Clone, Debug, PartialEq)]
struct SubcellBlend {
    rho_p: f64,
    rho_n: f64,
    fluct_p: f64,
    fluct_n: f64,
    nodal_p: Vec<f64>,
    nodal_n: Vec<f64>,
}

impl ResidualWeights {
    /// Element-level weights only.
    pub fn element(x_e: &[f64]) -> Self {
        let nd = x_e.len() as f64;
        let (x_min, x_max) = x_e
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            });
        let sum: f64 = x_e.iter().sum();
        Self {
            x_max,
            x_min,
            sum_p: nd * x_max - sum + EPS,
            sum_n: nd * x_min - sum - EPS,
            subcell: None,
        }
    }

    /// Element weights blended with nodal weights from subcell fluctuations.
    fn with_subcells(
        topology: &TopologyIndex,
        stencils: &StencilSnapshot,
        k: usize,
        x_e: &[f64],
        z_e: &[f64],
    ) -> Self {
        let mut weights = Self::element(x_e);
        let map = topology.subcells();
        let n_corners = map.n_corners() as f64;
        let mut blend = SubcellBlend {
            rho_p: z_e.iter().map(|&z| z.max(0.0)).sum(),
            rho_n: z_e.iter().map(|&z| z.min(0.0)).sum(),
            fluct_p: 0.0,
            fluct_n: 0.0,
            nodal_p: vec![0.0; x_e.len()],
            nodal_n: vec![0.0; x_e.len()],
        };

        for m in 0..map.n_subcells() {
            let corners = map.corners(m);
            let fluct: f64 = stencils
                .subcell_row(k, m)
                .iter()
                .zip(corners)
                .map(|(w, &c)| w * x_e[c])
                .sum();
            let (mut lo, mut hi, mut sum) = (f64::INFINITY, f64::NEG_INFINITY, 0.0);
            for &c in corners {
                lo = lo.min(x_e[c]);
                hi = hi.max(x_e[c]);
                sum += x_e[c];
            }
            let sum_p = n_corners * hi - sum + EPS;
            let sum_n = n_corners * lo - sum - EPS;
            let fp = fluct.max(0.0);
            let fn_ = fluct.min(0.0);
            blend.fluct_p += fp;
            blend.fluct_n += fn_;
            for &c in corners {
                blend.nodal_p[c] += fp * (hi - x_e[c]) / sum_p;
                blend.nodal_n[c] += fn_ * (lo - x_e[c]) / sum_n;
            }
        }

        weights.subcell = Some(blend);
        weights
    }

    /// Positive and negative residual weights of local node `i` with value `xi`.
    pub fn node(&self, i: usize, xi: f64) -> (f64, f64) {
        let mut wp = (self.x_max - xi) / self.sum_p;
        let mut wn = (self.x_min - xi) / self.sum_n;
        if let Some(b) = &self.subcell {
            let aux = SUBCELL_GAMMA / (b.rho_p + EPS);
            wp *= 1.0 - (aux * b.fluct_p).min(1.0);
            wp += aux.min(1.0 / (b.fluct_p + EPS)) * b.nodal_p[i];

            let aux = SUBCELL_GAMMA / (b.rho_n - EPS);
            wn *= 1.0 - (aux * b.fluct_n).min(1.0);
            wn += aux.max(1.0 / (b.fluct_n - EPS)) * b.nodal_n[i];
        }
        (wp, wn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upwind_sample() -> CsrMatrix {
        CsrMatrix::from_triplets(
            3,
            3,
            &[
                (0, 0, -1.0),
                (0, 1, 2.0),
                (0, 2, -0.5),
                (1, 0, -3.0),
                (1, 1, 0.5),
                (1, 2, 1.0),
                (2, 0, 0.25),
                (2, 1, -1.0),
                (2, 2, 0.0),
            ],
        )
    }

    #[test]
    fn test_upwind_matrix_properties() {
        let k = upwind_sample();
        let du = DiscreteUpwinding::new(&k).unwrap();
        let d = du.matrix();
        for (a, b) in d.row_sums().iter().zip(k.row_sums()) {
            assert!((a - b).abs() < 1e-14);
        }
        for i in 0..3 {
            for j in 0..3 {
                if i != j {
                    assert!(d.get(i, j) >= 0.0, "D[{i}][{j}] = {}", d.get(i, j));
                }
            }
        }
        // d_01 = max(0, -2, 3) = 3
        assert_eq!(d.get(0, 1), 5.0);
        assert_eq!(d.get(1, 0), 0.0);
        assert_eq!(du.matrix().diagonal(), upwind_diagonal(&k));
    }

    #[test]
    fn test_missing_diagonal_rejected() {
        let k = CsrMatrix::from_triplets(2, 2, &[(0, 1, 1.0), (1, 0, 1.0), (1, 1, 1.0)]);
        assert_eq!(
            DiscreteUpwinding::new(&k).err(),
            Some(SparsityError::MissingDiagonal(0))
        );
    }

    #[test]
    fn test_forward_euler_limit() {
        let diag = [-2.0, 0.5, -4.0];
        let mass = [1.0, 1.0, 1.0];
        assert_eq!(forward_euler_limit(&diag, &mass), 0.25);
        assert_eq!(forward_euler_limit(&[0.0], &[1.0]), f64::INFINITY);
    }

    #[test]
    fn test_element_weights_sum_to_one() {
        let x = [0.0, 1.0, 0.25, 0.5];
        let w = ResidualWeights::element(&x);
        let (sp, sn) = x.iter().enumerate().fold((0.0, 0.0), |(sp, sn), (i, &xi)| {
            let (p, n) = w.node(i, xi);
            (sp + p, sn + n)
        });
        assert!((sp - 1.0).abs() < 1e-12);
        assert!((sn - 1.0).abs() < 1e-12);
        // The node at the maximum takes no positive residual
        assert_eq!(w.node(1, 1.0).0, 0.0);
    }
}
