//! Tensor-product Bernstein basis on the unit box.
//!
//! The 1D Bernstein polynomials of degree p on [0, 1] are
//! B_i(t) = C(p, i) t^i (1-t)^(p-i), i = 0..p.
//! They are nonnegative and sum to one, so the lumped mass matrix is positive
//! and element values are bounded by the extreme coefficients.

use super::TensorLattice;

/// Values of the degree-`order` Bernstein polynomials at `t`.
pub fn bernstein_1d(order: usize, t: f64, values: &mut [f64]) {
    assert_eq!(values.len(), order + 1);
    // de Casteljau style build-up: degree q from degree q-1
    values[0] = 1.0;
    for q in 1..=order {
        let mut saved = 0.0;
        for i in 0..q {
            let tmp = values[i];
            values[i] = saved + (1.0 - t) * tmp;
            saved = t * tmp;
        }
        values[q] = saved;
    }
}

/// Values and derivatives of the degree-`order` Bernstein polynomials at `t`.
///
/// B'_i = p (B^{p-1}_{i-1} - B^{p-1}_i).
pub fn bernstein_1d_with_derivative(order: usize, t: f64, values: &mut [f64], derivs: &mut [f64]) {
    assert_eq!(derivs.len(), order + 1);
    if order == 0 {
        values[0] = 1.0;
        derivs[0] = 0.0;
        return;
    }
    // Lower degree first, reusing the value buffer
    bernstein_1d(order - 1, t, &mut values[..order]);
    let p = order as f64;
    for i in 0..=order {
        let left = if i > 0 { values[i - 1] } else { 0.0 };
        let right = if i < order { values[i] } else { 0.0 };
        derivs[i] = p * (left - right);
    }
    bernstein_1d(order, t, values);
}

/// Bernstein basis of a segment, quadrilateral or hexahedron.
#[derive(Clone, Debug)]
pub struct Bernstein {
    lattice: TensorLattice,
}

impl Bernstein {
    pub fn new(dim: usize, order: usize) -> Self {
        Self {
            lattice: TensorLattice::new(dim, order),
        }
    }

    #[inline]
    pub fn lattice(&self) -> &TensorLattice {
        &self.lattice
    }

    #[inline]
    pub fn order(&self) -> usize {
        self.lattice.order()
    }

    #[inline]
    pub fn dim(&self) -> usize {
        self.lattice.dim()
    }

    #[inline]
    pub fn n_dofs(&self) -> usize {
        self.lattice.n_dofs()
    }

    /// Basis values at reference point `xi`.
    pub fn eval(&self, xi: &[f64], values: &mut [f64]) {
        let n = self.lattice.n_1d();
        let dim = self.dim();
        let mut axis = [[0.0; 16]; 3];
        assert!(n <= 16, "order above 15 is not supported");
        for d in 0..dim {
            bernstein_1d(self.order(), xi[d], &mut axis[d][..n]);
        }
        for (i, v) in values.iter_mut().enumerate().take(self.n_dofs()) {
            let c = self.lattice.coords(i);
            *v = (0..dim).map(|d| axis[d][c[d]]).product();
        }
    }

    /// Basis values and reference gradients at `xi`.
    pub fn eval_with_gradient(&self, xi: &[f64], values: &mut [f64], grads: &mut [[f64; 3]]) {
        let n = self.lattice.n_1d();
        let dim = self.dim();
        assert!(n <= 16, "order above 15 is not supported");
        let mut axis = [[0.0; 16]; 3];
        let mut daxis = [[0.0; 16]; 3];
        for d in 0..dim {
            bernstein_1d_with_derivative(self.order(), xi[d], &mut axis[d][..n], &mut daxis[d][..n]);
        }
        for i in 0..self.n_dofs() {
            let c = self.lattice.coords(i);
            values[i] = (0..dim).map(|d| axis[d][c[d]]).product();
            let mut g = [0.0; 3];
            for (a, ga) in g.iter_mut().enumerate().take(dim) {
                *ga = (0..dim)
                    .map(|d| if d == a { daxis[d][c[d]] } else { axis[d][c[d]] })
                    .product();
            }
            grads[i] = g;
        }
    }
}
