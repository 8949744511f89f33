//! Gauss-Legendre quadrature on the unit interval and its tensor products.
//!
//! The n Gauss-Legendre nodes are the roots of P_n. They are found by Newton
//! iteration from Chebyshev initial guesses and then mapped from [-1, 1] to
//! [0, 1]. An n-point rule integrates polynomials up to degree 2n-1 exactly.

use std::f64::consts::PI;

use crate::mesh::Geometry;

/// Evaluate P_n(x) and P'_n(x) by the three-term recurrence.
fn legendre_and_derivative(n: usize, x: f64) -> (f64, f64) {
    let mut p_prev = 1.0;
    let mut p_curr = x;
    if n == 0 {
        return (1.0, 0.0);
    }
    for k in 1..n {
        let p_next = ((2 * k + 1) as f64 * x * p_curr - k as f64 * p_prev) / (k + 1) as f64;
        p_prev = p_curr;
        p_curr = p_next;
    }
    // P'_n = n (x P_n - P_{n-1}) / (x^2 - 1), nodes are strictly interior
    let dp = n as f64 * (x * p_curr - p_prev) / (x * x - 1.0);
    (p_curr, dp)
}

/// Nodes and weights of the `n`-point Gauss-Legendre rule on [0, 1].
pub fn gauss_legendre(n: usize) -> (Vec<f64>, Vec<f64>) {
    assert!(n > 0, "need at least one quadrature point");
    let mut nodes = Vec::with_capacity(n);
    let mut weights = Vec::with_capacity(n);
    for j in 0..n {
        // Negated Chebyshev guesses give the roots in ascending order
        let mut x = -(PI * (j as f64 + 0.75) / (n as f64 + 0.5)).cos();
        for _ in 0..100 {
            let (p, dp) = legendre_and_derivative(n, x);
            let update = p / dp;
            x -= update;
            if update.abs() < 1e-15 {
                break;
            }
        }
        let (_, dp) = legendre_and_derivative(n, x);
        let w = 2.0 / ((1.0 - x * x) * dp * dp);
        nodes.push(0.5 * (x + 1.0));
        weights.push(0.5 * w);
    }
    (nodes, weights)
}

/// Quadrature rule on the reference box or one of its faces.
///
/// Points are stored in element reference coordinates, padded to 3 entries.
#[derive(Clone, Debug)]
pub struct QuadratureRule {
    points: Vec<[f64; 3]>,
    weights: Vec<f64>,
}

impl QuadratureRule {
    /// Tensor rule with `n` points per axis on [0, 1]^dim.
    pub fn volume(dim: usize, n: usize) -> Self {
        let (nodes, w1d) = gauss_legendre(n);
        let mut points = Vec::new();
        let mut weights = Vec::new();
        let nz = if dim > 2 { n } else { 1 };
        let ny = if dim > 1 { n } else { 1 };
        for iz in 0..nz {
            for iy in 0..ny {
                for ix in 0..n {
                    let mut p = [0.0; 3];
                    let mut w = w1d[ix];
                    p[0] = nodes[ix];
                    if dim > 1 {
                        p[1] = nodes[iy];
                        w *= w1d[iy];
                    }
                    if dim > 2 {
                        p[2] = nodes[iz];
                        w *= w1d[iz];
                    }
                    points.push(p);
                    weights.push(w);
                }
            }
        }
        Self { points, weights }
    }

    /// Rule on local face `face`, with `n` points per tangential axis.
    ///
    /// Weights integrate over the unit reference face; in 1D the face is a
    /// single point of weight one.
    pub fn face(geometry: Geometry, face: usize, n: usize) -> Self {
        let dim = geometry.dim();
        let (axis, side) = geometry.face_axis(face);
        if dim == 1 {
            return Self {
                points: vec![[side as f64, 0.0, 0.0]],
                weights: vec![1.0],
            };
        }
        let tangential = Self::volume(dim - 1, n);
        let mut points = Vec::with_capacity(tangential.len());
        let mut weights = Vec::with_capacity(tangential.len());
        for (q, w) in tangential.iter() {
            let mut p = [0.0; 3];
            let mut t = 0;
            for (d, pd) in p.iter_mut().enumerate().take(dim) {
                if d == axis {
                    *pd = side as f64;
                } else {
                    *pd = q[t];
                    t += 1;
                }
            }
            points.push(p);
            weights.push(w);
        }
        Self { points, weights }
    }

    /// Number of points.
    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    pub fn points(&self) -> &[[f64; 3]] {
        &self.points
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// Iterate over (point, weight) pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&[f64; 3], f64)> + '_ {
        self.points.iter().zip(self.weights.iter().copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weights_sum_to_one() {
        for n in 1..=8 {
            let (_, w) = gauss_legendre(n);
            let sum: f64 = w.iter().sum();
            assert!((sum - 1.0).abs() < 1e-14, "n = {n}: sum = {sum}");
        }
    }

    #[test]
    fn test_exactness() {
        // n points integrate t^k exactly for k <= 2n-1
        for n in 1..=6 {
            let (x, w) = gauss_legendre(n);
            for k in 0..2 * n {
                let approx: f64 = x.iter().zip(&w).map(|(&t, &wt)| wt * t.powi(k as i32)).sum();
                let exact = 1.0 / (k as f64 + 1.0);
                assert!((approx - exact).abs() < 1e-13, "n = {n}, k = {k}");
            }
        }
    }

    #[test]
    fn test_nodes_ascending_and_interior() {
        let (x, _) = gauss_legendre(5);
        for pair in x.windows(2) {
            assert!(pair[0] < pair[1]);
        }
        assert!(x[0] > 0.0 && x[4] < 1.0);
        assert!((x[2] - 0.5).abs() < 1e-15);
    }

    #[test]
    fn test_volume_and_face_rules() {
        let rule = QuadratureRule::volume(3, 3);
        assert_eq!(rule.len(), 27);
        let sum: f64 = rule.weights().iter().sum();
        assert!((sum - 1.0).abs() < 1e-14);

        let face = QuadratureRule::face(Geometry::Hexahedron, 2, 3);
        assert_eq!(face.len(), 9);
        assert!(face.points().iter().all(|p| p[0] == 1.0));
        let sum: f64 = face.weights().iter().sum();
        assert!((sum - 1.0).abs() < 1e-14);

        let face = QuadratureRule::face(Geometry::Quadrilateral, 0, 4);
        assert!(face.points().iter().all(|p| p[1] == 0.0));

        let face = QuadratureRule::face(Geometry::Segment, 1, 4);
        assert_eq!(face.len(), 1);
        assert_eq!(face.points()[0][0], 1.0);
    }
}
