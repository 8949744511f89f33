//! Jacobian of the reference-to-physical map.

/// Jacobian matrix J[i][j] = dx_i / dxi_j, stored padded to 3x3.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Jacobian {
    dim: usize,
    m: [[f64; 3]; 3],
}

impl Jacobian {
    /// Zero Jacobian of the given dimension.
    pub fn zeros(dim: usize) -> Self {
        assert!((1..=3).contains(&dim), "dimension must be 1, 2 or 3");
        Self {
            dim,
            m: [[0.0; 3]; 3],
        }
    }

    /// Dimension.
    #[inline]
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Entry dx_i / dxi_j.
    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.m[i][j]
    }

    /// Accumulate into entry (i, j).
    #[inline]
    pub fn add(&mut self, i: usize, j: usize, value: f64) {
        self.m[i][j] += value;
    }

    /// Determinant.
    pub fn det(&self) -> f64 {
        let m = &self.m;
        match self.dim {
            1 => m[0][0],
            2 => m[0][0] * m[1][1] - m[0][1] * m[1][0],
            _ => {
                m[0][0] * (m[1][1] * m[2][2] - m[1][2] * m[2][1])
                    - m[0][1] * (m[1][0] * m[2][2] - m[1][2] * m[2][0])
                    + m[0][2] * (m[1][0] * m[2][1] - m[1][1] * m[2][0])
            }
        }
    }

    /// Inverse transpose J^{-T}, padded with zeros.
    pub fn inverse_transpose(&self) -> [[f64; 3]; 3] {
        let m = &self.m;
        let det = self.det();
        let mut out = [[0.0; 3]; 3];
        match self.dim {
            1 => out[0][0] = 1.0 / det,
            2 => {
                // J^{-1} = [m11 -m01; -m10 m00] / det, then transpose
                out[0][0] = m[1][1] / det;
                out[0][1] = -m[1][0] / det;
                out[1][0] = -m[0][1] / det;
                out[1][1] = m[0][0] / det;
            }
            _ => {
                // Cofactor matrix divided by det is exactly J^{-T}
                for i in 0..3 {
                    for j in 0..3 {
                        let (i1, i2) = ((i + 1) % 3, (i + 2) % 3);
                        let (j1, j2) = ((j + 1) % 3, (j + 2) % 3);
                        out[i][j] = (m[i1][j1] * m[i2][j2] - m[i1][j2] * m[i2][j1]) / det;
                    }
                }
            }
        }
        out
    }

    /// Map a reference gradient to a physical gradient: J^{-T} g.
    pub fn physical_gradient(&self, inv_t: &[[f64; 3]; 3], g_ref: &[f64]) -> [f64; 3] {
        let mut g = [0.0; 3];
        for (i, gi) in g.iter_mut().enumerate().take(self.dim) {
            for (j, &gr) in g_ref.iter().enumerate().take(self.dim) {
                *gi += inv_t[i][j] * gr;
            }
        }
        g
    }

    /// Outward unit normal and surface measure of the reference face
    /// `xi_axis = side` (Nanson's formula).
    pub fn face_normal(&self, axis: usize, side: usize) -> ([f64; 3], f64) {
        let inv_t = self.inverse_transpose();
        let sign = if side == 1 { 1.0 } else { -1.0 };
        let scale = self.det().abs() * sign;
        let mut n = [0.0; 3];
        for (i, ni) in n.iter_mut().enumerate().take(self.dim) {
            *ni = scale * inv_t[i][axis];
        }
        let area = n.iter().map(|v| v * v).sum::<f64>().sqrt();
        for ni in &mut n {
            *ni /= area;
        }
        (n, area)
    }
}
