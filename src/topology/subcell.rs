//! Subcell decomposition of the dof lattice.
//!
//! An order-p element splits into p^d subcells, one per cell of its
//! (p+1)^d dof lattice. Subcell m sits at lattice cell
//! (m mod p, (m / p) mod p, m / p^2) and its corner j (bit d of j set means
//! the far side of axis d) is the element dof
//!
//! - 1D: m + j
//! - 2D: aux + {0, 1, p+1, p+2}[j], aux = m + m/p
//! - 3D: aux + {0, 1, p+1, p+2}[j mod 4] + (p+1)^2 [j >= 4],
//!   aux = m + m/p + (p+1)(m/p^2)

/// Closed-form subcell-corner to element-dof mapping.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubcellMap {
    dim: usize,
    order: usize,
    n_subcells: usize,
    n_corners: usize,
    /// Element dof of every (subcell, corner), indexed `m * n_corners + j`
    dofs: Vec<usize>,
}

impl SubcellMap {
    pub fn new(dim: usize, order: usize) -> Self {
        let n_subcells = order.pow(dim as u32);
        let n_corners = 1 << dim;
        let mut dofs = Vec::with_capacity(n_subcells * n_corners);
        for m in 0..n_subcells {
            for j in 0..n_corners {
                dofs.push(Self::corner_dof(dim, order, m, j));
            }
        }
        Self {
            dim,
            order,
            n_subcells,
            n_corners,
            dofs,
        }
    }

    fn corner_dof(dim: usize, p: usize, m: usize, j: usize) -> usize {
        let q = p + 1;
        let planar = [0, 1, q, q + 1];
        match dim {
            1 => m + j,
            2 => m + m / p + planar[j],
            _ => {
                let aux = m + m / p + q * (m / (p * p));
                aux + planar[j % 4] + if j >= 4 { q * q } else { 0 }
            }
        }
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn order(&self) -> usize {
        self.order
    }

    /// Number of subcells (zero for piecewise constants).
    #[inline]
    pub fn n_subcells(&self) -> usize {
        self.n_subcells
    }

    /// Corners per subcell.
    #[inline]
    pub fn n_corners(&self) -> usize {
        self.n_corners
    }

    /// Element dof at corner `j` of subcell `m`.
    #[inline]
    pub fn dof(&self, m: usize, j: usize) -> usize {
        self.dofs[m * self.n_corners + j]
    }

    /// Element dofs of all corners of subcell `m`.
    #[inline]
    pub fn corners(&self, m: usize) -> &[usize] {
        &self.dofs[m * self.n_corners..(m + 1) * self.n_corners]
    }

    /// Lattice cell of subcell `m`.
    pub fn cell(&self, m: usize) -> [usize; 3] {
        let p = self.order;
        match self.dim {
            1 => [m, 0, 0],
            2 => [m % p, m / p, 0],
            _ => [m % p, (m / p) % p, m / (p * p)],
        }
    }
}
