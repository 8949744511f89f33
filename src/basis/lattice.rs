//! Tensor-product dof lattice of an order-p element.
//!
//! Local dof `i` sits at lattice coordinates (ix, iy, iz) with
//! i = ix + (p+1) iy + (p+1)^2 iz, x fastest.
//!
//! Face dofs are enumerated so that the two elements sharing a face can be
//! paired without geometric search:
//! - quadrilateral faces run counter-clockwise, so neighbors traverse a shared
//!   edge in reversed order
//! - hexahedron faces run lexicographically in the face plane, so neighbors
//!   traverse a shared face in the same order

use crate::mesh::Geometry;

/// Lattice of `(order+1)^dim` dofs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TensorLattice {
    dim: usize,
    order: usize,
}

impl TensorLattice {
    pub fn new(dim: usize, order: usize) -> Self {
        assert!((1..=3).contains(&dim), "dimension must be 1, 2 or 3");
        Self { dim, order }
    }

    #[inline]
    pub fn dim(&self) -> usize {
        self.dim
    }

    #[inline]
    pub fn order(&self) -> usize {
        self.order
    }

    /// Dofs along one axis.
    #[inline]
    pub fn n_1d(&self) -> usize {
        self.order + 1
    }

    /// Total number of dofs.
    #[inline]
    pub fn n_dofs(&self) -> usize {
        self.n_1d().pow(self.dim as u32)
    }

    /// Dofs on one face.
    #[inline]
    pub fn n_face_dofs(&self) -> usize {
        self.n_1d().pow(self.dim as u32 - 1)
    }

    /// Local index of lattice point `c` (unused axes ignored).
    #[inline]
    pub fn index(&self, c: [usize; 3]) -> usize {
        let n = self.n_1d();
        match self.dim {
            1 => c[0],
            2 => c[0] + n * c[1],
            _ => c[0] + n * (c[1] + n * c[2]),
        }
    }

    /// Lattice coordinates of local dof `i`.
    #[inline]
    pub fn coords(&self, i: usize) -> [usize; 3] {
        let n = self.n_1d();
        match self.dim {
            1 => [i, 0, 0],
            2 => [i % n, i / n, 0],
            _ => [i % n, (i / n) % n, i / (n * n)],
        }
    }

    /// Local dof at element corner `corner` (bit `d` set means the far side of axis `d`).
    pub fn corner_dof(&self, corner: usize) -> usize {
        let mut c = [0; 3];
        for (d, cd) in c.iter_mut().enumerate().take(self.dim) {
            if (corner >> d) & 1 == 1 {
                *cd = self.order;
            }
        }
        self.index(c)
    }

    /// Local dofs of face `face` in face enumeration order.
    pub fn face_dofs(&self, geometry: Geometry, face: usize) -> Vec<usize> {
        assert_eq!(geometry.dim(), self.dim, "geometry and lattice dimension differ");
        let p = self.order;
        let n = self.n_1d();
        match geometry {
            Geometry::Segment => match face {
                0 => vec![0],
                1 => vec![p],
                _ => panic!("segment has no face {face}"),
            },
            Geometry::Quadrilateral => (0..n)
                .map(|j| match face {
                    0 => j,
                    1 => p + j * n,
                    2 => p * n + (p - j),
                    3 => (p - j) * n,
                    _ => panic!("quadrilateral has no face {face}"),
                })
                .collect(),
            Geometry::Hexahedron => {
                let (axis, side) = geometry.face_axis(face);
                let mut dofs = Vec::with_capacity(n * n);
                // Lexicographic over the two remaining axes, lower axis fastest
                let (a, b) = match axis {
                    0 => (1, 2),
                    1 => (0, 2),
                    _ => (0, 1),
                };
                for jb in 0..n {
                    for ja in 0..n {
                        let mut c = [0; 3];
                        c[axis] = side * p;
                        c[a] = ja;
                        c[b] = jb;
                        dofs.push(self.index(c));
                    }
                }
                dofs
            }
            Geometry::Triangle | Geometry::Tetrahedron => {
                panic!("{geometry:?} has no tensor-product lattice")
            }
        }
    }

    /// Position in the neighbor's face enumeration of face dof `j`.
    #[inline]
    pub fn mirror_face_dof(&self, j: usize) -> usize {
        match self.dim {
            2 => self.order - j,
            _ => j,
        }
    }
}
