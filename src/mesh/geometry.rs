//! Reference element geometry and local face numbering.
//!
//! The reference element is the unit box [0, 1]^d. Faces are numbered the
//! same way for every mesh:
//!
//! - Segment: 0 (x=0), 1 (x=1)
//! - Quadrilateral: 0 (y=0), 1 (x=1), 2 (y=1), 3 (x=0), counter-clockwise
//! - Hexahedron: 0 (z=0), 1 (y=0), 2 (x=1), 3 (y=1), 4 (x=0), 5 (z=1)

/// Element geometry type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Geometry {
    Segment,
    Quadrilateral,
    Hexahedron,
    /// Simplices are recognised so they can be rejected
    Triangle,
    Tetrahedron,
}

/// (axis, side) of every face, indexed by local face number.
const SEGMENT_FACES: [(usize, usize); 2] = [(0, 0), (0, 1)];
const QUAD_FACES: [(usize, usize); 4] = [(1, 0), (0, 1), (1, 1), (0, 0)];
const HEX_FACES: [(usize, usize); 6] = [(2, 0), (1, 0), (0, 1), (1, 1), (0, 0), (2, 1)];

impl Geometry {
    /// Tensor-product geometry of the given dimension.
    pub fn tensor(dim: usize) -> Option<Self> {
        match dim {
            1 => Some(Geometry::Segment),
            2 => Some(Geometry::Quadrilateral),
            3 => Some(Geometry::Hexahedron),
            _ => None,
        }
    }

    /// Spatial dimension.
    pub fn dim(self) -> usize {
        match self {
            Geometry::Segment => 1,
            Geometry::Quadrilateral | Geometry::Triangle => 2,
            Geometry::Hexahedron | Geometry::Tetrahedron => 3,
        }
    }

    /// Whether the geometry carries a tensor-product dof lattice.
    pub fn is_tensor_product(self) -> bool {
        matches!(
            self,
            Geometry::Segment | Geometry::Quadrilateral | Geometry::Hexahedron
        )
    }

    /// Number of faces (vertices in 1D, edges in 2D).
    pub fn n_faces(self) -> usize {
        match self {
            Geometry::Segment => 2,
            Geometry::Triangle => 3,
            Geometry::Quadrilateral | Geometry::Tetrahedron => 4,
            Geometry::Hexahedron => 6,
        }
    }

    /// Number of corners.
    pub fn n_vertices(self) -> usize {
        match self {
            Geometry::Segment => 2,
            Geometry::Triangle => 3,
            Geometry::Quadrilateral | Geometry::Tetrahedron => 4,
            Geometry::Hexahedron => 8,
        }
    }

    fn face_table(self) -> &'static [(usize, usize)] {
        match self {
            Geometry::Segment => &SEGMENT_FACES,
            Geometry::Quadrilateral => &QUAD_FACES,
            Geometry::Hexahedron => &HEX_FACES,
            Geometry::Triangle | Geometry::Tetrahedron => {
                panic!("{self:?} has no axis-aligned faces")
            }
        }
    }

    /// Reference axis normal to a face and the side (0 or 1) it lies on.
    pub fn face_axis(self, face: usize) -> (usize, usize) {
        let table = self.face_table();
        assert!(face < table.len(), "face {face} out of range for {self:?}");
        table[face]
    }

    /// Local face lying on `side` of `axis`.
    pub fn face_on(self, axis: usize, side: usize) -> usize {
        self.face_table()
            .iter()
            .position(|&f| f == (axis, side))
            .unwrap_or_else(|| panic!("{self:?} has no face on axis {axis}, side {side}"))
    }

    /// Face on the other side of the element.
    pub fn opposite_face(self, face: usize) -> usize {
        let (axis, side) = self.face_axis(face);
        self.face_on(axis, 1 - side)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opposite_faces() {
        assert_eq!(Geometry::Segment.opposite_face(0), 1);
        for f in 0..4 {
            assert_eq!(Geometry::Quadrilateral.opposite_face(f), (f + 2) % 4);
        }
        assert_eq!(Geometry::Hexahedron.opposite_face(0), 5);
        assert_eq!(Geometry::Hexahedron.opposite_face(1), 3);
        assert_eq!(Geometry::Hexahedron.opposite_face(2), 4);
    }

    #[test]
    fn test_face_round_trip() {
        for geom in [Geometry::Segment, Geometry::Quadrilateral, Geometry::Hexahedron] {
            for f in 0..geom.n_faces() {
                let (axis, side) = geom.face_axis(f);
                assert_eq!(geom.face_on(axis, side), f);
            }
        }
    }

    #[test]
    fn test_simplices_are_not_tensor() {
        assert!(!Geometry::Triangle.is_tensor_product());
        assert!(!Geometry::Tetrahedron.is_tensor_product());
        assert_eq!(Geometry::tensor(3), Some(Geometry::Hexahedron));
        assert_eq!(Geometry::tensor(4), None);
    }
}
