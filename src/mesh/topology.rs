//! Mesh connectivity trait.
//!
//! [`MeshTopology`] is all the dof topology needs from a mesh: the element
//! geometry, the element count and face-to-face adjacency. Geometry and node
//! coordinates live elsewhere so that connectivity can be consumed once and
//! kept immutable while nodes move.

use super::Geometry;

/// Information about a neighbor element across a face.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Neighbor {
    /// Index of the neighboring element.
    pub element: usize,
    /// Local face index on the neighboring element that shares this interface.
    pub face: usize,
}

/// Element and face connectivity of a mesh.
pub trait MeshTopology {
    /// Geometry shared by every element.
    fn geometry(&self) -> Geometry;

    /// Number of elements.
    fn n_elements(&self) -> usize;

    /// Element across local face `face` of `element`, `None` on the domain boundary.
    fn face_neighbor(&self, element: usize, face: usize) -> Option<usize>;

    /// Whether every face is shared by exactly two whole faces (no hanging nodes).
    fn is_conforming(&self) -> bool {
        true
    }

    /// Spatial dimension.
    #[inline]
    fn dim(&self) -> usize {
        self.geometry().dim()
    }

    /// Faces per element.
    #[inline]
    fn faces_per_element(&self) -> usize {
        self.geometry().n_faces()
    }

    /// Neighbor across a face together with the neighbor's local face index.
    ///
    /// The opposite face is preferred; other faces of the neighbor are only
    /// searched when the opposite face does not point back (periodic meshes
    /// with a single element across a direction point back through both).
    fn neighbor(&self, element: usize, face: usize) -> Option<Neighbor> {
        let nbr = self.face_neighbor(element, face)?;
        let geometry = self.geometry();
        let opposite = geometry.opposite_face(face);
        if self.face_neighbor(nbr, opposite) == Some(element) {
            return Some(Neighbor {
                element: nbr,
                face: opposite,
            });
        }
        (0..geometry.n_faces())
            .find(|&f| self.face_neighbor(nbr, f) == Some(element))
            .map(|f| Neighbor {
                element: nbr,
                face: f,
            })
    }
}
