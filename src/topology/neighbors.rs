//! Face-neighbor dof pairing and common-neighbor queries.

use crate::basis::TensorLattice;
use crate::error::TopologyError;
use crate::mesh::MeshTopology;

/// For every (element, face, face dof) the mirror dof on the neighbor across
/// that face, or `None` on the domain boundary.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FaceNeighborMap {
    n_faces: usize,
    n_face_dofs: usize,
    /// Neighbor element, indexed `k * n_faces + f`
    elements: Vec<Option<usize>>,
    /// Neighbor global dof, indexed `(k * n_faces + f) * n_face_dofs + i`
    dofs: Vec<Option<usize>>,
}

impl FaceNeighborMap {
    /// Pair face dofs across every interior face.
    ///
    /// `face_dofs[f]` lists the local dofs of face `f` in enumeration order.
    pub fn build<M: MeshTopology + ?Sized>(
        mesh: &M,
        lattice: &TensorLattice,
        face_dofs: &[Vec<usize>],
    ) -> Result<Self, TopologyError> {
        let n_elements = mesh.n_elements();
        let n_faces = mesh.faces_per_element();
        let n_face_dofs = lattice.n_face_dofs();
        let nd = lattice.n_dofs();

        let mut elements = Vec::with_capacity(n_elements * n_faces);
        let mut dofs = Vec::with_capacity(n_elements * n_faces * n_face_dofs);

        for k in 0..n_elements {
            for f in 0..n_faces {
                let Some(nbr) = mesh.face_neighbor(k, f) else {
                    elements.push(None);
                    dofs.extend(std::iter::repeat_n(None, n_face_dofs));
                    continue;
                };
                let across = mesh
                    .neighbor(k, f)
                    .ok_or(TopologyError::AsymmetricNeighbors {
                        element: k,
                        neighbor: nbr,
                    })?;
                elements.push(Some(nbr));
                let nbr_face = &face_dofs[across.face];
                for i in 0..n_face_dofs {
                    let local = nbr_face[lattice.mirror_face_dof(i)];
                    dofs.push(Some(nbr * nd + local));
                }
            }
        }

        Ok(Self {
            n_faces,
            n_face_dofs,
            elements,
            dofs,
        })
    }

    /// Element across face `f` of element `k`.
    #[inline]
    pub fn neighbor_element(&self, k: usize, f: usize) -> Option<usize> {
        self.elements[k * self.n_faces + f]
    }

    /// Global dof paired with face dof `i` of face `f` of element `k`.
    #[inline]
    pub fn neighbor_dof(&self, k: usize, f: usize, i: usize) -> Option<usize> {
        self.dofs[(k * self.n_faces + f) * self.n_face_dofs + i]
    }

    /// Face neighbors of element `k`, one entry per local face.
    #[inline]
    pub fn element_neighbors(&self, k: usize) -> &[Option<usize>] {
        &self.elements[k * self.n_faces..(k + 1) * self.n_faces]
    }
}

/// The unique element other than `exclude` sharing a face with both `a` and `b`.
///
/// Returns `Ok(None)` when there is no such element and an error when two
/// distinct elements qualify.
pub fn common_neighbor<M: MeshTopology + ?Sized>(
    mesh: &M,
    exclude: usize,
    a: usize,
    b: usize,
) -> Result<Option<usize>, TopologyError> {
    let n_faces = mesh.faces_per_element();
    let mut found: Option<usize> = None;
    for fa in 0..n_faces {
        let Some(candidate) = mesh.face_neighbor(a, fa) else {
            continue;
        };
        if candidate == exclude {
            continue;
        }
        let shared = (0..n_faces).any(|fb| mesh.face_neighbor(b, fb) == Some(candidate));
        if !shared {
            continue;
        }
        match found {
            None => found = Some(candidate),
            Some(first) if first != candidate => {
                return Err(TopologyError::AmbiguousCommonNeighbor {
                    element: exclude,
                    a,
                    b,
                    first,
                    second: candidate,
                });
            }
            Some(_) => {}
        }
    }
    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::{CartesianMesh, Geometry};

    #[test]
    fn test_common_neighbor_on_grid() {
        // 3x3 grid, centre element 4
        let mesh = CartesianMesh::rectangle(0.0, 1.0, 0.0, 1.0, 3, 3);
        // Right neighbor 5 and top neighbor 7 meet at 8
        assert_eq!(common_neighbor(&mesh, 4, 5, 7), Ok(Some(8)));
        // Left 3 and bottom 1 meet at 0
        assert_eq!(common_neighbor(&mesh, 4, 3, 1), Ok(Some(0)));
        // Opposite neighbors share only the centre
        assert_eq!(common_neighbor(&mesh, 4, 3, 5), Ok(None));
    }

    #[test]
    fn test_face_dofs_pair_across_interface() {
        let mesh = CartesianMesh::rectangle(0.0, 2.0, 0.0, 1.0, 2, 1);
        let lattice = TensorLattice::new(2, 2);
        let face_dofs: Vec<Vec<usize>> = (0..4)
            .map(|f| lattice.face_dofs(Geometry::Quadrilateral, f))
            .collect();
        let map = FaceNeighborMap::build(&mesh, &lattice, &face_dofs).unwrap();

        assert_eq!(map.neighbor_element(0, 1), Some(1));
        assert_eq!(map.neighbor_element(0, 3), None);
        // Right face of element 0 is dofs 2, 5, 8; they meet 0, 3, 6 of element 1
        let nd = lattice.n_dofs();
        assert_eq!(map.neighbor_dof(0, 1, 0), Some(nd));
        assert_eq!(map.neighbor_dof(0, 1, 1), Some(nd + 3));
        assert_eq!(map.neighbor_dof(0, 1, 2), Some(nd + 6));
        assert_eq!(map.neighbor_dof(1, 3, 0), Some(8));
        assert_eq!(map.neighbor_dof(0, 0, 0), None);
    }
}
