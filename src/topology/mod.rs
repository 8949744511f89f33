//! Dof topology precomputed from static mesh connectivity.
//!
//! [`TopologyIndex`] is built once per mesh and never changes afterwards, even
//! when node coordinates move. It holds:
//! - the face dof lists of the reference lattice
//! - the [`FaceNeighborMap`] pairing face dofs across interfaces
//! - the [`VertexBoundsMap`] listing the elements that bound each dof
//! - the [`SubcellMap`] of the lattice
//!
//! Only conforming meshes of segments, quadrilaterals or hexahedra are
//! accepted; anything else would make the bound computation unsound.

mod bounds;
mod neighbors;
mod subcell;

pub use bounds::{DofRange, ElementRange, VertexBoundsMap};
pub use neighbors::{FaceNeighborMap, common_neighbor};
pub use subcell::SubcellMap;

use log::info;

use crate::basis::TensorLattice;
use crate::error::TopologyError;
use crate::mesh::{Geometry, MeshTopology};

/// Connectivity-derived dof structures.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TopologyIndex {
    geometry: Geometry,
    lattice: TensorLattice,
    n_elements: usize,
    face_dofs: Vec<Vec<usize>>,
    face_neighbors: FaceNeighborMap,
    vertex_bounds: VertexBoundsMap,
    subcells: SubcellMap,
}

impl TopologyIndex {
    /// Build the index for order-`order` elements on `mesh`.
    pub fn new<M: MeshTopology + ?Sized>(mesh: &M, order: usize) -> Result<Self, TopologyError> {
        let geometry = mesh.geometry();
        if !geometry.is_tensor_product() {
            return Err(TopologyError::UnsupportedGeometry(geometry));
        }
        if !mesh.is_conforming() {
            return Err(TopologyError::NonConforming);
        }
        let n_elements = mesh.n_elements();
        if n_elements == 0 {
            return Err(TopologyError::EmptyMesh);
        }

        let dim = geometry.dim();
        let lattice = TensorLattice::new(dim, order);
        let face_dofs: Vec<Vec<usize>> = (0..geometry.n_faces())
            .map(|f| lattice.face_dofs(geometry, f))
            .collect();
        let face_neighbors = FaceNeighborMap::build(mesh, &lattice, &face_dofs)?;
        let vertex_bounds =
            Self::build_vertex_bounds(mesh, &lattice, &face_dofs, &face_neighbors)?;
        let subcells = SubcellMap::new(dim, order);

        info!(
            "dof topology: {n_elements} {geometry:?} elements, order {order}, {} dofs per element",
            lattice.n_dofs()
        );

        Ok(Self {
            geometry,
            lattice,
            n_elements,
            face_dofs,
            face_neighbors,
            vertex_bounds,
            subcells,
        })
    }

    fn build_vertex_bounds<M: MeshTopology + ?Sized>(
        mesh: &M,
        lattice: &TensorLattice,
        face_dofs: &[Vec<usize>],
        face_neighbors: &FaceNeighborMap,
    ) -> Result<VertexBoundsMap, TopologyError> {
        let geometry = mesh.geometry();
        let n_faces = geometry.n_faces();
        let nd = lattice.n_dofs();
        let mut bounds = VertexBoundsMap::with_dofs(mesh.n_elements() * nd);

        for k in 0..mesh.n_elements() {
            let base = k * nd;
            for i in 0..nd {
                bounds.insert(base + i, k);
            }

            let nbrs = face_neighbors.element_neighbors(k);
            for (f, nbr) in nbrs.iter().enumerate() {
                if let Some(n) = *nbr {
                    for &i in &face_dofs[f] {
                        bounds.insert(base + i, n);
                    }
                }
            }

            match geometry.dim() {
                2 => {
                    for corner in 0..4 {
                        let fx = geometry.face_on(0, corner & 1);
                        let fy = geometry.face_on(1, (corner >> 1) & 1);
                        if let (Some(a), Some(b)) = (nbrs[fx], nbrs[fy]) {
                            if let Some(c) = common_neighbor(mesh, k, a, b)? {
                                bounds.insert(base + lattice.corner_dof(corner), c);
                            }
                        }
                    }
                }
                3 => {
                    // Edge neighbors, indexed by the pair of faces meeting at the edge
                    let mut edges = vec![None; n_faces * n_faces];
                    for fa in 0..n_faces {
                        for fb in (fa + 1)..n_faces {
                            if geometry.face_axis(fa).0 == geometry.face_axis(fb).0 {
                                continue;
                            }
                            let (Some(a), Some(b)) = (nbrs[fa], nbrs[fb]) else {
                                continue;
                            };
                            let Some(e) = common_neighbor(mesh, k, a, b)? else {
                                continue;
                            };
                            edges[fa * n_faces + fb] = Some(e);
                            edges[fb * n_faces + fa] = Some(e);
                            for &i in face_dofs[fa].iter().filter(|i| face_dofs[fb].contains(i)) {
                                bounds.insert(base + i, e);
                            }
                        }
                    }
                    for corner in 0..8 {
                        let fx = geometry.face_on(0, corner & 1);
                        let fy = geometry.face_on(1, (corner >> 1) & 1);
                        let fz = geometry.face_on(2, (corner >> 2) & 1);
                        let (Some(z), Some(ey), Some(ex)) = (
                            nbrs[fz],
                            edges[fz * n_faces + fy],
                            edges[fz * n_faces + fx],
                        ) else {
                            continue;
                        };
                        if let Some(c) = common_neighbor(mesh, z, ey, ex)? {
                            bounds.insert(base + lattice.corner_dof(corner), c);
                        }
                    }
                }
                _ => {}
            }
        }
        Ok(bounds)
    }

    #[inline]
    pub fn geometry(&self) -> Geometry {
        self.geometry
    }

    #[inline]
    pub fn lattice(&self) -> &TensorLattice {
        &self.lattice
    }

    #[inline]
    pub fn dim(&self) -> usize {
        self.lattice.dim()
    }

    #[inline]
    pub fn order(&self) -> usize {
        self.lattice.order()
    }

    #[inline]
    pub fn n_elements(&self) -> usize {
        self.n_elements
    }

    /// Dofs per element.
    #[inline]
    pub fn dofs_per_element(&self) -> usize {
        self.lattice.n_dofs()
    }

    /// Total number of dofs.
    #[inline]
    pub fn n_dofs(&self) -> usize {
        self.n_elements * self.lattice.n_dofs()
    }

    #[inline]
    pub fn n_faces(&self) -> usize {
        self.face_dofs.len()
    }

    /// Dofs per face.
    #[inline]
    pub fn n_face_dofs(&self) -> usize {
        self.lattice.n_face_dofs()
    }

    /// Local dofs of face `f` in enumeration order.
    #[inline]
    pub fn face_dofs(&self, f: usize) -> &[usize] {
        &self.face_dofs[f]
    }

    pub fn face_neighbors(&self) -> &FaceNeighborMap {
        &self.face_neighbors
    }

    pub fn vertex_bounds(&self) -> &VertexBoundsMap {
        &self.vertex_bounds
    }

    pub fn subcells(&self) -> &SubcellMap {
        &self.subcells
    }

    /// Admissible range of global dof `dof`.
    #[inline]
    pub fn dof_range(&self, dof: usize, ranges: &ElementRange) -> DofRange {
        self.vertex_bounds.dof_range(dof, ranges)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::CartesianMesh;

    struct SimplexMesh;

    impl MeshTopology for SimplexMesh {
        fn geometry(&self) -> Geometry {
            Geometry::Triangle
        }
        fn n_elements(&self) -> usize {
            1
        }
        fn face_neighbor(&self, _element: usize, _face: usize) -> Option<usize> {
            None
        }
    }

    struct HangingNodes(CartesianMesh);

    impl MeshTopology for HangingNodes {
        fn geometry(&self) -> Geometry {
            self.0.geometry()
        }
        fn n_elements(&self) -> usize {
            self.0.n_elements()
        }
        fn face_neighbor(&self, element: usize, face: usize) -> Option<usize> {
            self.0.face_neighbor(element, face)
        }
        fn is_conforming(&self) -> bool {
            false
        }
    }

    /// Elements 1 and 2 flank element 0 and share two further neighbors, 3 and 4.
    struct Tangled;

    impl MeshTopology for Tangled {
        fn geometry(&self) -> Geometry {
            Geometry::Quadrilateral
        }
        fn n_elements(&self) -> usize {
            5
        }
        fn face_neighbor(&self, element: usize, face: usize) -> Option<usize> {
            let table: [[Option<usize>; 4]; 5] = [
                [Some(1), None, None, Some(2)],
                [Some(3), Some(4), Some(0), None],
                [Some(3), Some(0), Some(4), None],
                [None, None, Some(1), Some(2)],
                [Some(2), None, None, Some(1)],
            ];
            table[element][face]
        }
    }

    #[test]
    fn test_rejects_simplices() {
        assert_eq!(
            TopologyIndex::new(&SimplexMesh, 2),
            Err(TopologyError::UnsupportedGeometry(Geometry::Triangle))
        );
    }

    #[test]
    fn test_rejects_non_conforming() {
        let mesh = HangingNodes(CartesianMesh::rectangle(0.0, 1.0, 0.0, 1.0, 2, 2));
        assert_eq!(TopologyIndex::new(&mesh, 1), Err(TopologyError::NonConforming));
    }

    #[test]
    fn test_ambiguous_corner_is_fatal() {
        match TopologyIndex::new(&Tangled, 1) {
            Err(TopologyError::AmbiguousCommonNeighbor { .. }) => {}
            other => panic!("expected ambiguity error, got {other:?}"),
        }
    }

    #[test]
    fn test_corner_neighbors_2d() {
        let mesh = CartesianMesh::rectangle(0.0, 1.0, 0.0, 1.0, 3, 3);
        let topo = TopologyIndex::new(&mesh, 2).unwrap();
        let nd = topo.dofs_per_element();
        let centre = 4 * nd;
        // Lower-left corner dof of the centre element sees the 4 elements around it
        let mut lower_left = topo.vertex_bounds().elements(centre).to_vec();
        lower_left.sort_unstable();
        assert_eq!(lower_left, vec![0, 1, 3, 4]);
        // Bottom edge midpoint only sees the owner and the element below
        let mut bottom = topo.vertex_bounds().elements(centre + 1).to_vec();
        bottom.sort_unstable();
        assert_eq!(bottom, vec![1, 4]);
        // Interior dof sees only its owner
        assert_eq!(topo.vertex_bounds().elements(centre + 4), &[4]);
        // Owner always comes first
        assert_eq!(topo.vertex_bounds().elements(centre)[0], 4);
    }

    #[test]
    fn test_edge_and_corner_neighbors_3d() {
        let mesh = CartesianMesh::cuboid([0.0; 3], [1.0; 3], [2, 2, 2]);
        let topo = TopologyIndex::new(&mesh, 1).unwrap();
        let nd = topo.dofs_per_element();
        // The corner of element 0 at (1, 1, 1) is shared by all 8 elements
        let dof = topo.lattice().corner_dof(7);
        let mut list = topo.vertex_bounds().elements(dof).to_vec();
        list.sort_unstable();
        assert_eq!(list, (0..8).collect::<Vec<_>>());
        // The corner at the origin touches only element 0
        assert_eq!(topo.vertex_bounds().elements(0), &[0]);
        // Element 7, corner at its origin, again shared by all 8
        let mut list = topo.vertex_bounds().elements(7 * nd).to_vec();
        list.sort_unstable();
        assert_eq!(list.len(), 8);
    }

    #[test]
    fn test_every_dof_has_bounds() {
        let mesh = CartesianMesh::rectangle_periodic(0.0, 1.0, 0.0, 1.0, 3, 4);
        let topo = TopologyIndex::new(&mesh, 3).unwrap();
        for dof in 0..topo.n_dofs() {
            assert!(!topo.vertex_bounds().elements(dof).is_empty());
        }
        // Periodic: every corner dof sees four elements
        for k in 0..topo.n_elements() {
            let list = topo.vertex_bounds().elements(k * topo.dofs_per_element());
            assert_eq!(list.len(), 4);
        }
    }

    #[test]
    fn test_deterministic() {
        let mesh = CartesianMesh::cuboid_periodic([0.0; 3], [1.0; 3], [3, 2, 2]);
        let a = TopologyIndex::new(&mesh, 2).unwrap();
        let b = TopologyIndex::new(&mesh, 2).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.face_neighbors(), b.face_neighbors());
        assert_eq!(a.vertex_bounds(), b.vertex_bounds());
        assert_eq!(a.subcells(), b.subcells());
    }
}
