//! Structured meshes of segments, quadrilaterals and hexahedra.
//!
//! Elements are numbered lexicographically (x fastest), as are the vertices of
//! the (n_x+1) x (n_y+1) x (n_z+1) vertex grid. Corner `c` of an element is
//! the vertex offset by bit `d` of `c` along axis `d`, so corners follow the
//! same lexicographic order as the order-1 dof lattice.
//!
//! Geometry is multilinear in the corner positions, which may be moved after
//! construction (remap). Connectivity never changes.

use super::{Geometry, Jacobian, MeshTopology};

/// Structured mesh of a box, optionally periodic per axis.
#[derive(Clone, Debug)]
pub struct CartesianMesh {
    geometry: Geometry,
    /// Cells per axis (1 for unused axes)
    cells: [usize; 3],
    /// Periodicity per axis
    periodic: [bool; 3],
    /// Vertex coordinates, `dim` values per vertex
    positions: Vec<f64>,
    /// Corner vertices, `2^dim` per element
    element_vertices: Vec<usize>,
    /// Face neighbors, `n_faces` per element
    neighbors: Vec<Option<usize>>,
    /// Vertices on a non-periodic domain boundary
    boundary_vertex: Vec<bool>,
}

impl CartesianMesh {
    /// Uniform mesh of the box `[lower, upper]` with `cells[d]` cells along axis `d`.
    ///
    /// Only the first `dim` entries of each array are used.
    ///
    /// # Panics
    ///
    /// Panics if `dim` is not 1, 2 or 3, or an axis has no cells or an empty extent.
    pub fn new(
        dim: usize,
        lower: [f64; 3],
        upper: [f64; 3],
        cells: [usize; 3],
        periodic: [bool; 3],
    ) -> Self {
        let Some(geometry) = Geometry::tensor(dim) else {
            panic!("dimension must be 1, 2 or 3, got {dim}");
        };
        let mut cells_used = [1usize; 3];
        let mut periodic_used = [false; 3];
        for d in 0..dim {
            assert!(cells[d] > 0, "need at least one cell along axis {d}");
            assert!(upper[d] > lower[d], "upper bound must exceed lower bound on axis {d}");
            cells_used[d] = cells[d];
            periodic_used[d] = periodic[d];
        }

        let verts = [cells_used[0] + 1, cells_used[1] + 1, cells_used[2] + 1];
        let vert_count = |d: usize| if d < dim { verts[d] } else { 1 };
        let n_vertices = vert_count(0) * vert_count(1) * vert_count(2);

        let mut positions = Vec::with_capacity(n_vertices * dim);
        let mut boundary_vertex = Vec::with_capacity(n_vertices);
        for vz in 0..vert_count(2) {
            for vy in 0..vert_count(1) {
                for vx in 0..vert_count(0) {
                    let v = [vx, vy, vz];
                    let mut on_boundary = false;
                    for d in 0..dim {
                        let h = (upper[d] - lower[d]) / cells_used[d] as f64;
                        positions.push(lower[d] + v[d] as f64 * h);
                        if !periodic_used[d] && (v[d] == 0 || v[d] == cells_used[d]) {
                            on_boundary = true;
                        }
                    }
                    boundary_vertex.push(on_boundary);
                }
            }
        }

        let n_elements = cells_used[0] * cells_used[1] * cells_used[2];
        let n_corners = geometry.n_vertices();
        let n_faces = geometry.n_faces();
        let vertex_index = |v: [usize; 3]| v[0] + verts[0] * (v[1] + verts[1] * v[2]);

        let mut element_vertices = Vec::with_capacity(n_elements * n_corners);
        let mut neighbors = Vec::with_capacity(n_elements * n_faces);
        for k in 0..n_elements {
            let c = [
                k % cells_used[0],
                (k / cells_used[0]) % cells_used[1],
                k / (cells_used[0] * cells_used[1]),
            ];
            for corner in 0..n_corners {
                let mut v = c;
                for (d, vd) in v.iter_mut().enumerate().take(dim) {
                    *vd += (corner >> d) & 1;
                }
                element_vertices.push(vertex_index(v));
            }
            for f in 0..n_faces {
                let (axis, side) = geometry.face_axis(f);
                let n = cells_used[axis];
                let shifted = if side == 1 {
                    if c[axis] + 1 < n {
                        Some(c[axis] + 1)
                    } else if periodic_used[axis] {
                        Some(0)
                    } else {
                        None
                    }
                } else if c[axis] > 0 {
                    Some(c[axis] - 1)
                } else if periodic_used[axis] {
                    Some(n - 1)
                } else {
                    None
                };
                neighbors.push(shifted.map(|s| {
                    let mut nc = c;
                    nc[axis] = s;
                    nc[0] + cells_used[0] * (nc[1] + cells_used[1] * nc[2])
                }));
            }
        }

        Self {
            geometry,
            cells: cells_used,
            periodic: periodic_used,
            positions,
            element_vertices,
            neighbors,
            boundary_vertex,
        }
    }

    /// Uniform segment mesh of [x0, x1].
    pub fn segment(x0: f64, x1: f64, n: usize) -> Self {
        Self::new(1, [x0, 0.0, 0.0], [x1, 0.0, 0.0], [n, 1, 1], [false; 3])
    }

    /// Uniform periodic segment mesh of [x0, x1].
    pub fn segment_periodic(x0: f64, x1: f64, n: usize) -> Self {
        Self::new(1, [x0, 0.0, 0.0], [x1, 0.0, 0.0], [n, 1, 1], [true, false, false])
    }

    /// Uniform quadrilateral mesh of [x0, x1] x [y0, y1].
    pub fn rectangle(x0: f64, x1: f64, y0: f64, y1: f64, nx: usize, ny: usize) -> Self {
        Self::new(2, [x0, y0, 0.0], [x1, y1, 0.0], [nx, ny, 1], [false; 3])
    }

    /// Uniform doubly periodic quadrilateral mesh.
    pub fn rectangle_periodic(x0: f64, x1: f64, y0: f64, y1: f64, nx: usize, ny: usize) -> Self {
        Self::new(2, [x0, y0, 0.0], [x1, y1, 0.0], [nx, ny, 1], [true, true, false])
    }

    /// Uniform hexahedral mesh of a box.
    pub fn cuboid(lower: [f64; 3], upper: [f64; 3], cells: [usize; 3]) -> Self {
        Self::new(3, lower, upper, cells, [false; 3])
    }

    /// Uniform triply periodic hexahedral mesh.
    pub fn cuboid_periodic(lower: [f64; 3], upper: [f64; 3], cells: [usize; 3]) -> Self {
        Self::new(3, lower, upper, cells, [true; 3])
    }

    /// Cells per axis.
    pub fn cells(&self) -> [usize; 3] {
        self.cells
    }

    /// Periodicity per axis.
    pub fn periodic(&self) -> [bool; 3] {
        self.periodic
    }

    /// Number of vertices.
    pub fn n_vertices(&self) -> usize {
        self.boundary_vertex.len()
    }

    /// Vertex coordinates, `dim` values per vertex.
    pub fn positions(&self) -> &[f64] {
        &self.positions
    }

    /// Replace the vertex coordinates.
    pub fn set_positions(&mut self, positions: &[f64]) {
        assert_eq!(positions.len(), self.positions.len(), "position length mismatch");
        self.positions.copy_from_slice(positions);
    }

    /// Whether a vertex lies on a non-periodic boundary.
    pub fn is_boundary_vertex(&self, vertex: usize) -> bool {
        self.boundary_vertex[vertex]
    }

    /// Corner vertices of element `k`.
    pub fn element_vertices(&self, k: usize) -> &[usize] {
        let n = self.geometry.n_vertices();
        &self.element_vertices[k * n..(k + 1) * n]
    }

    /// Coordinates of a vertex.
    pub fn vertex(&self, v: usize) -> &[f64] {
        let dim = self.geometry.dim();
        &self.positions[v * dim..(v + 1) * dim]
    }

    /// Multilinear corner weights at reference point `xi`.
    pub fn corner_weights(dim: usize, xi: &[f64], weights: &mut [f64]) {
        for (corner, w) in weights.iter_mut().enumerate().take(1 << dim) {
            *w = (0..dim)
                .map(|d| if (corner >> d) & 1 == 1 { xi[d] } else { 1.0 - xi[d] })
                .product();
        }
    }

    /// Physical point of reference coordinate `xi` in element `k`.
    pub fn map_point(&self, k: usize, xi: &[f64]) -> [f64; 3] {
        let dim = self.geometry.dim();
        let mut w = [0.0; 8];
        Self::corner_weights(dim, xi, &mut w);
        let mut x = [0.0; 3];
        for (corner, &v) in self.element_vertices(k).iter().enumerate() {
            let p = self.vertex(v);
            for d in 0..dim {
                x[d] += w[corner] * p[d];
            }
        }
        x
    }

    /// Jacobian of the map at reference coordinate `xi` in element `k`.
    pub fn jacobian(&self, k: usize, xi: &[f64]) -> Jacobian {
        let dim = self.geometry.dim();
        let mut jac = Jacobian::zeros(dim);
        for (corner, &v) in self.element_vertices(k).iter().enumerate() {
            let p = self.vertex(v);
            for a in 0..dim {
                // d/dxi_a of the corner weight
                let mut dw = if (corner >> a) & 1 == 1 { 1.0 } else { -1.0 };
                for d in (0..dim).filter(|&d| d != a) {
                    dw *= if (corner >> d) & 1 == 1 { xi[d] } else { 1.0 - xi[d] };
                }
                for i in 0..dim {
                    jac.add(i, a, dw * p[i]);
                }
            }
        }
        jac
    }

    /// Interpolate a vertex field (`dim` values per vertex) at `xi` in element `k`.
    pub fn interpolate_vertex_field(&self, field: &[f64], k: usize, xi: &[f64]) -> [f64; 3] {
        let dim = self.geometry.dim();
        let mut w = [0.0; 8];
        Self::corner_weights(dim, xi, &mut w);
        let mut out = [0.0; 3];
        for (corner, &v) in self.element_vertices(k).iter().enumerate() {
            for d in 0..dim {
                out[d] += w[corner] * field[v * dim + d];
            }
        }
        out
    }

    /// Smallest element extent along any axis.
    pub fn h_min(&self) -> f64 {
        let dim = self.geometry.dim();
        let mut h = f64::INFINITY;
        for k in 0..self.n_elements() {
            let verts = self.element_vertices(k);
            let origin = self.vertex(verts[0]);
            for d in 0..dim {
                let tip = self.vertex(verts[1 << d]);
                let len = (0..dim)
                    .map(|i| (tip[i] - origin[i]).powi(2))
                    .sum::<f64>()
                    .sqrt();
                h = h.min(len);
            }
        }
        h
    }
}

impl MeshTopology for CartesianMesh {
    fn geometry(&self) -> Geometry {
        self.geometry
    }

    fn n_elements(&self) -> usize {
        self.element_vertices.len() / self.geometry.n_vertices()
    }

    fn face_neighbor(&self, element: usize, face: usize) -> Option<usize> {
        self.neighbors[element * self.geometry.n_faces() + face]
    }
}
