//! Bound influence map and element/dof value ranges.
//!
//! A dof's admissible range is the union of the value ranges of every element
//! touching it: its owner, the face neighbors at shared faces and the
//! diagonal neighbors at corners and edges.

/// Per dof, the elements whose value range bounds that dof.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VertexBoundsMap {
    lists: Vec<Vec<usize>>,
}

impl VertexBoundsMap {
    pub(crate) fn with_dofs(n_dofs: usize) -> Self {
        Self {
            lists: vec![Vec::new(); n_dofs],
        }
    }

    /// Append `element` to the list of `dof` unless already present.
    pub(crate) fn insert(&mut self, dof: usize, element: usize) {
        let list = &mut self.lists[dof];
        if !list.contains(&element) {
            list.push(element);
        }
    }

    /// Elements bounding `dof`; the owner comes first.
    #[inline]
    pub fn elements(&self, dof: usize) -> &[usize] {
        &self.lists[dof]
    }

    pub fn n_dofs(&self) -> usize {
        self.lists.len()
    }

    /// Admissible range of `dof` under the given element ranges.
    pub fn dof_range(&self, dof: usize, ranges: &ElementRange) -> DofRange {
        let mut range = DofRange::EMPTY;
        for &e in &self.lists[dof] {
            range.min = range.min.min(ranges.min[e]);
            range.max = range.max.max(ranges.max[e]);
        }
        range
    }
}

/// Per element minimum and maximum nodal value of the current state.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ElementRange {
    pub min: Vec<f64>,
    pub max: Vec<f64>,
}

impl ElementRange {
    /// Ranges of `x` with `nd` dofs per element.
    pub fn compute(x: &[f64], nd: usize) -> Self {
        let mut ranges = Self::default();
        ranges.update(x, nd);
        ranges
    }

    /// Recompute in place.
    pub fn update(&mut self, x: &[f64], nd: usize) {
        let ne = x.len() / nd;
        self.min.clear();
        self.max.clear();
        self.min.reserve(ne);
        self.max.reserve(ne);
        for chunk in x.chunks_exact(nd) {
            let (lo, hi) = chunk
                .iter()
                .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                    (lo.min(v), hi.max(v))
                });
            self.min.push(lo);
            self.max.push(hi);
        }
    }

    pub fn n_elements(&self) -> usize {
        self.min.len()
    }
}

/// Admissible [min, max] of a single dof.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DofRange {
    pub min: f64,
    pub max: f64,
}

impl DofRange {
    const EMPTY: Self = Self {
        min: f64::INFINITY,
        max: f64::NEG_INFINITY,
    };

    /// Clamp a value into the range.
    #[inline]
    pub fn clamp(&self, value: f64) -> f64 {
        // Written out so an empty range never panics
        self.max.min(value.max(self.min))
    }

    #[inline]
    pub fn contains(&self, value: f64, tol: f64) -> bool {
        value >= self.min - tol && value <= self.max + tol
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_range() {
        let x = [1.0, 3.0, 2.0, -1.0, 0.5, 0.0];
        let ranges = ElementRange::compute(&x, 3);
        assert_eq!(ranges.min, vec![1.0, -1.0]);
        assert_eq!(ranges.max, vec![3.0, 0.5]);
    }

    #[test]
    fn test_dof_range_unions_elements() {
        let mut map = VertexBoundsMap::with_dofs(2);
        map.insert(0, 0);
        map.insert(0, 1);
        map.insert(0, 1);
        map.insert(1, 1);
        assert_eq!(map.elements(0), &[0, 1]);

        let ranges = ElementRange {
            min: vec![0.0, -2.0],
            max: vec![1.0, 0.5],
        };
        let r = map.dof_range(0, &ranges);
        assert_eq!((r.min, r.max), (-2.0, 1.0));
        let r = map.dof_range(1, &ranges);
        assert_eq!((r.min, r.max), (-2.0, 0.5));
        assert_eq!(r.clamp(3.0), 0.5);
        assert_eq!(r.clamp(-3.0), -2.0);
    }
}
