//! Compressed sparse row matrix for the global operators.
//!
//! Column indices are sorted within each row so entries can be located by
//! binary search. Patterns are fixed at construction; values are rewritten in
//! place on reassembly.

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::error::SparsityError;

/// Square or rectangular CSR matrix.
#[derive(Clone, Debug, PartialEq)]
pub struct CsrMatrix {
    n_rows: usize,
    n_cols: usize,
    row_offsets: Vec<usize>,
    col_indices: Vec<usize>,
    values: Vec<f64>,
}

impl CsrMatrix {
    /// Zero matrix with the given per-row column sets.
    ///
    /// Columns are sorted and deduplicated.
    pub fn from_pattern(n_rows: usize, n_cols: usize, rows: Vec<Vec<usize>>) -> Self {
        assert_eq!(rows.len(), n_rows, "one column list per row required");
        let mut row_offsets = Vec::with_capacity(n_rows + 1);
        let mut col_indices = Vec::new();
        row_offsets.push(0);
        for mut cols in rows {
            cols.sort_unstable();
            cols.dedup();
            assert!(cols.last().is_none_or(|&c| c < n_cols), "column out of range");
            col_indices.extend(cols);
            row_offsets.push(col_indices.len());
        }
        let values = vec![0.0; col_indices.len()];
        Self {
            n_rows,
            n_cols,
            row_offsets,
            col_indices,
            values,
        }
    }

    /// Build from (row, col, value) triplets, summing duplicates.
    pub fn from_triplets(n_rows: usize, n_cols: usize, triplets: &[(usize, usize, f64)]) -> Self {
        let mut rows = vec![Vec::new(); n_rows];
        for &(r, c, _) in triplets {
            rows[r].push(c);
        }
        let mut mat = Self::from_pattern(n_rows, n_cols, rows);
        for &(r, c, v) in triplets {
            mat.add(r, c, v);
        }
        mat
    }

    /// Same pattern, all values zero.
    pub fn zeros_like(&self) -> Self {
        Self {
            values: vec![0.0; self.values.len()],
            ..self.clone()
        }
    }

    #[inline]
    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    #[inline]
    pub fn n_cols(&self) -> usize {
        self.n_cols
    }

    /// Number of stored entries.
    #[inline]
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    pub fn row_offsets(&self) -> &[usize] {
        &self.row_offsets
    }

    pub fn col_indices(&self) -> &[usize] {
        &self.col_indices
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn values_mut(&mut self) -> &mut [f64] {
        &mut self.values
    }

    /// Range of entry indices of row `i`.
    #[inline]
    pub fn row_range(&self, i: usize) -> std::ops::Range<usize> {
        self.row_offsets[i]..self.row_offsets[i + 1]
    }

    /// Column indices and values of row `i`.
    #[inline]
    pub fn row(&self, i: usize) -> (&[usize], &[f64]) {
        let r = self.row_range(i);
        (&self.col_indices[r.clone()], &self.values[r])
    }

    /// Entry index of (i, j), if stored.
    #[inline]
    pub fn find(&self, i: usize, j: usize) -> Option<usize> {
        let r = self.row_range(i);
        self.col_indices[r.clone()]
            .binary_search(&j)
            .ok()
            .map(|pos| r.start + pos)
    }

    /// Value at (i, j); zero outside the pattern.
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.find(i, j).map_or(0.0, |idx| self.values[idx])
    }

    /// Accumulate into (i, j), which must be part of the pattern.
    pub fn add(&mut self, i: usize, j: usize, value: f64) {
        let idx = self
            .find(i, j)
            .unwrap_or_else(|| panic!("entry ({i}, {j}) is outside the sparsity pattern"));
        self.values[idx] += value;
    }

    /// Set every stored value.
    pub fn fill(&mut self, value: f64) {
        self.values.fill(value);
    }

    /// Whether two matrices share the same pattern.
    pub fn same_pattern(&self, other: &Self) -> bool {
        self.n_rows == other.n_rows
            && self.n_cols == other.n_cols
            && self.row_offsets == other.row_offsets
            && self.col_indices == other.col_indices
    }

    #[inline]
    fn row_dot(&self, i: usize, x: &[f64]) -> f64 {
        self.row_range(i)
            .map(|idx| self.values[idx] * x[self.col_indices[idx]])
            .sum()
    }

    /// y = A x.
    pub fn mat_vec_mul(&self, x: &[f64], y: &mut [f64]) {
        assert_eq!(x.len(), self.n_cols);
        assert_eq!(y.len(), self.n_rows);

        #[cfg(feature = "parallel")]
        y.par_iter_mut()
            .enumerate()
            .for_each(|(i, yi)| *yi = self.row_dot(i, x));

        #[cfg(not(feature = "parallel"))]
        for (i, yi) in y.iter_mut().enumerate() {
            *yi = self.row_dot(i, x);
        }
    }

    /// Sum of each row.
    pub fn row_sums(&self) -> Vec<f64> {
        (0..self.n_rows)
            .map(|i| self.values[self.row_range(i)].iter().sum())
            .collect()
    }

    /// Diagonal entries (zero where not stored).
    pub fn diagonal(&self) -> Vec<f64> {
        (0..self.n_rows.min(self.n_cols))
            .map(|i| self.get(i, i))
            .collect()
    }

    /// For every stored entry (i, j), the index of the stored entry (j, i).
    ///
    /// Fails if the pattern is not structurally symmetric.
    pub fn transpose_map(&self) -> Result<Vec<usize>, SparsityError> {
        let mut map = Vec::with_capacity(self.nnz());
        for i in 0..self.n_rows {
            for idx in self.row_range(i) {
                let j = self.col_indices[idx];
                if j >= self.n_rows {
                    return Err(SparsityError::MissingMirror { row: i, col: j });
                }
                let mirror = self
                    .find(j, i)
                    .ok_or(SparsityError::MissingMirror { row: i, col: j })?;
                map.push(mirror);
            }
        }
        Ok(map)
    }
}
