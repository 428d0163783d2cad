//! Immutable column-oriented sparse representation of `A` (spec §3/§4.1),
//! built once per `Solve()` from the caller's dense `LinearProgram` and
//! optionally extended with an identity block of slacks.
//!
//! Grounded in the teacher's `lpsolver::matrix::Matrix`, but generalized from
//! a dense row-major store to the CSR-like column layout the spec calls for:
//! hot-path operations (reduced-cost scalar products, update-row
//! construction) read whole columns, so columns are stored as cleaned
//! [`SparseVector`]s rather than dense rows. A companion row-oriented view
//! (`Aᵀ`) is built lazily, matching spec §4.1's "enabled by a parameter" note
//! on `use_transposed_matrix`.

use crate::sparse::SparseVector;
use crate::types::{ColIndex, Fractional, RowIndex};

/// Column-oriented immutable sparse matrix over the *extended* column space:
/// the first `num_structural_cols` columns come from the caller's `A`,
/// followed by one slack column per row (identity, sign as chosen by the
/// caller — `RevisedSimplex::initialize` appends `+1` coefficients).
#[derive(Debug, Clone)]
pub struct CompactMatrix {
    num_rows: usize,
    num_structural_cols: usize,
    columns: Vec<SparseVector<RowIndex>>,
    transpose: Option<Vec<SparseVector<ColIndex>>>,
}

impl CompactMatrix {
    /// Builds the structural block from a dense row-major matrix, then
    /// appends an identity block of `num_rows` slack columns with
    /// coefficient `+1` in their own row.
    pub fn from_dense_rows_with_slacks(rows: &[Vec<Fractional>]) -> Self {
        let num_rows = rows.len();
        let num_structural_cols = rows.first().map_or(0, |r| r.len());
        let mut columns: Vec<SparseVector<RowIndex>> = Vec::with_capacity(num_structural_cols + num_rows);
        for col in 0..num_structural_cols {
            let mut v: SparseVector<RowIndex> = SparseVector::with_capacity(num_rows);
            for (row, values) in rows.iter().enumerate() {
                let coeff = values[col];
                if coeff != 0.0 {
                    v.set_coefficient(RowIndex(row), coeff);
                }
            }
            v.clean_up();
            columns.push(v);
        }
        for row in 0..num_rows {
            let mut v: SparseVector<RowIndex> = SparseVector::with_capacity(1);
            v.set_coefficient(RowIndex(row), 1.0);
            v.clean_up();
            columns.push(v);
        }
        CompactMatrix { num_rows, num_structural_cols, columns, transpose: None }
    }

    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    pub fn num_structural_cols(&self) -> usize {
        self.num_structural_cols
    }

    pub fn num_cols(&self) -> usize {
        self.columns.len()
    }

    pub fn is_slack(&self, col: ColIndex) -> bool {
        col.0 >= self.num_structural_cols
    }

    pub fn column(&self, col: ColIndex) -> &SparseVector<RowIndex> {
        &self.columns[col.0]
    }

    pub fn dense_column(&self, col: ColIndex) -> Vec<Fractional> {
        let mut dense = vec![0.0; self.num_rows];
        self.columns[col.0].copy_to_dense(&mut dense);
        dense
    }

    /// `out += multiplier * column(col)`, the primitive spec §4.1 names
    /// `add_multiple_to_dense`.
    pub fn add_multiple_to_dense(&self, col: ColIndex, multiplier: Fractional, out: &mut [Fractional]) {
        self.columns[col.0].add_multiple_to_dense_vector(multiplier, out);
    }

    /// `dense_row . column(col)`, the primitive spec §4.1 names
    /// `column(j).scalar_product(dense_row)`; used to compute one entry of
    /// a reduced-cost row or the update row.
    pub fn scalar_product_with_dense(&self, col: ColIndex, dense_row: &[Fractional]) -> Fractional {
        self.columns[col.0].iter().map(|(row, coeff)| coeff * dense_row[row.0]).sum()
    }

    /// Builds (or rebuilds) the row-oriented transpose view used by
    /// row-at-a-time hot loops (spec §4.1: "enabled by a parameter").
    pub fn build_transpose(&mut self) {
        let mut rows: Vec<SparseVector<ColIndex>> =
            (0..self.num_rows).map(|_| SparseVector::new()).collect();
        for (col_idx, column) in self.columns.iter().enumerate() {
            for (row, coeff) in column.iter() {
                rows[row.0].set_coefficient(ColIndex(col_idx), coeff);
            }
        }
        for row in &mut rows {
            row.clean_up();
        }
        self.transpose = Some(rows);
    }

    pub fn has_transpose(&self) -> bool {
        self.transpose.is_some()
    }

    pub fn row(&self, row: RowIndex) -> Option<&SparseVector<ColIndex>> {
        self.transpose.as_ref().map(|t| &t[row.0])
    }

    /// The dense coefficients of one extended-matrix row, read off the
    /// transpose when `build_transpose` has been called, otherwise gathered
    /// one column at a time. Used by the `A x - b` residual check
    /// (`use_transposed_matrix` trades memory for avoiding that per-row
    /// per-column scan).
    pub fn dense_row(&self, row: RowIndex) -> Vec<Fractional> {
        let mut out = vec![0.0; self.columns.len()];
        if let Some(transpose) = &self.transpose {
            for (col, coeff) in transpose[row.0].iter() {
                out[col.0] = coeff;
            }
        } else {
            for (col, column) in self.columns.iter().enumerate() {
                out[col] = column.look_up_coefficient(row);
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> CompactMatrix {
        CompactMatrix::from_dense_rows_with_slacks(&[vec![1.0, 1.0], vec![1.0, 3.0]])
    }

    #[test]
    fn structural_columns_match_dense_input() {
        let m = sample();
        assert_eq!(m.num_cols(), 4); // 2 structural + 2 slacks
        assert_eq!(m.dense_column(ColIndex(0)), vec![1.0, 1.0]);
        assert_eq!(m.dense_column(ColIndex(1)), vec![1.0, 3.0]);
    }

    #[test]
    fn slack_block_is_identity() {
        let m = sample();
        assert_eq!(m.dense_column(ColIndex(2)), vec![1.0, 0.0]);
        assert_eq!(m.dense_column(ColIndex(3)), vec![0.0, 1.0]);
    }

    #[test]
    fn scalar_product_matches_dot_product() {
        let m = sample();
        let dense_row = vec![2.0, 5.0];
        assert_eq!(m.scalar_product_with_dense(ColIndex(1), &dense_row), 1.0 * 2.0 + 3.0 * 5.0);
    }

    #[test]
    fn dense_row_matches_with_or_without_transpose() {
        let mut m = sample();
        let without_transpose = m.dense_row(RowIndex(1));
        assert_eq!(without_transpose, vec![1.0, 3.0, 0.0, 1.0]);
        m.build_transpose();
        assert_eq!(m.dense_row(RowIndex(1)), without_transpose);
    }

    #[test]
    fn transpose_round_trips_structural_entries() {
        let mut m = sample();
        m.build_transpose();
        let row0 = m.row(RowIndex(0)).unwrap();
        let entries: Vec<_> = row0.iter().collect();
        assert_eq!(entries, vec![(ColIndex(0), 1.0), (ColIndex(1), 1.0), (ColIndex(2), 1.0)]);
    }
}
