//! Direction computation and the update row (spec §4.7): `d = B⁻¹A_j`, its
//! residual `A_j - B·d`, and `uᵀ = eᵢᵀB⁻¹A`.
//!
//! Grounded in the teacher's `PrimalSimplex`/`DualSimplex` calling
//! `basis.lu.solve(a_col)` directly inline; split out here into its own
//! module because the revised-simplex driver calls these primitives from
//! three places (primal ratio test, dual ratio test, and the
//! pivot-disagreement check of spec §4.7 step 4).

use crate::basis::BasisFactorization;
use crate::compact_matrix::CompactMatrix;
use crate::error::LpResult;
use crate::sparse::SparseVector;
use crate::types::{ColIndex, Fractional, RowIndex};

pub struct Direction;

impl Direction {
    /// `d = B⁻¹A_j` (ftran). Also returns `‖d‖∞`, which callers use for the
    /// ratio test's `small_pivot_threshold × ‖d‖∞` guard (spec §4.6 step 5).
    pub fn compute(basis: &BasisFactorization, matrix: &CompactMatrix, col: ColIndex) -> LpResult<(Vec<Fractional>, Fractional)> {
        let column = matrix.dense_column(col);
        let d = basis.solve(&column)?;
        let inf_norm = d.iter().fold(0.0, |acc: Fractional, &v| acc.max(v.abs()));
        Ok((d, inf_norm))
    }

    /// `A_j - B·d`, used to measure how far a claimed direction is from
    /// satisfying `B·d = A_j` exactly (spec §4.7 `compute_direction_error`).
    pub fn compute_error(
        basis: &BasisFactorization,
        matrix: &CompactMatrix,
        col: ColIndex,
        direction: &[Fractional],
    ) -> Fractional {
        let a_col = matrix.dense_column(col);
        let mut residual = a_col;
        for (row, basic_col) in basis.basic_columns().iter().enumerate() {
            let basic_col_dense = matrix.dense_column(*basic_col);
            for (r, value) in basic_col_dense.iter().enumerate() {
                residual[r] -= value * direction[row];
            }
        }
        residual.iter().fold(0.0, |acc: Fractional, &v| acc.max(v.abs()))
    }

    /// `uᵀ = eᵢᵀB⁻¹A` (btran of a unit row, then a scalar product against
    /// every column). Used both by the dual ratio test and by the
    /// reduced-cost/edge-norm pivot updates.
    pub fn update_row(basis: &BasisFactorization, matrix: &CompactMatrix, leaving_row: RowIndex) -> LpResult<SparseVector<ColIndex>> {
        let m = basis.num_rows();
        let mut unit = vec![0.0; m];
        unit[leaving_row.0] = 1.0;
        let y = basis.left_solve(&unit)?;
        let mut row: SparseVector<ColIndex> = SparseVector::with_capacity(matrix.num_cols());
        for col in 0..matrix.num_cols() {
            let value = matrix.scalar_product_with_dense(ColIndex(col), &y);
            if value != 0.0 {
                row.set_coefficient(ColIndex(col), value);
            }
        }
        row.clean_up();
        Ok(row)
    }

    /// Spec §4.7 step 4: cross-checks the direction's component at
    /// `leaving_row` (`d[leaving_row]`) against the `j`-th entry of the
    /// update row `eᵢᵀB⁻¹A`. Disagreement beyond `refactorization_threshold
    /// * (1 + |pivot|)` means the cheap low-rank pivot update can no longer
    /// be trusted and a refactorization should be forced instead.
    pub fn pivot_estimates_disagree(
        direction_pivot: Fractional,
        update_row_pivot: Fractional,
        refactorization_threshold: Fractional,
    ) -> bool {
        let allowed = refactorization_threshold * (1.0 + direction_pivot.abs());
        (direction_pivot - update_row_pivot).abs() > allowed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ColIndex as Col;

    fn identity_columns(col: Col) -> Vec<Fractional> {
        let mut v = vec![0.0; 2];
        if col.0 < 2 {
            v[col.0] = 1.0;
        }
        v
    }

    #[test]
    fn compute_direction_solves_b_inverse_a() {
        let mut basis = BasisFactorization::all_slack(2, 0);
        basis.refactorize(&identity_columns).unwrap();
        let matrix = CompactMatrix::from_dense_rows_with_slacks(&[vec![3.0, 0.0], vec![0.0, 4.0]]);
        let (d, inf_norm) = Direction::compute(&basis, &matrix, ColIndex(0)).unwrap();
        assert_eq!(d, vec![3.0, 0.0]);
        assert_eq!(inf_norm, 3.0);
    }

    #[test]
    fn compute_error_is_zero_for_exact_direction() {
        let mut basis = BasisFactorization::all_slack(2, 0);
        basis.refactorize(&identity_columns).unwrap();
        let matrix = CompactMatrix::from_dense_rows_with_slacks(&[vec![3.0, 0.0], vec![0.0, 4.0]]);
        let (d, _) = Direction::compute(&basis, &matrix, ColIndex(0)).unwrap();
        let err = Direction::compute_error(&basis, &matrix, ColIndex(0), &d);
        assert!(err < 1e-9);
    }

    #[test]
    fn update_row_matches_transposed_solve() {
        let mut basis = BasisFactorization::all_slack(2, 0);
        basis.refactorize(&identity_columns).unwrap();
        let matrix = CompactMatrix::from_dense_rows_with_slacks(&[vec![1.0, 2.0], vec![3.0, 4.0]]);
        let row = Direction::update_row(&basis, &matrix, RowIndex(0)).unwrap();
        // On the identity basis, u^T = e_0^T A = first row of A = [1, 2, 1, 0].
        assert_eq!(row.look_up_coefficient(ColIndex(0)), 1.0);
        assert_eq!(row.look_up_coefficient(ColIndex(1)), 2.0);
        assert_eq!(row.look_up_coefficient(ColIndex(2)), 1.0);
    }

    #[test]
    fn pivot_disagreement_detects_large_gap() {
        assert!(!Direction::pivot_estimates_disagree(1.0, 1.0000001, 1e-6));
        assert!(Direction::pivot_estimates_disagree(1.0, 2.0, 1e-6));
    }
}
