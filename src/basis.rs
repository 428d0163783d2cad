//! Basis factorization: tracks which column occupies each row and
//! maintains an LU factorization of the resulting basis matrix, with
//! refactorization driven by an update counter and a condition-number
//! estimate (spec §4.2).
//!
//! Grounded in the teacher's `lpsolver::basis::Basis`, replacing its direct
//! Gaussian-elimination-per-call approach with an explicit `is_refactorized`
//! / `needs_refactorization` state machine matching the spec's contract,
//! and working over the extended column space (structural columns followed
//! by one slack per row) that `RevisedSimplex` builds at `Initialize`.
//!
//! Between refactorizations, `pivot_with_update` records a product-form-of-
//! the-inverse eta vector instead of re-running Gaussian elimination; this
//! is the "low-rank update" spec §4.2 names, grounded in the classic
//! eta-file technique rather than OR-Tools' `LuFactorization::Update`
//! (Forrest-Tomlinson), which refactors its own sparse LU in place — a
//! simplification recorded in `DESIGN.md`.

use crate::error::{LpError, LpResult};
use crate::lu::LuDecomposition;
use crate::matrix::Matrix;
use crate::types::{ColIndex, Fractional, RowIndex};

/// Maximum allowed ratio of largest-to-smallest pivot magnitude before a
/// basis is considered too ill-conditioned to trust without refactorizing.
const DEFAULT_CONDITION_THRESHOLD: Fractional = 1e12;

/// Number of low-rank pivots the factorization tolerates before forcing a
/// from-scratch refactorization, matching the teacher's periodic
/// refactorization cadence.
const DEFAULT_REFACTORIZATION_PERIOD: u32 = 100;

/// One product-form-of-the-inverse eta update: replacing row `row` of the
/// basis with a new column changes `B^{-1}` by left-multiplying with an
/// elementary matrix whose only non-identity column is `row`, built from
/// the pre-pivot direction `d = B_old^{-1} A_entering` (spec §4.2's
/// "low-rank update"). Applying a chain of these after the last
/// refactorization's LU solve is the cheap O(m) alternative to rebuilding
/// the factorization from scratch on every pivot.
#[derive(Debug, Clone)]
struct EtaUpdate {
    row: usize,
    pivot: Fractional,
    direction: Vec<Fractional>,
}

pub struct BasisFactorization {
    /// `basic[i]` is the column occupying row `i`.
    basic: Vec<ColIndex>,
    lu: Option<LuDecomposition>,
    /// Eta updates applied since the last refactorization, in chronological
    /// (pivot) order.
    etas: Vec<EtaUpdate>,
    updates_since_refactorization: u32,
    refactorization_period: u32,
    pivot_tolerance: Fractional,
}

impl BasisFactorization {
    /// Builds the all-slack basis: row `i` is occupied by the slack column
    /// at `num_structural_cols + i`.
    pub fn all_slack(num_rows: usize, num_structural_cols: usize) -> Self {
        let basic = (0..num_rows).map(|i| ColIndex(num_structural_cols + i)).collect();
        BasisFactorization {
            basic,
            lu: None,
            etas: Vec::new(),
            updates_since_refactorization: 0,
            refactorization_period: DEFAULT_REFACTORIZATION_PERIOD,
            pivot_tolerance: 1e-8,
        }
    }

    pub fn from_columns(basic: Vec<ColIndex>, pivot_tolerance: Fractional) -> Self {
        BasisFactorization {
            basic,
            lu: None,
            etas: Vec::new(),
            updates_since_refactorization: 0,
            refactorization_period: DEFAULT_REFACTORIZATION_PERIOD,
            pivot_tolerance,
        }
    }

    pub fn basic_column(&self, row: RowIndex) -> ColIndex {
        self.basic[row.0]
    }

    pub fn basic_columns(&self) -> &[ColIndex] {
        &self.basic
    }

    pub fn num_rows(&self) -> usize {
        self.basic.len()
    }

    pub fn is_refactorized(&self) -> bool {
        self.lu.is_some() && self.updates_since_refactorization == 0
    }

    pub fn needs_refactorization(&self) -> bool {
        self.lu.is_none() || self.updates_since_refactorization >= self.refactorization_period
    }

    /// Gathers the m columns named by `basic` out of the extended matrix
    /// (columns 0..num_structural_cols are structural, the rest are the
    /// per-row slack identity block) into a dense basis matrix.
    fn gather_basis_matrix(&self, extended_columns: &dyn Fn(ColIndex) -> Vec<Fractional>) -> Matrix {
        let m = self.basic.len();
        let mut rows = vec![vec![0.0; m]; m];
        for (col_pos, &col) in self.basic.iter().enumerate() {
            let column = extended_columns(col);
            for r in 0..m {
                rows[r][col_pos] = column[r];
            }
        }
        Matrix::from_rows(rows)
    }

    /// Recomputes the LU factorization from scratch, resetting the update
    /// counter. `extended_columns(col)` must return the dense m-length
    /// column for any column index in the extended space.
    pub fn refactorize(&mut self, extended_columns: &dyn Fn(ColIndex) -> Vec<Fractional>) -> LpResult<()> {
        let basis_matrix = self.gather_basis_matrix(extended_columns);
        let lu = LuDecomposition::decompose(&basis_matrix, self.pivot_tolerance)?;
        self.lu = Some(lu);
        self.etas.clear();
        self.updates_since_refactorization = 0;
        Ok(())
    }

    pub fn condition_number_upper_bound(&self) -> Fractional {
        match &self.lu {
            Some(lu) => {
                let smallest = lu.smallest_pivot_magnitude();
                if smallest <= 0.0 { Fractional::INFINITY } else { 1.0 / smallest }
            }
            None => Fractional::INFINITY,
        }
    }

    pub fn exceeds_condition_threshold(&self, threshold: Fractional) -> bool {
        self.condition_number_upper_bound() > threshold.max(DEFAULT_CONDITION_THRESHOLD.min(threshold))
    }

    /// `B x = rhs` (ftran direction): requires a current factorization.
    /// Applies the base LU solve, then every eta update since the last
    /// refactorization in chronological order (spec §4.2's low-rank
    /// update, product-form-of-the-inverse style).
    pub fn solve(&self, rhs: &[Fractional]) -> LpResult<Vec<Fractional>> {
        let lu = self.lu.as_ref().ok_or(LpError::SingularBasis { step: 0 })?;
        let mut x = lu.ftran(rhs);
        for eta in &self.etas {
            Self::apply_eta_ftran(eta, &mut x);
        }
        Ok(x)
    }

    /// `B^T y = rhs` (btran direction): requires a current factorization.
    /// Etas are applied in reverse-chronological order before the base LU
    /// solve, matching `(B_0 E_1 ... E_k)^{-T} = B_0^{-T} E_1^{-T} ...
    /// E_k^{-T}` applied right-to-left.
    pub fn left_solve(&self, rhs: &[Fractional]) -> LpResult<Vec<Fractional>> {
        let lu = self.lu.as_ref().ok_or(LpError::SingularBasis { step: 0 })?;
        let mut x = rhs.to_vec();
        for eta in self.etas.iter().rev() {
            Self::apply_eta_btran(eta, &mut x);
        }
        Ok(lu.btran(&x))
    }

    fn apply_eta_ftran(eta: &EtaUpdate, x: &mut [Fractional]) {
        let alpha = x[eta.row] / eta.pivot;
        for (i, &d_i) in eta.direction.iter().enumerate() {
            if i != eta.row {
                x[i] -= d_i * alpha;
            }
        }
        x[eta.row] = alpha;
    }

    fn apply_eta_btran(eta: &EtaUpdate, x: &mut [Fractional]) {
        let mut dot_off_row = 0.0;
        for (i, &d_i) in eta.direction.iter().enumerate() {
            if i != eta.row {
                dot_off_row += d_i * x[i];
            }
        }
        x[eta.row] = (x[eta.row] - dot_off_row) / eta.pivot;
    }

    /// Replaces the basic column at `leaving_row` with `entering` and
    /// records the low-rank update implied by the pre-pivot direction `d =
    /// B_old^{-1} A_entering` (spec §4.2/§4.7). `direction[leaving_row]` is
    /// the pivot element. Subsequent `solve`/`left_solve` calls apply this
    /// update cheaply until `needs_refactorization` triggers a rebuild, or
    /// until the driver forces one earlier because the pivot-disagreement
    /// check in `direction::pivot_estimates_disagree` failed.
    pub fn pivot_with_update(&mut self, leaving_row: RowIndex, entering: ColIndex, direction: &[Fractional]) {
        let pivot = direction[leaving_row.0];
        self.etas.push(EtaUpdate { row: leaving_row.0, pivot, direction: direction.to_vec() });
        self.basic[leaving_row.0] = entering;
        self.updates_since_refactorization += 1;
    }

    pub fn determinant(&self) -> Option<Fractional> {
        self.lu.as_ref().map(|lu| lu.determinant())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity_columns(col: ColIndex) -> Vec<Fractional> {
        let mut v = vec![0.0; 2];
        if col.0 < 2 {
            v[col.0] = 1.0;
        }
        v
    }

    #[test]
    fn all_slack_basis_is_identity() {
        let mut basis = BasisFactorization::all_slack(2, 0);
        basis.refactorize(&identity_columns).unwrap();
        let x = basis.solve(&[3.0, 4.0]).unwrap();
        assert_eq!(x, vec![3.0, 4.0]);
    }

    #[test]
    fn pivot_marks_factorization_stale() {
        let mut basis = BasisFactorization::all_slack(2, 0);
        basis.refactorize(&identity_columns).unwrap();
        assert!(basis.is_refactorized());
        basis.pivot_with_update(RowIndex(0), ColIndex(5), &[1.0, 0.0]);
        assert!(!basis.is_refactorized());
        assert_eq!(basis.basic_column(RowIndex(0)), ColIndex(5));
    }

    #[test]
    fn needs_refactorization_once_period_elapses() {
        let mut basis = BasisFactorization::all_slack(2, 0);
        basis.refactorization_period = 2;
        basis.refactorize(&identity_columns).unwrap();
        basis.pivot_with_update(RowIndex(0), ColIndex(5), &[1.0, 0.0]);
        assert!(!basis.needs_refactorization());
        basis.pivot_with_update(RowIndex(1), ColIndex(6), &[0.0, 1.0]);
        assert!(basis.needs_refactorization());
    }

    #[test]
    fn solve_without_factorization_errs() {
        let basis = BasisFactorization::all_slack(2, 0);
        assert!(basis.solve(&[1.0, 2.0]).is_err());
    }

    #[test]
    fn eta_update_solve_matches_direct_refactorization() {
        // B0 = I (2x2). Pivot column [3,0] replaces basic row 0: the
        // resulting basis is diag(3, 1).
        let mut basis = BasisFactorization::all_slack(2, 0);
        basis.refactorize(&identity_columns).unwrap();
        let direction = basis.solve(&[3.0, 0.0]).unwrap(); // = [3, 0] on the identity basis
        basis.pivot_with_update(RowIndex(0), ColIndex(7), &direction);
        let x = basis.solve(&[6.0, 5.0]).unwrap();
        // New basis is diag(3,1): 3*x0 = 6 -> x0 = 2, x1 = 5.
        assert!((x[0] - 2.0).abs() < 1e-9);
        assert!((x[1] - 5.0).abs() < 1e-9);
    }

    #[test]
    fn eta_update_left_solve_matches_direct_refactorization() {
        let mut basis = BasisFactorization::all_slack(2, 0);
        basis.refactorize(&identity_columns).unwrap();
        let direction = basis.solve(&[3.0, 0.0]).unwrap();
        basis.pivot_with_update(RowIndex(0), ColIndex(7), &direction);
        // New basis diag(3,1) is symmetric, so left_solve matches solve.
        let y = basis.left_solve(&[6.0, 5.0]).unwrap();
        assert!((y[0] - 2.0).abs() < 1e-9);
        assert!((y[1] - 5.0).abs() < 1e-9);
    }
}
