//! Maintains the dense solution vector `x` (basic and non-basic entries),
//! the residual measurements derived from it, and the `DualPrices` priority
//! structure the dual ratio test reads from (spec §4.3).

use crate::basis::BasisFactorization;
use crate::types::{ColIndex, Fractional, RowIndex};
use crate::variables_info::VariablesInfo;

/// `x_B <- B^-1 (b - A_N x_N)`, then `update_on_pivot` for incremental
/// maintenance across pivots.
pub struct VariableValues;

impl VariableValues {
    /// Recomputes every basic value from scratch. Must only be called right
    /// after a fresh factorization (spec §4.3): `extended_column(col)`
    /// returns the dense m-length column of the extended matrix for `col`.
    pub fn recompute_basic_values(
        basis: &BasisFactorization,
        info: &mut VariablesInfo,
        rhs: &[Fractional],
        extended_column: &dyn Fn(ColIndex) -> Vec<Fractional>,
    ) -> crate::error::LpResult<()> {
        let m = basis.num_rows();
        let mut reduced_rhs = rhs.to_vec();
        for col in 0..info.num_cols() {
            let c = ColIndex(col);
            if info.is_basic(c) {
                continue;
            }
            let value = info.values[col];
            if value == 0.0 {
                continue;
            }
            let column = extended_column(c);
            for r in 0..m {
                reduced_rhs[r] -= column[r] * value;
            }
        }
        let x_b = basis.solve(&reduced_rhs)?;
        for (row, &value) in x_b.iter().enumerate() {
            let col = basis.basic_column(RowIndex(row));
            info.set_basic(col, value);
        }
        Ok(())
    }

    /// `x_B <- x_B - step * d`, `x_entering <- x_entering (prior non-basic
    /// value) + step`. Caller applies this before `basis.pivot(...)` so
    /// `basis.basic_column` still names the leaving variable for each row.
    pub fn update_on_pivot(
        basis: &BasisFactorization,
        info: &mut VariablesInfo,
        direction: &[Fractional],
        entering: ColIndex,
        entering_start_value: Fractional,
        step: Fractional,
    ) {
        for row in 0..basis.num_rows() {
            let col = basis.basic_column(RowIndex(row));
            let updated = info.values[col.0] - step * direction[row];
            info.values[col.0] = updated;
        }
        info.values[entering.0] = entering_start_value + step;
    }

    /// Max over columns of `max(lower - x, x - upper)`.
    pub fn compute_max_primal_infeasibility(info: &VariablesInfo) -> Fractional {
        (0..info.num_cols())
            .map(|c| info.bound_violation(ColIndex(c)))
            .fold(Fractional::NEG_INFINITY, Fractional::max)
            .max(0.0)
    }

    /// `||A x - b||_inf` computed from the dense extended matrix rows.
    pub fn compute_max_primal_residual(
        info: &VariablesInfo,
        rhs: &[Fractional],
        extended_row: &dyn Fn(RowIndex) -> Vec<Fractional>,
    ) -> Fractional {
        let m = rhs.len();
        let mut max_residual: Fractional = 0.0;
        for row in 0..m {
            let coeffs = extended_row(RowIndex(row));
            let activity: Fractional = coeffs.iter().zip(info.values.iter()).map(|(a, x)| a * x).sum();
            max_residual = max_residual.max((activity - rhs[row]).abs());
        }
        max_residual
    }
}

/// Priority structure over basic rows, keyed by squared normalized primal
/// infeasibility, feeding the dual leaving-variable selection (spec §4.3,
/// §4.6). Kept as a simple vector with a cached maximum: m is small enough
/// in this engine's target problem sizes that rebuilding the max on update
/// is cheaper in practice than a full heap, and the logic stays auditable.
#[derive(Debug, Clone, Default)]
pub struct DualPrices {
    weights: Vec<Fractional>,
}

impl DualPrices {
    pub fn new(num_rows: usize) -> Self {
        DualPrices { weights: vec![0.0; num_rows] }
    }

    pub fn add_or_update(&mut self, row: RowIndex, weighted_infeasibility: Fractional) {
        self.weights[row.0] = weighted_infeasibility;
    }

    pub fn remove(&mut self, row: RowIndex) {
        self.weights[row.0] = 0.0;
    }

    pub fn get_maximum(&self) -> Option<(RowIndex, Fractional)> {
        self.weights
            .iter()
            .enumerate()
            .filter(|(_, &w)| w > 0.0)
            .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap())
            .map(|(i, &w)| (RowIndex(i), w))
    }

    pub fn dense_updates(&mut self, updates: impl Iterator<Item = (RowIndex, Fractional)>) {
        for (row, weight) in updates {
            self.weights[row.0] = weight;
        }
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
    fn recompute_basic_values_solves_identity_system() {
        let mut basis = BasisFactorization::all_slack(2, 0);
        basis.refactorize(&identity_columns).unwrap();
        let mut info = VariablesInfo::new(vec![0.0, 0.0], vec![10.0, 10.0], 0);
        info.initialize_default_statuses();
        info.set_basic(ColIndex(0), 0.0);
        info.set_basic(ColIndex(1), 0.0);
        VariableValues::recompute_basic_values(&basis, &mut info, &[3.0, 4.0], &identity_columns).unwrap();
        assert_eq!(info.values[0], 3.0);
        assert_eq!(info.values[1], 4.0);
    }

    #[test]
    fn max_primal_infeasibility_is_zero_when_feasible() {
        let mut info = VariablesInfo::new(vec![0.0], vec![10.0], 1);
        info.set_basic(ColIndex(0), 5.0);
        assert_eq!(VariableValues::compute_max_primal_infeasibility(&info), 0.0);
    }

    #[test]
    fn dual_prices_tracks_running_maximum() {
        let mut dp = DualPrices::new(3);
        dp.add_or_update(RowIndex(0), 1.0);
        dp.add_or_update(RowIndex(1), 5.0);
        dp.add_or_update(RowIndex(2), 2.0);
        assert_eq!(dp.get_maximum(), Some((RowIndex(1), 5.0)));
        dp.remove(RowIndex(1));
        assert_eq!(dp.get_maximum(), Some((RowIndex(2), 2.0)));
    }
}
