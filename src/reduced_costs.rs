//! Maintains `c̄ = c − Aᵀy` with `y = cᴮᵀB⁻¹` (spec §4.4): the precise
//! from-scratch recomputation, the cheap outer-product update applied on
//! every pivot, and the cost-shift bookkeeping used to escape degeneracy.
//!
//! Grounded in the teacher's `lpsolver::basis::Basis::compute_reduced_costs`
//! (a from-scratch dense recompute per iteration), generalized to the
//! revised-simplex incremental update spec §4.4/§4.7 require and to the
//! bounded-variable dual-feasibility predicate spec §3 describes.

use crate::basis::BasisFactorization;
use crate::compact_matrix::CompactMatrix;
use crate::error::LpResult;
use crate::rng::TieBreaker;
use crate::sparse::SparseVector;
use crate::types::{ColIndex, Fractional, VariableStatus};
use crate::variables_info::VariablesInfo;

pub struct ReducedCosts {
    /// `c`, over the extended column space, as loaded at `Initialize` (or
    /// temporarily replaced by a feasibility-phase objective).
    objective: Vec<Fractional>,
    /// Per-column additive shift applied on top of `objective`; non-empty
    /// only while the engine is perturbing costs to break a degenerate or
    /// dual-infeasible tie (spec §4.4, §7 "cost shifts").
    cost_shifts: Vec<Fractional>,
    /// `c̄_j` for every column (extended space); 0 at basic positions.
    reduced_costs: Vec<Fractional>,
    /// Cleared to false by `update_before_basis_pivot`'s accumulated
    /// rounding and any caller who mutates `objective`; only
    /// `recompute_precise` clears it.
    precise: bool,
    dual_feasibility_tolerance: Fractional,
}

impl ReducedCosts {
    pub fn new(objective: Vec<Fractional>, dual_feasibility_tolerance: Fractional) -> Self {
        let n = objective.len();
        ReducedCosts {
            objective,
            cost_shifts: vec![0.0; n],
            reduced_costs: vec![0.0; n],
            precise: false,
            dual_feasibility_tolerance,
        }
    }

    pub fn set_objective(&mut self, objective: Vec<Fractional>) {
        debug_assert_eq!(objective.len(), self.objective.len());
        self.objective = objective;
        self.precise = false;
    }

    pub fn objective(&self) -> &[Fractional] {
        &self.objective
    }

    pub fn is_precise(&self) -> bool {
        self.precise
    }

    pub fn reduced_cost(&self, col: ColIndex) -> Fractional {
        self.reduced_costs[col.0]
    }

    pub fn dense_row(&self) -> &[Fractional] {
        &self.reduced_costs
    }

    pub fn dual_feasibility_tolerance(&self) -> Fractional {
        self.dual_feasibility_tolerance
    }

    fn shifted_cost(&self, col: usize) -> Fractional {
        self.objective[col] + self.cost_shifts[col]
    }

    /// Recomputes `c̄` from scratch: `y = B^{-T} c_B`, then
    /// `c̄_j = c_j - A_jᵀ y` for every column (spec §4.4
    /// "make_reduced_costs_precise"). Requires a freshly factorized basis.
    pub fn recompute_precise(
        &mut self,
        basis: &BasisFactorization,
        matrix: &CompactMatrix,
        info: &VariablesInfo,
    ) -> LpResult<()> {
        let m = basis.num_rows();
        let mut c_basic = vec![0.0; m];
        for row in 0..m {
            let col = basis.basic_column(crate::types::RowIndex(row));
            c_basic[row] = self.shifted_cost(col.0);
        }
        let y = basis.left_solve(&c_basic)?;
        for col in 0..info.num_cols() {
            let c = ColIndex(col);
            if info.is_basic(c) {
                self.reduced_costs[col] = 0.0;
                continue;
            }
            let a_dot_y = matrix.scalar_product_with_dense(c, &y);
            self.reduced_costs[col] = self.shifted_cost(col) - a_dot_y;
        }
        self.precise = true;
        Ok(())
    }

    /// Outer-product update applied right before the basis itself is
    /// pivoted (spec §4.7 step 2): `c̄ -= (c̄_entering / pivot) * uᵀ`, where
    /// `u` is the update row `eᵢᵀB⁻¹A`. The entering column's reduced cost
    /// becomes (approximately) zero; the leaving column's becomes
    /// `-c̄_entering / pivot`.
    pub fn update_before_basis_pivot(
        &mut self,
        entering: ColIndex,
        leaving: ColIndex,
        pivot: Fractional,
        update_row: &SparseVector<ColIndex>,
    ) {
        let c_entering = self.reduced_costs[entering.0];
        if pivot == 0.0 {
            return;
        }
        let ratio = c_entering / pivot;
        for (col, coeff) in update_row.iter() {
            if col == entering {
                continue;
            }
            self.reduced_costs[col.0] -= ratio * coeff;
        }
        self.reduced_costs[entering.0] = 0.0;
        self.reduced_costs[leaving.0] = -ratio;
        self.precise = false;
    }

    /// Enlarges the entering column's reduced cost, recording the shift, so
    /// that the step taken is strictly improving even when `c̄_j` rounds to
    /// (or lands on the wrong side of) zero on a degenerate pivot. Undone by
    /// `clear_cost_shifts` before the engine reports a final solution (spec
    /// §4.4, GLOSSARY "cost shift").
    pub fn shift_cost_if_needed(&mut self, col: ColIndex, increasing: bool, tolerance: Fractional) {
        let current = self.reduced_costs[col.0];
        let deficiency = if increasing { current + tolerance } else { -current + tolerance };
        if deficiency <= 0.0 {
            return;
        }
        let shift = if increasing { -deficiency } else { deficiency };
        self.cost_shifts[col.0] += shift;
        self.reduced_costs[col.0] += shift;
    }

    /// Nudges every non-basic column's cost away from zero by a small random
    /// multiple of `magnitude`, recorded as a cost shift (spec §4.4
    /// dual-simplex notes): the all-slack starting basis the dual simplex
    /// usually begins from is highly primal-degenerate, and perturbing costs
    /// once before its first pivot breaks the ties that would otherwise let
    /// it cycle. `clear_cost_shifts` removes the perturbation before the
    /// engine reports a solution, same as any other cost shift.
    pub fn perturb_for_degeneracy(&mut self, info: &VariablesInfo, magnitude: Fractional, tie_breaker: &mut TieBreaker) {
        if magnitude <= 0.0 {
            return;
        }
        for col in 0..self.objective.len() {
            let c = ColIndex(col);
            if info.is_basic(c) {
                continue;
            }
            let shift = match info.statuses[col] {
                VariableStatus::AtLowerBound => -magnitude * tie_breaker.next_unit_fraction(),
                VariableStatus::AtUpperBound => magnitude * tie_breaker.next_unit_fraction(),
                _ => continue,
            };
            self.cost_shifts[col] += shift;
            self.reduced_costs[col] += shift;
        }
        self.precise = false;
    }

    pub fn has_cost_shifts(&self) -> bool {
        self.cost_shifts.iter().any(|&s| s != 0.0)
    }

    /// Removes every recorded cost perturbation and marks the state as
    /// needing a precise recompute before it is read again.
    pub fn clear_cost_shifts(&mut self) {
        for shift in &mut self.cost_shifts {
            *shift = 0.0;
        }
        self.precise = false;
    }

    /// Per-column dual infeasibility: positive when increasing (resp.
    /// decreasing) `x_j` would improve the objective but the variable
    /// cannot move that way given its status.
    pub fn dual_infeasibility(&self, col: ColIndex, info: &VariablesInfo) -> Fractional {
        if info.is_basic(col) {
            return 0.0;
        }
        let c = self.reduced_costs[col.0];
        let mut infeasibility: Fractional = 0.0;
        if c < 0.0 && info.can_increase(col) {
            infeasibility = infeasibility.max(-c);
        }
        if c > 0.0 && info.can_decrease(col) {
            infeasibility = infeasibility.max(c);
        }
        infeasibility
    }

    pub fn max_dual_infeasibility(&self, info: &VariablesInfo) -> Fractional {
        (0..info.num_cols())
            .map(|c| self.dual_infeasibility(ColIndex(c), info))
            .fold(0.0, Fractional::max)
    }

    /// Same as `max_dual_infeasibility` but ignoring boxed (upper-and-lower
    /// bounded) non-basic columns, matching spec §4.4's query used by the
    /// bound-flipping ratio test path.
    pub fn max_dual_infeasibility_non_boxed(&self, info: &VariablesInfo) -> Fractional {
        (0..info.num_cols())
            .filter(|&c| !info.is_boxed(ColIndex(c)))
            .map(|c| self.dual_infeasibility(ColIndex(c), info))
            .fold(0.0, Fractional::max)
    }

    /// `||c̄ - (c - Aᵀy)||`-style residual: recomputes a precise copy and
    /// reports the max absolute difference against the maintained state,
    /// without mutating `self`.
    pub fn max_dual_residual(
        &self,
        basis: &BasisFactorization,
        matrix: &CompactMatrix,
        info: &VariablesInfo,
    ) -> LpResult<Fractional> {
        let mut probe = ReducedCosts::new(self.objective.clone(), self.dual_feasibility_tolerance);
        probe.cost_shifts = self.cost_shifts.clone();
        probe.recompute_precise(basis, matrix, info)?;
        let residual = self
            .reduced_costs
            .iter()
            .zip(probe.reduced_costs.iter())
            .map(|(a, b)| (a - b).abs())
            .fold(0.0, Fractional::max);
        Ok(residual)
    }
}

#[cfg(test)]
impl ReducedCosts {
    /// Test-only seam: lets pricing/ratio-test unit tests set up a known
    /// reduced-cost row without factorizing a basis first.
    pub(crate) fn set_reduced_cost_for_test(&mut self, col: ColIndex, value: Fractional) {
        self.reduced_costs[col.0] = value;
    }
}
