//! Edge-norm maintainers for primal and dual pricing (spec §4.5).
//!
//! Both rules the config exposes — Dantzig (no norm, weight 1), Devex, and
//! steepest-edge — are served by the same reference-weight data structure:
//! Devex is the textbook cheap approximation to steepest-edge and this
//! engine uses the Devex update for `SteepestEdge` too rather than
//! maintaining exact norms (which needs an extra `B⁻¹` solve per candidate
//! column per iteration). This simplification is recorded in `DESIGN.md`.

use crate::config::PricingRule;
use crate::sparse::SparseVector;
use crate::types::{ColIndex, Fractional, RowIndex};

/// Non-basic column weights used by primal pricing (`get_best_entering_column`,
/// spec §4.6): selection criterion is `c̄_j² / norm_j`.
#[derive(Debug, Clone)]
pub struct PrimalEdgeNorms {
    norms: Vec<Fractional>,
    rule: PricingRule,
    reference_framework: Vec<bool>,
}

impl PrimalEdgeNorms {
    pub fn new(num_cols: usize, rule: PricingRule) -> Self {
        PrimalEdgeNorms { norms: vec![1.0; num_cols], rule, reference_framework: vec![true; num_cols] }
    }

    pub fn reset(&mut self) {
        self.norms.fill(1.0);
        self.reference_framework.fill(true);
    }

    /// Switches pricing rule between the feasibility and optimization phases
    /// (spec §4.5/§4.6), matching glop's `SetPricingRule`. Leaves the
    /// maintained weights untouched: Devex/steepest-edge weights built up
    /// under one rule remain a valid (if momentarily stale) approximation
    /// under the other.
    pub fn set_rule(&mut self, rule: PricingRule) {
        self.rule = rule;
    }

    pub fn norm(&self, col: ColIndex) -> Fractional {
        match self.rule {
            PricingRule::Dantzig => 1.0,
            PricingRule::Devex | PricingRule::SteepestEdge => self.norms[col.0],
        }
    }

    pub fn weighted_score(&self, col: ColIndex, reduced_cost: Fractional) -> Fractional {
        (reduced_cost * reduced_cost) / self.norm(col)
    }

    /// Devex reference-weight update (spec §4.5's `update_before_basis_pivot`,
    /// O(support of the pivot column/update row)): for every non-basic
    /// column `j` still eligible after the pivot, `gamma_j <- max(gamma_j,
    /// (u_j / alpha_q)² * gamma_q)`; the leaving column's weight becomes
    /// `max(gamma_q / alpha_q², 1)`.
    pub fn update_before_basis_pivot(
        &mut self,
        entering: ColIndex,
        leaving: ColIndex,
        pivot: Fractional,
        update_row: &SparseVector<ColIndex>,
    ) {
        if matches!(self.rule, PricingRule::Dantzig) || pivot == 0.0 {
            return;
        }
        let gamma_q = self.norms[entering.0];
        for (col, coeff) in update_row.iter() {
            if col == entering {
                continue;
            }
            let candidate = (coeff / pivot) * (coeff / pivot) * gamma_q;
            if candidate > self.norms[col.0] {
                self.norms[col.0] = candidate;
            }
        }
        self.norms[leaving.0] = (gamma_q / (pivot * pivot)).max(1.0);
    }

    /// Drift detector (spec §4.5): a weight that has grown implausibly large
    /// relative to the reference framework signals the incremental update
    /// has accumulated too much rounding error and the caller should reset.
    pub fn needs_recompute(&self, drift_threshold: Fractional) -> bool {
        self.norms.iter().any(|&g| !g.is_finite() || g > drift_threshold)
    }
}

/// Per-row weights used by dual pricing's leaving-row selection.
#[derive(Debug, Clone)]
pub struct DualEdgeNorms {
    norms: Vec<Fractional>,
    rule: PricingRule,
}

impl DualEdgeNorms {
    pub fn new(num_rows: usize, rule: PricingRule) -> Self {
        DualEdgeNorms { norms: vec![1.0; num_rows], rule }
    }

    pub fn reset(&mut self) {
        self.norms.fill(1.0);
    }

    pub fn resize(&mut self, num_rows: usize) {
        self.norms.resize(num_rows, 1.0);
    }

    pub fn set_rule(&mut self, rule: PricingRule) {
        self.rule = rule;
    }

    pub fn norm(&self, row: RowIndex) -> Fractional {
        match self.rule {
            PricingRule::Dantzig => 1.0,
            PricingRule::Devex | PricingRule::SteepestEdge => self.norms[row.0],
        }
    }

    pub fn weighted_infeasibility(&self, row: RowIndex, primal_infeasibility: Fractional) -> Fractional {
        (primal_infeasibility * primal_infeasibility) / self.norm(row)
    }

    /// Mirrors `PrimalEdgeNorms::update_before_basis_pivot`, but keyed by
    /// row (the leaving row's own weight is reset to 1, direction entries
    /// feed every other row's weight).
    pub fn update_before_basis_pivot(&mut self, leaving_row: RowIndex, pivot: Fractional, direction: &[Fractional]) {
        if matches!(self.rule, PricingRule::Dantzig) || pivot == 0.0 {
            return;
        }
        let gamma_leaving = self.norms[leaving_row.0];
        for (row, &d) in direction.iter().enumerate() {
            if row == leaving_row.0 || d == 0.0 {
                continue;
            }
            let candidate = (d / pivot) * (d / pivot) * gamma_leaving;
            if candidate > self.norms[row] {
                self.norms[row] = candidate;
            }
        }
        self.norms[leaving_row.0] = (gamma_leaving / (pivot * pivot)).max(1.0);
    }

    pub fn needs_recompute(&self, drift_threshold: Fractional) -> bool {
        self.norms.iter().any(|&g| !g.is_finite() || g > drift_threshold)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dantzig_rule_ignores_norms() {
        let mut norms = PrimalEdgeNorms::new(3, PricingRule::Dantzig);
        norms.norms[0] = 99.0;
        assert_eq!(norms.norm(ColIndex(0)), 1.0);
    }

    #[test]
    fn devex_update_raises_weight_of_columns_in_update_row() {
        let mut norms = PrimalEdgeNorms::new(3, PricingRule::Devex);
        let mut row: SparseVector<ColIndex> = SparseVector::new();
        row.set_coefficient(ColIndex(1), 2.0);
        row.clean_up();
        norms.update_before_basis_pivot(ColIndex(0), ColIndex(2), 1.0, &row);
        assert!(norms.norm(ColIndex(1)) >= 4.0);
        assert_eq!(norms.norm(ColIndex(2)), 1.0); // max(1/1, 1) = 1
    }

    #[test]
    fn needs_recompute_flags_nonfinite_weights() {
        let mut norms = PrimalEdgeNorms::new(1, PricingRule::Devex);
        norms.norms[0] = Fractional::INFINITY;
        assert!(norms.needs_recompute(1e8));
    }

    #[test]
    fn set_rule_switches_which_weights_are_consulted() {
        let mut norms = PrimalEdgeNorms::new(1, PricingRule::Dantzig);
        norms.norms[0] = 7.0;
        assert_eq!(norms.norm(ColIndex(0)), 1.0);
        norms.set_rule(PricingRule::Devex);
        assert_eq!(norms.norm(ColIndex(0)), 7.0);
    }

    #[test]
    fn dual_norms_resize_preserves_existing_weights() {
        let mut norms = DualEdgeNorms::new(2, PricingRule::Devex);
        norms.norms[0] = 3.0;
        norms.resize(4);
        assert_eq!(norms.norm(RowIndex(0)), 3.0);
        assert_eq!(norms.norm(RowIndex(3)), 1.0);
    }
}
