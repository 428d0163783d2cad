//! Per-column type, status, and bounds bookkeeping, plus the pricing
//! bitmaps spec §3 calls out (`can_decrease`, `can_increase`, `is_relevant`,
//! `is_basic`).
//!
//! Column space is "extended": the first `num_structural_cols` entries are
//! the caller's variables, followed by one slack per row.

use crate::types::{ColIndex, Fractional, VariableStatus, VariableType, INFINITY};

#[derive(Debug, Clone)]
pub struct VariablesInfo {
    pub lower_bounds: Vec<Fractional>,
    pub upper_bounds: Vec<Fractional>,
    pub types: Vec<VariableType>,
    pub statuses: Vec<VariableStatus>,
    pub values: Vec<Fractional>,
    num_structural_cols: usize,
}

impl VariablesInfo {
    pub fn new(lower_bounds: Vec<Fractional>, upper_bounds: Vec<Fractional>, num_structural_cols: usize) -> Self {
        let n = lower_bounds.len();
        let types = lower_bounds
            .iter()
            .zip(upper_bounds.iter())
            .map(|(&l, &u)| VariableType::from_bounds(l, u))
            .collect();
        VariablesInfo {
            lower_bounds,
            upper_bounds,
            types,
            statuses: vec![VariableStatus::AtLowerBound; n],
            values: vec![0.0; n],
            num_structural_cols,
        }
    }

    pub fn num_cols(&self) -> usize {
        self.lower_bounds.len()
    }

    pub fn num_structural_cols(&self) -> usize {
        self.num_structural_cols
    }

    pub fn is_slack(&self, col: ColIndex) -> bool {
        col.0 >= self.num_structural_cols
    }

    pub fn is_basic(&self, col: ColIndex) -> bool {
        matches!(self.statuses[col.0], VariableStatus::Basic)
    }

    pub fn can_decrease(&self, col: ColIndex) -> bool {
        match self.statuses[col.0] {
            VariableStatus::Basic => true,
            VariableStatus::Free => true,
            VariableStatus::AtLowerBound => false,
            VariableStatus::AtUpperBound => true,
            VariableStatus::FixedValue => false,
        }
    }

    pub fn can_increase(&self, col: ColIndex) -> bool {
        match self.statuses[col.0] {
            VariableStatus::Basic => true,
            VariableStatus::Free => true,
            VariableStatus::AtLowerBound => true,
            VariableStatus::AtUpperBound => false,
            VariableStatus::FixedValue => false,
        }
    }

    /// Non-basic columns with either degree of freedom participate in
    /// primal pricing; basic columns are never entering candidates.
    pub fn is_relevant_for_pricing(&self, col: ColIndex) -> bool {
        !self.is_basic(col) && (self.can_increase(col) || self.can_decrease(col))
    }

    /// A non-basic column with both bounds finite and distinct: can bound-flip.
    pub fn is_boxed(&self, col: ColIndex) -> bool {
        self.types[col.0] == VariableType::UpperAndLowerBounded
    }

    /// Sets status and derives the implied value: the matching bound for a
    /// fixed/at-bound status, or `starting_value` (default 0) for FREE.
    pub fn reset_nonbasic_to_status(&mut self, col: ColIndex, status: VariableStatus, starting_value: Fractional) {
        self.statuses[col.0] = status;
        self.values[col.0] = match status {
            VariableStatus::AtLowerBound => self.lower_bounds[col.0],
            VariableStatus::AtUpperBound => self.upper_bounds[col.0],
            VariableStatus::FixedValue => self.lower_bounds[col.0],
            VariableStatus::Free => starting_value,
            VariableStatus::Basic => self.values[col.0],
        };
    }

    pub fn set_basic(&mut self, col: ColIndex, value: Fractional) {
        self.statuses[col.0] = VariableStatus::Basic;
        self.values[col.0] = value;
    }

    /// Initializes every structural and slack column to its default
    /// non-basic status, matching `SetNonBasicVariableStatusAndDeriveValue`:
    /// lower-bounded columns start AT_LOWER, upper-only start AT_UPPER,
    /// boxed columns start at whichever bound has the smaller magnitude,
    /// unconstrained columns start FREE at zero.
    pub fn initialize_default_statuses(&mut self) {
        for col in 0..self.num_cols() {
            let c = ColIndex(col);
            let status = match self.types[col] {
                VariableType::Unconstrained => VariableStatus::Free,
                VariableType::LowerBounded => VariableStatus::AtLowerBound,
                VariableType::UpperBounded => VariableStatus::AtUpperBound,
                VariableType::Fixed => VariableStatus::FixedValue,
                VariableType::UpperAndLowerBounded => {
                    if self.lower_bounds[col].abs() <= self.upper_bounds[col].abs() {
                        VariableStatus::AtLowerBound
                    } else {
                        VariableStatus::AtUpperBound
                    }
                }
            };
            self.reset_nonbasic_to_status(c, status, 0.0);
        }
    }

    pub fn is_within_bounds(&self, col: ColIndex, tolerance: Fractional) -> bool {
        let value = self.values[col.0];
        let lower = self.lower_bounds[col.0];
        let upper = self.upper_bounds[col.0];
        value >= lower - tolerance && value <= upper + tolerance
    }

    /// `max(lower - value, value - upper)`: positive when infeasible.
    pub fn bound_violation(&self, col: ColIndex) -> Fractional {
        let value = self.values[col.0];
        let lower = self.lower_bounds[col.0];
        let upper = self.upper_bounds[col.0];
        (lower - value).max(value - upper)
    }

    /// A super-basic column: non-basic FREE with non-zero value (spec
    /// GLOSSARY); these only arise from a warm start and are resolved by
    /// the PUSH phase.
    pub fn is_super_basic(&self, col: ColIndex) -> bool {
        matches!(self.statuses[col.0], VariableStatus::Free) && self.values[col.0] != 0.0
    }

    pub fn nearer_finite_bound(&self, col: ColIndex) -> Fractional {
        let value = self.values[col.0];
        let lower = self.lower_bounds[col.0];
        let upper = self.upper_bounds[col.0];
        match (lower > -INFINITY, upper < INFINITY) {
            (true, true) => {
                if (value - lower).abs() <= (upper - value).abs() { lower } else { upper }
            }
            (true, false) => lower,
            (false, true) => upper,
            (false, false) => 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_statuses_follow_bound_shape() {
        let mut info = VariablesInfo::new(vec![0.0, -INFINITY, 2.0], vec![INFINITY, INFINITY, 2.0], 3);
        info.initialize_default_statuses();
        assert_eq!(info.statuses[0], VariableStatus::AtLowerBound);
        assert_eq!(info.statuses[1], VariableStatus::Free);
        assert_eq!(info.statuses[2], VariableStatus::FixedValue);
    }

    #[test]
    fn can_increase_decrease_reflect_status() {
        let mut info = VariablesInfo::new(vec![0.0], vec![10.0], 1);
        info.reset_nonbasic_to_status(ColIndex(0), VariableStatus::AtLowerBound, 0.0);
        assert!(info.can_increase(ColIndex(0)));
        assert!(!info.can_decrease(ColIndex(0)));
    }

    #[test]
    fn super_basic_detected_for_nonzero_free_value() {
        let mut info = VariablesInfo::new(vec![-INFINITY], vec![INFINITY], 1);
        info.reset_nonbasic_to_status(ColIndex(0), VariableStatus::Free, 3.0);
        assert!(info.is_super_basic(ColIndex(0)));
    }

    #[test]
    fn bound_violation_is_nonpositive_when_feasible() {
        let mut info = VariablesInfo::new(vec![0.0], vec![10.0], 1);
        info.set_basic(ColIndex(0), 5.0);
        assert!(info.bound_violation(ColIndex(0)) <= 0.0);
        info.set_basic(ColIndex(0), 15.0);
        assert!(info.bound_violation(ColIndex(0)) > 0.0);
    }

    #[test]
    fn nearer_finite_bound_picks_closest_side() {
        let mut info = VariablesInfo::new(vec![0.0], vec![10.0], 1);
        info.set_basic(ColIndex(0), 9.0);
        assert_eq!(info.nearer_finite_bound(ColIndex(0)), 10.0);
        info.set_basic(ColIndex(0), 1.0);
        assert_eq!(info.nearer_finite_bound(ColIndex(0)), 0.0);
    }
}
