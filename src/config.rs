//! Solve parameters. One builder-style struct carrying every tunable named
//! in the spec's parameter table, following the teacher's
//! `lpsolver::types::LpConfig` `with_x(self, v) -> Self` convention.

use crate::types::{Fractional, INFINITY};

/// Which pricing rule drives entering-variable selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PricingRule {
    Dantzig,
    SteepestEdge,
    Devex,
}

/// Which algorithm family the top-level driver should prefer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlgorithmPreference {
    Primal,
    Dual,
    /// Let the driver pick based on warm-start availability and bound shape,
    /// matching glop's own `use_dual_simplex` heuristic.
    Automatic,
}

/// Which initial-basis construction `RevisedSimplex::initialize` should try
/// before falling back to all-slack (spec §4.9).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitialBasisHeuristic {
    /// Always start all-slack.
    None,
    /// glop's default: a single triangular pass over structural columns.
    Triangular,
    /// Triangular pass with Bixby's column ordering.
    Bixby,
    /// Triangular pass with Maros' column ordering.
    Maros,
}

/// Tunable parameters for one `RevisedSimplex::solve` call.
#[derive(Debug, Clone)]
pub struct LpParameters {
    pub feasibility_tolerance: Fractional,
    pub optimality_tolerance: Fractional,
    /// Threshold applied to the *final* basis's primal residual when deciding
    /// whether a nominally `OPTIMAL` solve should be reported as such or
    /// downgraded to `IMPRECISE` (spec §4.8). Kept distinct from
    /// `feasibility_tolerance`, which gates the feasibility phase's own
    /// stopping decision: a solve can clear the feasibility phase against a
    /// looser `feasibility_tolerance` and still fail this stricter
    /// end-of-solve check.
    pub solution_feasibility_tolerance: Fractional,
    pub ratio_test_zero_threshold: Fractional,
    pub pivot_tolerance: Fractional,
    /// Width of the Harris two-pass ratio test's relaxation band, expressed
    /// as a multiple of `feasibility_tolerance` (spec §4.6).
    pub harris_tolerance_ratio: Fractional,
    /// Fraction of a degenerate step's ratio bound actually taken, to avoid
    /// repeatedly landing exactly on a blocking bound (spec §4.6).
    pub degenerate_ministep_factor: Fractional,
    /// Pivot magnitudes at or below this are rejected by the ratio test
    /// outright, regardless of Harris relaxation (spec §4.6).
    pub small_pivot_threshold: Fractional,
    /// Absolute floor below which no pivot is ever accepted (spec §4.6).
    pub minimum_acceptable_pivot: Fractional,
    /// Disagreement threshold between the direction-vector and update-row
    /// estimates of a pivot element beyond which a refactorization is
    /// forced instead of a cheap update (spec §4.7).
    pub refactorization_threshold: Fractional,
    /// Condition-number upper bound beyond which `initialize` discards a
    /// heuristic initial basis and falls back to all-slack (spec §4.9).
    pub initial_condition_number_threshold: Fractional,
    /// Devex/steepest-edge weight value beyond which `PrimalEdgeNorms`/
    /// `DualEdgeNorms::needs_recompute` considers the incrementally
    /// maintained reference framework to have drifted too far from a true
    /// steepest-edge norm and due for a reset to the identity weights
    /// (spec §4.5).
    pub edge_norm_drift_threshold: Fractional,
    pub max_iterations: u64,
    pub max_number_of_reoptimizations: u32,
    pub timeout_ms: Option<u64>,
    pub max_memory_mb: Option<usize>,
    pub algorithm: AlgorithmPreference,
    /// Pricing rule used while driving out primal infeasibilities (phase 1 /
    /// dual-simplex feasibility phase); may differ from `optimization_rule`,
    /// which governs optimization once feasible (spec §4.5/§4.6 "feasibility
    /// vs optimization" split).
    pub feasibility_rule: PricingRule,
    pub optimization_rule: PricingRule,
    pub use_harris_ratio_test: bool,
    pub refactorization_period: u32,
    pub polish_solution: bool,
    pub push_super_basic_variables: bool,
    /// Objective-value bounds used to cut a solve short once it's already
    /// known to be good (or bad) enough (spec §4.8): checked once per
    /// refactorized iteration during the optimization phase. The primal loop
    /// stops and reports `PRIMAL_FEASIBLE` as soon as the objective drops
    /// below `objective_lower_limit`; the dual loop stops and reports
    /// `DUAL_FEASIBLE` once it rises above `objective_upper_limit`.
    pub objective_lower_limit: Fractional,
    pub objective_upper_limit: Fractional,
    /// Whether the dual simplex perturbs non-basic costs by a small random
    /// amount before its first pivot, to break primal degeneracy that would
    /// otherwise cause cycling (spec §4.4 dual-simplex notes).
    pub perturb_costs_in_dual_simplex: bool,
    pub use_transposed_matrix: bool,
    pub initial_basis: InitialBasisHeuristic,
    pub exploit_singleton_column_in_initial_basis: bool,
    /// Pivot threshold applied by the dedicated dual-feasibility algorithm
    /// (see `use_dedicated_dual_feasibility_algorithm`).
    pub dual_small_pivot_threshold: Fractional,
    /// Use a dual-simplex-specific feasibility-restoration routine instead of
    /// routing every feasibility phase through phase 1's Big-M primal
    /// (spec §4.3's dual-feasibility-phase Open Question).
    pub use_dedicated_dual_feasibility_algorithm: bool,
    /// Let the driver switch primal/dual mid-solve during re-optimization
    /// (spec §4.8's alternating loop), rather than locking to the initial
    /// `algorithm` choice for the whole solve.
    pub allow_simplex_algorithm_change: bool,
    /// Distance from a bound within which the polish/push passes snap a
    /// value exactly onto it rather than leaving an epsilon-sized residual
    /// (spec §4.10/§4.11).
    pub crossover_bound_snapping_distance: Fractional,
    /// Downgrade `OPTIMAL` to `IMPRECISE` when the final basis's residuals
    /// exceed tolerance instead of trusting the iteration that produced them
    /// (spec §4.8 Open Question: kept as an opt-in, since demoting
    /// `DUAL_INFEASIBLE`/other non-`OPTIMAL` terminal statuses this way would
    /// hide genuinely different outcomes).
    pub change_status_to_imprecise: bool,
    pub random_seed: u64,
    pub log_search_progress: bool,
    pub log_to_stdout: bool,
}

impl Default for LpParameters {
    fn default() -> Self {
        LpParameters {
            feasibility_tolerance: 1e-6,
            optimality_tolerance: 1e-6,
            solution_feasibility_tolerance: 1e-6,
            ratio_test_zero_threshold: 1e-9,
            pivot_tolerance: 1e-8,
            harris_tolerance_ratio: 10.0,
            degenerate_ministep_factor: 1.0,
            small_pivot_threshold: 1e-7,
            minimum_acceptable_pivot: 1e-9,
            refactorization_threshold: 1e-6,
            initial_condition_number_threshold: 1e12,
            edge_norm_drift_threshold: 1e8,
            max_iterations: 20_000,
            max_number_of_reoptimizations: 40,
            timeout_ms: Some(30_000),
            max_memory_mb: Some(2_048),
            algorithm: AlgorithmPreference::Automatic,
            feasibility_rule: PricingRule::SteepestEdge,
            optimization_rule: PricingRule::SteepestEdge,
            use_harris_ratio_test: true,
            refactorization_period: 100,
            polish_solution: false,
            push_super_basic_variables: false,
            objective_lower_limit: -INFINITY,
            objective_upper_limit: INFINITY,
            perturb_costs_in_dual_simplex: false,
            use_transposed_matrix: false,
            initial_basis: InitialBasisHeuristic::Triangular,
            exploit_singleton_column_in_initial_basis: true,
            dual_small_pivot_threshold: 1e-7,
            use_dedicated_dual_feasibility_algorithm: true,
            allow_simplex_algorithm_change: true,
            crossover_bound_snapping_distance: 1e-9,
            change_status_to_imprecise: true,
            random_seed: 1,
            log_search_progress: false,
            log_to_stdout: false,
        }
    }
}

impl LpParameters {
    /// No deterministic time limit; only the iteration cap bounds the solve.
    pub fn unlimited() -> Self {
        LpParameters { timeout_ms: None, max_memory_mb: None, ..Default::default() }
    }

    pub fn with_feasibility_tolerance(mut self, value: Fractional) -> Self {
        self.feasibility_tolerance = value;
        self
    }

    pub fn with_optimality_tolerance(mut self, value: Fractional) -> Self {
        self.optimality_tolerance = value;
        self
    }

    pub fn with_solution_feasibility_tolerance(mut self, value: Fractional) -> Self {
        self.solution_feasibility_tolerance = value;
        self
    }

    pub fn with_max_iterations(mut self, value: u64) -> Self {
        self.max_iterations = value;
        self
    }

    pub fn with_timeout_ms(mut self, value: u64) -> Self {
        self.timeout_ms = Some(value);
        self
    }

    pub fn without_timeout(mut self) -> Self {
        self.timeout_ms = None;
        self
    }

    pub fn with_max_memory_mb(mut self, value: usize) -> Self {
        self.max_memory_mb = Some(value);
        self
    }

    pub fn without_memory_limit(mut self) -> Self {
        self.max_memory_mb = None;
        self
    }

    pub fn with_algorithm(mut self, value: AlgorithmPreference) -> Self {
        self.algorithm = value;
        self
    }

    /// Sets both the feasibility- and optimization-phase pricing rule to the
    /// same value, the common case of picking one rule for the whole solve.
    /// Use `feasibility_rule`/`optimization_rule` directly to split them.
    pub fn with_pricing_rule(mut self, value: PricingRule) -> Self {
        self.feasibility_rule = value;
        self.optimization_rule = value;
        self
    }

    pub fn with_polish_solution(mut self, value: bool) -> Self {
        self.polish_solution = value;
        self
    }

    pub fn with_push_super_basic_variables(mut self, value: bool) -> Self {
        self.push_super_basic_variables = value;
        self
    }

    pub fn with_random_seed(mut self, value: u64) -> Self {
        self.random_seed = value;
        self
    }

    pub fn with_log_search_progress(mut self, value: bool) -> Self {
        self.log_search_progress = value;
        self
    }

    pub fn with_log_to_stdout(mut self, value: bool) -> Self {
        self.log_to_stdout = value;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_has_finite_tolerances_and_limits() {
        let p = LpParameters::default();
        assert!(p.feasibility_tolerance > 0.0);
        assert!(p.timeout_ms.is_some());
        assert!(p.max_memory_mb.is_some());
    }

    #[test]
    fn unlimited_clears_timeout_and_memory_cap() {
        let p = LpParameters::unlimited();
        assert!(p.timeout_ms.is_none());
        assert!(p.max_memory_mb.is_none());
    }

    #[test]
    fn builder_methods_chain() {
        let p = LpParameters::default()
            .with_max_iterations(10)
            .with_timeout_ms(500)
            .with_pricing_rule(PricingRule::Dantzig);
        assert_eq!(p.max_iterations, 10);
        assert_eq!(p.timeout_ms, Some(500));
        assert_eq!(p.feasibility_rule, PricingRule::Dantzig);
        assert_eq!(p.optimization_rule, PricingRule::Dantzig);
    }
}
