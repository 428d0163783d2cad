//! The top-level driver: `RevisedSimplex` ties every other module into the
//! feasibility / optimization / polish / push pipeline and owns the single
//! mutable state (basis, variable values, reduced costs, edge norms) that
//! every pivot touches.
//!
//! Grounded in the teacher's `lpsolver::simplex_primal::PrimalSimplex` /
//! `simplex_dual::DualSimplex` for the pivot loop shape, and in the
//! alternating primal/dual re-optimization loop of a production revised
//! simplex solver for the phase control and warm-start/polish/push
//! structure this crate's feature set adds on top of what the teacher ships.

use crate::basis::BasisFactorization;
use crate::compact_matrix::CompactMatrix;
use crate::config::{AlgorithmPreference, LpParameters};
use crate::direction::Direction;
use crate::edge_norms::{DualEdgeNorms, PrimalEdgeNorms};
use crate::error::{LpError, LpResult};
use crate::initial_basis::InitialBasisBuilder;
use crate::pricing::{DualPricing, EnteringChoice, HarrisRatioTest, PrimalPricing, RatioTestResult};
use crate::problem::{BasisState, LinearProgram, LpSolution, LpStats};
use crate::reduced_costs::ReducedCosts;
use crate::rng::TieBreaker;
use crate::sparse::SparseVector;
use crate::time_limit::TimeLimit;
use crate::types::{ColIndex, Fractional, Phase, ProblemStatus, RowIndex, VariableStatus};
use crate::variable_values::{DualPrices, VariableValues};
use crate::variables_info::VariablesInfo;

/// What one feasibility/optimization pivot loop ended with.
enum LoopOutcome {
    ReachedOptimal,
    PrimalUnbounded { ray: Vec<Fractional> },
    /// No dual-feasible entering column exists: a dual-simplex step
    /// certifying primal infeasibility.
    DualUnbounded { ray: Vec<Fractional> },
    TimeOrIterationLimit,
    /// The objective crossed `objective_lower_limit`/`objective_upper_limit`
    /// (spec §4.8): the carried status is the interim one glop reports for
    /// whichever loop noticed it (`PRIMAL_FEASIBLE` or `DUAL_FEASIBLE`).
    ObjectiveLimitReached(ProblemStatus),
}

fn unit_vector(len: usize, at: usize) -> Vec<Fractional> {
    let mut v = vec![0.0; len];
    v[at] = 1.0;
    v
}

/// Owns one solve's worth of mutable state over the extended column space
/// (structural columns followed by one slack per row).
pub struct RevisedSimplex {
    num_structural_cols: usize,
    num_rows: usize,
    /// -1.0 when the caller's problem is a maximization, 1.0 otherwise.
    objective_scale: Fractional,
    /// Caller-scale objective coefficients, structural columns only.
    original_objective: Vec<Fractional>,
    objective_offset: Fractional,
    rhs: Vec<Fractional>,
    matrix: CompactMatrix,
    info: VariablesInfo,
    basis: BasisFactorization,
    reduced_costs: ReducedCosts,
    primal_norms: PrimalEdgeNorms,
    dual_norms: DualEdgeNorms,
    dual_prices: DualPrices,
    tie_breaker: TieBreaker,
    time_limit: TimeLimit,
    /// Per structural column: 1.0 if the caller marked it integer, else 0.0.
    integrality_scale: Vec<Fractional>,
    params: LpParameters,
    stats: LpStats,
    phase: Phase,
    iteration_count: u64,
    unbounded_ray: Option<Vec<Fractional>>,
    infeasibility_ray: Option<Vec<Fractional>>,
    /// Set once `try_adopt_warm_start` successfully adopts a saved basis;
    /// `AlgorithmPreference::Automatic` reads this to decide dual vs primal,
    /// matching glop's own heuristic of preferring the dual simplex when
    /// resuming from a basis that is already close to feasible.
    warm_started: bool,
}

impl RevisedSimplex {
    /// Solves `problem` from scratch (all-slack or heuristic initial basis).
    pub fn solve(problem: &LinearProgram, params: LpParameters) -> LpResult<LpSolution> {
        let mut engine = Self::new(problem, params)?;
        engine.run()
    }

    /// Solves `problem`, first trying to adopt `warm` as the starting basis.
    /// Falls back silently to the from-scratch initial basis if `warm`
    /// doesn't factorize or is too ill-conditioned to trust.
    pub fn solve_with_warm_start(problem: &LinearProgram, params: LpParameters, warm: &BasisState) -> LpResult<LpSolution> {
        let mut engine = Self::new(problem, params)?;
        engine.try_adopt_warm_start(warm)?;
        engine.run()
    }

    fn new(problem: &LinearProgram, params: LpParameters) -> LpResult<Self> {
        problem.validate()?;
        let num_rows = problem.num_rows;
        let num_structural_cols = problem.num_cols;
        let scale = problem.internal_objective_scale();

        let mut matrix = CompactMatrix::from_dense_rows_with_slacks(&problem.a);
        if params.use_transposed_matrix {
            matrix.build_transpose();
        }

        // Row bounds become slack bounds under `A x + slack = 0`:
        // slack = -activity, so slack's own range is the row range negated
        // and flipped.
        let mut lower_bounds = problem.column_lower.clone();
        let mut upper_bounds = problem.column_upper.clone();
        for bounds in &problem.row_bounds {
            lower_bounds.push(-bounds.upper);
            upper_bounds.push(-bounds.lower);
        }
        let mut info = VariablesInfo::new(lower_bounds, upper_bounds, num_structural_cols);
        info.initialize_default_statuses();

        let proposed =
            InitialBasisBuilder::build(params.initial_basis, &matrix, &info, params.exploit_singleton_column_in_initial_basis);
        let basis = InitialBasisBuilder::initialize_first_basis(
            proposed,
            num_rows,
            num_structural_cols,
            &matrix,
            params.pivot_tolerance,
            params.initial_condition_number_threshold,
        );
        for &col in basis.basic_columns() {
            info.set_basic(col, 0.0);
        }

        let rhs = vec![0.0; num_rows];
        {
            let dense = |c: ColIndex| matrix.dense_column(c);
            VariableValues::recompute_basic_values(&basis, &mut info, &rhs, &dense)?;
        }

        let mut internal_objective = vec![0.0; info.num_cols()];
        for col in 0..num_structural_cols {
            internal_objective[col] = problem.objective[col] * scale;
        }
        let mut reduced_costs = ReducedCosts::new(internal_objective, params.optimality_tolerance);
        reduced_costs.recompute_precise(&basis, &matrix, &info)?;

        let primal_norms = PrimalEdgeNorms::new(info.num_cols(), params.feasibility_rule);
        let dual_norms = DualEdgeNorms::new(num_rows, params.feasibility_rule);
        let dual_prices = DualPrices::new(num_rows);
        let tie_breaker = TieBreaker::new(params.random_seed);
        let time_limit = TimeLimit::new(params.timeout_ms);

        let mut integrality_scale = vec![0.0; num_structural_cols];
        for c in &problem.integer_columns {
            if c.0 < num_structural_cols {
                integrality_scale[c.0] = 1.0;
            }
        }

        Ok(RevisedSimplex {
            num_structural_cols,
            num_rows,
            objective_scale: scale,
            original_objective: problem.objective.clone(),
            objective_offset: problem.objective_offset,
            rhs,
            matrix,
            info,
            basis,
            reduced_costs,
            primal_norms,
            dual_norms,
            dual_prices,
            tie_breaker,
            time_limit,
            integrality_scale,
            params,
            stats: LpStats::default(),
            phase: Phase::Feasibility,
            iteration_count: 0,
            unbounded_ray: None,
            infeasibility_ray: None,
            warm_started: false,
        })
    }

    /// Resolves `AlgorithmPreference` to a concrete primal/dual choice:
    /// `Automatic` prefers the dual simplex when a warm start was actually
    /// adopted (the basis is already likely primal-feasible-ish and only
    /// needs re-optimizing for a changed bound/objective, the case dual
    /// excels at), and the primal simplex otherwise.
    fn wants_dual(&self) -> bool {
        match self.params.algorithm {
            AlgorithmPreference::Dual => true,
            AlgorithmPreference::Primal => false,
            AlgorithmPreference::Automatic => self.warm_started,
        }
    }

    /// Replaces the from-scratch basis with `warm`'s, provided it factorizes
    /// and is not too ill-conditioned; otherwise leaves the basis `new()`
    /// already built untouched.
    fn try_adopt_warm_start(&mut self, warm: &BasisState) -> LpResult<()> {
        if warm.basic_columns.len() != self.num_rows || warm.basic_columns.iter().any(|&c| c >= self.info.num_cols()) {
            // Shape changed since the basis was saved (a row or column was
            // added/removed): the from-scratch basis `new()` already built
            // stands, exactly as an unfactorizable warm start would.
            if self.params.log_search_progress {
                log::warn!("warm-start basis shape does not match this problem, falling back to the freshly built initial basis");
            }
            return Ok(());
        }
        let basic_cols: Vec<ColIndex> = warm.basic_columns.iter().map(|&c| ColIndex(c)).collect();
        let mut candidate = BasisFactorization::from_columns(basic_cols.clone(), self.params.pivot_tolerance);
        let factorized = {
            let matrix = &self.matrix;
            let dense = |c: ColIndex| matrix.dense_column(c);
            candidate.refactorize(&dense).is_ok()
        };
        if !factorized || candidate.exceeds_condition_threshold(self.params.initial_condition_number_threshold) {
            if self.params.log_search_progress {
                log::warn!("warm-start basis rejected, falling back to the freshly built initial basis");
            }
            return Ok(());
        }
        self.basis = candidate;
        if warm.column_statuses.len() == self.info.num_cols() {
            self.info.statuses = warm.column_statuses.clone();
        }
        for &col in &basic_cols {
            self.info.set_basic(col, 0.0);
        }
        for col in 0..self.info.num_cols() {
            let c = ColIndex(col);
            if !self.info.is_basic(c) {
                let status = self.info.statuses[col];
                let prior_value = self.info.values[col];
                self.info.reset_nonbasic_to_status(c, status, prior_value);
            }
        }
        {
            let matrix = &self.matrix;
            let dense = |c: ColIndex| matrix.dense_column(c);
            VariableValues::recompute_basic_values(&self.basis, &mut self.info, &self.rhs, &dense)?;
        }
        self.reduced_costs.recompute_precise(&self.basis, &self.matrix, &self.info)?;
        self.primal_norms.reset();
        self.dual_norms.reset();
        self.warm_started = true;
        Ok(())
    }

    fn run(&mut self) -> LpResult<LpSolution> {
        let _guard = self.time_limit.scoped_guard();
        let status = self.solve_inner()?;
        self.build_solution(status)
    }

    fn solve_inner(&mut self) -> LpResult<ProblemStatus> {
        if let Some(status) = self.run_feasibility_phase()? {
            return Ok(status);
        }
        self.reduced_costs.clear_cost_shifts();
        let real_objective = self.internal_objective();
        self.reduced_costs.set_objective(real_objective);
        self.refactorize()?;
        self.reduced_costs.recompute_precise(&self.basis, &self.matrix, &self.info)?;

        let status = self.optimize()?;
        if status == ProblemStatus::Optimal {
            if self.params.polish_solution {
                self.polish()?;
            }
            if self.params.push_super_basic_variables {
                self.push()?;
            }
        }
        Ok(status)
    }

    fn internal_objective(&self) -> Vec<Fractional> {
        let mut obj = vec![0.0; self.info.num_cols()];
        for col in 0..self.num_structural_cols {
            obj[col] = self.original_objective[col] * self.objective_scale;
        }
        obj
    }

    /// Drives out primal infeasibility before optimization starts. Returns
    /// `Some(status)` for a terminal outcome (infeasible or limit-truncated),
    /// `None` when the basis is already (or has become) primal feasible and
    /// the caller should proceed to `optimize`.
    fn run_feasibility_phase(&mut self) -> LpResult<Option<ProblemStatus>> {
        self.phase = Phase::Feasibility;
        if self.wants_dual() {
            if self.params.use_dedicated_dual_feasibility_algorithm {
                self.make_dual_feasible_via_shifts()?;
                return Ok(None);
            }
            return self.run_dual_phase_one();
        }

        let infeasibility = VariableValues::compute_max_primal_infeasibility(&self.info);
        if infeasibility <= self.params.feasibility_tolerance {
            return Ok(None);
        }
        if self.params.log_search_progress {
            log::info!("starting primal phase 1, initial infeasibility {infeasibility:.3e}");
        }
        match self.primal_loop(true)? {
            LoopOutcome::ReachedOptimal => {
                let remaining = VariableValues::compute_max_primal_infeasibility(&self.info);
                if remaining <= self.params.feasibility_tolerance {
                    Ok(None)
                } else {
                    let ray = self.current_simplex_multipliers().unwrap_or_else(|_| vec![0.0; self.num_rows]);
                    self.infeasibility_ray = Some(ray);
                    Ok(Some(ProblemStatus::PrimalInfeasible))
                }
            }
            LoopOutcome::TimeOrIterationLimit => Ok(Some(ProblemStatus::PrimalFeasible)),
            LoopOutcome::PrimalUnbounded { .. } | LoopOutcome::DualUnbounded { .. } => Ok(Some(ProblemStatus::Abnormal)),
        }
    }

    /// Restores dual feasibility by shifting non-basic costs and flipping
    /// boxed variables, rather than running a full dual phase-1 simplex —
    /// the "dedicated" algorithm `use_dedicated_dual_feasibility_algorithm`
    /// selects.
    fn make_dual_feasible_via_shifts(&mut self) -> LpResult<()> {
        self.refactorize()?;
        self.reduced_costs.recompute_precise(&self.basis, &self.matrix, &self.info)?;
        let tol = self.params.optimality_tolerance;
        for col in 0..self.info.num_cols() {
            let c = ColIndex(col);
            if self.info.is_basic(c) {
                continue;
            }
            if self.info.is_boxed(c) {
                let rc = self.reduced_costs.reduced_cost(c);
                let status = self.info.statuses[col];
                let ok = match status {
                    VariableStatus::AtLowerBound => rc >= -tol,
                    VariableStatus::AtUpperBound => rc <= tol,
                    _ => true,
                };
                if !ok {
                    let flipped = match status {
                        VariableStatus::AtLowerBound => VariableStatus::AtUpperBound,
                        VariableStatus::AtUpperBound => VariableStatus::AtLowerBound,
                        other => other,
                    };
                    self.info.reset_nonbasic_to_status(c, flipped, 0.0);
                }
                continue;
            }
            match self.info.statuses[col] {
                VariableStatus::AtLowerBound => self.reduced_costs.shift_cost_if_needed(c, true, tol),
                VariableStatus::AtUpperBound => self.reduced_costs.shift_cost_if_needed(c, false, tol),
                _ => {}
            }
        }
        {
            let matrix = &self.matrix;
            let dense = |c: ColIndex| matrix.dense_column(c);
            VariableValues::recompute_basic_values(&self.basis, &mut self.info, &self.rhs, &dense)?;
        }
        self.dual_norms.reset();
        Ok(())
    }

    /// Dual phase 1, used when `wants_dual()` but the cost-shift algorithm
    /// above is turned off: rather than a dedicated routine, this swaps in a
    /// synthetic objective that is trivially dual feasible (zero on every
    /// basic column, so the simplex multipliers are zero, and on each
    /// non-basic column a unit cost already matching the sign its current
    /// status requires), resets every non-basic FREE column's value to zero,
    /// and then runs the ordinary dual pivot loop against that objective to
    /// drive out primal infeasibility before restoring the real objective.
    /// Mirrors glop's `TransformToDualPhaseIProblem` followed by a regular
    /// `DualMinimize` call, rather than inventing a second dual pivot loop.
    fn run_dual_phase_one(&mut self) -> LpResult<Option<ProblemStatus>> {
        self.refactorize()?;
        let real_objective = self.reduced_costs.objective().to_vec();

        for col in 0..self.info.num_cols() {
            let c = ColIndex(col);
            if !self.info.is_basic(c) && self.info.statuses[col] == VariableStatus::Free {
                self.info.values[col] = 0.0;
            }
        }

        let mut phase1_objective = vec![0.0; self.info.num_cols()];
        for col in 0..self.info.num_cols() {
            let c = ColIndex(col);
            if self.info.is_basic(c) {
                continue;
            }
            phase1_objective[col] = match self.info.statuses[col] {
                VariableStatus::AtLowerBound => 1.0,
                VariableStatus::AtUpperBound => -1.0,
                _ => 0.0,
            };
        }
        self.reduced_costs.set_objective(phase1_objective);
        self.reduced_costs.recompute_precise(&self.basis, &self.matrix, &self.info)?;
        {
            let matrix = &self.matrix;
            let dense = |c: ColIndex| matrix.dense_column(c);
            VariableValues::recompute_basic_values(&self.basis, &mut self.info, &self.rhs, &dense)?;
        }
        self.dual_norms.reset();

        let outcome = self.dual_loop(true)?;

        self.reduced_costs.set_objective(real_objective);
        self.reduced_costs.recompute_precise(&self.basis, &self.matrix, &self.info)?;
        {
            let matrix = &self.matrix;
            let dense = |c: ColIndex| matrix.dense_column(c);
            VariableValues::recompute_basic_values(&self.basis, &mut self.info, &self.rhs, &dense)?;
        }

        match outcome {
            LoopOutcome::ReachedOptimal => {
                let remaining = VariableValues::compute_max_primal_infeasibility(&self.info);
                if remaining <= self.params.feasibility_tolerance {
                    Ok(None)
                } else {
                    let ray = self.current_simplex_multipliers().unwrap_or_else(|_| vec![0.0; self.num_rows]);
                    self.infeasibility_ray = Some(ray);
                    Ok(Some(ProblemStatus::PrimalInfeasible))
                }
            }
            LoopOutcome::DualUnbounded { ray } => {
                // No entering column keeps the leaving row's primal
                // infeasibility from growing without bound under the
                // synthetic objective: the same ray certifies the real
                // problem is primal infeasible.
                self.infeasibility_ray = Some(ray);
                Ok(Some(ProblemStatus::PrimalInfeasible))
            }
            LoopOutcome::TimeOrIterationLimit => Ok(Some(ProblemStatus::PrimalFeasible)),
            LoopOutcome::PrimalUnbounded { .. } | LoopOutcome::ObjectiveLimitReached(_) => Ok(Some(ProblemStatus::Abnormal)),
        }
    }

    /// Runs phase-II to optimality, alternating primal/dual re-optimization
    /// rounds (spec's re-optimization loop) when a round lands outside the
    /// feasibility/dual-feasibility tolerance.
    fn optimize(&mut self) -> LpResult<ProblemStatus> {
        self.phase = Phase::Optimization;
        self.primal_norms.set_rule(self.params.optimization_rule);
        self.dual_norms.set_rule(self.params.optimization_rule);
        let mut use_dual = self.wants_dual();
        if use_dual && self.params.perturb_costs_in_dual_simplex {
            self.reduced_costs.perturb_for_degeneracy(&self.info, self.params.optimality_tolerance, &mut self.tie_breaker);
        }
        let rounds = self.params.max_number_of_reoptimizations.max(1);
        let mut status = ProblemStatus::Init;
        for round in 0..rounds {
            let outcome = if use_dual { self.dual_loop(false)? } else { self.primal_loop(false)? };
            match outcome {
                LoopOutcome::ObjectiveLimitReached(interim_status) => {
                    status = interim_status;
                    break;
                }
                LoopOutcome::PrimalUnbounded { ray } => {
                    let cost_delta = self.dot_with_internal_objective(&ray);
                    if cost_delta < -self.params.optimality_tolerance {
                        self.unbounded_ray = Some(ray);
                        status = ProblemStatus::PrimalUnbounded;
                    } else {
                        status = ProblemStatus::Optimal;
                    }
                    break;
                }
                LoopOutcome::DualUnbounded { ray } => {
                    self.infeasibility_ray = Some(ray);
                    status = ProblemStatus::DualUnbounded;
                    break;
                }
                LoopOutcome::TimeOrIterationLimit => {
                    status = ProblemStatus::PrimalFeasible;
                    break;
                }
                LoopOutcome::ReachedOptimal => {
                    self.stats.max_dual_residual = self.reduced_costs.max_dual_residual(&self.basis, &self.matrix, &self.info)?;
                    self.refactorize()?;
                    self.reduced_costs.clear_cost_shifts();
                    self.reduced_costs.recompute_precise(&self.basis, &self.matrix, &self.info)?;
                    {
                        let matrix = &self.matrix;
                        let dense = |c: ColIndex| matrix.dense_column(c);
                        VariableValues::recompute_basic_values(&self.basis, &mut self.info, &self.rhs, &dense)?;
                    }
                    let mut primal_res = VariableValues::compute_max_primal_infeasibility(&self.info);
                    let dual_res = self.reduced_costs.max_dual_infeasibility(&self.info);
                    if self.matrix.has_transpose() {
                        let matrix = &self.matrix;
                        let row = |r: RowIndex| matrix.dense_row(r);
                        let residual = VariableValues::compute_max_primal_residual(&self.info, &self.rhs, &row);
                        self.stats.max_primal_residual = residual;
                        primal_res = primal_res.max(residual);
                    }
                    self.stats.max_primal_infeasibility = primal_res;
                    self.stats.max_dual_infeasibility = dual_res;
                    if primal_res <= self.params.solution_feasibility_tolerance && dual_res <= self.params.optimality_tolerance {
                        status = ProblemStatus::Optimal;
                        break;
                    }
                    if !self.params.allow_simplex_algorithm_change || round + 1 >= rounds {
                        status = if self.params.change_status_to_imprecise {
                            ProblemStatus::Imprecise
                        } else {
                            ProblemStatus::Optimal
                        };
                        break;
                    }
                    use_dual = !use_dual;
                    status = ProblemStatus::Optimal;
                }
            }
        }
        Ok(status)
    }

    /// User-scale objective at the current (possibly still-infeasible)
    /// primal values, for the `objective_lower_limit`/`objective_upper_limit`
    /// early-exit check (spec §4.8). Matches `build_solution`'s final
    /// objective computation, just evaluated mid-solve.
    fn current_objective_value(&self) -> Fractional {
        let mut value = self.objective_offset;
        for col in 0..self.num_structural_cols {
            value += self.original_objective[col] * self.info.values[col];
        }
        value
    }

    fn dot_with_internal_objective(&self, v: &[Fractional]) -> Fractional {
        self.reduced_costs.objective().iter().zip(v.iter()).map(|(c, x)| c * x).sum()
    }

    fn bump_phase_stats(&mut self, phase1: bool) {
        if phase1 {
            self.stats.phase1_iterations += 1;
        } else {
            self.stats.phase2_iterations += 1;
        }
    }

    /// One primal pivot loop, either driving out infeasibility against a
    /// synthetic phase-1 objective (`phase1`) or optimizing the real one.
    fn primal_loop(&mut self, phase1: bool) -> LpResult<LoopOutcome> {
        loop {
            if self.iteration_count >= self.params.max_iterations || self.time_limit.is_past_deadline() {
                return Ok(LoopOutcome::TimeOrIterationLimit);
            }
            if self.basis.needs_refactorization() {
                self.refactorize()?;
            }
            if phase1 {
                self.load_phase1_objective()?;
            }
            // Computing the objective takes time, so only check it right
            // after a refactorization (spec §4.8).
            if !phase1 && self.basis.is_refactorized() && self.current_objective_value() < self.params.objective_lower_limit {
                return Ok(LoopOutcome::ObjectiveLimitReached(ProblemStatus::PrimalFeasible));
            }

            let entering =
                PrimalPricing::select_entering_column(&self.info, &self.reduced_costs, &self.primal_norms, self.params.feasibility_tolerance, &mut self.tie_breaker);
            let Some(choice) = entering else {
                return Ok(LoopOutcome::ReachedOptimal);
            };
            self.time_limit.record_fp_operations(self.num_rows as u64);

            // Spec §4.6 step 5: if the best pivot found is still too small
            // relative to small_pivot_threshold * ||d||_inf, refactorize once
            // (a fresh LU is often enough to turn a marginal pivot into an
            // acceptable one) and restart the ratio test before committing.
            let mut d_true;
            let mut ratio_result;
            let mut retried_after_refactorization = false;
            loop {
                let (d, inf_norm) = Direction::compute(&self.basis, &self.matrix, choice.column)?;
                d_true = d;
                ratio_result = self.run_primal_ratio_test(&choice, &d_true, inf_norm);
                if let RatioTestResult::Pivot { too_small: true, .. } = ratio_result {
                    if !retried_after_refactorization && !self.basis.is_refactorized() {
                        retried_after_refactorization = true;
                        self.refactorize()?;
                        continue;
                    }
                }
                break;
            }

            match ratio_result {
                RatioTestResult::BoundFlip => {
                    self.apply_bound_flip(choice.column, &d_true);
                    self.iteration_count += 1;
                    self.bump_phase_stats(phase1);
                }
                RatioTestResult::Unbounded => {
                    if phase1 {
                        return Err(LpError::NumericalInstability("primal phase 1 ratio test reported unbounded".into()));
                    }
                    let ray = self.primal_unbounded_ray(choice.column, &d_true, choice.increasing);
                    return Ok(LoopOutcome::PrimalUnbounded { ray });
                }
                RatioTestResult::Pivot { leaving_row, leaving_bound, step, .. } => {
                    let step_true = if choice.increasing { step } else { -step };
                    let update_row = Direction::update_row(&self.basis, &self.matrix, leaving_row)?;
                    let pivot = d_true[leaving_row.0];
                    let update_row_pivot = update_row.look_up_coefficient(choice.column);
                    let leaving_col = self.basis.basic_column(leaving_row);
                    self.primal_norms.update_before_basis_pivot(choice.column, leaving_col, pivot, &update_row);
                    if self.primal_norms.needs_recompute(self.params.edge_norm_drift_threshold) {
                        self.primal_norms.reset();
                    }
                    self.apply_pivot(choice.column, leaving_row, leaving_bound, &d_true, step_true, &update_row, pivot, update_row_pivot)?;
                    self.iteration_count += 1;
                    self.bump_phase_stats(phase1);
                    if self.params.log_search_progress {
                        log::debug!("iteration {}: entering {:?}, leaving row {:?}", self.iteration_count, choice.column, leaving_row);
                    }
                }
            }
        }
    }

    fn run_primal_ratio_test(&mut self, choice: &EnteringChoice, d_true: &[Fractional], inf_norm: Fractional) -> RatioTestResult {
        let direction_test: Vec<Fractional> =
            if choice.increasing { d_true.to_vec() } else { d_true.iter().map(|v| -v).collect() };
        HarrisRatioTest::run(
            &self.info,
            self.basis.basic_columns(),
            &direction_test,
            choice.column,
            self.params.feasibility_tolerance * self.params.harris_tolerance_ratio,
            self.params.ratio_test_zero_threshold,
            self.params.minimum_acceptable_pivot,
            self.params.feasibility_tolerance * self.params.degenerate_ministep_factor,
            self.params.small_pivot_threshold,
            inf_norm,
        )
    }

    /// Flips `col` between its bounds without touching the basis, shifting
    /// every basic value by the resulting change in `col`'s own value.
    fn apply_bound_flip(&mut self, col: ColIndex, direction: &[Fractional]) {
        let old_value = self.info.values[col.0];
        let new_status = match self.info.statuses[col.0] {
            VariableStatus::AtLowerBound => VariableStatus::AtUpperBound,
            VariableStatus::AtUpperBound => VariableStatus::AtLowerBound,
            other => other,
        };
        self.info.reset_nonbasic_to_status(col, new_status, 0.0);
        let shift = self.info.values[col.0] - old_value;
        for row in 0..self.num_rows {
            let basic_col = self.basis.basic_column(RowIndex(row));
            self.info.values[basic_col.0] -= shift * direction[row];
        }
    }

    /// One dual simplex pivot loop: picks the most primal-infeasible basic
    /// row to leave, then the dual ratio test's entering column. `phase1`
    /// marks a call driving out primal infeasibility against the synthetic
    /// dual phase-1 objective (`run_dual_phase_one`) rather than the real
    /// one, matching `primal_loop`'s own phase1 flag: the objective-limit
    /// early exit only makes sense once the real objective is loaded.
    fn dual_loop(&mut self, phase1: bool) -> LpResult<LoopOutcome> {
        loop {
            if self.iteration_count >= self.params.max_iterations || self.time_limit.is_past_deadline() {
                return Ok(LoopOutcome::TimeOrIterationLimit);
            }
            if self.basis.needs_refactorization() {
                self.refactorize()?;
            }
            if !phase1 && self.basis.is_refactorized() && self.current_objective_value() > self.params.objective_upper_limit {
                return Ok(LoopOutcome::ObjectiveLimitReached(ProblemStatus::DualFeasible));
            }
            DualPricing::refresh_dual_prices(&mut self.dual_prices, &self.info, self.basis.basic_columns(), &self.dual_norms, self.params.feasibility_tolerance);
            let Some(leaving_row) = DualPricing::select_leaving_row(&self.dual_prices) else {
                return Ok(LoopOutcome::ReachedOptimal);
            };
            let leaving_col = self.basis.basic_column(leaving_row);
            let value = self.info.values[leaving_col.0];
            let leaving_increases = value < self.info.lower_bounds[leaving_col.0];
            let target_bound = if leaving_increases { self.info.lower_bounds[leaving_col.0] } else { self.info.upper_bounds[leaving_col.0] };

            let update_row = Direction::update_row(&self.basis, &self.matrix, leaving_row)?;
            let (entering, boxed_candidates) =
                DualPricing::select_entering_column(&self.info, &self.reduced_costs, &update_row, leaving_increases, self.params.ratio_test_zero_threshold);
            let Some(entering_col) = entering else {
                let ray = self.basis.left_solve(&unit_vector(self.num_rows, leaving_row.0))?;
                return Ok(LoopOutcome::DualUnbounded { ray });
            };

            let (d_true, _) = Direction::compute(&self.basis, &self.matrix, entering_col)?;
            let pivot = d_true[leaving_row.0];
            if pivot.abs() < self.params.dual_small_pivot_threshold {
                return Err(LpError::NumericalInstability("dual pivot element too small to accept".into()));
            }
            let step_true = (value - target_bound) / pivot;
            let update_row_pivot = update_row.look_up_coefficient(entering_col);

            DualPricing::flip_boxed_candidates(&mut self.info, &boxed_candidates, Some(entering_col));
            self.dual_norms.update_before_basis_pivot(leaving_row, pivot, &d_true);
            if self.dual_norms.needs_recompute(self.params.edge_norm_drift_threshold) {
                self.dual_norms.reset();
            }
            self.apply_pivot(entering_col, leaving_row, target_bound, &d_true, step_true, &update_row, pivot, update_row_pivot)?;
            self.dual_prices.remove(leaving_row);
            self.iteration_count += 1;
            self.bump_phase_stats(phase1);
        }
    }

    /// Shared commit sequence for a real basis pivot: reduced costs, basic
    /// values, the leaving column's exact bound snap, and the low-rank basis
    /// update, in the order every pivot variant (primal, dual, push) needs.
    /// Edge norms are updated by the caller first, since primal and dual
    /// pivots update different (column- vs. row-indexed) norm structures.
    #[allow(clippy::too_many_arguments)]
    fn apply_pivot(
        &mut self,
        entering: ColIndex,
        leaving_row: RowIndex,
        leaving_bound: Fractional,
        direction: &[Fractional],
        step_true: Fractional,
        update_row: &SparseVector<ColIndex>,
        pivot: Fractional,
        update_row_pivot: Fractional,
    ) -> LpResult<()> {
        let leaving_col = self.basis.basic_column(leaving_row);
        let entering_start_value = self.info.values[entering.0];
        self.reduced_costs.update_before_basis_pivot(entering, leaving_col, pivot, update_row);
        VariableValues::update_on_pivot(&self.basis, &mut self.info, direction, entering, entering_start_value, step_true);
        let leaving_status =
            if leaving_bound == self.info.lower_bounds[leaving_col.0] { VariableStatus::AtLowerBound } else { VariableStatus::AtUpperBound };
        self.info.reset_nonbasic_to_status(leaving_col, leaving_status, 0.0);
        let entering_value = self.info.values[entering.0];
        self.info.set_basic(entering, entering_value);
        let mut disagree = Direction::pivot_estimates_disagree(pivot, update_row_pivot, self.params.refactorization_threshold);
        if !disagree {
            let direction_error = Direction::compute_error(&self.basis, &self.matrix, entering, direction);
            disagree = direction_error > self.params.refactorization_threshold * (1.0 + pivot.abs());
        }
        self.basis.pivot_with_update(leaving_row, entering, direction);
        if disagree {
            self.refactorize()?;
        }
        Ok(())
    }

    fn refactorize(&mut self) -> LpResult<()> {
        let matrix = &self.matrix;
        let dense = |c: ColIndex| matrix.dense_column(c);
        self.basis.refactorize(&dense)?;
        self.stats.refactorization_count += 1;
        self.time_limit.record_fp_operations(self.num_rows as u64 * self.num_rows as u64);
        if self.basis.exceeds_condition_threshold(self.params.initial_condition_number_threshold) && self.params.log_search_progress {
            log::warn!("basis condition number exceeds threshold right after refactorization");
        }
        Ok(())
    }

    /// The phase-1 objective (spec's "sum of primal infeasibility costs"):
    /// +1 on a basic column above its upper bound, -1 below its lower
    /// bound, 0 everywhere else. Rebuilt and reduced costs re-derived from
    /// scratch every iteration, trading the incremental-maintenance
    /// machinery real phase-2 uses for a simpler, always-correct recompute —
    /// acceptable since the objective itself changes shape every time a
    /// basic variable crosses in or out of feasibility.
    fn load_phase1_objective(&mut self) -> LpResult<()> {
        let tol = self.params.feasibility_tolerance;
        let mut obj = vec![0.0; self.info.num_cols()];
        for col in 0..self.info.num_cols() {
            let c = ColIndex(col);
            if !self.info.is_basic(c) {
                continue;
            }
            let v = self.info.values[col];
            if v > self.info.upper_bounds[col] + tol {
                obj[col] = 1.0;
            } else if v < self.info.lower_bounds[col] - tol {
                obj[col] = -1.0;
            }
        }
        self.reduced_costs.set_objective(obj);
        self.reduced_costs.recompute_precise(&self.basis, &self.matrix, &self.info)
    }

    fn current_simplex_multipliers(&self) -> LpResult<Vec<Fractional>> {
        let mut c_basic = vec![0.0; self.num_rows];
        for row in 0..self.num_rows {
            let col = self.basis.basic_column(RowIndex(row));
            c_basic[row] = self.reduced_costs.objective()[col.0];
        }
        self.basis.left_solve(&c_basic)
    }

    fn primal_unbounded_ray(&self, entering: ColIndex, direction: &[Fractional], increasing: bool) -> Vec<Fractional> {
        let mut v = vec![0.0; self.info.num_cols()];
        for row in 0..self.num_rows {
            let basic_col = self.basis.basic_column(RowIndex(row));
            v[basic_col.0] = -direction[row];
        }
        v[entering.0] = 1.0;
        if !increasing {
            for x in &mut v {
                *x = -*x;
            }
        }
        v
    }

    /// A handful of degenerate pivots among zero-reduced-cost non-basic
    /// columns, trying to reduce the number of fractional integer-marked
    /// columns at the current (unchanged-objective) vertex. Every candidate
    /// pivot is committed rather than tried-and-reverted: since the
    /// entering column's reduced cost is (near) zero, each such pivot moves
    /// between vertices of the same optimal face, so the objective value
    /// cannot regress.
    fn polish(&mut self) -> LpResult<()> {
        if self.integrality_scale.iter().all(|&s| s == 0.0) {
            return Ok(());
        }
        self.phase = Phase::Polish;
        for _ in 0..5 {
            let candidates: Vec<ColIndex> = (0..self.info.num_cols())
                .map(ColIndex)
                .filter(|&c| !self.info.is_basic(c))
                .filter(|&c| self.info.can_increase(c) || self.info.can_decrease(c))
                .filter(|&c| self.reduced_costs.reduced_cost(c).abs() <= self.params.optimality_tolerance)
                .collect();
            if candidates.is_empty() {
                break;
            }
            let idx = self.tie_breaker.pick(&(0..candidates.len()).collect::<Vec<_>>());
            let col = candidates[idx];
            let increasing = if self.info.can_increase(col) && self.info.can_decrease(col) {
                self.tie_breaker.next_bool()
            } else {
                self.info.can_increase(col)
            };
            let (d_true, inf_norm) = Direction::compute(&self.basis, &self.matrix, col)?;
            let choice = EnteringChoice { column: col, reduced_cost: 0.0, increasing };
            let ratio_result = self.run_primal_ratio_test(&choice, &d_true, inf_norm);
            if let RatioTestResult::Pivot { leaving_row, leaving_bound, step, .. } = ratio_result {
                let step_true = if increasing { step } else { -step };
                let update_row = Direction::update_row(&self.basis, &self.matrix, leaving_row)?;
                let pivot = d_true[leaving_row.0];
                let update_row_pivot = update_row.look_up_coefficient(col);
                let leaving_col = self.basis.basic_column(leaving_row);
                self.primal_norms.update_before_basis_pivot(col, leaving_col, pivot, &update_row);
                if self.primal_norms.needs_recompute(self.params.edge_norm_drift_threshold) {
                    self.primal_norms.reset();
                }
                self.apply_pivot(col, leaving_row, leaving_bound, &d_true, step_true, &update_row, pivot, update_row_pivot)?;
                self.stats.polish_iterations += 1;
            }
        }
        Ok(())
    }

    /// Resolves every non-basic FREE column with a non-zero value (a
    /// super-basic, only reachable by constructing `VariablesInfo` directly
    /// or — in a richer warm-start payload than `BasisState` currently
    /// carries — inheriting a stale value across problem changes) by
    /// driving it toward zero, one normal primal pivot (or a pivot-free
    /// value shift when nothing blocks) at a time.
    fn push(&mut self) -> LpResult<()> {
        loop {
            let next = (0..self.info.num_cols()).map(ColIndex).find(|&c| self.info.is_super_basic(c));
            let Some(col) = next else { break };
            self.push_one(col)?;
            self.stats.push_iterations += 1;
        }
        Ok(())
    }

    fn push_one(&mut self, col: ColIndex) -> LpResult<()> {
        let current = self.info.values[col.0];
        if current.abs() <= self.params.crossover_bound_snapping_distance {
            self.info.values[col.0] = 0.0;
            return Ok(());
        }
        let increasing = current < 0.0;
        let target_span = current.abs();
        let (d_true, _) = Direction::compute(&self.basis, &self.matrix, col)?;
        let direction_test: Vec<Fractional> = if increasing { d_true.clone() } else { d_true.iter().map(|v| -v).collect() };

        let mut best: Option<(usize, Fractional)> = None;
        for (row, &d) in direction_test.iter().enumerate() {
            if d.abs() < self.params.ratio_test_zero_threshold {
                continue;
            }
            let basic_col = self.basis.basic_column(RowIndex(row));
            let value = self.info.values[basic_col.0];
            let bound = if d > 0.0 { self.info.lower_bounds[basic_col.0] } else { self.info.upper_bounds[basic_col.0] };
            if !bound.is_finite() {
                continue;
            }
            let ratio = ((value - bound) / d).max(0.0);
            if best.is_none_or(|(_, best_ratio)| ratio < best_ratio) {
                best = Some((row, ratio));
            }
        }

        match best {
            Some((row, ratio)) if ratio < target_span => {
                let leaving_row = RowIndex(row);
                let leaving_col = self.basis.basic_column(leaving_row);
                let leaving_bound =
                    if direction_test[row] > 0.0 { self.info.lower_bounds[leaving_col.0] } else { self.info.upper_bounds[leaving_col.0] };
                let step_true = if increasing { ratio } else { -ratio };
                let update_row = Direction::update_row(&self.basis, &self.matrix, leaving_row)?;
                let pivot = d_true[leaving_row.0];
                let update_row_pivot = update_row.look_up_coefficient(col);
                self.primal_norms.update_before_basis_pivot(col, leaving_col, pivot, &update_row);
                if self.primal_norms.needs_recompute(self.params.edge_norm_drift_threshold) {
                    self.primal_norms.reset();
                }
                self.apply_pivot(col, leaving_row, leaving_bound, &d_true, step_true, &update_row, pivot, update_row_pivot)?;
            }
            _ => {
                let step_true = -current;
                VariableValues::update_on_pivot(&self.basis, &mut self.info, &d_true, col, current, step_true);
                self.info.values[col.0] = 0.0;
            }
        }
        Ok(())
    }

    fn build_solution(&mut self, status: ProblemStatus) -> LpResult<LpSolution> {
        self.time_limit.advance_deterministic_time();
        self.stats.deterministic_time = self.time_limit.deterministic_time();

        let scale = self.objective_scale;
        let mut column_values = vec![0.0; self.num_structural_cols];
        let mut reduced_costs_out = vec![0.0; self.num_structural_cols];
        let mut column_statuses = vec![VariableStatus::AtLowerBound; self.num_structural_cols];
        for col in 0..self.num_structural_cols {
            column_values[col] = self.info.values[col];
            reduced_costs_out[col] = self.reduced_costs.reduced_cost(ColIndex(col)) / scale;
            column_statuses[col] = self.info.statuses[col];
        }

        let y = self.current_simplex_multipliers().unwrap_or_else(|_| vec![0.0; self.num_rows]);
        let row_duals: Vec<Fractional> = y.iter().map(|v| v / scale).collect();

        let objective_value =
            self.original_objective.iter().zip(column_values.iter()).map(|(c, x)| c * x).sum::<Fractional>() + self.objective_offset;

        let basis_state = BasisState {
            basic_columns: self.basis.basic_columns().iter().map(|c| c.0).collect(),
            column_statuses: self.info.statuses.clone(),
        };

        Ok(LpSolution {
            status,
            objective_value,
            column_values,
            reduced_costs: reduced_costs_out,
            column_statuses,
            row_duals,
            unbounded_ray: self.unbounded_ray.take(),
            infeasibility_ray: self.infeasibility_ray.take(),
            basis: basis_state,
            iteration_count: self.iteration_count,
            stats: self.stats.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problem::RowBounds;
    use crate::types::INFINITY;

    fn small_lp() -> LinearProgram {
        // minimize x + y s.t. x + y >= 2, 0 <= x, y <= 10
        LinearProgram::new(
            vec![1.0, 1.0],
            vec![vec![1.0, 1.0]],
            vec![RowBounds::at_least(2.0)],
            vec![0.0, 0.0],
            vec![10.0, 10.0],
        )
        .unwrap()
    }

    #[test]
    fn solves_a_simple_minimization_to_optimality() {
        let lp = small_lp();
        let solution = RevisedSimplex::solve(&lp, LpParameters::default()).unwrap();
        assert_eq!(solution.status, ProblemStatus::Optimal);
        assert!((solution.objective_value - 2.0).abs() < 1e-6);
    }

    #[test]
    fn detects_primal_infeasibility() {
        let lp = LinearProgram::new(
            vec![1.0, 1.0],
            vec![vec![1.0, 1.0], vec![1.0, 1.0]],
            vec![RowBounds::at_least(10.0), RowBounds::at_most(1.0)],
            vec![0.0, 0.0],
            vec![INFINITY, INFINITY],
        )
        .unwrap();
        let solution = RevisedSimplex::solve(&lp, LpParameters::default()).unwrap();
        assert_eq!(solution.status, ProblemStatus::PrimalInfeasible);
        assert!(solution.infeasibility_ray.is_some());
    }

    #[test]
    fn detects_primal_unboundedness() {
        // minimize -x s.t. x >= 0 (unbounded above since the objective
        // rewards increasing x without limit).
        let lp = LinearProgram::new(
            vec![-1.0],
            vec![vec![0.0]],
            vec![RowBounds::equal(0.0)],
            vec![0.0],
            vec![INFINITY],
        )
        .unwrap();
        let solution = RevisedSimplex::solve(&lp, LpParameters::default()).unwrap();
        assert_eq!(solution.status, ProblemStatus::PrimalUnbounded);
        assert!(solution.unbounded_ray.is_some());
    }

    #[test]
    fn maximize_flips_sign_correctly() {
        // maximize x + y s.t. x + y <= 5
        let lp = LinearProgram::new(vec![1.0, 1.0], vec![vec![1.0, 1.0]], vec![RowBounds::at_most(5.0)], vec![0.0, 0.0], vec![10.0, 10.0])
            .unwrap()
            .with_maximize(true);
        let solution = RevisedSimplex::solve(&lp, LpParameters::default()).unwrap();
        assert_eq!(solution.status, ProblemStatus::Optimal);
        assert!((solution.objective_value - 5.0).abs() < 1e-6);
    }

    #[test]
    fn dual_algorithm_reaches_the_same_optimum_as_primal() {
        let lp = small_lp();
        let dual_params = LpParameters::default().with_algorithm(AlgorithmPreference::Dual);
        let solution = RevisedSimplex::solve(&lp, dual_params).unwrap();
        assert_eq!(solution.status, ProblemStatus::Optimal);
        assert!((solution.objective_value - 2.0).abs() < 1e-6);
    }

    #[test]
    fn dual_phase_one_reaches_the_same_optimum_as_the_dedicated_shift_algorithm() {
        let lp = small_lp();
        let dual_params = LpParameters { algorithm: AlgorithmPreference::Dual, use_dedicated_dual_feasibility_algorithm: false, ..LpParameters::default() };
        let solution = RevisedSimplex::solve(&lp, dual_params).unwrap();
        assert_eq!(solution.status, ProblemStatus::Optimal);
        assert!((solution.objective_value - 2.0).abs() < 1e-6);
    }

    #[test]
    fn dual_phase_one_detects_primal_infeasibility() {
        let lp = LinearProgram::new(
            vec![1.0, 1.0],
            vec![vec![1.0, 1.0], vec![1.0, 1.0]],
            vec![RowBounds::at_least(10.0), RowBounds::at_most(1.0)],
            vec![0.0, 0.0],
            vec![INFINITY, INFINITY],
        )
        .unwrap();
        let dual_params = LpParameters { algorithm: AlgorithmPreference::Dual, use_dedicated_dual_feasibility_algorithm: false, ..LpParameters::default() };
        let solution = RevisedSimplex::solve(&lp, dual_params).unwrap();
        assert_eq!(solution.status, ProblemStatus::PrimalInfeasible);
        assert!(solution.infeasibility_ray.is_some());
    }

    #[test]
    fn warm_start_from_a_previous_optimal_basis_is_idempotent() {
        let lp = small_lp();
        let first = RevisedSimplex::solve(&lp, LpParameters::default()).unwrap();
        let second = RevisedSimplex::solve_with_warm_start(&lp, LpParameters::default(), &first.basis).unwrap();
        assert_eq!(second.status, ProblemStatus::Optimal);
        assert!((second.objective_value - first.objective_value).abs() < 1e-6);
        assert_eq!(second.iteration_count, 0);
    }

    #[test]
    fn automatic_algorithm_prefers_dual_only_after_a_successful_warm_start() {
        let lp = small_lp();
        let fresh = RevisedSimplex::new(&lp, LpParameters::default()).unwrap();
        assert!(!fresh.wants_dual());

        let first = RevisedSimplex::solve(&lp, LpParameters::default()).unwrap();
        let mut warm = RevisedSimplex::new(&lp, LpParameters::default()).unwrap();
        warm.try_adopt_warm_start(&first.basis).unwrap();
        assert!(warm.wants_dual());
    }

    #[test]
    fn push_resolves_a_directly_constructed_super_basic_variable() {
        let lp = small_lp();
        let mut engine = RevisedSimplex::new(&lp, LpParameters::default()).unwrap();
        // Column 0 is structural and currently non-basic; force it FREE with
        // a non-zero value to simulate a super-basic inherited by a warm
        // start richer than today's `BasisState` payload.
        engine.info.reset_nonbasic_to_status(ColIndex(0), VariableStatus::Free, 3.0);
        assert!(engine.info.is_super_basic(ColIndex(0)));
        engine.push().unwrap();
        assert!(!engine.info.is_super_basic(ColIndex(0)));
    }
}
