//! The public input/output types: `LinearProgram` (input), `LpSolution` /
//! `ProblemStatus` (output), and `BasisState` (the warm-start payload).
//!
//! Grounded in the teacher's `lpsolver::types::{LpProblem, LpSolution}`,
//! generalized to the bounded-variable, row-inequality form spec §6
//! describes (row bounds rather than a fixed `=`/`<=` sense per row, an
//! explicit maximize/minimize flag, and an objective offset/scaling factor
//! kept separate from optimization as spec §3 requires).

use crate::error::{LpError, LpResult};
use crate::types::{ColIndex, Fractional, ProblemStatus, RowIndex, VariableStatus, INFINITY};

/// One row's relation: stored as `[row_lower, row_upper]`, allowing `=`
/// (`lower == upper`), `<=` (`lower = -INFINITY`), `>=` (`upper = INFINITY`),
/// or a genuine two-sided range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RowBounds {
    pub lower: Fractional,
    pub upper: Fractional,
}

impl RowBounds {
    pub fn equal(value: Fractional) -> Self {
        RowBounds { lower: value, upper: value }
    }

    pub fn at_most(value: Fractional) -> Self {
        RowBounds { lower: -INFINITY, upper: value }
    }

    pub fn at_least(value: Fractional) -> Self {
        RowBounds { lower: value, upper: INFINITY }
    }
}

/// Dense description of a linear program, as handed in at `Solve()` entry.
/// Internally the engine always minimizes; `maximize` and
/// `objective_scaling_factor` record how to map back to the caller's sense.
#[derive(Debug, Clone)]
pub struct LinearProgram {
    pub num_cols: usize,
    pub num_rows: usize,
    /// Row-major: `a[row][col]`.
    pub a: Vec<Vec<Fractional>>,
    pub objective: Vec<Fractional>,
    pub objective_offset: Fractional,
    pub maximize: bool,
    pub column_lower: Vec<Fractional>,
    pub column_upper: Vec<Fractional>,
    pub row_bounds: Vec<RowBounds>,
    /// Columns collaborators (MIP preprocessors) mark integer-typed; the
    /// core never branches on these, it only carries the flag through.
    pub integer_columns: Vec<ColIndex>,
}

impl LinearProgram {
    pub fn new(
        objective: Vec<Fractional>,
        a: Vec<Vec<Fractional>>,
        row_bounds: Vec<RowBounds>,
        column_lower: Vec<Fractional>,
        column_upper: Vec<Fractional>,
    ) -> LpResult<Self> {
        let num_cols = objective.len();
        let num_rows = row_bounds.len();
        let problem = LinearProgram {
            num_cols,
            num_rows,
            a,
            objective,
            objective_offset: 0.0,
            maximize: false,
            column_lower,
            column_upper,
            row_bounds,
            integer_columns: Vec::new(),
        };
        problem.validate()?;
        Ok(problem)
    }

    pub fn with_maximize(mut self, maximize: bool) -> Self {
        self.maximize = maximize;
        self
    }

    pub fn with_objective_offset(mut self, offset: Fractional) -> Self {
        self.objective_offset = offset;
        self
    }

    /// The objective `cᵀx` the engine optimizes internally: sign-flipped
    /// from the caller's objective when `maximize` is set (spec §3: "an
    /// objective_scaling_factor <= 0" implements maximization via sign
    /// flip rather than a separate code path).
    pub fn internal_objective_scale(&self) -> Fractional {
        if self.maximize { -1.0 } else { 1.0 }
    }

    pub fn validate(&self) -> LpResult<()> {
        if self.num_rows == 0 || self.num_cols == 0 {
            return Err(LpError::EmptyProblem);
        }
        if self.a.len() != self.num_rows {
            return Err(LpError::RowDimensionMismatch { row: self.a.len(), expected: self.num_cols, got: self.a.len() });
        }
        for (r, row) in self.a.iter().enumerate() {
            if row.len() != self.num_cols {
                return Err(LpError::RowDimensionMismatch { row: r, expected: self.num_cols, got: row.len() });
            }
            for (c, &value) in row.iter().enumerate() {
                if !value.is_finite() {
                    return Err(LpError::MatrixEntryNotFinite { row: RowIndex(r), col: ColIndex(c) });
                }
            }
        }
        if self.column_lower.len() != self.num_cols {
            return Err(LpError::BoundsDimensionMismatch { expected: self.num_cols, got: self.column_lower.len() });
        }
        if self.column_upper.len() != self.num_cols {
            return Err(LpError::BoundsDimensionMismatch { expected: self.num_cols, got: self.column_upper.len() });
        }
        for c in 0..self.num_cols {
            if !self.objective[c].is_finite() {
                return Err(LpError::ObjectiveNotFinite(ColIndex(c)));
            }
            if self.column_lower[c] > self.column_upper[c] {
                return Err(LpError::InvalidVariableBounds(ColIndex(c)));
            }
        }
        for (r, bounds) in self.row_bounds.iter().enumerate() {
            if !bounds.lower.is_finite() && bounds.lower != -INFINITY {
                return Err(LpError::RhsNotFinite(RowIndex(r)));
            }
            if !bounds.upper.is_finite() && bounds.upper != INFINITY {
                return Err(LpError::RhsNotFinite(RowIndex(r)));
            }
        }
        Ok(())
    }
}

/// A basis row->column mapping together with every non-basic column's
/// status, the payload a caller saves to warm-start the next solve.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BasisState {
    /// `basic_columns[i]` is the column occupying row `i`.
    pub basic_columns: Vec<usize>,
    pub column_statuses: Vec<VariableStatus>,
}

/// Per-column and per-row solution detail, plus the ray/certificate data
/// required for unbounded/infeasible outcomes.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LpSolution {
    pub status: ProblemStatus,
    pub objective_value: Fractional,
    pub column_values: Vec<Fractional>,
    pub reduced_costs: Vec<Fractional>,
    pub column_statuses: Vec<VariableStatus>,
    pub row_duals: Vec<Fractional>,
    /// Set only for `PRIMAL_UNBOUNDED`: a direction `v` with `Av = 0` and
    /// strictly improving cost (spec §8 property 4).
    pub unbounded_ray: Option<Vec<Fractional>>,
    /// Set only for `PRIMAL_INFEASIBLE`/`DUAL_UNBOUNDED`: a dual ray `y`
    /// certifying infeasibility (spec §8 property 5).
    pub infeasibility_ray: Option<Vec<Fractional>>,
    pub basis: BasisState,
    pub iteration_count: u64,
    pub stats: LpStats,
}

/// Timing/iteration breakdown, following the teacher's `LpStats` shape.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LpStats {
    pub phase1_iterations: u64,
    pub phase2_iterations: u64,
    pub polish_iterations: u64,
    pub push_iterations: u64,
    pub refactorization_count: u64,
    pub deterministic_time: Fractional,
    pub max_primal_infeasibility: Fractional,
    pub max_dual_infeasibility: Fractional,
    /// `||A x - b||_inf` against the extended matrix rows, only populated
    /// when `use_transposed_matrix` is set (0 otherwise: the bound-violation
    /// check above already covers the default path).
    pub max_primal_residual: Fractional,
    /// How far the incrementally maintained reduced costs had drifted from a
    /// precise recompute the last time `optimize` reached a local optimum,
    /// before that recompute was applied.
    pub max_dual_residual: Fractional,
}

impl LpStats {
    pub fn display_summary(&self) -> String {
        format!(
            "phase1={} phase2={} polish={} push={} refactors={} det_time={:.6}s max_primal_inf={:.3e} max_dual_inf={:.3e} max_primal_residual={:.3e} max_dual_residual={:.3e}",
            self.phase1_iterations,
            self.phase2_iterations,
            self.polish_iterations,
            self.push_iterations,
            self.refactorization_count,
            self.deterministic_time,
            self.max_primal_infeasibility,
            self.max_dual_infeasibility,
            self.max_primal_residual,
            self.max_dual_residual,
        )
    }
}
