//! Error types for the solver. Follows the `thiserror`-derived enum plus
//! `Result` alias shape used throughout this corpus for numerical crates.

use crate::types::{ColIndex, RowIndex};
use thiserror::Error;

/// Anything that can go wrong building, warm-starting, or solving a problem.
#[derive(Debug, Error)]
pub enum LpError {
    #[error("objective vector has {got} entries, expected {expected}")]
    ObjectiveDimensionMismatch { expected: usize, got: usize },

    #[error("constraint matrix row {row} has {got} entries, expected {expected} columns")]
    RowDimensionMismatch { row: usize, expected: usize, got: usize },

    #[error("right-hand side vector has {got} entries, expected {expected}")]
    RhsDimensionMismatch { expected: usize, got: usize },

    #[error("variable bounds arrays have {got} entries, expected {expected}")]
    BoundsDimensionMismatch { expected: usize, got: usize },

    #[error("variable {0:?} has lower bound greater than upper bound")]
    InvalidVariableBounds(ColIndex),

    #[error("objective coefficient for column {0:?} is not finite")]
    ObjectiveNotFinite(ColIndex),

    #[error("constraint matrix entry at row {row:?}, column {col:?} is not finite")]
    MatrixEntryNotFinite { row: RowIndex, col: ColIndex },

    #[error("right-hand side for row {0:?} is not finite")]
    RhsNotFinite(RowIndex),

    #[error("numerical instability detected: {0}")]
    NumericalInstability(String),

    #[error("basis matrix is singular (pivot magnitude below tolerance at step {step})")]
    SingularBasis { step: usize },

    #[error("solve exceeded the deterministic time limit ({elapsed_ms}ms > {limit_ms}ms)")]
    TimeoutExceeded { elapsed_ms: u64, limit_ms: u64 },

    #[error("solve exceeded the memory limit ({usage_mb}MB > {limit_mb}MB)")]
    MemoryExceeded { usage_mb: usize, limit_mb: usize },

    #[error("problem has no rows or no columns")]
    EmptyProblem,
}

/// Convenience alias matching the `FEAResult<T>`-style alias this corpus uses
/// next to a `thiserror` enum.
pub type LpResult<T> = Result<T, LpError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages_are_human_readable() {
        let err = LpError::SingularBasis { step: 4 };
        assert_eq!(
            err.to_string(),
            "basis matrix is singular (pivot magnitude below tolerance at step 4)"
        );

        let err = LpError::TimeoutExceeded { elapsed_ms: 1200, limit_ms: 1000 };
        assert_eq!(err.to_string(), "solve exceeded the deterministic time limit (1200ms > 1000ms)");
    }

    #[test]
    fn invalid_variable_bounds_reports_the_column() {
        let err = LpError::InvalidVariableBounds(ColIndex(7));
        assert!(err.to_string().contains("ColIndex(7)"));
    }
}
