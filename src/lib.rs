//! A revised simplex engine for continuous linear programs: primal and dual
//! variants sharing one basis factorization, warm starting from a previous
//! basis, and optional polish/push passes over a reached optimum.
//!
//! ```no_run
//! use revised_simplex::{LinearProgram, LpParameters, RevisedSimplex, RowBounds};
//!
//! let problem = LinearProgram::new(
//!     vec![1.0, 1.0],
//!     vec![vec![1.0, 1.0]],
//!     vec![RowBounds::at_least(2.0)],
//!     vec![0.0, 0.0],
//!     vec![10.0, 10.0],
//! ).unwrap();
//! let solution = RevisedSimplex::solve(&problem, LpParameters::default()).unwrap();
//! assert!(solution.status.is_terminal_success());
//! ```

#![forbid(unsafe_code)]

mod basis;
mod compact_matrix;
mod config;
mod direction;
mod edge_norms;
mod error;
mod initial_basis;
mod lu;
mod matrix;
mod pricing;
mod problem;
mod reduced_costs;
mod rng;
mod simplex;
mod sparse;
mod time_limit;
mod types;
mod variable_values;
mod variables_info;

pub use config::{AlgorithmPreference, InitialBasisHeuristic, LpParameters, PricingRule};
pub use error::{LpError, LpResult};
pub use problem::{BasisState, LinearProgram, LpSolution, LpStats, RowBounds};
pub use simplex::RevisedSimplex;
pub use types::{ColIndex, Fractional, ProblemStatus, RowIndex, VariableStatus, EPSILON, INFINITY};
