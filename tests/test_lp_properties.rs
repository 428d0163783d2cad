// Cross-cutting properties a correct solve must satisfy, checked against
// the public API only. The sparse-vector round-trip and basis-consistency
// invariants live as unit tests next to the modules that own them.

use revised_simplex::{LinearProgram, LpParameters, ProblemStatus, RevisedSimplex, RowBounds, VariableStatus, INFINITY};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn random_small_lp() -> LinearProgram {
    // minimize 2x + 3y s.t. x + y >= 4, 2x + y <= 10, 0 <= x,y <= 6.
    LinearProgram::new(
        vec![2.0, 3.0],
        vec![vec![1.0, 1.0], vec![2.0, 1.0]],
        vec![RowBounds::at_least(4.0), RowBounds::at_most(10.0)],
        vec![0.0, 0.0],
        vec![6.0, 6.0],
    )
    .unwrap()
}

fn row_activity(lp: &LinearProgram, x: &[f64], row: usize) -> f64 {
    lp.a[row].iter().zip(x).map(|(a, v)| a * v).sum()
}

#[test]
fn an_optimal_solution_is_primal_feasible() {
    init_logging();
    let lp = random_small_lp();
    let solution = RevisedSimplex::solve(&lp, LpParameters::default()).unwrap();
    assert_eq!(solution.status, ProblemStatus::Optimal);

    for (c, &value) in solution.column_values.iter().enumerate() {
        assert!(value >= lp.column_lower[c] - 1e-6);
        assert!(value <= lp.column_upper[c] + 1e-6);
    }
    for (r, bounds) in lp.row_bounds.iter().enumerate() {
        let activity = row_activity(&lp, &solution.column_values, r);
        assert!(activity >= bounds.lower - 1e-6);
        assert!(activity <= bounds.upper + 1e-6);
    }
}

#[test]
fn an_optimal_solution_is_dual_feasible() {
    // At optimality every non-basic column's reduced cost must have a sign
    // consistent with its status: non-negative at its lower bound,
    // non-positive at its upper bound (minimization).
    let lp = random_small_lp();
    let solution = RevisedSimplex::solve(&lp, LpParameters::default()).unwrap();
    assert_eq!(solution.status, ProblemStatus::Optimal);

    for (c, &status) in solution.column_statuses.iter().enumerate() {
        let rc = solution.reduced_costs[c];
        match status {
            VariableStatus::AtLowerBound => assert!(rc >= -1e-6, "column {c} at lower bound has reduced cost {rc}"),
            VariableStatus::AtUpperBound => assert!(rc <= 1e-6, "column {c} at upper bound has reduced cost {rc}"),
            VariableStatus::FixedValue => {}
            _ => {}
        }
    }
}

#[test]
fn strong_duality_holds_at_the_optimum() {
    let lp = random_small_lp();
    let solution = RevisedSimplex::solve(&lp, LpParameters::default()).unwrap();
    assert_eq!(solution.status, ProblemStatus::Optimal);

    // c^T x = y^T (A x) + reduced_costs^T x always holds for an optimal
    // basis (basic columns have reduced cost 0, so this reduces to y^T b at
    // whichever bound is binding); check it directly against the realized
    // row activities rather than assuming a dual sign convention.
    let row_term: f64 = (0..lp.num_rows).map(|r| solution.row_duals[r] * row_activity(&lp, &solution.column_values, r)).sum();
    let reduced_cost_term: f64 = solution.reduced_costs.iter().zip(&solution.column_values).map(|(rc, x)| rc * x).sum();
    assert!((row_term + reduced_cost_term - solution.objective_value).abs() < 1e-6);
}

#[test]
fn an_unboundedness_certificate_is_a_genuine_improving_ray() {
    // minimize -x - y s.t. x - y <= 0, x,y >= 0: x=y=t is feasible for every
    // t >= 0 and drives the objective to -infinity.
    let lp =
        LinearProgram::new(vec![-1.0, -1.0], vec![vec![1.0, -1.0]], vec![RowBounds::at_most(0.0)], vec![0.0, 0.0], vec![INFINITY, INFINITY])
            .unwrap();
    let solution = RevisedSimplex::solve(&lp, LpParameters::default()).unwrap();
    assert_eq!(solution.status, ProblemStatus::PrimalUnbounded);
    let ray = solution.unbounded_ray.unwrap();

    // The ray is expressed over structural columns plus one slack per row
    // (`A x + slack = 0`); check the extended invariant directly rather
    // than assuming the slack component is zero.
    let structural_activity: f64 = lp.a[0].iter().zip(&ray).map(|(a, v)| a * v).sum();
    let slack_component = ray[lp.num_cols];
    assert!((structural_activity + slack_component).abs() < 1e-6);

    // The structural part is a strictly improving direction for the
    // minimization objective.
    let cost: f64 = lp.objective.iter().zip(&ray).map(|(c, v)| c * v).sum();
    assert!(cost < -1e-9);
}

#[test]
fn an_infeasibility_certificate_is_produced_for_an_infeasible_problem() {
    let lp = LinearProgram::new(
        vec![1.0],
        vec![vec![1.0], vec![1.0]],
        vec![RowBounds::at_least(5.0), RowBounds::at_most(1.0)],
        vec![0.0],
        vec![INFINITY],
    )
    .unwrap();
    let solution = RevisedSimplex::solve(&lp, LpParameters::default()).unwrap();
    assert_eq!(solution.status, ProblemStatus::PrimalInfeasible);
    assert!(solution.infeasibility_ray.is_some());
    assert!(!solution.column_values.is_empty());
}

#[test]
fn repeated_solves_with_the_same_seed_are_deterministic() {
    let lp = random_small_lp();
    let params = LpParameters::default().with_random_seed(42);

    let first = RevisedSimplex::solve(&lp, params.clone()).unwrap();
    let second = RevisedSimplex::solve(&lp, params).unwrap();

    assert_eq!(first.status, second.status);
    assert_eq!(first.iteration_count, second.iteration_count);
    for (a, b) in first.column_values.iter().zip(&second.column_values) {
        assert!((a - b).abs() < 1e-9);
    }
    assert_eq!(first.basis.basic_columns, second.basis.basic_columns);
}
