//! Request-scoped selection pipeline.
//!
//! # Pipeline
//!
//! 1. Validate the input (raw payload or typed problem).
//! 2. Build the MILP: one variable per task, objective, budget,
//!    dependency and deadline rows.
//! 3. Solve once with the configured backend.
//! 4. Map the status; project values onto a [`Solution`].
//!
//! Every call builds and drops its own model. The selector holds only its
//! configuration and solver, so one instance can serve concurrent requests
//! when the solver is `Sync`.

use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::config::SelectorConfig;
use crate::error::ScheduleError;
use crate::lp::{interpret, LpSolver, MicroLpSolver, SelectionModelBuilder};
use crate::models::{Problem, Solution};
use crate::validation::{validate_json, validate_problem, validate_request};

use super::projector::project;
use super::usage::ResourceUsage;

/// Selects the priority-maximising subset of tasks.
///
/// # Example
///
/// ```
/// use u_select::models::{Problem, Task};
/// use u_select::scheduler::TaskSelector;
///
/// let problem = Problem::new(
///     vec![
///         Task::new("A", 5.0, 2.0, 1.0),
///         Task::new("B", 3.0, 3.0, 2.0),
///     ],
///     4.0,
///     3.0,
/// );
///
/// let solution = TaskSelector::new().solve(&problem).unwrap();
/// assert_eq!(solution.activation("A"), Some(1.0));
/// assert_eq!(solution.activation("B"), Some(0.0));
/// assert!((solution.objective_value - 5.0).abs() < 1e-9);
/// ```
#[derive(Debug, Clone)]
pub struct TaskSelector<S = MicroLpSolver> {
    solver: S,
    config: SelectorConfig,
}

impl TaskSelector<MicroLpSolver> {
    /// Creates a selector with the default configuration.
    pub fn new() -> Self {
        Self::from_config(SelectorConfig::default())
    }

    /// Creates a selector using the default backend, honoring the
    /// configured time limit.
    pub fn from_config(config: SelectorConfig) -> Self {
        let solver = match config.time_limit() {
            Some(limit) => MicroLpSolver::new().with_time_limit(limit),
            None => MicroLpSolver::new(),
        };
        Self { solver, config }
    }
}

impl Default for TaskSelector<MicroLpSolver> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: LpSolver> TaskSelector<S> {
    /// Creates a selector with a custom backend.
    pub fn with_solver(solver: S, config: SelectorConfig) -> Self {
        Self { solver, config }
    }

    pub fn config(&self) -> &SelectorConfig {
        &self.config
    }

    pub fn solver(&self) -> &S {
        &self.solver
    }

    /// Solves a JSON request body.
    pub fn solve_json(&self, body: &str) -> Result<Solution, ScheduleError> {
        let problem = validate_json(body).inspect_err(log_failure)?;
        self.solve(&problem)
    }

    /// Solves a raw request payload.
    pub fn solve_request(&self, payload: &Value) -> Result<Solution, ScheduleError> {
        debug!(event = "request_received", payload = %payload);
        let problem = validate_request(payload).inspect_err(log_failure)?;
        self.solve(&problem)
    }

    /// Solves a typed problem.
    ///
    /// # Errors
    /// - `Validation` for bad values or unknown dependency names (the
    ///   solver is not invoked)
    /// - `Infeasible` / `Unbounded` / `NotSolved` for non-optimal solves
    /// - `Internal` for backend faults or undefined values
    pub fn solve(&self, problem: &Problem) -> Result<Solution, ScheduleError> {
        self.run(problem).inspect_err(log_failure)
    }

    fn run(&self, problem: &Problem) -> Result<Solution, ScheduleError> {
        validate_problem(problem)?;

        let built = SelectionModelBuilder::new(problem)
            .with_model_name(&self.config.model_name)
            .build()?;
        let model = built.model;

        info!(
            event = "solve_start",
            model = %model.name(),
            backend = self.solver.name(),
            task_count = problem.task_count(),
            dependency_count = problem.task_dependencies.len(),
            priority_bound = problem.total_priority(),
            constraint_count = model.constraint_count(),
        );

        let run = self
            .solver
            .solve(&model)
            .map_err(|fault| ScheduleError::internal(fault.to_string()))?;
        let status = run.status;
        debug!(event = "solver_returned", status = %status);

        let values = interpret(run)?;
        let solution = project(&model, &values, self.config.integrality_tolerance)?;

        let usage = ResourceUsage::calculate(problem, &solution);
        info!(
            event = "solve_end",
            status = %solution.status,
            objective = solution.objective_value,
            selected = solution.selected_tasks().len(),
            fully_selected = solution.fully_selected_tasks().len(),
            time_used = usage.time_used,
            labor_used = usage.labor_used,
        );
        Ok(solution)
    }
}

fn log_failure<E>(err: &E)
where
    E: Clone + Into<ScheduleError>,
{
    let err: ScheduleError = err.clone().into();
    match err {
        ScheduleError::Validation(v) => {
            warn!(event = "request_rejected", kind = ?v.kind, error = %v);
        }
        ScheduleError::Internal { detail } => {
            error!(event = "solve_failed", detail = %detail);
        }
        ScheduleError::NotSolved { reason } => {
            warn!(event = "solve_failed", status = "Not Solved", reason = %reason);
        }
        other => {
            warn!(event = "solve_failed", error = %other);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorClass;
    use crate::lp::{LinearModel, SolverFault, SolverRun};
    use crate::models::{SolveStatus, Task};
    use crate::validation::ValidationErrorKind;
    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};
    use serde_json::json;
    use std::cell::Cell;

    const EPS: f64 = 1e-6;

    /// Returns a fixed run and counts invocations.
    struct StubSolver {
        run: Result<SolverRun, SolverFault>,
        calls: Cell<usize>,
    }

    impl StubSolver {
        fn returning(run: Result<SolverRun, SolverFault>) -> Self {
            Self {
                run,
                calls: Cell::new(0),
            }
        }
    }

    impl LpSolver for StubSolver {
        fn name(&self) -> &str {
            "stub"
        }

        fn solve(&self, _model: &LinearModel) -> Result<SolverRun, SolverFault> {
            self.calls.set(self.calls.get() + 1);
            self.run.clone()
        }
    }

    fn stub(run: Result<SolverRun, SolverFault>) -> TaskSelector<StubSolver> {
        TaskSelector::with_solver(StubSolver::returning(run), SelectorConfig::default())
    }

    fn solve(problem: &Problem) -> Solution {
        TaskSelector::new().solve(problem).unwrap()
    }

    /// Values in model variable order, for feasibility checks.
    fn values_in_model_order(problem: &Problem, solution: &Solution) -> (LinearModel, Vec<f64>) {
        let model = SelectionModelBuilder::new(problem).build().unwrap().model;
        let values = model
            .variables()
            .iter()
            .map(|v| solution.activation(&v.task_name).unwrap())
            .collect();
        (model, values)
    }

    #[test]
    fn test_everything_fits() {
        let problem = Problem::new(
            vec![
                Task::new("A", 5.0, 1.0, 1.0),
                Task::new("B", 3.0, 2.0, 1.0),
                Task::new("C", 0.0, 1.0, 1.0),
            ],
            10.0,
            10.0,
        );
        let s = solve(&problem);

        assert_eq!(s.status, SolveStatus::Optimal);
        assert!((s.objective_value - problem.total_priority()).abs() < EPS);
        assert_eq!(s.activation("A"), Some(1.0));
        assert_eq!(s.activation("B"), Some(1.0));
    }

    #[test]
    fn test_two_task_scenario() {
        // A+B needs time 5 > 4: only A fits with the best priority.
        let problem = Problem::new(
            vec![Task::new("A", 5.0, 2.0, 1.0), Task::new("B", 3.0, 3.0, 2.0)],
            4.0,
            3.0,
        );
        let s = solve(&problem);

        assert_eq!(s.activation("A"), Some(1.0));
        assert_eq!(s.activation("B"), Some(0.0));
        assert!((s.objective_value - 5.0).abs() < EPS);
    }

    #[test]
    fn test_single_task_over_budget_binary() {
        let problem = Problem::new(vec![Task::new("big", 9.0, 10.0, 1.0)], 4.0, 5.0);
        let s = solve(&problem);
        assert_eq!(s.activation("big"), Some(0.0));
        assert_eq!(s.objective_value, 0.0);

        let problem = Problem::new(vec![Task::new("heavy", 9.0, 1.0, 8.0)], 4.0, 5.0);
        assert_eq!(solve(&problem).activation("heavy"), Some(0.0));
    }

    #[test]
    fn test_single_task_over_budget_fractional() {
        // min(4/10, 5/8) = 0.4
        let problem = Problem::new(
            vec![Task::new("big", 10.0, 10.0, 8.0).with_partial(true)],
            4.0,
            5.0,
        );
        let s = solve(&problem);
        let x = s.activation("big").unwrap();

        assert!((x - 0.4).abs() < EPS);
        assert!(x * 10.0 <= 4.0 + EPS);
        assert!((s.objective_value - 4.0).abs() < EPS);
    }

    #[test]
    fn test_dependency_respected() {
        // A is worth more but needs B; only one of them fits.
        let problem = Problem::new(
            vec![Task::new("A", 10.0, 1.0, 1.0), Task::new("B", 1.0, 1.0, 1.0)],
            1.0,
            10.0,
        )
        .with_dependency("A", "B");
        let s = solve(&problem);

        assert_eq!(s.activation("A"), Some(0.0));
        assert_eq!(s.activation("B"), Some(1.0));
        assert!((s.objective_value - 1.0).abs() < EPS);
    }

    #[test]
    fn test_fractional_dependency_bounded_by_prerequisite() {
        // B (partial) can only run at 0.5; A (partial) must not exceed it.
        let problem = Problem::new(
            vec![
                Task::new("A", 10.0, 1.0, 1.0).with_partial(true),
                Task::new("B", 1.0, 2.0, 1.0).with_partial(true).with_deadline(1.0),
            ],
            10.0,
            10.0,
        )
        .with_dependency("A", "B");
        let s = solve(&problem);

        let (a, b) = (s.activation("A").unwrap(), s.activation("B").unwrap());
        assert!((b - 0.5).abs() < EPS);
        assert!(a <= b + EPS);
        assert!((a - 0.5).abs() < EPS);
    }

    #[test]
    fn test_unknown_dependency_never_reaches_solver() {
        let problem = Problem::new(vec![Task::new("A", 1.0, 1.0, 1.0)], 1.0, 1.0)
            .with_dependency("A", "B");
        let selector = stub(Ok(SolverRun::optimal(vec![1.0])));

        let err = selector.solve(&problem).unwrap_err();
        match &err {
            ScheduleError::Validation(v) => {
                assert_eq!(v.kind, ValidationErrorKind::InvalidDependency)
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(err.class(), ErrorClass::InvalidInput);
        assert_eq!(selector.solver().calls.get(), 0);
    }

    #[test]
    fn test_deadline_shorter_than_time_forces_zero() {
        let problem = Problem::new(
            vec![
                Task::new("late", 100.0, 3.0, 1.0).with_deadline(2.0),
                Task::new("ok", 1.0, 3.0, 1.0).with_deadline(3.0),
            ],
            10.0,
            10.0,
        );
        let s = solve(&problem);

        assert_eq!(s.activation("late"), Some(0.0));
        assert_eq!(s.activation("ok"), Some(1.0));
    }

    #[test]
    fn test_partial_deadline_caps_fraction() {
        let problem = Problem::new(
            vec![Task::new("late", 100.0, 4.0, 1.0)
                .with_deadline(3.0)
                .with_partial(true)],
            10.0,
            10.0,
        );
        let x = solve(&problem).activation("late").unwrap();
        assert!((x - 0.75).abs() < EPS);
    }

    #[test]
    fn test_cycle_forces_equal_activation() {
        // Both fit individually, not together: the cycle leaves only "none".
        let problem = Problem::new(
            vec![Task::new("A", 5.0, 2.0, 1.0), Task::new("B", 1.0, 2.0, 1.0)],
            3.0,
            10.0,
        )
        .with_dependency("A", "B")
        .with_dependency("B", "A");
        let s = solve(&problem);
        assert_eq!(s.activation("A"), s.activation("B"));
        assert_eq!(s.activation("A"), Some(0.0));

        // With room for both, the cycle selects both.
        let roomy = Problem { max_hours: 4.0, ..problem };
        let s = solve(&roomy);
        assert_eq!(s.activation("A"), Some(1.0));
        assert_eq!(s.activation("B"), Some(1.0));
    }

    #[test]
    fn test_idempotent() {
        let problem = Problem::new(
            vec![
                Task::new("A", 4.0, 2.0, 2.0),
                Task::new("B", 4.0, 2.0, 2.0),
                Task::new("C", 3.0, 1.0, 3.0),
                Task::new("D", 6.0, 3.0, 1.0),
            ],
            5.0,
            5.0,
        )
        .with_dependency("C", "A");
        let selector = TaskSelector::new();

        let first = selector.solve(&problem).unwrap();
        let second = selector.solve(&problem).unwrap();
        assert_eq!(first.objective_value, second.objective_value);
        assert_eq!(first.selected_tasks(), second.selected_tasks());
    }

    #[test]
    fn test_missing_labor_capacity_never_reaches_solver() {
        let selector = stub(Ok(SolverRun::optimal(vec![1.0])));
        let payload = json!({
            "tasks": [{"name": "A", "priority": 1, "time": 1, "labor": 1}],
            "max_hours": 4,
        });

        let err = selector.solve_request(&payload).unwrap_err();
        match &err {
            ScheduleError::Validation(v) => {
                assert_eq!(v.kind, ValidationErrorKind::MissingField);
                assert_eq!(v.field.as_deref(), Some("labor_capacity"));
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(selector.solver().calls.get(), 0);
    }

    #[test]
    fn test_invalid_typed_problem_never_reaches_solver() {
        let selector = stub(Ok(SolverRun::optimal(vec![1.0])));
        let problem = Problem::new(vec![Task::new("A", 1.0, 0.0, 1.0)], 1.0, 1.0);

        assert!(matches!(
            selector.solve(&problem),
            Err(ScheduleError::Validation(_))
        ));
        assert_eq!(selector.solver().calls.get(), 0);
    }

    #[test]
    fn test_infeasible_status_is_terminal() {
        let selector = stub(Ok(SolverRun::with_status(SolveStatus::Infeasible)));
        let problem = Problem::new(vec![Task::new("A", 1.0, 1.0, 1.0)], 1.0, 1.0);

        let err = selector.solve(&problem).unwrap_err();
        assert_eq!(err, ScheduleError::Infeasible);
        assert_eq!(err.class(), ErrorClass::Infeasible);
        assert_eq!(selector.solver().calls.get(), 1);
    }

    #[test]
    fn test_not_solved_is_retryable_failure() {
        let selector = stub(Ok(SolverRun::not_solved("time limit of 10 ms exceeded")));
        let problem = Problem::new(vec![Task::new("A", 1.0, 1.0, 1.0)], 1.0, 1.0);

        let err = selector.solve(&problem).unwrap_err();
        assert!(err.is_retryable());
        assert_eq!(err.class(), ErrorClass::SolverFailure);
    }

    #[test]
    fn test_solver_fault_is_internal() {
        let selector = stub(Err(SolverFault("solver panicked: index out of bounds".into())));
        let problem = Problem::new(vec![Task::new("A", 1.0, 1.0, 1.0)], 1.0, 1.0);

        let err = selector.solve(&problem).unwrap_err();
        assert!(matches!(err, ScheduleError::Internal { .. }));
        assert_eq!(err.to_string(), "Internal solver failure");
    }

    #[test]
    fn test_missing_values_is_internal() {
        let selector = stub(Ok(SolverRun::optimal(vec![])));
        let problem = Problem::new(vec![Task::new("A", 1.0, 1.0, 1.0)], 1.0, 1.0);

        let err = selector.solve(&problem).unwrap_err();
        assert!(matches!(err, ScheduleError::Internal { .. }));
    }

    #[test]
    fn test_solve_json_response_shape() {
        let body = r#"{
            "tasks": [
                {"name": "A", "priority": 5, "time": 2, "labor": 1},
                {"name": "B", "priority": 3, "time": 3, "labor": 2}
            ],
            "max_hours": 4,
            "labor_capacity": 3,
            "task_dependencies": []
        }"#;
        let s = TaskSelector::new().solve_json(body).unwrap();
        let json = serde_json::to_value(&s).unwrap();

        assert_eq!(json["status"], "Optimal");
        assert_eq!(json["results"]["A"], 1.0);
        assert_eq!(json["results"]["B"], 0.0);
        assert!((json["objective_value"].as_f64().unwrap() - 5.0).abs() < EPS);
    }

    #[test]
    fn test_solve_json_malformed() {
        let err = TaskSelector::new().solve_json("{").unwrap_err();
        assert_eq!(err.class(), ErrorClass::InvalidInput);
    }

    #[test]
    fn test_configured_time_limit_reaches_backend() {
        let config = SelectorConfig::default().with_time_limit(std::time::Duration::from_secs(10));
        let selector = TaskSelector::from_config(config);
        assert_eq!(
            selector.solver().time_limit(),
            Some(std::time::Duration::from_secs(10))
        );

        let problem = Problem::new(vec![Task::new("A", 1.0, 1.0, 1.0)], 1.0, 1.0);
        assert_eq!(selector.solve(&problem).unwrap().activation("A"), Some(1.0));
    }

    #[test]
    fn test_time_limit_returns_retryable_not_solved() {
        // Equal-weight tasks with an odd time budget defeat branch and bound.
        let tasks = (0..35)
            .map(|i| Task::new(format!("T{i}"), 2.0, 2.0, 1.0))
            .collect();
        let problem = Problem::new(tasks, 35.0, 100.0);
        let config = SelectorConfig::default().with_time_limit(std::time::Duration::from_millis(100));

        let started = std::time::Instant::now();
        let err = TaskSelector::from_config(config).solve(&problem).unwrap_err();

        assert!(started.elapsed() < std::time::Duration::from_secs(10));
        assert!(matches!(err, ScheduleError::NotSolved { .. }));
        assert!(err.is_retryable());
        let body = err.to_body();
        assert_eq!(body.kind, ErrorClass::SolverFailure);
        assert!(body.retryable);
    }

    #[test]
    fn test_extreme_priorities_are_never_retryable() {
        let problem = Problem::new(
            vec![
                Task::new("A", 1e308, 1.0, 1.0),
                Task::new("B", 1e308, 1.0, 1.0),
            ],
            1.0,
            1.0,
        );
        match TaskSelector::new().solve(&problem) {
            Ok(s) => assert_eq!(s.task_count(), 2),
            Err(err) => {
                assert!(!err.is_retryable(), "{err:?} marked retryable");
                assert_eq!(err.class(), ErrorClass::SolverFailure);
            }
        }
    }

    fn random_problem(rng: &mut SmallRng, partial_rate: f64) -> Problem {
        let n = rng.random_range(2..=7);
        let tasks: Vec<Task> = (0..n)
            .map(|i| {
                let mut task = Task::new(
                    format!("T{i}"),
                    rng.random_range(0..=10) as f64,
                    rng.random_range(1..=6) as f64,
                    rng.random_range(1..=4) as f64,
                );
                if rng.random_bool(0.2) {
                    task = task.with_deadline(rng.random_range(1..=6) as f64);
                }
                task.with_partial(rng.random_bool(partial_rate))
            })
            .collect();

        let mut problem = Problem::new(
            tasks,
            rng.random_range(3..=15) as f64,
            rng.random_range(2..=10) as f64,
        );
        for _ in 0..rng.random_range(0..=3) {
            let i = rng.random_range(0..n);
            let j = rng.random_range(0..n);
            if i != j {
                problem = problem.with_dependency(format!("T{i}"), format!("T{j}"));
            }
        }
        problem
    }

    /// Best objective with every task restricted to {0, 1}.
    fn brute_force_binary(problem: &Problem) -> f64 {
        let model = SelectionModelBuilder::new(problem).build().unwrap().model;
        let n = model.variable_count();
        (0..1u32 << n)
            .map(|mask| {
                (0..n)
                    .map(|i| f64::from((mask >> i) & 1))
                    .collect::<Vec<_>>()
            })
            .filter(|values| model.is_feasible(values, 1e-9))
            .map(|values| model.objective_value(&values))
            .fold(f64::NEG_INFINITY, f64::max)
    }

    #[test]
    fn test_random_binary_matches_brute_force() {
        let mut rng = SmallRng::seed_from_u64(42);
        let selector = TaskSelector::new();

        for _ in 0..40 {
            let problem = random_problem(&mut rng, 0.0);
            let s = selector.solve(&problem).unwrap();

            let best = brute_force_binary(&problem);
            assert!(
                (s.objective_value - best).abs() < EPS,
                "objective {} != brute force {} for {:?}",
                s.objective_value,
                best,
                problem
            );

            let (model, values) = values_in_model_order(&problem, &s);
            assert!(model.is_feasible(&values, EPS), "infeasible for {problem:?}");
            assert!(values.iter().all(|&v| v == 0.0 || v == 1.0));
        }
    }

    #[test]
    fn test_random_mixed_feasible_and_dominates_binary() {
        let mut rng = SmallRng::seed_from_u64(7);
        let selector = TaskSelector::new();

        for _ in 0..40 {
            let problem = random_problem(&mut rng, 0.5);
            let s = selector.solve(&problem).unwrap();

            let (model, values) = values_in_model_order(&problem, &s);
            assert!(model.is_feasible(&values, EPS), "infeasible for {problem:?}");
            let usage = ResourceUsage::calculate(&problem, &s);
            assert!(usage.time_used <= problem.max_hours + EPS);
            assert!(usage.labor_used <= problem.labor_capacity + EPS);
            // Relaxing integrality can only help.
            assert!(s.objective_value >= brute_force_binary(&problem) - EPS);
        }
    }
}
