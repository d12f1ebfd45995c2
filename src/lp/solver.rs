//! Solver adapter.
//!
//! [`LpSolver`] is the seam between the model and a concrete MILP backend.
//! The default [`MicroLpSolver`] drives the pure-Rust `microlp` backend
//! through `good_lp` and reports the backend's own outcome; [`interpret`]
//! then turns anything other than `Optimal` into a terminal error.

use std::panic::{self, AssertUnwindSafe};
use std::time::Duration;

use good_lp::{
    constraint, microlp, variable, Expression, ProblemVariables, ResolutionError, Solution,
    SolutionStatus, SolverModel, Variable, WithTimeLimit,
};
use thiserror::Error;
use tracing::{debug, warn};

use super::model::{LinearModel, Term, VarKind};
use crate::error::ScheduleError;
use crate::models::SolveStatus;

/// Raw result of one solver invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct SolverRun {
    /// Status as reported by the backend.
    pub status: SolveStatus,
    /// Variable values indexed by `VarId`; empty unless `Optimal`.
    pub values: Vec<f64>,
    /// Backend message for non-optimal outcomes.
    pub message: Option<String>,
}

impl SolverRun {
    pub fn optimal(values: Vec<f64>) -> Self {
        Self {
            status: SolveStatus::Optimal,
            values,
            message: None,
        }
    }

    pub fn with_status(status: SolveStatus) -> Self {
        Self {
            status,
            values: Vec::new(),
            message: None,
        }
    }

    pub fn not_solved(message: impl Into<String>) -> Self {
        Self {
            status: SolveStatus::NotSolved,
            values: Vec::new(),
            message: Some(message.into()),
        }
    }
}

/// The backend failed in a way that is not a solver status (a panic or an
/// internal backend error).
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{0}")]
pub struct SolverFault(pub String);

/// A MILP backend.
pub trait LpSolver {
    /// Backend name for logs.
    fn name(&self) -> &str;

    /// Solves the model once.
    ///
    /// Implementations map their native outcome onto [`SolveStatus`]; they
    /// must not retry.
    fn solve(&self, model: &LinearModel) -> Result<SolverRun, SolverFault>;
}

/// Maps a raw run onto the caller-facing outcome.
///
/// Only `Optimal` yields values; every other status is an error and no
/// partial values escape.
pub fn interpret(run: SolverRun) -> Result<Vec<f64>, ScheduleError> {
    match run.status {
        SolveStatus::Optimal => Ok(run.values),
        SolveStatus::Infeasible => Err(ScheduleError::Infeasible),
        SolveStatus::Unbounded => Err(ScheduleError::Unbounded),
        SolveStatus::NotSolved => Err(ScheduleError::not_solved(
            run.message
                .unwrap_or_else(|| "solver did not converge".to_string()),
        )),
    }
}

/// `microlp` backend (branch and bound over the simplex method).
///
/// A time limit is handed to the backend, which stops branching once it
/// expires. A stopped run is `NotSolved` even when the backend holds an
/// incumbent.
#[derive(Debug, Clone, Default)]
pub struct MicroLpSolver {
    time_limit: Option<Duration>,
}

impl MicroLpSolver {
    /// Creates a solver without a time limit.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a wall-clock limit for each solve.
    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit = Some(limit);
        self
    }

    /// Configured time limit.
    pub fn time_limit(&self) -> Option<Duration> {
        self.time_limit
    }
}

impl LpSolver for MicroLpSolver {
    fn name(&self) -> &str {
        "microlp"
    }

    fn solve(&self, model: &LinearModel) -> Result<SolverRun, SolverFault> {
        panic::catch_unwind(AssertUnwindSafe(|| solve_model(model, self.time_limit)))
            .unwrap_or_else(|payload| {
                let reason = payload
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                Err(SolverFault(format!("solver panicked: {reason}")))
            })
    }
}

fn solve_model(
    model: &LinearModel,
    time_limit: Option<Duration>,
) -> Result<SolverRun, SolverFault> {
    let mut vars = ProblemVariables::new();
    let handles: Vec<Variable> = model
        .variables()
        .iter()
        .map(|v| {
            let definition = match v.kind {
                VarKind::Binary => variable().binary(),
                VarKind::Continuous => variable().min(v.lower).max(v.upper),
            };
            vars.add(definition.name(v.task_name.as_str()))
        })
        .collect();

    let objective = expression(model.objective(), &handles);
    let mut problem = vars.maximise(objective).using(microlp);
    if let Some(limit) = time_limit {
        problem = problem.with_time_limit(limit.as_secs_f64());
    }
    for row in model.constraints() {
        let lhs = expression(&row.terms, &handles);
        problem = problem.with(constraint!(lhs <= row.rhs));
    }

    debug!(
        event = "backend_solve",
        backend = "microlp",
        variables = handles.len(),
        constraints = model.constraint_count(),
        time_limit_ms = time_limit.map(|l| l.as_millis() as u64),
    );

    match problem.solve() {
        Ok(solution) => Ok(match solution.status() {
            SolutionStatus::Optimal => {
                SolverRun::optimal(handles.iter().map(|&v| solution.value(v)).collect())
            }
            SolutionStatus::TimeLimit => limit_reached(time_limit),
            SolutionStatus::GapLimit => {
                SolverRun::not_solved("stopped at the gap limit before proving optimality")
            }
        }),
        Err(err) => classify_error(err, time_limit),
    }
}

/// Maps a backend error onto a run or a fault.
///
/// `microlp` reports a limit hit before any feasible point as `Other`;
/// every other non-status error is a fault.
fn classify_error(
    err: ResolutionError,
    time_limit: Option<Duration>,
) -> Result<SolverRun, SolverFault> {
    match err {
        ResolutionError::Infeasible => Ok(SolverRun::with_status(SolveStatus::Infeasible)),
        ResolutionError::Unbounded => Ok(SolverRun::with_status(SolveStatus::Unbounded)),
        ResolutionError::Other(_) if time_limit.is_some() => Ok(limit_reached(time_limit)),
        other => Err(SolverFault(format!("microlp: {other}"))),
    }
}

fn limit_reached(time_limit: Option<Duration>) -> SolverRun {
    let limit_ms = time_limit.map_or(0, |l| l.as_millis() as u64);
    warn!(event = "solve_timeout", limit_ms);
    SolverRun::not_solved(format!("time limit of {limit_ms} ms exceeded"))
}

fn expression(terms: &[Term], handles: &[Variable]) -> Expression {
    terms
        .iter()
        .map(|t| t.coefficient * handles[t.var.index()])
        .sum()
}
