//! Solution model.
//!
//! A solution maps every task name to its activation value and records the
//! solver status and the achieved objective. It is produced once per
//! request and never mutated afterwards.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Outcome reported by the solver backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SolveStatus {
    /// Feasible and provably optimal.
    Optimal,
    /// No assignment satisfies all constraints.
    Infeasible,
    /// The objective can grow without bound.
    Unbounded,
    /// The solver did not converge, timed out, or was never invoked.
    #[serde(rename = "Not Solved")]
    NotSolved,
}

impl SolveStatus {
    /// Human-readable status name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Optimal => "Optimal",
            Self::Infeasible => "Infeasible",
            Self::Unbounded => "Unbounded",
            Self::NotSolved => "Not Solved",
        }
    }
}

impl fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A solved selection.
///
/// Serializes to `{"status": ..., "results": {name: value}, "objective_value": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Solution {
    /// Solver status (always `Optimal` for solutions handed to callers).
    pub status: SolveStatus,
    /// Activation value per task name, in [0, 1].
    pub results: BTreeMap<String, f64>,
    /// Total priority achieved.
    pub objective_value: f64,
}

impl Solution {
    /// Activation value of a task.
    pub fn activation(&self, task_name: &str) -> Option<f64> {
        self.results.get(task_name).copied()
    }

    /// Whether the task is active at all (activation > 0).
    pub fn is_selected(&self, task_name: &str) -> bool {
        self.activation(task_name).is_some_and(|v| v > 0.0)
    }

    /// Names of tasks with activation > 0, in name order.
    pub fn selected_tasks(&self) -> Vec<&str> {
        self.results
            .iter()
            .filter(|&(_, &v)| v > 0.0)
            .map(|(name, _)| name.as_str())
            .collect()
    }

    /// Names of tasks with activation exactly 1, in name order.
    pub fn fully_selected_tasks(&self) -> Vec<&str> {
        self.results
            .iter()
            .filter(|&(_, &v)| v >= 1.0)
            .map(|(name, _)| name.as_str())
            .collect()
    }

    /// Number of tasks in the result map.
    pub fn task_count(&self) -> usize {
        self.results.len()
    }
}
