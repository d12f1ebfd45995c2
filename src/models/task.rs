//! Task model.
//!
//! A task is a candidate unit of work competing for the shared time and
//! labor budgets. Selecting it earns its priority; partially selecting it
//! (when allowed) earns the same fraction of its priority and consumes the
//! same fraction of its time and labor.

use serde::{Deserialize, Serialize};

/// A candidate task.
///
/// # Units
/// `time`, `labor` and `deadline` are plain numbers in whatever unit the
/// caller uses for `max_hours` and `labor_capacity`. The model never mixes
/// them with each other, only with their own budget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Unique task name. Used as the key of the result map.
    pub name: String,
    /// Objective weight (non-negative).
    pub priority: f64,
    /// Time consumed when fully selected (positive).
    pub time: f64,
    /// Labor consumed when fully selected (positive).
    pub labor: f64,
    /// Upper bound on `time` actually spent on this task. `None` = unbounded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<f64>,
    /// Whether the task may be performed fractionally.
    #[serde(default)]
    pub partial_allowed: bool,
}

impl Task {
    /// Creates an all-or-nothing task.
    pub fn new(name: impl Into<String>, priority: f64, time: f64, labor: f64) -> Self {
        Self {
            name: name.into(),
            priority,
            time,
            labor,
            deadline: None,
            partial_allowed: false,
        }
    }

    /// Sets the deadline.
    pub fn with_deadline(mut self, deadline: f64) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Allows (or forbids) fractional execution.
    pub fn with_partial(mut self, allowed: bool) -> Self {
        self.partial_allowed = allowed;
        self
    }

    /// Whether the deadline makes full selection impossible.
    ///
    /// Such a task can still be selected fractionally when `partial_allowed`
    /// is set, up to `deadline / time`.
    pub fn deadline_excludes_full_selection(&self) -> bool {
        self.deadline.is_some_and(|d| d < self.time)
    }
}
