//! Problem (request) model.
//!
//! A problem bundles the candidate tasks, the two shared budgets and the
//! dependency pairs. It is the normalized form every entry point works on:
//! raw payloads are turned into a `Problem` by the validator, and typed
//! callers construct one directly.

use serde::{Deserialize, Serialize};

use super::Task;

/// Ordered pair `(dependent, prerequisite)` over task names.
///
/// The dependent may be active only to the extent the prerequisite is:
/// `activation(dependent) <= activation(prerequisite)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "(String, String)", into = "(String, String)")]
pub struct Dependency {
    /// Task that requires the prerequisite.
    pub dependent: String,
    /// Task that must be at least as active as the dependent.
    pub prerequisite: String,
}

impl Dependency {
    /// Creates a dependency: `dependent` requires `prerequisite`.
    pub fn new(dependent: impl Into<String>, prerequisite: impl Into<String>) -> Self {
        Self {
            dependent: dependent.into(),
            prerequisite: prerequisite.into(),
        }
    }
}

impl From<(String, String)> for Dependency {
    fn from((dependent, prerequisite): (String, String)) -> Self {
        Self {
            dependent,
            prerequisite,
        }
    }
}

impl From<Dependency> for (String, String) {
    fn from(dep: Dependency) -> Self {
        (dep.dependent, dep.prerequisite)
    }
}

/// A task selection problem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Problem {
    /// Candidate tasks.
    pub tasks: Vec<Task>,
    /// Time budget shared by all selected tasks.
    pub max_hours: f64,
    /// Labor budget shared by all selected tasks.
    pub labor_capacity: f64,
    /// Dependency pairs.
    #[serde(default)]
    pub task_dependencies: Vec<Dependency>,
}

impl Problem {
    /// Creates a problem without dependencies.
    pub fn new(tasks: Vec<Task>, max_hours: f64, labor_capacity: f64) -> Self {
        Self {
            tasks,
            max_hours,
            labor_capacity,
            task_dependencies: Vec::new(),
        }
    }

    /// Adds a dependency: `dependent` requires `prerequisite`.
    pub fn with_dependency(
        mut self,
        dependent: impl Into<String>,
        prerequisite: impl Into<String>,
    ) -> Self {
        self.task_dependencies
            .push(Dependency::new(dependent, prerequisite));
        self
    }

    /// Replaces the dependency list.
    pub fn with_dependencies(mut self, dependencies: Vec<Dependency>) -> Self {
        self.task_dependencies = dependencies;
        self
    }

    /// Number of tasks.
    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    /// Sum of all task priorities (upper bound on the objective).
    pub fn total_priority(&self) -> f64 {
        self.tasks.iter().map(|t| t.priority).sum()
    }
}
