//! MILP formulation of task selection.
//!
//! Translates a validated [`Problem`] into a [`LinearModel`]:
//!
//! ```text
//! maximise   sum_t priority_t * x_t
//! subject to sum_t time_t  * x_t <= max_hours
//!            sum_t labor_t * x_t <= labor_capacity
//!            x_i - x_j <= 0                  for each dependency (i, j)
//!            time_t * x_t <= deadline_t      for each task with a deadline
//!            x_t in {0, 1}  (or [0, 1] when partial_allowed)
//! ```
//!
//! The deadline row is per task: it forbids selecting a task whose own
//! duration exceeds its deadline (or caps the fraction of a partial task).
//! It does not sequence tasks against each other.

use std::collections::HashMap;

use tracing::debug;

use super::model::{ConstraintKind, LinearModel, Term, VarId, VarKind};
use crate::models::{Problem, Task};
use crate::validation::{ValidationError, ValidationErrorKind};

/// Default model name.
pub const DEFAULT_MODEL_NAME: &str = "Task_Scheduling_Problem";

/// Builds a selection model from a problem.
///
/// # Example
/// ```
/// use u_select::lp::SelectionModelBuilder;
/// use u_select::models::{Problem, Task};
///
/// let problem = Problem::new(vec![Task::new("A", 5.0, 2.0, 1.0)], 4.0, 3.0);
/// let built = SelectionModelBuilder::new(&problem).build().unwrap();
/// assert_eq!(built.model.variable_count(), 1);
/// assert_eq!(built.model.constraint_count(), 2); // time + labor
/// ```
pub struct SelectionModelBuilder<'a> {
    problem: &'a Problem,
    model_name: String,
}

/// A built model plus the task → variable map.
#[derive(Debug, Clone)]
pub struct BuiltModel {
    pub model: LinearModel,
    pub variables: HashMap<String, VarId>,
}

impl<'a> SelectionModelBuilder<'a> {
    /// Creates a builder for the given problem.
    pub fn new(problem: &'a Problem) -> Self {
        Self {
            problem,
            model_name: DEFAULT_MODEL_NAME.to_string(),
        }
    }

    /// Sets the model name.
    pub fn with_model_name(mut self, name: impl Into<String>) -> Self {
        self.model_name = name.into();
        self
    }

    /// Builds the model.
    ///
    /// # Errors
    /// `InvalidDependency` when a dependency names a task that does not
    /// exist. Nothing is returned in that case, not even a partial model.
    pub fn build(&self) -> Result<BuiltModel, ValidationError> {
        let mut model = LinearModel::new(&self.model_name);
        let variables = self.create_variables(&mut model);
        let tasks = self.problem.tasks.as_slice();

        for task in tasks {
            model.add_objective_term(variables[&task.name], task.priority);
        }

        model.add_constraint(
            ConstraintKind::TimeBudget,
            weighted(tasks, &variables, |t| t.time),
            self.problem.max_hours,
        );
        model.add_constraint(
            ConstraintKind::LaborBudget,
            weighted(tasks, &variables, |t| t.labor),
            self.problem.labor_capacity,
        );

        for dep in &self.problem.task_dependencies {
            let (Some(&dependent), Some(&prerequisite)) = (
                variables.get(&dep.dependent),
                variables.get(&dep.prerequisite),
            ) else {
                return Err(ValidationError::new(
                    ValidationErrorKind::InvalidDependency,
                    format!(
                        "Invalid dependency: {} or {} not found in tasks",
                        dep.dependent, dep.prerequisite
                    ),
                )
                .for_field("task_dependencies"));
            };
            model.add_constraint(
                ConstraintKind::Dependency {
                    dependent: dep.dependent.clone(),
                    prerequisite: dep.prerequisite.clone(),
                },
                vec![Term::new(dependent, 1.0), Term::new(prerequisite, -1.0)],
                0.0,
            );
        }

        for task in tasks {
            if let Some(deadline) = task.deadline {
                if task.deadline_excludes_full_selection() {
                    debug!(
                        event = "deadline_caps_task",
                        task = %task.name,
                        time = task.time,
                        deadline,
                        partial = task.partial_allowed,
                    );
                }
                model.add_constraint(
                    ConstraintKind::Deadline {
                        task: task.name.clone(),
                    },
                    vec![Term::new(variables[&task.name], task.time)],
                    deadline,
                );
            }
        }

        debug!(
            event = "model_built",
            model = %model.name(),
            variables = model.variable_count(),
            integers = model.integer_count(),
            constraints = model.constraint_count(),
        );

        Ok(BuiltModel { model, variables })
    }

    /// Creates one [0, 1] variable per task: binary unless `partial_allowed`.
    fn create_variables(&self, model: &mut LinearModel) -> HashMap<String, VarId> {
        self.problem
            .tasks
            .iter()
            .map(|task| {
                let kind = if task.partial_allowed {
                    VarKind::Continuous
                } else {
                    VarKind::Binary
                };
                (task.name.clone(), model.add_variable(&task.name, kind))
            })
            .collect()
    }
}

fn weighted(
    tasks: &[Task],
    variables: &HashMap<String, VarId>,
    weight: impl Fn(&Task) -> f64,
) -> Vec<Term> {
    tasks
        .iter()
        .map(|t| Term::new(variables[&t.name], weight(t)))
        .collect()
}
