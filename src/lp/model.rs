//! Backend-agnostic linear model.
//!
//! Every constraint is a `<=` row over task variables, and the objective is
//! always maximised, so the representation stays a flat list of sparse
//! rows. The solver adapter translates it into a concrete backend.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Index of a decision variable within its model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VarId(usize);

impl VarId {
    /// Position in [`LinearModel::variables`].
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

/// Integrality of a decision variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VarKind {
    /// Integer in {0, 1}.
    Binary,
    /// Real in [lower, upper].
    Continuous,
}

/// One selection variable, keyed by task name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionVariable {
    /// Owning task.
    pub task_name: String,
    /// Integrality.
    pub kind: VarKind,
    /// Lower bound.
    pub lower: f64,
    /// Upper bound.
    pub upper: f64,
}

/// `coefficient * x[var]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Term {
    pub var: VarId,
    pub coefficient: f64,
}

impl Term {
    pub fn new(var: VarId, coefficient: f64) -> Self {
        Self { var, coefficient }
    }
}

/// What a constraint row encodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConstraintKind {
    /// Total time of selected tasks within `max_hours`.
    TimeBudget,
    /// Total labor of selected tasks within `labor_capacity`.
    LaborBudget,
    /// `x[dependent] <= x[prerequisite]`.
    Dependency {
        dependent: String,
        prerequisite: String,
    },
    /// `time * x[task] <= deadline`.
    Deadline { task: String },
}

impl fmt::Display for ConstraintKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TimeBudget => f.write_str("Total_Time"),
            Self::LaborBudget => f.write_str("Total_Labor"),
            Self::Dependency {
                dependent,
                prerequisite,
            } => write!(f, "Task_Dependency_{dependent}to{prerequisite}"),
            Self::Deadline { task } => write!(f, "Deadline_{task}"),
        }
    }
}

/// `sum(terms) <= rhs`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearConstraint {
    pub kind: ConstraintKind,
    pub terms: Vec<Term>,
    pub rhs: f64,
}

impl LinearConstraint {
    /// Left-hand side evaluated at `values` (indexed by [`VarId`]).
    pub fn lhs(&self, values: &[f64]) -> f64 {
        evaluate(&self.terms, values)
    }

    /// Whether the row holds within `tolerance`.
    pub fn is_satisfied(&self, values: &[f64], tolerance: f64) -> bool {
        self.lhs(values) <= self.rhs + tolerance
    }
}

/// A maximisation model over task selection variables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearModel {
    name: String,
    variables: Vec<DecisionVariable>,
    objective: Vec<Term>,
    constraints: Vec<LinearConstraint>,
}

impl LinearModel {
    /// Creates an empty model.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            variables: Vec::new(),
            objective: Vec::new(),
            constraints: Vec::new(),
        }
    }

    /// Adds a variable bounded to [0, 1].
    pub fn add_variable(&mut self, task_name: impl Into<String>, kind: VarKind) -> VarId {
        let id = VarId(self.variables.len());
        self.variables.push(DecisionVariable {
            task_name: task_name.into(),
            kind,
            lower: 0.0,
            upper: 1.0,
        });
        id
    }

    /// Adds `coefficient * x[var]` to the objective.
    pub fn add_objective_term(&mut self, var: VarId, coefficient: f64) {
        self.objective.push(Term::new(var, coefficient));
    }

    /// Adds `sum(terms) <= rhs`.
    pub fn add_constraint(&mut self, kind: ConstraintKind, terms: Vec<Term>, rhs: f64) {
        self.constraints.push(LinearConstraint { kind, terms, rhs });
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn variables(&self) -> &[DecisionVariable] {
        &self.variables
    }

    pub fn variable(&self, id: VarId) -> &DecisionVariable {
        &self.variables[id.index()]
    }

    /// Finds the variable of a task.
    pub fn variable_for(&self, task_name: &str) -> Option<VarId> {
        self.variables
            .iter()
            .position(|v| v.task_name == task_name)
            .map(VarId)
    }

    pub fn objective(&self) -> &[Term] {
        &self.objective
    }

    pub fn constraints(&self) -> &[LinearConstraint] {
        &self.constraints
    }

    pub fn variable_count(&self) -> usize {
        self.variables.len()
    }

    pub fn constraint_count(&self) -> usize {
        self.constraints.len()
    }

    /// Number of binary variables.
    pub fn integer_count(&self) -> usize {
        self.variables
            .iter()
            .filter(|v| v.kind == VarKind::Binary)
            .count()
    }

    /// Objective evaluated at `values`.
    pub fn objective_value(&self, values: &[f64]) -> f64 {
        evaluate(&self.objective, values)
    }

    /// Rows violated by `values` beyond `tolerance`.
    pub fn violated(&self, values: &[f64], tolerance: f64) -> Vec<&LinearConstraint> {
        self.constraints
            .iter()
            .filter(|c| !c.is_satisfied(values, tolerance))
            .collect()
    }

    /// Whether `values` respects every bound and row within `tolerance`.
    pub fn is_feasible(&self, values: &[f64], tolerance: f64) -> bool {
        values.len() == self.variables.len()
            && self
                .variables
                .iter()
                .zip(values)
                .all(|(v, &x)| x >= v.lower - tolerance && x <= v.upper + tolerance)
            && self.violated(values, tolerance).is_empty()
    }
}

fn evaluate(terms: &[Term], values: &[f64]) -> f64 {
    terms
        .iter()
        .map(|t| t.coefficient * values.get(t.var.index()).copied().unwrap_or(0.0))
        .sum()
}
