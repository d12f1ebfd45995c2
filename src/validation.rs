//! Input validation for selection problems.
//!
//! Turns a raw JSON payload into a typed [`Problem`], or checks a `Problem`
//! built in code. Checks run in a fixed order and stop at the first
//! violation, so the caller always learns about the earliest offending
//! field:
//!
//! 1. `tasks`, `max_hours`, `labor_capacity` present (and `tasks` non-empty)
//! 2. `tasks` is a list of task records
//! 3. every task has `name`, `priority`, `time`, `labor`
//! 4. `priority >= 0`, `time > 0`, `labor > 0`
//! 5. names are non-empty and unique, `deadline > 0`, `partial_allowed` is boolean
//! 6. budgets are positive
//! 7. dependencies are `[dependent, prerequisite]` string pairs
//!
//! Whether dependency names refer to existing tasks is checked when the
//! model is built (see [`crate::lp::SelectionModelBuilder`]).

use serde_json::{Map, Value};
use std::collections::HashSet;
use thiserror::Error;

use crate::models::{Dependency, Problem, Task};

const REQUIRED_TASK_FIELDS: [&str; 4] = ["name", "priority", "time", "labor"];

/// A validation error.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct ValidationError {
    /// Error category.
    pub kind: ValidationErrorKind,
    /// Human-readable description.
    pub message: String,
    /// Offending task, when the error is task-specific.
    pub task: Option<String>,
    /// Offending field.
    pub field: Option<String>,
}

/// Categories of validation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// The body is not JSON or not a JSON object.
    MalformedPayload,
    /// A required field is absent, null or empty.
    MissingField,
    /// A field has the wrong shape (e.g. `tasks` is not a list of records).
    InvalidType,
    /// A numeric field is non-numeric or out of range.
    InvalidValue,
    /// Two tasks share a name.
    DuplicateName,
    /// A dependency entry is not a `[dependent, prerequisite]` pair.
    MalformedDependency,
    /// A dependency names a task that does not exist.
    InvalidDependency,
}

impl ValidationError {
    pub(crate) fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            task: None,
            field: None,
        }
    }

    pub(crate) fn for_task(mut self, task: impl Into<String>) -> Self {
        self.task = Some(task.into());
        self
    }

    pub(crate) fn for_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }
}

#[derive(Clone, Copy)]
enum Bound {
    NonNegative,
    Positive,
}

impl Bound {
    fn admits(self, value: f64) -> bool {
        value.is_finite()
            && match self {
                Self::NonNegative => value >= 0.0,
                Self::Positive => value > 0.0,
            }
    }
}

/// Parses a JSON request body and validates it.
pub fn validate_json(body: &str) -> Result<Problem, ValidationError> {
    let payload: Value = serde_json::from_str(body).map_err(|e| {
        ValidationError::new(
            ValidationErrorKind::MalformedPayload,
            format!("Request body is not valid JSON: {e}"),
        )
    })?;
    validate_request(&payload)
}

/// Validates a raw request payload and normalizes it into a [`Problem`].
///
/// # Returns
/// The typed problem, or the first violation found.
pub fn validate_request(payload: &Value) -> Result<Problem, ValidationError> {
    let obj = payload.as_object().ok_or_else(|| {
        ValidationError::new(
            ValidationErrorKind::MalformedPayload,
            "Request body must be a JSON object",
        )
    })?;

    let raw_tasks = present(obj, "tasks");
    let raw_max_hours = present(obj, "max_hours");
    let raw_labor = present(obj, "labor_capacity");
    let (Some(raw_tasks), Some(raw_max_hours), Some(raw_labor)) =
        (raw_tasks, raw_max_hours, raw_labor)
    else {
        let missing = ["tasks", "max_hours", "labor_capacity"]
            .into_iter()
            .find(|f| present(obj, f).is_none())
            .unwrap_or("tasks");
        return Err(ValidationError::new(
            ValidationErrorKind::MissingField,
            "Tasks, max_hours, and labor_capacity are required",
        )
        .for_field(missing));
    };

    let records = task_records(raw_tasks)?;

    for (index, record) in records.iter().enumerate() {
        check_task_fields(index, record)?;
    }

    let mut names = HashSet::new();
    let mut tasks = Vec::with_capacity(records.len());
    for (index, record) in records.iter().enumerate() {
        let task = normalize_task(index, record)?;
        if !names.insert(task.name.clone()) {
            return Err(duplicate_name(&task.name));
        }
        tasks.push(task);
    }

    let max_hours = budget("max_hours", raw_max_hours.as_f64())?;
    let labor_capacity = budget("labor_capacity", raw_labor.as_f64())?;
    let dependencies = match obj.get("task_dependencies") {
        None | Some(Value::Null) => Vec::new(),
        Some(raw) => dependency_pairs(raw)?,
    };

    Ok(Problem::new(tasks, max_hours, labor_capacity).with_dependencies(dependencies))
}

/// Validates a typed problem with the same value rules as [`validate_request`].
pub fn validate_problem(problem: &Problem) -> Result<(), ValidationError> {
    if problem.tasks.is_empty() {
        return Err(ValidationError::new(
            ValidationErrorKind::MissingField,
            "Tasks, max_hours, and labor_capacity are required",
        )
        .for_field("tasks"));
    }

    for task in &problem.tasks {
        check_value(&task.name, "priority", task.priority, Bound::NonNegative)?;
        check_value(&task.name, "time", task.time, Bound::Positive)?;
        check_value(&task.name, "labor", task.labor, Bound::Positive)?;
    }

    let mut names = HashSet::new();
    for task in &problem.tasks {
        if task.name.is_empty() {
            return Err(empty_name());
        }
        if !names.insert(task.name.as_str()) {
            return Err(duplicate_name(&task.name));
        }
        if let Some(deadline) = task.deadline {
            check_value(&task.name, "deadline", deadline, Bound::Positive)?;
        }
    }

    budget("max_hours", Some(problem.max_hours))?;
    budget("labor_capacity", Some(problem.labor_capacity))?;
    Ok(())
}

/// Returns the field unless it is absent, null, or an empty list.
fn present<'a>(obj: &'a Map<String, Value>, field: &str) -> Option<&'a Value> {
    match obj.get(field) {
        None | Some(Value::Null) => None,
        Some(Value::Array(items)) if items.is_empty() => None,
        Some(value) => Some(value),
    }
}

fn task_records(raw: &Value) -> Result<Vec<&Map<String, Value>>, ValidationError> {
    raw.as_array()
        .and_then(|items| items.iter().map(Value::as_object).collect::<Option<Vec<_>>>())
        .ok_or_else(|| {
            ValidationError::new(
                ValidationErrorKind::InvalidType,
                "Tasks must be a list of task records",
            )
            .for_field("tasks")
        })
}

/// Label used in messages: the name when it is a string, else the position.
fn task_label(index: usize, record: &Map<String, Value>) -> String {
    match record.get("name") {
        Some(Value::String(name)) => name.clone(),
        _ => format!("#{index}"),
    }
}

fn check_task_fields(index: usize, record: &Map<String, Value>) -> Result<(), ValidationError> {
    let label = task_label(index, record);

    if let Some(missing) = REQUIRED_TASK_FIELDS
        .into_iter()
        .find(|f| !record.contains_key(*f))
    {
        return Err(ValidationError::new(
            ValidationErrorKind::MissingField,
            format!(
                "Task {label} is missing required fields: {}",
                REQUIRED_TASK_FIELDS.join(", ")
            ),
        )
        .for_task(label)
        .for_field(missing));
    }

    raw_value(&label, record, "priority", Bound::NonNegative)?;
    raw_value(&label, record, "time", Bound::Positive)?;
    raw_value(&label, record, "labor", Bound::Positive)?;
    Ok(())
}

fn normalize_task(index: usize, record: &Map<String, Value>) -> Result<Task, ValidationError> {
    let name = match record.get("name") {
        Some(Value::String(name)) if !name.is_empty() => name.clone(),
        _ => {
            return Err(empty_name().for_task(task_label(index, record)));
        }
    };

    let priority = raw_value(&name, record, "priority", Bound::NonNegative)?;
    let time = raw_value(&name, record, "time", Bound::Positive)?;
    let labor = raw_value(&name, record, "labor", Bound::Positive)?;
    let mut task = Task::new(name, priority, time, labor);

    match record.get("deadline") {
        None | Some(Value::Null) => {}
        Some(_) => {
            let deadline = raw_value(&task.name, record, "deadline", Bound::Positive)?;
            task = task.with_deadline(deadline);
        }
    }

    match record.get("partial_allowed") {
        None | Some(Value::Null) => {}
        Some(Value::Bool(allowed)) => task = task.with_partial(*allowed),
        Some(_) => {
            return Err(ValidationError::new(
                ValidationErrorKind::InvalidType,
                format!("Invalid partial_allowed for task {}", task.name),
            )
            .for_task(task.name)
            .for_field("partial_allowed"));
        }
    }

    Ok(task)
}

fn raw_value(
    label: &str,
    record: &Map<String, Value>,
    field: &str,
    bound: Bound,
) -> Result<f64, ValidationError> {
    let value = record
        .get(field)
        .and_then(Value::as_f64)
        .ok_or_else(|| invalid_value(label, field))?;
    check_value(label, field, value, bound)
}

fn check_value(label: &str, field: &str, value: f64, bound: Bound) -> Result<f64, ValidationError> {
    if bound.admits(value) {
        Ok(value)
    } else {
        Err(invalid_value(label, field))
    }
}

fn invalid_value(label: &str, field: &str) -> ValidationError {
    ValidationError::new(
        ValidationErrorKind::InvalidValue,
        format!("Invalid {field} for task {label}"),
    )
    .for_task(label)
    .for_field(field)
}

fn empty_name() -> ValidationError {
    ValidationError::new(
        ValidationErrorKind::InvalidValue,
        "Task name must be a non-empty string",
    )
    .for_field("name")
}

fn duplicate_name(name: &str) -> ValidationError {
    ValidationError::new(
        ValidationErrorKind::DuplicateName,
        format!("Duplicate task name: {name}"),
    )
    .for_task(name)
    .for_field("name")
}

fn budget(field: &str, value: Option<f64>) -> Result<f64, ValidationError> {
    match value {
        Some(v) if Bound::Positive.admits(v) => Ok(v),
        _ => Err(ValidationError::new(
            ValidationErrorKind::InvalidValue,
            format!("Invalid {field}: must be a positive number"),
        )
        .for_field(field)),
    }
}

fn dependency_pairs(raw: &Value) -> Result<Vec<Dependency>, ValidationError> {
    let items = raw.as_array().ok_or_else(|| {
        ValidationError::new(
            ValidationErrorKind::MalformedDependency,
            "task_dependencies must be a list of [dependent, prerequisite] pairs",
        )
        .for_field("task_dependencies")
    })?;

    items
        .iter()
        .enumerate()
        .map(|(index, item)| match item.as_array().map(Vec::as_slice) {
            Some([Value::String(dependent), Value::String(prerequisite)]) => {
                Ok(Dependency::new(dependent.as_str(), prerequisite.as_str()))
            }
            _ => Err(ValidationError::new(
                ValidationErrorKind::MalformedDependency,
                format!("Invalid dependency at index {index}: expected [dependent, prerequisite]"),
            )
            .for_field("task_dependencies")),
        })
        .collect()
}
