//! Projection of solver values onto the public [`Solution`].
//!
//! Backends return floating-point values with round-off (a binary variable
//! may come back as `0.9999999`). Projection snaps binaries to exactly 0 or
//! 1, cleans near-integral continuous values, clamps to [0, 1] and
//! recomputes the objective from the cleaned values.

use std::collections::BTreeMap;

use crate::error::ScheduleError;
use crate::lp::{LinearModel, VarKind};
use crate::models::{SolveStatus, Solution};

/// Builds the solution for an optimal run.
///
/// # Errors
/// `Internal` when the backend returned the wrong number of values or a
/// non-finite value: an optimal status must come with a defined number for
/// every task.
pub fn project(
    model: &LinearModel,
    values: &[f64],
    tolerance: f64,
) -> Result<Solution, ScheduleError> {
    if values.len() != model.variable_count() {
        return Err(ScheduleError::internal(format!(
            "solver returned {} values for {} variables",
            values.len(),
            model.variable_count()
        )));
    }

    let mut projected = Vec::with_capacity(values.len());
    for (var, &raw) in model.variables().iter().zip(values) {
        if !raw.is_finite() {
            return Err(ScheduleError::internal(format!(
                "solver returned {raw} for task '{}'",
                var.task_name
            )));
        }
        let value = match var.kind {
            VarKind::Binary => raw.round(),
            VarKind::Continuous => snap(raw, tolerance),
        };
        // `+ 0.0` turns a rounded -0.0 into 0.0
        projected.push(value.clamp(var.lower, var.upper) + 0.0);
    }

    let results: BTreeMap<String, f64> = model
        .variables()
        .iter()
        .zip(&projected)
        .map(|(var, &value)| (var.task_name.clone(), value))
        .collect();

    Ok(Solution {
        status: SolveStatus::Optimal,
        results,
        objective_value: model.objective_value(&projected),
    })
}

fn snap(value: f64, tolerance: f64) -> f64 {
    let nearest = value.round();
    if (value - nearest).abs() <= tolerance {
        nearest
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lp::{ConstraintKind, Term};

    fn model() -> LinearModel {
        let mut m = LinearModel::new("p");
        let a = m.add_variable("A", VarKind::Binary);
        let b = m.add_variable("B", VarKind::Continuous);
        m.add_objective_term(a, 5.0);
        m.add_objective_term(b, 2.0);
        m.add_constraint(
            ConstraintKind::TimeBudget,
            vec![Term::new(a, 1.0), Term::new(b, 1.0)],
            2.0,
        );
        m
    }

    #[test]
    fn test_binary_snapped() {
        let s = project(&model(), &[0.9999997, 0.25], 1e-6).unwrap();
        assert_eq!(s.activation("A"), Some(1.0));
        assert_eq!(s.activation("B"), Some(0.25));
        assert_eq!(s.status, SolveStatus::Optimal);
        assert!((s.objective_value - 5.5).abs() < 1e-12);
    }

    #[test]
    fn test_continuous_noise_cleaned() {
        let s = project(&model(), &[3e-8, 1.0000004], 1e-6).unwrap();
        assert_eq!(s.activation("A"), Some(0.0));
        assert_eq!(s.activation("B"), Some(1.0));

        let s = project(&model(), &[0.0, -2e-9], 1e-6).unwrap();
        assert_eq!(s.activation("B"), Some(0.0));
    }

    #[test]
    fn test_values_clamped() {
        let s = project(&model(), &[0.0, 1.2], 1e-6).unwrap();
        assert_eq!(s.activation("B"), Some(1.0));
    }

    #[test]
    fn test_every_task_present() {
        let s = project(&model(), &[0.0, 0.0], 1e-6).unwrap();
        assert_eq!(s.task_count(), 2);
        assert_eq!(s.objective_value, 0.0);
    }

    #[test]
    fn test_wrong_arity_is_internal() {
        let err = project(&model(), &[1.0], 1e-6).unwrap_err();
        assert!(matches!(err, ScheduleError::Internal { .. }));
    }

    #[test]
    fn test_non_finite_is_internal() {
        let err = project(&model(), &[f64::NAN, 0.0], 1e-6).unwrap_err();
        match err {
            ScheduleError::Internal { detail } => assert!(detail.contains("'A'")),
            other => panic!("unexpected {other:?}"),
        }
    }
}
