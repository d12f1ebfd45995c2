//! Error taxonomy for a selection request.
//!
//! Every failure is terminal for the request and falls into one of three
//! classes: bad input, no feasible selection, or a solver/internal failure.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::validation::ValidationError;

/// A failed selection request.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScheduleError {
    /// Input was rejected before any solve.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The input is well formed but the constraints admit no solution.
    #[error("Optimization problem is infeasible. Check constraints or input data.")]
    Infeasible,

    /// The solver reported an unbounded objective.
    #[error("Optimization problem is unbounded")]
    Unbounded,

    /// The solver stopped without a solution (time limit, non-convergence).
    #[error("Solver did not reach a solution; adjust the inputs and resubmit")]
    NotSolved { reason: String },

    /// Unexpected failure inside model construction or the solver.
    ///
    /// `detail` is for logs only and is not part of the display message.
    #[error("Internal solver failure")]
    Internal { detail: String },
}

/// Coarse failure class, stable across error variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorClass {
    /// Missing or malformed fields, unknown dependency names.
    InvalidInput,
    /// No assignment satisfies every constraint.
    Infeasible,
    /// The solver failed or did not finish.
    SolverFailure,
}

impl ScheduleError {
    pub(crate) fn not_solved(reason: impl Into<String>) -> Self {
        Self::NotSolved {
            reason: reason.into(),
        }
    }

    pub(crate) fn internal(detail: impl Into<String>) -> Self {
        Self::Internal {
            detail: detail.into(),
        }
    }

    /// Failure class.
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::Validation(_) => ErrorClass::InvalidInput,
            Self::Infeasible => ErrorClass::Infeasible,
            Self::Unbounded | Self::NotSolved { .. } | Self::Internal { .. } => {
                ErrorClass::SolverFailure
            }
        }
    }

    /// Whether resubmitting (possibly with adjusted inputs) may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::NotSolved { .. })
    }

    /// Structured body for the transport layer.
    pub fn to_body(&self) -> ErrorBody {
        let (task, field) = match self {
            Self::Validation(v) => (v.task.clone(), v.field.clone()),
            _ => (None, None),
        };
        ErrorBody {
            error: self.to_string(),
            kind: self.class(),
            retryable: self.is_retryable(),
            task,
            field,
        }
    }
}

/// Serializable error object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Human-readable message.
    pub error: String,
    /// Failure class.
    pub kind: ErrorClass,
    /// Whether the caller may resubmit.
    pub retryable: bool,
    /// Offending task name, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task: Option<String>,
    /// Offending field name, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}
