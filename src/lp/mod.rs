//! Linear-programming formulation and solver adapter.
//!
//! Bridges the selection domain to a mixed-integer linear solver:
//! [`SelectionModelBuilder`] creates one decision variable per task and the
//! objective/constraint rows, [`LpSolver`] runs a backend over the finished
//! [`LinearModel`], and [`interpret`] maps the backend status onto the
//! crate's outcome.
//!
//! # Reference
//! - Wolsey (2020), "Integer Programming", Ch. 1 (knapsack and precedence formulations)
//! - Dantzig & Thapa (1997), "Linear Programming 1: Introduction"

mod builder;
mod model;
mod solver;

pub use builder::{BuiltModel, SelectionModelBuilder, DEFAULT_MODEL_NAME};
pub use model::{
    ConstraintKind, DecisionVariable, LinearConstraint, LinearModel, Term, VarId, VarKind,
};
pub use solver::{interpret, LpSolver, MicroLpSolver, SolverFault, SolverRun};
