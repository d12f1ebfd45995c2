//! Task selection domain models.
//!
//! Provides the data types for describing a selection problem and its
//! solution.
//!
//! | Type | Meaning |
//! |------|---------|
//! | `Task` | Candidate unit of work with priority, time, labor |
//! | `Dependency` | `(dependent, prerequisite)` ordering over task names |
//! | `Problem` | Tasks + budgets + dependencies |
//! | `Solution` | Activation per task + status + objective |

mod problem;
mod solution;
mod task;

pub use problem::{Dependency, Problem};
pub use solution::{SolveStatus, Solution};
pub use task::Task;
