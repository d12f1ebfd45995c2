//! Priority-maximising task selection for the U-Engine ecosystem.
//!
//! Chooses which candidate tasks to perform, fully or fractionally, so that
//! total priority is maximal while the shared time and labor budgets,
//! dependency ordering and per-task deadlines all hold. The problem is
//! solved exactly as a mixed-integer linear program.
//!
//! # Modules
//!
//! - **`models`**: Domain types: `Task`, `Dependency`, `Problem`, `Solution`
//! - **`validation`**: Payload/problem checks producing a typed `Problem`
//! - **`lp`**: Decision variables, constraint rows, solver adapter
//! - **`scheduler`**: `TaskSelector` pipeline, result projection, usage metrics
//! - **`config`** / **`logging`**: TOML configuration and tracing setup
//! - **`error`**: `ScheduleError` and its three failure classes
//!
//! # Example
//!
//! ```
//! use serde_json::json;
//! use u_select::scheduler::TaskSelector;
//!
//! let payload = json!({
//!     "tasks": [
//!         {"name": "A", "priority": 5, "time": 2, "labor": 1},
//!         {"name": "B", "priority": 3, "time": 3, "labor": 2, "partial_allowed": true},
//!     ],
//!     "max_hours": 4,
//!     "labor_capacity": 3,
//!     "task_dependencies": [["B", "A"]],
//! });
//!
//! let solution = TaskSelector::new().solve_request(&payload).unwrap();
//! assert_eq!(solution.activation("A"), Some(1.0));
//! // B fills the remaining 2 hours: 2/3 of its 3-hour duration.
//! assert!((solution.activation("B").unwrap() - 2.0 / 3.0).abs() < 1e-6);
//! ```
//!
//! # References
//!
//! - Wolsey (2020), "Integer Programming"
//! - Kellerer, Pferschy & Pisinger (2004), "Knapsack Problems", Ch. 9 (multidimensional knapsack)

pub mod config;
pub mod error;
pub mod logging;
pub mod lp;
pub mod models;
pub mod scheduler;
pub mod validation;

pub use error::{ErrorBody, ErrorClass, ScheduleError};
