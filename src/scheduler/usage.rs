//! Resource usage of a solution.
//!
//! | Metric | Definition |
//! |--------|-----------|
//! | Time used | sum(time_t * x_t) |
//! | Labor used | sum(labor_t * x_t) |
//! | Time utilization | time used / max_hours |
//! | Labor utilization | labor used / labor_capacity |

use crate::models::{Problem, Solution};

/// Budget consumption of a solved selection.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceUsage {
    /// Total time consumed.
    pub time_used: f64,
    /// Total labor consumed.
    pub labor_used: f64,
    /// Fraction of `max_hours` consumed (0.0..1.0).
    pub time_utilization: f64,
    /// Fraction of `labor_capacity` consumed (0.0..1.0).
    pub labor_utilization: f64,
    /// Tasks with activation > 0, in input order.
    pub selected: Vec<String>,
    /// Tasks with activation 1, in input order.
    pub fully_selected: Vec<String>,
}

impl ResourceUsage {
    /// Computes usage from a problem and its solution.
    ///
    /// Tasks missing from the solution count as inactive.
    pub fn calculate(problem: &Problem, solution: &Solution) -> Self {
        let mut time_used = 0.0;
        let mut labor_used = 0.0;
        let mut selected = Vec::new();
        let mut fully_selected = Vec::new();

        for task in &problem.tasks {
            let x = solution.activation(&task.name).unwrap_or(0.0);
            time_used += task.time * x;
            labor_used += task.labor * x;
            if x > 0.0 {
                selected.push(task.name.clone());
            }
            if x >= 1.0 {
                fully_selected.push(task.name.clone());
            }
        }

        Self {
            time_used,
            labor_used,
            time_utilization: time_used / problem.max_hours,
            labor_utilization: labor_used / problem.labor_capacity,
            selected,
            fully_selected,
        }
    }
}
