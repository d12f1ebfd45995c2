//! Selection pipeline, result projection and usage metrics.
//!
//! `TaskSelector` wires validation, model building, the solver adapter and
//! the result projector into one request-scoped call.
//!
//! # Usage metrics
//!
//! `ResourceUsage` reports how much of each budget a solution consumes.

mod projector;
mod selector;
mod usage;

pub use projector::project;
pub use selector::TaskSelector;
pub use usage::ResourceUsage;
