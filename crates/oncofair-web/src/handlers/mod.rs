//! HTTP handlers for all routes.

pub mod analyze;
pub mod fairness;
pub mod system;
