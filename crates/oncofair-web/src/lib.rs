//! oncofair-web — HTTP front end for the fairness-aware scorers.
//!   - HER2 status analysis (binary)
//!   - Lung cancer subtype analysis (multiclass)
//!   - Static fairness snapshot and health check

pub mod router;
pub mod handlers;
pub mod state;
