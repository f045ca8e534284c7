//! oncofair-common — Shared types and errors used across the OncoFair crates.

pub mod error;

pub use error::ApiError;
