//! oncofair-llm — Insight generation over a text-generation backend.
//! Implements the LlmBackend trait, the insights prompt and its fallback.

pub mod backend;
pub mod insights;
pub mod audit;

pub use backend::{build_backend, LlmBackend, LlmError, LlmRequest, LlmResponse, Message};
pub use insights::{InsightGenerator, INSIGHTS_FALLBACK};
