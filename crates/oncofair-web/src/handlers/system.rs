//! Service health and loaded-model summary.

use std::collections::BTreeMap;

use axum::{extract::State, Json};
use serde::Serialize;

use crate::state::SharedState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    /// Task name → loaded model name.
    pub models: BTreeMap<&'static str, String>,
    /// `None` when insights always fall back.
    pub insights_backend: Option<InsightsBackend>,
}

#[derive(Debug, Serialize)]
pub struct InsightsBackend {
    pub backend: &'static str,
    pub model: String,
    pub is_local: bool,
}

/// GET /health
pub async fn health(State(state): State<SharedState>) -> Json<HealthResponse> {
    let models = [&state.her2, &state.lung]
        .into_iter()
        .map(|s| (s.task().name, s.classifier().name().to_string()))
        .collect();

    let insights_backend = state.insights.backend().map(|b| InsightsBackend {
        backend: b.backend_name(),
        model: b.model_id().to_string(),
        is_local: b.is_local(),
    });

    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        models,
        insights_backend,
    })
}
