//! Axum router — maps all URL paths to handlers.

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use tower_http::{
    cors::CorsLayer,
    trace::TraceLayer,
};
use std::sync::Arc;
use crate::state::{AppState, SharedState};
use crate::handlers::{
    analyze::{analyze_her2, analyze_lung},
    fairness::fairness_snapshot,
    system::health,
};

/// Build and return the full Axum router.
pub fn build_router(state: AppState) -> Router {
    let upload_limit = state.max_upload_bytes;
    let shared: SharedState = Arc::new(state);

    Router::new()
        .route("/analyze",      post(analyze_her2))
        .route("/lung/analyze", post(analyze_lung))
        .route("/fairness",     get(fairness_snapshot))
        .route("/health",       get(health))

        // Middleware
        .layer(DefaultBodyLimit::max(upload_limit))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(shared)
}
