//! GET /fairness - fixed fairness snapshot used as a smoke-test response.

use axum::Json;
use oncofair_scorer::{FairnessMetrics, GroupMetrics};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct FairnessSnapshot {
    pub overall_accuracy: f64,
    pub fairness_metrics: FairnessMetrics,
    pub disparity_index: f64,
}

impl FairnessSnapshot {
    /// Reference numbers from a HER2 run over four ancestry groups. Nothing is computed.
    pub fn reference() -> Self {
        let groups = [("0", 0.52, 41), ("1", 0.51, 53), ("2", 0.55, 55), ("3", 0.45, 51)];
        Self {
            overall_accuracy: 0.51,
            fairness_metrics: groups
                .into_iter()
                .map(|(group, accuracy, count)| (group.to_string(), GroupMetrics { accuracy, count }))
                .collect(),
            disparity_index: 0.09,
        }
    }
}

pub async fn fairness_snapshot() -> Json<FairnessSnapshot> {
    Json(FairnessSnapshot::reference())
}
