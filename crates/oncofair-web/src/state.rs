//! Shared application state for the web server.

use std::sync::Arc;

use anyhow::Context;
use oncofair_config::{Config, DEFAULT_MAX_UPLOAD_BYTES};
use oncofair_llm::{build_backend, InsightGenerator};
use oncofair_scorer::{FairnessScorer, LinearModel, TaskDescriptor};
use tracing::info;

/// Shared state injected into every Axum handler. Read-only after startup.
pub struct AppState {
    pub her2: FairnessScorer,
    pub lung: FairnessScorer,
    pub insights: InsightGenerator,
    /// Request body limit applied by the router.
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn new(her2: FairnessScorer, lung: FairnessScorer, insights: InsightGenerator) -> Self {
        Self { her2, lung, insights, max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES }
    }

    pub fn with_upload_limit(mut self, max_upload_bytes: usize) -> Self {
        self.max_upload_bytes = max_upload_bytes;
        self
    }

    /// Load both model artifacts and the insight backend described by `config`.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let her2_model = LinearModel::load(&config.models.her2_path)
            .with_context(|| format!("loading HER2 model from {}", config.models.her2_path.display()))?;
        let lung_model = LinearModel::load(&config.models.lung_path)
            .with_context(|| format!("loading lung model from {}", config.models.lung_path.display()))?;

        let insights = InsightGenerator::new(build_backend(&config.insights))
            .with_sampling(config.insights.max_tokens, config.insights.temperature);

        info!(
            her2 = %config.models.her2_path.display(),
            lung = %config.models.lung_path.display(),
            "models loaded"
        );

        Ok(Self::new(
            FairnessScorer::new(TaskDescriptor::her2(), Arc::new(her2_model)),
            FairnessScorer::new(TaskDescriptor::lung_subtype(), Arc::new(lung_model)),
            insights,
        )
        .with_upload_limit(config.server.max_upload_bytes))
    }
}

pub type SharedState = Arc<AppState>;
