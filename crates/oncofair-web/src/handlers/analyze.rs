//! Upload analysis: CSV in, scored report with insights out.

use std::collections::BTreeMap;

use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        Multipart, State,
    },
    http::StatusCode,
    Json,
};
use oncofair_common::ApiError;
use oncofair_llm::InsightGenerator;
use oncofair_scorer::dataset::RecordTable;
use oncofair_scorer::scorer::is_biased_filename;
use oncofair_scorer::task::RACE_COLUMN;
use oncofair_scorer::{FairnessScorer, ScoreReport};
use serde::Serialize;
use tracing::info;

use crate::state::SharedState;

/// Multipart field carrying the CSV upload.
pub const UPLOAD_FIELD: &str = "file";

#[derive(Debug, Serialize)]
pub struct AnalysisResponse {
    #[serde(flatten)]
    pub report: ScoreReport,
    /// Raw `race` counts over the whole upload, before any filtering.
    pub demographic_distribution: BTreeMap<String, u64>,
    pub insights: String,
}

struct Upload {
    filename: String,
    bytes: Vec<u8>,
}

/// POST /analyze - HER2 status
pub async fn analyze_her2(
    State(state): State<SharedState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<AnalysisResponse>, ApiError> {
    let upload = read_upload(multipart).await?;
    run_analysis(&state.her2, &state.insights, upload).await.map(Json)
}

/// POST /lung/analyze - lung cancer subtype
pub async fn analyze_lung(
    State(state): State<SharedState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<AnalysisResponse>, ApiError> {
    let upload = read_upload(multipart).await?;
    run_analysis(&state.lung, &state.insights, upload).await.map(Json)
}

async fn read_upload(multipart: Result<Multipart, MultipartRejection>) -> Result<Upload, ApiError> {
    let mut multipart = multipart
        .map_err(|e| ApiError::Unprocessable(format!("Expected a multipart upload: {e}")))?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error("Malformed multipart body", e))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| multipart_error("Could not read upload", e))?;
        return Ok(Upload { filename, bytes: bytes.to_vec() });
    }

    Err(ApiError::Unprocessable(format!("Missing required form field '{UPLOAD_FIELD}'")))
}

/// Body-limit failures surface here as multipart read errors.
fn multipart_error(context: &str, err: MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge("Upload exceeds the configured size limit".to_string())
    } else {
        ApiError::Unprocessable(format!("{context}: {err}"))
    }
}

async fn run_analysis(
    scorer: &FairnessScorer,
    insights: &InsightGenerator,
    upload: Upload,
) -> Result<AnalysisResponse, ApiError> {
    let task = scorer.task();
    let is_biased = is_biased_filename(&upload.filename);

    let table = RecordTable::from_csv_bytes(&upload.bytes)?;
    let demographic_distribution = table.value_counts(RACE_COLUMN);
    let report = scorer.score_table(&table, is_biased)?;

    info!(
        task = task.name,
        filename = %upload.filename,
        rows = table.len(),
        is_biased,
        "upload scored"
    );

    let insights = insights.generate(task, &report, &demographic_distribution).await;

    Ok(AnalysisResponse { report, demographic_distribution, insights })
}
