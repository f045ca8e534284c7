use oncofair_common::ApiError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScoreError {
    /// The upload lacks the task's label column. The only client-side failure.
    #[error("No '{0}' column found.")]
    MissingTargetColumn(String),

    #[error("Missing required column '{0}'")]
    MissingColumn(String),

    #[error("Column '{column}', row {row}: could not convert '{value}' to a number")]
    InvalidValue { column: String, row: usize, value: String },

    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),

    #[error("Operation not supported: {0}")]
    Unsupported(String),

    #[error("Invalid model: {0}")]
    Model(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<ScoreError> for ApiError {
    fn from(err: ScoreError) -> Self {
        match err {
            ScoreError::MissingTargetColumn(_) => ApiError::BadRequest(err.to_string()),
            other => ApiError::Internal(other.to_string()),
        }
    }
}
