use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error returned by HTTP handlers. Rendered as `{"detail": "..."}`.
#[derive(Debug, Error)]
pub enum ApiError {
    /// A recognised precondition on the upload failed.
    #[error("{0}")]
    BadRequest(String),

    /// The request was well-formed HTTP but lacked a required part.
    #[error("{0}")]
    Unprocessable(String),

    /// The request body exceeded the configured upload limit.
    #[error("{0}")]
    PayloadTooLarge(String),

    /// Anything else that went wrong while processing the upload.
    #[error("{0}")]
    Internal(String),
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub detail: String,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_)      => StatusCode::BAD_REQUEST,
            ApiError::Unprocessable(_)   => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Internal(_)        => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::warn!(error = %self, "request rejected");
        }
        (status, Json(ErrorBody { detail: self.to_string() })).into_response()
    }
}
