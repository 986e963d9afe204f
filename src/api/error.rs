use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::pipeline::extraction::ExtractionError;
use crate::pipeline::ingest::IngestError;
use crate::pipeline::orchestrator::{PipelineError, StepRecord};

/// API-level errors with HTTP status mapping.
///
/// Every response body carries at least `{"error": message}`; fatal
/// pipeline failures additionally carry the accumulated step records so
/// the caller can see which stage failed.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("{message}")]
    Upstream {
        message: String,
        steps: Vec<StepRecord>,
    },

    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    steps: Vec<StepRecord>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, steps) = match self {
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message, Vec::new()),
            ApiError::Upstream { message, steps } => {
                (StatusCode::INTERNAL_SERVER_ERROR, message, steps)
            }
            ApiError::Internal(detail) => {
                tracing::error!(detail, "API internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal error occurred".to_string(),
                    Vec::new(),
                )
            }
        };

        (status, Json(ErrorBody { error, steps })).into_response()
    }
}

impl From<PipelineError> for ApiError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::Validation(msg) => ApiError::BadRequest(msg),
            PipelineError::Upstream { message, steps } => ApiError::Upstream { message, steps },
        }
    }
}

impl From<IngestError> for ApiError {
    fn from(err: IngestError) -> Self {
        match err {
            IngestError::Validation(msg) => ApiError::BadRequest(msg),
            upstream @ IngestError::Upstream { .. } => ApiError::Upstream {
                message: upstream.to_string(),
                steps: Vec::new(),
            },
        }
    }
}

impl From<ExtractionError> for ApiError {
    fn from(err: ExtractionError) -> Self {
        match err {
            ExtractionError::Validation(msg) => ApiError::BadRequest(msg),
            ExtractionError::Oracle(e) => ApiError::Upstream {
                message: e.to_string(),
                steps: Vec::new(),
            },
        }
    }
}

impl From<crate::db::DatabaseError> for ApiError {
    fn from(err: crate::db::DatabaseError) -> Self {
        ApiError::Internal(err.to_string())
    }
}
