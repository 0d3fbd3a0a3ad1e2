use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use veriscan::detector::DetectError;
use veriscan::ingest::IngestError;
use veriscan::objectstore::ObjectStoreError;
use veriscan::pdf::PdfError;
use veriscan::vectordb::IndexError;

/// Gateway error taxonomy, mapped onto HTTP statuses.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("unavailable: {0}")]
    Unavailable(String),

    #[error("deadline exceeded: {0}")]
    DeadlineExceeded(String),

    #[error("internal error: {0}")]
    Internal(String),
}

#[derive(serde::Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::DeadlineExceeded(_) => StatusCode::GATEWAY_TIMEOUT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(ErrorResponse {
            error: self.to_string(),
            code: status.as_u16(),
        });

        (status, body).into_response()
    }
}

impl From<DetectError> for ApiError {
    fn from(e: DetectError) -> Self {
        match e {
            DetectError::InvalidArgument(m) => ApiError::InvalidArgument(m),
            DetectError::Unavailable { .. } => ApiError::Unavailable(e.to_string()),
            DetectError::DeadlineExceeded { .. } => ApiError::DeadlineExceeded(e.to_string()),
            DetectError::Internal(m) => ApiError::Internal(m),
        }
    }
}

impl From<IngestError> for ApiError {
    fn from(e: IngestError) -> Self {
        match e {
            IngestError::InvalidArgument(m) => ApiError::InvalidArgument(m),
            IngestError::Unavailable { .. } => ApiError::Unavailable(e.to_string()),
            IngestError::DeadlineExceeded { .. } => ApiError::DeadlineExceeded(e.to_string()),
            IngestError::Internal(m) => ApiError::Internal(m),
        }
    }
}

impl From<IndexError> for ApiError {
    fn from(e: IndexError) -> Self {
        match e {
            IndexError::MalformedPayload { .. } | IndexError::InvalidDimension { .. } => {
                ApiError::Internal(e.to_string())
            }
            _ => ApiError::Unavailable(e.to_string()),
        }
    }
}

impl From<ObjectStoreError> for ApiError {
    fn from(e: ObjectStoreError) -> Self {
        match e {
            ObjectStoreError::NotFound { .. } => ApiError::NotFound(e.to_string()),
            ObjectStoreError::MissingCredentials | ObjectStoreError::InvalidEndpoint { .. } => {
                ApiError::Unavailable(e.to_string())
            }
            ObjectStoreError::Unavailable { .. } | ObjectStoreError::Rejected { .. } => {
                ApiError::Unavailable(e.to_string())
            }
        }
    }
}

impl From<PdfError> for ApiError {
    fn from(e: PdfError) -> Self {
        match e {
            PdfError::Extract { .. } | PdfError::Empty => ApiError::InvalidArgument(e.to_string()),
        }
    }
}
