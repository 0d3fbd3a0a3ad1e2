use thiserror::Error;

use crate::embedding::EmbeddingError;
use crate::vectordb::IndexError;

#[derive(Debug, Error)]
/// Errors surfaced by document ingestion.
pub enum IngestError {
    /// The upload itself was malformed (empty content, oversize input).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A dependency stayed unreachable after its own retries.
    #[error("{component} unavailable: {message}")]
    Unavailable {
        /// Which dependency failed.
        component: &'static str,
        /// Underlying error message.
        message: String,
    },

    /// An inner call ran past its deadline.
    #[error("deadline exceeded during {stage}")]
    DeadlineExceeded {
        /// Pipeline stage that timed out.
        stage: &'static str,
    },

    /// Invariant violation.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<EmbeddingError> for IngestError {
    fn from(e: EmbeddingError) -> Self {
        match e {
            EmbeddingError::Unavailable { .. } | EmbeddingError::Rejected { .. } => {
                IngestError::Unavailable {
                    component: "embedder",
                    message: e.to_string(),
                }
            }
            EmbeddingError::MalformedResponse { .. }
            | EmbeddingError::DimensionMismatch { .. }
            | EmbeddingError::CountMismatch { .. } => IngestError::Internal(e.to_string()),
        }
    }
}

impl From<IndexError> for IngestError {
    fn from(e: IndexError) -> Self {
        match e {
            IndexError::MalformedPayload { .. } | IndexError::InvalidDimension { .. } => {
                IngestError::Internal(e.to_string())
            }
            _ => IngestError::Unavailable {
                component: "vector store",
                message: e.to_string(),
            },
        }
    }
}
