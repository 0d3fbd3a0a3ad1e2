use thiserror::Error;

use crate::embedding::EmbeddingError;
use crate::vectordb::IndexError;

#[derive(Debug, Error)]
/// Errors surfaced by a plagiarism check.
pub enum DetectError {
    /// The request itself was malformed (empty-after-limit input, bad
    /// option values).
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

    /// An inner call or the whole request ran past its deadline.
    #[error("deadline exceeded during {stage}")]
    DeadlineExceeded {
        /// Pipeline stage that timed out.
        stage: &'static str,
    },

    /// Invariant violation (wrong vector dimension, malformed payloads).
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<EmbeddingError> for DetectError {
    fn from(e: EmbeddingError) -> Self {
        match e {
            EmbeddingError::Unavailable { .. } | EmbeddingError::Rejected { .. } => {
                DetectError::Unavailable {
                    component: "embedder",
                    message: e.to_string(),
                }
            }
            EmbeddingError::MalformedResponse { .. }
            | EmbeddingError::DimensionMismatch { .. }
            | EmbeddingError::CountMismatch { .. } => DetectError::Internal(e.to_string()),
        }
    }
}

impl From<IndexError> for DetectError {
    fn from(e: IndexError) -> Self {
        match e {
            IndexError::MalformedPayload { .. } | IndexError::InvalidDimension { .. } => {
                DetectError::Internal(e.to_string())
            }
            _ => DetectError::Unavailable {
                component: "vector store",
                message: e.to_string(),
            },
        }
    }
}
