use thiserror::Error;

#[derive(Debug, Error)]
/// Errors returned by embedding operations.
pub enum EmbeddingError {
    /// The backend stayed unreachable (or kept failing transiently) after
    /// all retry attempts.
    #[error("embedding backend unreachable after {attempts} attempts: {message}")]
    Unavailable {
        /// Attempts made before giving up.
        attempts: usize,
        /// Last transport error observed.
        message: String,
    },

    /// The backend rejected the request with a non-retryable status.
    #[error("embedding request rejected with status {status}: {message}")]
    Rejected {
        /// HTTP status code.
        status: u16,
        /// Response body (truncated).
        message: String,
    },

    /// The response body did not have the expected shape.
    #[error("malformed embedding response: {message}")]
    MalformedResponse {
        /// What was missing or wrong.
        message: String,
    },

    /// A returned vector did not match the configured dimension.
    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Configured dimension.
        expected: usize,
        /// Dimension actually returned.
        actual: usize,
    },

    /// The backend returned fewer vectors than texts submitted.
    #[error("embedding count mismatch: sent {sent} texts, received {received} vectors")]
    CountMismatch {
        /// Texts submitted.
        sent: usize,
        /// Vectors received.
        received: usize,
    },
}
