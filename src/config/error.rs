//! Configuration error types.

use thiserror::Error;

/// Errors that can occur during configuration loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Port value is outside valid range (1-65535).
    #[error("invalid port '{value}': must be between 1 and 65535")]
    InvalidPort { value: String },

    /// Port string could not be parsed as a number.
    #[error("failed to parse port '{value}': {source}")]
    PortParseError {
        value: String,
        #[source]
        source: std::num::ParseIntError,
    },

    /// Bind address string could not be parsed.
    #[error("failed to parse bind address '{value}': {source}")]
    InvalidBindAddr {
        value: String,
        #[source]
        source: std::net::AddrParseError,
    },

    /// A numeric variable could not be parsed.
    #[error("failed to parse {name}='{value}' as a number")]
    InvalidNumber { name: &'static str, value: String },

    /// Unknown chunking preset name.
    #[error("unknown chunking preset '{value}': expected 'fine' or 'coarse'")]
    UnknownPreset { value: String },

    /// Chunk overlap must be strictly smaller than the chunk size.
    #[error("chunk_overlap ({overlap}) must be less than chunk_size ({size})")]
    OverlapTooLarge { overlap: usize, size: usize },

    /// Minimum chunk size cannot exceed the chunk size.
    #[error("min_chunk_size ({min}) must not exceed chunk_size ({size})")]
    MinChunkTooLarge { min: usize, size: usize },

    /// A similarity threshold fell outside [0, 1].
    #[error("threshold {name}={value} must lie in [0, 1]")]
    ThresholdOutOfRange { name: &'static str, value: f64 },

    /// Severity thresholds must be ordered low <= medium <= high <= critical.
    #[error("severity thresholds must be non-decreasing: low <= medium <= high <= critical")]
    ThresholdsUnordered,
}
