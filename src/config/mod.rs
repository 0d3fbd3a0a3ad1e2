//! Environment-backed configuration.
//!
//! Every setting has a default; override via the environment variables named
//! in the constants below.

pub mod error;

#[cfg(test)]
mod tests;

pub use error::ConfigError;

use std::env;
use std::net::IpAddr;

use crate::severity::Severity;

/// Chunking parameter presets.
///
/// `Fine` is the default; `Coarse` trades recall granularity for fewer,
/// larger windows on long documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkingPreset {
    /// 100-word windows, 20-word overlap, 30-word minimum.
    Fine,
    /// 250-word windows, 50-word overlap, 50-word minimum.
    Coarse,
}

impl ChunkingPreset {
    /// Returns `(chunk_size, chunk_overlap, min_chunk_size)` for the preset.
    pub fn params(&self) -> (usize, usize, usize) {
        match self {
            ChunkingPreset::Fine => (100, 20, 30),
            ChunkingPreset::Coarse => (250, 50, 50),
        }
    }
}

impl std::str::FromStr for ChunkingPreset {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "fine" => Ok(ChunkingPreset::Fine),
            "coarse" => Ok(ChunkingPreset::Coarse),
            _ => Err(ConfigError::UnknownPreset {
                value: s.to_string(),
            }),
        }
    }
}

/// Service configuration loaded from environment variables.
///
/// Use [`Config::from_env`] to read overrides on top of defaults, then
/// [`Config::validate`] before wiring up clients.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port. Default: `8080`.
    pub port: u16,

    /// IP address to bind to. Default: `0.0.0.0`.
    pub bind_addr: IpAddr,

    /// Words per chunk window. Default: `100`.
    pub chunk_size: usize,

    /// Words of overlap between consecutive windows. Default: `20`.
    pub chunk_overlap: usize,

    /// Trailing windows shorter than this are merged into the previous
    /// chunk. Default: `30`.
    pub min_chunk_size: usize,

    /// Candidates returned per kNN query. Default: `10`.
    pub top_k_results: usize,

    /// Raw kNN scores below this are dropped. Default: `0.50`.
    pub min_score_threshold: f32,

    /// Per-source candidate cap. Default: `3`.
    pub max_results_per_source: usize,

    /// Concurrent kNN queries per check request. Default: number of CPUs.
    pub max_parallel_searches: usize,

    /// Severity band lower bound: CRITICAL. Default: `0.95`.
    pub similarity_critical: f32,
    /// Severity band lower bound: HIGH. Default: `0.85`.
    pub similarity_high: f32,
    /// Severity band lower bound: MEDIUM. Default: `0.70`.
    pub similarity_medium: f32,
    /// Severity band lower bound: LOW. Default: `0.50`.
    pub similarity_low: f32,

    /// Embedding vector dimension. Default: `768`.
    pub embedding_dims: usize,

    /// Texts per embedder batch call. Default: `32`.
    pub embedding_batch_size: usize,

    /// Attempts per embedder call before giving up. Default: `3`.
    pub embedding_max_retries: usize,

    /// Qdrant endpoint URL. Default: `http://localhost:6334`.
    pub qdrant_url: String,

    /// Base name for the document index. The chunk collection is derived
    /// by appending `_chunks`. Default: `plagiarism_documents`.
    pub qdrant_index: String,

    /// Ollama endpoint URL. Default: `http://localhost:11434`.
    pub ollama_host: String,

    /// Embedding model name. Default: `nomic-embed-text`.
    pub ollama_embed_model: String,

    /// Chat model used by the optional analysis hook. Default: `llama3.2`.
    pub ollama_chat_model: String,

    /// Per-call embedder timeout in seconds. Default: `60`.
    pub ollama_timeout_secs: u64,

    /// Per-call kNN timeout in seconds. Default: `10`.
    pub search_timeout_secs: u64,

    /// Whole-check deadline in seconds. Default: `300`.
    pub request_timeout_secs: u64,

    /// MinIO endpoint URL for the PDF paths. Default: `http://localhost:9000`.
    pub minio_endpoint: String,

    /// MinIO access key; unset disables the PDF routes.
    pub minio_access_key: Option<String>,

    /// MinIO secret key; unset disables the PDF routes.
    pub minio_secret_key: Option<String>,

    /// Region used for SigV4 signing. Default: `us-east-1`.
    pub minio_region: String,
}

impl Default for Config {
    fn default() -> Self {
        let (chunk_size, chunk_overlap, min_chunk_size) = ChunkingPreset::Fine.params();
        Self {
            port: 8080,
            bind_addr: IpAddr::V4(std::net::Ipv4Addr::new(0, 0, 0, 0)),
            chunk_size,
            chunk_overlap,
            min_chunk_size,
            top_k_results: 10,
            min_score_threshold: 0.50,
            max_results_per_source: 3,
            max_parallel_searches: num_cpus::get(),
            similarity_critical: 0.95,
            similarity_high: 0.85,
            similarity_medium: 0.70,
            similarity_low: 0.50,
            embedding_dims: 768,
            embedding_batch_size: 32,
            embedding_max_retries: 3,
            qdrant_url: "http://localhost:6334".to_string(),
            qdrant_index: "plagiarism_documents".to_string(),
            ollama_host: "http://localhost:11434".to_string(),
            ollama_embed_model: "nomic-embed-text".to_string(),
            ollama_chat_model: "llama3.2".to_string(),
            ollama_timeout_secs: 60,
            search_timeout_secs: 10,
            request_timeout_secs: 300,
            minio_endpoint: "http://localhost:9000".to_string(),
            minio_access_key: None,
            minio_secret_key: None,
            minio_region: "us-east-1".to_string(),
        }
    }
}

impl Config {
    const ENV_PORT: &'static str = "PORT";
    const ENV_BIND_ADDR: &'static str = "BIND_ADDR";
    const ENV_CHUNKING_PRESET: &'static str = "CHUNKING_PRESET";
    const ENV_CHUNK_SIZE: &'static str = "CHUNK_SIZE";
    const ENV_CHUNK_OVERLAP: &'static str = "CHUNK_OVERLAP";
    const ENV_MIN_CHUNK_SIZE: &'static str = "MIN_CHUNK_SIZE";
    const ENV_TOP_K_RESULTS: &'static str = "TOP_K_RESULTS";
    const ENV_MIN_SCORE_THRESHOLD: &'static str = "MIN_SCORE_THRESHOLD";
    const ENV_MAX_RESULTS_PER_SOURCE: &'static str = "MAX_RESULTS_PER_SOURCE";
    const ENV_MAX_PARALLEL_SEARCHES: &'static str = "MAX_PARALLEL_SEARCHES";
    const ENV_SIMILARITY_CRITICAL: &'static str = "SIMILARITY_CRITICAL";
    const ENV_SIMILARITY_HIGH: &'static str = "SIMILARITY_HIGH";
    const ENV_SIMILARITY_MEDIUM: &'static str = "SIMILARITY_MEDIUM";
    const ENV_SIMILARITY_LOW: &'static str = "SIMILARITY_LOW";
    const ENV_EMBEDDING_DIMS: &'static str = "EMBEDDING_DIMS";
    const ENV_EMBEDDING_BATCH_SIZE: &'static str = "EMBEDDING_BATCH_SIZE";
    const ENV_EMBEDDING_MAX_RETRIES: &'static str = "EMBEDDING_MAX_RETRIES";
    const ENV_QDRANT_URL: &'static str = "QDRANT_URL";
    const ENV_QDRANT_INDEX: &'static str = "QDRANT_INDEX";
    const ENV_OLLAMA_HOST: &'static str = "OLLAMA_HOST";
    const ENV_OLLAMA_EMBED_MODEL: &'static str = "OLLAMA_EMBED_MODEL";
    const ENV_OLLAMA_CHAT_MODEL: &'static str = "OLLAMA_CHAT_MODEL";
    const ENV_OLLAMA_TIMEOUT_SECS: &'static str = "OLLAMA_TIMEOUT_SECS";
    const ENV_SEARCH_TIMEOUT_SECS: &'static str = "SEARCH_TIMEOUT_SECS";
    const ENV_REQUEST_TIMEOUT_SECS: &'static str = "REQUEST_TIMEOUT_SECS";
    const ENV_MINIO_ENDPOINT: &'static str = "MINIO_ENDPOINT";
    const ENV_MINIO_ACCESS_KEY: &'static str = "MINIO_ACCESS_KEY";
    const ENV_MINIO_SECRET_KEY: &'static str = "MINIO_SECRET_KEY";
    const ENV_MINIO_REGION: &'static str = "MINIO_REGION";

    /// Loads configuration from environment variables (falling back to defaults).
    ///
    /// `CHUNKING_PRESET` selects a chunking baseline; the individual
    /// `CHUNK_*` variables override single fields on top of it.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        config.port = Self::parse_port_from_env(config.port)?;
        config.bind_addr = Self::parse_bind_addr_from_env(config.bind_addr)?;
        config.qdrant_url =
            Self::parse_string_from_env(Self::ENV_QDRANT_URL, config.qdrant_url.clone());
        config.qdrant_index =
            Self::parse_string_from_env(Self::ENV_QDRANT_INDEX, config.qdrant_index.clone());
        config.ollama_host =
            Self::parse_string_from_env(Self::ENV_OLLAMA_HOST, config.ollama_host.clone());
        config.ollama_embed_model = Self::parse_string_from_env(
            Self::ENV_OLLAMA_EMBED_MODEL,
            config.ollama_embed_model.clone(),
        );
        config.ollama_chat_model = Self::parse_string_from_env(
            Self::ENV_OLLAMA_CHAT_MODEL,
            config.ollama_chat_model.clone(),
        );
        config.minio_endpoint =
            Self::parse_string_from_env(Self::ENV_MINIO_ENDPOINT, config.minio_endpoint.clone());
        config.minio_access_key = Self::parse_optional_string_from_env(Self::ENV_MINIO_ACCESS_KEY);
        config.minio_secret_key = Self::parse_optional_string_from_env(Self::ENV_MINIO_SECRET_KEY);
        config.minio_region =
            Self::parse_string_from_env(Self::ENV_MINIO_REGION, config.minio_region.clone());

        if let Some(preset) = Self::parse_optional_string_from_env(Self::ENV_CHUNKING_PRESET) {
            let preset: ChunkingPreset = preset.parse()?;
            let (size, overlap, min) = preset.params();
            config.chunk_size = size;
            config.chunk_overlap = overlap;
            config.min_chunk_size = min;
        }

        config.chunk_size = Self::parse_usize_from_env(Self::ENV_CHUNK_SIZE, config.chunk_size)?;
        config.chunk_overlap =
            Self::parse_usize_from_env(Self::ENV_CHUNK_OVERLAP, config.chunk_overlap)?;
        config.min_chunk_size =
            Self::parse_usize_from_env(Self::ENV_MIN_CHUNK_SIZE, config.min_chunk_size)?;
        config.top_k_results =
            Self::parse_usize_from_env(Self::ENV_TOP_K_RESULTS, config.top_k_results)?;
        config.min_score_threshold =
            Self::parse_f32_from_env(Self::ENV_MIN_SCORE_THRESHOLD, config.min_score_threshold)?;
        config.max_results_per_source = Self::parse_usize_from_env(
            Self::ENV_MAX_RESULTS_PER_SOURCE,
            config.max_results_per_source,
        )?;
        config.max_parallel_searches = Self::parse_usize_from_env(
            Self::ENV_MAX_PARALLEL_SEARCHES,
            config.max_parallel_searches,
        )?;
        config.similarity_critical =
            Self::parse_f32_from_env(Self::ENV_SIMILARITY_CRITICAL, config.similarity_critical)?;
        config.similarity_high =
            Self::parse_f32_from_env(Self::ENV_SIMILARITY_HIGH, config.similarity_high)?;
        config.similarity_medium =
            Self::parse_f32_from_env(Self::ENV_SIMILARITY_MEDIUM, config.similarity_medium)?;
        config.similarity_low =
            Self::parse_f32_from_env(Self::ENV_SIMILARITY_LOW, config.similarity_low)?;
        config.embedding_dims =
            Self::parse_usize_from_env(Self::ENV_EMBEDDING_DIMS, config.embedding_dims)?;
        config.embedding_batch_size = Self::parse_usize_from_env(
            Self::ENV_EMBEDDING_BATCH_SIZE,
            config.embedding_batch_size,
        )?;
        config.embedding_max_retries = Self::parse_usize_from_env(
            Self::ENV_EMBEDDING_MAX_RETRIES,
            config.embedding_max_retries,
        )?;
        config.ollama_timeout_secs =
            Self::parse_u64_from_env(Self::ENV_OLLAMA_TIMEOUT_SECS, config.ollama_timeout_secs)?;
        config.search_timeout_secs =
            Self::parse_u64_from_env(Self::ENV_SEARCH_TIMEOUT_SECS, config.search_timeout_secs)?;
        config.request_timeout_secs =
            Self::parse_u64_from_env(Self::ENV_REQUEST_TIMEOUT_SECS, config.request_timeout_secs)?;

        Ok(config)
    }

    /// Validates cross-field invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chunk_overlap >= self.chunk_size {
            return Err(ConfigError::OverlapTooLarge {
                overlap: self.chunk_overlap,
                size: self.chunk_size,
            });
        }

        if self.min_chunk_size > self.chunk_size {
            return Err(ConfigError::MinChunkTooLarge {
                min: self.min_chunk_size,
                size: self.chunk_size,
            });
        }

        for (name, value) in [
            ("similarity_critical", self.similarity_critical),
            ("similarity_high", self.similarity_high),
            ("similarity_medium", self.similarity_medium),
            ("similarity_low", self.similarity_low),
            ("min_score_threshold", self.min_score_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::ThresholdOutOfRange {
                    name,
                    value: value as f64,
                });
            }
        }

        if !(self.similarity_low <= self.similarity_medium
            && self.similarity_medium <= self.similarity_high
            && self.similarity_high <= self.similarity_critical)
        {
            return Err(ConfigError::ThresholdsUnordered);
        }

        Ok(())
    }

    /// Returns `"{bind_addr}:{port}"` (useful for logging/binding).
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }

    /// Name of the chunk collection derived from the index base name.
    pub fn chunks_collection(&self) -> String {
        format!("{}_chunks", self.qdrant_index)
    }

    /// Maps a combined similarity in [0, 1] to its severity band.
    ///
    /// Band lower bounds are inclusive; the same banding applies to final
    /// percentages after dividing by 100.
    pub fn severity_for(&self, similarity: f32) -> Severity {
        if similarity >= self.similarity_critical {
            Severity::Critical
        } else if similarity >= self.similarity_high {
            Severity::High
        } else if similarity >= self.similarity_medium {
            Severity::Medium
        } else if similarity >= self.similarity_low {
            Severity::Low
        } else {
            Severity::Safe
        }
    }

    fn parse_port_from_env(default: u16) -> Result<u16, ConfigError> {
        match env::var(Self::ENV_PORT) {
            Ok(value) => {
                let port: u16 = value.parse().map_err(|e| ConfigError::PortParseError {
                    value: value.clone(),
                    source: e,
                })?;

                if port == 0 {
                    return Err(ConfigError::InvalidPort { value });
                }

                Ok(port)
            }
            Err(_) => Ok(default),
        }
    }

    fn parse_bind_addr_from_env(default: IpAddr) -> Result<IpAddr, ConfigError> {
        match env::var(Self::ENV_BIND_ADDR) {
            Ok(value) => value
                .parse()
                .map_err(|e| ConfigError::InvalidBindAddr { value, source: e }),
            Err(_) => Ok(default),
        }
    }

    fn parse_string_from_env(var_name: &str, default: String) -> String {
        env::var(var_name).unwrap_or(default)
    }

    fn parse_optional_string_from_env(var_name: &str) -> Option<String> {
        env::var(var_name)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn parse_usize_from_env(name: &'static str, default: usize) -> Result<usize, ConfigError> {
        match env::var(name) {
            Ok(value) => value
                .parse()
                .map_err(|_| ConfigError::InvalidNumber { name, value }),
            Err(_) => Ok(default),
        }
    }

    fn parse_u64_from_env(name: &'static str, default: u64) -> Result<u64, ConfigError> {
        match env::var(name) {
            Ok(value) => value
                .parse()
                .map_err(|_| ConfigError::InvalidNumber { name, value }),
            Err(_) => Ok(default),
        }
    }

    fn parse_f32_from_env(name: &'static str, default: f32) -> Result<f32, ConfigError> {
        match env::var(name) {
            Ok(value) => value
                .parse()
                .map_err(|_| ConfigError::InvalidNumber { name, value }),
            Err(_) => Ok(default),
        }
    }
}
