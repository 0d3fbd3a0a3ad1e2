use super::*;
use crate::severity::Severity;
use serial_test::serial;
use std::env;
use std::net::IpAddr;

fn with_env_vars<F, R>(vars: &[(&str, &str)], f: F) -> R
where
    F: FnOnce() -> R,
{
    // SAFETY: Test code only, we accept the thread-safety risk in tests.
    for (key, value) in vars {
        unsafe { env::set_var(key, value) };
    }

    let result = f();

    // SAFETY: Test code only, we accept the thread-safety risk in tests.
    for (key, _) in vars {
        unsafe { env::remove_var(key) };
    }

    result
}

fn clear_config_env() {
    // SAFETY: Test code only, we accept the thread-safety risk in tests.
    unsafe {
        for var in [
            "PORT",
            "BIND_ADDR",
            "CHUNKING_PRESET",
            "CHUNK_SIZE",
            "CHUNK_OVERLAP",
            "MIN_CHUNK_SIZE",
            "TOP_K_RESULTS",
            "MIN_SCORE_THRESHOLD",
            "MAX_RESULTS_PER_SOURCE",
            "MAX_PARALLEL_SEARCHES",
            "SIMILARITY_CRITICAL",
            "SIMILARITY_HIGH",
            "SIMILARITY_MEDIUM",
            "SIMILARITY_LOW",
            "EMBEDDING_DIMS",
            "EMBEDDING_BATCH_SIZE",
            "EMBEDDING_MAX_RETRIES",
            "QDRANT_URL",
            "QDRANT_INDEX",
            "OLLAMA_HOST",
            "OLLAMA_EMBED_MODEL",
            "OLLAMA_CHAT_MODEL",
            "OLLAMA_TIMEOUT_SECS",
            "SEARCH_TIMEOUT_SECS",
            "REQUEST_TIMEOUT_SECS",
            "MINIO_ENDPOINT",
            "MINIO_ACCESS_KEY",
            "MINIO_SECRET_KEY",
            "MINIO_REGION",
        ] {
            env::remove_var(var);
        }
    }
}

#[test]
fn test_default_config() {
    let config = Config::default();

    assert_eq!(config.port, 8080);
    assert_eq!(
        config.bind_addr,
        IpAddr::V4(std::net::Ipv4Addr::new(0, 0, 0, 0))
    );
    assert_eq!(config.chunk_size, 100);
    assert_eq!(config.chunk_overlap, 20);
    assert_eq!(config.min_chunk_size, 30);
    assert_eq!(config.top_k_results, 10);
    assert_eq!(config.max_results_per_source, 3);
    assert_eq!(config.embedding_dims, 768);
    assert_eq!(config.qdrant_url, "http://localhost:6334");
    assert_eq!(config.qdrant_index, "plagiarism_documents");
    assert!(config.minio_access_key.is_none());
}

#[test]
fn test_chunks_collection_name() {
    let config = Config::default();
    assert_eq!(config.chunks_collection(), "plagiarism_documents_chunks");
}

#[test]
fn test_severity_banding() {
    let config = Config::default();

    assert_eq!(config.severity_for(0.96), Severity::Critical);
    assert_eq!(config.severity_for(0.95), Severity::Critical);
    assert_eq!(config.severity_for(0.90), Severity::High);
    assert_eq!(config.severity_for(0.85), Severity::High);
    assert_eq!(config.severity_for(0.75), Severity::Medium);
    assert_eq!(config.severity_for(0.70), Severity::Medium);
    assert_eq!(config.severity_for(0.60), Severity::Low);
    assert_eq!(config.severity_for(0.50), Severity::Low);
    assert_eq!(config.severity_for(0.49), Severity::Safe);
    assert_eq!(config.severity_for(0.0), Severity::Safe);
}

#[test]
#[serial]
fn test_from_env_with_defaults() {
    clear_config_env();

    let config = Config::from_env().expect("should parse with defaults");

    assert_eq!(config.chunk_size, 100);
    assert_eq!(config.min_score_threshold, 0.50);
}

#[test]
#[serial]
fn test_from_env_overrides() {
    clear_config_env();

    let config = with_env_vars(
        &[
            ("CHUNK_SIZE", "250"),
            ("TOP_K_RESULTS", "5"),
            ("SIMILARITY_LOW", "0.6"),
            ("QDRANT_INDEX", "corpus"),
        ],
        || Config::from_env().expect("should parse overrides"),
    );

    assert_eq!(config.chunk_size, 250);
    assert_eq!(config.top_k_results, 5);
    assert_eq!(config.similarity_low, 0.6);
    assert_eq!(config.chunks_collection(), "corpus_chunks");
}

#[test]
#[serial]
fn test_coarse_preset() {
    clear_config_env();

    let config = with_env_vars(&[("CHUNKING_PRESET", "coarse")], || {
        Config::from_env().expect("should parse preset")
    });

    assert_eq!(config.chunk_size, 250);
    assert_eq!(config.chunk_overlap, 50);
    assert_eq!(config.min_chunk_size, 50);
}

#[test]
#[serial]
fn test_preset_with_field_override() {
    clear_config_env();

    let config = with_env_vars(
        &[("CHUNKING_PRESET", "coarse"), ("CHUNK_OVERLAP", "40")],
        || Config::from_env().expect("should parse"),
    );

    assert_eq!(config.chunk_size, 250);
    assert_eq!(config.chunk_overlap, 40);
}

#[test]
#[serial]
fn test_unknown_preset_rejected() {
    clear_config_env();

    let result = with_env_vars(&[("CHUNKING_PRESET", "gigantic")], Config::from_env);
    assert!(matches!(result, Err(ConfigError::UnknownPreset { .. })));
}

#[test]
fn test_validate_rejects_overlap_not_less_than_size() {
    let config = Config {
        chunk_size: 50,
        chunk_overlap: 50,
        ..Default::default()
    };

    assert!(matches!(
        config.validate(),
        Err(ConfigError::OverlapTooLarge { .. })
    ));
}

#[test]
fn test_validate_rejects_out_of_range_threshold() {
    let config = Config {
        similarity_low: 1.5,
        ..Default::default()
    };

    assert!(matches!(
        config.validate(),
        Err(ConfigError::ThresholdOutOfRange { .. })
    ));
}

#[test]
fn test_validate_rejects_unordered_thresholds() {
    let config = Config {
        similarity_medium: 0.9,
        similarity_high: 0.8,
        ..Default::default()
    };

    assert!(matches!(
        config.validate(),
        Err(ConfigError::ThresholdsUnordered)
    ));
}

#[test]
fn test_validate_accepts_defaults() {
    Config::default().validate().expect("defaults are valid");
}
