use serde::{Deserialize, Serialize};

use crate::analysis::AiAnalysis;
use crate::matching::Match;
use crate::severity::Severity;

/// Per-request knobs for a plagiarism check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckOptions {
    /// Raw kNN scores below this are dropped; defaults to the configured
    /// `similarity_low`.
    #[serde(default)]
    pub min_similarity: Option<f32>,

    /// Maximum matches returned (and fetched per chunk); defaults to the
    /// configured `top_k_results`.
    #[serde(default)]
    pub top_k: Option<usize>,

    /// Whether to attach the optional AI analysis to the response.
    #[serde(default = "default_include_ai")]
    pub include_ai_analysis: bool,

    /// Documents excluded from the search.
    #[serde(default)]
    pub exclude_docs: Vec<String>,
}

fn default_include_ai() -> bool {
    true
}

impl Default for CheckOptions {
    fn default() -> Self {
        Self {
            min_similarity: None,
            top_k: None,
            include_ai_analysis: true,
            exclude_docs: Vec::new(),
        }
    }
}

/// Outcome for one input chunk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkAnalysis {
    pub chunk_index: usize,
    pub text: String,
    /// Highest combined score among surviving candidates (0 when none).
    pub max_similarity: f32,
    pub status: Severity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub best_match_doc_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub best_match_title: Option<String>,
}

/// Request-level processing metrics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingMetrics {
    pub processing_time_ms: u64,
    pub chunks_analyzed: usize,
    pub documents_searched: usize,
}

/// Complete plagiarism check result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Verdict {
    pub request_id: String,
    /// Weighted percentage in [0, 100].
    pub plagiarism_percentage: f32,
    pub severity: Severity,
    /// Deterministic summary; never produced by a model.
    pub explanation: String,
    pub matches: Vec<Match>,
    pub chunk_analysis: Vec<ChunkAnalysis>,
    pub metrics: ProcessingMetrics,
    /// Optional model-written commentary; the numeric fields above are
    /// never derived from it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ai_analysis: Option<AiAnalysis>,
}
