//! Verdict explanations: deterministic templates plus an optional
//! model-written commentary.
//!
//! The numeric percentage and severity always come from the aggregation
//! pipeline; the analyzer only ever contributes prose.


use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::config::Config;
use crate::matching::Match;
use crate::severity::Severity;

/// Builds the deterministic explanation for a verdict.
pub fn explanation_for(severity: Severity, match_count: usize) -> String {
    match severity {
        Severity::Critical => format!(
            "Severe plagiarism detected: {} closely matching passages found in the corpus.",
            match_count
        ),
        Severity::High => format!(
            "High plagiarism level: {} passages show strong similarity to stored documents.",
            match_count
        ),
        Severity::Medium => format!(
            "Suspected plagiarism: {} passages resemble content from other sources.",
            match_count
        ),
        Severity::Low => format!(
            "{} passages may share ideas with existing documents.",
            match_count
        ),
        Severity::Safe => "Text appears safe; no significant plagiarism detected.".to_string(),
    }
}

/// Explanation used for empty or whitespace-only input.
pub fn empty_input_explanation() -> String {
    "Text is too short or empty to analyze.".to_string()
}

/// A passage the model flagged, with its reasoning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuspiciousSegment {
    pub text: String,
    pub reason: String,
}

/// Model-written commentary attached to a verdict.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiAnalysis {
    pub explanation: String,
    #[serde(default)]
    pub suspicious_segments: Vec<SuspiciousSegment>,
    pub confidence: f32,
}

#[derive(Debug, Error)]
/// Errors from the analysis hook.
pub enum AnalysisError {
    /// The chat backend was unreachable.
    #[error("analysis backend unreachable: {message}")]
    Unavailable {
        /// Transport error message.
        message: String,
    },

    /// The chat backend rejected the request.
    #[error("analysis request rejected with status {status}: {message}")]
    Rejected {
        /// HTTP status code.
        status: u16,
        /// Response body (truncated).
        message: String,
    },

    /// The model reply could not be parsed.
    #[error("malformed analysis response: {message}")]
    MalformedResponse {
        /// What was wrong.
        message: String,
    },
}

/// Chat-model hook producing an [`AiAnalysis`].
pub trait Analyzer: Send + Sync {
    /// Writes commentary for a finished check. Implementations must not
    /// influence the numeric verdict.
    fn analyze(
        &self,
        input_text: &str,
        matches: &[Match],
        base_percentage: f32,
    ) -> impl std::future::Future<Output = Result<AiAnalysis, AnalysisError>> + Send;
}

/// [`Analyzer`] backed by the Ollama `/api/chat` endpoint.
#[derive(Debug, Clone)]
pub struct OllamaAnalyzer {
    client: reqwest::Client,
    base_url: String,
    model: String,
}

impl OllamaAnalyzer {
    /// Creates an analyzer for `base_url` using `model`.
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, AnalysisError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AnalysisError::Unavailable {
                message: e.to_string(),
            })?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            model: model.into(),
        })
    }

    /// Creates an analyzer from the service configuration.
    pub fn from_config(config: &Config) -> Result<Self, AnalysisError> {
        Self::new(
            config.ollama_host.clone(),
            config.ollama_chat_model.clone(),
            Duration::from_secs(config.ollama_timeout_secs),
        )
    }

    fn build_prompt(input_text: &str, matches: &[Match], base_percentage: f32) -> String {
        let truncated: String = input_text.chars().take(2000).collect();

        let mut formatted = String::new();
        if matches.is_empty() {
            formatted.push_str("No similar passages were found.\n");
        }
        for (i, m) in matches.iter().take(5).enumerate() {
            let snippet: String = m.matched_text.chars().take(500).collect();
            formatted.push_str(&format!(
                "Match {}:\n- Source: {}\n- Similarity: {:.1}%\n- Overlapping content:\n\"\"\"{}\"\"\"\n",
                i + 1,
                m.document_title,
                m.similarity_score * 100.0,
                snippet
            ));
        }

        format!(
            "You are a plagiarism detection expert. Review the text below and comment on it.\n\n\
             TEXT UNDER REVIEW:\n\"\"\"{}\"\"\"\n\n\
             SIMILAR PASSAGES FOUND:\n{}\n\
             MEASURED SIMILARITY: {:.1}%\n\n\
             Reply with JSON only, in this shape:\n\
             {{\n\
               \"explanation\": \"<one short paragraph>\",\n\
               \"suspicious_segments\": [{{\"text\": \"<passage>\", \"reason\": \"<why>\"}}],\n\
               \"confidence\": <0..1>\n\
             }}",
            truncated, formatted, base_percentage
        )
    }

    fn parse_reply(reply: &str) -> Result<AiAnalysis, AnalysisError> {
        // Models occasionally wrap the JSON in a code fence.
        let trimmed = reply
            .trim()
            .trim_start_matches("```json")
            .trim_start_matches("```")
            .trim_end_matches("```")
            .trim();

        serde_json::from_str(trimmed).map_err(|e| AnalysisError::MalformedResponse {
            message: e.to_string(),
        })
    }
}

impl Analyzer for OllamaAnalyzer {
    async fn analyze(
        &self,
        input_text: &str,
        matches: &[Match],
        base_percentage: f32,
    ) -> Result<AiAnalysis, AnalysisError> {
        let url = format!("{}/api/chat", self.base_url);
        let prompt = Self::build_prompt(input_text, matches, base_percentage);

        debug!(model = %self.model, matches = matches.len(), "requesting analysis");

        let response = self
            .client
            .post(&url)
            .json(&serde_json::json!({
                "model": self.model,
                "messages": [{ "role": "user", "content": prompt }],
                "stream": false,
                "format": "json",
            }))
            .send()
            .await
            .map_err(|e| AnalysisError::Unavailable {
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(AnalysisError::Rejected {
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }

        let body: serde_json::Value =
            response
                .json()
                .await
                .map_err(|e| AnalysisError::MalformedResponse {
                    message: e.to_string(),
                })?;

        let reply = body
            .get("message")
            .and_then(|m| m.get("content"))
            .and_then(|c| c.as_str())
            .ok_or_else(|| AnalysisError::MalformedResponse {
                message: "response carries no message content".to_string(),
            })?;

        Self::parse_reply(reply)
    }
}
