//! The detection pipeline: chunk, embed, search, rescore, aggregate.

pub mod error;
pub mod types;


pub use error::DetectError;
pub use types::{CheckOptions, ChunkAnalysis, ProcessingMetrics, Verdict};

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures_util::future::join_all;
use tokio::sync::Semaphore;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::analysis::{empty_input_explanation, explanation_for};
use crate::chunker::{TextChunk, TextChunker};
use crate::config::Config;
use crate::embedding::Embedder;
use crate::matching::{self, Match, RescoreParams};
use crate::severity::Severity;
use crate::vectordb::{DocumentIndex, KnnQuery};

/// Hard cap on check input size.
const MAX_CHECK_BYTES: usize = 2 * 1024 * 1024;

/// Plagiarism detection engine over an embedder and a document index.
///
/// The clients are shared handles; one detector serves many concurrent
/// requests. Per-request state (embeddings, candidate lists) lives in the
/// call frame and dies with it, including on cancellation.
pub struct Detector<E: Embedder, I: DocumentIndex> {
    embedder: Arc<E>,
    index: Arc<I>,
    chunker: TextChunker,
    config: Config,
    search_limit: Arc<Semaphore>,
}

impl<E: Embedder, I: DocumentIndex> Detector<E, I> {
    /// Wires a detector up from shared clients and the active config.
    pub fn new(embedder: Arc<E>, index: Arc<I>, config: Config) -> Self {
        let chunker = TextChunker::from_config(&config);
        let search_limit = Arc::new(Semaphore::new(config.max_parallel_searches.max(1)));

        Self {
            embedder,
            index,
            chunker,
            config,
            search_limit,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Checks `text` against the indexed corpus.
    ///
    /// The whole request runs under the configured deadline; expiry of the
    /// request deadline or of any inner embed/search timeout fails the
    /// check. A failed kNN call on any single chunk fails the whole
    /// request rather than returning partial results.
    #[instrument(skip(self, text, options), fields(text_len = text.len()))]
    pub async fn check(&self, text: &str, options: &CheckOptions) -> Result<Verdict, DetectError> {
        validate_options(options)?;

        if text.len() > MAX_CHECK_BYTES {
            return Err(DetectError::InvalidArgument(format!(
                "input of {} bytes exceeds the {} byte limit",
                text.len(),
                MAX_CHECK_BYTES
            )));
        }

        let started = Instant::now();
        let request_id = Uuid::new_v4().to_string();
        let deadline = Duration::from_secs(self.config.request_timeout_secs);

        match tokio::time::timeout(deadline, self.check_inner(&request_id, text, options, started))
            .await
        {
            Ok(result) => result,
            Err(_) => Err(DetectError::DeadlineExceeded { stage: "request" }),
        }
    }

    async fn check_inner(
        &self,
        request_id: &str,
        text: &str,
        options: &CheckOptions,
        started: Instant,
    ) -> Result<Verdict, DetectError> {
        let chunks = self.chunker.chunk_text(text);
        info!(request_id, chunks = chunks.len(), "input chunked");

        if chunks.is_empty() {
            return Ok(self.empty_verdict(request_id, started));
        }

        let chunk_texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let embed_deadline = Duration::from_secs(self.config.ollama_timeout_secs);
        let embeddings =
            match tokio::time::timeout(embed_deadline, self.embedder.embed_batch(&chunk_texts))
                .await
            {
                Ok(result) => result?,
                Err(_) => return Err(DetectError::DeadlineExceeded { stage: "embedding" }),
            };

        if embeddings.len() != chunks.len() {
            return Err(DetectError::Internal(format!(
                "embedder returned {} vectors for {} chunks",
                embeddings.len(),
                chunks.len()
            )));
        }

        let min_score = options
            .min_similarity
            .unwrap_or(self.config.min_score_threshold);
        let top_k = options.top_k.unwrap_or(self.config.top_k_results);
        let search_deadline = Duration::from_secs(self.config.search_timeout_secs);

        // One kNN query per chunk, bounded by the semaphore. join_all
        // keeps results in chunk order however the calls complete.
        let searches = embeddings.into_iter().map(|embedding| {
            let query = KnnQuery {
                embedding,
                top_k,
                min_score,
                exclude_docs: options.exclude_docs.clone(),
                max_per_source: self.config.max_results_per_source,
            };
            let index = Arc::clone(&self.index);
            let limit = Arc::clone(&self.search_limit);

            async move {
                let _permit = limit
                    .acquire()
                    .await
                    .map_err(|_| DetectError::Internal("search semaphore closed".to_string()))?;

                match tokio::time::timeout(search_deadline, index.knn_search(&query)).await {
                    Ok(result) => result.map_err(DetectError::from),
                    Err(_) => Err(DetectError::DeadlineExceeded { stage: "search" }),
                }
            }
        });

        let search_results = join_all(searches).await;

        let params = RescoreParams {
            similarity_low: self.config.similarity_low,
            max_per_source: self.config.max_results_per_source,
        };

        let mut chunk_analysis = Vec::with_capacity(chunks.len());
        let mut all_matches: Vec<Match> = Vec::new();

        for (chunk, hits) in chunks.iter().zip(search_results) {
            let candidates = matching::rescore(&chunk.text, hits?, params);
            chunk_analysis.push(self.analyze_chunk(chunk, &candidates));

            for candidate in candidates {
                all_matches.push(Match {
                    document_id: candidate.document_id,
                    document_title: candidate.document_title,
                    matched_text: candidate.matched_text,
                    input_text: chunk.text.clone(),
                    similarity_score: candidate.combined_score,
                    semantic_score: candidate.semantic_score,
                    lexical_score: candidate.lexical_score,
                    position_start: chunk.word_offset,
                    position_end: chunk.word_offset + chunk.word_count,
                    chunk_index: chunk.position,
                    matched_chunk_id: candidate.chunk_id,
                });
            }
        }

        let percentage = weighted_percentage(&chunks, &chunk_analysis, self.config.similarity_low);
        let severity = self.config.severity_for(percentage / 100.0);
        let matches = matching::dedup_and_rank(all_matches, top_k);
        let explanation = explanation_for(severity, matches.len());

        let documents_searched = match self.index.document_count().await {
            Ok(count) => count,
            Err(e) => {
                warn!(error = %e, "document count unavailable, reporting 0");
                0
            }
        };

        debug!(
            request_id,
            percentage = percentage as f64,
            severity = %severity,
            matches = matches.len(),
            "check complete"
        );

        Ok(Verdict {
            request_id: request_id.to_string(),
            plagiarism_percentage: percentage,
            severity,
            explanation,
            matches,
            chunk_analysis,
            metrics: ProcessingMetrics {
                processing_time_ms: started.elapsed().as_millis() as u64,
                chunks_analyzed: chunks.len(),
                documents_searched,
            },
            ai_analysis: None,
        })
    }

    fn analyze_chunk(
        &self,
        chunk: &TextChunk,
        candidates: &[matching::Candidate],
    ) -> ChunkAnalysis {
        match candidates.first() {
            Some(best) => ChunkAnalysis {
                chunk_index: chunk.position,
                text: chunk.text.clone(),
                max_similarity: best.combined_score,
                status: self.config.severity_for(best.combined_score),
                best_match_doc_id: Some(best.document_id.clone()),
                best_match_title: Some(best.document_title.clone()),
            },
            None => ChunkAnalysis {
                chunk_index: chunk.position,
                text: chunk.text.clone(),
                max_similarity: 0.0,
                status: Severity::Safe,
                best_match_doc_id: None,
                best_match_title: None,
            },
        }
    }

    fn empty_verdict(&self, request_id: &str, started: Instant) -> Verdict {
        Verdict {
            request_id: request_id.to_string(),
            plagiarism_percentage: 0.0,
            severity: Severity::Safe,
            explanation: empty_input_explanation(),
            matches: Vec::new(),
            chunk_analysis: Vec::new(),
            metrics: ProcessingMetrics {
                processing_time_ms: started.elapsed().as_millis() as u64,
                chunks_analyzed: 0,
                documents_searched: 0,
            },
            ai_analysis: None,
        }
    }
}

fn validate_options(options: &CheckOptions) -> Result<(), DetectError> {
    if let Some(min_similarity) = options.min_similarity {
        if !(0.0..=1.0).contains(&min_similarity) {
            return Err(DetectError::InvalidArgument(format!(
                "min_similarity {} must lie in [0, 1]",
                min_similarity
            )));
        }
    }

    if options.top_k == Some(0) {
        return Err(DetectError::InvalidArgument(
            "top_k must be at least 1".to_string(),
        ));
    }

    Ok(())
}

/// Word-count-weighted plagiarism percentage.
///
/// Chunks whose best combined score reaches `similarity_low` contribute
/// `word_count · score`; everything else contributes nothing. The divisor
/// is the total word count, so the result lands in [0, 100].
fn weighted_percentage(
    chunks: &[TextChunk],
    analysis: &[ChunkAnalysis],
    similarity_low: f32,
) -> f32 {
    let total_words: usize = chunks.iter().map(|c| c.word_count).sum();
    if total_words == 0 {
        return 0.0;
    }

    let weighted: f32 = chunks
        .iter()
        .zip(analysis)
        .filter(|(_, a)| a.max_similarity >= similarity_low)
        .map(|(c, a)| c.word_count as f32 * a.max_similarity)
        .sum();

    (weighted / total_words as f32) * 100.0
}
