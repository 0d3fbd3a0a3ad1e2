//! Fusion of semantic and lexical evidence into ranked candidates.

#[cfg(test)]
mod tests;

use std::cmp::Ordering;
use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::lexical::{CITATION_PENALTY, cites_source, has_citation, lexical_similarity};
use crate::vectordb::{ChunkHit, cap_per_source};

/// Relative weight of the semantic score in the combined score.
pub const SEMANTIC_WEIGHT: f32 = 0.5;
/// Relative weight of the lexical score in the combined score.
pub const LEXICAL_WEIGHT: f32 = 0.5;

/// Aggregation parameters, taken from the active configuration.
#[derive(Debug, Clone, Copy)]
pub struct RescoreParams {
    /// Candidates whose combined score falls below this are discarded.
    pub similarity_low: f32,
    /// Per-source cap, re-applied after lexical rescoring.
    pub max_per_source: usize,
}

/// A kNN candidate after lexical rescoring and the citation penalty.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub chunk_id: String,
    pub document_id: String,
    pub document_title: String,
    pub matched_text: String,
    /// Chunk position inside the source document.
    pub source_position: usize,
    pub semantic_score: f32,
    pub lexical_score: f32,
    pub combined_score: f32,
    /// Whether the citation penalty fired for this candidate.
    pub citation_applied: bool,
}

/// A match as reported to the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Match {
    pub document_id: String,
    pub document_title: String,
    pub matched_text: String,
    pub input_text: String,
    /// Combined score after the citation penalty.
    pub similarity_score: f32,
    pub semantic_score: f32,
    pub lexical_score: f32,
    /// Word offset of the input chunk in the normalised input.
    pub position_start: usize,
    /// Word offset one past the input chunk.
    pub position_end: usize,
    /// Index of the input chunk this match was found for.
    pub chunk_index: usize,
    pub matched_chunk_id: String,
}

/// Rescores one input chunk's kNN candidates.
///
/// For each candidate the combined score is the 50/50 fusion of the
/// (clamped) semantic score and the lexical score, reduced by the citation
/// penalty when the chunk visibly cites some *other* source. Candidates
/// below `similarity_low` are discarded, the per-source cap is re-applied
/// (lexical rescoring reorders, so the cap from the store client is not
/// enough), and the survivors are ranked: combined score descending, ties
/// by higher semantic score, then by smaller source position.
pub fn rescore(input_text: &str, hits: Vec<ChunkHit>, params: RescoreParams) -> Vec<Candidate> {
    // The citation scan fires at most once per chunk, however many
    // markers appear.
    let input_has_citation = has_citation(input_text);

    let mut candidates: Vec<Candidate> = hits
        .into_iter()
        .map(|hit| {
            let semantic = hit.score.clamp(0.0, 1.0);
            let lexical = lexical_similarity(input_text, &hit.text);
            let mut combined = semantic * SEMANTIC_WEIGHT + lexical * LEXICAL_WEIGHT;

            let citation_applied =
                input_has_citation && !cites_source(input_text, &hit.document_title);
            if citation_applied {
                combined *= 1.0 - CITATION_PENALTY;
            }

            Candidate {
                chunk_id: hit.chunk_id,
                document_id: hit.document_id,
                document_title: hit.document_title,
                matched_text: hit.text,
                source_position: hit.position,
                semantic_score: semantic,
                lexical_score: lexical,
                combined_score: combined,
                citation_applied,
            }
        })
        .filter(|candidate| candidate.combined_score >= params.similarity_low)
        .collect();

    candidates.sort_by(compare_candidates);

    cap_candidates_per_source(candidates, params.max_per_source)
}

fn compare_candidates(a: &Candidate, b: &Candidate) -> Ordering {
    b.combined_score
        .partial_cmp(&a.combined_score)
        .unwrap_or(Ordering::Equal)
        .then(
            b.semantic_score
                .partial_cmp(&a.semantic_score)
                .unwrap_or(Ordering::Equal),
        )
        .then(a.source_position.cmp(&b.source_position))
}

fn cap_candidates_per_source(candidates: Vec<Candidate>, max_per_source: usize) -> Vec<Candidate> {
    // Reuse the store client's capping on the hit shape to keep one policy.
    let order: Vec<ChunkHit> = candidates
        .iter()
        .map(|c| ChunkHit {
            chunk_id: c.chunk_id.clone(),
            document_id: c.document_id.clone(),
            document_title: String::new(),
            text: String::new(),
            position: c.source_position,
            score: c.combined_score,
        })
        .collect();
    let kept: HashSet<String> = cap_per_source(order, max_per_source)
        .into_iter()
        .map(|hit| hit.chunk_id)
        .collect();

    candidates
        .into_iter()
        .filter(|c| kept.contains(&c.chunk_id))
        .collect()
}

/// De-duplicates the union of per-chunk matches by
/// `(document_id, matched_chunk_id)`, keeping the highest-scoring
/// occurrence, and truncates to the request's `top_k`.
pub fn dedup_and_rank(mut matches: Vec<Match>, top_k: usize) -> Vec<Match> {
    matches.sort_by(|a, b| {
        b.similarity_score
            .partial_cmp(&a.similarity_score)
            .unwrap_or(Ordering::Equal)
            .then(
                b.semantic_score
                    .partial_cmp(&a.semantic_score)
                    .unwrap_or(Ordering::Equal),
            )
            .then(a.chunk_index.cmp(&b.chunk_index))
    });

    let mut seen: HashSet<(String, String)> = HashSet::new();
    let mut unique = Vec::new();

    for m in matches {
        let key = (m.document_id.clone(), m.matched_chunk_id.clone());
        if seen.insert(key) {
            unique.push(m);
        }
        if unique.len() == top_k {
            break;
        }
    }

    unique
}
