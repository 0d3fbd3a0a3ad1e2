use super::*;

fn hit(doc: &str, position: usize, text: &str, score: f32) -> ChunkHit {
    ChunkHit {
        chunk_id: format!("{}#{}", doc, position),
        document_id: doc.to_string(),
        document_title: format!("Title of {}", doc),
        text: text.to_string(),
        position,
        score,
    }
}

fn params() -> RescoreParams {
    RescoreParams {
        similarity_low: 0.5,
        max_per_source: 3,
    }
}

const INPUT: &str = "the quick brown fox jumps over the lazy dog in the quiet field";

#[test]
fn test_identical_text_scores_near_one() {
    let candidates = rescore(INPUT, vec![hit("doc-1", 0, INPUT, 1.0)], params());

    assert_eq!(candidates.len(), 1);
    let c = &candidates[0];
    assert!((c.semantic_score - 1.0).abs() < 1e-6);
    assert!((c.lexical_score - 1.0).abs() < 1e-6);
    assert!((c.combined_score - 1.0).abs() < 1e-6);
    assert!(!c.citation_applied);
}

#[test]
fn test_combined_is_even_fusion() {
    // Semantic 1.0 against lexically unrelated text: combined = 0.5.
    let candidates = rescore(
        INPUT,
        vec![hit("doc-1", 0, "completely different words entirely unrelated here", 1.0)],
        RescoreParams {
            similarity_low: 0.1,
            max_per_source: 3,
        },
    );

    assert_eq!(candidates.len(), 1);
    let c = &candidates[0];
    assert!(c.lexical_score < 0.1);
    assert!((c.combined_score - (0.5 + c.lexical_score * 0.5)).abs() < 1e-6);
}

#[test]
fn test_negative_semantic_clamped() {
    let candidates = rescore(
        INPUT,
        vec![hit("doc-1", 0, INPUT, -0.3)],
        RescoreParams {
            similarity_low: 0.0,
            max_per_source: 3,
        },
    );

    assert_eq!(candidates[0].semantic_score, 0.0);
    assert!((candidates[0].combined_score - 0.5).abs() < 1e-6);
}

#[test]
fn test_low_threshold_discards() {
    let candidates = rescore(
        INPUT,
        vec![hit("doc-1", 0, "completely different words entirely unrelated here", 0.6)],
        params(),
    );

    // combined ~= 0.3 < 0.5.
    assert!(candidates.is_empty());
}

#[test]
fn test_citation_penalty_applied_once() {
    let cited = format!("As stated in (Smith, 2020), {}", INPUT);
    let plain = rescore(INPUT, vec![hit("doc-1", 0, INPUT, 1.0)], params());
    let penalized = rescore(&cited, vec![hit("doc-1", 0, INPUT, 1.0)], params());

    assert!(penalized[0].citation_applied);
    // Multiplicative penalty: at most 0.85x the unpenalised score, give or
    // take the lexical drift the extra words introduce.
    assert!(penalized[0].combined_score <= plain[0].combined_score * 0.85 + 1e-6);
}

#[test]
fn test_citation_penalty_suppressed_for_cited_source() {
    let cited = format!("As stated in (Smith, 2020), {}", INPUT);
    let mut matched = hit("doc-1", 0, INPUT, 1.0);
    matched.document_title = "Smith 2020: On Foxes".to_string();

    let candidates = rescore(&cited, vec![matched], params());
    assert!(!candidates[0].citation_applied);
}

#[test]
fn test_per_source_cap_reapplied_after_rescoring() {
    let hits = vec![
        hit("doc-1", 0, INPUT, 0.9),
        hit("doc-1", 1, INPUT, 0.9),
        hit("doc-1", 2, INPUT, 0.9),
        hit("doc-1", 3, INPUT, 0.9),
        hit("doc-2", 0, INPUT, 0.9),
    ];

    let candidates = rescore(INPUT, hits, params());

    let from_doc1 = candidates.iter().filter(|c| c.document_id == "doc-1").count();
    assert_eq!(from_doc1, 3);
    assert_eq!(candidates.len(), 4);
}

#[test]
fn test_ranking_ties_broken_by_semantic_then_position() {
    // Same combined score by construction: identical text, identical
    // semantic; tie falls through to source position.
    let hits = vec![hit("doc-1", 5, INPUT, 0.9), hit("doc-1", 2, INPUT, 0.9)];
    let candidates = rescore(INPUT, hits, params());

    assert_eq!(candidates[0].source_position, 2);
    assert_eq!(candidates[1].source_position, 5);
}

fn make_match(doc: &str, chunk: &str, score: f32, chunk_index: usize) -> Match {
    Match {
        document_id: doc.to_string(),
        document_title: String::new(),
        matched_text: String::new(),
        input_text: String::new(),
        similarity_score: score,
        semantic_score: score,
        lexical_score: score,
        position_start: 0,
        position_end: 0,
        chunk_index,
        matched_chunk_id: chunk.to_string(),
    }
}

#[test]
fn test_dedup_keeps_highest_score() {
    let matches = vec![
        make_match("doc-1", "doc-1#0", 0.8, 0),
        make_match("doc-1", "doc-1#0", 0.7, 1),
        make_match("doc-2", "doc-2#0", 0.9, 1),
    ];

    let unique = dedup_and_rank(matches, 10);

    assert_eq!(unique.len(), 2);
    assert_eq!(unique[0].document_id, "doc-2");
    assert_eq!(unique[1].similarity_score, 0.8);
}

#[test]
fn test_dedup_allows_distinct_chunks_of_same_document() {
    let matches = vec![
        make_match("doc-1", "doc-1#0", 0.8, 0),
        make_match("doc-1", "doc-1#1", 0.7, 1),
    ];

    let unique = dedup_and_rank(matches, 10);
    assert_eq!(unique.len(), 2);
}

#[test]
fn test_dedup_truncates_to_top_k() {
    let matches = (0..20)
        .map(|i| make_match("doc", &format!("doc#{}", i), 0.9 - i as f32 * 0.01, i))
        .collect();

    let unique = dedup_and_rank(matches, 5);
    assert_eq!(unique.len(), 5);
    assert!(unique[0].similarity_score > unique[4].similarity_score);
}
