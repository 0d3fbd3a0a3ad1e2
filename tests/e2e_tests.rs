//! End-to-end scenarios over the mock embedder and in-memory index.

use std::collections::HashMap;
use std::sync::Arc;

use veriscan::config::Config;
use veriscan::detector::{CheckOptions, Detector};
use veriscan::embedding::MockEmbedder;
use veriscan::ingest::{DocumentIngestor, UploadRequest};
use veriscan::severity::Severity;
use veriscan::vectordb::{DocumentIndex, MockIndex};

const DIMS: usize = 256;

struct Harness {
    detector: Detector<MockEmbedder, MockIndex>,
    ingestor: DocumentIngestor<MockEmbedder, MockIndex>,
    index: Arc<MockIndex>,
}

fn harness() -> Harness {
    let config = Config {
        embedding_dims: DIMS,
        ..Default::default()
    };
    let embedder = Arc::new(MockEmbedder::new(DIMS));
    let index = Arc::new(MockIndex::new());

    Harness {
        detector: Detector::new(Arc::clone(&embedder), Arc::clone(&index), config.clone()),
        ingestor: DocumentIngestor::new(embedder, Arc::clone(&index), config),
        index,
    }
}

fn upload(title: &str, content: &str) -> UploadRequest {
    UploadRequest {
        title: title.to_string(),
        content: content.to_string(),
        metadata: HashMap::new(),
        language: None,
        document_id: None,
    }
}

/// Sixty distinct words, below the default chunk size.
fn source_paragraph() -> String {
    (0..60)
        .map(|i| format!("alpha{}", i))
        .collect::<Vec<_>>()
        .join(" ")
}

/// The source paragraph with every fifth word replaced, leaving roughly
/// 80% of the tokens shared.
fn paraphrased_paragraph() -> String {
    (0..60)
        .map(|i| {
            if i % 5 == 4 {
                format!("beta{}", i)
            } else {
                format!("alpha{}", i)
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[tokio::test]
async fn scenario_empty_corpus_is_safe() {
    let h = harness();

    let text = "Lorem ipsum dolor sit amet consectetur adipiscing elit sed do eiusmod tempor \
                incididunt ut labore et dolore magna aliqua enim ad minim veniam quis nostrud \
                exercitation ullamco laboris nisi ut aliquip ex ea commodo consequat duis aute \
                irure dolor in reprehenderit voluptate velit";

    let verdict = h
        .detector
        .check(text, &CheckOptions::default())
        .await
        .expect("check should succeed");

    assert_eq!(verdict.plagiarism_percentage, 0.0);
    assert_eq!(verdict.severity, Severity::Safe);
    assert!(verdict.matches.is_empty());
}

#[tokio::test]
async fn scenario_exact_duplicate_is_critical() {
    let h = harness();
    let content = source_paragraph();

    h.ingestor
        .upload(upload("A", &content))
        .await
        .expect("upload should succeed");

    let verdict = h
        .detector
        .check(&content, &CheckOptions::default())
        .await
        .expect("check should succeed");

    assert!(
        verdict.plagiarism_percentage >= 95.0,
        "got {}",
        verdict.plagiarism_percentage
    );
    assert_eq!(verdict.severity, Severity::Critical);
    assert_eq!(verdict.matches[0].document_title, "A");
    assert!(verdict.matches[0].similarity_score >= 0.95);
}

#[tokio::test]
async fn scenario_mild_paraphrase_is_medium_or_high() {
    let h = harness();

    h.ingestor
        .upload(upload("Source", &source_paragraph()))
        .await
        .expect("upload should succeed");

    let verdict = h
        .detector
        .check(&paraphrased_paragraph(), &CheckOptions::default())
        .await
        .expect("check should succeed");

    assert!(
        verdict.plagiarism_percentage >= 70.0 && verdict.plagiarism_percentage <= 94.0,
        "got {}",
        verdict.plagiarism_percentage
    );
    assert!(matches!(
        verdict.severity,
        Severity::Medium | Severity::High
    ));
}

#[tokio::test]
async fn scenario_exclusion_removes_source() {
    let h = harness();
    let content = source_paragraph();

    let outcome = h
        .ingestor
        .upload(upload("A", &content))
        .await
        .expect("upload should succeed");

    let verdict = h
        .detector
        .check(
            &content,
            &CheckOptions {
                exclude_docs: vec![outcome.document_id.clone()],
                ..Default::default()
            },
        )
        .await
        .expect("check should succeed");

    assert!(
        verdict
            .matches
            .iter()
            .all(|m| m.document_id != outcome.document_id)
    );
    assert_eq!(verdict.plagiarism_percentage, 0.0);
}

#[tokio::test]
async fn scenario_citation_penalty_caps_combined_score() {
    let h = harness();
    let content = source_paragraph();

    h.ingestor
        .upload(upload("A", &content))
        .await
        .expect("upload should succeed");

    let raw = h
        .detector
        .check(&content, &CheckOptions::default())
        .await
        .expect("check should succeed");
    let raw_combined = raw.chunk_analysis[0].max_similarity;

    let cited = format!("As stated in (Smith, 2020), {}", content);
    let penalized = h
        .detector
        .check(&cited, &CheckOptions::default())
        .await
        .expect("check should succeed");
    let penalized_combined = penalized.chunk_analysis[0].max_similarity;

    assert!(
        penalized_combined <= raw_combined * 0.85 + 1e-4,
        "penalized {} vs raw {}",
        penalized_combined,
        raw_combined
    );
}

#[tokio::test]
async fn scenario_trailing_runt_merges_into_single_chunk() {
    let h = harness();

    // chunk_size + min_chunk_size - 1 words under the default preset.
    let text = (0..129)
        .map(|i| format!("word{}", i))
        .collect::<Vec<_>>()
        .join(" ");

    let verdict = h
        .detector
        .check(&text, &CheckOptions::default())
        .await
        .expect("check should succeed");

    assert_eq!(verdict.chunk_analysis.len(), 1);
    assert_eq!(verdict.metrics.chunks_analyzed, 1);
}

#[tokio::test]
async fn roundtrip_upload_get_preserves_content() {
    let h = harness();
    let content = source_paragraph();

    let outcome = h
        .ingestor
        .upload(upload("A", &content))
        .await
        .expect("upload should succeed");

    let stored = h
        .index
        .get_document(&outcome.document_id, false)
        .await
        .expect("get should succeed")
        .expect("document exists");

    assert_eq!(stored.record.content, content);
    assert_eq!(stored.record.chunk_count, outcome.chunks_created);
}

#[tokio::test]
async fn roundtrip_delete_removes_from_detection() {
    let h = harness();
    let content = source_paragraph();

    let outcome = h
        .ingestor
        .upload(upload("A", &content))
        .await
        .expect("upload should succeed");

    let deleted = h
        .index
        .delete_document(&outcome.document_id)
        .await
        .expect("delete should succeed");
    assert!(deleted);

    let verdict = h
        .detector
        .check(&content, &CheckOptions::default())
        .await
        .expect("check should succeed");
    assert!(
        verdict
            .matches
            .iter()
            .all(|m| m.document_id != outcome.document_id)
    );

    // Deleting again is a no-op reported as failure.
    let deleted_again = h
        .index
        .delete_document(&outcome.document_id)
        .await
        .expect("delete should succeed");
    assert!(!deleted_again);
}
