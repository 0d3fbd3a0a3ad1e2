use std::collections::HashMap;

use chrono::{Duration, Utc};

use super::client::DocumentIndex;
use super::mock::{MockIndex, cosine_similarity};
use super::model::{
    ChunkHit, ChunkRecord, DocumentQuery, DocumentRecord, KnnQuery, cap_per_source, point_id_for,
    postprocess_hits,
};

const DIMS: usize = 8;

fn test_vector(seed: u64) -> Vec<f32> {
    (0..DIMS as u64)
        .map(|i| {
            let mixed = (seed.wrapping_mul(31).wrapping_add(i)) % 1000;
            mixed as f32 / 1000.0
        })
        .collect()
}

fn test_document(id: &str, title: &str, age_minutes: i64) -> DocumentRecord {
    DocumentRecord {
        document_id: id.to_string(),
        title: title.to_string(),
        content: format!("content of {}", title),
        language: "en".to_string(),
        metadata: HashMap::new(),
        created_at: Utc::now() - Duration::minutes(age_minutes),
        chunk_count: 1,
    }
}

fn test_chunk(doc_id: &str, position: usize, seed: u64) -> ChunkRecord {
    ChunkRecord {
        chunk_id: ChunkRecord::id_for(doc_id, position),
        document_id: doc_id.to_string(),
        document_title: format!("title of {}", doc_id),
        text: format!("chunk {} of {}", position, doc_id),
        position,
        word_count: 4,
        embedding: test_vector(seed),
    }
}

fn knn_query(embedding: Vec<f32>) -> KnnQuery {
    KnnQuery {
        embedding,
        top_k: 10,
        min_score: 0.0,
        exclude_docs: Vec::new(),
        max_per_source: 3,
    }
}

#[tokio::test]
async fn test_upsert_and_get_roundtrip() {
    let index = MockIndex::new();

    let doc = test_document("doc-1", "First", 0);
    index
        .upsert_document(doc.clone(), vec![test_chunk("doc-1", 0, 1)])
        .await
        .expect("should upsert");

    let stored = index
        .get_document("doc-1", true)
        .await
        .expect("should read")
        .expect("document exists");

    assert_eq!(stored.record.title, "First");
    assert_eq!(stored.record.content, doc.content);
    assert_eq!(stored.chunks.len(), 1);
    assert_eq!(stored.chunks[0].chunk_id, "doc-1#0");
    assert!(stored.chunks[0].embedding.is_empty());
}

#[tokio::test]
async fn test_get_unknown_document() {
    let index = MockIndex::new();
    let stored = index.get_document("missing", false).await.expect("should read");
    assert!(stored.is_none());
}

#[tokio::test]
async fn test_delete_cascades_to_chunks() {
    let index = MockIndex::new();
    index
        .upsert_document(
            test_document("doc-1", "First", 0),
            vec![test_chunk("doc-1", 0, 1), test_chunk("doc-1", 1, 2)],
        )
        .await
        .unwrap();

    let deleted = index.delete_document("doc-1").await.expect("should delete");
    assert!(deleted);
    assert_eq!(index.chunk_count(), 0);

    let hits = index
        .knn_search(&knn_query(test_vector(1)))
        .await
        .expect("should search");
    assert!(hits.is_empty());
}

#[tokio::test]
async fn test_delete_unknown_returns_false() {
    let index = MockIndex::new();
    let deleted = index.delete_document("missing").await.expect("should not fail");
    assert!(!deleted);
    assert_eq!(index.document_count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_upsert_replaces_existing_chunks() {
    let index = MockIndex::new();
    index
        .upsert_document(
            test_document("doc-1", "First", 0),
            vec![test_chunk("doc-1", 0, 1), test_chunk("doc-1", 1, 2)],
        )
        .await
        .unwrap();
    index
        .upsert_document(test_document("doc-1", "First v2", 0), vec![test_chunk("doc-1", 0, 3)])
        .await
        .unwrap();

    assert_eq!(index.chunk_count(), 1);
    let stored = index.get_document("doc-1", false).await.unwrap().unwrap();
    assert_eq!(stored.record.title, "First v2");
}

#[tokio::test]
async fn test_search_documents_newest_first_with_pagination() {
    let index = MockIndex::new();
    for (i, age) in [30i64, 10, 20].into_iter().enumerate() {
        index
            .upsert_document(
                test_document(&format!("doc-{}", i), &format!("Title {}", i), age),
                vec![],
            )
            .await
            .unwrap();
    }

    let page = index
        .search_documents(&DocumentQuery {
            limit: 2,
            offset: 0,
            ..Default::default()
        })
        .await
        .expect("should list");

    assert_eq!(page.total, 3);
    assert_eq!(page.documents.len(), 2);
    // doc-1 is newest (age 10), then doc-2 (age 20).
    assert_eq!(page.documents[0].document_id, "doc-1");
    assert_eq!(page.documents[1].document_id, "doc-2");

    let rest = index
        .search_documents(&DocumentQuery {
            limit: 2,
            offset: 2,
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(rest.documents.len(), 1);
    assert_eq!(rest.documents[0].document_id, "doc-0");
}

#[tokio::test]
async fn test_search_documents_text_and_metadata_filters() {
    let index = MockIndex::new();

    let mut tagged = test_document("doc-a", "Solar energy report", 0);
    tagged.metadata.insert("course".to_string(), "phys101".to_string());
    index.upsert_document(tagged, vec![]).await.unwrap();
    index
        .upsert_document(test_document("doc-b", "Wind energy report", 0), vec![])
        .await
        .unwrap();

    let by_text = index
        .search_documents(&DocumentQuery {
            query: Some("solar".to_string()),
            limit: 10,
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(by_text.total, 1);
    assert_eq!(by_text.documents[0].document_id, "doc-a");

    let by_meta = index
        .search_documents(&DocumentQuery {
            filters: HashMap::from([("course".to_string(), "phys101".to_string())]),
            limit: 10,
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(by_meta.total, 1);

    let no_match = index
        .search_documents(&DocumentQuery {
            filters: HashMap::from([("course".to_string(), "chem200".to_string())]),
            limit: 10,
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(no_match.total, 0);
}

#[tokio::test]
async fn test_knn_orders_by_similarity() {
    let index = MockIndex::new();
    index
        .upsert_document(
            test_document("doc-1", "First", 0),
            vec![test_chunk("doc-1", 0, 1), test_chunk("doc-1", 1, 40)],
        )
        .await
        .unwrap();

    let hits = index
        .knn_search(&knn_query(test_vector(1)))
        .await
        .expect("should search");

    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].chunk_id, "doc-1#0");
    assert!(hits[0].score >= hits[1].score);
    assert!((hits[0].score - 1.0).abs() < 1e-5);
}

#[tokio::test]
async fn test_knn_excludes_documents() {
    let index = MockIndex::new();
    index
        .upsert_document(test_document("doc-1", "First", 0), vec![test_chunk("doc-1", 0, 1)])
        .await
        .unwrap();
    index
        .upsert_document(test_document("doc-2", "Second", 0), vec![test_chunk("doc-2", 0, 1)])
        .await
        .unwrap();

    let mut query = knn_query(test_vector(1));
    query.exclude_docs = vec!["doc-1".to_string()];

    let hits = index.knn_search(&query).await.expect("should search");
    assert!(!hits.is_empty());
    assert!(hits.iter().all(|h| h.document_id != "doc-1"));
}

#[tokio::test]
async fn test_knn_min_score_drops_weak_hits() {
    let index = MockIndex::new();
    index
        .upsert_document(test_document("doc-1", "First", 0), vec![test_chunk("doc-1", 0, 7)])
        .await
        .unwrap();

    let mut query = knn_query(test_vector(7));
    query.min_score = 0.999;

    let hits = index.knn_search(&query).await.expect("should search");
    assert_eq!(hits.len(), 1, "the identical vector must survive");

    // An orthogonal-ish query falls below the threshold entirely.
    let mut other = knn_query(vec![0.0; DIMS]);
    other.min_score = 0.999;
    let hits = index.knn_search(&other).await.expect("should search");
    assert!(hits.is_empty());
}

#[test]
fn test_postprocess_caps_per_source_and_truncates() {
    fn hit(doc: &str, pos: usize, score: f32) -> ChunkHit {
        ChunkHit {
            chunk_id: format!("{}#{}", doc, pos),
            document_id: doc.to_string(),
            document_title: String::new(),
            text: String::new(),
            position: pos,
            score,
        }
    }

    let hits = vec![
        hit("a", 0, 0.95),
        hit("a", 1, 0.94),
        hit("a", 2, 0.93),
        hit("a", 3, 0.92),
        hit("b", 0, 0.91),
        hit("b", 1, -0.5),
    ];

    let query = KnnQuery {
        embedding: vec![],
        top_k: 4,
        min_score: 0.5,
        exclude_docs: vec![],
        max_per_source: 2,
    };

    let processed = postprocess_hits(hits, &query);

    // Two from "a" (cap), one from "b" (negative clamped to 0 and dropped).
    assert_eq!(processed.len(), 3);
    assert_eq!(processed[0].chunk_id, "a#0");
    assert_eq!(processed[1].chunk_id, "a#1");
    assert_eq!(processed[2].chunk_id, "b#0");
}

#[test]
fn test_cap_per_source_preserves_order() {
    fn hit(doc: &str, pos: usize) -> ChunkHit {
        ChunkHit {
            chunk_id: format!("{}#{}", doc, pos),
            document_id: doc.to_string(),
            document_title: String::new(),
            text: String::new(),
            position: pos,
            score: 1.0,
        }
    }

    let capped = cap_per_source(
        vec![hit("a", 0), hit("b", 0), hit("a", 1), hit("a", 2), hit("b", 1)],
        1,
    );

    assert_eq!(capped.len(), 2);
    assert_eq!(capped[0].document_id, "a");
    assert_eq!(capped[1].document_id, "b");
}

#[test]
fn test_point_id_is_stable_and_distinct() {
    assert_eq!(point_id_for("doc-1"), point_id_for("doc-1"));
    assert_ne!(point_id_for("doc-1"), point_id_for("doc-2"));
    assert_ne!(point_id_for("doc-1#0"), point_id_for("doc-1#1"));
}

#[test]
fn test_cosine_similarity_basics() {
    let a = vec![1.0, 0.0];
    let b = vec![0.0, 1.0];
    assert!(cosine_similarity(&a, &a) > 0.999);
    assert!(cosine_similarity(&a, &b).abs() < 1e-6);
    assert_eq!(cosine_similarity(&a, &[]), 0.0);
}
