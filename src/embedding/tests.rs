use super::*;

const DIMS: usize = 64;

#[tokio::test]
async fn test_mock_embed_batch_is_deterministic() {
    let embedder = MockEmbedder::new(DIMS);
    let texts = vec!["alpha beta gamma".to_string(), "alpha beta gamma".to_string()];

    let vectors = embedder.embed_batch(&texts).await.expect("should embed");

    assert_eq!(vectors.len(), 2);
    assert_eq!(vectors[0], vectors[1]);
    assert_eq!(vectors[0].len(), DIMS);
}

#[tokio::test]
async fn test_mock_embed_overlap_tracks_token_overlap() {
    let embedder = MockEmbedder::new(DIMS);

    let same = cosine(
        &embedder.embed_one("the quick brown fox"),
        &embedder.embed_one("the quick brown fox"),
    );
    let close = cosine(
        &embedder.embed_one("the quick brown fox jumps high"),
        &embedder.embed_one("the quick brown fox sleeps low"),
    );
    let far = cosine(
        &embedder.embed_one("the quick brown fox"),
        &embedder.embed_one("completely unrelated sentence here"),
    );

    assert!((same - 1.0).abs() < 1e-6);
    assert!(close > far);
    assert!(close > 0.5);
}

#[tokio::test]
async fn test_mock_empty_batch() {
    let embedder = MockEmbedder::new(DIMS);
    let vectors = embedder.embed_batch(&[]).await.expect("should embed");
    assert!(vectors.is_empty());
}

#[tokio::test]
async fn test_mock_failure_mode() {
    let embedder = MockEmbedder::new(DIMS);
    embedder.set_failing(true);

    let result = embedder.embed_batch(&["text".to_string()]).await;
    assert!(matches!(result, Err(EmbeddingError::Unavailable { .. })));

    embedder.set_failing(false);
    assert!(embedder.embed_batch(&["text".to_string()]).await.is_ok());
}

#[tokio::test]
async fn test_mock_health_check() {
    let embedder = MockEmbedder::new(DIMS);
    let health = embedder.health_check().await.expect("should probe");
    assert!(health.embed_model_available);
}

fn cosine(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let na: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let nb: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if na == 0.0 || nb == 0.0 { 0.0 } else { dot / (na * nb) }
}
