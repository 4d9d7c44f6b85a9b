use ragfuse_core::config::{EmbeddingSettings, LlmSettings};
use ragfuse_core::traits::Embedder;
use ragfuse_embed::{get_default_embedder, AnyEmbedder, FakeEmbedder};

#[tokio::test]
async fn fake_embedder_shapes_and_determinism() {
    let embedder = FakeEmbedder::new(64);
    let texts = vec!["hello world".to_string(), "Hello, world!".to_string()];
    let embs = embedder.embed_batch(&texts).await.expect("embed_batch");
    let v1 = &embs[0];
    let v2 = &embs[1];

    assert_eq!(v1.len(), 64, "embedding dim is 64");

    let norm: f32 = v1.iter().map(|x| x * x).sum::<f32>().sqrt();
    assert!((norm - 1.0).abs() <= 1e-3, "vector is L2-normalized (norm={norm})");

    // punctuation and case do not change the vector
    for (a, b) in v1.iter().zip(v2.iter()) { assert!((a - b).abs() <= 1e-6); }
}

#[test]
fn fake_provider_is_selected_from_settings() {
    let embedding = EmbeddingSettings { provider: "fake".to_string(), dim: 32, ..EmbeddingSettings::default() };
    let embedder = get_default_embedder(&embedding, &LlmSettings::default()).expect("embedder");
    assert!(matches!(embedder, AnyEmbedder::Fake(_)));
    assert_eq!(embedder.embedder_id(), "fake:d32");
}

#[test]
fn unknown_provider_is_rejected() {
    std::env::remove_var("APP_USE_FAKE_EMBEDDINGS");
    let embedding = EmbeddingSettings { provider: "openai".to_string(), ..EmbeddingSettings::default() };
    assert!(get_default_embedder(&embedding, &LlmSettings::default()).is_err());
}
