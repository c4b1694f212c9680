//! Requires a running Ollama with the configured embedding model.
//!
//! Run with: cargo test -p second-brain-knowledge --features live-tests

#![cfg(feature = "live-tests")]

use second_brain_knowledge::{Embedder, EmbeddingClient, KnowledgeSettings};

#[tokio::test]
async fn test_ollama_embedding_live() {
    let settings = KnowledgeSettings::default();
    let client = EmbeddingClient::new(&settings);
    let inputs = vec!["hello world".to_string(), "second brain notes".to_string()];

    let embeddings = client.embed_batch(&inputs).await.expect("embedding request");
    assert_eq!(embeddings.len(), inputs.len());
    let dim = embeddings[0].len();
    assert!(dim > 0);
    assert!(embeddings.iter().all(|vec| vec.len() == dim));
}
