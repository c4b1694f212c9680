use std::sync::Arc;

use serde::Deserialize;
use sha2::{Digest, Sha256};

use crate::KnowledgeSettings;
use crate::errors::{KnowledgeError, KnowledgeResult};
use second_brain_core::EmbeddingProviderKind;

/// Turns text into dense vectors.
#[async_trait::async_trait]
pub trait Embedder: Send + Sync + std::fmt::Debug {
    /// Identifier of the embedding model, stored alongside the index.
    fn model_id(&self) -> &str;

    async fn embed_batch(&self, inputs: &[String]) -> KnowledgeResult<Vec<Vec<f32>>>;
}

pub fn build_embedder(settings: &KnowledgeSettings) -> Arc<dyn Embedder> {
    match settings.embedding_provider {
        EmbeddingProviderKind::Ollama => Arc::new(EmbeddingClient::new(settings)),
        EmbeddingProviderKind::Hashed => Arc::new(HashedEmbedder::new(
            settings.embedding_dim.unwrap_or(HashedEmbedder::DEFAULT_DIM),
        )),
    }
}

/// Client for the Ollama `/api/embed` endpoint.
#[derive(Debug, Clone)]
pub struct EmbeddingClient {
    base_url: String,
    model: String,
    client: reqwest::Client,
}

impl EmbeddingClient {
    pub fn new(settings: &KnowledgeSettings) -> Self {
        Self {
            base_url: settings.embedding_url.trim_end_matches('/').to_string(),
            model: settings.embedding_model.clone(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait::async_trait]
impl Embedder for EmbeddingClient {
    fn model_id(&self) -> &str {
        &self.model
    }

    async fn embed_batch(&self, inputs: &[String]) -> KnowledgeResult<Vec<Vec<f32>>> {
        if inputs.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!("{}/api/embed", self.base_url);
        let body = EmbedRequest {
            model: &self.model,
            input: inputs,
        };

        let response = self.client.post(&url).json(&body).send().await?;
        let status = response.status();
        let text = response.text().await?;
        parse_embed_response(status, &text, inputs.len())
    }
}

/// Decode an `/api/embed` reply for a batch of `expected` inputs. Accepts
/// the `embeddings` array and the legacy single `embedding` field.
fn parse_embed_response(
    status: reqwest::StatusCode,
    body: &str,
    expected: usize,
) -> KnowledgeResult<Vec<Vec<f32>>> {
    if !status.is_success() {
        return Err(KnowledgeError::Embedding(format!(
            "embedding request failed: {status} {body}"
        )));
    }

    let payload: EmbedResponse = serde_json::from_str(body)
        .map_err(|e| KnowledgeError::Embedding(format!("invalid embedding response: {e}")))?;

    let embeddings = match (payload.embeddings, payload.embedding) {
        (Some(embeddings), _) => embeddings,
        (None, Some(embedding)) => vec![embedding],
        (None, None) => {
            return Err(KnowledgeError::Embedding(
                "embedding response missing vectors".to_string(),
            ));
        }
    };

    if embeddings.len() != expected {
        return Err(KnowledgeError::Embedding(format!(
            "expected {} embeddings, got {}",
            expected,
            embeddings.len()
        )));
    }
    Ok(embeddings)
}

#[derive(Debug, Clone, serde::Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Clone, Deserialize)]
struct EmbedResponse {
    embeddings: Option<Vec<Vec<f32>>>,
    embedding: Option<Vec<f32>>,
}

/// Offline embedder: hashes lower-cased word tokens into `dim` signed
/// buckets and L2-normalizes the result. Texts sharing words land close
/// together, which is enough for keyword-ish retrieval without a model.
#[derive(Debug, Clone)]
pub struct HashedEmbedder {
    dim: usize,
    model_id: String,
}

impl HashedEmbedder {
    pub const DEFAULT_DIM: usize = 384;

    pub fn new(dim: usize) -> Self {
        let dim = dim.max(1);
        Self {
            dim,
            model_id: format!("hashed-{dim}"),
        }
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    fn embed_one(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dim];
        for token in tokenize(text) {
            let digest = Sha256::digest(token.as_bytes());
            let mut bucket_bytes = [0u8; 8];
            bucket_bytes.copy_from_slice(&digest[..8]);
            let bucket = (u64::from_le_bytes(bucket_bytes) % self.dim as u64) as usize;
            let sign = if digest[8] & 1 == 0 { 1.0 } else { -1.0 };
            vector[bucket] += sign;
        }

        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut vector {
                *v /= norm;
            }
        }
        vector
    }
}

#[async_trait::async_trait]
impl Embedder for HashedEmbedder {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    async fn embed_batch(&self, inputs: &[String]) -> KnowledgeResult<Vec<Vec<f32>>> {
        Ok(inputs.iter().map(|input| self.embed_one(input)).collect())
    }
}

fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .map(str::to_lowercase)
}
