//! Knowledge system configuration types.
//!
//! These types define the resolved (non-optional) settings used by
//! `second-brain-knowledge`. They are created from the user-facing
//! `KnowledgeToolsSettings` TOML struct via `From`.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::settings::KnowledgeToolsSettings;

/// Which backend turns text into vectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmbeddingProviderKind {
    /// Ollama `/api/embed` endpoint
    Ollama,
    /// Deterministic feature hashing, no network
    Hashed,
}

impl EmbeddingProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmbeddingProviderKind::Ollama => "ollama",
            EmbeddingProviderKind::Hashed => "hashed",
        }
    }
}

impl std::str::FromStr for EmbeddingProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ollama" => Ok(EmbeddingProviderKind::Ollama),
            "hashed" | "hash" => Ok(EmbeddingProviderKind::Hashed),
            other => Err(format!("Unknown embedding provider: {}", other)),
        }
    }
}

/// Resolved knowledge engine settings (all values filled with defaults).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeSettings {
    #[serde(default = "default_notes_dir")]
    pub notes_dir: PathBuf,
    /// Index DB location; `None` resolves under the data root.
    #[serde(default)]
    pub db_path_override: Option<PathBuf>,
    #[serde(default = "default_collection")]
    pub collection: String,
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
    #[serde(default = "default_n_results")]
    pub n_results: usize,
    #[serde(default = "default_snippet_chars")]
    pub snippet_chars: usize,
    #[serde(default = "default_embedding_provider")]
    pub embedding_provider: EmbeddingProviderKind,
    #[serde(default = "default_embedding_url")]
    pub embedding_url: String,
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,
    #[serde(default)]
    pub embedding_dim: Option<usize>,
    #[serde(default = "default_embedding_batch")]
    pub embedding_batch: usize,
}

impl Default for KnowledgeSettings {
    fn default() -> Self {
        Self {
            notes_dir: default_notes_dir(),
            db_path_override: None,
            collection: default_collection(),
            extensions: default_extensions(),
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
            n_results: default_n_results(),
            snippet_chars: default_snippet_chars(),
            embedding_provider: default_embedding_provider(),
            embedding_url: default_embedding_url(),
            embedding_model: default_embedding_model(),
            embedding_dim: None,
            embedding_batch: default_embedding_batch(),
        }
    }
}

fn default_notes_dir() -> PathBuf {
    PathBuf::from("data/notes")
}

fn default_collection() -> String {
    "notes".to_string()
}

fn default_extensions() -> Vec<String> {
    vec!["txt".to_string()]
}

fn default_chunk_size() -> usize {
    500
}

fn default_chunk_overlap() -> usize {
    50
}

fn default_n_results() -> usize {
    3
}

fn default_snippet_chars() -> usize {
    400
}

fn default_embedding_provider() -> EmbeddingProviderKind {
    EmbeddingProviderKind::Ollama
}

fn default_embedding_url() -> String {
    "http://127.0.0.1:11434".to_string()
}

fn default_embedding_model() -> String {
    "all-minilm".to_string()
}

fn default_embedding_batch() -> usize {
    32
}

impl From<&KnowledgeToolsSettings> for KnowledgeSettings {
    fn from(value: &KnowledgeToolsSettings) -> Self {
        let mut settings = KnowledgeSettings::default();
        if let Some(dir) = &value.notes_dir {
            settings.notes_dir = PathBuf::from(dir);
        }
        if let Some(path) = &value.db_path {
            settings.db_path_override = Some(PathBuf::from(path));
        }
        if let Some(collection) = value.collection.as_deref().map(str::trim)
            && !collection.is_empty()
        {
            settings.collection = collection.to_string();
        }
        if let Some(extensions) = &value.extensions {
            settings.extensions = extensions
                .iter()
                .map(|ext| ext.trim().trim_start_matches('.').to_lowercase())
                .filter(|ext| !ext.is_empty())
                .collect();
        }
        if let Some(size) = value.chunk_size {
            settings.chunk_size = size.max(1);
        }
        if let Some(overlap) = value.chunk_overlap {
            settings.chunk_overlap = overlap;
        }
        if let Some(n) = value.n_results {
            settings.n_results = n.max(1);
        }
        if let Some(chars) = value.snippet_chars {
            settings.snippet_chars = chars;
        }
        if let Some(provider) = &value.embedding_provider {
            match provider.parse() {
                Ok(kind) => settings.embedding_provider = kind,
                Err(e) => tracing::warn!("{}; keeping {}", e, settings.embedding_provider.as_str()),
            }
        }
        if let Some(url) = &value.embedding_url {
            settings.embedding_url = url.clone();
        }
        if let Some(model) = &value.embedding_model {
            settings.embedding_model = model.clone();
        }
        if let Some(dim) = value.embedding_dim {
            settings.embedding_dim = Some(dim);
        }
        if let Some(batch) = value.embedding_batch {
            settings.embedding_batch = batch;
        }
        if settings.chunk_overlap >= settings.chunk_size {
            tracing::warn!(
                "chunk_overlap {} is not smaller than chunk_size {}; clamping",
                settings.chunk_overlap,
                settings.chunk_size
            );
            settings.chunk_overlap = settings.chunk_size / 2;
        }
        settings
    }
}
