use std::path::{Path, PathBuf};
use std::sync::Arc;

use sqlx::SqlitePool;

use crate::KnowledgeSettings;
use crate::embeddings::{Embedder, build_embedder};
use crate::errors::{KnowledgeError, KnowledgeResult};
use crate::ingest::{self, IngestReport};
use crate::search::{self, SearchHit};
use crate::storage::{self, KnowledgeStore};

/// Entry point for indexing and querying notes.
#[derive(Debug, Clone)]
pub struct KnowledgeEngine {
    settings: KnowledgeSettings,
    embedder: Arc<dyn Embedder>,
    store: KnowledgeStore,
}

impl KnowledgeEngine {
    /// Open the index with the embedder selected in `settings`.
    pub async fn open(settings: KnowledgeSettings) -> KnowledgeResult<Self> {
        let embedder = build_embedder(&settings);
        Self::with_embedder(settings, embedder).await
    }

    pub async fn with_embedder(
        settings: KnowledgeSettings,
        embedder: Arc<dyn Embedder>,
    ) -> KnowledgeResult<Self> {
        let path = knowledge_db_path(&settings)?;
        let store = KnowledgeStore::open(&path, settings.embedding_dim).await?;
        Ok(Self {
            settings,
            embedder,
            store,
        })
    }

    pub fn pool(&self) -> &SqlitePool {
        self.store.pool()
    }

    pub fn settings(&self) -> &KnowledgeSettings {
        &self.settings
    }

    pub fn embedder(&self) -> &dyn Embedder {
        self.embedder.as_ref()
    }

    pub fn db_path(&self) -> &Path {
        self.store.path()
    }

    /// Ingest `folder`, or the configured notes directory when `None`.
    pub async fn ingest_folder(&self, folder: Option<&Path>) -> KnowledgeResult<IngestReport> {
        let folder = folder.unwrap_or(&self.settings.notes_dir);
        ingest::ingest_folder(&self.settings, self.embedder(), self.pool(), folder).await
    }

    /// Closest chunks to `query`, de-duplicated, closest first.
    pub async fn query_notes(
        &self,
        query: &str,
        n_results: Option<usize>,
    ) -> KnowledgeResult<Vec<SearchHit>> {
        let limit = n_results.unwrap_or(self.settings.n_results);
        let hits = search::dense_search(
            self.embedder(),
            self.pool(),
            &self.settings.collection,
            query,
            limit,
        )
        .await?;
        tracing::debug!(query, hits = hits.len(), "query_notes");
        Ok(search::dedup_hits(hits))
    }

    /// Retrieved chunks formatted as a context block for the LLM.
    pub async fn rag_retrieve(
        &self,
        query: &str,
        n_results: Option<usize>,
    ) -> KnowledgeResult<String> {
        let hits = self.query_notes(query, n_results).await?;
        Ok(search::format_rag_context(&hits))
    }

    /// Drop the configured collection and everything indexed in it.
    pub async fn reset_collection(&self) -> KnowledgeResult<()> {
        let name = &self.settings.collection;
        if !storage::delete_collection(self.pool(), name).await? {
            return Err(KnowledgeError::CollectionNotFound(name.clone()));
        }
        tracing::info!(collection = %name, "collection reset");
        Ok(())
    }

    /// Number of chunks in the configured collection.
    pub async fn count(&self) -> KnowledgeResult<i64> {
        storage::count_chunks(self.pool(), Some(&self.settings.collection)).await
    }
}

pub fn knowledge_db_path(settings: &KnowledgeSettings) -> KnowledgeResult<PathBuf> {
    if let Some(path) = &settings.db_path_override {
        return Ok(path.clone());
    }
    second_brain_core::paths::default_db_path().map_err(|_| KnowledgeError::MissingDbPath)
}
