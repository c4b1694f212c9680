use std::path::{Path, PathBuf};

use serde::Serialize;
use sha2::{Digest, Sha256};
use sqlx::SqlitePool;
use walkdir::WalkDir;

use crate::KnowledgeSettings;
use crate::chunker::{Chunk, RecursiveSplitter};
use crate::embeddings::Embedder;
use crate::errors::{KnowledgeError, KnowledgeResult};
use crate::storage::{
    ChunkRecord, SourceRecord, ensure_collection, ensure_vec_table_dim, replace_source_chunks,
    source_hash,
};

/// Outcome for one file of an ingest run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IngestedFile {
    pub filename: String,
    pub chunks: usize,
    /// Content unchanged since the previous run.
    pub skipped: bool,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct IngestReport {
    pub collection: String,
    pub files: Vec<IngestedFile>,
}

impl IngestReport {
    pub fn ingested(&self) -> impl Iterator<Item = &IngestedFile> {
        self.files.iter().filter(|f| !f.skipped)
    }

    pub fn skipped_count(&self) -> usize {
        self.files.iter().filter(|f| f.skipped).count()
    }

    pub fn total_chunks(&self) -> usize {
        self.ingested().map(|f| f.chunks).sum()
    }
}

/// Index every matching file directly inside `folder` into the configured
/// collection.
pub async fn ingest_folder(
    settings: &KnowledgeSettings,
    embedder: &dyn Embedder,
    pool: &SqlitePool,
    folder: &Path,
) -> KnowledgeResult<IngestReport> {
    if !folder.is_dir() {
        return Err(KnowledgeError::NotesDirNotFound(folder.to_path_buf()));
    }

    let files = list_note_files(folder, &settings.extensions)?;
    ensure_collection(pool, &settings.collection, embedder.model_id()).await?;
    let splitter = RecursiveSplitter::new(settings.chunk_size, settings.chunk_overlap);

    let mut report = IngestReport {
        collection: settings.collection.clone(),
        files: Vec::with_capacity(files.len()),
    };

    for path in files {
        let entry = ingest_file(settings, embedder, pool, &splitter, &path).await?;
        report.files.push(entry);
    }

    tracing::info!(
        collection = %report.collection,
        files = report.files.len(),
        skipped = report.skipped_count(),
        chunks = report.total_chunks(),
        "ingest finished"
    );
    Ok(report)
}

async fn ingest_file(
    settings: &KnowledgeSettings,
    embedder: &dyn Embedder,
    pool: &SqlitePool,
    splitter: &RecursiveSplitter,
    path: &Path,
) -> KnowledgeResult<IngestedFile> {
    let raw = tokio::fs::read_to_string(path).await?;
    let filename = path
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_default();
    let stem = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().to_string())
        .unwrap_or_else(|| filename.clone());
    let hash = compute_hash(&raw);

    let chunks = splitter.chunk(&raw);
    if source_hash(pool, &settings.collection, &filename).await?.as_deref() == Some(hash.as_str()) {
        tracing::info!("Skipping {} (unchanged)", filename);
        return Ok(IngestedFile {
            filename,
            chunks: chunks.len(),
            skipped: true,
        });
    }

    tracing::info!("Splitting {} into {} chunks", filename, chunks.len());
    let records = chunk_records(&stem, &chunks);
    let embeddings = embed_chunks(settings, embedder, pool, &chunks).await?;

    let source = SourceRecord {
        collection: settings.collection.clone(),
        filename: filename.clone(),
        path: path.to_path_buf(),
        content_hash: hash,
    };
    replace_source_chunks(pool, &source, &records, &embeddings, embedder.model_id()).await?;

    tracing::info!("Ingested {} ({} chunks)", filename, chunks.len());
    Ok(IngestedFile {
        filename,
        chunks: chunks.len(),
        skipped: false,
    })
}

fn list_note_files(folder: &Path, extensions: &[String]) -> KnowledgeResult<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(folder)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.map_err(std::io::Error::from)?;
        if !entry.file_type().is_file() {
            continue;
        }
        let matches = entry
            .path()
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| extensions.iter().any(|allowed| allowed.eq_ignore_ascii_case(ext)));
        if matches {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

fn chunk_records(stem: &str, chunks: &[Chunk]) -> Vec<ChunkRecord> {
    chunks
        .iter()
        .map(|chunk| ChunkRecord {
            doc_id: format!("{}_{}", stem, chunk.index),
            chunk_index: chunk.index as i64,
            content: chunk.content.clone(),
            content_hash: compute_hash(&chunk.content),
        })
        .collect()
}

async fn embed_chunks(
    settings: &KnowledgeSettings,
    embedder: &dyn Embedder,
    pool: &SqlitePool,
    chunks: &[Chunk],
) -> KnowledgeResult<Vec<Vec<f32>>> {
    let batch_size = settings.embedding_batch.max(1);
    let mut embeddings = Vec::with_capacity(chunks.len());

    for batch in chunks.chunks(batch_size) {
        let inputs = batch
            .iter()
            .map(|chunk| chunk.content.clone())
            .collect::<Vec<_>>();
        let vectors = embedder.embed_batch(&inputs).await?;
        if vectors.len() != inputs.len() {
            return Err(KnowledgeError::Embedding(format!(
                "expected {} embeddings, got {}",
                inputs.len(),
                vectors.len()
            )));
        }
        embeddings.extend(vectors);
    }

    if let Some(first) = embeddings.first() {
        let dim = first.len();
        if let Some(expected) = settings.embedding_dim
            && expected != dim
        {
            return Err(KnowledgeError::EmbeddingDimMismatch {
                expected,
                actual: dim,
            });
        }
        if let Some(bad) = embeddings.iter().find(|v| v.len() != dim) {
            return Err(KnowledgeError::EmbeddingDimMismatch {
                expected: dim,
                actual: bad.len(),
            });
        }
        ensure_vec_table_dim(pool, dim).await?;
    }

    Ok(embeddings)
}

pub(crate) fn compute_hash(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}
