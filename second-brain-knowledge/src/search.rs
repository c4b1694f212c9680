use std::collections::HashSet;

use serde::Serialize;
use sqlx::SqlitePool;

use crate::embeddings::Embedder;
use crate::errors::{KnowledgeError, KnowledgeResult};
use crate::storage::vec_table_exists;

pub const NO_RELEVANT_NOTES: &str = "No relevant information found in your knowledge base.";
const RAG_HEADER: &str = "Here are some relevant notes from your knowledge base:\n\n";
const RAG_SEPARATOR: &str = "\n---\n";

/// vec0 rejects larger `k` values.
const MAX_KNN_K: usize = 4096;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    pub doc_id: String,
    pub filename: String,
    pub chunk_index: i64,
    pub content: String,
    pub distance: f32,
}

impl SearchHit {
    /// The first `max_chars` characters of the chunk.
    pub fn snippet(&self, max_chars: usize) -> &str {
        match self.content.char_indices().nth(max_chars) {
            Some((byte_idx, _)) => &self.content[..byte_idx],
            None => &self.content,
        }
    }
}

/// Nearest chunks of `collection` to `query`, closest first.
pub(crate) async fn dense_search(
    embedder: &dyn Embedder,
    pool: &SqlitePool,
    collection: &str,
    query: &str,
    limit: usize,
) -> KnowledgeResult<Vec<SearchHit>> {
    if limit == 0 || !vec_table_exists(pool).await? {
        return Ok(Vec::new());
    }

    let embeddings = embedder.embed_batch(&[query.to_string()]).await?;
    let Some(embedding) = embeddings.first() else {
        return Ok(Vec::new());
    };
    let payload = serde_json::to_string(embedding)
        .map_err(|e| KnowledgeError::Embedding(format!("embedding serialize failed: {e}")))?;

    // KNN must run in a CTE with `k = ?` because vec0 cannot see LIMIT
    // through JOINs. The collection is the vec0 partition key, so the
    // neighbours all come from it.
    let knn_k = limit.min(MAX_KNN_K);

    let rows = sqlx::query_as::<_, (String, String, i64, String, f32)>(
        "WITH knn AS (SELECT rowid, distance FROM chunk_vec \
                      WHERE embedding MATCH ? AND k = ? AND collection = ?) \
         SELECT c.doc_id, c.filename, c.chunk_index, c.content, knn.distance FROM knn \
         JOIN chunks c ON c.id = knn.rowid \
         ORDER BY knn.distance ASC LIMIT ?",
    )
    .bind(&payload)
    .bind(knn_k as i64)
    .bind(collection)
    .bind(limit as i64)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(doc_id, filename, chunk_index, content, distance)| SearchHit {
            doc_id,
            filename,
            chunk_index,
            content,
            distance,
        })
        .collect())
}

/// Keep the first hit for each `(filename, chunk_index)` pair.
pub fn dedup_hits(hits: Vec<SearchHit>) -> Vec<SearchHit> {
    let mut seen = HashSet::new();
    hits.into_iter()
        .filter(|hit| seen.insert(format!("{}_{}", hit.filename, hit.chunk_index)))
        .collect()
}

/// Render hits as the knowledge block handed to the LLM.
pub fn format_rag_context(hits: &[SearchHit]) -> String {
    if hits.is_empty() {
        return NO_RELEVANT_NOTES.to_string();
    }

    let blocks = hits
        .iter()
        .map(|hit| format!("[Source: {}]\n{}\n", hit.filename, hit.content.trim()))
        .collect::<Vec<_>>();

    format!("{}{}\n", RAG_HEADER, blocks.join(RAG_SEPARATOR))
}
