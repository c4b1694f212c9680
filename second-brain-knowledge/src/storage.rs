use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use chrono::Utc;
use libsqlite3_sys::{SQLITE_OK, sqlite3_auto_extension};
use sqlite_vec::sqlite3_vec_init;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{SqliteConnection, SqlitePool};

use crate::errors::{KnowledgeError, KnowledgeResult};

static SQLITE_VEC_INIT_RC: OnceLock<i32> = OnceLock::new();

#[derive(Debug, Clone)]
pub struct KnowledgeStore {
    pool: SqlitePool,
    path: PathBuf,
}

impl KnowledgeStore {
    pub async fn open(db_path: &Path, embedding_dim: Option<usize>) -> KnowledgeResult<Self> {
        init_sqlite_vec_once()?;
        if let Some(parent) = db_path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }

        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .after_connect(move |conn, _meta| {
                Box::pin(async move {
                    sqlx::query("PRAGMA journal_mode = WAL")
                        .execute(&mut *conn)
                        .await?;
                    sqlx::query("PRAGMA synchronous = NORMAL")
                        .execute(&mut *conn)
                        .await?;
                    Ok(())
                })
            })
            .connect_with(options)
            .await?;

        run_migrations(&pool).await?;
        if let Some(dimension) = stored_embedding_dim(&pool).await?.or(embedding_dim) {
            ensure_vec_table_dim(&pool, dimension).await?;
        }

        tracing::debug!(path = %db_path.display(), "opened knowledge store");
        Ok(Self {
            pool,
            path: db_path.to_path_buf(),
        })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn init_sqlite_vec_once() -> KnowledgeResult<()> {
    let rc = *SQLITE_VEC_INIT_RC.get_or_init(|| unsafe {
        sqlite3_auto_extension(Some(std::mem::transmute(sqlite3_vec_init as *const ())))
    });

    if rc == SQLITE_OK {
        Ok(())
    } else {
        Err(KnowledgeError::SqliteVec(format!(
            "sqlite-vec init failed with code {rc}"
        )))
    }
}

async fn run_migrations(pool: &SqlitePool) -> KnowledgeResult<()> {
    sqlx::migrate!("./migrations/knowledge").run(pool).await?;
    Ok(())
}

pub async fn stored_embedding_dim(pool: &SqlitePool) -> KnowledgeResult<Option<usize>> {
    let existing: Option<(String,)> =
        sqlx::query_as("SELECT value FROM meta WHERE key = 'embedding_dim' LIMIT 1")
            .fetch_optional(pool)
            .await?;
    Ok(existing.and_then(|(value,)| value.parse::<usize>().ok()))
}

pub async fn vec_table_exists(pool: &SqlitePool) -> KnowledgeResult<bool> {
    let table: Option<(String,)> = sqlx::query_as(
        "SELECT name FROM sqlite_master WHERE type = 'table' AND name = 'chunk_vec'",
    )
    .fetch_optional(pool)
    .await?;
    Ok(table.is_some())
}

/// Create the vector table for `dimension`, or fail if the index was built
/// with a different one.
pub async fn ensure_vec_table_dim(pool: &SqlitePool, dimension: usize) -> KnowledgeResult<()> {
    if let Some(expected) = stored_embedding_dim(pool).await?
        && expected != dimension
        && vec_table_exists(pool).await?
    {
        return Err(KnowledgeError::EmbeddingDimMismatch {
            expected,
            actual: dimension,
        });
    }

    if !vec_table_exists(pool).await? {
        let create_sql = format!(
            "CREATE VIRTUAL TABLE IF NOT EXISTS chunk_vec USING vec0(collection text partition key, embedding float[{}])",
            dimension
        );
        sqlx::query(&create_sql).execute(pool).await?;
    }

    sqlx::query("INSERT OR REPLACE INTO meta (key, value) VALUES ('embedding_dim', ?)")
        .bind(dimension.to_string())
        .execute(pool)
        .await?;

    Ok(())
}

pub async fn ensure_collection(
    pool: &SqlitePool,
    name: &str,
    embedding_model: &str,
) -> KnowledgeResult<()> {
    sqlx::query(
        "INSERT OR IGNORE INTO collections (name, embedding_model, created_at) VALUES (?, ?, ?)",
    )
    .bind(name)
    .bind(embedding_model)
    .bind(Utc::now().to_rfc3339())
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn collection_exists(pool: &SqlitePool, name: &str) -> KnowledgeResult<bool> {
    let row: Option<(String,)> = sqlx::query_as("SELECT name FROM collections WHERE name = ?")
        .bind(name)
        .fetch_optional(pool)
        .await?;
    Ok(row.is_some())
}

/// Remove a collection with its chunks, vectors and sources.
///
/// Returns `false` when the collection did not exist. Once the database
/// holds no chunks at all, the vector table and its recorded dimension are
/// dropped too.
pub async fn delete_collection(pool: &SqlitePool, name: &str) -> KnowledgeResult<bool> {
    if !collection_exists(pool, name).await? {
        return Ok(false);
    }

    let has_vec = vec_table_exists(pool).await?;
    let mut tx = pool.begin().await?;
    if has_vec {
        sqlx::query(
            "DELETE FROM chunk_vec WHERE rowid IN (SELECT id FROM chunks WHERE collection = ?)",
        )
        .bind(name)
        .execute(&mut *tx)
        .await?;
    }
    sqlx::query("DELETE FROM chunks WHERE collection = ?")
        .bind(name)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM sources WHERE collection = ?")
        .bind(name)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM collections WHERE name = ?")
        .bind(name)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    if count_chunks(pool, None).await? == 0 {
        sqlx::query("DROP TABLE IF EXISTS chunk_vec")
            .execute(pool)
            .await?;
        sqlx::query("DELETE FROM meta WHERE key = 'embedding_dim'")
            .execute(pool)
            .await?;
    }

    Ok(true)
}

#[derive(Debug, Clone)]
pub struct SourceRecord {
    pub collection: String,
    pub filename: String,
    pub path: PathBuf,
    pub content_hash: String,
}

#[derive(Debug, Clone)]
pub struct ChunkRecord {
    pub doc_id: String,
    pub chunk_index: i64,
    pub content: String,
    pub content_hash: String,
}

pub async fn source_hash(
    pool: &SqlitePool,
    collection: &str,
    filename: &str,
) -> KnowledgeResult<Option<String>> {
    let row: Option<(String,)> = sqlx::query_as(
        "SELECT content_hash FROM sources WHERE collection = ? AND filename = ?",
    )
    .bind(collection)
    .bind(filename)
    .fetch_optional(pool)
    .await?;
    Ok(row.map(|(hash,)| hash))
}

/// Replace every chunk of one source file, vectors included, in a single
/// transaction. `embeddings` is parallel to `chunks`.
pub async fn replace_source_chunks(
    pool: &SqlitePool,
    source: &SourceRecord,
    chunks: &[ChunkRecord],
    embeddings: &[Vec<f32>],
    embedding_model: &str,
) -> KnowledgeResult<Vec<i64>> {
    if chunks.len() != embeddings.len() {
        return Err(KnowledgeError::Embedding(format!(
            "{} chunks but {} embeddings for {}",
            chunks.len(),
            embeddings.len(),
            source.filename
        )));
    }

    let has_vec = vec_table_exists(pool).await?;
    let now = Utc::now().to_rfc3339();
    let mut tx = pool.begin().await?;

    if has_vec {
        sqlx::query(
            "DELETE FROM chunk_vec WHERE rowid IN (SELECT id FROM chunks WHERE collection = ? AND filename = ?)",
        )
        .bind(&source.collection)
        .bind(&source.filename)
        .execute(&mut *tx)
        .await?;
    }
    sqlx::query("DELETE FROM chunks WHERE collection = ? AND filename = ?")
        .bind(&source.collection)
        .bind(&source.filename)
        .execute(&mut *tx)
        .await?;

    let mut ids = Vec::with_capacity(chunks.len());
    for (chunk, embedding) in chunks.iter().zip(embeddings) {
        // Chunks are keyed by file, so `plan.md` and `plan.txt` may share a doc_id.
        let (chunk_id,): (i64,) = sqlx::query_as(
            r#"INSERT INTO chunks (collection, doc_id, filename, chunk_index, content, content_hash, embedding_model, updated_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?)
               RETURNING id"#,
        )
        .bind(&source.collection)
        .bind(&chunk.doc_id)
        .bind(&source.filename)
        .bind(chunk.chunk_index)
        .bind(&chunk.content)
        .bind(&chunk.content_hash)
        .bind(embedding_model)
        .bind(&now)
        .fetch_one(&mut *tx)
        .await?;

        upsert_vec(&mut tx, chunk_id, &source.collection, embedding).await?;
        ids.push(chunk_id);
    }

    sqlx::query(
        r#"INSERT INTO sources (collection, filename, path, content_hash, chunk_count, updated_at)
           VALUES (?, ?, ?, ?, ?, ?)
           ON CONFLICT(collection, filename) DO UPDATE SET
               path=excluded.path,
               content_hash=excluded.content_hash,
               chunk_count=excluded.chunk_count,
               updated_at=excluded.updated_at"#,
    )
    .bind(&source.collection)
    .bind(&source.filename)
    .bind(source.path.to_string_lossy().to_string())
    .bind(&source.content_hash)
    .bind(chunks.len() as i64)
    .bind(&now)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(ids)
}

/// Store the vector of `chunk_id` in the `collection` partition. vec0 has
/// no `OR REPLACE`, so an existing row is deleted first.
pub async fn upsert_vec(
    conn: &mut SqliteConnection,
    chunk_id: i64,
    collection: &str,
    embedding: &[f32],
) -> KnowledgeResult<()> {
    let payload = serde_json::to_string(embedding)
        .map_err(|e| KnowledgeError::Embedding(format!("embedding serialize failed: {e}")))?;

    sqlx::query("DELETE FROM chunk_vec WHERE rowid = ?")
        .bind(chunk_id)
        .execute(&mut *conn)
        .await?;
    sqlx::query("INSERT INTO chunk_vec(rowid, collection, embedding) VALUES (?, ?, ?)")
        .bind(chunk_id)
        .bind(collection)
        .bind(payload)
        .execute(&mut *conn)
        .await?;

    Ok(())
}

/// Count chunks in one collection, or in the whole database.
pub async fn count_chunks(pool: &SqlitePool, collection: Option<&str>) -> KnowledgeResult<i64> {
    let (count,): (i64,) = match collection {
        Some(name) => {
            sqlx::query_as("SELECT COUNT(*) FROM chunks WHERE collection = ?")
                .bind(name)
                .fetch_one(pool)
                .await?
        }
        None => {
            sqlx::query_as("SELECT COUNT(*) FROM chunks")
                .fetch_one(pool)
                .await?
        }
    };
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn open_temp() -> (tempfile::TempDir, KnowledgeStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = KnowledgeStore::open(&dir.path().join("index.sqlite3"), None)
            .await
            .unwrap();
        (dir, store)
    }

    fn record(doc_id: &str, index: i64, content: &str) -> ChunkRecord {
        ChunkRecord {
            doc_id: doc_id.to_string(),
            chunk_index: index,
            content: content.to_string(),
            content_hash: format!("hash-{doc_id}"),
        }
    }

    fn source(collection: &str, filename: &str) -> SourceRecord {
        SourceRecord {
            collection: collection.to_string(),
            filename: filename.to_string(),
            path: PathBuf::from(filename),
            content_hash: "abc".to_string(),
        }
    }

    #[tokio::test]
    async fn vec_table_is_created_lazily() {
        let (_dir, store) = open_temp().await;
        let pool = store.pool();
        assert!(!vec_table_exists(pool).await.unwrap());

        ensure_vec_table_dim(pool, 3).await.unwrap();
        assert!(vec_table_exists(pool).await.unwrap());
        assert_eq!(stored_embedding_dim(pool).await.unwrap(), Some(3));

        let err = ensure_vec_table_dim(pool, 4).await.unwrap_err();
        assert!(matches!(
            err,
            KnowledgeError::EmbeddingDimMismatch { expected: 3, actual: 4 }
        ));
    }

    #[tokio::test]
    async fn replacing_chunks_overwrites_previous_version() {
        let (_dir, store) = open_temp().await;
        let pool = store.pool();
        ensure_collection(pool, "notes", "test").await.unwrap();
        ensure_vec_table_dim(pool, 2).await.unwrap();

        let chunks = vec![record("travel_0", 0, "a"), record("travel_1", 1, "b")];
        let embeddings = vec![vec![1.0, 0.0], vec![0.0, 1.0]];
        replace_source_chunks(pool, &source("notes", "travel.txt"), &chunks, &embeddings, "test")
            .await
            .unwrap();
        assert_eq!(count_chunks(pool, Some("notes")).await.unwrap(), 2);

        let chunks = vec![record("travel_0", 0, "c")];
        replace_source_chunks(pool, &source("notes", "travel.txt"), &chunks, &[vec![1.0, 1.0]], "test")
            .await
            .unwrap();
        assert_eq!(count_chunks(pool, Some("notes")).await.unwrap(), 1);

        let (vectors,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM chunk_vec")
            .fetch_one(pool)
            .await
            .unwrap();
        assert_eq!(vectors, 1);
        assert_eq!(
            source_hash(pool, "notes", "travel.txt").await.unwrap().as_deref(),
            Some("abc")
        );
    }

    #[tokio::test]
    async fn mismatched_embeddings_are_rejected() {
        let (_dir, store) = open_temp().await;
        let pool = store.pool();
        ensure_collection(pool, "notes", "test").await.unwrap();
        let err = replace_source_chunks(
            pool,
            &source("notes", "a.txt"),
            &[record("a_0", 0, "x")],
            &[],
            "test",
        )
        .await
        .unwrap_err();
        assert!(matches!(err, KnowledgeError::Embedding(_)));
    }

    #[tokio::test]
    async fn deleting_last_collection_drops_vector_table() {
        let (_dir, store) = open_temp().await;
        let pool = store.pool();
        ensure_collection(pool, "notes", "test").await.unwrap();
        ensure_collection(pool, "journal", "test").await.unwrap();
        ensure_vec_table_dim(pool, 2).await.unwrap();
        replace_source_chunks(pool, &source("notes", "a.txt"), &[record("a_0", 0, "x")], &[vec![1.0, 0.0]], "test")
            .await
            .unwrap();
        replace_source_chunks(pool, &source("journal", "b.txt"), &[record("b_0", 0, "y")], &[vec![0.0, 1.0]], "test")
            .await
            .unwrap();

        assert!(delete_collection(pool, "notes").await.unwrap());
        assert!(vec_table_exists(pool).await.unwrap());
        assert_eq!(count_chunks(pool, None).await.unwrap(), 1);

        assert!(delete_collection(pool, "journal").await.unwrap());
        assert!(!vec_table_exists(pool).await.unwrap());
        assert_eq!(stored_embedding_dim(pool).await.unwrap(), None);

        assert!(!delete_collection(pool, "journal").await.unwrap());
    }

    #[tokio::test]
    async fn same_stem_files_keep_separate_chunks() {
        let (_dir, store) = open_temp().await;
        let pool = store.pool();
        ensure_collection(pool, "notes", "test").await.unwrap();
        ensure_vec_table_dim(pool, 2).await.unwrap();

        let txt = replace_source_chunks(pool, &source("notes", "plan.txt"), &[record("plan_0", 0, "txt")], &[vec![1.0, 0.0]], "test")
            .await
            .unwrap();
        let md = replace_source_chunks(pool, &source("notes", "plan.md"), &[record("plan_0", 0, "md")], &[vec![0.0, 1.0]], "test")
            .await
            .unwrap();
        assert_ne!(txt, md);

        // Re-ingesting one of them leaves the other untouched.
        replace_source_chunks(pool, &source("notes", "plan.txt"), &[record("plan_0", 0, "txt v2")], &[vec![1.0, 1.0]], "test")
            .await
            .unwrap();
        let rows: Vec<(String, String)> =
            sqlx::query_as("SELECT filename, content FROM chunks ORDER BY filename")
                .fetch_all(pool)
                .await
                .unwrap();
        assert_eq!(
            rows,
            vec![
                ("plan.md".to_string(), "md".to_string()),
                ("plan.txt".to_string(), "txt v2".to_string()),
            ]
        );
        let (vectors,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM chunk_vec")
            .fetch_one(pool)
            .await
            .unwrap();
        assert_eq!(vectors, 2);
    }

    #[tokio::test]
    async fn upsert_vec_overwrites_existing_row() {
        let (_dir, store) = open_temp().await;
        let pool = store.pool();
        ensure_vec_table_dim(pool, 2).await.unwrap();

        let mut conn = pool.acquire().await.unwrap();
        upsert_vec(&mut conn, 7, "notes", &[1.0, 0.0]).await.unwrap();
        upsert_vec(&mut conn, 7, "notes", &[0.0, 1.0]).await.unwrap();

        let (vectors,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM chunk_vec")
            .fetch_one(&mut *conn)
            .await
            .unwrap();
        assert_eq!(vectors, 1);
    }
}
