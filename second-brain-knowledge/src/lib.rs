//! Note indexing and retrieval for second-brain.
//!
//! Notes are split with a recursive character splitter, embedded and stored
//! in SQLite with a sqlite-vec table for nearest-neighbour search.

pub mod chunker;
pub mod embeddings;
pub mod engine;
pub mod errors;
pub mod ingest;
pub mod search;
pub mod storage;

pub use second_brain_core::config::KnowledgeSettings;
pub use chunker::{Chunk, RecursiveSplitter};
pub use embeddings::{Embedder, EmbeddingClient, HashedEmbedder, build_embedder};
pub use engine::KnowledgeEngine;
pub use errors::{KnowledgeError, KnowledgeResult};
pub use ingest::{IngestReport, IngestedFile};
pub use search::{NO_RELEVANT_NOTES, SearchHit, format_rag_context};
