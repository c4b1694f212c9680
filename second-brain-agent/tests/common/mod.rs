#![allow(dead_code)]

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tempfile::TempDir;

use second_brain_agent::{Provider, ProviderError, ProviderResponse};
use second_brain_core::EmbeddingProviderKind;
use second_brain_knowledge::{KnowledgeEngine, KnowledgeSettings};

/// A recorded `(system, content)` request.
pub type Request = (Option<String>, String);

/// Provider answering from a fixed script and recording every request.
#[derive(Clone)]
pub struct ScriptedProvider {
    replies: Arc<Mutex<VecDeque<Result<String, String>>>>,
    pub requests: Arc<Mutex<Vec<Request>>>,
}

impl ScriptedProvider {
    pub fn new<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            replies: Arc::new(Mutex::new(replies.into_iter().map(|r| Ok(r.into())).collect())),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn failing(message: &str) -> Self {
        let provider = Self::new(Vec::<String>::new());
        provider
            .replies
            .lock()
            .unwrap()
            .push_back(Err(message.to_string()));
        provider
    }

    pub fn requests(&self) -> Vec<Request> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    fn model(&self) -> &str {
        "scripted-model"
    }

    async fn send_message(
        &self,
        system: Option<&str>,
        content: &str,
    ) -> Result<ProviderResponse, ProviderError> {
        self.requests
            .lock()
            .unwrap()
            .push((system.map(str::to_string), content.to_string()));
        let reply = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok("PASS".to_string()));
        match reply {
            Ok(text) => Ok(ProviderResponse {
                id: "resp-1".to_string(),
                model: "scripted-model".to_string(),
                text,
                usage: None,
                stop_reason: Some("stop".to_string()),
            }),
            Err(message) => Err(ProviderError::ApiError {
                status: 500,
                message,
            }),
        }
    }
}

/// Notes folder plus an ingested index on the hashed embedder.
pub struct KnowledgeFixture {
    pub engine: KnowledgeEngine,
    pub temp: TempDir,
}

impl KnowledgeFixture {
    pub async fn setup() -> Self {
        let temp = TempDir::new().expect("tempdir");
        let notes_dir = temp.path().join("notes");
        tokio::fs::create_dir_all(&notes_dir).await.unwrap();

        write_note(
            &notes_dir,
            "learning_goals.txt",
            "Learning goals: build a RAG pipeline with LangChain, study vector databases \
             and instrument services with OpenTelemetry.",
        )
        .await;
        write_note(
            &notes_dir,
            "travel_ideas.txt",
            "Travel ideas: Japan in spring, Italy for food, Iceland road trip, \
             Vietnam backpacking and Himachal treks.",
        )
        .await;
        write_note(
            &notes_dir,
            "finance_tips.txt",
            "Finance tips: money management starts with a budget and an emergency fund.",
        )
        .await;

        let settings = KnowledgeSettings {
            notes_dir,
            db_path_override: Some(temp.path().join("index.sqlite3")),
            embedding_provider: EmbeddingProviderKind::Hashed,
            embedding_dim: Some(256),
            ..Default::default()
        };
        let engine = KnowledgeEngine::open(settings).await.expect("open engine");
        engine.ingest_folder(None).await.expect("ingest notes");

        Self { engine, temp }
    }

    pub fn memory_path(&self) -> PathBuf {
        self.temp.path().join("memory").join("memory_data.json")
    }
}

async fn write_note(dir: &Path, name: &str, content: &str) {
    tokio::fs::write(dir.join(name), content).await.unwrap();
}
