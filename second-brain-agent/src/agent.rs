//! The thought agent: retrieval, memory recall, one LLM call, memory store.

use tokio::sync::Mutex;
use tracing::{Instrument, field, info_span};

use second_brain_core::{Config, ConfigError};
use second_brain_knowledge::{KnowledgeEngine, KnowledgeError};

use crate::guardrails::PiiGuard;
use crate::memory::{MemoryError, MemoryManager, format_context};
use crate::prompt::{SYSTEM_PROMPT, build_combined_input};
use crate::providers::{Provider, ProviderError, build_provider};

#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Provider(#[from] ProviderError),
    #[error(transparent)]
    Knowledge(#[from] KnowledgeError),
    #[error(transparent)]
    Memory(#[from] MemoryError),
    #[error("invalid guardrail pattern: {0}")]
    Guardrails(#[from] regex::Error),
    #[error("model {model} returned an empty answer")]
    EmptyAnswer { model: String },
}

pub struct ThoughtAgent {
    provider: Box<dyn Provider>,
    knowledge: KnowledgeEngine,
    memory: Mutex<MemoryManager>,
    guard: PiiGuard,
    recent_turns: usize,
    n_results: Option<usize>,
}

impl ThoughtAgent {
    pub fn new(
        provider: Box<dyn Provider>,
        knowledge: KnowledgeEngine,
        memory: MemoryManager,
        guard: PiiGuard,
    ) -> Self {
        Self {
            provider,
            knowledge,
            memory: Mutex::new(memory),
            guard,
            recent_turns: 3,
            n_results: None,
        }
    }

    /// Wire the agent from configuration: `[llm]` model and secrets,
    /// memory file, guardrails switch.
    pub async fn from_config(config: &Config, knowledge: KnowledgeEngine) -> Result<Self, AgentError> {
        let spec = config.llm_model()?;
        let provider = build_provider(&spec, config)?;
        let memory = MemoryManager::load(config.memory_path()?).await?;
        let guard = PiiGuard::new(config.guardrails_enabled())?;

        Ok(Self::new(provider, knowledge, memory, guard)
            .with_recent_turns(config.settings.memory.recent_turns))
    }

    pub fn with_recent_turns(mut self, recent_turns: usize) -> Self {
        self.recent_turns = recent_turns;
        self
    }

    /// Number of notes retrieved per question (collection default when unset).
    pub fn with_n_results(mut self, n_results: usize) -> Self {
        self.n_results = Some(n_results);
        self
    }

    pub fn model(&self) -> &str {
        self.provider.model()
    }

    pub fn guard(&self) -> &PiiGuard {
        &self.guard
    }

    pub async fn memory_len(&self) -> usize {
        self.memory.lock().await.len()
    }

    /// Answer `user_prompt` from the knowledge base and recent memory, then
    /// remember the exchange.
    pub async fn run(&self, user_prompt: &str) -> Result<String, AgentError> {
        let span = info_span!(
            "thought_agent.run",
            user_prompt = %preview(user_prompt, 100),
            response_length = field::Empty,
        );

        let result = self.run_inner(user_prompt).instrument(span.clone()).await;
        match &result {
            Ok(answer) => {
                span.record("response_length", answer.chars().count());
            }
            Err(e) => {
                let _enter = span.enter();
                tracing::error!(error = %e, "thought agent run failed");
            }
        }
        result
    }

    async fn run_inner(&self, user_prompt: &str) -> Result<String, AgentError> {
        let prompt = self.guard.sanitize(user_prompt);

        tracing::info!("Retrieving relevant context from knowledge base");
        let rag_span = info_span!("rag_retrieval", context_length = field::Empty);
        let rag_context = self
            .knowledge
            .rag_retrieve(&prompt, self.n_results)
            .instrument(rag_span.clone())
            .await?;
        rag_span.record("context_length", rag_context.chars().count());

        tracing::info!("Fetching past memory context");
        let memory_context = {
            let memory = self.memory.lock().await;
            let recent = memory.recent(self.recent_turns);
            let _span = info_span!("memory_recall", memory_entries_count = recent.len()).entered();
            format_context(recent)
        };

        let combined_input = build_combined_input(&memory_context, &rag_context, &prompt);

        tracing::info!("Thinking based on memory and retrieved knowledge");
        let llm_span = info_span!(
            "llm_inference",
            model = self.provider.model(),
            response_length = field::Empty,
        );
        let response = self
            .provider
            .send_message(Some(SYSTEM_PROMPT), &combined_input)
            .instrument(llm_span.clone())
            .await?;
        llm_span.record("response_length", response.text.chars().count());

        if response.text.trim().is_empty() {
            return Err(AgentError::EmptyAnswer {
                model: self.provider.model().to_string(),
            });
        }
        let answer = self.guard.sanitize(&response.text);

        {
            let mut memory = self.memory.lock().await;
            memory
                .add_entry(prompt, answer.clone())
                .instrument(info_span!("memory_store", memory_stored = true))
                .await?;
        }

        Ok(answer)
    }

    pub async fn clear_memory(&self) -> Result<(), AgentError> {
        self.memory.lock().await.clear().await?;
        tracing::info!("Memory cleared");
        Ok(())
    }
}

fn preview(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
