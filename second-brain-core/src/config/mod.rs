//! Configuration management for second-brain.
//!
//! This module separates secrets (from environment variables) from
//! settings (from TOML files).
//!
//! # Configuration Sources
//!
//! ## Secrets (Environment Variables)
//! - `GEMINI_API_KEY` / `GOOGLE_API_KEY` - Gemini API key
//! - `OPENAI_API_KEY` - OpenAI API key
//! - `OPENROUTER_API_KEY` - OpenRouter API key
//!
//! ## Overrides (Environment Variables)
//! - `LLM_MODEL` - model in `provider:model` form
//! - `GUARDRAILS_ENABLED` - `"true"` enables PII redaction
//!
//! ## Settings (TOML File)
//! Located at `~/.config/second-brain/config.toml`:
//! ```toml
//! [llm]
//! model = "google-gla:gemini-2.5-pro"
//!
//! [knowledge]
//! notes_dir = "data/notes"
//! chunk_size = 500
//!
//! [logging]
//! level = "info"
//! ```

pub mod knowledge;
mod secrets;
mod settings;

use std::path::PathBuf;

use crate::model_spec::{ModelSpec, ModelSpecError};
use crate::paths::{PathError, default_db_path, default_memory_path};

pub use knowledge::{EmbeddingProviderKind, KnowledgeSettings};
pub use secrets::Secrets;
pub use settings::{
    EvalSettings, GUARDRAILS_ENABLED_ENV, GuardrailsSettings, KnowledgeToolsSettings,
    LLM_MODEL_ENV, LlmSettings, LoggingSettings, MemorySettings, Settings, SettingsError,
};

/// Load .env file if it exists.
pub fn load_dotenv() {
    // Silently ignore errors (file might not exist)
    let _ = dotenvy::dotenv();
}

/// Combined configuration containing both secrets and settings.
#[derive(Debug, Clone)]
pub struct Config {
    /// Secrets loaded from environment variables
    pub secrets: Secrets,
    /// Settings loaded from TOML configuration file
    pub settings: Settings,
}

/// Errors that can occur when loading configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Settings error: {0}")]
    Settings(#[from] SettingsError),

    #[error("Invalid model '{model}': {source}")]
    InvalidModel {
        model: String,
        #[source]
        source: ModelSpecError,
    },

    #[error("Path error: {0}")]
    Path(#[from] PathError),
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// 1. `.env` (if present)
    /// 2. Settings from TOML file (creating defaults if needed)
    /// 3. `LLM_MODEL` / `GUARDRAILS_ENABLED` overrides
    /// 4. Secrets from environment variables
    pub fn load() -> Result<Self, ConfigError> {
        load_dotenv();
        let settings = Settings::load()?;
        let secrets = Secrets::from_env();
        Ok(Self { secrets, settings })
    }

    /// Parsed model the assistant answers with.
    pub fn llm_model(&self) -> Result<ModelSpec, ConfigError> {
        parse_model(&self.settings.llm.model)
    }

    /// Parsed judge model for evaluations, if configured.
    pub fn judge_model(&self) -> Result<Option<ModelSpec>, ConfigError> {
        self.settings
            .eval
            .judge_model
            .as_deref()
            .map(str::trim)
            .filter(|raw| !raw.is_empty())
            .map(parse_model)
            .transpose()
    }

    /// Resolved knowledge settings with the DB path filled in.
    pub fn knowledge_settings(&self) -> Result<KnowledgeSettings, ConfigError> {
        let mut knowledge = KnowledgeSettings::from(&self.settings.knowledge);
        if knowledge.db_path_override.is_none() {
            knowledge.db_path_override = Some(default_db_path()?);
        }
        Ok(knowledge)
    }

    /// Location of the conversation memory file.
    pub fn memory_path(&self) -> Result<PathBuf, ConfigError> {
        match &self.settings.memory.path {
            Some(path) => Ok(PathBuf::from(path)),
            None => Ok(default_memory_path()?),
        }
    }

    /// Whether PII redaction is active.
    pub fn guardrails_enabled(&self) -> bool {
        self.settings.guardrails.enabled
    }
}

fn parse_model(raw: &str) -> Result<ModelSpec, ConfigError> {
    ModelSpec::parse(raw).map_err(|source| ConfigError::InvalidModel {
        model: raw.to_string(),
        source,
    })
}
