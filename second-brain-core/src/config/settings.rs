//! Settings configuration loaded from TOML files.
//!
//! This module handles non-sensitive configuration stored in TOML format
//! in the XDG config directory (~/.config/second-brain/config.toml).
//! A couple of environment variables (`LLM_MODEL`, `GUARDRAILS_ENABLED`)
//! override the file after loading.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Environment variable overriding `[llm] model`.
pub const LLM_MODEL_ENV: &str = "LLM_MODEL";

/// Environment variable toggling PII redaction.
pub const GUARDRAILS_ENABLED_ENV: &str = "GUARDRAILS_ENABLED";

/// Default TOML configuration file content
const DEFAULT_CONFIG_TOML: &str = r#"# second-brain configuration file
# Located at: ~/.config/second-brain/config.toml
#
# This file contains non-sensitive configuration.
# Secrets (API keys) are loaded from environment variables:
#   - GEMINI_API_KEY (or GOOGLE_API_KEY)
#   - OPENAI_API_KEY
#   - OPENROUTER_API_KEY
#
# Overrides:
#   - LLM_MODEL           replaces [llm] model
#   - GUARDRAILS_ENABLED  "true" enables PII redaction, anything else disables it

[llm]
# "<provider>:<model>", provider is one of google-gla, openai, openrouter, ollama
model = "google-gla:gemini-2.5-pro"
max_output_tokens = 8192
timeout_seconds = 120
# base_url = "http://127.0.0.1:11434/v1"

[knowledge]
notes_dir = "data/notes"
collection = "notes"
extensions = ["txt"]
chunk_size = 500
chunk_overlap = 50
n_results = 3
snippet_chars = 400
# "ollama" calls embedding_url, "hashed" works offline
embedding_provider = "ollama"
embedding_url = "http://127.0.0.1:11434"
embedding_model = "all-minilm"
embedding_batch = 32
# db_path = "/path/to/index.sqlite3"

[memory]
# 0 sends no past turns to the model
recent_turns = 3
# path = "/path/to/memory_data.json"

[guardrails]
enabled = true

[eval]
# judge_model = "google-gla:gemini-2.5-pro"

[logging]
level = "info"
file_enabled = false
# file_path = "/var/log/second-brain.log"
# dump_queries = true
"#;

/// Settings loaded from TOML configuration file.
///
/// These are non-sensitive configuration values that can be safely
/// stored in files and version controlled.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Settings {
    /// Language model settings
    #[serde(default)]
    pub llm: LlmSettings,

    /// Knowledge base (ingestion and retrieval) settings
    #[serde(default)]
    pub knowledge: KnowledgeToolsSettings,

    /// Conversation memory settings
    #[serde(default)]
    pub memory: MemorySettings,

    /// PII redaction settings
    #[serde(default)]
    pub guardrails: GuardrailsSettings,

    /// Evaluation settings
    #[serde(default)]
    pub eval: EvalSettings,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Language model settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LlmSettings {
    /// Model in `provider:model` form
    #[serde(default = "default_llm_model")]
    pub model: String,

    /// Override the provider's default base URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Upper bound on generated tokens per answer
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,

    /// HTTP timeout for a single completion
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

/// Knowledge tools configuration (all optional, resolved into `KnowledgeSettings`)
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct KnowledgeToolsSettings {
    /// Folder scanned by "ingest all data"
    pub notes_dir: Option<String>,

    /// Optional override for the index DB path
    pub db_path: Option<String>,

    /// Collection name inside the index
    pub collection: Option<String>,

    /// File extensions picked up during ingestion
    pub extensions: Option<Vec<String>>,

    /// Chunk size in characters
    pub chunk_size: Option<usize>,

    /// Overlap between consecutive chunks in characters
    pub chunk_overlap: Option<usize>,

    /// Number of passages returned per query
    pub n_results: Option<usize>,

    /// Characters shown per passage when printing query results
    pub snippet_chars: Option<usize>,

    /// Embedding provider ("ollama" or "hashed")
    pub embedding_provider: Option<String>,

    /// Embedding provider base URL
    pub embedding_url: Option<String>,

    /// Embedding model name
    pub embedding_model: Option<String>,

    /// Embedding dimension (if known)
    pub embedding_dim: Option<usize>,

    /// Embedding batch size
    pub embedding_batch: Option<usize>,
}

/// Conversation memory settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MemorySettings {
    /// Optional override for the memory JSON file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// Number of past turns fed back to the model
    #[serde(default = "default_recent_turns")]
    pub recent_turns: usize,
}

/// PII redaction settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GuardrailsSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,
}

/// Evaluation settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct EvalSettings {
    /// Model used to grade answers against rubrics (no grading when unset)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub judge_model: Option<String>,
}

/// Logging settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingSettings {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Whether to log to file
    #[serde(default)]
    pub file_enabled: bool,

    /// Log file path (if file_enabled is true)
    pub file_path: Option<String>,

    /// Dump raw LLM request/response JSON to ./logs/queries/
    #[serde(default)]
    pub dump_queries: bool,
}

fn default_llm_model() -> String {
    "google-gla:gemini-2.5-pro".to_string()
}

fn default_max_output_tokens() -> u32 {
    8192
}

fn default_timeout_seconds() -> u64 {
    120
}

fn default_recent_turns() -> usize {
    3
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            model: default_llm_model(),
            base_url: None,
            max_output_tokens: default_max_output_tokens(),
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

impl Default for MemorySettings {
    fn default() -> Self {
        Self {
            path: None,
            recent_turns: default_recent_turns(),
        }
    }
}

impl Default for GuardrailsSettings {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file_enabled: false,
            file_path: None,
            dump_queries: false,
        }
    }
}

/// Errors that can occur when loading settings
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Config directory not found")]
    ConfigDirNotFound,
}

impl Settings {
    /// Load settings from the TOML configuration file, then apply env overrides.
    ///
    /// If the config file doesn't exist, creates it with default values.
    /// The file is located at `~/.config/second-brain/config.toml`.
    pub fn load() -> Result<Self, SettingsError> {
        Self::load_from_path(&Self::config_path()?)
    }

    /// Like [`Settings::load`], for an explicit file.
    pub fn load_from_path(config_path: &Path) -> Result<Self, SettingsError> {
        if !config_path.exists() {
            tracing::info!("Creating default configuration at {:?}", config_path);
            Self::create_default_config(config_path)?;
        }

        let content = fs::read_to_string(config_path)?;
        let mut settings = Self::from_toml(&content)?;
        settings.apply_env_overrides();
        Ok(settings)
    }

    /// Parse settings from TOML content.
    pub fn from_toml(content: &str) -> Result<Self, SettingsError> {
        let settings: Self = toml::from_str(content)?;
        Ok(settings)
    }

    /// Get the configuration file path.
    ///
    /// Uses XDG config directory: `~/.config/second-brain/config.toml`
    pub fn config_path() -> Result<PathBuf, SettingsError> {
        if let Ok(override_dir) = std::env::var("SECOND_BRAIN_CONFIG_DIR") {
            let dir = PathBuf::from(override_dir);
            return Ok(dir.join("config.toml"));
        }

        let config_dir = dirs::config_dir()
            .ok_or(SettingsError::ConfigDirNotFound)?
            .join("second-brain");

        Ok(config_dir.join("config.toml"))
    }

    fn create_default_config(path: &Path) -> Result<(), SettingsError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, DEFAULT_CONFIG_TOML)?;
        Ok(())
    }

    /// Apply `LLM_MODEL` and `GUARDRAILS_ENABLED` from the process environment.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary variable lookup.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(model) = lookup(LLM_MODEL_ENV).filter(|m| !m.trim().is_empty()) {
            tracing::debug!("LLM model overridden from environment: {}", model);
            self.llm.model = model.trim().to_string();
        }

        if let Some(flag) = lookup(GUARDRAILS_ENABLED_ENV) {
            self.guardrails.enabled = flag.trim().eq_ignore_ascii_case("true");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();

        assert_eq!(settings.llm.model, "google-gla:gemini-2.5-pro");
        assert_eq!(settings.llm.max_output_tokens, 8192);
        assert!(settings.llm.base_url.is_none());
        assert_eq!(settings.memory.recent_turns, 3);
        assert!(settings.guardrails.enabled);
        assert!(settings.eval.judge_model.is_none());
        assert_eq!(settings.logging.level, "info");
        assert!(!settings.logging.file_enabled);
        assert!(!settings.logging.dump_queries);
    }

    #[test]
    fn test_default_config_file_parses() {
        let settings = Settings::from_toml(DEFAULT_CONFIG_TOML).expect("default TOML parses");

        assert_eq!(settings.llm.model, "google-gla:gemini-2.5-pro");
        assert_eq!(settings.knowledge.chunk_size, Some(500));
        assert_eq!(settings.knowledge.chunk_overlap, Some(50));
        assert_eq!(settings.knowledge.n_results, Some(3));
        assert_eq!(settings.knowledge.extensions, Some(vec!["txt".to_string()]));
        assert_eq!(settings.knowledge.embedding_provider.as_deref(), Some("ollama"));
        assert!(settings.guardrails.enabled);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let settings = Settings::from_toml(
            r#"
[llm]
model = "ollama:llama3.1"

[guardrails]
enabled = false
"#,
        )
        .unwrap();

        assert_eq!(settings.llm.model, "ollama:llama3.1");
        assert_eq!(settings.llm.timeout_seconds, 120);
        assert!(!settings.guardrails.enabled);
        assert_eq!(settings.memory.recent_turns, 3);
        assert!(settings.knowledge.notes_dir.is_none());
    }

    #[test]
    fn test_llm_model_override() {
        let mut settings = Settings::default();
        settings.apply_overrides(lookup_from(&[("LLM_MODEL", "openai:gpt-4o")]));
        assert_eq!(settings.llm.model, "openai:gpt-4o");
    }

    #[test]
    fn test_blank_llm_model_is_ignored() {
        let mut settings = Settings::default();
        settings.apply_overrides(lookup_from(&[("LLM_MODEL", "   ")]));
        assert_eq!(settings.llm.model, "google-gla:gemini-2.5-pro");
    }

    #[test]
    fn test_guardrails_flag_is_true_only_for_true() {
        for (value, expected) in [
            ("true", true),
            ("TRUE", true),
            (" True ", true),
            ("false", false),
            ("1", false),
            ("yes", false),
        ] {
            let mut settings = Settings::default();
            settings.apply_overrides(lookup_from(&[("GUARDRAILS_ENABLED", value)]));
            assert_eq!(settings.guardrails.enabled, expected, "value {value:?}");
        }
    }

    #[test]
    fn test_unset_guardrails_keeps_file_value() {
        let mut settings = Settings::from_toml("[guardrails]\nenabled = false\n").unwrap();
        settings.apply_overrides(lookup_from(&[]));
        assert!(!settings.guardrails.enabled);
    }

    #[test]
    fn test_load_from_missing_path_writes_defaults() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("nested").join("config.toml");

        let settings = Settings::load_from_path(&path).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), DEFAULT_CONFIG_TOML);
        assert_eq!(settings.memory.recent_turns, 3);

        fs::write(&path, "[memory]\nrecent_turns = 0\n").unwrap();
        let reloaded = Settings::load_from_path(&path).unwrap();
        assert_eq!(reloaded.memory.recent_turns, 0);
    }

    #[test]
    fn test_default_toml_documents_zero_recent_turns() {
        assert!(DEFAULT_CONFIG_TOML.contains("# 0 sends no past turns to the model\nrecent_turns = 3"));
    }
}
