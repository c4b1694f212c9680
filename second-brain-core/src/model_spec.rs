//! `provider:model` identifiers for the language model.
//!
//! The `LLM_MODEL` variable uses the same form as the settings file,
//! e.g. `google-gla:gemini-2.5-pro`, `openai:gpt-4o`, `ollama:llama3.1`.

use serde::{Deserialize, Serialize};

/// Supported LLM providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderType {
    Gemini,
    OpenAi,
    OpenRouter,
    Ollama,
}

impl ProviderType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderType::Gemini => "gemini",
            ProviderType::OpenAi => "openai",
            ProviderType::OpenRouter => "openrouter",
            ProviderType::Ollama => "ollama",
        }
    }

    pub fn requires_api_key(&self) -> bool {
        !matches!(self, ProviderType::Ollama)
    }
}

impl std::fmt::Display for ProviderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ProviderType {
    type Err = ModelSpecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "google-gla" | "google" | "gemini" | "google-vertex" => Ok(ProviderType::Gemini),
            "openai" => Ok(ProviderType::OpenAi),
            "openrouter" | "open_router" => Ok(ProviderType::OpenRouter),
            "ollama" => Ok(ProviderType::Ollama),
            other => Err(ModelSpecError::UnknownProvider(other.to_string())),
        }
    }
}

/// Errors raised while parsing a model identifier
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelSpecError {
    #[error("model identifier is empty")]
    Empty,

    #[error("unknown model provider: {0}")]
    UnknownProvider(String),

    #[error("cannot infer provider for model '{0}', use the provider:model form")]
    MissingProvider(String),
}

/// A parsed `provider:model` identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelSpec {
    pub provider: ProviderType,
    pub model: String,
}

impl ModelSpec {
    pub fn new(provider: ProviderType, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
        }
    }

    /// Parse `provider:model`. Only the first `:` separates the provider,
    /// so model ids such as `ollama:llama3.1:8b` keep their tag.
    pub fn parse(raw: &str) -> Result<Self, ModelSpecError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(ModelSpecError::Empty);
        }

        if let Some((provider, model)) = raw.split_once(':') {
            // `llama3.1:8b` style ids have no provider prefix; only treat the
            // head as a provider when it parses as one.
            if let Ok(provider) = provider.parse::<ProviderType>() {
                let model = model.trim();
                if model.is_empty() {
                    return Err(ModelSpecError::Empty);
                }
                return Ok(Self::new(provider, model));
            }
            if !looks_inferable(raw) {
                return Err(ModelSpecError::UnknownProvider(provider.to_string()));
            }
        }

        infer_provider(raw)
            .map(|provider| Self::new(provider, raw))
            .ok_or_else(|| ModelSpecError::MissingProvider(raw.to_string()))
    }
}

impl std::fmt::Display for ModelSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.provider, self.model)
    }
}

impl std::str::FromStr for ModelSpec {
    type Err = ModelSpecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

fn looks_inferable(raw: &str) -> bool {
    infer_provider(raw).is_some()
}

fn infer_provider(model: &str) -> Option<ProviderType> {
    let lower = model.to_lowercase();
    if lower.starts_with("gemini") {
        Some(ProviderType::Gemini)
    } else if lower.starts_with("gpt") {
        Some(ProviderType::OpenAi)
    } else {
        None
    }
}
