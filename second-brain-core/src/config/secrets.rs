//! Secrets configuration loaded from environment variables only.
//!
//! API keys are never stored in the TOML settings file. None of them is
//! mandatory at load time: ingestion and retrieval work without any key,
//! and a missing key is only reported when a provider needing it is built.

use std::env;

use crate::model_spec::ProviderType;

/// Secrets loaded exclusively from environment variables.
#[derive(Debug, Clone, Default)]
pub struct Secrets {
    /// Gemini API key (env: GEMINI_API_KEY, falling back to GOOGLE_API_KEY)
    pub gemini_api_key: Option<String>,

    /// OpenAI API key (env: OPENAI_API_KEY)
    pub openai_api_key: Option<String>,

    /// OpenRouter API key (env: OPENROUTER_API_KEY)
    pub openrouter_api_key: Option<String>,
}

impl Secrets {
    /// Load secrets from the process environment.
    ///
    /// Call `load_dotenv` first if a `.env` file should be honored.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load secrets from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        Self {
            gemini_api_key: non_empty("GEMINI_API_KEY").or_else(|| non_empty("GOOGLE_API_KEY")),
            openai_api_key: non_empty("OPENAI_API_KEY"),
            openrouter_api_key: non_empty("OPENROUTER_API_KEY"),
        }
    }

    /// API key for a provider. Ollama runs locally and needs none.
    pub fn api_key_for(&self, provider: ProviderType) -> Option<&str> {
        match provider {
            ProviderType::Gemini => self.gemini_api_key.as_deref(),
            ProviderType::OpenAi => self.openai_api_key.as_deref(),
            ProviderType::OpenRouter => self.openrouter_api_key.as_deref(),
            ProviderType::Ollama => None,
        }
    }

    /// Name of the variable a provider's key is read from.
    pub fn env_var_for(provider: ProviderType) -> Option<&'static str> {
        match provider {
            ProviderType::Gemini => Some("GEMINI_API_KEY"),
            ProviderType::OpenAi => Some("OPENAI_API_KEY"),
            ProviderType::OpenRouter => Some("OPENROUTER_API_KEY"),
            ProviderType::Ollama => None,
        }
    }
}
