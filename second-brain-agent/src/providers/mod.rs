pub mod gemini;
pub mod openai_compatible;
pub mod provider;
pub mod query_dump;

use std::time::Duration;

use second_brain_core::{Config, ModelSpec, ProviderType, Secrets};

pub use gemini::GeminiClient;
pub use openai_compatible::OpenAiCompatibleClient;
pub use provider::{Provider, ProviderError, ProviderResponse, ProviderUsage};

pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api/v1";
pub const OLLAMA_BASE_URL: &str = "http://127.0.0.1:11434/v1";

/// Build a client for `spec` using the configured secrets and `[llm]` settings.
pub fn build_provider(spec: &ModelSpec, config: &Config) -> Result<Box<dyn Provider>, ProviderError> {
    let llm = &config.settings.llm;
    let timeout = Duration::from_secs(llm.timeout_seconds.max(1));
    let dump_queries = config.settings.logging.dump_queries;
    let api_key = api_key(&config.secrets, spec.provider)?;

    let provider: Box<dyn Provider> = match spec.provider {
        ProviderType::Gemini => {
            let mut client = GeminiClient::new(api_key.unwrap_or_default(), &spec.model)
                .with_timeout(timeout)
                .with_max_output_tokens(llm.max_output_tokens)
                .with_dump_queries(dump_queries);
            if let Some(base_url) = &llm.base_url {
                client = client.with_base_url(base_url);
            }
            Box::new(client)
        }
        ProviderType::OpenAi | ProviderType::OpenRouter | ProviderType::Ollama => {
            let base_url = llm
                .base_url
                .clone()
                .unwrap_or_else(|| default_base_url(spec.provider).to_string());
            Box::new(
                OpenAiCompatibleClient::new(base_url, api_key, &spec.model, spec.provider.as_str())
                    .with_timeout(timeout)
                    .with_max_tokens(llm.max_output_tokens)
                    .with_dump_queries(dump_queries),
            )
        }
    };

    tracing::debug!(provider = provider.name(), model = provider.model(), "built provider");
    Ok(provider)
}

fn api_key(secrets: &Secrets, provider: ProviderType) -> Result<Option<String>, ProviderError> {
    match secrets.api_key_for(provider) {
        Some(key) => Ok(Some(key.to_string())),
        None if provider.requires_api_key() => Err(ProviderError::MissingApiKey {
            provider: provider.to_string(),
            env_var: Secrets::env_var_for(provider).unwrap_or("an API key"),
        }),
        None => Ok(None),
    }
}

fn default_base_url(provider: ProviderType) -> &'static str {
    match provider {
        ProviderType::OpenRouter => OPENROUTER_BASE_URL,
        ProviderType::Ollama => OLLAMA_BASE_URL,
        ProviderType::OpenAi | ProviderType::Gemini => OPENAI_BASE_URL,
    }
}
