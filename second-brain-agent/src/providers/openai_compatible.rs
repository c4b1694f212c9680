//! OpenAI-compatible API client.
//!
//! Serves OpenAI, OpenRouter and local Ollama, which all speak the Chat
//! Completions protocol.

use std::time::Duration;

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::providers::provider::{
    Provider, ProviderError, ProviderResponse, ProviderUsage, body_preview,
};
use crate::providers::query_dump::QueryDump;

/// OpenAI-compatible API client.
#[derive(Clone)]
pub struct OpenAiCompatibleClient {
    http_client: reqwest::Client,
    api_key: Option<String>,
    model: String,
    base_url: String,
    provider_name: String,
    max_tokens: u32,
    dump_queries: bool,
}

/// Request body for the Chat Completions API
#[derive(Debug, Serialize)]
struct ChatCompletionsRequest {
    model: String,
    messages: Vec<OpenAiMessage>,
    max_tokens: u32,
}

#[derive(Debug, Serialize, Deserialize)]
struct OpenAiMessage {
    role: String,
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionsResponse {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: OpenAiMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
}

impl OpenAiCompatibleClient {
    /// Create a new OpenAI-compatible client.
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<String>,
        model: impl Into<String>,
        provider_name: impl Into<String>,
    ) -> Self {
        Self {
            http_client: build_http_client(Duration::from_secs(120)),
            api_key,
            model: model.into(),
            base_url: base_url.into(),
            provider_name: provider_name.into(),
            max_tokens: 4096,
            dump_queries: false,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.http_client = build_http_client(timeout);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Enable or disable debug query logging
    pub fn with_dump_queries(mut self, enabled: bool) -> Self {
        self.dump_queries = enabled;
        self
    }

    /// Build request headers with optional auth.
    fn build_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(api_key) = &self.api_key
            && let Ok(header_value) = HeaderValue::from_str(&format!("Bearer {}", api_key))
        {
            headers.insert(AUTHORIZATION, header_value);
        }
        headers
    }

    fn chat_completions_url(&self) -> String {
        let base = self.base_url.trim_end_matches('/');
        if base.ends_with("/v1") {
            format!("{}/chat/completions", base)
        } else {
            format!("{}/v1/chat/completions", base)
        }
    }

    fn build_request(&self, system: Option<&str>, content: &str) -> ChatCompletionsRequest {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = system.filter(|s| !s.is_empty()) {
            messages.push(OpenAiMessage {
                role: "system".to_string(),
                content: Some(system.to_string()),
            });
        }
        messages.push(OpenAiMessage {
            role: "user".to_string(),
            content: Some(content.to_string()),
        });

        ChatCompletionsRequest {
            model: self.model.clone(),
            messages,
            max_tokens: self.max_tokens,
        }
    }

    fn parse_response(&self, body: &str) -> Result<ProviderResponse, ProviderError> {
        let response: ChatCompletionsResponse = serde_json::from_str(body).map_err(|e| {
            ProviderError::InvalidFormat(format!(
                "Failed to parse OpenAI-compatible response: {e}\nBody preview: {}",
                body_preview(body, 500)
            ))
        })?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or(ProviderError::NoContent)?;

        Ok(ProviderResponse {
            id: response
                .id
                .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
            model: response.model.unwrap_or_else(|| self.model.clone()),
            text: choice.message.content.unwrap_or_default(),
            usage: response.usage.map(|u| ProviderUsage {
                input_tokens: u.prompt_tokens,
                output_tokens: u.completion_tokens,
            }),
            stop_reason: choice.finish_reason,
        })
    }
}

fn build_http_client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .unwrap_or_default()
}

#[async_trait::async_trait]
impl Provider for OpenAiCompatibleClient {
    fn name(&self) -> &str {
        &self.provider_name
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn send_message(
        &self,
        system: Option<&str>,
        content: &str,
    ) -> Result<ProviderResponse, ProviderError> {
        let request_body = self.build_request(system, content);

        let dump = if self.dump_queries
            && let Ok(val) = serde_json::to_value(&request_body)
        {
            QueryDump::request(&self.provider_name, &self.model, &val).await
        } else {
            None
        };

        let response = self
            .http_client
            .post(self.chat_completions_url())
            .headers(self.build_headers())
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(ProviderError::ApiError {
                status: status.as_u16(),
                message: error_text,
            });
        }

        let response_text = response.text().await?;

        if let Some(dump) = &dump
            && let Ok(val) = serde_json::from_str::<Value>(&response_text)
        {
            dump.response(&val).await;
        }

        self.parse_response(&response_text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn local(base_url: &str) -> OpenAiCompatibleClient {
        OpenAiCompatibleClient::new(base_url, None, "llama3.1", "ollama")
    }

    #[test]
    fn test_openai_compatible_client_creation() {
        let client = local("http://127.0.0.1:11434/v1");
        assert_eq!(client.model(), "llama3.1");
        assert_eq!(client.name(), "ollama");
    }

    #[test]
    fn test_chat_completions_url_without_v1_suffix() {
        assert_eq!(
            local("http://127.0.0.1:8080/").chat_completions_url(),
            "http://127.0.0.1:8080/v1/chat/completions"
        );
    }

    #[test]
    fn test_chat_completions_url_with_v1_suffix() {
        assert_eq!(
            local("https://openrouter.ai/api/v1").chat_completions_url(),
            "https://openrouter.ai/api/v1/chat/completions"
        );
    }

    #[test]
    fn test_auth_header_only_with_key() {
        assert!(local("http://x").build_headers().get(AUTHORIZATION).is_none());

        let client = OpenAiCompatibleClient::new(
            "https://api.openai.com/v1",
            Some("sk-test".to_string()),
            "gpt-4o",
            "openai",
        );
        assert_eq!(
            client.build_headers().get(AUTHORIZATION).unwrap(),
            "Bearer sk-test"
        );
    }

    #[test]
    fn test_request_messages() {
        let request = local("http://x").with_max_tokens(100).build_request(Some("sys"), "hello");
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "model": "llama3.1",
                "messages": [
                    {"role": "system", "content": "sys"},
                    {"role": "user", "content": "hello"}
                ],
                "max_tokens": 100
            })
        );
    }

    #[test]
    fn test_parse_response() {
        let body = r#"{
            "id": "chatcmpl-1",
            "model": "llama3.1",
            "choices": [{"index": 0, "message": {"role": "assistant", "content": "Read twelve books."}, "finish_reason": "stop"}],
            "usage": {"prompt_tokens": 20, "completion_tokens": 4, "total_tokens": 24}
        }"#;
        let response = local("http://x").parse_response(body).unwrap();
        assert_eq!(response.id, "chatcmpl-1");
        assert_eq!(response.text, "Read twelve books.");
        assert_eq!(response.stop_reason.as_deref(), Some("stop"));
        assert_eq!(response.usage.unwrap().output_tokens, 4);
    }

    #[test]
    fn test_parse_response_without_choices() {
        let err = local("http://x").parse_response(r#"{"choices": []}"#).unwrap_err();
        assert!(matches!(err, ProviderError::NoContent));
    }
}
