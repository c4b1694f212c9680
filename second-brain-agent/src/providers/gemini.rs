//! Google Gemini API client.

use std::time::Duration;

use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::providers::provider::{
    Provider, ProviderError, ProviderResponse, ProviderUsage, body_preview,
};
use crate::providers::query_dump::QueryDump;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Gemini API client
#[derive(Clone)]
pub struct GeminiClient {
    http_client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
    max_output_tokens: u32,
    dump_queries: bool,
}

/// Request body for the Gemini generateContent API
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiContent>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    parts: Vec<TextPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct TextPart {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    max_output_tokens: u32,
}

/// Response from the generateContent API
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    usage_metadata: Option<UsageMetadata>,
    response_id: Option<String>,
    model_version: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
    /// Thought summaries are not part of the answer.
    #[serde(default)]
    thought: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
}

impl GeminiClient {
    /// Create a new Gemini client
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            http_client: build_http_client(Duration::from_secs(120)),
            api_key: api_key.into(),
            model: model.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            max_output_tokens: 8192,
            dump_queries: false,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.http_client = build_http_client(timeout);
        self
    }

    pub fn with_max_output_tokens(mut self, max_output_tokens: u32) -> Self {
        self.max_output_tokens = max_output_tokens;
        self
    }

    /// Enable or disable debug query logging
    pub fn with_dump_queries(mut self, enabled: bool) -> Self {
        self.dump_queries = enabled;
        self
    }

    fn generate_url(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }

    fn build_request(&self, system: Option<&str>, content: &str) -> GenerateContentRequest {
        GenerateContentRequest {
            contents: vec![GeminiContent {
                role: Some("user".to_string()),
                parts: vec![TextPart {
                    text: content.to_string(),
                }],
            }],
            system_instruction: system.filter(|s| !s.is_empty()).map(|text| GeminiContent {
                role: None,
                parts: vec![TextPart {
                    text: text.to_string(),
                }],
            }),
            generation_config: GenerationConfig {
                max_output_tokens: self.max_output_tokens,
            },
        }
    }

    fn parse_response(&self, body: &str) -> Result<ProviderResponse, ProviderError> {
        let parsed: GenerateContentResponse = serde_json::from_str(body).map_err(|e| {
            ProviderError::InvalidFormat(format!(
                "Failed to parse Gemini response: {e}\nBody preview: {}",
                body_preview(body, 500)
            ))
        })?;

        let candidate = parsed.candidates.first().ok_or(ProviderError::NoContent)?;
        let text = candidate
            .content
            .as_ref()
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter(|part| !part.thought)
                    .filter_map(|part| part.text.as_deref())
                    .collect::<String>()
            })
            .unwrap_or_default();

        Ok(ProviderResponse {
            id: parsed
                .response_id
                .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
            model: parsed.model_version.unwrap_or_else(|| self.model.clone()),
            text,
            usage: parsed.usage_metadata.map(|u| ProviderUsage {
                input_tokens: u.prompt_token_count,
                output_tokens: u.candidates_token_count,
            }),
            stop_reason: candidate.finish_reason.clone(),
        })
    }
}

fn build_http_client(timeout: Duration) -> reqwest::Client {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

    reqwest::Client::builder()
        .default_headers(headers)
        .timeout(timeout)
        .build()
        .unwrap_or_default()
}

#[async_trait::async_trait]
impl Provider for GeminiClient {
    fn name(&self) -> &str {
        "gemini"
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
            && let Ok(value) = serde_json::to_value(&request_body)
        {
            QueryDump::request("gemini", &self.model, &value).await
        } else {
            None
        };

        let response = self
            .http_client
            .post(self.generate_url())
            .header("x-goog-api-key", &self.api_key)
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        let response_text = response.text().await?;

        if let Some(dump) = &dump
            && let Ok(value) = serde_json::from_str::<Value>(&response_text)
        {
            dump.response(&value).await;
        }

        if !status.is_success() {
            return Err(ProviderError::ApiError {
                status: status.as_u16(),
                message: response_text,
            });
        }

        self.parse_response(&response_text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> GeminiClient {
        GeminiClient::new("test-key", "gemini-2.5-pro").with_max_output_tokens(256)
    }

    #[test]
    fn test_request_carries_system_instruction() {
        let request = client().build_request(Some("Be concise."), "What are my goals?");
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "contents": [{"role": "user", "parts": [{"text": "What are my goals?"}]}],
                "systemInstruction": {"parts": [{"text": "Be concise."}]},
                "generationConfig": {"maxOutputTokens": 256}
            })
        );
    }

    #[test]
    fn test_request_without_system_instruction() {
        let request = client().build_request(None, "hi");
        let value = serde_json::to_value(&request).unwrap();
        assert!(value.get("systemInstruction").is_none());
    }

    #[test]
    fn test_generate_url() {
        let client = client().with_base_url("http://localhost:9999/v1beta/");
        assert_eq!(
            client.generate_url(),
            "http://localhost:9999/v1beta/models/gemini-2.5-pro:generateContent"
        );
    }

    #[test]
    fn test_parse_response_skips_thoughts() {
        let body = r#"{
            "candidates": [{
                "content": {"role": "model", "parts": [
                    {"text": "thinking...", "thought": true},
                    {"text": "Finish the Rust book"},
                    {"text": " by June."}
                ]},
                "finishReason": "STOP"
            }],
            "usageMetadata": {"promptTokenCount": 12, "candidatesTokenCount": 7, "totalTokenCount": 19},
            "responseId": "resp-1",
            "modelVersion": "gemini-2.5-pro-001"
        }"#;
        let response = client().parse_response(body).unwrap();
        assert_eq!(response.id, "resp-1");
        assert_eq!(response.model, "gemini-2.5-pro-001");
        assert_eq!(response.text, "Finish the Rust book by June.");
        assert_eq!(response.stop_reason.as_deref(), Some("STOP"));
        assert_eq!(
            response.usage,
            Some(ProviderUsage {
                input_tokens: 12,
                output_tokens: 7
            })
        );
    }

    #[test]
    fn test_parse_response_blocked_candidate_has_empty_text() {
        let body = r#"{"candidates": [{"finishReason": "SAFETY"}]}"#;
        let response = client().parse_response(body).unwrap();
        assert_eq!(response.text, "");
        assert_eq!(response.model, "gemini-2.5-pro");
    }

    #[test]
    fn test_parse_response_without_candidates() {
        let err = client().parse_response(r#"{"candidates": []}"#).unwrap_err();
        assert!(matches!(err, ProviderError::NoContent));
        let err = client().parse_response("not json").unwrap_err();
        assert!(matches!(err, ProviderError::InvalidFormat(_)));
    }
}
