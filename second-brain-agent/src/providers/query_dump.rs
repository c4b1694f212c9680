//! Debug query logging for LLM provider requests and responses.
//!
//! When enabled via `dump_queries = true` in `[logging]` config, writes raw
//! JSON to `./logs/queries/{timestamp}-{provider}-{model}.{phase}.json`.
//! Failures are logged as warnings but never block the request.

use std::path::{Path, PathBuf};

use chrono::Utc;
use serde_json::Value;
use tracing::warn;

const QUERY_DIR: &str = "./logs/queries";

/// Paired request/response dump files sharing one base name.
pub struct QueryDump {
    base: PathBuf,
}

impl QueryDump {
    /// Write `{base}.request.json` and return a handle for the response.
    pub async fn request(provider: &str, model: &str, value: &Value) -> Option<Self> {
        Self::request_in(Path::new(QUERY_DIR), provider, model, value).await
    }

    pub(crate) async fn request_in(
        dir: &Path,
        provider: &str,
        model: &str,
        value: &Value,
    ) -> Option<Self> {
        let timestamp = Utc::now().format("%Y%m%d-%H%M%S%.3f");
        let base = dir.join(format!("{}-{}-{}", timestamp, provider, sanitize_model(model)));

        if let Err(e) = tokio::fs::create_dir_all(dir).await {
            warn!("dump_queries: failed to create dir: {}", e);
            return None;
        }

        write_json(&with_phase(&base, "request"), value).await;
        Some(Self { base })
    }

    pub async fn response(&self, value: &Value) {
        write_json(&with_phase(&self.base, "response"), value).await;
    }
}

/// `Path::with_extension` would cut at the dot inside the timestamp.
fn with_phase(base: &Path, phase: &str) -> PathBuf {
    let mut name = base.as_os_str().to_owned();
    name.push(format!(".{phase}.json"));
    PathBuf::from(name)
}

/// Model names like `gemini-2.5-pro` or `meta/llama:8b` become file-safe.
fn sanitize_model(model: &str) -> String {
    model
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

async fn write_json(path: &Path, value: &Value) {
    match serde_json::to_string_pretty(value) {
        Ok(json_str) => {
            if let Err(e) = tokio::fs::write(path, json_str).await {
                warn!("dump_queries: failed to write {}: {}", path.display(), e);
            }
        }
        Err(e) => warn!("dump_queries: failed to serialize: {}", e),
    }
}
