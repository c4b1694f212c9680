//! Conversation memory persisted as a JSON array of `{query, response}`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

pub const NO_MEMORY_YET: &str = "No previous memory yet.";

#[derive(Debug, thiserror::Error)]
pub enum MemoryError {
    #[error("memory file I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("memory serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryEntry {
    pub query: String,
    pub response: String,
}

#[derive(Debug, Clone)]
pub struct MemoryManager {
    path: PathBuf,
    entries: Vec<MemoryEntry>,
}

impl MemoryManager {
    /// Load memory from `path`. A missing or unreadable-as-JSON file starts
    /// an empty memory; the file is only written on the next change.
    pub async fn load(path: impl Into<PathBuf>) -> Result<Self, MemoryError> {
        let path = path.into();
        let entries = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => match serde_json::from_str::<Vec<MemoryEntry>>(&raw) {
                Ok(entries) => entries,
                Err(e) => {
                    tracing::warn!(path = %path.display(), "ignoring invalid memory file: {}", e);
                    Vec::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(e.into()),
        };

        tracing::debug!(path = %path.display(), entries = entries.len(), "memory loaded");
        Ok(Self { path, entries })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn entries(&self) -> &[MemoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Append one turn and persist the whole memory.
    pub async fn add_entry(
        &mut self,
        query: impl Into<String>,
        response: impl Into<String>,
    ) -> Result<(), MemoryError> {
        self.entries.push(MemoryEntry {
            query: query.into(),
            response: response.into(),
        });
        // Memory only holds turns that reached the file.
        if let Err(e) = self.save().await {
            self.entries.pop();
            return Err(e);
        }
        Ok(())
    }

    /// The last `n` entries, oldest first.
    pub fn recent(&self, n: usize) -> &[MemoryEntry] {
        let start = self.entries.len().saturating_sub(n);
        &self.entries[start..]
    }

    pub fn recent_context(&self, n: usize) -> String {
        format_context(self.recent(n))
    }

    pub async fn clear(&mut self) -> Result<(), MemoryError> {
        self.entries.clear();
        self.save().await
    }

    async fn save(&self) -> Result<(), MemoryError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_string_pretty(&self.entries)?;
        tokio::fs::write(&self.path, json).await?;
        Ok(())
    }
}

/// Render turns as `User:`/`Agent:` lines for the prompt.
pub fn format_context(entries: &[MemoryEntry]) -> String {
    if entries.is_empty() {
        return NO_MEMORY_YET.to_string();
    }
    entries
        .iter()
        .map(|entry| format!("User: {}\nAgent: {}", entry.query, entry.response))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_file_starts_empty_without_writing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("memory").join("memory_data.json");
        let memory = MemoryManager::load(&path).await.unwrap();
        assert!(memory.is_empty());
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn invalid_json_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("memory_data.json");
        tokio::fs::write(&path, "{not json").await.unwrap();
        let memory = MemoryManager::load(&path).await.unwrap();
        assert!(memory.is_empty());
    }

    #[tokio::test]
    async fn entries_are_appended_and_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("memory").join("memory_data.json");

        let mut memory = MemoryManager::load(&path).await.unwrap();
        memory.add_entry("q1", "r1").await.unwrap();
        memory.add_entry("q2", "r2").await.unwrap();

        let raw = tokio::fs::read_to_string(&path).await.unwrap();
        insta::assert_snapshot!(raw, @r#"
        [
          {
            "query": "q1",
            "response": "r1"
          },
          {
            "query": "q2",
            "response": "r2"
          }
        ]
        "#);

        let reloaded = MemoryManager::load(&path).await.unwrap();
        assert_eq!(reloaded.entries(), memory.entries());
    }

    #[tokio::test]
    async fn recent_returns_last_entries_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let mut memory = MemoryManager::load(dir.path().join("m.json")).await.unwrap();
        for i in 0..5 {
            memory.add_entry(format!("q{i}"), format!("r{i}")).await.unwrap();
        }
        let recent: Vec<_> = memory.recent(3).iter().map(|e| e.query.as_str()).collect();
        assert_eq!(recent, vec!["q2", "q3", "q4"]);
        assert_eq!(memory.recent(10).len(), 5);
        assert!(memory.recent(0).is_empty());
    }

    #[tokio::test]
    async fn failed_save_does_not_keep_the_entry() {
        let dir = tempfile::tempdir().unwrap();
        let parent = dir.path().join("memory");
        let mut memory = MemoryManager::load(parent.join("m.json")).await.unwrap();
        tokio::fs::write(&parent, "").await.unwrap();

        assert!(memory.add_entry("q", "r").await.is_err());
        assert!(memory.is_empty());
        assert_eq!(memory.recent_context(3), NO_MEMORY_YET);
    }

    #[tokio::test]
    async fn clear_empties_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("m.json");
        let mut memory = MemoryManager::load(&path).await.unwrap();
        memory.add_entry("q", "r").await.unwrap();
        memory.clear().await.unwrap();

        assert!(memory.is_empty());
        assert_eq!(tokio::fs::read_to_string(&path).await.unwrap(), "[]");
    }

    #[test]
    fn context_formatting() {
        assert_eq!(format_context(&[]), NO_MEMORY_YET);
        let entries = vec![
            MemoryEntry {
                query: "Hi".to_string(),
                response: "Hello".to_string(),
            },
            MemoryEntry {
                query: "Goals?".to_string(),
                response: "Learn Rust".to_string(),
            },
        ];
        assert_eq!(
            format_context(&entries),
            "User: Hi\nAgent: Hello\nUser: Goals?\nAgent: Learn Rust"
        );
    }
}
