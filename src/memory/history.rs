//! Conversation history: a cross-session cache of (query, answer) pairs.
//!
//! The whole collection is loaded once per query and rewritten wholesale on
//! each addition. Interactive use keeps the volume small enough that the
//! O(n) rewrite is a non-issue. I/O failures degrade to an empty list or a
//! dropped append; the shell must never lose a live answer over a cache.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::agent::FINAL_ANSWER_MARKER;

/// One cached conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationRecord {
    /// ISO-8601 creation time.
    pub timestamp: String,
    /// The user's query, verbatim.
    pub query: String,
    /// The raw answer text, markers included.
    pub answer: String,
    /// The extracted final-answer text.
    pub final_answer: String,
}

/// Load/search/append interface over the persisted history file.
pub struct ConversationStore {
    path: PathBuf,
}

impl ConversationStore {
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }

    /// Load all records. A missing file is a fresh history, not an error;
    /// a corrupt or unreadable file is logged and treated as empty.
    pub fn load(&self) -> Vec<ConversationRecord> {
        if !self.path.exists() {
            tracing::debug!("No conversation history at {}", self.path.display());
            return Vec::new();
        }

        match fs::read_to_string(&self.path) {
            Ok(raw) => match serde_json::from_str(&raw) {
                Ok(records) => records,
                Err(e) => {
                    tracing::warn!("Error parsing conversation history: {}", e);
                    Vec::new()
                }
            },
            Err(e) => {
                tracing::warn!("Error loading conversation history: {}", e);
                Vec::new()
            }
        }
    }

    /// Find a cached record for `query`: first an exact case-insensitive
    /// match on the stored query, then the first record where either query
    /// contains the other as a substring. Absence is expected and common.
    pub fn search<'a>(
        &self,
        query: &str,
        records: &'a [ConversationRecord],
    ) -> Option<&'a ConversationRecord> {
        let normalized = query.to_lowercase().trim().to_string();

        for record in records {
            if record.query.to_lowercase().trim() == normalized {
                tracing::debug!("Found exact match in history");
                return Some(record);
            }
        }

        for record in records {
            let stored = record.query.to_lowercase();
            let stored = stored.trim();
            if normalized.contains(stored) || stored.contains(&normalized) {
                tracing::debug!("Found similar match in history");
                return Some(record);
            }
        }

        None
    }

    /// Append a conversation and persist the whole collection. The
    /// final-answer text is the suffix after `FINAL_ANSWER:` when present,
    /// else the full answer.
    pub fn append(&self, query: &str, answer: &str, records: &mut Vec<ConversationRecord>) {
        let final_answer = match answer.split_once(FINAL_ANSWER_MARKER) {
            Some((_, rest)) => rest.trim().to_string(),
            None => answer.to_string(),
        };

        records.push(ConversationRecord {
            timestamp: chrono::Utc::now().to_rfc3339(),
            query: query.to_string(),
            answer: answer.to_string(),
            final_answer,
        });

        if let Err(e) = self.save(records) {
            tracing::warn!("Error saving conversation history: {}", e);
        } else {
            tracing::debug!("Added conversation to history: {}", query);
        }
    }

    fn save(&self, records: &[ConversationRecord]) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let raw = serde_json::to_string_pretty(records)?;
        fs::write(&self.path, raw)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_in(dir: &tempfile::TempDir) -> ConversationStore {
        ConversationStore::new(&dir.path().join("history.json"))
    }

    #[test]
    fn missing_file_loads_empty() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert!(store_in(&dir).load().is_empty());
    }

    #[test]
    fn append_then_load_round_trips() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = store_in(&dir);
        let mut records = store.load();

        store.append("What is 2+2?", "FINAL_ANSWER: 4", &mut records);

        let reloaded = store.load();
        assert_eq!(reloaded.len(), 1);
        assert_eq!(reloaded[0].query, "What is 2+2?");
        assert_eq!(reloaded[0].answer, "FINAL_ANSWER: 4");
        assert_eq!(reloaded[0].final_answer, "4");
    }

    #[test]
    fn append_without_marker_keeps_full_answer() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = store_in(&dir);
        let mut records = Vec::new();

        store.append("hello", "just some text", &mut records);

        assert_eq!(records[0].final_answer, "just some text");
    }

    #[test]
    fn exact_match_is_case_insensitive() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = store_in(&dir);
        let mut records = Vec::new();
        store.append("capital of france", "FINAL_ANSWER: Paris", &mut records);
        store.append("capital", "FINAL_ANSWER: depends", &mut records);

        // Prefers the exact record even though "capital" is a substring hit.
        let hit = store.search("Capital Of France", &records).expect("match");
        assert_eq!(hit.final_answer, "Paris");
    }

    #[test]
    fn substring_match_works_both_directions() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = store_in(&dir);
        let mut records = Vec::new();
        store.append("the capital of france", "FINAL_ANSWER: Paris", &mut records);

        assert!(store.search("capital of france please", &records).is_some());
        assert!(store.search("capital of", &records).is_some());
        assert!(store.search("weather in oslo", &records).is_none());
    }
}
