//! Session memory: an append-only log of typed events, persisted per session.
//!
//! Each session id has at least three hyphen-separated leading segments
//! (year-month-day by convention) which become the storage subdirectories,
//! so a day's sessions land together on disk. The full item list is
//! rewritten after every append: durability per event over throughput,
//! which is fine at interactive step counts.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Kind of a session memory event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryKind {
    RunMetadata,
    ToolCall,
    ToolOutput,
    FinalAnswer,
}

/// One event in a session's history.
///
/// Append-only; the only field ever mutated after construction is
/// `success`, which [`MemoryManager::patch_success`] may set retroactively.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryItem {
    /// Seconds since the Unix epoch.
    pub timestamp: f64,
    #[serde(rename = "type")]
    pub kind: MemoryKind,
    /// Human-readable summary of the event.
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_args: Option<HashMap<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_answer: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Tri-state: `None` = unknown, `Some(true/false)` = annotated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, Value>,
}

impl MemoryItem {
    fn new(kind: MemoryKind, text: String) -> Self {
        Self {
            timestamp: now_seconds(),
            kind,
            text,
            tool_name: None,
            tool_args: None,
            tool_result: None,
            final_answer: None,
            tags: Vec::new(),
            success: None,
            metadata: HashMap::new(),
        }
    }
}

/// Manages one session's memory log (load, append, scan, persist).
pub struct MemoryManager {
    session_id: String,
    memory_path: PathBuf,
    items: Vec<MemoryItem>,
}

impl MemoryManager {
    /// Open (or start) the memory log for `session_id`.
    ///
    /// The storage path is `<memory_dir>/<seg0>/<seg1>/<seg2>/session-<id>.json`
    /// where the segments are the id's first three hyphen-delimited components.
    ///
    /// # Errors
    ///
    /// Fails if the id has fewer than three components or an existing
    /// backing file cannot be parsed.
    pub fn new(session_id: &str, memory_dir: &Path) -> anyhow::Result<Self> {
        let segments: Vec<&str> = session_id.splitn(4, '-').collect();
        if segments.len() < 3 {
            anyhow::bail!(
                "session id '{}' must have at least three hyphen-separated components",
                session_id
            );
        }

        let memory_path = memory_dir
            .join(segments[0])
            .join(segments[1])
            .join(segments[2])
            .join(format!("session-{}.json", session_id));

        let items = if memory_path.exists() {
            let raw = fs::read_to_string(&memory_path)?;
            serde_json::from_str(&raw)?
        } else {
            Vec::new()
        };

        Ok(Self {
            session_id: session_id.to_string(),
            memory_path,
            items,
        })
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// All items recorded so far, oldest first.
    pub fn items(&self) -> &[MemoryItem] {
        &self.items
    }

    /// Append an item and persist the full log.
    pub fn add(&mut self, item: MemoryItem) {
        self.items.push(item);
        self.save();
    }

    pub fn add_run_metadata(&mut self, text: &str) {
        self.add(MemoryItem::new(MemoryKind::RunMetadata, text.to_string()));
    }

    pub fn add_tool_call(
        &mut self,
        tool_name: &str,
        tool_args: HashMap<String, Value>,
        tags: Vec<String>,
    ) {
        let mut item = MemoryItem::new(
            MemoryKind::ToolCall,
            format!("Called {} with {:?}", tool_name, tool_args),
        );
        item.tool_name = Some(tool_name.to_string());
        item.tool_args = Some(tool_args);
        item.tags = tags;
        self.add(item);
    }

    pub fn add_tool_output(
        &mut self,
        tool_name: &str,
        tool_args: HashMap<String, Value>,
        tool_result: Value,
        success: bool,
        tags: Vec<String>,
    ) {
        let mut item = MemoryItem::new(
            MemoryKind::ToolOutput,
            format!("Output of {}: {}", tool_name, tool_result),
        );
        item.tool_name = Some(tool_name.to_string());
        item.tool_args = Some(tool_args);
        item.tool_result = Some(tool_result);
        item.success = Some(success);
        item.tags = tags;
        self.add(item);
    }

    pub fn add_final_answer(&mut self, text: &str) {
        let mut item = MemoryItem::new(MemoryKind::FinalAnswer, text.to_string());
        item.final_answer = Some(text.to_string());
        self.add(item);
    }

    /// Names of tools that recently produced a successful output,
    /// most-recent-first, distinct, at most `limit`.
    pub fn find_recent_successes(&self, limit: usize) -> Vec<String> {
        let mut successes: Vec<String> = Vec::new();

        for item in self.items.iter().rev() {
            if item.kind == MemoryKind::ToolOutput && item.success == Some(true) {
                if let Some(name) = &item.tool_name {
                    if !successes.contains(name) {
                        successes.push(name.clone());
                    }
                }
            }
            if successes.len() >= limit {
                break;
            }
        }

        successes
    }

    /// Set the success flag on the most recent tool_call/tool_output item
    /// for `tool_name` and re-persist. Best-effort: a miss logs a warning
    /// and changes nothing.
    pub fn patch_success(&mut self, tool_name: &str, success: bool) {
        for item in self.items.iter_mut().rev() {
            let matches_kind =
                matches!(item.kind, MemoryKind::ToolCall | MemoryKind::ToolOutput);
            if matches_kind && item.tool_name.as_deref() == Some(tool_name) {
                item.success = Some(success);
                tracing::debug!("Marked {} as success={}", tool_name, success);
                self.save();
                return;
            }
        }

        tracing::warn!(
            "Tried to mark {} as success={} but no matching memory item found",
            tool_name,
            success
        );
    }

    /// Persist the full item list. I/O failures are logged, not propagated:
    /// losing an annotation must not abort the interaction.
    fn save(&self) {
        if let Err(e) = self.try_save() {
            tracing::warn!("Failed to persist session memory: {}", e);
        }
    }

    fn try_save(&self) -> anyhow::Result<()> {
        if let Some(parent) = self.memory_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let raw = serde_json::to_string_pretty(&self.items)?;
        fs::write(&self.memory_path, raw)?;
        Ok(())
    }
}

fn now_seconds() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn args(pairs: &[(&str, Value)]) -> HashMap<String, Value> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn rejects_short_session_id() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert!(MemoryManager::new("2026-08", dir.path()).is_err());
    }

    #[test]
    fn fresh_session_starts_empty() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mgr = MemoryManager::new("2026-08-30-abc", dir.path()).expect("manager");
        assert!(mgr.items().is_empty());
    }

    #[test]
    fn round_trip_persistence() {
        let dir = tempfile::tempdir().expect("tempdir");
        let id = "2026-08-30-roundtrip";
        {
            let mut mgr = MemoryManager::new(id, dir.path()).expect("manager");
            mgr.add_run_metadata("session started");
            mgr.add_tool_call("evaluate", args(&[("expression", json!("2+2"))]), vec![]);
            mgr.add_tool_output(
                "evaluate",
                args(&[("expression", json!("2+2"))]),
                json!({"result": 4}),
                true,
                vec!["math".to_string()],
            );
            mgr.add_final_answer("4");
        }

        let reloaded = MemoryManager::new(id, dir.path()).expect("reload");
        assert_eq!(reloaded.items().len(), 4);
        assert_eq!(reloaded.items()[0].kind, MemoryKind::RunMetadata);
        assert_eq!(reloaded.items()[2].success, Some(true));
        assert_eq!(reloaded.items()[2].tags, vec!["math".to_string()]);
        assert_eq!(reloaded.items()[3].final_answer.as_deref(), Some("4"));
    }

    #[test]
    fn storage_path_uses_first_three_segments() {
        let dir = tempfile::tempdir().expect("tempdir");
        let id = "2026-08-30-f00d";
        let mut mgr = MemoryManager::new(id, dir.path()).expect("manager");
        mgr.add_run_metadata("x");

        let expected = dir
            .path()
            .join("2026")
            .join("08")
            .join("30")
            .join(format!("session-{}.json", id));
        assert!(expected.exists());
    }

    #[test]
    fn find_recent_successes_is_distinct_and_bounded() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut mgr = MemoryManager::new("2026-08-30-succ", dir.path()).expect("manager");
        for tool in ["toolA", "toolB", "toolA"] {
            mgr.add_tool_output(tool, HashMap::new(), json!({}), true, vec![]);
        }

        assert_eq!(
            mgr.find_recent_successes(2),
            vec!["toolA".to_string(), "toolB".to_string()]
        );
        assert_eq!(mgr.find_recent_successes(1), vec!["toolA".to_string()]);
    }

    #[test]
    fn find_recent_successes_skips_failures() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut mgr = MemoryManager::new("2026-08-30-fail", dir.path()).expect("manager");
        mgr.add_tool_output("good", HashMap::new(), json!({}), true, vec![]);
        mgr.add_tool_output("bad", HashMap::new(), json!({}), false, vec![]);

        assert_eq!(mgr.find_recent_successes(5), vec!["good".to_string()]);
    }

    #[test]
    fn patch_success_targets_most_recent_match() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut mgr = MemoryManager::new("2026-08-30-patch", dir.path()).expect("manager");
        mgr.add_tool_call("toolX", HashMap::new(), vec![]);
        mgr.add_tool_call("toolX", HashMap::new(), vec![]);

        mgr.patch_success("toolX", true);

        assert_eq!(mgr.items()[0].success, None);
        assert_eq!(mgr.items()[1].success, Some(true));
    }

    #[test]
    fn patch_success_miss_is_noop() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut mgr = MemoryManager::new("2026-08-30-miss", dir.path()).expect("manager");
        mgr.add_run_metadata("only metadata here");

        mgr.patch_success("absent", false);

        assert_eq!(mgr.items().len(), 1);
        assert_eq!(mgr.items()[0].success, None);
    }
}
