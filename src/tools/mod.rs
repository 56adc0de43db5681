//! Tool dispatch: a catalog of named tools the agent can invoke.
//!
//! The agent loop only sees [`ToolDispatcher`]; `ToolRegistry` is the
//! in-process implementation. Which tools are enabled comes from a YAML
//! profile file.

mod builtin;

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

pub use builtin::{Evaluate, WordCount};

/// A single invocable tool.
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    async fn execute(&self, args: Value) -> anyhow::Result<Value>;
}

/// What the agent loop needs from the tool layer: a describable catalog
/// and an invocation method.
#[async_trait]
pub trait ToolDispatcher: Send + Sync {
    /// One line per tool, suitable for inclusion in the decision prompt.
    fn tool_descriptions(&self) -> String;

    async fn call_tool(&self, name: &str, args: Value) -> anyhow::Result<Value>;
}

/// Tool profile file shape.
#[derive(Debug, Deserialize)]
struct Profile {
    #[serde(default)]
    tools: Vec<ToolProfile>,
}

#[derive(Debug, Deserialize)]
struct ToolProfile {
    id: String,
    #[serde(default = "default_enabled")]
    enabled: bool,
}

fn default_enabled() -> bool {
    true
}

/// In-process tool catalog.
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
    order: Vec<String>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
            order: Vec::new(),
        }
    }

    /// Registry with every builtin tool enabled.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for tool in builtin::all() {
            registry.register(tool);
        }
        registry
    }

    /// Build a registry from a YAML profile file. Unknown tool ids are
    /// logged and skipped; a missing profile file enables all builtins.
    pub fn from_profile(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            tracing::info!(
                "No tool profile at {}, enabling all builtin tools",
                path.display()
            );
            return Ok(Self::with_builtins());
        }

        let raw = fs::read_to_string(path)?;
        let profile: Profile = serde_yaml::from_str(&raw)?;

        let mut available: HashMap<String, Arc<dyn Tool>> = builtin::all()
            .into_iter()
            .map(|t| (t.name().to_string(), t))
            .collect();

        let mut registry = Self::new();
        for entry in profile.tools {
            if !entry.enabled {
                continue;
            }
            match available.remove(&entry.id) {
                Some(tool) => registry.register(tool),
                None => tracing::warn!("Unknown tool id in profile: {}", entry.id),
            }
        }

        Ok(registry)
    }

    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.order.push(tool.name().to_string());
        self.tools.insert(tool.name().to_string(), tool);
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ToolDispatcher for ToolRegistry {
    fn tool_descriptions(&self) -> String {
        self.order
            .iter()
            .filter_map(|name| self.tools.get(name))
            .map(|t| format!("- {}: {}", t.name(), t.description()))
            .collect::<Vec<_>>()
            .join("\n")
    }

    async fn call_tool(&self, name: &str, args: Value) -> anyhow::Result<Value> {
        let tool = self
            .tools
            .get(name)
            .ok_or_else(|| anyhow::anyhow!("Unknown tool: {}", name))?;

        tracing::debug!("Dispatching tool {} with args {}", name, args);
        tool.execute(args).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    #[tokio::test]
    async fn registry_dispatches_by_name() {
        let registry = ToolRegistry::with_builtins();
        let result = registry
            .call_tool("evaluate", json!({"expression": "2+2"}))
            .await
            .expect("dispatch");
        assert_eq!(result["result"], json!(4.0));
    }

    #[tokio::test]
    async fn unknown_tool_is_an_error() {
        let registry = ToolRegistry::with_builtins();
        assert!(registry.call_tool("nope", json!({})).await.is_err());
    }

    #[test]
    fn descriptions_list_every_registered_tool() {
        let registry = ToolRegistry::with_builtins();
        let descriptions = registry.tool_descriptions();
        assert!(descriptions.contains("- evaluate:"));
        assert!(descriptions.contains("- word_count:"));
    }

    #[test]
    fn profile_filters_tools() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        writeln!(
            file,
            "tools:\n  - id: evaluate\n  - id: word_count\n    enabled: false\n  - id: bogus"
        )
        .expect("write profile");

        let registry = ToolRegistry::from_profile(file.path()).expect("profile");
        let descriptions = registry.tool_descriptions();
        assert!(descriptions.contains("evaluate"));
        assert!(!descriptions.contains("word_count"));
    }

    #[test]
    fn missing_profile_enables_builtins() {
        let registry =
            ToolRegistry::from_profile(Path::new("/nonexistent/profiles.yaml")).expect("fallback");
        assert!(!registry.is_empty());
    }
}
