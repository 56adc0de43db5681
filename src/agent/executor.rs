//! Plan execution helpers.
//!
//! A validated plan is a small orchestration routine: a sequence of
//! `await mcp.call_tool("name", {...})` invocations ending in a return
//! statement. The loop drives the actual dispatch; this module extracts
//! the planned calls and renders the final result text, substituting the
//! last tool output for the plan's `{result}` placeholder.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::{json, Value};

use super::{FINAL_ANSWER_MARKER, FURTHER_PROCESSING_MARKER};

/// One tool invocation named by a plan.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedCall {
    pub name: String,
    pub args: Value,
}

fn call_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?s)call_tool\(\s*["']([A-Za-z0-9_\-]+)["']\s*(?:,\s*(\{.*?\}))?\s*\)"#)
            .expect("static regex")
    })
}

fn return_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?m)^\s*return\s+f?["'](.+?)["']\s*$"#).expect("static regex")
    })
}

/// Extract the tool invocations named by `plan`, in order. Arguments that
/// are not valid JSON degrade to an empty object; the tool reports its own
/// missing-argument errors.
pub fn extract_tool_calls(plan: &str) -> Vec<PlannedCall> {
    call_pattern()
        .captures_iter(plan)
        .map(|cap| {
            let name = cap[1].to_string();
            let args = cap
                .get(2)
                .and_then(|m| serde_json::from_str(m.as_str()).ok())
                .unwrap_or_else(|| json!({}));
            PlannedCall { name, args }
        })
        .collect()
}

/// The string literal of the first return statement carrying a marker,
/// if the plan has one.
pub fn return_template(plan: &str) -> Option<String> {
    return_pattern()
        .captures_iter(plan)
        .map(|cap| cap[1].to_string())
        .find(|s| s.contains(FINAL_ANSWER_MARKER) || s.contains(FURTHER_PROCESSING_MARKER))
}

/// Render the plan's result text from its return template and the last
/// tool output. With no marker template the last output stands alone, and
/// with no output at all the plan text itself is the result (fail-open:
/// the loop treats unrecognized text as a final answer).
pub fn render_result(plan: &str, template: Option<&str>, last_output: Option<&str>) -> String {
    match template {
        Some(t) if t.contains("{result}") => t.replace("{result}", last_output.unwrap_or("")),
        Some(t) => t.to_string(),
        None => last_output.unwrap_or(plan.trim()).to_string(),
    }
}

/// Flatten a tool result into presentable text: the `result` field of a
/// mapping when present, else the value itself.
pub fn result_text(value: &Value) -> String {
    let inner = match value {
        Value::Object(map) => map.get("result").unwrap_or(value),
        other => other,
    };
    match inner {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
