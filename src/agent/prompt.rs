//! Decision prompt loading and rendering.

use std::fs;
use std::path::Path;

/// Fallback template used when the configured prompt file is unreadable.
/// Keeps the shell alive; the file is the intended source of truth.
const DEFAULT_TEMPLATE: &str = r#"You are a planning agent. You have these tools:
{tool_descriptions}

User request (step {step_num} of {max_steps}):
{user_input}

Perception: {perception}

Memory so far:
{memory_texts}

Respond with a single Python function `async def solve():` that calls
tools via `await mcp.call_tool("<tool_name>", {"arg": value})` and returns
a string starting with "FINAL_ANSWER: " or
"FURTHER_PROCESSING_REQUIRED: ". If no tool is needed, return the answer
directly: return "FINAL_ANSWER: <answer>". At the last step you must
return a FINAL_ANSWER.
"#;

/// Named values substituted into the template.
pub struct PromptVars<'a> {
    pub tool_descriptions: &'a str,
    pub user_input: &'a str,
    pub step_num: usize,
    pub max_steps: usize,
    pub memory_texts: &'a str,
    pub perception: &'a str,
}

/// Read a prompt template from disk.
pub fn load_prompt(path: &Path) -> anyhow::Result<String> {
    fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to load prompt {}: {}", path.display(), e))
}

/// Like [`load_prompt`] but falls back to the builtin template with a
/// warning instead of failing.
pub fn load_prompt_or_default(path: &Path) -> String {
    match load_prompt(path) {
        Ok(template) => template,
        Err(e) => {
            tracing::warn!("{}; using builtin prompt template", e);
            DEFAULT_TEMPLATE.to_string()
        }
    }
}

/// Fill the template's named placeholders.
pub fn render_prompt(template: &str, vars: &PromptVars) -> String {
    template
        .replace("{tool_descriptions}", vars.tool_descriptions)
        .replace("{user_input}", vars.user_input)
        .replace("{step_num}", &vars.step_num.to_string())
        .replace("{max_steps}", &vars.max_steps.to_string())
        .replace("{memory_texts}", vars.memory_texts)
        .replace("{perception}", vars.perception)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_all_placeholders() {
        let rendered = render_prompt(
            "tools:{tool_descriptions} q:{user_input} {step_num}/{max_steps} mem:{memory_texts} p:{perception}",
            &PromptVars {
                tool_descriptions: "- evaluate: math",
                user_input: "2+2?",
                step_num: 1,
                max_steps: 3,
                memory_texts: "None",
                perception: "fresh",
            },
        );
        assert_eq!(rendered, "tools:- evaluate: math q:2+2? 1/3 mem:None p:fresh");
    }

    #[test]
    fn missing_file_falls_back_to_default() {
        let template = load_prompt_or_default(Path::new("/nonexistent/prompt.txt"));
        assert!(template.contains("{user_input}"));
        assert!(template.contains("{memory_texts}"));
    }
}
