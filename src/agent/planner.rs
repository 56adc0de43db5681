//! Plan generation: one text-generation call plus strict output validation.
//!
//! The planner accepts exactly one shape of output: a function definition
//! named `solve` (optionally async). Anything else degrades to a terminal
//! marker with a placeholder answer, so the loop always receives
//! well-formed text and never crashes on a planning failure.

use std::sync::OnceLock;

use regex::Regex;

use crate::heuristics::run_input_checks;
use crate::llm::TextGenerator;
use crate::memory::MemoryItem;

use super::prompt::{render_prompt, PromptVars};
use super::FINAL_ANSWER_MARKER;

fn solve_signature() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?m)^\s*(async\s+)?def\s+solve\s*\(").expect("static regex")
    })
}

/// Whether `text` is an executable plan (contains a `solve` definition at
/// the start of a line).
pub(crate) fn is_solve_plan(text: &str) -> bool {
    solve_signature().is_match(text)
}

/// Generate the plan text for one step.
///
/// Returns either a `solve()` function body verbatim or a
/// `FINAL_ANSWER:`-prefixed terminal string. Never fails.
#[allow(clippy::too_many_arguments)]
pub async fn generate_plan(
    llm: &dyn TextGenerator,
    user_input: &str,
    perception: &str,
    memory_items: &[MemoryItem],
    tool_descriptions: &str,
    prompt_template: &str,
    step_num: usize,
    max_steps: usize,
) -> String {
    let check = run_input_checks(user_input);
    if !check.is_valid {
        tracing::warn!("Input validation issues: {}", check.issues.join("; "));
    }
    let user_input = check.sanitized;

    let memory_texts = if memory_items.is_empty() {
        "None".to_string()
    } else {
        memory_items
            .iter()
            .map(|m| format!("- {}", m.text))
            .collect::<Vec<_>>()
            .join("\n")
    };

    let prompt = render_prompt(
        prompt_template,
        &PromptVars {
            tool_descriptions,
            user_input: &user_input,
            step_num,
            max_steps,
            memory_texts: &memory_texts,
            perception,
        },
    );

    match llm.generate_text(&prompt).await {
        Ok(raw) => {
            let raw = strip_fence(raw.trim());
            tracing::debug!("Planner output: {}", raw);

            if is_solve_plan(&raw) {
                raw
            } else {
                tracing::warn!("Planner did not return a valid solve(), defaulting to FINAL_ANSWER");
                format!("{} [Could not generate valid solve()]", FINAL_ANSWER_MARKER)
            }
        }
        Err(e) => {
            tracing::warn!("Planning failed: {}", e);
            format!("{} [unknown]", FINAL_ANSWER_MARKER)
        }
    }
}

/// Strip a surrounding triple-backtick fence and an optional leading
/// language tag.
fn strip_fence(raw: &str) -> String {
    if !raw.starts_with("```") {
        return raw.to_string();
    }

    let inner = raw.trim_matches('`').trim();
    let inner = match inner.get(..6) {
        Some(tag) if tag.eq_ignore_ascii_case("python") => inner[6..].trim(),
        _ => inner,
    };
    inner.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct FixedGenerator(String);

    #[async_trait]
    impl TextGenerator for FixedGenerator {
        async fn generate_text(&self, _prompt: &str) -> anyhow::Result<String> {
            Ok(self.0.clone())
        }
    }

    struct FailingGenerator;

    #[async_trait]
    impl TextGenerator for FailingGenerator {
        async fn generate_text(&self, _prompt: &str) -> anyhow::Result<String> {
            anyhow::bail!("backend unavailable")
        }
    }

    async fn plan_for(llm: &dyn TextGenerator) -> String {
        generate_plan(llm, "2+2?", "fresh", &[], "- evaluate: math", "{user_input}", 1, 3).await
    }

    #[tokio::test]
    async fn valid_solve_is_returned_verbatim() {
        let llm = FixedGenerator("def solve():\n    return \"FINAL_ANSWER: 4\"".to_string());
        let plan = plan_for(&llm).await;
        assert!(plan.starts_with("def solve():"));
    }

    #[tokio::test]
    async fn async_solve_is_accepted() {
        let llm = FixedGenerator("async def solve():\n    pass".to_string());
        assert!(is_solve_plan(&plan_for(&llm).await));
    }

    #[tokio::test]
    async fn fenced_output_is_unwrapped() {
        let llm = FixedGenerator(
            "```python\ndef solve():\n    return \"FINAL_ANSWER: ok\"\n```".to_string(),
        );
        let plan = plan_for(&llm).await;
        assert!(plan.starts_with("def solve():"));
        assert!(!plan.contains("```"));
    }

    #[tokio::test]
    async fn malformed_output_becomes_placeholder_terminal() {
        let llm = FixedGenerator("I think the answer is 4.".to_string());
        assert_eq!(
            plan_for(&llm).await,
            "FINAL_ANSWER: [Could not generate valid solve()]"
        );
    }

    #[tokio::test]
    async fn generation_failure_becomes_unknown_terminal() {
        assert_eq!(plan_for(&FailingGenerator).await, "FINAL_ANSWER: [unknown]");
    }

    #[test]
    fn solve_must_start_a_line() {
        assert!(!is_solve_plan("the plan would def solve( things"));
        assert!(is_solve_plan("  def solve(query):"));
    }
}
