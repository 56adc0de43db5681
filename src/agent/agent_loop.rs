//! Core agent loop implementation.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::{json, Value};

use crate::config::Config;
use crate::llm::TextGenerator;
use crate::memory::MemoryManager;
use crate::tools::ToolDispatcher;

use super::executor::{self, extract_tool_calls};
use super::planner::{generate_plan, is_solve_plan};
use super::prompt;
use super::{FINAL_ANSWER_MARKER, FURTHER_PROCESSING_MARKER};

/// Structured decision over one step's result text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// A terminal answer; the loop stops.
    Final(String),
    /// Transformed input; the loop re-plans.
    Continue(String),
    /// No marker present; treated as a final answer verbatim.
    Raw(String),
}

/// Classify result text by its markers. `FINAL_ANSWER:` is tested first,
/// so it wins when both markers occur.
pub fn decide(text: &str) -> StepOutcome {
    if let Some((_, rest)) = text.split_once(FINAL_ANSWER_MARKER) {
        StepOutcome::Final(rest.trim().to_string())
    } else if let Some((_, rest)) = text.split_once(FURTHER_PROCESSING_MARKER) {
        StepOutcome::Continue(rest.trim().to_string())
    } else {
        StepOutcome::Raw(text.to_string())
    }
}

/// A completed run: the raw result text (markers included, as cached in
/// history) and the extracted answer shown to the user.
#[derive(Debug, Clone)]
pub struct AgentAnswer {
    pub raw: String,
    pub text: String,
}

/// The agent control loop. Owns one session for its lifetime.
pub struct AgentLoop {
    llm: Arc<dyn TextGenerator>,
    dispatcher: Arc<dyn ToolDispatcher>,
    memory: MemoryManager,
    session_id: String,
    prompt_template: String,
    max_steps: usize,
}

impl AgentLoop {
    /// Create a loop bound to `session_id`, or to a fresh session when
    /// `None`. Session ids start with the current date so memory files
    /// shard by day.
    pub fn new(
        config: &Config,
        llm: Arc<dyn TextGenerator>,
        dispatcher: Arc<dyn ToolDispatcher>,
        session_id: Option<String>,
    ) -> anyhow::Result<Self> {
        let session_id = session_id.unwrap_or_else(new_session_id);
        let memory = MemoryManager::new(&session_id, &config.memory_dir)?;
        let prompt_template = prompt::load_prompt_or_default(&config.prompt_path);

        Ok(Self {
            llm,
            dispatcher,
            memory,
            session_id,
            prompt_template,
            max_steps: config.max_steps,
        })
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Run the plan/execute cycle for one user query until a terminal
    /// answer or the step ceiling. Always produces an answer.
    pub async fn run(&mut self, input: &str) -> AgentAnswer {
        self.memory
            .add_run_metadata(&format!("Run started: {}", input));

        let tool_descriptions = self.dispatcher.tool_descriptions();
        let mut input = input.to_string();

        for step in 1..=self.max_steps {
            tracing::debug!("Agent step {}/{}", step, self.max_steps);

            let perception = self.perceive();
            let plan = generate_plan(
                self.llm.as_ref(),
                &input,
                &perception,
                self.memory.items(),
                &tool_descriptions,
                &self.prompt_template,
                step,
                self.max_steps,
            )
            .await;

            let result_text = if is_solve_plan(&plan) {
                self.execute_plan(&plan).await
            } else {
                // Terminal text straight from the planner.
                plan
            };

            match decide(&result_text) {
                StepOutcome::Final(answer) => {
                    self.memory.add_final_answer(&result_text);
                    return AgentAnswer {
                        raw: result_text,
                        text: answer,
                    };
                }
                StepOutcome::Continue(next_input) => {
                    tracing::info!("Further processing required: {}", next_input);
                    input = next_input;
                }
                StepOutcome::Raw(text) => {
                    self.memory.add_final_answer(&text);
                    return AgentAnswer {
                        raw: result_text,
                        text,
                    };
                }
            }
        }

        // Step ceiling hit with a continuation still pending. Fail open:
        // present the transformed input as the answer rather than nothing.
        tracing::warn!("Step ceiling reached without a terminal answer");
        self.memory.add_final_answer(&input);
        AgentAnswer {
            raw: input.clone(),
            text: input,
        }
    }

    /// Perception metadata for the planner: which tools worked recently.
    fn perceive(&self) -> String {
        let successes = self.memory.find_recent_successes(5);
        if successes.is_empty() {
            "no prior tool outcomes".to_string()
        } else {
            format!("recently successful tools: {}", successes.join(", "))
        }
    }

    /// Execute a plan's tool calls in order, recording each step into
    /// session memory, and render the plan's result text.
    async fn execute_plan(&mut self, plan: &str) -> String {
        let mut last_output: Option<String> = None;

        for call in extract_tool_calls(plan) {
            let args_map = value_to_map(&call.args);
            self.memory
                .add_tool_call(&call.name, args_map.clone(), Vec::new());

            match self.dispatcher.call_tool(&call.name, call.args.clone()).await {
                Ok(result) => {
                    self.memory.patch_success(&call.name, true);
                    last_output = Some(executor::result_text(&result));
                    self.memory
                        .add_tool_output(&call.name, args_map, result, true, Vec::new());
                }
                Err(e) => {
                    tracing::warn!("Tool {} failed: {}", call.name, e);
                    self.memory.patch_success(&call.name, false);
                    last_output = Some(format!("Error: {}", e));
                    self.memory.add_tool_output(
                        &call.name,
                        args_map,
                        json!({ "error": e.to_string() }),
                        false,
                        Vec::new(),
                    );
                }
            }
        }

        let template = executor::return_template(plan);
        executor::render_result(plan, template.as_deref(), last_output.as_deref())
    }
}

/// `YYYY-MM-DD-<uuid>`: the date segments become the memory subdirectories.
fn new_session_id() -> String {
    format!(
        "{}-{}",
        chrono::Local::now().format("%Y-%m-%d"),
        uuid::Uuid::new_v4()
    )
}

fn value_to_map(value: &Value) -> HashMap<String, Value> {
    match value {
        Value::Object(map) => map.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
        _ => HashMap::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decide_extracts_final_answer() {
        assert_eq!(
            decide("FINAL_ANSWER: 42"),
            StepOutcome::Final("42".to_string())
        );
    }

    #[test]
    fn decide_extracts_continuation() {
        assert_eq!(
            decide("FURTHER_PROCESSING_REQUIRED: summarize the fetched page"),
            StepOutcome::Continue("summarize the fetched page".to_string())
        );
    }

    #[test]
    fn decide_final_wins_over_continuation() {
        let text = "FURTHER_PROCESSING_REQUIRED: ignore FINAL_ANSWER: done";
        assert_eq!(decide(text), StepOutcome::Final("done".to_string()));
    }

    #[test]
    fn decide_without_markers_is_raw() {
        assert_eq!(
            decide("just some text"),
            StepOutcome::Raw("just some text".to_string())
        );
    }

    #[test]
    fn session_ids_have_date_prefix() {
        let id = new_session_id();
        let segments: Vec<&str> = id.splitn(4, '-').collect();
        assert_eq!(segments.len(), 4);
        assert_eq!(segments[0].len(), 4);
        assert_eq!(segments[1].len(), 2);
        assert_eq!(segments[2].len(), 2);
    }
}
