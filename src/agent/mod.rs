//! Agent module - the core plan/execute/re-plan logic.
//!
//! One user query drives a bounded inner loop:
//! 1. Ask the planner for a `solve()` plan (or a terminal answer)
//! 2. Execute the plan's tool calls through the dispatcher
//! 3. Decide on the result text: terminate, or re-plan with transformed input
//!
//! The planner speaks in literal markers (`FINAL_ANSWER:`,
//! `FURTHER_PROCESSING_REQUIRED:`); the loop converts them into a
//! [`StepOutcome`] at the boundary and works structurally from there.

mod agent_loop;
mod executor;
mod planner;
mod prompt;

pub use agent_loop::{decide, AgentAnswer, AgentLoop, StepOutcome};
pub use planner::generate_plan;
pub use prompt::{load_prompt, render_prompt, PromptVars};

/// Terminal marker: the text after it is the final answer.
pub const FINAL_ANSWER_MARKER: &str = "FINAL_ANSWER:";

/// Continuation marker: the text after it re-enters planning as new input.
pub const FURTHER_PROCESSING_MARKER: &str = "FURTHER_PROCESSING_REQUIRED:";
