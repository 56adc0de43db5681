//! # Cortex Agent
//!
//! An interactive multi-step reasoning agent.
//!
//! This library provides:
//! - A step-bounded plan/execute/re-plan agent loop
//! - Per-session memory with eager JSON persistence
//! - A conversation history cache that short-circuits repeated queries
//! - Integration with OpenRouter-compatible endpoints for plan generation
//!
//! ## Architecture
//!
//! The agent follows a plan-then-execute pattern:
//! 1. Receive a query from the interactive shell
//! 2. Check the conversation history for a cached answer
//! 3. Ask the planner for a `solve()` plan (or a terminal answer)
//! 4. Run the plan's tool calls through the dispatcher, record each step
//!    into session memory, and decide: terminate, or re-plan with
//!    transformed input
//!
//! ## Example
//!
//! ```rust,ignore
//! use cortex_agent::{config::Config, agent::AgentLoop};
//!
//! let config = Config::from_env()?;
//! let mut agent = AgentLoop::new(&config, llm, dispatcher, None)?;
//! let answer = agent.run("What is 2+2?").await;
//! ```

pub mod agent;
pub mod config;
pub mod heuristics;
pub mod llm;
pub mod memory;
pub mod shell;
pub mod tools;

pub use config::Config;
