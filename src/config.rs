//! Configuration management for Cortex Agent.
//!
//! Configuration can be set via environment variables:
//! - `OPENROUTER_API_KEY` - Required. API key for the text-generation backend.
//! - `DEFAULT_MODEL` - Optional. Model identifier. Defaults to `openai/gpt-4o-mini`.
//! - `HISTORY_FILE` - Optional. Conversation history path. Defaults to
//!   `historical_conversation_store.json`.
//! - `MEMORY_DIR` - Optional. Session memory base directory. Defaults to `memory`.
//! - `PROMPT_PATH` - Optional. Decision prompt template. Defaults to
//!   `prompts/decision_prompt.txt`.
//! - `PROFILES_PATH` - Optional. Tool profile file. Defaults to `config/profiles.yaml`.
//! - `MAX_STEPS` - Optional. Maximum plan/execute iterations per query. Defaults to `3`.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

/// Agent configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// API key for the text-generation backend
    pub api_key: String,

    /// LLM model identifier (OpenRouter format)
    pub default_model: String,

    /// Path of the persisted conversation history
    pub history_path: PathBuf,

    /// Base directory for per-session memory files
    pub memory_dir: PathBuf,

    /// Path of the decision prompt template
    pub prompt_path: PathBuf,

    /// Path of the tool profile file
    pub profiles_path: PathBuf,

    /// Maximum plan/execute iterations per user query
    pub max_steps: usize,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingEnvVar` if `OPENROUTER_API_KEY` is not set.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_key = std::env::var("OPENROUTER_API_KEY")
            .map_err(|_| ConfigError::MissingEnvVar("OPENROUTER_API_KEY".to_string()))?;

        let default_model = std::env::var("DEFAULT_MODEL")
            .unwrap_or_else(|_| "openai/gpt-4o-mini".to_string());

        let history_path = std::env::var("HISTORY_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("historical_conversation_store.json"));

        let memory_dir = std::env::var("MEMORY_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("memory"));

        let prompt_path = std::env::var("PROMPT_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("prompts/decision_prompt.txt"));

        let profiles_path = std::env::var("PROFILES_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config/profiles.yaml"));

        let max_steps = std::env::var("MAX_STEPS")
            .unwrap_or_else(|_| "3".to_string())
            .parse()
            .map_err(|e| ConfigError::InvalidValue("MAX_STEPS".to_string(), format!("{}", e)))?;

        Ok(Self {
            api_key,
            default_model,
            history_path,
            memory_dir,
            prompt_path,
            profiles_path,
            max_steps,
        })
    }

    /// Create a config with custom values (useful for testing).
    pub fn new(api_key: String, default_model: String) -> Self {
        Self {
            api_key,
            default_model,
            history_path: PathBuf::from("historical_conversation_store.json"),
            memory_dir: PathBuf::from("memory"),
            prompt_path: PathBuf::from("prompts/decision_prompt.txt"),
            profiles_path: PathBuf::from("config/profiles.yaml"),
            max_steps: 3,
        }
    }
}
