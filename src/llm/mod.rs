//! Text-generation capability.
//!
//! The planner only needs `generate_text(prompt) -> text`, so that is the
//! whole trait. The shipped implementation talks to an OpenRouter-compatible
//! chat-completions endpoint.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

/// TCP connection timeout.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Total request timeout. Plan generation is a single non-streaming call.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

const OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api/v1";

/// An opaque capability that turns a prompt into text.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate_text(&self, prompt: &str) -> anyhow::Result<String>;
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// OpenRouter chat-completions client.
pub struct OpenRouterClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl OpenRouterClient {
    pub fn new(api_key: String, model: String) -> anyhow::Result<Self> {
        Self::with_base_url(api_key, model, OPENROUTER_BASE_URL.to_string())
    }

    /// Point the client at a different OpenAI-compatible endpoint.
    pub fn with_base_url(api_key: String, model: String, base_url: String) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            http,
            base_url,
            api_key,
            model,
        })
    }
}

#[async_trait]
impl TextGenerator for OpenRouterClient {
    async fn generate_text(&self, prompt: &str) -> anyhow::Result<String> {
        let body = json!({
            "model": self.model,
            "messages": [{ "role": "user", "content": prompt }],
        });

        let response = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            anyhow::bail!("LLM request failed with status {}: {}", status, detail);
        }

        let parsed: ChatCompletionResponse = response.json().await?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| anyhow::anyhow!("LLM returned no choices"))?;

        Ok(content)
    }
}
