//! Cortex Agent - interactive shell entry point.

use std::sync::Arc;

use cortex_agent::llm::OpenRouterClient;
use cortex_agent::shell::Shell;
use cortex_agent::tools::{ToolDispatcher, ToolRegistry};
use cortex_agent::Config;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cortex_agent=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;
    info!("Loaded configuration: model={}", config.default_model);

    let llm = Arc::new(OpenRouterClient::new(
        config.api_key.clone(),
        config.default_model.clone(),
    )?);

    let tools = ToolRegistry::from_profile(&config.profiles_path)?;
    info!("Tool catalog:\n{}", tools.tool_descriptions());

    Shell::new(config, llm, Arc::new(tools)).run().await?;

    Ok(())
}
