//! Interactive shell: reads queries, consults the conversation history,
//! and drives the agent loop.
//!
//! Commands: `exit` ends the session, `new` drops the current session id
//! so the next query starts a fresh memory log. Anything else is a query.

use std::io::Write;
use std::sync::Arc;

use crate::agent::AgentLoop;
use crate::config::Config;
use crate::llm::TextGenerator;
use crate::memory::ConversationStore;
use crate::tools::ToolDispatcher;

pub struct Shell {
    config: Config,
    llm: Arc<dyn TextGenerator>,
    dispatcher: Arc<dyn ToolDispatcher>,
}

impl Shell {
    pub fn new(
        config: Config,
        llm: Arc<dyn TextGenerator>,
        dispatcher: Arc<dyn ToolDispatcher>,
    ) -> Self {
        Self {
            config,
            llm,
            dispatcher,
        }
    }

    /// Run the outer loop until `exit`, EOF, or Ctrl-C.
    pub async fn run(&self) -> anyhow::Result<()> {
        println!("Cortex Agent ready. 'exit' quits, 'new' starts a fresh session.");

        let store = ConversationStore::new(&self.config.history_path);
        let mut current_session: Option<String> = None;

        loop {
            let line = tokio::select! {
                line = read_line("What do you want to solve today? > ") => line?,
                _ = tokio::signal::ctrl_c() => {
                    println!("\nReceived exit signal. Shutting down.");
                    break;
                }
            };

            let Some(line) = line else { break };
            let input = line.trim();

            if input.is_empty() {
                continue;
            }
            if input.eq_ignore_ascii_case("exit") {
                break;
            }
            if input.eq_ignore_ascii_case("new") {
                current_session = None;
                continue;
            }

            // Loaded once per query and passed down; append reuses it.
            let mut records = store.load();

            if let Some(record) = store.search(input, &records) {
                println!("Found an answer to this in history.");
                let accept = read_line("Show the cached answer? (y/n) > ").await?;
                match accept.as_deref().map(str::trim) {
                    Some(a) if a.eq_ignore_ascii_case("y") => {
                        println!("Previous answer: {}", record.final_answer);
                        continue;
                    }
                    _ => println!("Running the agent for a fresh answer..."),
                }
            }

            let mut agent = match AgentLoop::new(
                &self.config,
                Arc::clone(&self.llm),
                Arc::clone(&self.dispatcher),
                current_session.clone(),
            ) {
                Ok(agent) => agent,
                Err(e) => {
                    tracing::error!("Could not start agent session: {}", e);
                    current_session = None;
                    continue;
                }
            };
            current_session = Some(agent.session_id().to_string());

            let answer = agent.run(input).await;
            println!("Final answer: {}", answer.text);
            store.append(input, &answer.raw, &mut records);
        }

        Ok(())
    }
}

/// Prompt and read one line from stdin. `None` means EOF.
async fn read_line(prompt: &str) -> anyhow::Result<Option<String>> {
    print!("{}", prompt);
    std::io::stdout().flush()?;

    let line = tokio::task::spawn_blocking(|| {
        let mut buf = String::new();
        let n = std::io::stdin().read_line(&mut buf)?;
        Ok::<_, std::io::Error>((n > 0).then_some(buf))
    })
    .await??;

    Ok(line)
}
