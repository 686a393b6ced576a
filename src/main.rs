use std::sync::Arc;

use anyhow::Context;
use clap::Parser;

use agentloop::agent::Runtime;
use agentloop::agent::agent_types::{AgentTypeRegistry, ToolPermission};
use agentloop::agent::conversation::Conversation;
use agentloop::agent::tools::ToolSet;
use agentloop::cli::{Cli, Commands};
use agentloop::config;
use agentloop::model::genai_client::GenaiClient;
use agentloop::repl;
use agentloop::sandbox::DEPTH_ENV_VAR;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr; stdout carries only answers.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = config::load_config(&cli)?;
    tracing::info!(model = %config.model, workspace = %config.workspace.display(), "Config loaded");

    match &cli.command {
        Commands::Run { prompt, .. } => {
            let depth = inherited_depth()?;
            let model = Arc::new(GenaiClient::new(config.model.clone()));
            let rt = Runtime::new(config, model, depth)?;

            tracing::info!(
                model = %rt.config.model,
                root = %rt.sandbox.root().display(),
                timeout_secs = rt.config.shell_timeout_secs,
                depth,
                "Sandbox ready"
            );

            match prompt {
                Some(prompt) => {
                    let mut driver = rt.top_level_driver()?.with_progress(true);
                    let answer = driver.run(prompt, &mut Conversation::new()).await?;
                    println!("{answer}");
                }
                None => repl::run_session(&rt).await?,
            }
        }
        Commands::Agents { .. } => {
            let base_tools = ToolSet::base()?;
            let registry = AgentTypeRegistry::new(config.agent_types, base_tools.names())?;
            for agent_type in registry.iter() {
                let tools = match &agent_type.tools {
                    ToolPermission::AllBaseTools => base_tools.names().join(", "),
                    ToolPermission::Only(names) => {
                        names.iter().map(String::as_str).collect::<Vec<_>>().join(", ")
                    }
                };
                println!("{}: {}", agent_type.name, agent_type.description);
                println!("    tools: {tools}");
            }
        }
    }

    Ok(())
}

/// Nesting depth inherited from a parent agent's shell command, or 0.
fn inherited_depth() -> anyhow::Result<usize> {
    match std::env::var(DEPTH_ENV_VAR) {
        Ok(value) => value
            .trim()
            .parse()
            .with_context(|| format!("Invalid {DEPTH_ENV_VAR} value: {value:?}")),
        Err(_) => Ok(0),
    }
}
