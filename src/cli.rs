use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "agentloop",
    version,
    about = "Tool-using model loop with isolated sub-agents"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the agent. Without a prompt, starts an interactive session.
    Run {
        /// One-shot prompt; the final answer is printed and the process exits
        prompt: Option<String>,

        /// Model name, passed through to the model client (e.g. "openai::gpt-4o")
        #[arg(short, long)]
        model: Option<String>,

        /// Sandbox root directory
        #[arg(short, long)]
        workspace: Option<PathBuf>,

        /// Shell command timeout in seconds
        #[arg(long)]
        timeout: Option<u64>,

        /// Maximum model calls per run before giving up
        #[arg(long)]
        max_turns: Option<usize>,

        /// Path to config file (replaces the global config file)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// List the available sub-agent types
    Agents {
        /// Sandbox root directory (for its agentloop.toml)
        #[arg(short, long)]
        workspace: Option<PathBuf>,

        /// Path to config file (replaces the global config file)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}
