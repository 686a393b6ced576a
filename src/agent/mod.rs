pub mod agent_types;
pub mod conversation;
pub mod driver;
pub mod spawner;
pub mod system_prompt;
pub mod tools;
pub mod transcript;

use std::sync::Arc;

use agent_types::AgentTypeRegistry;
use driver::ConversationDriver;
use tools::ToolSet;

use crate::config::AppConfig;
use crate::error::ConfigError;
use crate::model::ModelClient;
use crate::sandbox::Sandbox;

/// Everything a driver at any depth shares: configuration, the sandbox, the
/// model client, the agent type registry and the base tool table.
///
/// Built once at startup and borrowed by every driver, including sub-agents.
pub struct Runtime {
    pub config: AppConfig,
    pub sandbox: Sandbox,
    pub model: Arc<dyn ModelClient>,
    pub agent_types: AgentTypeRegistry,
    pub base_tools: ToolSet,
    /// Nesting depth of the top-level agent in this process.
    pub depth: usize,
}

impl Runtime {
    /// Validate the configuration and build the shared runtime.
    ///
    /// `depth` is the inherited nesting depth (0 unless this process was
    /// started by a shell command of another agent).
    pub fn new(config: AppConfig, model: Arc<dyn ModelClient>, depth: usize) -> anyhow::Result<Self> {
        if depth > config.max_depth {
            return Err(ConfigError::DepthLimitExceeded {
                depth,
                max_depth: config.max_depth,
            }
            .into());
        }

        let base_tools = ToolSet::base()?;
        let agent_types = AgentTypeRegistry::new(config.agent_types.clone(), base_tools.names())?;
        let sandbox = Sandbox::new(&config)?;

        tracing::debug!(
            root = %sandbox.root().display(),
            agent_types = ?agent_types.names(),
            depth,
            "Runtime ready"
        );

        Ok(Self {
            config,
            sandbox,
            model,
            agent_types,
            base_tools,
            depth,
        })
    }

    /// Base tools, plus `task` when a sub-agent would still be within
    /// `max_depth`.
    pub fn top_level_tools(&self) -> Result<ToolSet, ConfigError> {
        if self.depth < self.config.max_depth && !self.agent_types.is_empty() {
            self.base_tools.with_spawn_tool(&self.agent_types)
        } else {
            Ok(self.base_tools.clone())
        }
    }

    /// A driver for the top-level agent.
    pub fn top_level_driver(&self) -> Result<ConversationDriver<'_>, ConfigError> {
        let tools = self.top_level_tools()?;
        let prompt = system_prompt::build_system_prompt(self.sandbox.root(), &tools, &self.agent_types);
        Ok(ConversationDriver::new(self, prompt, tools, self.depth, "main"))
    }
}
