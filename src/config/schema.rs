use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::agent::agent_types::{AgentTypeConfig, ToolPermission};

/// The TOML file structure for agentloop.toml.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFile {
    pub general: Option<GeneralConfig>,
    pub limits: Option<LimitsConfig>,
    pub safety: Option<SafetyConfig>,
    pub logging: Option<LoggingConfig>,
    /// Extra or overriding agent types, keyed by type name.
    pub agent_types: Option<BTreeMap<String, AgentTypeEntry>>,
}

#[derive(Debug, Deserialize)]
pub struct GeneralConfig {
    pub model: Option<String>,
    pub workspace: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LimitsConfig {
    pub shell_timeout_secs: Option<u64>,
    pub output_limit: Option<usize>,
    pub max_tokens: Option<u32>,
    pub max_turns: Option<usize>,
    pub max_depth: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct SafetyConfig {
    /// If specified, fully replaces the default denylist.
    pub blocked_substrings: Option<Vec<BlocklistEntry>>,
    pub security_log: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    pub transcript_dir: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BlocklistEntry {
    pub pattern: String,
    pub reason: String,
}

/// One `[agent_types.<name>]` table.
#[derive(Debug, Clone, Deserialize)]
pub struct AgentTypeEntry {
    pub description: String,
    pub tools: ToolsField,
    pub prompt: String,
}

/// `tools = "*"` or `tools = ["bash", "read_file"]`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ToolsField {
    Wildcard(String),
    List(Vec<String>),
}

impl AgentTypeEntry {
    /// Convert a config table into a registry entry.
    pub fn into_agent_type(self, name: &str) -> Result<AgentTypeConfig, String> {
        let tools = match self.tools {
            ToolsField::Wildcard(w) if w == "*" => ToolPermission::AllBaseTools,
            ToolsField::Wildcard(other) => {
                return Err(format!(
                    "agent type `{name}`: tools must be \"*\" or a list, got \"{other}\""
                ));
            }
            ToolsField::List(names) => ToolPermission::Only(names.into_iter().collect()),
        };
        Ok(AgentTypeConfig {
            name: name.to_string(),
            description: self.description,
            tools,
            prompt: self.prompt,
        })
    }
}

/// Fully-resolved runtime configuration. All fields have values.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub model: String,
    /// Sandbox root for every path-based tool operation.
    pub workspace: PathBuf,
    pub shell_timeout_secs: u64,
    /// Character cap applied to every tool result.
    pub output_limit: usize,
    /// Output-size cap passed to the model on each call.
    pub max_tokens: u32,
    /// Model calls allowed per driver run before giving up.
    pub max_turns: usize,
    /// Deepest sub-agent nesting level allowed (top level is 0).
    pub max_depth: usize,
    pub blocked_substrings: Vec<(String, String)>,
    pub security_log_path: PathBuf,
    pub transcript_dir: Option<PathBuf>,
    pub agent_types: Vec<AgentTypeConfig>,
}

/// Partial config used during merge. All fields are Option so that
/// missing fields don't override lower-priority values.
#[derive(Debug, Clone, Default)]
pub struct PartialConfig {
    pub model: Option<String>,
    pub workspace: Option<PathBuf>,
    pub shell_timeout_secs: Option<u64>,
    pub output_limit: Option<usize>,
    pub max_tokens: Option<u32>,
    pub max_turns: Option<usize>,
    pub max_depth: Option<usize>,
    pub blocked_substrings: Option<Vec<(String, String)>>,
    pub security_log_path: Option<PathBuf>,
    pub transcript_dir: Option<PathBuf>,
    pub agent_types: Option<Vec<AgentTypeConfig>>,
}

impl ConfigFile {
    /// Flatten the sectioned file layout into a [`PartialConfig`].
    pub fn to_partial(self) -> Result<PartialConfig, String> {
        let general = self.general;
        let limits = self.limits;
        let safety = self.safety;

        let agent_types = match self.agent_types {
            Some(tables) => Some(
                tables
                    .into_iter()
                    .map(|(name, entry)| entry.into_agent_type(&name))
                    .collect::<Result<Vec<_>, _>>()?,
            ),
            None => None,
        };

        Ok(PartialConfig {
            model: general.as_ref().and_then(|g| g.model.clone()),
            workspace: general
                .as_ref()
                .and_then(|g| g.workspace.as_ref().map(PathBuf::from)),
            shell_timeout_secs: limits.as_ref().and_then(|l| l.shell_timeout_secs),
            output_limit: limits.as_ref().and_then(|l| l.output_limit),
            max_tokens: limits.as_ref().and_then(|l| l.max_tokens),
            max_turns: limits.as_ref().and_then(|l| l.max_turns),
            max_depth: limits.as_ref().and_then(|l| l.max_depth),
            blocked_substrings: safety.as_ref().and_then(|s| {
                s.blocked_substrings.as_ref().map(|entries| {
                    entries
                        .iter()
                        .map(|e| (e.pattern.clone(), e.reason.clone()))
                        .collect()
                })
            }),
            security_log_path: safety
                .as_ref()
                .and_then(|s| s.security_log.as_ref().map(PathBuf::from)),
            transcript_dir: self
                .logging
                .and_then(|l| l.transcript_dir.map(PathBuf::from)),
            agent_types,
        })
    }
}
