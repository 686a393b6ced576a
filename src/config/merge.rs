use super::schema::{AppConfig, PartialConfig};
use crate::agent::agent_types::{AgentTypeConfig, builtin_agent_types};
use crate::sandbox::defaults::default_blocklist;
use std::path::PathBuf;

pub const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";
pub const DEFAULT_SHELL_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_OUTPUT_LIMIT: usize = 50_000;
pub const DEFAULT_MAX_TOKENS: u32 = 8000;
pub const DEFAULT_MAX_TURNS: usize = 50;
pub const DEFAULT_MAX_DEPTH: usize = 1;

impl PartialConfig {
    /// Merge self with a lower-priority fallback.
    /// Self's non-None values take precedence.
    /// For blocked_substrings: REPLACE semantics (if self has Some, use it entirely).
    /// For agent_types: both layers are kept, self's entries win by name.
    pub fn with_fallback(self, fallback: PartialConfig) -> PartialConfig {
        let agent_types = match (self.agent_types, fallback.agent_types) {
            (Some(ours), Some(theirs)) => Some(overlay_agent_types(theirs, ours)),
            (ours, theirs) => ours.or(theirs),
        };

        PartialConfig {
            model: self.model.or(fallback.model),
            workspace: self.workspace.or(fallback.workspace),
            shell_timeout_secs: self.shell_timeout_secs.or(fallback.shell_timeout_secs),
            output_limit: self.output_limit.or(fallback.output_limit),
            max_tokens: self.max_tokens.or(fallback.max_tokens),
            max_turns: self.max_turns.or(fallback.max_turns),
            max_depth: self.max_depth.or(fallback.max_depth),
            blocked_substrings: self.blocked_substrings.or(fallback.blocked_substrings),
            security_log_path: self.security_log_path.or(fallback.security_log_path),
            transcript_dir: self.transcript_dir.or(fallback.transcript_dir),
            agent_types,
        }
    }

    /// Convert to AppConfig, filling any remaining gaps with defaults.
    ///
    /// Configured agent types are layered over the built-in registry.
    pub fn finalize(self) -> AppConfig {
        let workspace = self
            .workspace
            .unwrap_or_else(|| PathBuf::from("./workspace"));
        let security_log_path = self
            .security_log_path
            .unwrap_or_else(default_security_log_path);
        let agent_types = match self.agent_types {
            Some(configured) => overlay_agent_types(builtin_agent_types(), configured),
            None => builtin_agent_types(),
        };

        AppConfig {
            model: self.model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            workspace,
            shell_timeout_secs: self.shell_timeout_secs.unwrap_or(DEFAULT_SHELL_TIMEOUT_SECS),
            output_limit: self.output_limit.unwrap_or(DEFAULT_OUTPUT_LIMIT),
            max_tokens: self.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            max_turns: self.max_turns.unwrap_or(DEFAULT_MAX_TURNS),
            max_depth: self.max_depth.unwrap_or(DEFAULT_MAX_DEPTH),
            blocked_substrings: self.blocked_substrings.unwrap_or_else(default_blocklist),
            security_log_path,
            transcript_dir: self.transcript_dir,
            agent_types,
        }
    }
}

/// Outside any sandbox root, so the model cannot rewrite its own audit trail.
/// Linux: ~/.local/share/agentloop/security.log
fn default_security_log_path() -> PathBuf {
    directories::ProjectDirs::from("", "", "agentloop")
        .map(|dirs| dirs.data_local_dir().join("security.log"))
        .unwrap_or_else(|| std::env::temp_dir().join("agentloop-security.log"))
}

/// Entries in `top` replace same-named entries in `base`; new names are appended.
fn overlay_agent_types(
    mut base: Vec<AgentTypeConfig>,
    top: Vec<AgentTypeConfig>,
) -> Vec<AgentTypeConfig> {
    for entry in top {
        match base.iter_mut().find(|b| b.name == entry.name) {
            Some(slot) => *slot = entry,
            None => base.push(entry),
        }
    }
    base
}
