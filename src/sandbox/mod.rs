//! Sandboxed executor: the only code that touches the filesystem or spawns
//! processes on the model's behalf.
//!
//! Every path goes through [`WorkspaceGuard::resolve`], every command through
//! the [`CommandFilter`] denylist and a wall-clock timeout, and every textual
//! result is capped at `output_limit` characters.

pub mod command_filter;
pub mod defaults;
pub mod workspace;

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use command_filter::{BlockedCommand, CommandFilter};
use workspace::WorkspaceGuard;

use crate::config::AppConfig;
use crate::error::ToolError;
use crate::exec::execute_shell;

/// Returned by [`Sandbox::run_command`] when a command prints nothing.
pub const NO_OUTPUT: &str = "(no output)";

/// Environment variable carrying the nesting depth into shell commands.
pub const DEPTH_ENV_VAR: &str = "AGENTLOOP_DEPTH";

/// Combined command filter, path guard and output cap.
pub struct Sandbox {
    command_filter: CommandFilter,
    workspace_guard: WorkspaceGuard,
    timeout_secs: u64,
    output_limit: usize,
    security_log_path: PathBuf,
}

impl Sandbox {
    /// Build a Sandbox from the resolved application configuration.
    ///
    /// Creates the sandbox root if it does not exist yet.
    pub fn new(config: &AppConfig) -> anyhow::Result<Self> {
        let command_filter = CommandFilter::new(&config.blocked_substrings)
            .map_err(|e| anyhow::anyhow!("Failed to compile command denylist: {}", e))?;

        let workspace_guard = WorkspaceGuard::new(&config.workspace)
            .map_err(|e| anyhow::anyhow!("Failed to initialize sandbox root: {}", e))?;

        Ok(Self {
            command_filter,
            workspace_guard,
            timeout_secs: config.shell_timeout_secs,
            output_limit: config.output_limit,
            security_log_path: config.security_log_path.clone(),
        })
    }

    /// Get the canonical sandbox root.
    pub fn root(&self) -> &Path {
        self.workspace_guard.canonical_root()
    }

    /// Resolve a path relative to the sandbox root, refusing escapes.
    pub fn resolve_path(&self, path: &str) -> Result<PathBuf, ToolError> {
        self.workspace_guard.resolve(path)
    }

    /// Run a shell command in the sandbox root.
    ///
    /// 1. Denylisted commands are refused and logged; nothing is spawned.
    /// 2. Allowed commands run with the configured timeout. `depth` is
    ///    exported as `AGENTLOOP_DEPTH=depth+1` so a nested invocation of
    ///    this binary knows how deep it is.
    /// 3. Output is stdout+stderr, trimmed and capped, or [`NO_OUTPUT`].
    pub async fn run_command(&self, command: &str, depth: usize) -> Result<String, ToolError> {
        if let Some(blocked) = self.command_filter.check(command) {
            self.log_blocked_command(&blocked);
            return Err(ToolError::CommandBlocked {
                command: blocked.command,
                reason: blocked.reason,
            });
        }

        let env = [(DEPTH_ENV_VAR, (depth + 1).to_string())];
        let result = execute_shell(command, self.root(), self.timeout_secs, &env).await?;
        if result.timed_out {
            return Err(ToolError::CommandTimeout {
                timeout_secs: self.timeout_secs,
            });
        }

        let output = result.combined_output();
        if output.is_empty() {
            Ok(NO_OUTPUT.to_string())
        } else {
            Ok(self.truncate(output))
        }
    }

    /// Read a UTF-8 file. With a non-zero `limit` shorter than the file, only
    /// the first `limit` lines are returned, followed by an omission marker.
    pub async fn read_file(&self, path: &str, limit: Option<usize>) -> Result<String, ToolError> {
        let full_path = self.resolve_path(path)?;
        let text = tokio::fs::read_to_string(&full_path)
            .await
            .map_err(|source| file_io(path, source))?;

        let text = match limit {
            Some(limit) if limit > 0 => limit_lines(&text, limit),
            _ => text,
        };
        Ok(self.truncate(text))
    }

    /// Overwrite a file, creating missing parent directories.
    pub async fn write_file(&self, path: &str, content: &str) -> Result<String, ToolError> {
        let full_path = self.resolve_path(path)?;
        if let Some(parent) = full_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| file_io(path, source))?;
        }
        tokio::fs::write(&full_path, content)
            .await
            .map_err(|source| file_io(path, source))?;

        tracing::debug!(path, bytes = content.len(), "Wrote file");
        Ok(format!("Wrote {} bytes to {}", content.len(), path))
    }

    /// Replace the first occurrence of `old_text` with `new_text`.
    pub async fn edit_file(
        &self,
        path: &str,
        old_text: &str,
        new_text: &str,
    ) -> Result<String, ToolError> {
        if old_text.is_empty() {
            return Err(ToolError::InvalidArgument {
                tool: "edit_file".to_string(),
                field: "old_text",
                message: "must not be empty".to_string(),
            });
        }

        let full_path = self.resolve_path(path)?;
        let content = tokio::fs::read_to_string(&full_path)
            .await
            .map_err(|source| file_io(path, source))?;

        if !content.contains(old_text) {
            return Err(ToolError::TextNotFound {
                path: path.to_string(),
            });
        }

        let updated = content.replacen(old_text, new_text, 1);
        tokio::fs::write(&full_path, updated)
            .await
            .map_err(|source| file_io(path, source))?;
        Ok(format!("Edited {path}"))
    }

    /// Cap `text` at the configured number of characters.
    pub fn truncate(&self, text: String) -> String {
        truncate_chars(text, self.output_limit)
    }

    /// Append a JSON line to the security log for a blocked command.
    ///
    /// If the log file cannot be written, a warning is logged via tracing but
    /// the command check is not affected.
    fn log_blocked_command(&self, blocked: &BlockedCommand) {
        tracing::warn!(command = %blocked.command, reason = %blocked.reason, "Command blocked");

        let entry = SecurityLogEntry {
            timestamp: chrono::Utc::now().to_rfc3339(),
            blocked,
        };
        let log_entry = match serde_json::to_string(&entry) {
            Ok(line) => line + "\n",
            Err(e) => {
                tracing::warn!("Failed to serialize security log entry: {}", e);
                return;
            }
        };

        if let Some(parent) = self.security_log_path.parent() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                tracing::warn!("Failed to create security log directory {}: {}", parent.display(), e);
            }
        }

        match OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.security_log_path)
        {
            Ok(mut file) => {
                if let Err(e) = file.write_all(log_entry.as_bytes()) {
                    tracing::warn!(
                        "Failed to write to security log at {}: {}",
                        self.security_log_path.display(),
                        e
                    );
                }
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to open security log at {}: {}",
                    self.security_log_path.display(),
                    e
                );
            }
        }
    }
}

/// One line of the security log.
#[derive(serde::Serialize)]
struct SecurityLogEntry<'a> {
    timestamp: String,
    #[serde(flatten)]
    blocked: &'a BlockedCommand,
}

fn file_io(path: &str, source: std::io::Error) -> ToolError {
    ToolError::FileIo {
        path: path.to_string(),
        source,
    }
}

/// Keep the first `limit` lines and note how many were dropped.
fn limit_lines(text: &str, limit: usize) -> String {
    let lines: Vec<&str> = text.lines().collect();
    if limit >= lines.len() {
        return text.to_string();
    }
    let mut kept = lines[..limit].join("\n");
    kept.push_str(&format!("\n... ({} more lines)", lines.len() - limit));
    kept
}

/// Truncate to at most `max_chars` characters without splitting one.
pub fn truncate_chars(mut text: String, max_chars: usize) -> String {
    if let Some((byte_idx, _)) = text.char_indices().nth(max_chars) {
        text.truncate(byte_idx);
    }
    text
}
