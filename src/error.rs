use std::path::PathBuf;

/// Errors related to configuration loading and validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse config at {path}: {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("Duplicate tool name `{0}` in tool set")]
    DuplicateTool(String),

    #[error("Agent type `{agent_type}` permits unknown tool `{tool}`")]
    UnknownPermittedTool { agent_type: String, tool: String },

    #[error("Nesting depth {depth} exceeds the configured maximum of {max_depth}")]
    DepthLimitExceeded { depth: usize, max_depth: usize },
}

/// Errors raised by sandboxed tool operations.
///
/// None of these ever leave the tool dispatcher: they are rendered as text
/// and fed back to the model so it can react on the next turn.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("path escapes workspace: {path}")]
    PathEscape { path: String },

    #[error("dangerous command blocked ({reason})")]
    CommandBlocked { command: String, reason: String },

    #[error("command timed out ({timeout_secs}s)")]
    CommandTimeout { timeout_secs: u64 },

    #[error("text not found in {path}")]
    TextNotFound { path: String },

    #[error("{path}: {source}")]
    FileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{tool}: missing required argument '{field}'")]
    MissingArgument { tool: String, field: &'static str },

    #[error("{tool}: invalid argument '{field}': {message}")]
    InvalidArgument {
        tool: String,
        field: &'static str,
        message: String,
    },

    #[error("unknown tool: {0}")]
    UnknownTool(String),

    #[error("unknown agent type '{0}'")]
    UnknownAgentType(String),

    #[error("sub-agent nesting depth {depth} exceeds the maximum of {max_depth}")]
    DepthLimitExceeded { depth: usize, max_depth: usize },

    #[error("sub-agent failed: {0}")]
    SubAgentFailed(String),

    #[error(transparent)]
    Exec(#[from] ExecError),
}

/// Errors related to shell command execution.
#[derive(Debug, thiserror::Error)]
pub enum ExecError {
    #[error("Failed to spawn shell process: {0}")]
    SpawnFailed(String),

    #[error("Process execution failed: {0}")]
    ProcessFailed(String),
}

/// Errors returned by a [`crate::model::ModelClient`].
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("request failed: {0}")]
    Request(String),

    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// Errors that end a conversation driver run.
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    #[error("Remote model call failed: {0}")]
    RemoteCallFailure(#[from] ModelError),

    #[error("No final answer after {turns} model calls")]
    IterationLimitExceeded { turns: usize },

    #[error("Conversation protocol violation: {0}")]
    Protocol(String),
}
