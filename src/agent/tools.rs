//! Tool schema definitions and dispatch for the conversation driver.
//!
//! A [`ToolSet`] is the lookup table from tool name to handler kind, built
//! once and checked for duplicate names. The same table decides both which
//! schemas the model is shown and which names [`dispatch_tool_call`] will
//! execute, so a tool filtered out of a sub-agent's set is invisible to it
//! and unknown if called anyway.
//!
//! Tool errors are always returned as `Error: ...` strings (never panics or
//! `Err` variants) so the model can observe the error and react.

use std::collections::HashMap;

use serde_json::{Value, json};

use super::Runtime;
use super::agent_types::{AgentTypeRegistry, ToolPermission};
use super::conversation::ToolCall;
use super::spawner::{SpawnRequest, spawn_sub_agent};
use crate::error::{ConfigError, ToolError};
use crate::model::ToolSchema;

pub const BASH: &str = "bash";
pub const READ_FILE: &str = "read_file";
pub const WRITE_FILE: &str = "write_file";
pub const EDIT_FILE: &str = "edit_file";
pub const TASK: &str = "task";

/// Which handler a tool name routes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolKind {
    Bash,
    ReadFile,
    WriteFile,
    EditFile,
    SpawnTask,
}

#[derive(Debug, Clone)]
pub struct ToolSpec {
    pub kind: ToolKind,
    pub schema: ToolSchema,
}

impl ToolSpec {
    fn new(kind: ToolKind, name: &str, description: &str, input_schema: Value) -> Self {
        Self {
            kind,
            schema: ToolSchema {
                name: name.to_string(),
                description: description.to_string(),
                input_schema,
            },
        }
    }

    pub fn name(&self) -> &str {
        &self.schema.name
    }
}

/// Define the four base tools every agent type draws from.
pub fn base_tool_specs() -> Vec<ToolSpec> {
    vec![
        ToolSpec::new(
            ToolKind::Bash,
            BASH,
            "Run a shell command in the workspace directory. Use for ls, find, grep, git, \
             build and test commands. Output is stdout followed by stderr.",
            json!({
                "type": "object",
                "properties": {
                    "command": {
                        "type": "string",
                        "description": "The shell command to execute"
                    }
                },
                "required": ["command"]
            }),
        ),
        ToolSpec::new(
            ToolKind::ReadFile,
            READ_FILE,
            "Read the contents of a file as UTF-8 text.",
            json!({
                "type": "object",
                "properties": {
                    "path": {
                        "type": "string",
                        "description": "File path relative to the workspace root"
                    },
                    "limit": {
                        "type": "integer",
                        "description": "Maximum number of lines to read (default: all)"
                    }
                },
                "required": ["path"]
            }),
        ),
        ToolSpec::new(
            ToolKind::WriteFile,
            WRITE_FILE,
            "Write content to a file, replacing it entirely. Parent directories are \
             created as needed.",
            json!({
                "type": "object",
                "properties": {
                    "path": {
                        "type": "string",
                        "description": "File path relative to the workspace root"
                    },
                    "content": {
                        "type": "string",
                        "description": "Content to write to the file"
                    }
                },
                "required": ["path", "content"]
            }),
        ),
        ToolSpec::new(
            ToolKind::EditFile,
            EDIT_FILE,
            "Replace exact text in a file. Only the first occurrence is replaced.",
            json!({
                "type": "object",
                "properties": {
                    "path": {
                        "type": "string",
                        "description": "File path relative to the workspace root"
                    },
                    "old_text": {
                        "type": "string",
                        "description": "Exact text to find (must match exactly)"
                    },
                    "new_text": {
                        "type": "string",
                        "description": "Replacement text"
                    }
                },
                "required": ["path", "old_text", "new_text"]
            }),
        ),
    ]
}

/// The `task` tool, its `agent_type` enum drawn from the registry.
pub fn spawn_tool_spec(registry: &AgentTypeRegistry) -> ToolSpec {
    let description = format!(
        "Spawn a sub-agent to handle a focused subtask.\n\n\
         Sub-agents run in an isolated context: they cannot see this conversation, \
         and only their final summary comes back. Use this to keep the main \
         conversation clean.\n\n\
         Agent types:\n{}",
        registry.descriptions()
    );
    ToolSpec::new(
        ToolKind::SpawnTask,
        TASK,
        &description,
        json!({
            "type": "object",
            "properties": {
                "description": {
                    "type": "string",
                    "description": "Short task name (3-5 words) for progress display"
                },
                "prompt": {
                    "type": "string",
                    "description": "Detailed instructions for the sub-agent"
                },
                "agent_type": {
                    "type": "string",
                    "enum": registry.names(),
                    "description": "Type of agent to spawn"
                }
            },
            "required": ["description", "prompt", "agent_type"]
        }),
    )
}

/// Name → handler table plus the schemas shown to the model, in order.
#[derive(Debug, Clone)]
pub struct ToolSet {
    schemas: Vec<ToolSchema>,
    kinds: HashMap<String, ToolKind>,
}

impl ToolSet {
    /// Build a tool set, rejecting duplicate names.
    pub fn new(specs: Vec<ToolSpec>) -> Result<Self, ConfigError> {
        let mut kinds = HashMap::with_capacity(specs.len());
        let mut schemas = Vec::with_capacity(specs.len());
        for spec in specs {
            if kinds.insert(spec.schema.name.clone(), spec.kind).is_some() {
                return Err(ConfigError::DuplicateTool(spec.schema.name));
            }
            schemas.push(spec.schema);
        }
        Ok(Self { schemas, kinds })
    }

    /// The base tools (no `task`).
    pub fn base() -> Result<Self, ConfigError> {
        Self::new(base_tool_specs())
    }

    /// This set plus the `task` tool.
    pub fn with_spawn_tool(&self, registry: &AgentTypeRegistry) -> Result<Self, ConfigError> {
        let mut specs = self.specs();
        specs.push(spawn_tool_spec(registry));
        Self::new(specs)
    }

    /// The subset an agent type may use. The `task` tool never survives
    /// filtering, whatever the permission says.
    pub fn filtered(&self, permission: &ToolPermission) -> Self {
        let specs: Vec<ToolSpec> = self
            .specs()
            .into_iter()
            .filter(|spec| spec.kind != ToolKind::SpawnTask && permission.permits(spec.name()))
            .collect();
        let kinds = specs
            .iter()
            .map(|s| (s.schema.name.clone(), s.kind))
            .collect();
        Self {
            schemas: specs.into_iter().map(|s| s.schema).collect(),
            kinds,
        }
    }

    fn specs(&self) -> Vec<ToolSpec> {
        self.schemas
            .iter()
            .map(|schema| ToolSpec {
                kind: self.kinds[&schema.name],
                schema: schema.clone(),
            })
            .collect()
    }

    pub fn kind_of(&self, name: &str) -> Option<ToolKind> {
        self.kinds.get(name).copied()
    }

    pub fn schemas(&self) -> &[ToolSchema] {
        &self.schemas
    }

    pub fn names(&self) -> Vec<&str> {
        self.schemas.iter().map(|s| s.name.as_str()).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.kinds.contains_key(name)
    }
}

/// Dispatch a tool call to its implementation.
///
/// Always returns a `String`: the tool's output on success, `Error: ...`
/// otherwise. Names outside `tools` are unknown even if some other tool set
/// has them.
pub async fn dispatch_tool_call(
    rt: &Runtime,
    tools: &ToolSet,
    call: &ToolCall,
    depth: usize,
) -> String {
    let outcome = match tools.kind_of(&call.name) {
        Some(kind) => execute(rt, kind, &call.name, &call.input, depth).await,
        None => Err(ToolError::UnknownTool(call.name.clone())),
    };

    match outcome {
        Ok(output) => output,
        Err(e) => {
            tracing::debug!(tool = %call.name, error = %e, "Tool call failed");
            format!("Error: {e}")
        }
    }
}

async fn execute(
    rt: &Runtime,
    kind: ToolKind,
    name: &str,
    input: &Value,
    depth: usize,
) -> Result<String, ToolError> {
    let sandbox = &rt.sandbox;
    match kind {
        ToolKind::Bash => {
            let command = required_str(input, name, "command")?;
            sandbox.run_command(command, depth).await
        }
        ToolKind::ReadFile => {
            let path = required_str(input, name, "path")?;
            let limit = optional_usize(input, name, "limit")?;
            sandbox.read_file(path, limit).await
        }
        ToolKind::WriteFile => {
            let path = required_str(input, name, "path")?;
            let content = required_str(input, name, "content")?;
            sandbox.write_file(path, content).await
        }
        ToolKind::EditFile => {
            let path = required_str(input, name, "path")?;
            let old_text = required_str(input, name, "old_text")?;
            let new_text = required_str(input, name, "new_text")?;
            sandbox.edit_file(path, old_text, new_text).await
        }
        ToolKind::SpawnTask => {
            let request = SpawnRequest {
                description: required_str(input, name, "description")?,
                prompt: required_str(input, name, "prompt")?,
                agent_type: required_str(input, name, "agent_type")?,
            };
            // Boxed: the sub-agent runs another driver, which dispatches again.
            let summary = Box::pin(spawn_sub_agent(rt, request, depth)).await?;
            Ok(sandbox.truncate(summary))
        }
    }
}

fn required_str<'v>(input: &'v Value, tool: &str, field: &'static str) -> Result<&'v str, ToolError> {
    match input.get(field) {
        None | Some(Value::Null) => Err(ToolError::MissingArgument {
            tool: tool.to_string(),
            field,
        }),
        Some(value) => value.as_str().ok_or_else(|| ToolError::InvalidArgument {
            tool: tool.to_string(),
            field,
            message: "expected a string".to_string(),
        }),
    }
}

fn optional_usize(input: &Value, tool: &str, field: &'static str) -> Result<Option<usize>, ToolError> {
    match input.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => value
            .as_u64()
            .map(|n| Some(n as usize))
            .ok_or_else(|| ToolError::InvalidArgument {
                tool: tool.to_string(),
                field,
                message: "expected a non-negative integer".to_string(),
            }),
    }
}
