//! Sub-agent type registry.
//!
//! Each type pairs a description (shown to the parent model in the `task`
//! tool schema) with the tools the sub-agent may see and a role prompt
//! fragment. New types are configuration, not code: see `[agent_types.*]`.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::ConfigError;

/// Which base tools an agent type may use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolPermission {
    AllBaseTools,
    Only(BTreeSet<String>),
}

impl ToolPermission {
    pub fn permits(&self, tool_name: &str) -> bool {
        match self {
            ToolPermission::AllBaseTools => true,
            ToolPermission::Only(names) => names.contains(tool_name),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AgentTypeConfig {
    pub name: String,
    pub description: String,
    pub tools: ToolPermission,
    pub prompt: String,
}

fn only(names: &[&str]) -> ToolPermission {
    ToolPermission::Only(names.iter().map(|n| n.to_string()).collect())
}

/// The built-in `explore`, `plan` and `code` types.
pub fn builtin_agent_types() -> Vec<AgentTypeConfig> {
    vec![
        AgentTypeConfig {
            name: "explore".to_string(),
            description: "Read-only agent for exploring code, finding files, searching".to_string(),
            tools: only(&["bash", "read_file"]),
            prompt: "You are an exploration agent. Search and analyze, but never modify files. \
                     Return a concise summary of what you found."
                .to_string(),
        },
        AgentTypeConfig {
            name: "code".to_string(),
            description: "Full agent for implementing features and fixing bugs".to_string(),
            tools: ToolPermission::AllBaseTools,
            prompt: "You are a coding agent. Implement the requested changes efficiently. \
                     Return a summary of what you changed."
                .to_string(),
        },
        AgentTypeConfig {
            name: "plan".to_string(),
            description: "Planning agent for designing implementation strategies".to_string(),
            tools: only(&["bash", "read_file"]),
            prompt: "You are a planning agent. Analyze the codebase and output a numbered \
                     implementation plan. Do not make any changes."
                .to_string(),
        },
    ]
}

/// Immutable name → type table, built once at startup.
#[derive(Debug, Clone)]
pub struct AgentTypeRegistry {
    types: BTreeMap<String, AgentTypeConfig>,
}

impl AgentTypeRegistry {
    /// Build the registry, checking that every explicit tool subset names
    /// only tools in `base_tool_names`.
    pub fn new<'a>(
        types: Vec<AgentTypeConfig>,
        base_tool_names: impl IntoIterator<Item = &'a str>,
    ) -> Result<Self, ConfigError> {
        let known: BTreeSet<&str> = base_tool_names.into_iter().collect();

        for agent_type in &types {
            if let ToolPermission::Only(names) = &agent_type.tools {
                if let Some(unknown) = names.iter().find(|n| !known.contains(n.as_str())) {
                    return Err(ConfigError::UnknownPermittedTool {
                        agent_type: agent_type.name.clone(),
                        tool: unknown.clone(),
                    });
                }
            }
        }

        Ok(Self {
            types: types.into_iter().map(|t| (t.name.clone(), t)).collect(),
        })
    }

    pub fn get(&self, name: &str) -> Option<&AgentTypeConfig> {
        self.types.get(name)
    }

    /// Type names in sorted order.
    pub fn names(&self) -> Vec<&str> {
        self.types.keys().map(String::as_str).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &AgentTypeConfig> {
        self.types.values()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// One `- name: description` line per type.
    pub fn descriptions(&self) -> String {
        self.iter()
            .map(|t| format!("- {}: {}", t.name, t.description))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
