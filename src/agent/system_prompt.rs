//! Role prompts for the top-level agent and for sub-agents.

use std::path::Path;

use super::agent_types::{AgentTypeConfig, AgentTypeRegistry};
use super::tools::ToolSet;

/// `- name: description` for each tool, for the prompt body.
fn tool_lines(tools: &ToolSet) -> String {
    tools
        .schemas()
        .iter()
        .map(|s| {
            let first_line = s.description.lines().next().unwrap_or_default();
            format!("- {}: {}", s.name, first_line)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Prompt for the top-level agent working in `root`.
///
/// When the `task` tool is present, the available sub-agent types are listed
/// so the model knows when delegating is worthwhile.
pub fn build_system_prompt(root: &Path, tools: &ToolSet, registry: &AgentTypeRegistry) -> String {
    let mut prompt = format!(
        "\
You are a coding agent working in {root}.

Loop: think briefly, use tools, report.

## Tools
{tools}

## Rules
- Prefer tools over prose. Act, don't just explain.
- All paths are relative to the workspace; paths outside it are rejected.
- Shell commands are filtered against a denylist and time out.
- When done, summarize what you did.
",
        root = root.display(),
        tools = tool_lines(tools),
    );

    if tools.contains(super::tools::TASK) && !registry.is_empty() {
        prompt.push_str(
            "\n## Sub-agents\n\
             Use the task tool for focused subtasks that need a lot of exploration. \
             A sub-agent starts with no knowledge of this conversation, so give it \
             complete instructions. Only its final summary comes back.\n",
        );
        prompt.push_str(&registry.descriptions());
        prompt.push('\n');
    }

    prompt
}

/// Prompt for a sub-agent of `agent_type` working in `root`.
pub fn build_sub_agent_prompt(agent_type: &AgentTypeConfig, root: &Path) -> String {
    format!(
        "You are a sub-agent of type `{name}` working in {root}.\n\n{fragment}\n\n\
         Complete the task and return a clear, concise summary.",
        name = agent_type.name,
        root = root.display(),
        fragment = agent_type.prompt,
    )
}
