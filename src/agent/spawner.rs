//! Sub-agent spawning for the `task` tool.
//!
//! A sub-agent gets a fresh conversation, a role prompt for its type and the
//! base tools its type permits (never `task` itself). It runs one driver to
//! completion one level deeper than its parent, and only its final text
//! comes back. Its intermediate turns are dropped with its conversation.

use std::time::Instant;

use super::Runtime;
use super::conversation::Conversation;
use super::driver::ConversationDriver;
use super::system_prompt::build_sub_agent_prompt;
use crate::error::ToolError;

/// Returned when a sub-agent finishes without any text.
pub const EMPTY_SUMMARY: &str = "(sub-agent returned no text)";

/// Arguments of one `task` call.
#[derive(Debug, Clone, Copy)]
pub struct SpawnRequest<'a> {
    /// Short label for progress output.
    pub description: &'a str,
    pub prompt: &'a str,
    pub agent_type: &'a str,
}

/// Run a sub-agent for `request` on behalf of a parent at `depth`.
pub async fn spawn_sub_agent(
    rt: &Runtime,
    request: SpawnRequest<'_>,
    depth: usize,
) -> Result<String, ToolError> {
    let agent_type = rt
        .agent_types
        .get(request.agent_type)
        .ok_or_else(|| ToolError::UnknownAgentType(request.agent_type.to_string()))?;

    let child_depth = depth + 1;
    if child_depth > rt.config.max_depth {
        return Err(ToolError::DepthLimitExceeded {
            depth: child_depth,
            max_depth: rt.config.max_depth,
        });
    }

    let tools = rt.base_tools.filtered(&agent_type.tools);
    let system_prompt = build_sub_agent_prompt(agent_type, rt.sandbox.root());

    tracing::info!(
        agent_type = %agent_type.name,
        description = request.description,
        depth = child_depth,
        tools = ?tools.names(),
        "Spawning sub-agent"
    );

    let started = Instant::now();
    let mut driver = ConversationDriver::new(rt, system_prompt, tools, child_depth, &agent_type.name);
    let mut conversation = Conversation::new();
    let outcome = driver.run(request.prompt, &mut conversation).await;
    let stats = driver.stats();

    eprintln!(
        "  [{}] {} - done ({} tools, {:.1}s)",
        agent_type.name,
        request.description,
        stats.tool_calls,
        started.elapsed().as_secs_f64()
    );

    match outcome {
        Ok(text) if text.is_empty() => Ok(EMPTY_SUMMARY.to_string()),
        Ok(text) => Ok(text),
        Err(e) => {
            tracing::warn!(agent_type = %agent_type.name, "Sub-agent failed: {e}");
            Err(ToolError::SubAgentFailed(e.to_string()))
        }
    }
}
