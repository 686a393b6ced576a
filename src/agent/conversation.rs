//! Append-only conversation log.
//!
//! A [`Conversation`] belongs to exactly one driver invocation. Turns can be
//! appended but never removed or edited, and a tool-result turn is only
//! accepted when it answers the preceding tool-invocation turn call for call.

use serde::Serialize;

use crate::error::AgentError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// A tool invocation requested by the model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolCall {
    /// Opaque, model-assigned identifier.
    pub id: String,
    pub name: String,
    pub input: serde_json::Value,
}

/// The textual outcome of one [`ToolCall`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolResult {
    pub tool_call_id: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text { text: String },
    ToolUse(ToolCall),
    ToolResult(ToolResult),
}

impl ContentBlock {
    pub fn text(text: impl Into<String>) -> Self {
        ContentBlock::Text { text: text.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Turn {
    pub role: Role,
    pub content: Vec<ContentBlock>,
}

impl Turn {
    /// All text blocks, concatenated in order.
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(|block| match block {
                ContentBlock::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn tool_calls(&self) -> impl Iterator<Item = &ToolCall> {
        self.content.iter().filter_map(|block| match block {
            ContentBlock::ToolUse(call) => Some(call),
            _ => None,
        })
    }

    pub fn tool_results(&self) -> impl Iterator<Item = &ToolResult> {
        self.content.iter().filter_map(|block| match block {
            ContentBlock::ToolResult(result) => Some(result),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct Conversation {
    turns: Vec<Turn>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Calls in the last turn that still need results, if any.
    fn pending_calls(&self) -> Vec<&ToolCall> {
        match self.turns.last() {
            Some(turn) if turn.role == Role::Assistant => turn.tool_calls().collect(),
            _ => Vec::new(),
        }
    }

    /// Append a user prompt.
    pub fn push_user_text(&mut self, text: impl Into<String>) -> Result<(), AgentError> {
        self.ensure_nothing_pending("user prompt")?;
        self.turns.push(Turn {
            role: Role::User,
            content: vec![ContentBlock::text(text)],
        });
        Ok(())
    }

    /// Append a model response.
    pub fn push_assistant(&mut self, content: Vec<ContentBlock>) -> Result<(), AgentError> {
        self.ensure_nothing_pending("assistant turn")?;
        if content
            .iter()
            .any(|b| matches!(b, ContentBlock::ToolResult(_)))
        {
            return Err(AgentError::Protocol(
                "assistant turn cannot carry tool results".to_string(),
            ));
        }
        self.turns.push(Turn {
            role: Role::Assistant,
            content,
        });
        Ok(())
    }

    /// Append the results answering the preceding tool-invocation turn.
    ///
    /// There must be exactly one result per pending call, in call order.
    pub fn push_tool_results(&mut self, results: Vec<ToolResult>) -> Result<(), AgentError> {
        let pending = self.pending_calls();
        if pending.is_empty() {
            return Err(AgentError::Protocol(
                "tool results without a preceding tool invocation".to_string(),
            ));
        }
        let matches = pending.len() == results.len()
            && pending
                .iter()
                .zip(&results)
                .all(|(call, result)| call.id == result.tool_call_id);
        if !matches {
            return Err(AgentError::Protocol(format!(
                "expected results for [{}], got [{}]",
                pending
                    .iter()
                    .map(|c| c.id.as_str())
                    .collect::<Vec<_>>()
                    .join(", "),
                results
                    .iter()
                    .map(|r| r.tool_call_id.as_str())
                    .collect::<Vec<_>>()
                    .join(", "),
            )));
        }

        self.turns.push(Turn {
            role: Role::User,
            content: results.into_iter().map(ContentBlock::ToolResult).collect(),
        });
        Ok(())
    }

    fn ensure_nothing_pending(&self, what: &str) -> Result<(), AgentError> {
        let pending = self.pending_calls();
        if pending.is_empty() {
            Ok(())
        } else {
            Err(AgentError::Protocol(format!(
                "{what} appended while {} tool call(s) await results",
                pending.len()
            )))
        }
    }
}
