//! [`ModelClient`] backed by the `genai` multi-provider client.
//!
//! The model name selects the provider the way genai does (e.g.
//! `"claude-sonnet-4-20250514"`, `"openai::gpt-4o"`, bare names for Ollama).
//! Credentials come from the provider's usual environment variables.

use async_trait::async_trait;
use genai::Client;
use genai::chat::{ChatMessage, ChatOptions, ChatRequest, Tool, ToolResponse};

use super::{ModelClient, ModelRequest, ModelResponse, StopReason};
use crate::agent::conversation::{ContentBlock, Role, ToolCall, Turn};
use crate::error::ModelError;

pub struct GenaiClient {
    client: Client,
    model: String,
}

impl GenaiClient {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            client: Client::default(),
            model: model.into(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl ModelClient for GenaiClient {
    async fn complete(&self, request: ModelRequest<'_>) -> Result<ModelResponse, ModelError> {
        let chat_req = to_chat_request(&request);
        let options = ChatOptions::default().with_max_tokens(request.max_tokens);

        tracing::debug!(
            model = %self.model,
            turns = request.turns.len(),
            tools = request.tools.len(),
            "Calling model"
        );

        let response = self
            .client
            .exec_chat(&self.model, chat_req, Some(&options))
            .await
            .map_err(|e| ModelError::Request(e.to_string()))?;

        let texts: Vec<String> = response.texts().into_iter().map(str::to_string).collect();
        let calls = response.into_tool_calls();
        Ok(response_from_parts(texts, calls))
    }
}

/// Every non-empty text part in order, then the tool calls. Any tool call
/// makes it a tool-use stop.
fn response_from_parts(texts: Vec<String>, calls: Vec<genai::chat::ToolCall>) -> ModelResponse {
    let stop_reason = if calls.is_empty() {
        StopReason::EndTurn
    } else {
        StopReason::ToolUse
    };

    let mut content: Vec<ContentBlock> = texts
        .into_iter()
        .filter(|t| !t.is_empty())
        .map(ContentBlock::text)
        .collect();
    content.extend(calls.into_iter().map(|call| {
        ContentBlock::ToolUse(ToolCall {
            id: call.call_id,
            name: call.fn_name,
            input: call.fn_arguments,
        })
    }));

    ModelResponse {
        content,
        stop_reason,
    }
}

fn to_chat_request(request: &ModelRequest<'_>) -> ChatRequest {
    let tools: Vec<Tool> = request
        .tools
        .iter()
        .map(|t| {
            Tool::new(t.name.clone())
                .with_description(t.description.clone())
                .with_schema(t.input_schema.clone())
        })
        .collect();

    let mut chat_req = ChatRequest::from_system(request.system_prompt).with_tools(tools);
    for turn in request.turns {
        for message in turn_to_messages(turn) {
            chat_req = chat_req.append_message(message);
        }
    }
    chat_req
}

/// Map one turn onto genai messages: text first, then tool calls (assistant)
/// or tool responses (user), each kept in block order.
fn turn_to_messages(turn: &Turn) -> Vec<ChatMessage> {
    let text = turn.text();
    let mut messages = Vec::new();

    if !text.is_empty() {
        messages.push(match turn.role {
            Role::User => ChatMessage::user(text),
            Role::Assistant => ChatMessage::assistant(text),
        });
    }

    let calls: Vec<genai::chat::ToolCall> = turn
        .tool_calls()
        .map(|call| genai::chat::ToolCall {
            call_id: call.id.clone(),
            fn_name: call.name.clone(),
            fn_arguments: call.input.clone(),
            thought_signatures: None,
        })
        .collect();
    if !calls.is_empty() {
        messages.push(ChatMessage::from(calls));
    }

    for block in &turn.content {
        if let ContentBlock::ToolResult(result) = block {
            messages.push(ToolResponse::new(result.tool_call_id.clone(), result.content.clone()).into());
        }
    }

    messages
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::conversation::ToolResult;
    use serde_json::json;

    #[test]
    fn assistant_tool_turn_maps_to_one_tool_call_message() {
        let turn = Turn {
            role: Role::Assistant,
            content: vec![
                ContentBlock::text("Let me look."),
                ContentBlock::ToolUse(ToolCall {
                    id: "c1".into(),
                    name: "bash".into(),
                    input: json!({"command": "ls"}),
                }),
                ContentBlock::ToolUse(ToolCall {
                    id: "c2".into(),
                    name: "read_file".into(),
                    input: json!({"path": "a.txt"}),
                }),
            ],
        };

        let messages = turn_to_messages(&turn);
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1].content.tool_calls().len(), 2);
    }

    #[test]
    fn every_text_part_is_kept_in_order() {
        let response = response_from_parts(
            vec!["First part. ".into(), String::new(), "Second part.".into()],
            Vec::new(),
        );
        assert_eq!(response.stop_reason, StopReason::EndTurn);
        assert_eq!(
            response.content,
            vec![ContentBlock::text("First part. "), ContentBlock::text("Second part.")]
        );
    }

    #[test]
    fn tool_calls_follow_text_and_set_tool_use() {
        let response = response_from_parts(
            vec!["Checking.".into()],
            vec![genai::chat::ToolCall {
                call_id: "c1".into(),
                fn_name: "bash".into(),
                fn_arguments: json!({"command": "ls"}),
                thought_signatures: None,
            }],
        );
        assert_eq!(response.stop_reason, StopReason::ToolUse);
        assert_eq!(response.content.len(), 2);
        assert!(matches!(
            &response.content[1],
            ContentBlock::ToolUse(call) if call.id == "c1" && call.name == "bash"
        ));
    }

    #[test]
    fn user_result_turn_maps_to_tool_responses() {
        let turn = Turn {
            role: Role::User,
            content: vec![
                ContentBlock::ToolResult(ToolResult {
                    tool_call_id: "c1".into(),
                    content: "a.txt".into(),
                }),
                ContentBlock::ToolResult(ToolResult {
                    tool_call_id: "c2".into(),
                    content: "hello".into(),
                }),
            ],
        };

        let messages = turn_to_messages(&turn);
        assert_eq!(messages.len(), 2);
        assert!(
            messages
                .iter()
                .all(|m| m.role == genai::chat::ChatRole::Tool)
        );
    }
}
