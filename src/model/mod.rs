//! The remote model boundary.
//!
//! The driver only ever talks to a [`ModelClient`]. The request carries the
//! role prompt, the full conversation, the declared tool schemas and an
//! output cap; the response carries content blocks and a [`StopReason`].

pub mod genai_client;

use async_trait::async_trait;
use serde::Serialize;

use crate::agent::conversation::{ContentBlock, Turn};
use crate::error::ModelError;

pub use genai_client::GenaiClient;

/// A tool as declared to the model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolSchema {
    pub name: String,
    pub description: String,
    /// JSON Schema for the tool's input object.
    pub input_schema: serde_json::Value,
}

/// One model call.
#[derive(Debug, Clone, Copy)]
pub struct ModelRequest<'a> {
    pub system_prompt: &'a str,
    pub turns: &'a [Turn],
    pub tools: &'a [ToolSchema],
    pub max_tokens: u32,
}

/// Why the model stopped producing output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// The model wants the tool invocations in its response executed.
    ToolUse,
    /// The model produced its final answer.
    EndTurn,
    /// The output cap was reached.
    MaxTokens,
    Other,
}

/// A model response: ordered content blocks plus the stop indicator.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelResponse {
    pub content: Vec<ContentBlock>,
    pub stop_reason: StopReason,
}

impl ModelResponse {
    /// A final-answer response carrying a single text block.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ContentBlock::text(text)],
            stop_reason: StopReason::EndTurn,
        }
    }
}

/// A blocking (awaited) call to a language model.
///
/// Failures are returned as-is; callers decide whether to retry.
#[async_trait]
pub trait ModelClient: Send + Sync {
    async fn complete(&self, request: ModelRequest<'_>) -> Result<ModelResponse, ModelError>;
}

#[cfg(test)]
pub mod mock {
    //! Scripted model client for driver and spawner tests.

    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use crate::agent::conversation::ToolCall;

    /// What the mock saw on one call.
    #[derive(Debug, Clone)]
    pub struct RecordedRequest {
        pub system_prompt: String,
        pub turns: Vec<Turn>,
        pub tool_names: Vec<String>,
    }

    /// Returns queued responses in order and records every request.
    /// Running out of responses is a [`ModelError::Request`].
    #[derive(Default)]
    pub struct ScriptedModel {
        responses: Mutex<VecDeque<Result<ModelResponse, ModelError>>>,
        requests: Mutex<Vec<RecordedRequest>>,
    }

    impl ScriptedModel {
        pub fn new(responses: Vec<ModelResponse>) -> Self {
            Self {
                responses: Mutex::new(responses.into_iter().map(Ok).collect()),
                requests: Mutex::new(Vec::new()),
            }
        }

        pub fn push_error(&self, error: ModelError) {
            self.responses.lock().unwrap().push_back(Err(error));
        }

        pub fn requests(&self) -> Vec<RecordedRequest> {
            self.requests.lock().unwrap().clone()
        }

        pub fn call_count(&self) -> usize {
            self.requests.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl ModelClient for ScriptedModel {
        async fn complete(&self, request: ModelRequest<'_>) -> Result<ModelResponse, ModelError> {
            self.requests.lock().unwrap().push(RecordedRequest {
                system_prompt: request.system_prompt.to_string(),
                turns: request.turns.to_vec(),
                tool_names: request.tools.iter().map(|t| t.name.clone()).collect(),
            });
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(ModelError::Request("no more scripted responses".into())))
        }
    }

    /// A response asking for the given tool calls.
    pub fn tool_use(calls: Vec<(&str, &str, serde_json::Value)>) -> ModelResponse {
        ModelResponse {
            content: calls
                .into_iter()
                .map(|(id, name, input)| {
                    ContentBlock::ToolUse(ToolCall {
                        id: id.to_string(),
                        name: name.to_string(),
                        input,
                    })
                })
                .collect(),
            stop_reason: StopReason::ToolUse,
        }
    }
}
