//! The conversation driver: one agent's turn loop.
//!
//! 1. Append the prompt as a user turn.
//! 2. Call the model with the role prompt, the whole conversation, the tool
//!    schemas and the output cap. A failed call ends the run.
//! 3. Append the response as an assistant turn.
//! 4. Anything but a tool-use stop returns the response's text.
//! 5. Otherwise run each requested tool in order and append one user turn
//!    carrying all results, then go back to 2.
//!
//! Tool failures never end the loop; they come back to the model as text.
//! The loop is bounded by `max_turns` model calls per run.

use uuid::Uuid;

use super::Runtime;
use super::conversation::{ContentBlock, Conversation, ToolCall, ToolResult};
use super::tools::{ToolSet, dispatch_tool_call};
use super::transcript::{TranscriptEntry, TranscriptLogger, now_iso};
use crate::error::AgentError;
use crate::model::{ModelRequest, ModelResponse, StopReason};

/// Counters for the most recent [`ConversationDriver::run`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunStats {
    pub model_calls: usize,
    pub tool_calls: usize,
}

pub struct ConversationDriver<'rt> {
    rt: &'rt Runtime,
    system_prompt: String,
    tools: ToolSet,
    depth: usize,
    label: String,
    echo_progress: bool,
    transcript: Option<TranscriptLogger>,
    stats: RunStats,
}

impl<'rt> ConversationDriver<'rt> {
    /// A driver at nesting `depth` using `tools`. Opens a transcript file
    /// when `transcript_dir` is configured; failing to do so only warns.
    pub fn new(
        rt: &'rt Runtime,
        system_prompt: String,
        tools: ToolSet,
        depth: usize,
        label: impl Into<String>,
    ) -> Self {
        let label = label.into();
        let run_id = Uuid::new_v4().to_string();

        let transcript = rt.config.transcript_dir.as_deref().and_then(|dir| {
            match TranscriptLogger::new_in_dir(dir, &label, &run_id) {
                Ok(mut logger) => {
                    let start = TranscriptEntry::RunStart {
                        timestamp: now_iso(),
                        run_id: run_id.clone(),
                        label: label.clone(),
                        depth,
                        tools: tools.names().into_iter().map(String::from).collect(),
                    };
                    if let Err(e) = logger.log_event(&start) {
                        tracing::warn!("Transcript write failed: {e:#}");
                    }
                    Some(logger)
                }
                Err(e) => {
                    tracing::warn!(dir = %dir.display(), "Transcript disabled: {e:#}");
                    None
                }
            }
        });

        Self {
            rt,
            system_prompt,
            tools,
            depth,
            label,
            echo_progress: false,
            transcript,
            stats: RunStats::default(),
        }
    }

    /// Echo each tool call and an abbreviated result to stderr.
    pub fn with_progress(mut self, echo: bool) -> Self {
        self.echo_progress = echo;
        self
    }

    pub fn stats(&self) -> RunStats {
        self.stats
    }

    /// Drive `conversation` from `prompt` to a final answer.
    pub async fn run(
        &mut self,
        prompt: &str,
        conversation: &mut Conversation,
    ) -> Result<String, AgentError> {
        self.stats = RunStats::default();
        conversation.push_user_text(prompt)?;
        self.log(TranscriptEntry::UserPrompt {
            timestamp: now_iso(),
            content: prompt.to_string(),
        });

        loop {
            let turn = self.stats.model_calls;
            if turn >= self.rt.config.max_turns {
                let err = AgentError::IterationLimitExceeded { turns: turn };
                self.log_failure(turn, &err);
                return Err(err);
            }
            self.stats.model_calls += 1;

            let request = ModelRequest {
                system_prompt: &self.system_prompt,
                turns: conversation.turns(),
                tools: self.tools.schemas(),
                max_tokens: self.rt.config.max_tokens,
            };
            let ModelResponse {
                content,
                stop_reason,
            } = match self.rt.model.complete(request).await {
                Ok(response) => response,
                Err(e) => {
                    let err = AgentError::from(e);
                    self.log_failure(turn, &err);
                    return Err(err);
                }
            };

            let text: String = content
                .iter()
                .filter_map(|block| match block {
                    ContentBlock::Text { text } => Some(text.as_str()),
                    _ => None,
                })
                .collect();
            let calls: Vec<ToolCall> = content
                .iter()
                .filter_map(|block| match block {
                    ContentBlock::ToolUse(call) => Some(call.clone()),
                    _ => None,
                })
                .collect();

            conversation.push_assistant(content)?;
            if !text.is_empty() {
                self.log(TranscriptEntry::AssistantText {
                    timestamp: now_iso(),
                    turn,
                    content: text.clone(),
                });
            }

            if stop_reason != StopReason::ToolUse || calls.is_empty() {
                if stop_reason == StopReason::ToolUse {
                    tracing::warn!(turn, "Tool use requested without any tool calls; treating as final");
                }
                if !calls.is_empty() {
                    // Close the calls out so the conversation can take another prompt.
                    tracing::warn!(turn, ?stop_reason, calls = calls.len(), "Model stopped with unexecuted tool calls");
                    let skipped = calls
                        .iter()
                        .map(|call| ToolResult {
                            tool_call_id: call.id.clone(),
                            content: format!("Error: not executed (model stopped: {stop_reason:?})"),
                        })
                        .collect();
                    conversation.push_tool_results(skipped)?;
                }
                tracing::info!(
                    label = %self.label,
                    depth = self.depth,
                    model_calls = self.stats.model_calls,
                    tool_calls = self.stats.tool_calls,
                    ?stop_reason,
                    "Run finished"
                );
                self.log(TranscriptEntry::RunEnd {
                    timestamp: now_iso(),
                    model_calls: self.stats.model_calls,
                    tool_calls: self.stats.tool_calls,
                    reason: "final_answer".to_string(),
                });
                return Ok(text);
            }

            let mut results = Vec::with_capacity(calls.len());
            for call in &calls {
                self.stats.tool_calls += 1;
                self.report_call(turn, call);

                let output = dispatch_tool_call(self.rt, &self.tools, call, self.depth).await;

                self.report_result(turn, call, &output);
                results.push(ToolResult {
                    tool_call_id: call.id.clone(),
                    content: output,
                });
            }
            conversation.push_tool_results(results)?;
        }
    }

    fn report_call(&mut self, turn: usize, call: &ToolCall) {
        let args = call.input.to_string();
        tracing::info!(tool = %call.name, call_id = %call.id, "Tool call");
        if self.echo_progress {
            eprintln!("[tool] {}({})", call.name, abbreviate(&args, 100));
        }
        self.log(TranscriptEntry::ToolCall {
            timestamp: now_iso(),
            turn,
            call_id: call.id.clone(),
            name: call.name.clone(),
            input: call.input.clone(),
        });
    }

    fn report_result(&mut self, turn: usize, call: &ToolCall, output: &str) {
        tracing::debug!(tool = %call.name, bytes = output.len(), "Tool result");
        if self.echo_progress {
            eprintln!("[result] {}", abbreviate(output, 200));
        }
        self.log(TranscriptEntry::ToolResult {
            timestamp: now_iso(),
            turn,
            call_id: call.id.clone(),
            name: call.name.clone(),
            result: output.to_string(),
        });
    }

    fn log_failure(&mut self, turn: usize, err: &AgentError) {
        tracing::error!(turn, "{err}");
        self.log(TranscriptEntry::Error {
            timestamp: now_iso(),
            turn,
            message: err.to_string(),
        });
        self.log(TranscriptEntry::RunEnd {
            timestamp: now_iso(),
            model_calls: self.stats.model_calls,
            tool_calls: self.stats.tool_calls,
            reason: "error".to_string(),
        });
    }

    fn log(&mut self, entry: TranscriptEntry) {
        if let Some(transcript) = self.transcript.as_mut() {
            if let Err(e) = transcript.log_event(&entry) {
                tracing::warn!(path = %transcript.log_path().display(), "Transcript write failed: {e:#}");
            }
        }
    }
}

/// First `max_chars` characters of `text`, with `...` if cut.
fn abbreviate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
