//! JSONL transcript logger for replaying a driver run.
//!
//! Each driver run (top level or sub-agent) gets its own file in
//! `transcript_dir`, named `{label}-{timestamp}-{run id}.jsonl`. Sub-agent
//! transcripts are the only place their intermediate traffic survives; the
//! parent conversation never sees it.
//!
//! Uses synchronous `std::fs` since writes are small, buffered, and flushed
//! after each event.

use std::fs::{self, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::Serialize;

/// Returns the current UTC time as an ISO 8601 string with milliseconds.
pub fn now_iso() -> String {
    Utc::now().format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

/// A structured transcript entry serialized as a single JSON line.
#[derive(Debug, Serialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum TranscriptEntry {
    RunStart {
        timestamp: String,
        run_id: String,
        label: String,
        depth: usize,
        tools: Vec<String>,
    },
    UserPrompt {
        timestamp: String,
        content: String,
    },
    AssistantText {
        timestamp: String,
        turn: usize,
        content: String,
    },
    ToolCall {
        timestamp: String,
        turn: usize,
        call_id: String,
        name: String,
        input: serde_json::Value,
    },
    ToolResult {
        timestamp: String,
        turn: usize,
        call_id: String,
        name: String,
        result: String,
    },
    Error {
        timestamp: String,
        turn: usize,
        message: String,
    },
    RunEnd {
        timestamp: String,
        model_calls: usize,
        tool_calls: usize,
        reason: String,
    },
}

/// Append-only JSONL writer for one driver run.
pub struct TranscriptLogger {
    writer: BufWriter<fs::File>,
    log_path: PathBuf,
}

impl TranscriptLogger {
    /// Create `dir` if needed and open a fresh transcript file in it.
    pub fn new_in_dir(dir: &Path, label: &str, run_id: &str) -> anyhow::Result<Self> {
        fs::create_dir_all(dir)?;

        let stamp = Utc::now().format("%Y-%m-%dT%H-%M-%S");
        let short_id: String = run_id.chars().take(8).collect();
        let label = file_label(label);
        let log_path = dir.join(format!("{label}-{stamp}-{short_id}.jsonl"));

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)?;

        Ok(Self {
            writer: BufWriter::new(file),
            log_path,
        })
    }

    /// Serialize an entry as a single JSON line and flush.
    pub fn log_event(&mut self, event: &TranscriptEntry) -> anyhow::Result<()> {
        serde_json::to_writer(&mut self.writer, event)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        Ok(())
    }

    pub fn log_path(&self) -> &Path {
        &self.log_path
    }
}

/// Restrict a label to `[A-Za-z0-9_-]` so it cannot name a path outside `dir`.
fn file_label(label: &str) -> String {
    let cleaned: String = label
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
        .collect();
    if cleaned.is_empty() { "agent".to_string() } else { cleaned }
}
