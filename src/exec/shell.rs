//! Shell command execution with a wall-clock timeout.
//!
//! Commands run via `sh -c` in their own process group so that a timeout can
//! take down everything the command started, not just the shell.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;

use crate::error::ExecError;

/// Result of a shell command execution.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ExecResult {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: Option<i32>,
    pub timed_out: bool,
}

impl ExecResult {
    /// Stdout followed by stderr, trimmed of surrounding whitespace.
    pub fn combined_output(&self) -> String {
        format!("{}{}", self.stdout, self.stderr).trim().to_string()
    }
}

/// Run `command` through `sh -c` in `working_dir`.
///
/// `env` entries are added to the inherited environment. Stdin is closed.
/// When `timeout_secs` elapses the process group is killed with SIGKILL and a
/// result with `timed_out: true` and no exit code is returned.
pub async fn execute_shell(
    command: &str,
    working_dir: &Path,
    timeout_secs: u64,
    env: &[(&str, String)],
) -> Result<ExecResult, ExecError> {
    let mut cmd = Command::new("sh");
    cmd.arg("-c")
        .arg(command)
        .current_dir(working_dir)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    for (key, value) in env {
        cmd.env(key, value);
    }
    #[cfg(unix)]
    cmd.process_group(0);

    let child = cmd
        .spawn()
        .map_err(|e| ExecError::SpawnFailed(e.to_string()))?;
    let pid = child.id();

    match tokio::time::timeout(Duration::from_secs(timeout_secs), child.wait_with_output()).await {
        Ok(Ok(output)) => Ok(ExecResult {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            exit_code: output.status.code(),
            timed_out: false,
        }),
        Ok(Err(e)) => Err(ExecError::ProcessFailed(e.to_string())),
        Err(_) => {
            // The child itself was killed when its wait future was dropped;
            // this reaches anything it forked.
            if let Some(pid) = pid {
                kill_process_group(pid);
            }
            tracing::warn!(command, timeout_secs, "Shell command timed out");
            Ok(ExecResult {
                stdout: String::new(),
                stderr: String::new(),
                exit_code: None,
                timed_out: true,
            })
        }
    }
}

#[cfg(unix)]
fn kill_process_group(pid: u32) {
    let pgid = nix::unistd::Pid::from_raw(pid as i32);
    if let Err(e) = nix::sys::signal::killpg(pgid, nix::sys::signal::Signal::SIGKILL) {
        tracing::debug!(pid, "killpg after timeout: {e}");
    }
}

#[cfg(not(unix))]
fn kill_process_group(_pid: u32) {}
