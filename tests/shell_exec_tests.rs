use agentloop::exec::{ExecResult, execute_shell};
use std::time::Instant;
use tempfile::TempDir;

fn setup_workspace() -> TempDir {
    tempfile::tempdir().expect("failed to create temp dir")
}

// ============================================================
// Normal execution
// ============================================================

#[tokio::test]
async fn test_normal_execution_stdout() {
    let ws = setup_workspace();
    let result = execute_shell("echo hello", ws.path(), 5, &[]).await.unwrap();
    assert_eq!(result.stdout, "hello\n");
    assert_eq!(result.exit_code, Some(0));
    assert!(!result.timed_out);
}

#[tokio::test]
async fn test_stderr_capture() {
    let ws = setup_workspace();
    let result = execute_shell("echo err >&2", ws.path(), 5, &[]).await.unwrap();
    assert_eq!(result.stderr, "err\n");
    assert_eq!(result.stdout, "");
    assert_eq!(result.exit_code, Some(0));
}

#[tokio::test]
async fn test_exit_code() {
    let ws = setup_workspace();
    let result = execute_shell("exit 42", ws.path(), 5, &[]).await.unwrap();
    assert_eq!(result.exit_code, Some(42));
    assert!(!result.timed_out);
}

#[tokio::test]
async fn test_working_directory() {
    let ws = setup_workspace();
    let canonical = std::fs::canonicalize(ws.path()).unwrap();
    let result = execute_shell("pwd -P", ws.path(), 5, &[]).await.unwrap();
    assert_eq!(result.stdout.trim(), canonical.to_str().unwrap());
}

#[tokio::test]
async fn test_env_is_exported() {
    let ws = setup_workspace();
    let env = [("AGENTLOOP_DEPTH", "2".to_string())];
    let result = execute_shell("echo depth=$AGENTLOOP_DEPTH", ws.path(), 5, &env)
        .await
        .unwrap();
    assert_eq!(result.stdout, "depth=2\n");
}

#[tokio::test]
async fn test_stdin_is_closed() {
    let ws = setup_workspace();
    let start = Instant::now();
    let result = execute_shell("cat", ws.path(), 5, &[]).await.unwrap();
    assert!(!result.timed_out, "cat should see EOF immediately");
    assert!(start.elapsed().as_secs() < 3);
}

// ============================================================
// Timeout behavior
// ============================================================

#[tokio::test]
async fn test_timeout_kills_process() {
    let ws = setup_workspace();
    let start = Instant::now();
    let result = execute_shell("sleep 60", ws.path(), 1, &[]).await.unwrap();
    let elapsed = start.elapsed();

    assert!(result.timed_out, "should report timed_out");
    assert_eq!(result.exit_code, None, "timed-out process should have no exit code");
    assert!(
        elapsed.as_secs() < 5,
        "timeout should fire within ~2 seconds, took {:?}",
        elapsed
    );
}

#[tokio::test]
async fn test_timeout_kills_background_children() {
    let ws = setup_workspace();
    let marker = ws.path().join("survived");
    let command = format!("(sleep 2 && touch {}) & wait", marker.display());

    let result = execute_shell(&command, ws.path(), 1, &[]).await.unwrap();
    assert!(result.timed_out);

    // The grandchild belonged to the killed process group.
    tokio::time::sleep(std::time::Duration::from_millis(2500)).await;
    assert!(!marker.exists(), "background child should have been killed");
}

// ============================================================
// Output handling
// ============================================================

#[tokio::test]
async fn test_combined_output_is_stdout_then_stderr() {
    let ws = setup_workspace();
    let result = execute_shell("echo err >&2; echo out", ws.path(), 5, &[])
        .await
        .unwrap();
    assert_eq!(result.stdout, "out\n");
    assert_eq!(result.stderr, "err\n");
    assert_eq!(result.combined_output(), "out\nerr");
}

#[test]
fn test_combined_output_trims() {
    let result = ExecResult {
        stdout: "\n  output  \n".into(),
        stderr: String::new(),
        exit_code: Some(0),
        timed_out: false,
    };
    assert_eq!(result.combined_output(), "output");
}

#[test]
fn test_exec_result_serializes() {
    let result = ExecResult {
        stdout: "output".into(),
        stderr: "".into(),
        exit_code: Some(0),
        timed_out: false,
    };
    let json = serde_json::to_string(&result).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed["stdout"], "output");
    assert_eq!(parsed["exit_code"], 0);
    assert_eq!(parsed["timed_out"], false);
}
