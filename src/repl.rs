//! Interactive session: one persistent conversation across prompts.

use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

use crate::agent::Runtime;
use crate::agent::conversation::Conversation;

/// Read prompts until `q`, `quit`, `exit` or Ctrl-D, running each through
/// the top-level driver against the same conversation.
///
/// A failed run is reported and its turns are discarded, so the next prompt
/// continues from the last good state.
pub async fn run_session(rt: &Runtime) -> anyhow::Result<()> {
    let mut driver = rt.top_level_driver()?.with_progress(true);
    let mut conversation = Conversation::new();

    let mut rl = DefaultEditor::new()
        .map_err(|e| anyhow::anyhow!("Failed to initialize readline: {}", e))?;

    println!("agentloop working in {}", rt.sandbox.root().display());
    println!("Type q, quit or exit (or Ctrl-D) to leave.");

    loop {
        let line = match rl.readline(">> ") {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!();
                break;
            }
            Err(err) => return Err(anyhow::anyhow!("Readline error: {}", err)),
        };

        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if matches!(input, "q" | "quit" | "exit") {
            break;
        }
        let _ = rl.add_history_entry(input);

        let checkpoint = conversation.clone();
        match driver.run(input, &mut conversation).await {
            Ok(answer) => {
                let stats = driver.stats();
                tracing::debug!(
                    model_calls = stats.model_calls,
                    tool_calls = stats.tool_calls,
                    turns = conversation.len(),
                    "Prompt answered"
                );
                println!("{answer}\n");
            }
            Err(e) => {
                eprintln!("Error: {e}");
                conversation = checkpoint;
            }
        }
    }

    Ok(())
}
