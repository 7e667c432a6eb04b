//! Optional syntax check through an external interpreter.
//!
//! The source is piped to `command args...` on stdin; exit status 0 means the
//! interpreter accepted it. For example `python3 -c "import ast,sys; ast.parse(sys.stdin.read())"`
//! or `node --check --input-type=module`.

use std::process::Stdio;
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::config::SyntaxCheckConfig;
use crate::error::InterpreterError;

const MAX_STDERR_CHARS: usize = 500;

/// Run the configured interpreter over `source`.
pub async fn check_syntax(config: &SyntaxCheckConfig, source: &str) -> Result<(), InterpreterError> {
    let command = display_command(config);
    let timeout = Duration::from_millis(config.timeout_ms);

    let mut child = Command::new(&config.command)
        .args(&config.args)
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|source| InterpreterError::Spawn {
            command: command.clone(),
            source,
        })?;

    let stdin = child.stdin.take();
    let input = source.as_bytes().to_vec();
    let run = async move {
        if let Some(mut stdin) = stdin {
            // A checker may exit before reading everything; its status decides.
            if let Err(e) = stdin.write_all(&input).await {
                if e.kind() != std::io::ErrorKind::BrokenPipe {
                    return Err(e);
                }
            }
            drop(stdin);
        }
        child.wait_with_output().await
    };

    let output = match tokio::time::timeout(timeout, run).await {
        Ok(Ok(output)) => output,
        Ok(Err(source)) => return Err(InterpreterError::Io { command, source }),
        // Dropping the future drops the child, which kills it.
        Err(_) => return Err(InterpreterError::Timeout { command, timeout }),
    };

    if output.status.success() {
        tracing::debug!(%command, "syntax check passed");
        return Ok(());
    }

    let stderr = String::from_utf8_lossy(&output.stderr);
    Err(InterpreterError::Failed {
        command,
        status: output.status.to_string(),
        stderr: truncate(stderr.trim(), MAX_STDERR_CHARS),
    })
}

fn display_command(config: &SyntaxCheckConfig) -> String {
    std::iter::once(config.command.as_str())
        .chain(config.args.iter().map(String::as_str))
        .collect::<Vec<_>>()
        .join(" ")
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
