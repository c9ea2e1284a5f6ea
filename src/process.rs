//! Helpers for running the external package managers and archivers

use crate::error::{LayerkitError, LayerkitResult};
use std::ffi::OsStr;
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::debug;

/// Max number of output lines to include in error messages.
const ERROR_TAIL_LINES: usize = 50;

/// Exit status and combined output of a finished tool invocation
#[derive(Debug)]
pub struct ToolOutput {
    pub status: ExitStatus,
    pub lines: Vec<String>,
}

impl ToolOutput {
    /// The last lines of output, enough to make a failure actionable
    pub fn tail(&self) -> String {
        error_tail(&self.lines)
    }
}

/// Extract the useful tail of tool output for error diagnostics.
pub(crate) fn error_tail(lines: &[String]) -> String {
    let start = lines.len().saturating_sub(ERROR_TAIL_LINES);
    lines[start..].join("\n")
}

/// Check whether `program` can be started at all
pub async fn tool_available(program: &str) -> bool {
    Command::new(program)
        .arg("--version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await
        .map(|s| s.success())
        .unwrap_or(false)
}

/// First line of `<program> --version`
pub async fn tool_version(program: &str) -> LayerkitResult<String> {
    let output = Command::new(program)
        .arg("--version")
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await
        .map_err(|e| LayerkitError::command_failed(format!("{} --version", program), e))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(LayerkitError::command_exec(
            format!("{} --version", program),
            stderr,
        ));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    Ok(stdout.lines().next().unwrap_or_default().trim().to_string())
}

/// Run a tool to completion, streaming every output line to `on_output`.
///
/// A tool that cannot be spawned because it does not exist maps to
/// `ToolNotFound`; any other spawn failure is a `CommandFailed`.
pub async fn run_streaming<I, S>(
    program: &str,
    args: I,
    cwd: Option<&Path>,
    on_output: &(dyn Fn(String) + Send + Sync),
) -> LayerkitResult<ToolOutput>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let mut command = Command::new(program);
    command
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    if let Some(dir) = cwd {
        command.current_dir(dir);
    }

    debug!("Executing: {:?}", command.as_std());

    let mut child = command.spawn().map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            LayerkitError::ToolNotFound {
                name: program.to_string(),
                hint: format!("Install {} or set its path in the config", program),
            }
        } else {
            LayerkitError::command_failed(program, e)
        }
    })?;

    let lines = stream_child_output(&mut child, on_output).await?;

    let status = child
        .wait()
        .await
        .map_err(|e| LayerkitError::command_failed(program, e))?;

    Ok(ToolOutput { status, lines })
}

/// Stream stdout+stderr from a child process, calling `on_output` for each line.
///
/// Lines are read as bytes and decoded lossily, so tool output that is not
/// valid UTF-8 never stops a pipe from being drained.
///
/// Returns all collected output lines for error reporting.
async fn stream_child_output(
    child: &mut tokio::process::Child,
    on_output: &(dyn Fn(String) + Send + Sync),
) -> LayerkitResult<Vec<String>> {
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| LayerkitError::Internal("child stderr was not piped".to_string()))?;
    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| LayerkitError::Internal("child stdout was not piped".to_string()))?;

    let mut stderr_reader = BufReader::new(stderr);
    let mut stdout_reader = BufReader::new(stdout);
    // read_until keeps partial lines here when the other branch wins the select
    let mut stderr_buf = Vec::new();
    let mut stdout_buf = Vec::new();

    let mut all_output = Vec::new();
    let mut stderr_done = false;
    let mut stdout_done = false;

    while !stderr_done || !stdout_done {
        tokio::select! {
            read = stderr_reader.read_until(b'\n', &mut stderr_buf), if !stderr_done => {
                stderr_done = emit_line(read, &mut stderr_buf, on_output, &mut all_output)?;
            }
            read = stdout_reader.read_until(b'\n', &mut stdout_buf), if !stdout_done => {
                stdout_done = emit_line(read, &mut stdout_buf, on_output, &mut all_output)?;
            }
        }
    }

    Ok(all_output)
}

/// Hand one buffered line to `on_output`. Returns true at end of stream.
fn emit_line(
    read: std::io::Result<usize>,
    buf: &mut Vec<u8>,
    on_output: &(dyn Fn(String) + Send + Sync),
    all_output: &mut Vec<String>,
) -> LayerkitResult<bool> {
    let n = read.map_err(|e| LayerkitError::io("reading tool output", e))?;
    if n == 0 {
        return Ok(true);
    }

    let line = String::from_utf8_lossy(buf)
        .trim_end_matches(['\n', '\r'])
        .to_string();
    buf.clear();
    on_output(line.clone());
    all_output.push(line);
    Ok(false)
}
