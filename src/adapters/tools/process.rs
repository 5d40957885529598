//! Cancellable subprocess execution shared by the tool adapters.

use std::io::ErrorKind;
use std::process::Stdio;
use std::time::Instant;
use tokio::process::Command;
use tokio::sync::OnceCell;
use tokio_util::sync::CancellationToken;

use crate::domain::errors::{ConversionError, ConversionResult};

/// Captured result of a finished tool process.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    pub success: bool,
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    /// Combined output, stderr first, for diagnostics.
    pub fn diagnostics(&self) -> String {
        let mut text = String::new();
        for part in [self.stderr.trim(), self.stdout.trim()] {
            if part.is_empty() {
                continue;
            }
            if !text.is_empty() {
                text.push('\n');
            }
            text.push_str(part);
        }
        if text.is_empty() {
            text = match self.exit_code {
                Some(code) => format!("exited with status {code}"),
                None => "terminated by signal".to_string(),
            };
        }
        text
    }
}

/// Run a tool to completion unless `cancel` fires first.
///
/// The token is checked before spawning and after exit. If it fires while
/// the process runs, the child is dropped, which kills it.
pub async fn run_tool(
    tool: &str,
    hint: &str,
    mut cmd: Command,
    cancel: &CancellationToken,
) -> ConversionResult<ToolOutput> {
    if cancel.is_cancelled() {
        return Err(ConversionError::Cancelled);
    }

    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let child = cmd.spawn().map_err(|e| match e.kind() {
        ErrorKind::NotFound | ErrorKind::PermissionDenied => {
            ConversionError::tool_unavailable(tool, hint)
        }
        _ => ConversionError::Unexpected(format!("Failed to spawn {tool}: {e}")),
    })?;

    let started = Instant::now();
    let output = tokio::select! {
        biased;
        () = cancel.cancelled() => {
            tracing::debug!(tool, "cancellation requested, killing tool process");
            return Err(ConversionError::Cancelled);
        }
        output = child.wait_with_output() => output
            .map_err(|e| ConversionError::Unexpected(format!("Failed to wait for {tool}: {e}")))?,
    };

    if cancel.is_cancelled() {
        return Err(ConversionError::Cancelled);
    }

    tracing::debug!(
        tool,
        exit_code = ?output.status.code(),
        elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
        "tool process finished"
    );

    Ok(ToolOutput {
        success: output.status.success(),
        exit_code: output.status.code(),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    })
}

/// Memoised `--version` probe.
#[derive(Debug, Default)]
pub struct AvailabilityProbe {
    available: OnceCell<bool>,
}

impl AvailabilityProbe {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `program args... --version` once and remember whether it succeeded.
    pub async fn check(&self, program: &str, args: &[String]) -> bool {
        *self
            .available
            .get_or_init(|| async {
                let output = Command::new(program)
                    .args(args)
                    .arg("--version")
                    .stdin(Stdio::null())
                    .stdout(Stdio::piped())
                    .stderr(Stdio::piped())
                    .kill_on_drop(true)
                    .output()
                    .await;

                let available = matches!(output, Ok(ref out) if out.status.success());
                tracing::debug!(program, available, "probed tool availability");
                available
            })
            .await
    }
}
