//! `CommandRunner`: spawns an external program from an argument vector and
//! waits for it under a deadline and a cancellation token.
//!
//! There is no shell anywhere in this path: `CommandSpec::args` are handed to
//! the OS as discrete argv slots.

use async_trait::async_trait;
use std::process::Stdio;
use tokio::process::Command as AsyncCommand;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::{
    error::{Result, TerminalError},
    types::{CommandSpec, ExecOptions, ExecResult},
};

/// Seam between callers and the OS process primitive.
///
/// Tests substitute a fake that records the `CommandSpec` and returns a
/// canned `ExecResult` without spawning anything.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run `spec` to completion and capture its output.
    ///
    /// # Errors
    ///
    /// - `NotFound`: the program does not exist.
    /// - `Spawn`: any other spawn failure.
    /// - `Timeout`: `options.timeout` elapsed; the child was killed.
    /// - `Cancelled`: `cancel` fired first; the child was killed.
    /// - `IoError`: collecting output failed.
    ///
    /// A non-zero exit status is not an error at this layer; it is reported
    /// through `ExecResult::exit_code`.
    async fn run(
        &self,
        spec: &CommandSpec,
        options: &ExecOptions,
        cancel: &CancellationToken,
    ) -> Result<ExecResult>;
}

/// Runs commands with `tokio::process`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(
        &self,
        spec: &CommandSpec,
        options: &ExecOptions,
        cancel: &CancellationToken,
    ) -> Result<ExecResult> {
        debug!(program = %spec.program, argc = spec.args.len(), "spawning");

        // kill_on_drop: whichever select! branch wins, dropping the wait future
        // drops the Child and SIGKILLs it, so it cannot outlive this call.
        let child = AsyncCommand::new(&spec.program)
            .args(&spec.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    TerminalError::NotFound {
                        program: spec.program.clone(),
                    }
                } else {
                    TerminalError::Spawn(format!("failed to spawn {}: {e}", spec.program))
                }
            })?;

        let pid = child.id();
        let timeout_ms = options.timeout.as_millis() as u64;

        tokio::select! {
            output = child.wait_with_output() => {
                let output = output?;
                let result = ExecResult {
                    exit_code: output.status.code(),
                    stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                    stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
                };
                debug!(
                    ?pid,
                    exit_code = ?result.exit_code,
                    stdout_len = result.stdout.len(),
                    stderr_len = result.stderr.len(),
                    "child exited"
                );
                Ok(result)
            }
            _ = tokio::time::sleep(options.timeout) => {
                warn!(?pid, program = %spec.program, timeout_ms, "deadline elapsed, killing child");
                Err(TerminalError::Timeout { ms: timeout_ms })
            }
            _ = cancel.cancelled() => {
                warn!(?pid, program = %spec.program, "cancelled, killing child");
                Err(TerminalError::Cancelled)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    fn opts(ms: u64) -> ExecOptions {
        ExecOptions::with_timeout(Duration::from_millis(ms))
    }

    #[tokio::test]
    async fn captures_stdout_and_exit_code() {
        let spec = CommandSpec::new("printf").arg("hello");
        let result = ProcessRunner
            .run(&spec, &opts(5_000), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(result.stdout, "hello");
        assert_eq!(result.exit_code, Some(0));
        assert!(result.success());
    }

    #[tokio::test]
    async fn metacharacters_reach_the_child_verbatim() {
        let payload = "x; echo injected && rm -rf / | cat $(whoami) `id`";
        let spec = CommandSpec::new("printf").args(["%s", payload]);
        let result = ProcessRunner
            .run(&spec, &opts(5_000), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(result.stdout, payload);
    }

    #[tokio::test]
    async fn non_zero_exit_is_reported_not_raised() {
        let spec = CommandSpec::new("sh").args(["-c", "echo boom >&2; exit 3"]);
        let result = ProcessRunner
            .run(&spec, &opts(5_000), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(result.exit_code, Some(3));
        assert_eq!(result.stderr.trim(), "boom");
    }

    #[tokio::test]
    async fn missing_program_is_not_found() {
        let spec = CommandSpec::new("qbridge-definitely-missing-binary");
        let err = ProcessRunner
            .run(&spec, &opts(5_000), &CancellationToken::new())
            .await
            .unwrap_err();
        match err {
            TerminalError::NotFound { program } => {
                assert_eq!(program, "qbridge-definitely-missing-binary")
            }
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn deadline_kills_the_child() {
        let spec = CommandSpec::new("sleep").arg("10");
        let started = Instant::now();
        let err = ProcessRunner
            .run(&spec, &opts(200), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, TerminalError::Timeout { ms: 200 }));
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn cancellation_kills_the_child() {
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            trigger.cancel();
        });

        let spec = CommandSpec::new("sleep").arg("10");
        let started = Instant::now();
        let err = ProcessRunner
            .run(&spec, &opts(30_000), &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, TerminalError::Cancelled));
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn already_cancelled_token_returns_promptly() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let spec = CommandSpec::new("sleep").arg("10");
        let err = ProcessRunner
            .run(&spec, &opts(30_000), &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, TerminalError::Cancelled));
    }
}
