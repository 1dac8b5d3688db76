//! Errors surfaced to the caller of a tool.
//!
//! Every variant renders as a complete sentence naming what went wrong and,
//! where one exists, the setting that would change the outcome. None of them
//! is retried inside this crate.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ToolError {
    /// The tool is not listed in `ENABLE_ADDITIONAL_TOOLS`.
    #[error(
        "{label} tool is not enabled. Set the ENABLE_ADDITIONAL_TOOLS environment variable \
         to include '{tool}' to enable it."
    )]
    NotEnabled { label: String, tool: String },

    /// Input did not match the tool's schema.
    #[error("Invalid parameters: {0}")]
    Validation(String),

    /// The external program is not installed or not on `PATH`.
    #[error(
        "{cli} not found: '{program}' is not installed or not on PATH. \
         Install it or point the q_cli.command setting at the binary."
    )]
    ExecutableNotFound { cli: String, program: String },

    /// The external program exited unsuccessfully.
    #[error("{cli} error: {}{}", exit_status_text(.exit_code), stderr_suffix(.stderr))]
    ExecutionFailed {
        cli: String,
        exit_code: Option<i32>,
        stderr: String,
    },

    /// The deadline elapsed and the child was killed.
    #[error(
        "{cli} timed out after {secs} seconds. Increase the AGENT_TIMEOUT environment \
         variable to allow longer runs."
    )]
    Timeout { cli: String, secs: u64 },

    /// The caller cancelled the call and the child was killed.
    #[error("{cli} invocation was cancelled before it finished.")]
    Cancelled { cli: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ToolError {
    /// Short error code string, stable across releases.
    pub fn code(&self) -> &'static str {
        match self {
            ToolError::NotEnabled { .. } => "NOT_ENABLED",
            ToolError::Validation(_) => "INVALID_PARAMS",
            ToolError::ExecutableNotFound { .. } => "CLI_NOT_FOUND",
            ToolError::ExecutionFailed { .. } => "EXECUTION_FAILED",
            ToolError::Timeout { .. } => "TIMEOUT",
            ToolError::Cancelled { .. } => "CANCELLED",
            ToolError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

fn exit_status_text(code: &Option<i32>) -> String {
    match code {
        Some(c) => format!("process exited with exit status {c}"),
        None => "process was terminated by a signal".to_string(),
    }
}

fn stderr_suffix(stderr: &str) -> String {
    if stderr.is_empty() {
        " (no stderr output)".to_string()
    } else {
        format!(". stderr: {stderr}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_enabled_names_variable_and_tool() {
        let e = ToolError::NotEnabled {
            label: "Q Developer agent".into(),
            tool: "q-developer-agent".into(),
        };
        let msg = e.to_string();
        assert!(msg.starts_with("Q Developer agent tool is not enabled"));
        assert!(msg.contains("ENABLE_ADDITIONAL_TOOLS"));
        assert!(msg.contains("q-developer-agent"));
        assert_eq!(e.code(), "NOT_ENABLED");
    }

    #[test]
    fn execution_failed_embeds_status_and_stderr() {
        let e = ToolError::ExecutionFailed {
            cli: "Q Developer CLI".into(),
            exit_code: Some(2),
            stderr: "error: not logged in".into(),
        };
        assert_eq!(
            e.to_string(),
            "Q Developer CLI error: process exited with exit status 2. stderr: error: not logged in"
        );
    }

    #[test]
    fn execution_failed_without_stderr_or_code() {
        let e = ToolError::ExecutionFailed {
            cli: "Q Developer CLI".into(),
            exit_code: None,
            stderr: String::new(),
        };
        assert_eq!(
            e.to_string(),
            "Q Developer CLI error: process was terminated by a signal (no stderr output)"
        );
    }

    #[test]
    fn timeout_names_the_knob() {
        let e = ToolError::Timeout {
            cli: "Q Developer CLI".into(),
            secs: 180,
        };
        assert!(e.to_string().contains("180 seconds"));
        assert!(e.to_string().contains("AGENT_TIMEOUT"));
        assert_eq!(e.code(), "TIMEOUT");
    }
}
