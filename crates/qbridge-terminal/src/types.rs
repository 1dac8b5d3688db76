//! Shared data types for qbridge-terminal.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

// ---------------------------------------------------------------------------
// CommandSpec
// ---------------------------------------------------------------------------

/// A program plus its argument vector.
///
/// Arguments are handed to the OS one element per slot; nothing is ever
/// joined into a string or passed through a shell, so metacharacters inside
/// an argument reach the child verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandSpec {
    /// Program name (resolved on `PATH`) or absolute path.
    pub program: String,

    /// Arguments after the program, in order.
    pub args: Vec<String>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Append one argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append several arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Full argument vector with the program as element zero.
    pub fn argv(&self) -> Vec<String> {
        std::iter::once(self.program.clone())
            .chain(self.args.iter().cloned())
            .collect()
    }
}

impl fmt::Display for CommandSpec {
    /// Debug-friendly rendering; each element is quoted so boundaries stay visible.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {arg:?}")?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// ExecOptions
// ---------------------------------------------------------------------------

/// Knobs for a single execution.
#[derive(Debug, Clone)]
pub struct ExecOptions {
    /// Deadline for the child. It is killed once this elapses.
    pub timeout: Duration,
}

impl ExecOptions {
    pub fn with_timeout(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for ExecOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(180),
        }
    }
}

// ---------------------------------------------------------------------------
// ExecResult
// ---------------------------------------------------------------------------

/// Captured outcome of a child that ran to completion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecResult {
    /// Process exit code, `None` when the child was terminated by a signal.
    pub exit_code: Option<i32>,

    /// Captured standard output (lossy UTF-8).
    pub stdout: String,

    /// Captured standard error (lossy UTF-8).
    pub stderr: String,
}

impl ExecResult {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn argv_starts_with_program() {
        let spec = CommandSpec::new("q").arg("chat").args(["--no-interactive", "hi"]);
        assert_eq!(spec.argv(), vec!["q", "chat", "--no-interactive", "hi"]);
    }

    #[test]
    fn display_quotes_each_argument() {
        let spec = CommandSpec::new("q").arg("a b; rm -rf /");
        assert_eq!(spec.to_string(), r#"q "a b; rm -rf /""#);
    }

    #[test]
    fn signal_exit_is_not_success() {
        let r = ExecResult {
            exit_code: None,
            stdout: String::new(),
            stderr: String::new(),
        };
        assert!(!r.success());
    }
}
