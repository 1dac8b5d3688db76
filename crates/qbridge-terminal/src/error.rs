//! Error types for the qbridge-terminal crate.

use thiserror::Error;

/// All errors that can originate from running an external program.
#[derive(Debug, Error)]
pub enum TerminalError {
    /// The program could not be located on `PATH` (or at the given path).
    #[error("program not found: {program}")]
    NotFound { program: String },

    /// The child process could not be spawned for a reason other than absence.
    #[error("spawn error: {0}")]
    Spawn(String),

    /// Underlying I/O failure while collecting output.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// The child exceeded its time budget and was killed.
    #[error("operation timed out after {ms}ms")]
    Timeout { ms: u64 },

    /// The caller cancelled the operation; the child was killed.
    #[error("operation cancelled")]
    Cancelled,
}

/// Convenience alias used throughout this crate.
pub type Result<T> = std::result::Result<T, TerminalError>;
