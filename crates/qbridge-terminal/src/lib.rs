//! qbridge-terminal: run external programs safely and bound their output.
//!
//! - [`runner`]: argv-only process spawning with a deadline and a
//!   cancellation token; the child never outlives the call.
//! - [`truncate`]: line-boundary-aware response limiting with an appended
//!   truncation notice.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use qbridge_terminal::{CommandRunner, CommandSpec, ExecOptions, ProcessRunner};
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() {
//!     let spec = CommandSpec::new("q").args(["chat", "--no-interactive", "hello"]);
//!     let result = ProcessRunner
//!         .run(&spec, &ExecOptions::default(), &CancellationToken::new())
//!         .await
//!         .unwrap();
//!     println!("{}", qbridge_terminal::truncate::apply_limit(&result.stdout, 1024));
//! }
//! ```

pub mod error;
pub mod runner;
pub mod truncate;
pub mod types;

pub use error::{Result, TerminalError};
pub use runner::{CommandRunner, ProcessRunner};
pub use types::{CommandSpec, ExecOptions, ExecResult};
