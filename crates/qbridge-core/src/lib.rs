//! qbridge-core: configuration, environment access and invocation limits
//! shared by every qbridge crate.

pub mod config;
pub mod env;
pub mod error;
pub mod limits;

pub use env::{EnvSource, ProcessEnv};
pub use error::{CoreError, Result};
pub use limits::ResolvedLimits;
