//! qbridge-agent: tools exposed over MCP.
//!
//! Every tool implements [`tools::Tool`]; the gateway looks them up through
//! [`tools::ToolRegistry`]. The only tool today is the Q Developer CLI
//! adapter in [`tools::q_developer`].

pub mod error;
pub mod tools;

pub use error::ToolError;
