//! Wire types for the qbridge MCP server: JSON-RPC 2.0 envelopes and the MCP
//! payloads they carry.

pub mod jsonrpc;
pub mod mcp;
