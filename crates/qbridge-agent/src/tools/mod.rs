//! Tool system for MCP tool calling.
//!
//! Defines the `Tool` trait that all tools implement, the per-call
//! `ToolContext`, and a registry for looking tools up by name and converting
//! them to MCP descriptors.

pub mod q_developer;

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use qbridge_core::{EnvSource, ProcessEnv};
use qbridge_protocol::mcp::ToolDescriptor;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::error::ToolError;

/// Shared cache handed to every call. Keyed by tool-defined strings.
pub type ResponseCache = DashMap<String, String>;

/// Successful result of executing a tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolOutput {
    /// Text content returned to the caller.
    pub content: String,
    /// Whether `content` was cut down to the response size limit.
    pub truncated: bool,
}

impl ToolOutput {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            truncated: false,
        }
    }
}

/// Everything a tool may use besides its input.
#[derive(Clone)]
pub struct ToolContext {
    /// Fires when the caller abandons the call.
    pub cancel: CancellationToken,
    /// Environment snapshot for gates and limits; read on every call.
    pub env: Arc<dyn EnvSource>,
    pub cache: Arc<ResponseCache>,
}

impl ToolContext {
    pub fn new(env: Arc<dyn EnvSource>) -> Self {
        Self {
            cancel: CancellationToken::new(),
            env,
            cache: Arc::new(ResponseCache::new()),
        }
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn with_cache(mut self, cache: Arc<ResponseCache>) -> Self {
        self.cache = cache;
        self
    }
}

impl Default for ToolContext {
    fn default() -> Self {
        Self::new(Arc::new(ProcessEnv))
    }
}

/// Trait that all tools must implement.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Unique name for this tool (e.g. "q-developer-agent").
    fn name(&self) -> &str;
    /// Human-readable description of what this tool does.
    fn description(&self) -> &str;
    /// JSON Schema for the tool's input parameters.
    fn input_schema(&self) -> serde_json::Value;
    /// Execute the tool with the given input.
    ///
    /// Failures carry no partial output.
    async fn execute(
        &self,
        ctx: &ToolContext,
        input: serde_json::Value,
    ) -> Result<ToolOutput, ToolError>;

    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor {
            name: self.name().to_string(),
            description: self.description().to_string(),
            input_schema: self.input_schema(),
        }
    }
}

/// Name-indexed set of tools, in registration order.
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `tool`, replacing any tool with the same name.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.retain(|t| t.name() != tool.name());
        self.tools.push(tool);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.iter().find(|t| t.name() == name).cloned()
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    /// MCP descriptors for `tools/list`.
    pub fn descriptors(&self) -> Vec<ToolDescriptor> {
        self.tools.iter().map(|t| t.descriptor()).collect()
    }
}
