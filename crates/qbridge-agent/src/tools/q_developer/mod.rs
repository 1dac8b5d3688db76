//! `q-developer-agent`: runs one non-interactive `q chat` turn.

pub mod args;
pub mod request;

use std::sync::Arc;

use async_trait::async_trait;
use qbridge_core::env::is_tool_enabled;
use qbridge_core::ResolvedLimits;
use qbridge_terminal::truncate::apply_limit;
use qbridge_terminal::{CommandRunner, ExecOptions, ProcessRunner, TerminalError};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::{Tool, ToolContext, ToolOutput};
use crate::error::ToolError;

pub use args::{build_arguments, build_command};
pub use request::{QDeveloperRequest, ADVERTISED_MODELS};

pub const TOOL_NAME: &str = "q-developer-agent";
const TOOL_LABEL: &str = "Q Developer agent";
const CLI_LABEL: &str = "Q Developer CLI";

/// Tool that delegates a prompt to the AWS Q Developer CLI.
///
/// Disabled unless `ENABLE_ADDITIONAL_TOOLS` lists `q-developer-agent`.
/// Limits come from `AGENT_TIMEOUT` and `AGENT_MAX_RESPONSE_SIZE`, read
/// fresh on each call.
pub struct QDeveloperTool {
    program: String,
    runner: Arc<dyn CommandRunner>,
}

impl QDeveloperTool {
    pub fn new(program: impl Into<String>) -> Self {
        Self::with_runner(program, Arc::new(ProcessRunner))
    }

    pub fn with_runner(program: impl Into<String>, runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            program: program.into(),
            runner,
        }
    }

    /// Run a validated request. Skips the enablement gate.
    pub async fn invoke(
        &self,
        ctx: &ToolContext,
        req: &QDeveloperRequest,
    ) -> Result<ToolOutput, ToolError> {
        let limits = ResolvedLimits::resolve(ctx.env.as_ref());
        let spec = build_command(&self.program, req);
        let invocation_id = Uuid::new_v4();

        info!(
            %invocation_id,
            program = %self.program,
            arg_count = spec.args.len(),
            timeout_secs = limits.timeout_secs,
            "invoking Q Developer CLI"
        );
        debug!(%invocation_id, command = %spec, "argument vector");

        let options = ExecOptions::with_timeout(limits.timeout());
        let result = self
            .runner
            .run(&spec, &options, &ctx.cancel)
            .await
            .map_err(|e| self.classify(e, &limits))?;

        if !result.success() {
            warn!(
                %invocation_id,
                exit_code = ?result.exit_code,
                stderr_len = result.stderr.len(),
                "Q Developer CLI exited unsuccessfully"
            );
            return Err(ToolError::ExecutionFailed {
                cli: CLI_LABEL.to_string(),
                exit_code: result.exit_code,
                stderr: apply_limit(result.stderr.trim_end(), limits.max_response_bytes),
            });
        }

        let content = apply_limit(&result.stdout, limits.max_response_bytes);
        let truncated = content.len() != result.stdout.len();
        if truncated {
            warn!(
                %invocation_id,
                original_bytes = result.stdout.len(),
                returned_bytes = content.len(),
                limit = limits.max_response_bytes,
                "response truncated; raise AGENT_MAX_RESPONSE_SIZE to keep more"
            );
        } else {
            info!(%invocation_id, bytes = content.len(), "Q Developer CLI finished");
        }

        Ok(ToolOutput { content, truncated })
    }

    fn classify(&self, err: TerminalError, limits: &ResolvedLimits) -> ToolError {
        match err {
            TerminalError::NotFound { program } => {
                error!(%program, "Q Developer CLI not found");
                ToolError::ExecutableNotFound {
                    cli: CLI_LABEL.to_string(),
                    program,
                }
            }
            TerminalError::Timeout { ms } => {
                warn!(ms, "Q Developer CLI timed out; child killed");
                ToolError::Timeout {
                    cli: CLI_LABEL.to_string(),
                    secs: limits.timeout_secs,
                }
            }
            TerminalError::Cancelled => {
                info!("Q Developer CLI call cancelled; child killed");
                ToolError::Cancelled {
                    cli: CLI_LABEL.to_string(),
                }
            }
            other => {
                error!(error = %other, "Q Developer CLI invocation failed");
                ToolError::Internal(other.to_string())
            }
        }
    }
}

#[async_trait]
impl Tool for QDeveloperTool {
    fn name(&self) -> &str {
        TOOL_NAME
    }

    fn description(&self) -> &str {
        "Run a prompt through the AWS Q Developer CLI (`q chat`) non-interactively and \
         return its answer. Output above AGENT_MAX_RESPONSE_SIZE is truncated at a line \
         boundary with a notice; runs longer than AGENT_TIMEOUT seconds are killed."
    }

    fn input_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "prompt": {
                    "type": "string",
                    "description": "The prompt or question to send to Q Developer"
                },
                "resume": {
                    "type": "boolean",
                    "description": "Resume the previous conversation from this directory",
                    "default": false
                },
                "agent": {
                    "type": "string",
                    "description": "Context profile (agent) to use for this conversation"
                },
                "override-model": {
                    "type": "string",
                    "description": format!("Model to use, e.g. {}", ADVERTISED_MODELS.join(", "))
                },
                "yolo-mode": {
                    "type": "boolean",
                    "description": "Allow every tool without confirmation (passes --trust-all-tools)",
                    "default": false
                },
                "trust-tools": {
                    "type": "string",
                    "description": "Comma-separated list of tools to trust without confirmation"
                },
                "verbose": {
                    "type": "boolean",
                    "description": "Enable verbose logging output from the CLI",
                    "default": false
                }
            },
            "required": ["prompt"],
            "additionalProperties": false
        })
    }

    async fn execute(
        &self,
        ctx: &ToolContext,
        input: serde_json::Value,
    ) -> Result<ToolOutput, ToolError> {
        if !is_tool_enabled(ctx.env.as_ref(), TOOL_NAME) {
            warn!(tool = TOOL_NAME, "call rejected: tool not enabled");
            return Err(ToolError::NotEnabled {
                label: TOOL_LABEL.to_string(),
                tool: TOOL_NAME.to_string(),
            });
        }

        let req = QDeveloperRequest::from_value(input)?;
        self.invoke(ctx, &req).await
    }
}
