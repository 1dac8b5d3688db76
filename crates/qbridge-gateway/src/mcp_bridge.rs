//! MCP stdio server.
//!
//! Protocol: JSON-RPC 2.0 over stdin/stdout (one JSON object per line).
//! Every `tools/call` runs on its own task so a slow CLI run never blocks
//! `ping` or a second call. Responses are funnelled through one writer task,
//! which keeps lines on stdout whole.

use std::sync::Arc;

use dashmap::DashMap;
use qbridge_agent::tools::{ResponseCache, ToolContext, ToolRegistry};
use qbridge_agent::ToolError;
use qbridge_core::config::QbridgeConfig;
use qbridge_core::EnvSource;
use qbridge_protocol::jsonrpc::{self, ErrorObject, Request, Response};
use qbridge_protocol::mcp::{
    self, CallToolParams, CallToolResult, CancelledParams, InitializeResult, ListToolsResult,
};
use serde_json::{json, Value};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub struct McpServer {
    config: QbridgeConfig,
    registry: Arc<ToolRegistry>,
    env: Arc<dyn EnvSource>,
    cache: Arc<ResponseCache>,
    /// Cancellation tokens of running `tools/call` requests, keyed by the
    /// serialized request id.
    in_flight: DashMap<String, CancellationToken>,
}

type Outbox = mpsc::UnboundedSender<Response>;

impl McpServer {
    pub fn new(config: QbridgeConfig, registry: ToolRegistry, env: Arc<dyn EnvSource>) -> Self {
        Self {
            config,
            registry: Arc::new(registry),
            env,
            cache: Arc::new(ResponseCache::new()),
            in_flight: DashMap::new(),
        }
    }

    /// Serve requests from `reader` until EOF, writing responses to `writer`.
    ///
    /// On EOF every in-flight call is cancelled and awaited before returning,
    /// so no child process outlives the server. Returns the writer once all
    /// responses are flushed.
    pub async fn serve<R, W>(self: Arc<Self>, mut reader: R, writer: W) -> anyhow::Result<W>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        let writer_task = tokio::spawn(write_loop(rx, writer));
        let mut calls = JoinSet::new();

        // Raw bytes per line: invalid UTF-8 is a parse error, not a dead server.
        let mut buf = Vec::new();
        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf).await {
                Ok(0) => break,
                Ok(_) => {}
                Err(e) => {
                    warn!(error = %e, "stdin read failed; shutting down");
                    break;
                }
            }

            match std::str::from_utf8(&buf) {
                Ok(line) => {
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        continue;
                    }
                    self.dispatch(trimmed, &tx, &mut calls);
                }
                Err(e) => {
                    warn!(error = %e, "message is not valid UTF-8");
                    send(&tx, Response::err(Value::Null, ErrorObject::parse_error(e)));
                }
            }
            while calls.try_join_next().is_some() {}
        }

        if !self.in_flight.is_empty() {
            info!(
                count = self.in_flight.len(),
                "stdin closed; cancelling in-flight calls"
            );
        }
        for entry in self.in_flight.iter() {
            entry.value().cancel();
        }
        while calls.join_next().await.is_some() {}

        drop(tx);
        let writer = writer_task.await??;
        Ok(writer)
    }

    fn dispatch(self: &Arc<Self>, line: &str, tx: &Outbox, calls: &mut JoinSet<()>) {
        let raw: Value = match serde_json::from_str(line) {
            Ok(v) => v,
            Err(e) => {
                warn!(error = %e, "unparseable message");
                send(tx, Response::err(Value::Null, ErrorObject::parse_error(e)));
                return;
            }
        };

        let id_hint = raw.get("id").cloned().unwrap_or(Value::Null);
        let request: Request = match serde_json::from_value(raw) {
            Ok(r) => r,
            Err(e) => {
                send(tx, Response::err(id_hint, ErrorObject::invalid_request(e)));
                return;
            }
        };
        if request.jsonrpc != jsonrpc::JSONRPC_VERSION {
            send(
                tx,
                Response::err(
                    id_hint,
                    ErrorObject::invalid_request(format!(
                        "unsupported jsonrpc version '{}'",
                        request.jsonrpc
                    )),
                ),
            );
            return;
        }

        debug!(method = %request.method, id = ?request.id, "request");

        let Some(id) = request.id.clone() else {
            self.handle_notification(&request);
            return;
        };

        match request.method.as_str() {
            mcp::INITIALIZE => {
                let server = &self.config.server;
                info!(name = %server.name, version = %server.version, "client initialized session");
                send(
                    tx,
                    Response::ok(id, InitializeResult::new(&server.name, &server.version)),
                );
            }
            mcp::PING => send(tx, Response::ok(id, json!({}))),
            mcp::TOOLS_LIST => send(
                tx,
                Response::ok(
                    id,
                    ListToolsResult {
                        tools: self.registry.descriptors(),
                    },
                ),
            ),
            mcp::TOOLS_CALL => self.start_call(id, request.params_or_empty(), tx, calls),
            other => send(tx, Response::err(id, ErrorObject::method_not_found(other))),
        }
    }

    fn handle_notification(&self, request: &Request) {
        match request.method.as_str() {
            mcp::INITIALIZED => {}
            mcp::CANCELLED => {
                match serde_json::from_value::<CancelledParams>(request.params_or_empty()) {
                    Ok(params) => self.cancel(&params),
                    Err(e) => warn!(error = %e, "malformed cancellation notice"),
                }
            }
            other => debug!(method = %other, "ignoring notification"),
        }
    }

    fn cancel(&self, params: &CancelledParams) {
        let key = params.request_id.to_string();
        match self.in_flight.get(&key) {
            Some(token) => {
                info!(
                    request_id = %key,
                    reason = params.reason.as_deref().unwrap_or("none"),
                    "cancelling tool call"
                );
                token.cancel();
            }
            None => debug!(request_id = %key, "cancellation for unknown or finished call"),
        }
    }

    fn start_call(self: &Arc<Self>, id: Value, params: Value, tx: &Outbox, calls: &mut JoinSet<()>) {
        let params: CallToolParams = match serde_json::from_value(params) {
            Ok(p) => p,
            Err(e) => {
                send(tx, Response::err(id, ErrorObject::invalid_params(e)));
                return;
            }
        };
        let Some(tool) = self.registry.get(&params.name) else {
            send(
                tx,
                Response::err(
                    id,
                    ErrorObject::invalid_params(format!("unknown tool '{}'", params.name)),
                ),
            );
            return;
        };

        let key = id.to_string();
        if self.in_flight.contains_key(&key) {
            send(
                tx,
                Response::err(
                    id,
                    ErrorObject::invalid_request(format!("request id {key} is already in flight")),
                ),
            );
            return;
        }

        let token = CancellationToken::new();
        self.in_flight.insert(key.clone(), token.clone());
        let ctx = ToolContext::new(Arc::clone(&self.env))
            .with_cancel(token)
            .with_cache(Arc::clone(&self.cache));
        let arguments = params.arguments_or_empty();
        let server = Arc::clone(self);
        let tx = tx.clone();

        calls.spawn(async move {
            let outcome = tool.execute(&ctx, arguments).await;
            server.in_flight.remove(&key);

            let response = match outcome {
                Ok(output) => Response::ok(id, CallToolResult::text(output.content)),
                // A cancelled request gets no response.
                Err(ToolError::Cancelled { .. }) => {
                    debug!(request_id = %key, "call cancelled, no response sent");
                    return;
                }
                Err(e) => {
                    warn!(request_id = %key, code = e.code(), error = %e, "tool call failed");
                    Response::err(id, error_object(&e))
                }
            };
            send(&tx, response);
        });
    }
}

/// JSON-RPC error for a failed tool call. `data.code` carries the stable
/// tool error code.
pub fn error_object(err: &ToolError) -> ErrorObject {
    let code = match err {
        ToolError::NotEnabled { .. } => jsonrpc::TOOL_NOT_ENABLED,
        ToolError::Validation(_) => jsonrpc::INVALID_PARAMS,
        ToolError::ExecutableNotFound { .. } => jsonrpc::TOOL_CLI_NOT_FOUND,
        ToolError::ExecutionFailed { .. } => jsonrpc::TOOL_EXECUTION_FAILED,
        ToolError::Timeout { .. } => jsonrpc::TOOL_TIMEOUT,
        ToolError::Cancelled { .. } => jsonrpc::TOOL_CANCELLED,
        ToolError::Internal(_) => jsonrpc::INTERNAL_ERROR,
    };
    ErrorObject::new(code, err.to_string()).with_data(json!({ "code": err.code() }))
}

fn send(tx: &Outbox, response: Response) {
    if tx.send(response).is_err() {
        warn!("response writer has shut down; dropping response");
    }
}

async fn write_loop<W>(mut rx: mpsc::UnboundedReceiver<Response>, mut writer: W) -> std::io::Result<W>
where
    W: AsyncWrite + Unpin,
{
    while let Some(response) = rx.recv().await {
        let mut line = serde_json::to_vec(&response).map_err(std::io::Error::other)?;
        line.push(b'\n');
        writer.write_all(&line).await?;
        writer.flush().await?;
    }
    Ok(writer)
}
