//! MCP JSON-RPC protocol handler over stdio.
//!
//! Reads Content-Length framed JSON-RPC messages from the input, dispatches
//! them, and writes framed responses to the output. Implements the MCP
//! methods `initialize`, `notifications/initialized`, `tools/list` and
//! `tools/call`. Diagnostic logs go to stderr, never to the protocol stream.

use futures_util::future::{FutureExt, LocalBoxFuture};
use futures_util::stream::{FuturesUnordered, StreamExt};
use serde_json::{json, Value};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, error, info};

use super::framing::{encode_frame, FrameBuffer};
use super::handlers::ToolInvoker;
use super::jsonrpc::{JsonRpcRequest, JsonRpcResponse, Method, INTERNAL_ERROR};
use super::tools::{query_tool, QUERY_TOOL_NAME};
use crate::config::ServerConfig;

const PROTOCOL_VERSION: &str = "2024-11-05";
const READ_CHUNK_SIZE: usize = 8 * 1024;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Failed to read from input: {0}")]
    Read(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Dispatcher
// ---------------------------------------------------------------------------

/// Routes decoded JSON-RPC messages to their handlers.
pub struct McpServer<I> {
    server_name: String,
    server_version: String,
    invoker: I,
}

impl<I: ToolInvoker> McpServer<I> {
    pub fn new(config: &ServerConfig, invoker: I) -> Self {
        Self {
            server_name: config.server_name.clone(),
            server_version: config.server_version.clone(),
            invoker,
        }
    }

    /// Handle one decoded message.
    ///
    /// Returns `None` for every message without an `id`, whatever its method.
    pub async fn handle_message(&self, message: Value) -> Option<JsonRpcResponse> {
        let raw_id = message.as_object().and_then(|obj| obj.get("id")).cloned();
        let request: JsonRpcRequest = match serde_json::from_value(message) {
            Ok(req) => req,
            Err(e) => {
                error!("[MCP] Invalid JSON-RPC message: {}", e);
                return raw_id.map(JsonRpcResponse::invalid_request);
            }
        };

        let method = Method::from(request.method.as_str());
        debug!("[MCP] <- {} (id={:?})", request.method, request.id);

        if method == Method::Initialized {
            info!("[MCP] Client sent 'initialized' notification");
            return None;
        }

        let Some(id) = request.id else {
            debug!("[MCP] Ignoring notification {}", request.method);
            return None;
        };

        let response = match method {
            Method::Initialize => self.handle_initialize(id),
            Method::ToolsList => handle_tools_list(id),
            Method::ToolsCall => self.handle_tools_call(id, &request.params).await,
            Method::Initialized | Method::Unknown(_) => {
                JsonRpcResponse::method_not_found(id, &request.method)
            }
        };
        Some(response)
    }

    /// Handle `initialize` -- return server capabilities.
    fn handle_initialize(&self, id: Value) -> JsonRpcResponse {
        JsonRpcResponse::success(
            id,
            json!({
                "protocolVersion": PROTOCOL_VERSION,
                "capabilities": {
                    "tools": {}
                },
                "serverInfo": {
                    "name": self.server_name,
                    "version": self.server_version
                }
            }),
        )
    }

    /// Handle `tools/call` -- validate, then hand the query to the invoker.
    async fn handle_tools_call(&self, id: Value, params: &Value) -> JsonRpcResponse {
        let tool_name = params.get("name");
        if tool_name.and_then(Value::as_str) != Some(QUERY_TOOL_NAME) {
            let shown = match tool_name {
                Some(Value::String(name)) => name.clone(),
                Some(other) => other.to_string(),
                None => "(none)".to_string(),
            };
            return JsonRpcResponse::invalid_params(id, format!("Unknown tool: {}", shown));
        }

        let query = match params.get("arguments").and_then(|args| args.get("query")) {
            None | Some(Value::Null) => None,
            Some(Value::String(q)) => Some(q.clone()).filter(|q| !q.is_empty()),
            Some(_) => {
                return JsonRpcResponse::invalid_params(
                    id,
                    "Invalid argument: query must be a string",
                );
            }
        };
        let Some(query) = query else {
            return JsonRpcResponse::invalid_params(id, "Missing required argument: query");
        };

        let result = self.invoker.invoke(query).await;
        match serde_json::to_value(&result) {
            Ok(value) => JsonRpcResponse::success(id, value),
            Err(e) => {
                error!("[MCP] Failed to serialize tool result: {}", e);
                JsonRpcResponse::error(id, INTERNAL_ERROR, "Internal error")
            }
        }
    }
}

/// Handle `tools/list` -- the one static tool.
fn handle_tools_list(id: Value) -> JsonRpcResponse {
    JsonRpcResponse::success(id, json!({ "tools": [query_tool()] }))
}

// ---------------------------------------------------------------------------
// Transport loop
// ---------------------------------------------------------------------------

/// Run the server until `reader` reaches EOF.
///
/// Frames are extracted synchronously as bytes arrive; each decoded message
/// becomes an independent future. Input keeps being read while tool calls
/// are pending, and each response is written as soon as its future
/// resolves, so responses follow completion order rather than arrival order.
///
/// At EOF, calls already in flight are allowed to finish and their
/// responses are written before returning.
pub async fn run_server<R, W, I>(
    mut reader: R,
    mut writer: W,
    server: &McpServer<I>,
) -> Result<(), ServerError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
    I: ToolInvoker,
{
    let mut frames = FrameBuffer::new();
    let mut in_flight: FuturesUnordered<LocalBoxFuture<'_, Option<JsonRpcResponse>>> =
        FuturesUnordered::new();
    let mut chunk = vec![0u8; READ_CHUNK_SIZE];

    info!("[MCP] Server running on stdio");

    loop {
        tokio::select! {
            // Flush finished responses before taking more input.
            biased;

            Some(response) = in_flight.next(), if !in_flight.is_empty() => {
                if let Some(response) = response {
                    write_response(&mut writer, &response).await;
                }
            }
            read = reader.read(&mut chunk) => {
                let n = read?;
                if n == 0 {
                    break;
                }
                for body in frames.feed(&chunk[..n]) {
                    match serde_json::from_slice::<Value>(&body) {
                        Ok(message) => in_flight.push(server.handle_message(message).boxed_local()),
                        Err(e) => error!("[MCP] Parse error: {}", e),
                    }
                }
            }
        }
    }

    if !in_flight.is_empty() {
        info!("[MCP] Input closed, finishing {} request(s) in flight", in_flight.len());
    }
    while let Some(response) = in_flight.next().await {
        if let Some(response) = response {
            write_response(&mut writer, &response).await;
        }
    }
    if frames.buffered() > 0 {
        debug!("[MCP] Discarding {} unframed trailing bytes", frames.buffered());
    }
    info!("[MCP] Input closed, shutting down");
    Ok(())
}

/// Write one framed response and flush it.
async fn write_response<W: AsyncWrite + Unpin>(writer: &mut W, response: &JsonRpcResponse) {
    let frame = match encode_frame(response) {
        Ok(frame) => frame,
        Err(e) => {
            error!("[MCP] Failed to serialize response: {}", e);
            return;
        }
    };
    if let Err(e) = writer.write_all(&frame).await {
        error!("[MCP] Failed to write response: {}", e);
        return;
    }
    if let Err(e) = writer.flush().await {
        error!("[MCP] Failed to flush output: {}", e);
    }
}
