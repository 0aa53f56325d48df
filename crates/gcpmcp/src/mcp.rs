//! MCP server over stdio
//!
//! Line-delimited JSON-RPC 2.0. Each request is handled on its own task so
//! slow tool calls do not hold up `ping` or other invocations; responses are
//! written as they complete. Shutdown cancels every in-flight tool call.

use gcpmcp_core::{ToolExecutor, ToolInput};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub const MCP_VERSION: &str = "2024-11-05";

const PARSE_ERROR: i64 = -32700;
const INVALID_REQUEST: i64 = -32600;
const METHOD_NOT_FOUND: i64 = -32601;
const INVALID_PARAMS: i64 = -32602;

pub struct McpServer<E> {
    executor: E,
    shutdown: CancellationToken,
}

impl<E: ToolExecutor + 'static> McpServer<E> {
    pub fn new(executor: E, shutdown: CancellationToken) -> Self {
        Self { executor, shutdown }
    }

    /// Serve until EOF on `reader` or shutdown. In-flight requests are
    /// drained before returning.
    pub async fn serve<R, W>(self: Arc<Self>, reader: R, mut writer: W) -> anyhow::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let (tx, mut rx) = mpsc::unbounded_channel::<Value>();
        let mut lines = reader.lines();
        let mut in_flight = JoinSet::new();

        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => {
                    info!("Shutdown requested, cancelling in-flight requests");
                    break;
                }
                Some(response) = rx.recv() => {
                    write_message(&mut writer, &response).await?;
                }
                Some(joined) = in_flight.join_next(), if !in_flight.is_empty() => {
                    if let Err(e) = joined {
                        warn!(error = %e, "Request task failed");
                    }
                }
                line = lines.next_line() => {
                    let Some(line) = line? else {
                        debug!("stdin closed");
                        break;
                    };
                    let line = line.trim().to_string();
                    if line.is_empty() {
                        continue;
                    }

                    let server = Arc::clone(&self);
                    let tx = tx.clone();
                    in_flight.spawn(async move {
                        if let Some(response) = server.handle_message(&line).await {
                            let _ = tx.send(response);
                        }
                    });
                }
            }
        }

        drop(tx);
        while let Some(joined) = in_flight.join_next().await {
            if let Err(e) = joined {
                warn!(error = %e, "Request task failed");
            }
        }
        while let Some(response) = rx.recv().await {
            write_message(&mut writer, &response).await?;
        }
        Ok(())
    }

    /// Handle one JSON-RPC message. Notifications produce no response.
    pub async fn handle_message(&self, line: &str) -> Option<Value> {
        let request: Value = match serde_json::from_str(line) {
            Ok(request) => request,
            Err(e) => {
                return Some(error_response(
                    &Value::Null,
                    PARSE_ERROR,
                    format!("Parse error: {}", e),
                ))
            }
        };

        let id = request.get("id").cloned();
        let Some(method) = request.get("method").and_then(Value::as_str) else {
            return Some(error_response(
                &id.unwrap_or(Value::Null),
                INVALID_REQUEST,
                "Invalid request: missing method",
            ));
        };

        let Some(id) = id else {
            debug!(method = %method, "Received notification");
            return None;
        };

        debug!(method = %method, id = %id, "Received request");
        let params = request.get("params").cloned().unwrap_or_else(|| json!({}));

        let response = match method {
            "initialize" => self.handle_initialize(&id, &params),
            "ping" => success_response(&id, json!({})),
            "tools/list" => self.handle_list_tools(&id),
            "tools/call" => self.handle_tool_call(&id, &params).await,
            _ => error_response(&id, METHOD_NOT_FOUND, format!("Method not found: {}", method)),
        };
        Some(response)
    }

    fn handle_initialize(&self, id: &Value, params: &Value) -> Value {
        let client_info = params.get("clientInfo").cloned().unwrap_or(json!({}));
        info!(client = %client_info, "Client initialized");

        success_response(
            id,
            json!({
                "protocolVersion": MCP_VERSION,
                "capabilities": {
                    "tools": { "listChanged": false }
                },
                "serverInfo": {
                    "name": "gcpmcp",
                    "version": gcpmcp_core::VERSION
                }
            }),
        )
    }

    fn handle_list_tools(&self, id: &Value) -> Value {
        let tools: Vec<Value> = self
            .executor
            .list_tools()
            .into_iter()
            .map(|t| {
                json!({
                    "name": t.name,
                    "description": t.description,
                    "inputSchema": t.parameters
                })
            })
            .collect();

        success_response(id, json!({ "tools": tools }))
    }

    async fn handle_tool_call(&self, id: &Value, params: &Value) -> Value {
        let Some(name) = params.get("name").and_then(Value::as_str) else {
            return error_response(id, INVALID_PARAMS, "Missing tool name");
        };
        if self.executor.get_tool(name).is_none() {
            return error_response(id, INVALID_PARAMS, format!("Tool not found: {}", name));
        }

        let arguments = params.get("arguments").cloned().unwrap_or_else(|| json!({}));
        let input = ToolInput::new(arguments).with_cancellation(self.shutdown.child_token());

        info!(tool = %name, "Calling tool");
        let (text, is_error) = match self.executor.execute_tool(name, input).await {
            Ok(result) if result.success => (to_pretty(&result.data), false),
            Ok(result) => (
                result
                    .error
                    .unwrap_or_else(|| "Tool failed without an error message".to_string()),
                true,
            ),
            Err(e) => (format!("Error: {}", e), true),
        };

        success_response(
            id,
            json!({
                "content": [{ "type": "text", "text": text }],
                "isError": is_error
            }),
        )
    }
}

fn to_pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

fn success_response(id: &Value, result: Value) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "result": result
    })
}

fn error_response(id: &Value, code: i64, message: impl Into<String>) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "error": {
            "code": code,
            "message": message.into()
        }
    })
}

async fn write_message<W: AsyncWrite + Unpin>(writer: &mut W, message: &Value) -> anyhow::Result<()> {
    let mut line = serde_json::to_string(message)?;
    line.push('\n');
    writer.write_all(line.as_bytes()).await?;
    writer.flush().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use gcpmcp_core::{GcpError, GcpResult, Tool, ToolConfig, ToolResult, ToolType};
    use gcpmcp_tools::ToolRegistry;
    use std::collections::HashMap;

    struct EchoTool {
        config: ToolConfig,
    }

    impl EchoTool {
        fn new() -> Self {
            Self {
                config: ToolConfig {
                    name: "echo".to_string(),
                    description: "Echo the arguments".to_string(),
                    parameters: json!({"type": "object", "properties": {}}),
                    tool_type: ToolType::Custom,
                    timeout_secs: 5,
                    extra: HashMap::new(),
                },
            }
        }
    }

    #[async_trait]
    impl Tool for EchoTool {
        async fn execute(&self, input: ToolInput) -> GcpResult<ToolResult> {
            if input.arguments.get("fail").is_some() {
                return Err(GcpError::validation("Function f does not have an HTTP trigger"));
            }
            Ok(ToolResult::success(input.arguments))
        }

        fn config(&self) -> &ToolConfig {
            &self.config
        }
    }

    fn server() -> McpServer<gcpmcp_tools::BuiltinToolExecutor> {
        let mut registry = ToolRegistry::new();
        registry.register(EchoTool::new());
        McpServer::new(registry.into_executor(), CancellationToken::new())
    }

    #[tokio::test]
    async fn test_initialize() {
        let response = server()
            .handle_message(r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{"clientInfo":{"name":"test"}}}"#)
            .await
            .unwrap();

        assert_eq!(response["id"], 1);
        assert_eq!(response["result"]["protocolVersion"], MCP_VERSION);
        assert_eq!(response["result"]["serverInfo"]["name"], "gcpmcp");
    }

    #[tokio::test]
    async fn test_notification_has_no_response() {
        let response = server()
            .handle_message(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#)
            .await;
        assert!(response.is_none());
    }

    #[tokio::test]
    async fn test_list_tools() {
        let response = server()
            .handle_message(r#"{"jsonrpc":"2.0","id":"a","method":"tools/list"}"#)
            .await
            .unwrap();

        let tools = response["result"]["tools"].as_array().unwrap();
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0]["name"], "echo");
        assert_eq!(tools[0]["inputSchema"]["type"], "object");
    }

    #[tokio::test]
    async fn test_tool_call_success() {
        let response = server()
            .handle_message(r#"{"jsonrpc":"2.0","id":2,"method":"tools/call","params":{"name":"echo","arguments":{"x":1}}}"#)
            .await
            .unwrap();

        assert_eq!(response["result"]["isError"], false);
        let text = response["result"]["content"][0]["text"].as_str().unwrap();
        assert_eq!(serde_json::from_str::<Value>(text).unwrap(), json!({"x": 1}));
    }

    #[tokio::test]
    async fn test_tool_call_failure_is_tool_error() {
        let response = server()
            .handle_message(r#"{"jsonrpc":"2.0","id":3,"method":"tools/call","params":{"name":"echo","arguments":{"fail":true}}}"#)
            .await
            .unwrap();

        assert_eq!(response["result"]["isError"], true);
        assert_eq!(
            response["result"]["content"][0]["text"],
            "Error: Validation failed: Function f does not have an HTTP trigger"
        );
    }

    #[tokio::test]
    async fn test_unknown_tool_and_method() {
        let response = server()
            .handle_message(r#"{"jsonrpc":"2.0","id":4,"method":"tools/call","params":{"name":"nope"}}"#)
            .await
            .unwrap();
        assert_eq!(response["error"]["code"], INVALID_PARAMS);

        let response = server()
            .handle_message(r#"{"jsonrpc":"2.0","id":5,"method":"resources/list"}"#)
            .await
            .unwrap();
        assert_eq!(response["error"]["code"], METHOD_NOT_FOUND);
    }

    #[tokio::test]
    async fn test_parse_error() {
        let response = server().handle_message("{not json").await.unwrap();
        assert_eq!(response["error"]["code"], PARSE_ERROR);
        assert!(response["id"].is_null());
    }

    #[tokio::test]
    async fn test_serve_until_eof() {
        let input = concat!(
            r#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#,
            "\n\n",
            r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
            "\n",
            r#"{"jsonrpc":"2.0","id":2,"method":"tools/call","params":{"name":"echo","arguments":{"y":2}}}"#,
            "\n"
        );
        let mut output = Vec::new();

        Arc::new(server())
            .serve(input.as_bytes(), &mut output)
            .await
            .unwrap();

        let responses: Vec<Value> = String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(responses.len(), 2);

        let mut ids: Vec<i64> = responses.iter().map(|r| r["id"].as_i64().unwrap()).collect();
        ids.sort();
        assert_eq!(ids, vec![1, 2]);
    }
}
