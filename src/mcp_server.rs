use std::io::{BufRead, BufReader, Write};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::client::KinesisApi;
use crate::config::ServerConfig;
use crate::error::{McpError, Result, ToolError};
use crate::tools;

/// Guidance surfaced to MCP clients on initialize.
const SERVER_INSTRUCTIONS: &str = "Manage AWS Kinesis Data Streams: create and configure streams, \
write and read records, manage shards, monitoring, encryption, tags, retention, and consumers. \
Set the KINESIS-MCP-READONLY environment variable to true to refuse all mutating operations.";

/// JSON-RPC message types
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum JsonRpcMessage {
    Request(JsonRpcRequest),
    Response(JsonRpcResponse),
    Notification(JsonRpcNotification),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    pub id: serde_json::Value,
    pub method: String,
    pub params: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    pub id: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcNotification {
    pub jsonrpc: String,
    pub method: String,
    pub params: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ToolCall {
    pub name: String,
    #[serde(default = "empty_arguments")]
    pub arguments: serde_json::Value,
}

fn empty_arguments() -> serde_json::Value {
    serde_json::json!({})
}

fn response(id: serde_json::Value, result: serde_json::Value) -> JsonRpcResponse {
    JsonRpcResponse {
        jsonrpc: "2.0".to_string(),
        id,
        result: Some(result),
        error: None,
    }
}

fn error_response(id: serde_json::Value, code: i32, message: String) -> JsonRpcResponse {
    JsonRpcResponse {
        jsonrpc: "2.0".to_string(),
        id,
        result: None,
        error: Some(JsonRpcError {
            code,
            message,
            data: None,
        }),
    }
}

/// MCP server speaking JSON-RPC over stdio. One request is handled at a
/// time, in arrival order.
pub struct KinesisMcpServer {
    config: ServerConfig,
    api: Arc<dyn KinesisApi>,
    stdin: std::io::Stdin,
    stdout: std::io::Stdout,
}

impl KinesisMcpServer {
    pub fn new(config: ServerConfig, api: Arc<dyn KinesisApi>) -> Self {
        Self {
            config,
            api,
            stdin: std::io::stdin(),
            stdout: std::io::stdout(),
        }
    }

    pub async fn run(&mut self) -> Result<()> {
        let reader = BufReader::new(self.stdin.lock());

        for line in reader.lines() {
            let line = line.map_err(McpError::Io)?;
            if line.trim().is_empty() {
                continue;
            }

            let message: JsonRpcMessage =
                serde_json::from_str(&line).map_err(McpError::Serialization)?;

            let reply = self.handle_message(message).await?;

            if let Some(reply) = reply {
                let reply_str = serde_json::to_string(&reply).map_err(McpError::Serialization)?;
                writeln!(self.stdout, "{}", reply_str).map_err(McpError::Io)?;
                self.stdout.flush().map_err(McpError::Io)?;
            }
        }

        Ok(())
    }

    async fn handle_message(&mut self, message: JsonRpcMessage) -> Result<Option<JsonRpcResponse>> {
        match message {
            JsonRpcMessage::Request(request) => {
                let reply = self.handle_request(request).await?;
                Ok(Some(reply))
            }
            JsonRpcMessage::Notification(notification) => {
                self.handle_notification(notification).await?;
                Ok(None)
            }
            JsonRpcMessage::Response(_) => {
                // We don't send requests, so we shouldn't receive responses
                Ok(None)
            }
        }
    }

    async fn handle_request(&mut self, request: JsonRpcRequest) -> Result<JsonRpcResponse> {
        match request.method.as_str() {
            "initialize" => self.handle_initialize(request),
            "tools/call" => self.handle_tool_call(request).await,
            "tools/list" => self.handle_tools_list(request),
            _ => Ok(error_response(
                request.id,
                -32601, // Method not found
                format!("Method '{}' not found", request.method),
            )),
        }
    }

    fn handle_initialize(&self, request: JsonRpcRequest) -> Result<JsonRpcResponse> {
        let capabilities = serde_json::json!({
            "protocolVersion": "2024-11-05",
            "capabilities": {
                "tools": {
                    "listChanged": true
                }
            },
            "serverInfo": {
                "name": "kinesis-mcp-server",
                "version": env!("CARGO_PKG_VERSION")
            },
            "instructions": SERVER_INSTRUCTIONS
        });

        Ok(response(request.id, capabilities))
    }

    fn handle_tools_list(&self, request: JsonRpcRequest) -> Result<JsonRpcResponse> {
        let listed: Vec<serde_json::Value> = tools::TOOLS
            .iter()
            .map(|tool| {
                serde_json::json!({
                    "name": tool.name,
                    "description": tool.description,
                    "inputSchema": (tool.input_schema)(),
                })
            })
            .collect();

        Ok(response(request.id, serde_json::json!({ "tools": listed })))
    }

    async fn handle_tool_call(&mut self, request: JsonRpcRequest) -> Result<JsonRpcResponse> {
        let params = request
            .params
            .ok_or_else(|| McpError::InvalidRequest("Missing params for tools/call".to_string()))?;

        let tool_call: ToolCall =
            serde_json::from_value(params).map_err(McpError::Serialization)?;

        // Generate a human-readable description of the call
        let mut description_output = Vec::new();
        if let Err(e) =
            tools::queue_description(&tool_call.name, &tool_call.arguments, &mut description_output)
        {
            tracing::warn!("Failed to generate call description: {}", e);
        }

        let result = tools::dispatch(
            &self.config,
            self.api.as_ref(),
            &tool_call.name,
            tool_call.arguments,
        )
        .await;

        match result {
            Ok(value) => {
                let description = String::from_utf8(description_output).unwrap_or_default();
                let rendered =
                    serde_json::to_string_pretty(&value).map_err(McpError::Serialization)?;
                let text = format!(
                    "{}\n\nResult:\n{}",
                    description,
                    crate::truncate_utf8(&rendered, crate::MAX_TOOL_RESPONSE_SIZE)
                );

                Ok(response(
                    request.id,
                    serde_json::json!({
                        "content": [{ "type": "text", "text": text }]
                    }),
                ))
            }
            Err(ToolError::UnknownTool(name)) => Ok(error_response(
                request.id,
                -32601,
                format!("Tool '{}' not found", name),
            )),
            Err(e) => {
                tracing::debug!(tool = %tool_call.name, "tool call failed: {}", e);
                // Guard, validation, and remote faults are tool results, not
                // protocol errors, so the calling agent can read them.
                Ok(response(
                    request.id,
                    serde_json::json!({
                        "content": [{ "type": "text", "text": e.to_json().to_string() }],
                        "isError": true
                    }),
                ))
            }
        }
    }

    async fn handle_notification(&self, notification: JsonRpcNotification) -> Result<()> {
        match notification.method.as_str() {
            "notifications/initialized" => {
                // Client handshake complete, requests follow
                Ok(())
            }
            _ => {
                // Ignore unknown notifications
                Ok(())
            }
        }
    }
}
