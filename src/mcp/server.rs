use crate::app::App;
use crate::errors::{ErrorCode, McpError, ToolError};
use crate::mcp::catalog::validate_tool_args;
use crate::mcp::protocol::{JsonRpcRequest, JsonRpcResponse, ToolCallParams};
use crate::services::config::GatewayConfig;
use serde_json::Value;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader, BufWriter};

const PROTOCOL_VERSION: &str = "2025-06-18";
const SERVER_NAME: &str = "pica";
const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

pub struct McpServer {
    app: Arc<App>,
}

impl McpServer {
    pub fn new(config: GatewayConfig) -> Result<Self, ToolError> {
        let app = App::initialize(config)?;
        Ok(Self { app: Arc::new(app) })
    }

    pub fn from_app(app: Arc<App>) -> Self {
        Self { app }
    }

    fn handle_initialize(&self) -> Value {
        serde_json::json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": {"tools": {"listChanged": false}},
            "serverInfo": {"name": SERVER_NAME, "version": SERVER_VERSION},
        })
    }

    fn handle_tools_list(&self) -> Value {
        serde_json::json!({ "tools": self.app.tool_definitions() })
    }

    async fn handle_tools_call(&self, name: &str, args: Value) -> Result<Value, McpError> {
        let executor = &self.app.tool_executor;
        if executor.has_tool(name) {
            validate_tool_args(name, &args)?;
        }
        let args = if args.is_null() {
            Value::Object(Default::default())
        } else {
            args
        };

        let envelope = executor
            .execute(name, args)
            .await
            .map_err(|err| McpError::from_tool_error(name, &err))?;

        let text = serde_json::to_string(&envelope)
            .map_err(|err| McpError::new(ErrorCode::InternalError, err.to_string()))?;
        Ok(serde_json::json!({
            "content": [ { "type": "text", "text": text } ]
        }))
    }

    async fn dispatch(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        match request.method.as_str() {
            "notifications/initialized" => request
                .id
                .map(|id| JsonRpcResponse::success(id, serde_json::json!({}))),
            _ if request.method.starts_with("notifications/") && request.is_notification() => None,
            "initialize" => request
                .id
                .map(|id| JsonRpcResponse::success(id, self.handle_initialize())),
            "ping" => request
                .id
                .map(|id| JsonRpcResponse::success(id, serde_json::json!({}))),
            "tools/list" => request
                .id
                .map(|id| JsonRpcResponse::success(id, self.handle_tools_list())),
            "tools/call" => {
                let id = request.id?;
                let params: ToolCallParams = match serde_json::from_value(request.params) {
                    Ok(params) => params,
                    Err(_) => {
                        return Some(JsonRpcResponse::failure(
                            id,
                            ErrorCode::InvalidParams.as_i32(),
                            "Invalid tools/call params",
                        ))
                    }
                };
                if params.name.trim().is_empty() {
                    return Some(JsonRpcResponse::failure(
                        id,
                        ErrorCode::InvalidParams.as_i32(),
                        "Missing tool name",
                    ));
                }
                Some(
                    match self.handle_tools_call(&params.name, params.arguments).await {
                        Ok(result) => JsonRpcResponse::success(id, result),
                        Err(err) => JsonRpcResponse::from_error(id, err),
                    },
                )
            }
            _ => request.id.map(|id| {
                JsonRpcResponse::failure(id, ErrorCode::MethodNotFound.as_i32(), "Method not found")
            }),
        }
    }

    /// Handles one input line, returning the serialized response if the
    /// message expects one.
    pub async fn handle_line(&self, line: &str) -> Option<String> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return None;
        }

        let response = match serde_json::from_str::<Value>(trimmed) {
            Err(_) => Some(JsonRpcResponse::failure(
                Value::Null,
                ErrorCode::ParseError.as_i32(),
                "Parse error",
            )),
            Ok(parsed) => match serde_json::from_value::<JsonRpcRequest>(parsed) {
                Err(_) => Some(JsonRpcResponse::failure(
                    Value::Null,
                    ErrorCode::InvalidRequest.as_i32(),
                    "Invalid request",
                )),
                Ok(request) => self.dispatch(request).await,
            },
        };

        response.map(|response| {
            serde_json::to_string(&response).unwrap_or_else(|_| {
                r#"{"jsonrpc":"2.0","id":null,"error":{"code":-32603,"message":"Internal error"}}"#
                    .to_string()
            })
        })
    }

    /// Reads line-delimited JSON-RPC from `reader` until EOF.
    pub async fn serve<R, W>(&self, reader: R, writer: W) -> Result<(), ToolError>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = reader.lines();
        let mut writer = BufWriter::new(writer);

        while let Some(line) = lines
            .next_line()
            .await
            .map_err(|err| ToolError::internal(err.to_string()))?
        {
            if let Some(payload) = self.handle_line(&line).await {
                writer.write_all(payload.as_bytes()).await?;
                writer.write_all(b"\n").await?;
                writer.flush().await?;
            }
        }

        Ok(())
    }

    pub async fn run_stdio(&self) -> Result<(), ToolError> {
        self.app.logger.info("Listening on stdio", None);
        self.serve(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
            .await
    }
}

pub async fn run_stdio(config: GatewayConfig) -> Result<(), ToolError> {
    let server = McpServer::new(config)?;
    server.run_stdio().await
}
