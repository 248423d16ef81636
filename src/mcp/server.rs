//! MCP Server implementation
//!
//! Implements the Model Context Protocol server over line-delimited stdio.
//! Tool calls and resource reads run as their own tasks, so a slow Fatebook
//! request never holds up later messages. Responses are funnelled to a single
//! writer and may arrive out of request order.

use std::sync::Arc;

use serde_json::{json, Value};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;

use crate::error::{FatebookMcpError, McpError, Result};
use crate::fatebook::client::FatebookClient;
use crate::mcp::resources::ResourceHandler;
use crate::mcp::tools::ToolHandler;
use crate::mcp::types::*;

/// MCP Server info
const SERVER_NAME: &str = "fatebook-mcp";
const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Responses waiting for the writer
const RESPONSE_BUFFER: usize = 64;

/// MCP Server for Fatebook
pub struct McpServer {
    /// Tool handler, shared with in-flight calls
    tool_handler: Arc<ToolHandler>,

    /// Resource handler, shared with in-flight reads
    resource_handler: Arc<ResourceHandler>,

    /// Whether initialized
    initialized: bool,
}

/// What to do with one incoming message
enum Dispatch {
    /// Answered on the spot (`None` for notifications)
    Reply(Option<JsonRpcResponse>),

    /// Needs the Fatebook API; answered by [`answer_remote`]
    Remote(RequestId, JsonRpcRequest),
}

impl McpServer {
    /// Create a new MCP server
    pub fn new(client: Arc<FatebookClient>) -> Self {
        Self {
            tool_handler: Arc::new(ToolHandler::new(client.clone())),
            resource_handler: Arc::new(ResourceHandler::new(client)),
            initialized: false,
        }
    }

    /// Whether the client has sent `notifications/initialized`
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Run the server on stdio
    pub async fn run_stdio(&mut self) -> Result<()> {
        let stdin = BufReader::new(tokio::io::stdin());
        let stdout = tokio::io::stdout();
        self.run(stdin, stdout).await
    }

    /// Serve one JSON-RPC message per line until the reader is exhausted.
    /// Returns once every in-flight call has been answered.
    pub async fn run<R, W>(&mut self, reader: R, writer: W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let (tx, rx) = mpsc::channel::<JsonRpcResponse>(RESPONSE_BUFFER);

        let read_loop = async move {
            let mut lines = reader.lines();

            while let Some(line) = lines.next_line().await? {
                if line.trim().is_empty() {
                    continue;
                }

                match self.dispatch(&line) {
                    Ok(Dispatch::Reply(Some(response))) => {
                        if tx.send(response).await.is_err() {
                            tracing::warn!("Writer stopped, dropping response");
                        }
                    }
                    Ok(Dispatch::Reply(None)) => {
                        // Notification, no response needed
                    }
                    Ok(Dispatch::Remote(id, request)) => {
                        let tools = Arc::clone(&self.tool_handler);
                        let resources = Arc::clone(&self.resource_handler);
                        let tx = tx.clone();

                        tokio::spawn(async move {
                            let response = answer_remote(&tools, &resources, id, &request).await;
                            if tx.send(response).await.is_err() {
                                tracing::warn!(method = %request.method, "Writer stopped, dropping response");
                            }
                        });
                    }
                    Err(e) => {
                        tracing::error!("Error handling message: {}", e);
                    }
                }
            }

            tracing::info!("Input closed, waiting for in-flight calls");
            Ok::<(), FatebookMcpError>(())
        };

        let (read, write) = tokio::join!(read_loop, write_responses(rx, writer));
        read?;
        write?;

        tracing::info!("Shutting down");
        Ok(())
    }

    /// Handle an incoming JSON-RPC message and wait for its response
    pub async fn handle_message(&mut self, message: &str) -> Result<Option<JsonRpcResponse>> {
        match self.dispatch(message)? {
            Dispatch::Reply(response) => Ok(response),
            Dispatch::Remote(id, request) => Ok(Some(
                answer_remote(&self.tool_handler, &self.resource_handler, id, &request).await,
            )),
        }
    }

    /// Parse a message and answer everything that does not need the network
    fn dispatch(&mut self, message: &str) -> Result<Dispatch> {
        // Try to parse as request
        let request: JsonRpcRequest = match serde_json::from_str(message) {
            Ok(req) => req,
            Err(e) => {
                return Ok(Dispatch::Reply(Some(JsonRpcResponse::error(
                    None,
                    JsonRpcError::parse_error(e.to_string()),
                ))));
            }
        };

        // Notifications never get a response
        let Some(id) = request.id.clone() else {
            if request.method == methods::INITIALIZED {
                self.initialized = true;
                tracing::debug!("Client finished initialization");
            } else {
                tracing::debug!(method = %request.method, "Ignoring notification");
            }
            return Ok(Dispatch::Reply(None));
        };

        if request.jsonrpc != JSONRPC_VERSION {
            return Ok(Dispatch::Reply(Some(JsonRpcResponse::error(
                Some(id),
                JsonRpcError::invalid_request(format!(
                    "Unsupported jsonrpc version: {}",
                    request.jsonrpc
                )),
            ))));
        }

        let result = match request.method.as_str() {
            methods::CALL_TOOL | methods::READ_RESOURCE => {
                return Ok(Dispatch::Remote(id, request));
            }
            methods::INITIALIZE => self.handle_initialize(&request)?,
            methods::PING => json!({}),
            methods::LIST_TOOLS => self.handle_list_tools()?,
            methods::LIST_RESOURCES => {
                serde_json::to_value(ListResourcesResult { resources: vec![] })?
            }
            methods::LIST_RESOURCE_TEMPLATES => {
                serde_json::to_value(ListResourceTemplatesResult {
                    resource_templates: self.resource_handler.list_templates(),
                })?
            }
            _ => {
                return Ok(Dispatch::Reply(Some(JsonRpcResponse::error(
                    Some(id),
                    JsonRpcError::method_not_found(&request.method),
                ))));
            }
        };

        Ok(Dispatch::Reply(Some(JsonRpcResponse::success(Some(id), result))))
    }

    /// Handle initialize request
    fn handle_initialize(&self, request: &JsonRpcRequest) -> Result<Value> {
        let client = request
            .params
            .clone()
            .and_then(|p| serde_json::from_value::<InitializeParams>(p).ok());
        if let Some(params) = client {
            tracing::info!(
                client = params.client_info.as_ref().map_or("unknown", |c| c.name.as_str()),
                protocol = %params.protocol_version,
                "Client connected"
            );
        }

        let result = InitializeResult {
            protocol_version: MCP_VERSION.to_string(),
            server_info: ServerInfo {
                name: SERVER_NAME.to_string(),
                version: SERVER_VERSION.to_string(),
            },
            capabilities: ServerCapabilities {
                tools: Some(ToolsCapability {}),
                resources: Some(ResourcesCapability::default()),
            },
        };

        Ok(serde_json::to_value(result)?)
    }

    /// Handle list tools request
    fn handle_list_tools(&self) -> Result<Value> {
        let result = ListToolsResult {
            tools: self.tool_handler.list_tools(),
        };

        Ok(serde_json::to_value(result)?)
    }
}

/// Drain the response channel into the output, one line per response
async fn write_responses<W>(mut rx: mpsc::Receiver<JsonRpcResponse>, mut writer: W) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    while let Some(response) = rx.recv().await {
        let mut response_str = serde_json::to_string(&response)?;
        response_str.push('\n');
        writer.write_all(response_str.as_bytes()).await?;
        writer.flush().await?;
    }
    Ok(())
}

/// Answer a `tools/call` or `resources/read` request
async fn answer_remote(
    tools: &ToolHandler,
    resources: &ResourceHandler,
    id: RequestId,
    request: &JsonRpcRequest,
) -> JsonRpcResponse {
    let id = Some(id);

    let outcome = if request.method == methods::CALL_TOOL {
        handle_call_tool(tools, request).await
    } else {
        handle_read_resource(resources, request).await
    };

    match outcome {
        Ok(result) => JsonRpcResponse::success(id, result),
        Err(e) => JsonRpcResponse::error(id, resource_error(&e)),
    }
}

/// Handle call tool request; tool failures are reported inside the result
async fn handle_call_tool(tools: &ToolHandler, request: &JsonRpcRequest) -> Result<Value> {
    let result = match request.params.as_ref() {
        Some(p) => match serde_json::from_value::<CallToolParams>(p.clone()) {
            Ok(params) => {
                tracing::info!(tool = %params.name, "Calling tool");
                tools.call_tool(&params.name, params.arguments).await
            }
            Err(e) => CallToolResult::error(format!("Invalid tool parameters: {}", e)),
        },
        None => CallToolResult::error("Missing tool parameters"),
    };

    Ok(serde_json::to_value(result)?)
}

/// Handle read resource request
async fn handle_read_resource(
    resources: &ResourceHandler,
    request: &JsonRpcRequest,
) -> Result<Value> {
    let params: ReadResourceParams = request
        .params
        .clone()
        .ok_or_else(|| missing_params("resources/read requires a uri"))
        .and_then(|p| serde_json::from_value(p).map_err(|e| missing_params(&e.to_string())))?;

    let result = resources.read(&params.uri).await?;
    Ok(serde_json::to_value(result)?)
}

fn missing_params(message: &str) -> FatebookMcpError {
    FatebookMcpError::Mcp(McpError::InvalidParams {
        message: message.to_string(),
    })
}

fn resource_error(err: &FatebookMcpError) -> JsonRpcError {
    let data = json!({ "kind": err.kind().as_str(), "status": err.status() });
    match err {
        FatebookMcpError::Mcp(_) | FatebookMcpError::Validation(_) => {
            JsonRpcError::invalid_params(err.to_string()).with_data(data)
        }
        _ => JsonRpcError::internal_error(err.to_string()).with_data(data),
    }
}
