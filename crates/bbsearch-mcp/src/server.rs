use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;

use bbsearch_engine::RetrievalOperations;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tracing::{debug, info, warn};

use crate::prompts::{get_prompt, list_prompts};
use crate::protocol::{
    JsonRpcRequest, JsonRpcResponse, INVALID_PARAMS, METHOD_NOT_FOUND, PARSE_ERROR, SERVER_ERROR,
};
use crate::tools::{call_tool, list_tools};

pub const PROTOCOL_VERSION: &str = "2025-03-26";

pub struct McpServer {
    pub ops: Arc<RetrievalOperations>,
    pub read_only: bool,
}

impl McpServer {
    pub fn new(ops: Arc<RetrievalOperations>, read_only: bool) -> Self {
        Self { ops, read_only }
    }

    /// Serve JSON-RPC over HTTP until the listener fails.
    pub async fn serve(self: Arc<Self>, host: &str, port: u16) -> anyhow::Result<()> {
        let addr = format!("{}:{}", host, port);
        let listener = TcpListener::bind(&addr).await?;

        info!(
            workspace = self.ops.workspace(),
            read_only = self.read_only,
            "MCP server listening on {}",
            addr
        );

        axum::serve(listener, self.router()).await?;

        Ok(())
    }

    pub fn router(self: Arc<Self>) -> Router {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);

        Router::new()
            .route("/", get(handle_info).post(handle_mcp_post))
            .route("/mcp", get(handle_info).post(handle_mcp_post))
            .layer(cors)
            .with_state(self)
    }
}

/// Dispatch one JSON-RPC message. Notifications yield no response.
pub async fn handle_request(server: &McpServer, req: JsonRpcRequest) -> Option<JsonRpcResponse> {
    debug!(method = %req.method, "Handling request");

    if req.is_notification() {
        if !req.method.starts_with("notifications/") {
            warn!(method = %req.method, "Ignoring notification");
        }
        return None;
    }
    let id = req.id.unwrap_or(serde_json::Value::Null);

    let response = match req.method.as_str() {
        "initialize" => JsonRpcResponse::success(
            id,
            json!({
                "protocolVersion": PROTOCOL_VERSION,
                "capabilities": { "tools": {}, "prompts": {} },
                "serverInfo": { "name": "bbsearch", "version": env!("CARGO_PKG_VERSION") }
            }),
        ),
        "ping" => JsonRpcResponse::success(id, json!({})),
        "tools/list" => JsonRpcResponse::success(id, list_tools(server.read_only)),
        "tools/call" => match call_tool(server, &req.params).await {
            Ok(result) => match serde_json::to_value(result) {
                Ok(value) => JsonRpcResponse::success(id, value),
                Err(e) => JsonRpcResponse::error(id, SERVER_ERROR, &e.to_string()),
            },
            Err(e) => JsonRpcResponse::error(id, INVALID_PARAMS, &e.to_string()),
        },
        "prompts/list" => JsonRpcResponse::success(id, list_prompts()),
        "prompts/get" => match get_prompt(&req.params) {
            Ok(prompt) => JsonRpcResponse::success(id, prompt),
            Err(e) => JsonRpcResponse::error(id, INVALID_PARAMS, &e.to_string()),
        },
        _ => JsonRpcResponse::error(
            id,
            METHOD_NOT_FOUND,
            &format!("Method not found: {}", req.method),
        ),
    };

    Some(response)
}

/// Parse and dispatch one raw message.
pub async fn handle_message(server: &McpServer, raw: &str) -> Option<JsonRpcResponse> {
    match serde_json::from_str::<JsonRpcRequest>(raw) {
        Ok(req) => handle_request(server, req).await,
        Err(e) => Some(JsonRpcResponse::error(
            serde_json::Value::Null,
            PARSE_ERROR,
            &format!("Parse error: {}", e),
        )),
    }
}

/// GET handler for server info/health check
async fn handle_info(State(server): State<Arc<McpServer>>) -> Json<serde_json::Value> {
    Json(json!({
        "name": "bbsearch",
        "version": env!("CARGO_PKG_VERSION"),
        "protocol": "mcp",
        "protocolVersion": PROTOCOL_VERSION,
        "workspace": server.ops.workspace(),
        "readOnly": server.read_only
    }))
}

/// POST handler for JSON-RPC messages (stateless)
async fn handle_mcp_post(State(server): State<Arc<McpServer>>, body: String) -> Response {
    match handle_message(&server, &body).await {
        Some(response) => Json(response).into_response(),
        None => StatusCode::ACCEPTED.into_response(),
    }
}
