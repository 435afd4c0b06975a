//! HTTP Route Table
//!
//! | Method   | Path                      | Route |
//! |----------|---------------------------|-------|
//! | GET      | `/ping`                   | liveness, body `pong` |
//! | GET      | `/mcp`                    | endpoint metadata |
//! | POST     | `/mcp`                    | JSON-RPC |
//! | GET      | `/mcp/status`             | status snapshot |
//! | GET      | `/capabilities`, `/help`  | static documentation |
//!
//! A known path with the wrong method is 405; anything else is 404.

use crate::mcp::handlers::initialize::{SERVER_NAME, SUPPORTED_PROTOCOL_VERSIONS};
use crate::mcp::handlers::tools::tool_schemas;
use serde_json::{json, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Ping,
    McpInfo,
    McpRpc,
    McpStatus,
    Capabilities,
    Help,
    MethodNotAllowed(&'static str),
    NotFound,
}

impl Route {
    pub fn resolve(method: &str, path: &str) -> Self {
        let path = match path.trim_end_matches('/') {
            "" => "/",
            trimmed => trimmed,
        };

        match (method, path) {
            ("GET", "/ping") => Self::Ping,
            ("GET", "/mcp") => Self::McpInfo,
            ("POST", "/mcp") => Self::McpRpc,
            ("GET", "/mcp/status") => Self::McpStatus,
            ("GET", "/capabilities") => Self::Capabilities,
            ("GET", "/help") => Self::Help,
            (_, "/mcp") => Self::MethodNotAllowed("GET, POST"),
            (_, "/ping" | "/mcp/status" | "/capabilities" | "/help") => Self::MethodNotAllowed("GET"),
            _ => Self::NotFound,
        }
    }

    /// Whether the route reaches the JSON-RPC dispatcher (and so gets a session)
    pub fn is_rpc(&self) -> bool {
        matches!(self, Self::McpRpc)
    }
}

/// `GET /mcp`
pub fn mcp_info_document() -> Value {
    json!({
        "name": SERVER_NAME,
        "version": env!("CARGO_PKG_VERSION"),
        "transport": "streamable-http",
        "protocolVersions": SUPPORTED_PROTOCOL_VERSIONS,
        "endpoint": "/mcp",
        "usage": "POST JSON-RPC 2.0 requests (single, batch or notification) to this endpoint. Start with 'initialize', then 'tools/list' and 'tools/call'. Reuse the Mcp-Session-Id response header on later requests."
    })
}

/// `GET /capabilities`
pub fn capabilities_document() -> Value {
    json!({
        "server": {
            "name": SERVER_NAME,
            "version": env!("CARGO_PKG_VERSION")
        },
        "protocolVersions": SUPPORTED_PROTOCOL_VERSIONS,
        "capabilities": {
            "tools": { "listChanged": false },
            "resources": {},
            "prompts": {}
        },
        "tools": tool_schemas()
    })
}

/// `GET /help`
pub fn help_document() -> Value {
    let tools: Vec<Value> = tool_schemas()
        .as_array()
        .map(|tools| {
            tools
                .iter()
                .map(|tool| {
                    json!({
                        "name": tool["name"],
                        "description": tool["description"],
                        "required": tool["inputSchema"]["required"].clone(),
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    json!({
        "name": SERVER_NAME,
        "description": "MCP server exposing a personal reference library to AI agents",
        "routes": [
            { "method": "GET", "path": "/ping", "description": "Liveness check, answers 'pong'" },
            { "method": "GET", "path": "/mcp", "description": "MCP endpoint metadata" },
            { "method": "POST", "path": "/mcp", "description": "MCP JSON-RPC 2.0 endpoint" },
            { "method": "GET", "path": "/mcp/status", "description": "Server and dispatcher status" },
            { "method": "GET", "path": "/capabilities", "description": "Capabilities and full tool schemas" },
            { "method": "GET", "path": "/help", "description": "This document" }
        ],
        "tools": tools
    })
}
