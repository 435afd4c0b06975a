//! MCP JSON-RPC Dispatcher
//!
//! Turns one HTTP body into zero or more JSON-RPC responses.
//!
//! # Exchange
//!
//! ```text
//! Received -> Parsed -> Routed -> { Responded | NotificationAccepted | Rejected }
//! ```
//!
//! - Bodies over the size cap are rejected before the JSON parser runs.
//! - A body that is not JSON yields a `-32700` response with a null id.
//! - An array is a batch: elements run in order, notifications run for their
//!   side effects but contribute no entry. A batch of only notifications (or
//!   a single notification) is answered with 202 and an empty body.
//! - Every failure inside a routed method, panics included, becomes a
//!   JSON-RPC error; nothing escapes to the transport. A panicking host
//!   callback is logged and the response still goes out.

use crate::mcp::handlers::initialize::{handle_initialize, SERVER_NAME, SUPPORTED_PROTOCOL_VERSIONS};
use crate::mcp::handlers::tools::{handle_tools_call, handle_tools_list};
use crate::mcp::router::ToolRouter;
use crate::mcp::types::{MCPError, MCPRequest, MCPResponse};
use chrono::{DateTime, Utc};
use futures::FutureExt;
use serde::Serialize;
use serde_json::{json, Value};
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, instrument, warn};

/// Callback type for handling successful responses
///
/// Receives (method_name, result_value) after each successfully routed
/// method, notifications included. Lets an embedding host react to tool calls.
pub type ResponseCallback = Arc<dyn Fn(&str, &Value) + Send + Sync>;

/// Per-exchange facts supplied by the connection handler
#[derive(Debug, Clone, Default)]
pub struct ExchangeContext {
    pub session_id: Option<String>,
}

/// What the transport should send back for one body
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome {
    /// One response to a single request
    Single(MCPResponse),
    /// Responses to the non-notification members of a batch, in order
    Batch(Vec<MCPResponse>),
    /// Nothing to answer; 202 with an empty body
    Accepted,
    /// Body was not JSON
    ParseError(MCPResponse),
    /// Body exceeded the cap and was never parsed
    PayloadTooLarge { size: usize, limit: usize },
}

/// Protocol methods the dispatcher knows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum McpMethod {
    Initialize,
    Initialized,
    ToolsList,
    ToolsCall,
    ResourcesList,
    PromptsList,
    Ping,
    /// Any other `notifications/*` method
    OtherNotification,
}

impl McpMethod {
    fn parse(method: &str) -> Option<Self> {
        let parsed = match method {
            "initialize" => Self::Initialize,
            "initialized" | "notifications/initialized" => Self::Initialized,
            "tools/list" => Self::ToolsList,
            "tools/call" => Self::ToolsCall,
            "resources/list" => Self::ResourcesList,
            "prompts/list" => Self::PromptsList,
            "ping" => Self::Ping,
            other if other.starts_with("notifications/") => Self::OtherNotification,
            _ => return None,
        };
        Some(parsed)
    }
}

/// Snapshot of dispatcher state for `/mcp/status`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatcherStatus {
    pub name: &'static str,
    pub version: &'static str,
    pub started_at: String,
    pub uptime_secs: u64,
    pub initialized: bool,
    pub protocol_versions: Vec<&'static str>,
    pub requests_handled: u64,
    pub errors: u64,
    pub tools: usize,
}

/// JSON-RPC dispatcher shared by every connection
pub struct McpDispatcher {
    router: ToolRouter,
    max_body_bytes: usize,
    callback: Option<ResponseCallback>,
    initialized: AtomicBool,
    started_at: DateTime<Utc>,
    started: Instant,
    requests: AtomicU64,
    errors: AtomicU64,
}

impl McpDispatcher {
    pub fn new(router: ToolRouter, max_body_bytes: usize) -> Self {
        Self {
            router,
            max_body_bytes,
            callback: None,
            initialized: AtomicBool::new(false),
            started_at: Utc::now(),
            started: Instant::now(),
            requests: AtomicU64::new(0),
            errors: AtomicU64::new(0),
        }
    }

    pub fn with_callback(mut self, callback: Option<ResponseCallback>) -> Self {
        self.callback = callback;
        self
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    /// Dispatch a raw HTTP body
    pub async fn handle_body(&self, body: &[u8], ctx: &ExchangeContext) -> DispatchOutcome {
        if body.len() > self.max_body_bytes {
            warn!(
                "❌ MCP body of {} bytes exceeds limit of {} bytes",
                body.len(),
                self.max_body_bytes
            );
            self.errors.fetch_add(1, Ordering::Relaxed);
            return DispatchOutcome::PayloadTooLarge {
                size: body.len(),
                limit: self.max_body_bytes,
            };
        }

        let message: Value = match serde_json::from_slice(body) {
            Ok(message) => message,
            Err(e) => {
                warn!("❌ Failed to parse JSON-RPC body: {}", e);
                self.errors.fetch_add(1, Ordering::Relaxed);
                return DispatchOutcome::ParseError(MCPResponse::error(
                    Value::Null,
                    MCPError::parse_error(format!("Parse error: {}", e)),
                ));
            }
        };

        match message {
            Value::Array(elements) if elements.is_empty() => {
                self.errors.fetch_add(1, Ordering::Relaxed);
                DispatchOutcome::Single(MCPResponse::error(
                    Value::Null,
                    MCPError::invalid_request("Invalid Request: empty batch"),
                ))
            }
            Value::Array(elements) => {
                debug!("📥 MCP batch of {} messages", elements.len());
                let mut responses = Vec::with_capacity(elements.len());
                for element in elements {
                    if let Some(response) = self.handle_message(element, ctx).await {
                        responses.push(response);
                    }
                }
                if responses.is_empty() {
                    DispatchOutcome::Accepted
                } else {
                    DispatchOutcome::Batch(responses)
                }
            }
            single => match self.handle_message(single, ctx).await {
                Some(response) => DispatchOutcome::Single(response),
                None => DispatchOutcome::Accepted,
            },
        }
    }

    /// Handle one request object; `None` for notifications
    pub async fn handle_message(&self, message: Value, ctx: &ExchangeContext) -> Option<MCPResponse> {
        self.requests.fetch_add(1, Ordering::Relaxed);

        if !message.is_object() {
            self.errors.fetch_add(1, Ordering::Relaxed);
            return Some(MCPResponse::error(
                Value::Null,
                MCPError::invalid_request("Invalid Request: expected a JSON object"),
            ));
        }

        let id_hint = message.get("id").cloned().unwrap_or(Value::Null);
        let request: MCPRequest = match serde_json::from_value(message) {
            Ok(request) => request,
            Err(e) => {
                warn!("❌ Invalid JSON-RPC request: {}", e);
                self.errors.fetch_add(1, Ordering::Relaxed);
                return Some(MCPResponse::error(
                    id_hint,
                    MCPError::invalid_request(format!("Invalid Request: {}", e)),
                ));
            }
        };

        let is_notification = request.is_notification();
        let method = request.method.clone();
        let id = request.response_id();

        let result = AssertUnwindSafe(self.route(&request, ctx))
            .catch_unwind()
            .await
            .unwrap_or_else(|_| {
                error!("❌ MCP method '{}' panicked", method);
                Err(MCPError::internal_error("Internal error"))
            });

        match result {
            Ok(result) => {
                if let Some(callback) = &self.callback {
                    let invoked =
                        std::panic::catch_unwind(AssertUnwindSafe(|| callback(&method, &result)));
                    if invoked.is_err() {
                        error!("❌ Response callback panicked for method '{}'", method);
                    }
                }
                if is_notification {
                    debug!("📥 MCP notification '{}' accepted", method);
                    return None;
                }
                debug!("📤 MCP response for method '{}' (id={})", method, id);
                Some(MCPResponse::success(id, result))
            }
            Err(err) => {
                self.errors.fetch_add(1, Ordering::Relaxed);
                if is_notification {
                    warn!("❌ MCP notification '{}' failed: {}", method, err);
                    return None;
                }
                error!(
                    "❌ MCP request {} failed: {} (code: {})",
                    id, err.message, err.code
                );
                Some(MCPResponse::error(id, err))
            }
        }
    }

    #[instrument(skip(self, request, ctx), fields(method = %request.method, session = ctx.session_id.as_deref().unwrap_or("-")))]
    async fn route(&self, request: &MCPRequest, ctx: &ExchangeContext) -> Result<Value, MCPError> {
        let params = request.params_or_empty();

        match McpMethod::parse(&request.method) {
            Some(McpMethod::Initialize) => Ok(handle_initialize(&params)),
            Some(McpMethod::Initialized) => {
                self.initialized.store(true, Ordering::SeqCst);
                Ok(json!({}))
            }
            Some(McpMethod::ToolsList) => Ok(handle_tools_list()),
            Some(McpMethod::ToolsCall) => handle_tools_call(&self.router, params).await,
            Some(McpMethod::ResourcesList) => Ok(json!({ "resources": [] })),
            Some(McpMethod::PromptsList) => Ok(json!({ "prompts": [] })),
            Some(McpMethod::Ping) => Ok(json!({})),
            Some(McpMethod::OtherNotification) if request.is_notification() => Ok(json!({})),
            Some(McpMethod::OtherNotification) | None => {
                warn!("⚠️  Unknown MCP method: {}", request.method);
                Err(MCPError::method_not_found(&request.method))
            }
        }
    }

    pub fn status(&self) -> DispatcherStatus {
        DispatcherStatus {
            name: SERVER_NAME,
            version: env!("CARGO_PKG_VERSION"),
            started_at: self.started_at.to_rfc3339(),
            uptime_secs: self.started.elapsed().as_secs(),
            initialized: self.is_initialized(),
            protocol_versions: SUPPORTED_PROTOCOL_VERSIONS.to_vec(),
            requests_handled: self.requests.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
            tools: self.router.tool_count(),
        }
    }
}

#[cfg(test)]
#[path = "dispatcher_test.rs"]
mod dispatcher_test;
