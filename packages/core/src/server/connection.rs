//! Connection Handler
//!
//! Owns one accepted stream for its whole life:
//!
//! ```text
//! loop {
//!     frame request -> rate limit -> route (session + dispatch for /mcp) -> write
//! }
//! shutdown stream
//! ```
//!
//! Requests on one connection are strictly sequential. The loop ends when the
//! response says `Connection: close`, the per-connection request cap is
//! reached, the peer goes quiet or away, or framing fails.

use crate::http::{
    should_keep_alive, Framed, HttpResponse, KeepAlive, RawRequest, ResponseWriter,
};
use crate::mcp::{DispatchOutcome, ExchangeContext, MCPResponse};
use crate::server::routes::{self, Route};
use crate::server::state::ServerState;
use serde::Serialize;
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, warn};

/// Response plus the session it belongs to
struct Exchange {
    response: HttpResponse,
    session_id: Option<String>,
}

pub struct ConnectionHandler {
    state: Arc<ServerState>,
    peer: SocketAddr,
}

impl ConnectionHandler {
    pub fn new(state: Arc<ServerState>, peer: SocketAddr) -> Self {
        Self { state, peer }
    }

    /// Serve requests until the connection should close, then shut it down
    pub async fn run<S>(self, mut stream: S)
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let max_requests = self.state.config.keep_alive_max_requests;
        let mut served: u32 = 0;

        loop {
            let request = match self.state.framer.read_request(&mut stream).await {
                Ok(Framed::Request(request)) => request,
                Ok(Framed::Closed) => {
                    debug!(peer = %self.peer, "Connection closed without a request");
                    break;
                }
                Err(e) => {
                    match HttpResponse::from_framing_error(&e) {
                        Some(response) => {
                            warn!(peer = %self.peer, "❌ Rejecting malformed request: {}", e);
                            if let Err(write_err) =
                                ResponseWriter::write(&mut stream, &response, KeepAlive::Close, None).await
                            {
                                debug!(peer = %self.peer, "Failed to write error response: {}", write_err);
                            }
                        }
                        None => debug!(peer = %self.peer, "Connection dropped: {}", e),
                    }
                    break;
                }
            };
            served = served.saturating_add(1);

            debug!(
                peer = %self.peer,
                "📥 {} {} ({} body bytes)",
                request.method,
                request.path,
                request.body.len()
            );

            if !self.admit().await {
                let response = HttpResponse::too_many_requests(self.state.limiter.retry_after_secs());
                warn!(peer = %self.peer, "Rate limit exceeded");
                if let Err(e) = ResponseWriter::write(&mut stream, &response, KeepAlive::Close, None).await {
                    debug!(peer = %self.peer, "Failed to write 429: {}", e);
                }
                break;
            }

            let wants_keep_alive = should_keep_alive(&request.headers, &request.path);
            let exchange = self.handle(request).await;

            let remaining = max_requests.saturating_sub(served);
            let keep_alive = if wants_keep_alive && remaining > 0 {
                KeepAlive::Open {
                    timeout_secs: self.state.config.keep_alive_timeout_secs(),
                    max: remaining,
                }
            } else {
                KeepAlive::Close
            };

            debug!(
                peer = %self.peer,
                "📤 {} {}",
                exchange.response.status,
                exchange.response.status_text
            );

            if let Err(e) = ResponseWriter::write(
                &mut stream,
                &exchange.response,
                keep_alive,
                exchange.session_id.as_deref(),
            )
            .await
            {
                debug!(peer = %self.peer, "Failed to write response: {}", e);
                break;
            }

            if !keep_alive.is_open() {
                break;
            }
        }

        if let Err(e) = stream.shutdown().await {
            debug!(peer = %self.peer, "Stream shutdown failed: {}", e);
        }
    }

    /// Rate limiting applies only to non-loopback peers of a remote-enabled server
    async fn admit(&self) -> bool {
        if !self.state.config.allow_remote || self.peer.ip().is_loopback() {
            return true;
        }
        self.state.limiter.allow(self.peer.ip()).await
    }

    async fn handle(&self, request: RawRequest) -> Exchange {
        let route = Route::resolve(&request.method, &request.path);

        if route.is_rpc() {
            return self.handle_rpc(request).await;
        }

        let response = match route {
            Route::Ping => HttpResponse::text(200, "pong"),
            Route::McpInfo => HttpResponse::json(200, &routes::mcp_info_document()),
            Route::McpStatus => json_response(200, &self.state.status().await),
            Route::Capabilities => HttpResponse::json(200, &routes::capabilities_document()),
            Route::Help => HttpResponse::json(200, &routes::help_document()),
            Route::MethodNotAllowed(allowed) => HttpResponse::method_not_allowed(allowed),
            Route::NotFound | Route::McpRpc => HttpResponse::not_found(&request.path),
        };

        Exchange {
            response,
            session_id: None,
        }
    }

    async fn handle_rpc(&self, request: RawRequest) -> Exchange {
        let session = self.state.sessions.resolve(request.session_id()).await;
        if session.is_new {
            info!(peer = %self.peer, "🔌 New MCP session {}", session.id);
        }

        let ctx = ExchangeContext {
            session_id: Some(session.id.clone()),
        };
        let outcome = self.state.dispatcher.handle_body(&request.body, &ctx).await;

        Exchange {
            response: outcome_response(outcome),
            session_id: Some(session.id),
        }
    }
}

/// HTTP shape of a dispatch outcome
pub fn outcome_response(outcome: DispatchOutcome) -> HttpResponse {
    match outcome {
        DispatchOutcome::Single(response) => json_response(200, &response),
        DispatchOutcome::Batch(responses) => json_response::<Vec<MCPResponse>>(200, &responses),
        DispatchOutcome::Accepted => HttpResponse::accepted(),
        DispatchOutcome::ParseError(response) => json_response(400, &response),
        DispatchOutcome::PayloadTooLarge { size, limit } => {
            HttpResponse::payload_too_large(size, limit)
        }
    }
}

fn json_response<T: Serialize>(status: u16, body: &T) -> HttpResponse {
    match serde_json::to_value(body) {
        Ok(value) => HttpResponse::json(status, &value),
        Err(e) => {
            warn!("❌ Failed to serialize response: {}", e);
            HttpResponse::json(
                500,
                &json!({
                    "jsonrpc": "2.0",
                    "id": null,
                    "error": { "code": crate::mcp::types::INTERNAL_ERROR, "message": "Internal error" }
                }),
            )
        }
    }
}

#[cfg(test)]
#[path = "connection_test.rs"]
mod connection_test;
