//! Shared Server State
//!
//! Everything one running server owns, handed to each connection task as an
//! `Arc`. Sessions and rate buckets are mutated only by connection handlers
//! and the sweep tick.

use crate::http::RequestFramer;
use crate::library::ReferenceLibrary;
use crate::mcp::{DispatcherStatus, McpDispatcher, ResponseCallback, ToolRouter};
use crate::server::acceptor::ConnectionRegistry;
use crate::server::rate_limit::RateLimiter;
use crate::server::session::SessionStore;
use crate::server::ServerConfig;
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

pub struct ServerState {
    pub config: ServerConfig,
    pub framer: RequestFramer,
    pub sessions: SessionStore,
    pub limiter: RateLimiter,
    pub dispatcher: McpDispatcher,
    pub registry: Arc<ConnectionRegistry>,
}

/// Body of `GET /mcp/status`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerStatus {
    #[serde(flatten)]
    pub dispatcher: DispatcherStatus,
    pub active_sessions: usize,
    pub rate_limited_clients: usize,
    pub open_connections: usize,
    pub allow_remote: bool,
}

impl ServerState {
    pub fn new(
        config: ServerConfig,
        library: Arc<dyn ReferenceLibrary>,
        callback: Option<ResponseCallback>,
    ) -> Self {
        let dispatcher = McpDispatcher::new(ToolRouter::new(library), config.framing.max_body_bytes)
            .with_callback(callback);

        Self {
            framer: RequestFramer::new(config.framing.clone()),
            sessions: SessionStore::new(config.session_timeout()),
            limiter: RateLimiter::new(config.rate_limit.clone()),
            registry: Arc::new(ConnectionRegistry::new()),
            dispatcher,
            config,
        }
    }

    pub async fn status(&self) -> ServerStatus {
        ServerStatus {
            dispatcher: self.dispatcher.status(),
            active_sessions: self.sessions.len().await,
            rate_limited_clients: self.limiter.tracked_clients().await,
            open_connections: self.registry.len().await,
            allow_remote: self.config.allow_remote,
        }
    }

    /// Periodic housekeeping: expire sessions, prune idle rate buckets
    pub async fn sweep(&self) {
        let sessions = self.sessions.sweep().await;
        let buckets = self.limiter.prune().await;
        if sessions > 0 || buckets > 0 {
            debug!(
                "Swept {} expired sessions and {} idle rate buckets",
                sessions, buckets
            );
        }
    }

    /// Drop all session and rate-limiter state
    pub async fn reset(&self) {
        self.sessions.clear().await;
        self.limiter.clear().await;
    }
}
