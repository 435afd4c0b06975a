//! TCP Acceptor and Connection Registry
//!
//! The accept loop spawns one [`ConnectionHandler`] task per connection and
//! records its abort handle in the [`ConnectionRegistry`]. The same loop runs
//! the sweep tick for sessions and rate buckets.
//!
//! On shutdown every registered connection is aborted (dropping, and so
//! closing, its socket) before the listener itself is dropped.

use crate::server::connection::ConnectionHandler;
use crate::server::state::ServerState;
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::{mpsc, Mutex};
use tokio::task::AbortHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Pause after a failed `accept` (e.g. file descriptor exhaustion)
const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_millis(100);

/// Open connection tasks, keyed by a per-server sequence number
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    next_id: AtomicU64,
    connections: Mutex<HashMap<u64, AbortHandle>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn `task` and track it until it finishes
    pub async fn spawn<F>(self: &Arc<Self>, task: F) -> u64
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let registry = Arc::clone(self);

        // Held across the spawn so the task cannot deregister before it is registered
        let mut connections = self.connections.lock().await;
        let handle = tokio::spawn(async move {
            task.await;
            registry.connections.lock().await.remove(&id);
        });
        connections.insert(id, handle.abort_handle());
        id
    }

    /// Abort every tracked connection; returns how many were open
    pub async fn close_all(&self) -> usize {
        let mut connections = self.connections.lock().await;
        let count = connections.len();
        for (_, handle) in connections.drain() {
            handle.abort();
        }
        count
    }

    pub async fn len(&self) -> usize {
        self.connections.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.connections.lock().await.is_empty()
    }
}

pub struct Acceptor {
    listener: TcpListener,
    state: Arc<ServerState>,
}

impl Acceptor {
    pub fn new(listener: TcpListener, state: Arc<ServerState>) -> Self {
        Self { listener, state }
    }

    /// Accept until a shutdown signal arrives (or its sender is dropped)
    pub async fn run(self, mut shutdown_rx: mpsc::Receiver<()>) {
        let period = self.state.config.sweep_interval();
        let mut sweep = interval_at(Instant::now() + period, period);
        sweep.set_missed_tick_behavior(MissedTickBehavior::Delay);

        match self.listener.local_addr() {
            Ok(addr) => info!("🔌 MCP HTTP server listening on http://{}/mcp", addr),
            Err(e) => warn!("MCP HTTP server listening on an unknown address: {}", e),
        }

        loop {
            tokio::select! {
                biased; // Check shutdown first

                _ = shutdown_rx.recv() => {
                    info!("🔌 MCP HTTP server shutting down");
                    break;
                }

                _ = sweep.tick() => {
                    self.state.sweep().await;
                }

                accepted = self.listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        if let Err(e) = stream.set_nodelay(true) {
                            debug!(peer = %peer, "Failed to set TCP_NODELAY: {}", e);
                        }
                        let handler = ConnectionHandler::new(Arc::clone(&self.state), peer);
                        let id = self.state.registry.spawn(handler.run(stream)).await;
                        debug!(peer = %peer, connection = id, "Accepted connection");
                    }
                    Err(e) => {
                        warn!("❌ Failed to accept connection: {}", e);
                        tokio::time::sleep(ACCEPT_ERROR_BACKOFF).await;
                    }
                }
            }
        }

        let closed = self.state.registry.close_all().await;
        info!("🔌 Closed {} open connections", closed);
        // Listener is dropped when `self` goes out of scope, after the connections
    }
}
