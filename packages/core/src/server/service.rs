//! MCP Server Service
//!
//! Managed lifecycle wrapper around the acceptor: bind, run in the
//! background, report status, stop.
//!
//! # Example
//!
//! ```ignore
//! let library = Arc::new(InMemoryLibrary::load(&path).await?);
//! let service = McpServerService::new(ServerConfig::default(), library);
//! let addr = service.start().await?;
//! // ...
//! service.shutdown().await;
//! ```
//!
//! # Example (with callback)
//!
//! ```ignore
//! let service = McpServerService::new(config, library)
//!     .with_callback(Arc::new(|method, result| {
//!         println!("{} -> {}", method, result);
//!     }));
//! ```

use crate::library::ReferenceLibrary;
use crate::mcp::ResponseCallback;
use crate::server::acceptor::Acceptor;
use crate::server::state::{ServerState, ServerStatus};
use crate::server::{ServerConfig, ServerError};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{info, warn};

struct RunningServer {
    local_addr: SocketAddr,
    state: Arc<ServerState>,
    shutdown_tx: mpsc::Sender<()>,
    task: JoinHandle<()>,
}

/// MCP Server Service
///
/// Share behind an `Arc`. Sessions, rate buckets and open connections live
/// only between `start` and `shutdown`.
pub struct McpServerService {
    config: ServerConfig,
    library: Arc<dyn ReferenceLibrary>,
    callback: Option<ResponseCallback>,
    running: Mutex<Option<RunningServer>>,
}

impl McpServerService {
    pub fn new(config: ServerConfig, library: Arc<dyn ReferenceLibrary>) -> Self {
        Self {
            config,
            library,
            callback: None,
            running: Mutex::new(None),
        }
    }

    /// Invoke `callback` with (method, result) after each successful method
    pub fn with_callback(mut self, callback: ResponseCallback) -> Self {
        self.callback = Some(callback);
        self
    }

    /// Bind and start accepting in the background
    ///
    /// Returns the bound address (useful with port 0).
    pub async fn start(&self) -> Result<SocketAddr, ServerError> {
        let mut running = self.running.lock().await;
        if let Some(server) = running.as_ref() {
            return Err(ServerError::AlreadyRunning(server.local_addr));
        }

        self.config.validate()?;

        let addr = self.config.bind_address();
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::bind(addr, e))?;
        let local_addr = listener.local_addr()?;

        if self.config.allow_remote {
            warn!(
                "MCP server accepts remote connections on {}; non-loopback clients are rate limited",
                local_addr
            );
        }

        let state = Arc::new(ServerState::new(
            self.config.clone(),
            Arc::clone(&self.library),
            self.callback.clone(),
        ));
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>(1);
        let task = tokio::spawn(Acceptor::new(listener, Arc::clone(&state)).run(shutdown_rx));

        info!("🔌 MCP server started on {}", local_addr);
        *running = Some(RunningServer {
            local_addr,
            state,
            shutdown_tx,
            task,
        });
        Ok(local_addr)
    }

    /// Stop accepting, close open connections, clear session and rate state
    ///
    /// A no-op when the server is not running.
    pub async fn shutdown(&self) {
        let Some(server) = self.running.lock().await.take() else {
            return;
        };

        // A closed channel means the accept loop already exited
        let _ = server.shutdown_tx.send(()).await;
        if let Err(e) = server.task.await {
            warn!("❌ MCP accept task ended abnormally: {}", e);
        }
        server.state.reset().await;

        info!("🔌 MCP server on {} stopped", server.local_addr);
    }

    pub async fn is_running(&self) -> bool {
        self.running.lock().await.is_some()
    }

    pub async fn local_addr(&self) -> Option<SocketAddr> {
        self.running.lock().await.as_ref().map(|s| s.local_addr)
    }

    pub async fn status(&self) -> Option<ServerStatus> {
        let state = self
            .running
            .lock()
            .await
            .as_ref()
            .map(|s| Arc::clone(&s.state))?;
        Some(state.status().await)
    }
}
