//! Standalone Shelfmark MCP Server
//!
//! Serves a reference library snapshot to AI agents over the MCP HTTP
//! endpoint until interrupted.
//!
//! Architecture:
//!   AI Agent → HTTP (port 23120) → McpServerService → ReferenceLibrary (JSON snapshot)
//!
//! # Usage
//!
//! ```bash
//! SHELFMARK_LIBRARY=~/library.json cargo run --bin shelfmark
//! ```
//!
//! # Configuration
//!
//! - `SHELFMARK_CONFIG` - preferences file (default `~/.shelfmark/preferences.json`)
//! - `SHELFMARK_LIBRARY` - library snapshot to serve
//! - `SHELFMARK_PORT` - TCP port (default 23120)
//! - `SHELFMARK_ALLOW_REMOTE` - bind all interfaces and rate limit remote peers
//! - `RUST_LOG` - log filter (default `shelfmark=info,shelfmark_core=info`)

mod preferences;

use shelfmark_core::{InMemoryLibrary, McpServerService, ReferenceLibrary};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("shelfmark=info,shelfmark_core=info")),
        )
        .init();

    let prefs = preferences::load().await?;

    let library: Arc<dyn ReferenceLibrary> = match &prefs.library_path {
        Some(path) => {
            let library = InMemoryLibrary::load(path).await.map_err(|e| {
                tracing::error!("❌ Failed to load library {}: {}", path.display(), e);
                e
            })?;
            tracing::info!(
                "📚 Loaded {} items from {}",
                library.item_count().await,
                path.display()
            );
            Arc::new(library)
        }
        None => {
            tracing::warn!("No library configured; serving an empty library (set SHELFMARK_LIBRARY)");
            Arc::new(InMemoryLibrary::new())
        }
    };

    let service = McpServerService::new(prefs.server, library);
    let addr = service.start().await?;
    tracing::info!("✅ AI agents can now connect to: http://{}/mcp", addr);

    tokio::signal::ctrl_c().await?;
    tracing::info!("Interrupt received, stopping");
    service.shutdown().await;

    Ok(())
}
