//! MCP HTTP Server
//!
//! Acceptor, per-connection handling, sessions, rate limiting and the
//! lifecycle wrapper. Protocol logic lives in [`crate::mcp`], byte-level HTTP
//! in [`crate::http`].

pub mod acceptor;
pub mod config;
pub mod connection;
mod error;
pub mod rate_limit;
pub mod routes;
pub mod service;
pub mod session;
pub mod state;

pub use acceptor::{Acceptor, ConnectionRegistry};
pub use config::{ServerConfig, DEFAULT_PORT};
pub use connection::ConnectionHandler;
pub use error::ServerError;
pub use rate_limit::{RateLimitConfig, RateLimiter};
pub use routes::Route;
pub use service::McpServerService;
pub use session::{ResolvedSession, Session, SessionStore};
pub use state::{ServerState, ServerStatus};
