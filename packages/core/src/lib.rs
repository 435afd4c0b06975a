//! Shelfmark Core
//!
//! Embedded MCP (Model Context Protocol) engine that exposes a personal
//! reference library to AI agents over a local socket.
//!
//! # Architecture
//!
//! ```text
//! Acceptor -> ConnectionHandler -> RequestFramer -> [RateLimiter, SessionStore]
//!          -> route table | McpDispatcher -> ToolRouter -> ReferenceLibrary
//!          -> ResponseWriter
//! ```
//!
//! - **Hand-rolled HTTP/1.1**: no framework; bounded framing over any tokio stream
//! - **JSON-RPC 2.0**: single requests, batches and notifications
//! - **Collaborator trait**: library storage sits behind [`ReferenceLibrary`]
//!
//! # Modules
//!
//! - [`http`] - Request framing, response writing, keep-alive decision
//! - [`server`] - Acceptor, connections, sessions, rate limiting, lifecycle
//! - [`mcp`] - JSON-RPC types, dispatcher, handlers, tool router
//! - [`library`] - `ReferenceLibrary` trait and the in-memory implementation
//! - [`models`] - Items, collections, search and mutation shapes

pub mod http;
pub mod library;
pub mod mcp;
pub mod models;
pub mod server;

// Re-export commonly used types
pub use library::{InMemoryLibrary, LibraryError, ReferenceLibrary};
pub use mcp::{McpDispatcher, ResponseCallback, ToolRouter};
pub use models::*;
pub use server::{McpServerService, ServerConfig, ServerError};
