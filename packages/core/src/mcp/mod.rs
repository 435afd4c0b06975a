//! Model Context Protocol (MCP) Integration
//!
//! JSON-RPC 2.0 protocol layer carried over the HTTP transport in
//! [`crate::http`]. Transport-agnostic: the dispatcher takes a body and
//! returns what to answer.
//!
//! # Usage
//!
//! AI agents POST JSON-RPC requests to `/mcp`:
//!
//! ```json
//! {
//!   "jsonrpc": "2.0",
//!   "id": 1,
//!   "method": "tools/call",
//!   "params": {
//!     "name": "search_library",
//!     "arguments": { "q": "transformers" }
//!   }
//! }
//! ```

pub mod dispatcher;
pub mod handlers;
pub mod router;
pub mod types;

pub use dispatcher::{DispatchOutcome, DispatcherStatus, ExchangeContext, McpDispatcher, ResponseCallback};
pub use router::{ToolError, ToolName, ToolRouter};
pub use types::{MCPError, MCPRequest, MCPResponse};
