//! MCP Initialize Handler
//!
//! Handles the MCP initialization handshake and capability discovery.
//! This is the first method called when a client connects to the server.

use serde_json::{json, Value};

/// Name reported in `serverInfo` and the status documents
pub const SERVER_NAME: &str = "shelfmark-mcp-server";

/// Supported MCP protocol versions, newest first
pub const SUPPORTED_PROTOCOL_VERSIONS: &[&str] = &[
    "2025-06-18", // Latest
    "2025-03-26", // Streamable HTTP
    "2024-11-05", // Oldest still accepted
];

/// Pick the version to speak with a client
///
/// The client's version is echoed when supported; a missing or unknown
/// version falls back to the oldest supported one.
pub fn negotiate_protocol_version(requested: Option<&str>) -> &'static str {
    let oldest = SUPPORTED_PROTOCOL_VERSIONS
        .last()
        .copied()
        .unwrap_or("2024-11-05");

    match requested {
        Some(requested) => SUPPORTED_PROTOCOL_VERSIONS
            .iter()
            .copied()
            .find(|supported| *supported == requested)
            .unwrap_or(oldest),
        None => oldest,
    }
}

/// Handle MCP initialize request
///
/// # Protocol Flow
///
/// 1. Client sends initialize with its protocol version
/// 2. Server answers with the negotiated version and capabilities
/// 3. Client sends the initialized notification
/// 4. Normal operations begin
///
/// The session id travels in the `Mcp-Session-Id` response header, not in
/// this body.
pub fn handle_initialize(params: &Value) -> Value {
    let requested = params["protocolVersion"].as_str();
    let negotiated = negotiate_protocol_version(requested);

    if requested.is_some_and(|v| v != negotiated) {
        tracing::info!(
            "Client requested unsupported protocol version {:?}, negotiating {}",
            requested,
            negotiated
        );
    }

    json!({
        "protocolVersion": negotiated,
        "serverInfo": {
            "name": SERVER_NAME,
            "version": env!("CARGO_PKG_VERSION")
        },
        "capabilities": {
            "tools": {
                "listChanged": false
            },
            "resources": {},
            "prompts": {}
        },
        "instructions": "Shelfmark exposes a personal reference library. Use search_library or semantic_search to find items, then get_item_details, get_item_abstract or get_item_fulltext with the returned item key. Notes and tags can be written with create_note, add_tags and remove_tags."
    })
}

#[cfg(test)]
#[path = "initialize_test.rs"]
mod initialize_test;
