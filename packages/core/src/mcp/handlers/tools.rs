//! MCP Tools Handler
//!
//! Implements tools/list and tools/call. The catalog below is data: names,
//! descriptions and input schemas shown to clients. Execution is delegated to
//! the [`ToolRouter`].

use crate::mcp::router::ToolRouter;
use crate::mcp::types::MCPError;
use serde_json::{json, Value};
use tracing::{debug, warn};

/// Handle tools/list MCP request
///
/// Response format:
/// ```json
/// { "tools": [ { "name": "...", "description": "...", "inputSchema": { ... } } ] }
/// ```
pub fn handle_tools_list() -> Value {
    json!({
        "tools": tool_schemas()
    })
}

/// Handle tools/call MCP request
///
/// Request format:
/// ```json
/// { "name": "tool_name", "arguments": { ... } }
/// ```
///
/// Success wraps the tool's result as pretty JSON text:
/// ```json
/// { "content": [ { "type": "text", "text": "..." } ] }
/// ```
///
/// # Errors
///
/// A missing `name` is `-32602`. Unknown tools, bad arguments and library
/// failures are all `-32603` carrying the underlying message.
pub async fn handle_tools_call(router: &ToolRouter, params: Value) -> Result<Value, MCPError> {
    let tool_name = params["name"]
        .as_str()
        .ok_or_else(|| MCPError::invalid_params("Missing 'name' parameter"))?;

    let arguments = params.get("arguments").cloned().unwrap_or_else(|| json!({}));

    match router.call(tool_name, arguments).await {
        Ok(data) => {
            debug!("✅ Tool '{}' succeeded", tool_name);
            let text = serde_json::to_string_pretty(&data)
                .map_err(|e| MCPError::internal_error(format!("JSON serialization failed: {}", e)))?;

            Ok(json!({
                "content": [{
                    "type": "text",
                    "text": text
                }]
            }))
        }
        Err(e) => {
            warn!("❌ Tool '{}' failed: {}", tool_name, e);
            Err(MCPError::internal_error(e.to_string()))
        }
    }
}

/// Input schemas for every tool the router serves
///
/// Kept by hand so descriptions can be written for the agent reading them.
pub fn tool_schemas() -> Value {
    json!([
        {
            "name": "search_library",
            "description": "Keyword search over the reference library. Matches title, creators and abstract (case-insensitive), with optional tag, item type and collection filters. Results are paginated item summaries.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "q": { "type": "string", "description": "Text to match against title, creators and abstract" },
                    "tag": { "type": "string", "description": "Only items carrying this tag" },
                    "itemType": { "type": "string", "description": "Only items of this type, e.g. journalArticle, book" },
                    "collectionKey": { "type": "string", "description": "Only items filed in this collection" },
                    "limit": { "type": "integer", "minimum": 1, "maximum": 200, "default": 25 },
                    "offset": { "type": "integer", "minimum": 0, "default": 0 },
                    "sort": { "type": "string", "enum": ["dateAdded", "dateModified", "title", "date"], "default": "dateAdded" },
                    "direction": { "type": "string", "enum": ["asc", "desc"], "default": "desc" }
                }
            }
        },
        {
            "name": "get_item_details",
            "description": "Full metadata for one item: creators, date, DOI, URL, tags, collections and notes.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "itemKey": { "type": "string", "description": "Item key as returned by a search" }
                },
                "required": ["itemKey"]
            }
        },
        {
            "name": "get_item_abstract",
            "description": "The abstract of one item, without the rest of its metadata.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "itemKey": { "type": "string" }
                },
                "required": ["itemKey"]
            }
        },
        {
            "name": "get_item_fulltext",
            "description": "Extracted full text of an item's attachment. Large documents can be cut short with maxChars.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "itemKey": { "type": "string" },
                    "maxChars": { "type": "integer", "minimum": 1, "description": "Truncate the text to this many characters" }
                },
                "required": ["itemKey"]
            }
        },
        {
            "name": "semantic_search",
            "description": "Find items by meaning rather than exact words. Returns items ranked by similarity score (0.0-1.0). Examples: 'attention mechanisms in sequence models', 'relational database theory'",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "query": { "type": "string", "description": "Natural language description of what to find" },
                    "limit": { "type": "integer", "minimum": 1, "default": 10 },
                    "minScore": { "type": "number", "minimum": 0.0, "maximum": 1.0, "default": 0.0 }
                },
                "required": ["query"]
            }
        },
        {
            "name": "get_collections",
            "description": "All collections in the library, ordered by name.",
            "inputSchema": {
                "type": "object",
                "properties": {}
            }
        },
        {
            "name": "get_collection_items",
            "description": "Summaries of the items filed directly in one collection.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "collectionKey": { "type": "string" }
                },
                "required": ["collectionKey"]
            }
        },
        {
            "name": "create_note",
            "description": "Attach a new note to an item. Returns the key of the created note.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "parentKey": { "type": "string", "description": "Item the note belongs to" },
                    "content": { "type": "string", "description": "Note text" }
                },
                "required": ["parentKey", "content"]
            }
        },
        {
            "name": "add_tags",
            "description": "Add tags to an item. Tags already present are left alone.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "itemKey": { "type": "string" },
                    "tags": { "type": "array", "items": { "type": "string" }, "minItems": 1 }
                },
                "required": ["itemKey", "tags"]
            }
        },
        {
            "name": "remove_tags",
            "description": "Remove tags from an item.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "itemKey": { "type": "string" },
                    "tags": { "type": "array", "items": { "type": "string" }, "minItems": 1 }
                },
                "required": ["itemKey", "tags"]
            }
        }
    ])
}

#[cfg(test)]
#[path = "tools_test.rs"]
mod tools_test;
