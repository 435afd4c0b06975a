//! Tests for MCP Tools Handler
//!
//! Tests tools/list and tools/call methods for MCP spec compliance.

use super::*;
use crate::library::InMemoryLibrary;
use crate::mcp::router::ToolName;
use crate::mcp::types::{INTERNAL_ERROR, INVALID_PARAMS};
use crate::models::Item;
use serde_json::json;
use std::sync::Arc;

async fn router() -> ToolRouter {
    let library = InMemoryLibrary::new();
    library
        .insert_item(
            Item::new("KEY00001", "Gödel, Escher, Bach")
                .with_abstract("An eternal golden braid")
                .with_tags(["mind"]),
        )
        .await;
    ToolRouter::new(Arc::new(library))
}

#[test]
fn test_tools_list_matches_router_table() {
    let response = handle_tools_list();
    let tools = response["tools"].as_array().unwrap();

    let names: Vec<&str> = tools.iter().map(|t| t["name"].as_str().unwrap()).collect();
    let expected: Vec<&str> = ToolName::ALL.iter().map(ToolName::as_str).collect();
    assert_eq!(names, expected);
}

#[test]
fn test_tools_list_tool_schema_structure() {
    let response = handle_tools_list();
    for tool in response["tools"].as_array().unwrap() {
        assert!(tool["name"].is_string(), "Tool missing name");
        assert!(tool["description"].is_string(), "Tool missing description");
        assert_eq!(
            tool["inputSchema"]["type"], "object",
            "inputSchema type must be object"
        );
    }
}

#[tokio::test]
async fn test_tools_call_wraps_result_in_text_envelope() {
    let router = router().await;
    let result = handle_tools_call(
        &router,
        json!({"name": "get_item_abstract", "arguments": {"itemKey": "KEY00001"}}),
    )
    .await
    .unwrap();

    assert_eq!(result["content"][0]["type"], "text");
    let text = result["content"][0]["text"].as_str().unwrap();
    let data: Value = serde_json::from_str(text).unwrap();

    let direct = router
        .call("get_item_abstract", json!({"itemKey": "KEY00001"}))
        .await
        .unwrap();
    assert_eq!(data, direct);
    assert_eq!(data["title"], "Gödel, Escher, Bach");
}

#[tokio::test]
async fn test_tools_call_missing_name() {
    let err = handle_tools_call(&router().await, json!({"arguments": {}}))
        .await
        .unwrap_err();
    assert_eq!(err.code, INVALID_PARAMS);
}

#[tokio::test]
async fn test_tools_call_unknown_tool_is_internal_error() {
    let err = handle_tools_call(&router().await, json!({"name": "unknown_tool"}))
        .await
        .unwrap_err();
    assert_eq!(err.code, INTERNAL_ERROR);
    assert_eq!(err.message, "Unknown tool: unknown_tool");
}

#[tokio::test]
async fn test_tools_call_missing_argument_keeps_internal_error_code() {
    let err = handle_tools_call(&router().await, json!({"name": "get_item_details"}))
        .await
        .unwrap_err();
    assert_eq!(err.code, INTERNAL_ERROR);
    assert_eq!(err.message, "Missing required argument: itemKey");
}

#[tokio::test]
async fn test_tools_call_library_error_message() {
    let err = handle_tools_call(
        &router().await,
        json!({"name": "get_item_fulltext", "arguments": {"itemKey": "KEY00001"}}),
    )
    .await
    .unwrap_err();
    assert_eq!(err.code, INTERNAL_ERROR);
    assert_eq!(err.message, "No fulltext available for item: KEY00001");
}
