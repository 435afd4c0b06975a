//! Tests for MCP types module
//!
//! Verifies JSON-RPC 2.0 request/response parsing and error handling.

use super::*;
use serde_json::json;

#[test]
fn test_parse_valid_request() {
    let json_str = r#"{
        "jsonrpc": "2.0",
        "id": 123,
        "method": "tools/call",
        "params": {"name": "search_library", "arguments": {"q": "rust"}}
    }"#;

    let request: MCPRequest = serde_json::from_str(json_str).unwrap();

    assert_eq!(request.jsonrpc, "2.0");
    assert_eq!(request.id, Some(json!(123)));
    assert_eq!(request.method, "tools/call");
    assert!(!request.is_notification());
    assert_eq!(request.params_or_empty()["name"], "search_library");
}

#[test]
fn test_string_ids_are_preserved() {
    let request: MCPRequest =
        serde_json::from_str(r#"{"jsonrpc":"2.0","id":"abc-1","method":"ping"}"#).unwrap();
    assert_eq!(request.response_id(), json!("abc-1"));
}

#[test]
fn test_missing_or_null_id_is_notification() {
    let missing: MCPRequest =
        serde_json::from_str(r#"{"jsonrpc":"2.0","method":"initialized"}"#).unwrap();
    assert!(missing.is_notification());
    assert_eq!(missing.response_id(), Value::Null);

    let null: MCPRequest =
        serde_json::from_str(r#"{"jsonrpc":"2.0","id":null,"method":"initialized"}"#).unwrap();
    assert!(null.is_notification());
}

#[test]
fn test_parse_request_missing_jsonrpc() {
    let result: Result<MCPRequest, _> = serde_json::from_str(r#"{"id": 1, "method": "ping"}"#);
    assert!(result.is_err());
}

#[test]
fn test_parse_request_wrong_jsonrpc_version() {
    let result: Result<MCPRequest, _> =
        serde_json::from_str(r#"{"jsonrpc": "1.0", "id": 1, "method": "ping"}"#);
    assert!(result.is_err());
}

#[test]
fn test_parse_request_missing_method() {
    let result: Result<MCPRequest, _> = serde_json::from_str(r#"{"jsonrpc": "2.0", "id": 1}"#);
    assert!(result.is_err());
}

#[test]
fn test_absent_params_become_empty_object() {
    let request: MCPRequest =
        serde_json::from_str(r#"{"jsonrpc":"2.0","id":1,"method":"tools/list"}"#).unwrap();
    assert_eq!(request.params_or_empty(), json!({}));
}

#[test]
fn test_serialize_success_response() {
    let response = MCPResponse::success(json!(42), json!({"ok": true}));
    let json = serde_json::to_value(&response).unwrap();

    assert_eq!(json["jsonrpc"], "2.0");
    assert_eq!(json["id"], 42);
    assert_eq!(json["result"]["ok"], true);
    assert!(json.get("error").is_none());
}

#[test]
fn test_serialize_error_response() {
    let response = MCPResponse::error(json!(99), MCPError::method_not_found("foo"));
    let json = serde_json::to_value(&response).unwrap();

    assert_eq!(json["id"], 99);
    assert_eq!(json["error"]["code"], METHOD_NOT_FOUND);
    assert_eq!(json["error"]["message"], "Method not found: foo");
    assert!(json["error"].get("data").is_none());
    assert!(json.get("result").is_none());
}

#[test]
fn test_error_codes_constants() {
    assert_eq!(PARSE_ERROR, -32700);
    assert_eq!(INVALID_REQUEST, -32600);
    assert_eq!(METHOD_NOT_FOUND, -32601);
    assert_eq!(INVALID_PARAMS, -32602);
    assert_eq!(INTERNAL_ERROR, -32603);
}

#[test]
fn test_mcp_error_helper_methods() {
    let parse_err = MCPError::parse_error("Invalid JSON");
    assert_eq!(parse_err.code, PARSE_ERROR);

    let internal = MCPError::internal_error("Item not found: X").with_data(json!({"key": "X"}));
    assert_eq!(internal.code, INTERNAL_ERROR);
    assert_eq!(internal.data, Some(json!({"key": "X"})));
    assert_eq!(internal.to_string(), "Item not found: X (code: -32603)");
}
