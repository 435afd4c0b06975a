//! Tests for the connection handler, driven over in-memory duplex streams

use super::*;
use crate::library::InMemoryLibrary;
use crate::server::ServerConfig;
use serde_json::Value;
use std::net::{IpAddr, Ipv4Addr};
use tokio::io::{duplex, AsyncReadExt, DuplexStream};
use tokio::task::JoinHandle;

const LOOPBACK_PEER: SocketAddr = SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 50000);
const REMOTE_PEER: SocketAddr = SocketAddr::new(IpAddr::V4(Ipv4Addr::new(203, 0, 113, 9)), 50000);

struct TestResponse {
    status: u16,
    head: String,
    body: String,
}

impl TestResponse {
    fn header(&self, name: &str) -> Option<&str> {
        self.head.lines().skip(1).find_map(|line| {
            let (n, v) = line.split_once(':')?;
            n.trim().eq_ignore_ascii_case(name).then(|| v.trim())
        })
    }

    fn json(&self) -> Value {
        serde_json::from_str(&self.body).unwrap()
    }
}

fn start(config: ServerConfig, peer: SocketAddr) -> (DuplexStream, Arc<ServerState>, JoinHandle<()>) {
    let library = InMemoryLibrary::from_json_str(
        r#"{"items": [{"key": "ITEM0001", "title": "Ναυσικά", "abstractNote": "ελληνικά"}]}"#,
    )
    .unwrap();
    let state = Arc::new(ServerState::new(config, Arc::new(library), None));
    let (client, server) = duplex(64 * 1024);
    let task = tokio::spawn(ConnectionHandler::new(Arc::clone(&state), peer).run(server));
    (client, state, task)
}

async fn send(client: &mut DuplexStream, request: &str) {
    client.write_all(request.as_bytes()).await.unwrap();
}

fn post_mcp(body: &str, session: Option<&str>) -> String {
    let session_header = session
        .map(|id| format!("Mcp-Session-Id: {}\r\n", id))
        .unwrap_or_default();
    format!(
        "POST /mcp HTTP/1.1\r\nHost: localhost\r\nContent-Type: application/json\r\n{}Content-Length: {}\r\n\r\n{}",
        session_header,
        body.len(),
        body
    )
}

async fn read_response(client: &mut DuplexStream) -> TestResponse {
    let mut head = Vec::new();
    let mut byte = [0u8; 1];
    while !head.ends_with(b"\r\n\r\n") {
        let n = client.read(&mut byte).await.unwrap();
        assert!(n > 0, "connection closed before a full response head");
        head.push(byte[0]);
    }
    let head = String::from_utf8(head).unwrap();
    let status: u16 = head.split_whitespace().nth(1).unwrap().parse().unwrap();

    let mut response = TestResponse {
        status,
        head,
        body: String::new(),
    };
    let length: usize = response.header("content-length").unwrap().parse().unwrap();
    let mut body = vec![0u8; length];
    client.read_exact(&mut body).await.unwrap();
    response.body = String::from_utf8(body).unwrap();
    response
}

async fn assert_closed(client: &mut DuplexStream) {
    let mut rest = Vec::new();
    client.read_to_end(&mut rest).await.unwrap();
    assert!(rest.is_empty());
}

#[tokio::test]
async fn test_ping_closes_after_one_response() {
    let (mut client, _state, task) = start(ServerConfig::default(), LOOPBACK_PEER);

    send(&mut client, "GET /ping HTTP/1.1\r\nHost: localhost\r\n\r\n").await;
    let response = read_response(&mut client).await;

    assert_eq!(response.status, 200);
    assert_eq!(response.body, "pong");
    assert_eq!(response.header("content-length"), Some("4"));
    assert_eq!(response.header("connection"), Some("close"));
    assert!(response.header("mcp-session-id").is_none());

    assert_closed(&mut client).await;
    task.await.unwrap();
}

#[tokio::test]
async fn test_mcp_keeps_alive_and_reuses_session() {
    let (mut client, state, task) = start(ServerConfig::default(), LOOPBACK_PEER);

    send(&mut client, &post_mcp(r#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#, None)).await;
    let first = read_response(&mut client).await;
    assert_eq!(first.status, 200);
    assert_eq!(first.json(), serde_json::json!({"jsonrpc": "2.0", "id": 1, "result": {}}));
    assert_eq!(first.header("connection"), Some("keep-alive"));
    assert_eq!(first.header("keep-alive"), Some("timeout=5, max=99"));
    let session_id = first.header("mcp-session-id").unwrap().to_string();

    send(
        &mut client,
        &post_mcp(r#"{"jsonrpc":"2.0","id":2,"method":"foo"}"#, Some(&session_id)),
    )
    .await;
    let second = read_response(&mut client).await;
    assert_eq!(second.json()["error"]["code"], -32601);
    assert_eq!(second.header("mcp-session-id"), Some(session_id.as_str()));
    assert_eq!(second.header("keep-alive"), Some("timeout=5, max=98"));
    assert_eq!(state.sessions.len().await, 1);

    drop(client);
    task.await.unwrap();
}

#[tokio::test]
async fn test_multibyte_tool_result_is_framed_by_bytes() {
    let (mut client, _state, task) = start(ServerConfig::default(), LOOPBACK_PEER);

    let call = r#"{"jsonrpc":"2.0","id":3,"method":"tools/call","params":{"name":"get_item_details","arguments":{"itemKey":"ITEM0001"}}}"#;
    send(&mut client, &post_mcp(call, None)).await;
    let response = read_response(&mut client).await;

    let length: usize = response.header("content-length").unwrap().parse().unwrap();
    assert_eq!(length, response.body.len());
    assert!(response.body.chars().count() < length);

    // The next response on the same socket still parses
    send(&mut client, &post_mcp(r#"{"jsonrpc":"2.0","id":4,"method":"ping"}"#, None)).await;
    assert_eq!(read_response(&mut client).await.json()["id"], 4);

    drop(client);
    task.await.unwrap();
}

#[tokio::test]
async fn test_notification_gets_202_with_empty_body() {
    let (mut client, _state, task) = start(ServerConfig::default(), LOOPBACK_PEER);

    send(&mut client, &post_mcp(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#, None)).await;
    let response = read_response(&mut client).await;

    assert_eq!(response.status, 202);
    assert!(response.body.is_empty());
    assert_eq!(response.header("content-length"), Some("0"));

    drop(client);
    task.await.unwrap();
}

#[tokio::test]
async fn test_parse_error_is_http_400_with_envelope() {
    let (mut client, _state, task) = start(ServerConfig::default(), LOOPBACK_PEER);

    send(&mut client, &post_mcp("{not json", None)).await;
    let response = read_response(&mut client).await;

    assert_eq!(response.status, 400);
    let body = response.json();
    assert_eq!(body["error"]["code"], -32700);
    assert!(body["id"].is_null());

    drop(client);
    task.await.unwrap();
}

#[tokio::test]
async fn test_oversized_body_is_rejected_with_413() {
    let mut config = ServerConfig::default();
    config.framing.max_body_bytes = 64;
    let (mut client, _state, task) = start(config, LOOPBACK_PEER);

    send(
        &mut client,
        "POST /mcp HTTP/1.1\r\nHost: localhost\r\nContent-Length: 1000\r\n\r\n",
    )
    .await;
    let response = read_response(&mut client).await;

    assert_eq!(response.status, 413);
    assert_eq!(response.header("connection"), Some("close"));
    assert_closed(&mut client).await;
    task.await.unwrap();
}

#[tokio::test]
async fn test_malformed_request_line_is_400() {
    let (mut client, _state, task) = start(ServerConfig::default(), LOOPBACK_PEER);

    send(&mut client, "GARBAGE\r\n\r\n").await;
    let response = read_response(&mut client).await;

    assert_eq!(response.status, 400);
    assert!(response.body.starts_with("Bad Request"));
    assert_closed(&mut client).await;
    task.await.unwrap();
}

#[tokio::test]
async fn test_silent_connection_closes_without_response() {
    let (client, _state, task) = start(ServerConfig::default(), LOOPBACK_PEER);
    drop(client);
    task.await.unwrap();
}

#[tokio::test]
async fn test_unknown_path_is_404() {
    let (mut client, _state, task) = start(ServerConfig::default(), LOOPBACK_PEER);

    send(&mut client, "GET /admin HTTP/1.1\r\n\r\n").await;
    let response = read_response(&mut client).await;
    assert_eq!(response.status, 404);

    assert_closed(&mut client).await;
    task.await.unwrap();
}

#[tokio::test]
async fn test_status_route_reports_sessions() {
    let (mut client, _state, task) = start(ServerConfig::default(), LOOPBACK_PEER);

    send(&mut client, &post_mcp(r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{}}"#, None)).await;
    read_response(&mut client).await;

    send(&mut client, "GET /mcp/status HTTP/1.1\r\n\r\n").await;
    let status = read_response(&mut client).await.json();

    assert_eq!(status["name"], "shelfmark-mcp-server");
    assert_eq!(status["activeSessions"], 1);
    assert_eq!(status["requestsHandled"], 1);
    assert_eq!(status["allowRemote"], false);

    drop(client);
    task.await.unwrap();
}

#[tokio::test]
async fn test_remote_peer_is_rate_limited() {
    let mut config = ServerConfig::default();
    config.allow_remote = true;
    config.rate_limit.max_tokens = 1;
    config.rate_limit.refill_per_second = 0.5;
    let (mut client, state, task) = start(config, REMOTE_PEER);

    send(&mut client, "GET /ping HTTP/1.1\r\nConnection: keep-alive\r\n\r\n").await;
    assert_eq!(read_response(&mut client).await.status, 200);

    send(&mut client, "GET /ping HTTP/1.1\r\nConnection: keep-alive\r\n\r\n").await;
    let limited = read_response(&mut client).await;
    assert_eq!(limited.status, 429);
    assert_eq!(limited.header("retry-after"), Some("2"));

    assert_closed(&mut client).await;
    task.await.unwrap();
    assert_eq!(state.limiter.tracked_clients().await, 1);
}

#[tokio::test]
async fn test_loopback_peer_is_never_rate_limited() {
    let mut config = ServerConfig::default();
    config.allow_remote = true;
    config.rate_limit.max_tokens = 1;
    let (mut client, state, task) = start(config, LOOPBACK_PEER);

    for _ in 0..3 {
        send(&mut client, "GET /ping HTTP/1.1\r\nConnection: keep-alive\r\n\r\n").await;
        assert_eq!(read_response(&mut client).await.status, 200);
    }

    drop(client);
    task.await.unwrap();
    assert_eq!(state.limiter.tracked_clients().await, 0);
}

#[tokio::test]
async fn test_request_cap_closes_connection() {
    let config = ServerConfig {
        keep_alive_max_requests: 2,
        ..Default::default()
    };
    let (mut client, _state, task) = start(config, LOOPBACK_PEER);

    send(&mut client, &post_mcp(r#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#, None)).await;
    assert_eq!(
        read_response(&mut client).await.header("keep-alive"),
        Some("timeout=5, max=1")
    );

    send(&mut client, &post_mcp(r#"{"jsonrpc":"2.0","id":2,"method":"ping"}"#, None)).await;
    let last = read_response(&mut client).await;
    assert_eq!(last.header("connection"), Some("close"));

    assert_closed(&mut client).await;
    task.await.unwrap();
}
