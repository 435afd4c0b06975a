//! HTTP Response Model and Writer
//!
//! Handlers build an [`HttpResponse`]; only [`ResponseWriter`] adds the
//! transport headers (`Content-Length`, `Connection`, `Keep-Alive`,
//! `Mcp-Session-Id`). Any handler-supplied copy of those is dropped on write.

use crate::http::{FramingError, Headers, SESSION_HEADER};
use serde_json::Value;
use tokio::io::{AsyncWrite, AsyncWriteExt};

const RESERVED_HEADERS: &[&str] = &["content-length", "connection", "keep-alive", "mcp-session-id"];

/// A response as produced by a route handler
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub status_text: &'static str,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            status_text: status_text(status),
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    pub fn text(status: u16, body: impl Into<String>) -> Self {
        Self::new(status)
            .with_header("Content-Type", "text/plain; charset=utf-8")
            .with_body(body.into().into_bytes())
    }

    pub fn json(status: u16, value: &Value) -> Self {
        Self::new(status)
            .with_header("Content-Type", "application/json")
            .with_body(value.to_string().into_bytes())
    }

    /// 202 with an empty body, used for notification-only exchanges
    pub fn accepted() -> Self {
        Self::new(202)
    }

    pub fn not_found(path: &str) -> Self {
        Self::text(404, format!("Not Found: {}", path))
    }

    pub fn method_not_allowed(allowed: &str) -> Self {
        Self::text(405, "Method Not Allowed").with_header("Allow", allowed)
    }

    pub fn payload_too_large(size: usize, limit: usize) -> Self {
        Self::text(
            413,
            format!("Payload Too Large: {} bytes exceeds limit of {} bytes", size, limit),
        )
    }

    pub fn too_many_requests(retry_after_secs: u64) -> Self {
        Self::text(429, "Too Many Requests").with_header("Retry-After", retry_after_secs.to_string())
    }

    /// Terse text response for a framing failure the peer can still be told about
    pub fn from_framing_error(err: &FramingError) -> Option<Self> {
        let status = err.status()?;
        let message = match err {
            FramingError::BodyTooLarge { .. } => "Payload Too Large".to_string(),
            FramingError::HeaderTooLarge { .. } => "Request Header Fields Too Large".to_string(),
            FramingError::Timeout { .. } => "Bad Request: incomplete request".to_string(),
            other => format!("Bad Request: {}", other),
        };
        Some(Self::text(status, message))
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_body(mut self, body: Vec<u8>) -> Self {
        self.body = body;
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Whether the connection stays open after a response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeepAlive {
    Close,
    Open { timeout_secs: u64, max: u32 },
}

impl KeepAlive {
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Open { .. })
    }
}

/// MCP paths are always kept alive; other paths only on an explicit
/// `Connection: keep-alive` from the client.
pub fn should_keep_alive(headers: &Headers, path: &str) -> bool {
    if path == "/mcp" || path.starts_with("/mcp/") {
        return true;
    }
    headers.has_token("connection", "keep-alive")
}

/// Serializes responses onto a connection
#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseWriter;

impl ResponseWriter {
    /// Status line plus headers, terminated by the blank line
    pub fn encode_head(
        response: &HttpResponse,
        keep_alive: KeepAlive,
        session_id: Option<&str>,
    ) -> String {
        let mut head = format!("HTTP/1.1 {} {}\r\n", response.status, response.status_text);

        for (name, value) in &response.headers {
            if RESERVED_HEADERS
                .iter()
                .any(|reserved| name.eq_ignore_ascii_case(reserved))
            {
                continue;
            }
            head.push_str(&format!("{}: {}\r\n", name, value));
        }

        // Body is already UTF-8 bytes, so its length is the byte count
        head.push_str(&format!("Content-Length: {}\r\n", response.body.len()));

        match keep_alive {
            KeepAlive::Open { timeout_secs, max } => {
                head.push_str("Connection: keep-alive\r\n");
                head.push_str(&format!("Keep-Alive: timeout={}, max={}\r\n", timeout_secs, max));
            }
            KeepAlive::Close => head.push_str("Connection: close\r\n"),
        }

        if let Some(id) = session_id {
            head.push_str(&format!("{}: {}\r\n", SESSION_HEADER, id));
        }

        head.push_str("\r\n");
        head
    }

    /// Write `response` and flush
    pub async fn write<W>(
        stream: &mut W,
        response: &HttpResponse,
        keep_alive: KeepAlive,
        session_id: Option<&str>,
    ) -> std::io::Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        let head = Self::encode_head(response, keep_alive, session_id);
        stream.write_all(head.as_bytes()).await?;
        if !response.body.is_empty() {
            stream.write_all(&response.body).await?;
        }
        stream.flush().await
    }
}

pub fn status_text(status: u16) -> &'static str {
    match status {
        200 => "OK",
        202 => "Accepted",
        204 => "No Content",
        400 => "Bad Request",
        404 => "Not Found",
        405 => "Method Not Allowed",
        413 => "Payload Too Large",
        429 => "Too Many Requests",
        431 => "Request Header Fields Too Large",
        500 => "Internal Server Error",
        503 => "Service Unavailable",
        _ => "Unknown",
    }
}

#[cfg(test)]
#[path = "response_test.rs"]
mod response_test;
