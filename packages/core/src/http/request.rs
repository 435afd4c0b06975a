//! Parsed HTTP Request
//!
//! `RawRequest` is only ever built by the framer, once the header block is
//! complete and the declared body has been read in full.

use crate::http::FramingError;
use std::borrow::Cow;
use std::collections::HashMap;

/// Session header shared by MCP clients and the response writer
pub const SESSION_HEADER: &str = "Mcp-Session-Id";

/// Header map with case-insensitive lookup
///
/// Names are stored lowercased. Repeated headers are folded into one
/// comma-separated value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Headers {
    entries: HashMap<String, String>,
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: &str, value: &str) {
        let value = value.trim();
        self.entries
            .entry(name.trim().to_ascii_lowercase())
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(value);
            })
            .or_insert_with(|| value.to_string());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(&name.to_ascii_lowercase())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether a comma-separated header carries `token` (case-insensitive)
    pub fn has_token(&self, name: &str, token: &str) -> bool {
        self.get(name).is_some_and(|value| {
            value
                .split(',')
                .any(|part| part.trim().eq_ignore_ascii_case(token))
        })
    }

    /// Parsed `Content-Length`; a missing header means an empty body
    pub fn content_length(&self) -> Result<usize, FramingError> {
        match self.get("content-length") {
            None => Ok(0),
            Some(raw) => raw
                .trim()
                .parse::<usize>()
                .map_err(|_| FramingError::InvalidContentLength(raw.to_string())),
        }
    }
}

/// A fully framed HTTP request
#[derive(Debug, Clone, PartialEq)]
pub struct RawRequest {
    pub method: String,
    pub path: String,
    pub version: String,
    pub query: HashMap<String, Vec<String>>,
    pub headers: Headers,
    pub body: Vec<u8>,
}

impl RawRequest {
    /// Parse the request line and header fields of a header block
    ///
    /// `head` excludes the blank-line terminator. The body is left empty.
    pub fn from_head(head: &str) -> Result<Self, FramingError> {
        let mut lines = head.split("\r\n");
        let request_line = lines.next().unwrap_or_default();

        let mut parts = request_line.split_whitespace();
        let (method, target, version) = match (parts.next(), parts.next(), parts.next()) {
            (Some(method), Some(target), Some(version)) if version.starts_with("HTTP/") => {
                (method, target, version)
            }
            _ => {
                return Err(FramingError::MalformedRequestLine(
                    request_line.chars().take(200).collect(),
                ))
            }
        };

        let mut headers = Headers::new();
        for line in lines.filter(|l| !l.is_empty()) {
            // Lines without a colon are ignored rather than failing the request
            if let Some((name, value)) = line.split_once(':') {
                headers.insert(name, value);
            }
        }

        let (path, query) = match target.split_once('?') {
            Some((path, query_string)) => (path, parse_query(query_string)),
            None => (target, HashMap::new()),
        };

        Ok(Self {
            method: method.to_ascii_uppercase(),
            path: path.to_string(),
            version: version.to_string(),
            query,
            headers,
            body: Vec::new(),
        })
    }

    /// First value of a query parameter
    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .get(key)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    /// Session id presented by the client, if any
    pub fn session_id(&self) -> Option<&str> {
        self.headers
            .get(SESSION_HEADER)
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }

    pub fn body_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }
}

fn parse_query(query_string: &str) -> HashMap<String, Vec<String>> {
    let mut query: HashMap<String, Vec<String>> = HashMap::new();
    for (key, value) in url::form_urlencoded::parse(query_string.as_bytes()) {
        query
            .entry(key.into_owned())
            .or_default()
            .push(value.into_owned());
    }
    query
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_head_parses_request_line_headers_and_query() {
        let head = "POST /mcp?debug=1&tag=a&tag=b%20c HTTP/1.1\r\nHost: localhost\r\nContent-Length: 12\r\nMcp-Session-Id: abc\r\n";
        let request = RawRequest::from_head(head).unwrap();

        assert_eq!(request.method, "POST");
        assert_eq!(request.path, "/mcp");
        assert_eq!(request.version, "HTTP/1.1");
        assert_eq!(request.query_value("debug"), Some("1"));
        assert_eq!(
            request.query["tag"],
            vec!["a".to_string(), "b c".to_string()]
        );
        assert_eq!(request.headers.get("host"), Some("localhost"));
        assert_eq!(request.headers.get("CONTENT-LENGTH"), Some("12"));
        assert_eq!(request.session_id(), Some("abc"));
    }

    #[test]
    fn test_from_head_rejects_missing_http_token() {
        let err = RawRequest::from_head("GET /ping\r\nHost: x\r\n").unwrap_err();
        assert!(matches!(err, FramingError::MalformedRequestLine(_)));
        assert_eq!(err.status(), Some(400));

        let err = RawRequest::from_head("GET /ping FTP/1.0").unwrap_err();
        assert!(matches!(err, FramingError::MalformedRequestLine(_)));
    }

    #[test]
    fn test_headers_fold_repeats_and_match_tokens() {
        let mut headers = Headers::new();
        headers.insert("Connection", "Upgrade");
        headers.insert("connection", "Keep-Alive");

        assert_eq!(headers.get("Connection"), Some("Upgrade, Keep-Alive"));
        assert!(headers.has_token("CONNECTION", "keep-alive"));
        assert!(!headers.has_token("connection", "close"));
        assert_eq!(headers.len(), 1);
    }

    #[test]
    fn test_content_length_parsing() {
        let mut headers = Headers::new();
        assert_eq!(headers.content_length().unwrap(), 0);

        headers.insert("Content-Length", " 42 ");
        assert_eq!(headers.content_length().unwrap(), 42);

        let mut bad = Headers::new();
        bad.insert("Content-Length", "-1");
        assert!(matches!(
            bad.content_length(),
            Err(FramingError::InvalidContentLength(_))
        ));
    }

    #[test]
    fn test_blank_session_header_is_ignored() {
        let request = RawRequest::from_head("POST /mcp HTTP/1.1\r\nMcp-Session-Id:   \r\n").unwrap();
        assert_eq!(request.session_id(), None);
    }
}
