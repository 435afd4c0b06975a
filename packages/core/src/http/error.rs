//! HTTP Framing Error Types
//!
//! Transport-level failures raised while assembling a request off the socket.
//! None of these ever reach the JSON-RPC layer.

use std::io;
use thiserror::Error;

/// Errors raised by the request framer
#[derive(Error, Debug)]
pub enum FramingError {
    /// Request line without method, target, or `HTTP/` version token
    #[error("Malformed request line: {0}")]
    MalformedRequestLine(String),

    /// Content-Length header that is not a non-negative integer
    #[error("Invalid Content-Length: {0}")]
    InvalidContentLength(String),

    /// Header region grew past the configured cap without a terminator
    #[error("Request headers exceed {limit} bytes")]
    HeaderTooLarge { limit: usize },

    /// Declared body size exceeds the configured cap
    #[error("Request body of {length} bytes exceeds limit of {limit} bytes")]
    BodyTooLarge { length: usize, limit: usize },

    /// Read retry budget exhausted with a partial request buffered
    #[error("Timed out waiting for request data ({received} bytes received)")]
    Timeout { received: usize },

    /// Peer closed the connection mid-request
    #[error("Connection closed after {received} bytes of an incomplete request")]
    ConnectionClosed { received: usize },

    /// Socket failure
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl FramingError {
    /// HTTP status to answer with, or `None` when the peer cannot be answered
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::MalformedRequestLine(_) | Self::InvalidContentLength(_) | Self::Timeout { .. } => {
                Some(400)
            }
            Self::HeaderTooLarge { .. } => Some(431),
            Self::BodyTooLarge { .. } => Some(413),
            Self::ConnectionClosed { .. } | Self::Io(_) => None,
        }
    }
}
