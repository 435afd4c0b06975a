//! HTTP/1.1 Transport
//!
//! Minimal request framing and response writing over any tokio byte stream.
//! Only what the MCP endpoint needs: `Content-Length` bodies, keep-alive, no
//! chunked encoding, no pipelining.

mod error;
mod framer;
mod request;
mod response;

pub use error::FramingError;
pub use framer::{Framed, FramingLimits, RequestFramer};
pub use request::{Headers, RawRequest, SESSION_HEADER};
pub use response::{should_keep_alive, status_text, HttpResponse, KeepAlive, ResponseWriter};
