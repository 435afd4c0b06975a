//! Incremental HTTP Request Framer
//!
//! Reads a connection in bounded chunks until one complete request (header
//! block plus `Content-Length` bytes of body) is buffered.
//!
//! # Bounds
//!
//! - Memory: the header region is capped at `max_header_bytes` and the body at
//!   `max_body_bytes`; an oversized declared body is rejected before any of it
//!   is read.
//! - Time: every read waits at most `poll_interval`. A read that produces no
//!   bytes in that window counts against a retry budget (`max_header_retries`
//!   while reading headers, `max_body_retries` while reading the body). On top
//!   of that, the headers must arrive within [`FramingLimits::header_wait`] and
//!   the whole request within `header_wait + body_wait`, however the bytes are
//!   spread out.
//!
//! A connection that closes or idles out before sending a single byte (health
//! checks, keep-alive sockets the client abandoned) yields [`Framed::Closed`]
//! rather than an error.

use crate::http::{FramingError, RawRequest};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::time::{timeout_at, Instant};
use tracing::{debug, trace};

const HEADER_TERMINATOR: &[u8] = b"\r\n\r\n";

/// Size and time bounds applied while framing a request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FramingLimits {
    /// Bytes requested per socket read
    pub chunk_size: usize,

    /// Maximum size of the header region
    pub max_header_bytes: usize,

    /// Maximum accepted `Content-Length`
    pub max_body_bytes: usize,

    /// How long one read may wait for data before it counts as empty
    pub poll_interval_ms: u64,

    /// Empty reads tolerated while waiting for the header terminator
    pub max_header_retries: u32,

    /// Empty reads tolerated while waiting for body bytes
    pub max_body_retries: u32,
}

impl Default for FramingLimits {
    fn default() -> Self {
        Self {
            chunk_size: 8 * 1024,
            max_header_bytes: 16 * 1024,
            max_body_bytes: 256 * 1024,
            poll_interval_ms: 50,
            max_header_retries: 100,
            max_body_retries: 200,
        }
    }
}

impl FramingLimits {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Longest time an idle connection is held while waiting for headers
    pub fn header_wait(&self) -> Duration {
        self.poll_interval() * self.max_header_retries
    }

    /// Extra time allowed for the body once the headers are in
    pub fn body_wait(&self) -> Duration {
        self.poll_interval() * self.max_body_retries
    }
}

/// Outcome of a successful framing pass
#[derive(Debug)]
pub enum Framed {
    /// A complete request
    Request(RawRequest),
    /// The peer sent nothing before closing or idling out
    Closed,
}

enum ReadStep {
    Data(usize),
    Empty,
    Eof,
    /// The framing deadline passed
    Expired,
}

/// Reads one request at a time off a byte stream
#[derive(Debug, Clone, Default)]
pub struct RequestFramer {
    limits: FramingLimits,
}

impl RequestFramer {
    pub fn new(limits: FramingLimits) -> Self {
        Self { limits }
    }

    /// Frame the next request on `stream`
    ///
    /// Bytes past the declared body are discarded; requests on one
    /// connection are never pipelined.
    ///
    /// # Errors
    ///
    /// Returns a [`FramingError`] when the request is malformed, exceeds a
    /// size bound, stalls past its retry budget or deadline, or the socket
    /// fails.
    pub async fn read_request<S>(&self, stream: &mut S) -> Result<Framed, FramingError>
    where
        S: AsyncRead + Unpin,
    {
        let mut buffer: Vec<u8> = Vec::with_capacity(self.limits.chunk_size);
        let mut chunk = vec![0u8; self.limits.chunk_size.max(1)];
        let mut empty_reads = 0u32;
        let mut deadline = Instant::now() + self.limits.header_wait();

        let header_end = loop {
            if let Some(pos) = find_terminator(&buffer) {
                break pos;
            }
            if buffer.len() > self.limits.max_header_bytes {
                return Err(FramingError::HeaderTooLarge {
                    limit: self.limits.max_header_bytes,
                });
            }

            let out_of_time = match self.read_chunk(stream, &mut chunk, deadline).await? {
                ReadStep::Data(n) => {
                    buffer.extend_from_slice(&chunk[..n]);
                    false
                }
                ReadStep::Empty => {
                    empty_reads += 1;
                    empty_reads > self.limits.max_header_retries
                }
                ReadStep::Expired => true,
                ReadStep::Eof if buffer.is_empty() => return Ok(Framed::Closed),
                ReadStep::Eof => {
                    return Err(FramingError::ConnectionClosed {
                        received: buffer.len(),
                    })
                }
            };

            if out_of_time {
                if buffer.is_empty() {
                    debug!("Idle connection produced no request, closing");
                    return Ok(Framed::Closed);
                }
                return Err(FramingError::Timeout {
                    received: buffer.len(),
                });
            }
        };

        if header_end > self.limits.max_header_bytes {
            return Err(FramingError::HeaderTooLarge {
                limit: self.limits.max_header_bytes,
            });
        }

        let head = decode_head(&buffer[..header_end]);
        let mut request = RawRequest::from_head(&head)?;

        let content_length = request.headers.content_length()?;
        if content_length > self.limits.max_body_bytes {
            return Err(FramingError::BodyTooLarge {
                length: content_length,
                limit: self.limits.max_body_bytes,
            });
        }

        let mut body = buffer.split_off(header_end + HEADER_TERMINATOR.len());
        empty_reads = 0;
        deadline += self.limits.body_wait();
        while body.len() < content_length {
            match self.read_chunk(stream, &mut chunk, deadline).await? {
                ReadStep::Data(n) => body.extend_from_slice(&chunk[..n]),
                ReadStep::Empty => {
                    empty_reads += 1;
                    if empty_reads > self.limits.max_body_retries {
                        return Err(FramingError::Timeout {
                            received: header_end + body.len(),
                        });
                    }
                }
                ReadStep::Expired => {
                    return Err(FramingError::Timeout {
                        received: header_end + body.len(),
                    });
                }
                ReadStep::Eof => {
                    return Err(FramingError::ConnectionClosed {
                        received: header_end + body.len(),
                    })
                }
            }
        }

        if body.len() > content_length {
            trace!(
                "Discarding {} bytes past the declared body",
                body.len() - content_length
            );
            body.truncate(content_length);
        }
        request.body = body;

        trace!(
            method = %request.method,
            path = %request.path,
            body_len = request.body.len(),
            "Framed request"
        );
        Ok(Framed::Request(request))
    }

    /// One read, waiting at most `poll_interval` and never past `deadline`
    async fn read_chunk<S>(
        &self,
        stream: &mut S,
        chunk: &mut [u8],
        deadline: Instant,
    ) -> Result<ReadStep, FramingError>
    where
        S: AsyncRead + Unpin,
    {
        let now = Instant::now();
        if now >= deadline {
            return Ok(ReadStep::Expired);
        }

        let wait_until = (now + self.limits.poll_interval()).min(deadline);
        match timeout_at(wait_until, stream.read(chunk)).await {
            Err(_elapsed) if wait_until >= deadline => Ok(ReadStep::Expired),
            Err(_elapsed) => Ok(ReadStep::Empty),
            Ok(Ok(0)) => Ok(ReadStep::Eof),
            Ok(Ok(n)) => Ok(ReadStep::Data(n)),
            Ok(Err(e)) => Err(e.into()),
        }
    }
}

fn find_terminator(buffer: &[u8]) -> Option<usize> {
    buffer
        .windows(HEADER_TERMINATOR.len())
        .position(|window| window == HEADER_TERMINATOR)
}

/// Header bytes as text; non-UTF-8 input falls back to a byte-per-char decode
fn decode_head(bytes: &[u8]) -> Cow<'_, str> {
    match std::str::from_utf8(bytes) {
        Ok(text) => Cow::Borrowed(text),
        Err(_) => Cow::Owned(bytes.iter().map(|&b| char::from(b)).collect()),
    }
}

#[cfg(test)]
#[path = "framer_test.rs"]
mod framer_test;
