//! Server Configuration
//!
//! Every field has a default so a partial preferences file deserializes.

use crate::http::FramingLimits;
use crate::server::rate_limit::RateLimitConfig;
use crate::server::ServerError;
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

/// Default TCP port for the MCP endpoint
pub const DEFAULT_PORT: u16 = 23120;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,

    /// Bind every interface instead of loopback; enables rate limiting for
    /// non-loopback peers
    pub allow_remote: bool,

    pub rate_limit: RateLimitConfig,

    pub session_timeout_secs: u64,

    /// Cadence of the session sweep and rate-bucket pruning
    pub sweep_interval_secs: u64,

    pub framing: FramingLimits,

    /// Requests served on one kept-alive connection before it is closed
    pub keep_alive_max_requests: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            allow_remote: false,
            rate_limit: RateLimitConfig::default(),
            session_timeout_secs: 300,
            sweep_interval_secs: 60,
            framing: FramingLimits::default(),
            keep_alive_max_requests: 100,
        }
    }
}

impl ServerConfig {
    /// Reject settings that would make the server unusable
    pub fn validate(&self) -> Result<(), ServerError> {
        let checks = [
            (self.rate_limit.max_tokens == 0, "rate_limit.max_tokens must be greater than 0"),
            (
                self.rate_limit.refill_per_second.is_nan()
                    || self.rate_limit.refill_per_second <= 0.0,
                "rate_limit.refill_per_second must be greater than 0",
            ),
            (self.session_timeout_secs == 0, "session_timeout_secs must be greater than 0"),
            (self.sweep_interval_secs == 0, "sweep_interval_secs must be greater than 0"),
            (self.framing.chunk_size == 0, "framing.chunk_size must be greater than 0"),
            (self.framing.max_header_bytes == 0, "framing.max_header_bytes must be greater than 0"),
            (self.framing.poll_interval_ms == 0, "framing.poll_interval_ms must be greater than 0"),
            (self.keep_alive_max_requests == 0, "keep_alive_max_requests must be greater than 0"),
        ];

        match checks.iter().find(|(failed, _)| *failed) {
            Some((_, message)) => Err(ServerError::InvalidConfig((*message).to_string())),
            None => Ok(()),
        }
    }

    pub fn bind_address(&self) -> SocketAddr {
        let ip = if self.allow_remote {
            IpAddr::V4(Ipv4Addr::UNSPECIFIED)
        } else {
            IpAddr::V4(Ipv4Addr::LOCALHOST)
        };
        SocketAddr::new(ip, self.port)
    }

    pub fn session_timeout(&self) -> Duration {
        Duration::from_secs(self.session_timeout_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    /// `timeout=` value advertised in `Keep-Alive`: how long an idle kept-alive
    /// connection is held before the framer gives up on it
    pub fn keep_alive_timeout_secs(&self) -> u64 {
        self.framing.header_wait().as_secs().max(1)
    }
}
