//! Per-client Token Bucket Rate Limiter
//!
//! One bucket per peer IP, created lazily on first sight. Tokens refill
//! continuously at `refill_per_second` up to `max_tokens`; each allowed
//! request spends one. Buckets idle longer than `stale_after_secs` are pruned
//! on the sweep timer.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::net::IpAddr;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Bucket capacity (burst size)
    pub max_tokens: u32,

    /// Tokens added per second
    pub refill_per_second: f64,

    /// Idle time after which a bucket is dropped
    pub stale_after_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_tokens: 60,
            refill_per_second: 10.0,
            stale_after_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct RateBucket {
    tokens: f64,
    last_refill: Instant,
}

#[derive(Debug)]
pub struct RateLimiter {
    config: RateLimitConfig,
    buckets: Mutex<HashMap<IpAddr, RateBucket>>,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            buckets: Mutex::new(HashMap::new()),
        }
    }

    /// Spend one token for `ip`; `false` when the bucket is empty
    pub async fn allow(&self, ip: IpAddr) -> bool {
        self.allow_at(ip, Instant::now()).await
    }

    pub async fn allow_at(&self, ip: IpAddr, now: Instant) -> bool {
        let max_tokens = f64::from(self.config.max_tokens);
        let mut buckets = self.buckets.lock().await;

        let bucket = buckets.entry(ip).or_insert_with(|| RateBucket {
            tokens: max_tokens,
            last_refill: now,
        });

        let elapsed = now.saturating_duration_since(bucket.last_refill).as_secs_f64();
        bucket.tokens = (bucket.tokens + elapsed * self.config.refill_per_second).min(max_tokens);
        bucket.last_refill = now;

        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    /// Drop buckets idle past the stale threshold; returns how many went
    pub async fn prune(&self) -> usize {
        self.prune_at(Instant::now()).await
    }

    pub async fn prune_at(&self, now: Instant) -> usize {
        let stale_after = Duration::from_secs(self.config.stale_after_secs);
        let mut buckets = self.buckets.lock().await;
        let before = buckets.len();
        buckets.retain(|_, bucket| now.saturating_duration_since(bucket.last_refill) <= stale_after);
        before - buckets.len()
    }

    /// Seconds until a drained bucket holds one token again
    pub fn retry_after_secs(&self) -> u64 {
        let secs = (1.0 / self.config.refill_per_second).ceil();
        if secs.is_finite() && secs >= 1.0 {
            secs as u64
        } else {
            1
        }
    }

    pub async fn tracked_clients(&self) -> usize {
        self.buckets.lock().await.len()
    }

    pub async fn clear(&self) {
        self.buckets.lock().await.clear();
    }
}
