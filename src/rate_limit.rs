use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;

use crate::config::RateLimitConfig;

/// Bucket shared by every caller that arrives without a forwarding header.
pub const UNKNOWN_CLIENT: &str = "unknown";

/// Fixed-window state for one client identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitEntry {
    pub count: u32,
    /// Epoch milliseconds at which the window expires.
    pub reset_at: i64,
}

impl RateLimitEntry {
    pub fn is_expired(&self, now_ms: i64) -> bool {
        now_ms > self.reset_at
    }
}

/// Backing storage for rate-limit windows.
///
/// Implementations must make `hit` atomic per key: two concurrent hits on the
/// same key may never both observe `count < max` for the last free slot.
#[async_trait]
pub trait RateLimitStore: Send + Sync {
    /// Record a request for `key`. Returns Ok(()) or Err with retry-after seconds.
    async fn hit(&self, key: &str, max: u32, window_ms: i64, now_ms: i64) -> Result<(), u64>;

    /// Remove every entry whose window has expired. Returns the number removed.
    async fn purge_expired(&self, now_ms: i64) -> usize;

    /// Number of client identifiers currently tracked.
    async fn tracked(&self) -> usize;
}

/// Single-process store. History is lost on restart and is not shared
/// between replicas.
#[derive(Default)]
pub struct MemoryRateLimitStore {
    entries: DashMap<String, RateLimitEntry>,
}

impl MemoryRateLimitStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<RateLimitEntry> {
        self.entries.get(key).map(|e| *e.value())
    }
}

#[async_trait]
impl RateLimitStore for MemoryRateLimitStore {
    async fn hit(&self, key: &str, max: u32, window_ms: i64, now_ms: i64) -> Result<(), u64> {
        // The entry guard holds the shard lock for the whole check-then-increment.
        let mut entry = self.entries.entry(key.to_string()).or_insert(RateLimitEntry {
            count: 0,
            reset_at: now_ms + window_ms,
        });
        let state = entry.value_mut();

        if state.count == 0 || state.is_expired(now_ms) {
            *state = RateLimitEntry {
                count: 1,
                reset_at: now_ms + window_ms,
            };
            return Ok(());
        }

        if state.count >= max {
            let remaining_ms = (state.reset_at - now_ms).max(0) as u64;
            return Err(remaining_ms.div_ceil(1000));
        }

        state.count += 1;
        Ok(())
    }

    async fn purge_expired(&self, now_ms: i64) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired(now_ms));
        before.saturating_sub(self.entries.len())
    }

    async fn tracked(&self) -> usize {
        self.entries.len()
    }
}

/// Per-client submission limiter: fixed window, at most `max_requests`
/// accepted per window.
pub struct SubmissionRateLimiter {
    store: Arc<dyn RateLimitStore>,
    max_requests: u32,
    window: Duration,
}

impl SubmissionRateLimiter {
    pub fn new(store: Arc<dyn RateLimitStore>, config: &RateLimitConfig) -> Self {
        Self {
            store,
            max_requests: config.max_requests,
            window: config.window,
        }
    }

    pub fn in_memory(config: &RateLimitConfig) -> Self {
        Self::new(Arc::new(MemoryRateLimitStore::new()), config)
    }

    pub fn max_requests(&self) -> u32 {
        self.max_requests
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Check if request is allowed. Returns Ok(()) or Err with retry-after seconds.
    pub async fn check(&self, client_id: &str) -> Result<(), u64> {
        self.check_at(client_id, Utc::now().timestamp_millis()).await
    }

    pub async fn check_at(&self, client_id: &str, now_ms: i64) -> Result<(), u64> {
        self.store
            .hit(client_id, self.max_requests, self.window.as_millis() as i64, now_ms)
            .await
    }

    /// Drop expired windows.
    pub async fn sweep(&self) -> usize {
        self.store.purge_expired(Utc::now().timestamp_millis()).await
    }

    pub async fn tracked(&self) -> usize {
        self.store.tracked().await
    }
}
