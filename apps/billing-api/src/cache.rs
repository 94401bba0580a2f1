//! # Read Cache
//!
//! Short-lived cache for read-heavy endpoints (open orders, analytics).
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  GET /api/bills/open  ──► get("openOrders")                            │
//! │                             hit  → cached JSON                         │
//! │                             miss → query, set(key, value, 10s)         │
//! │                                                                         │
//! │  any order mutation   ──► clear("openOrders"), clear("dailyStats")     │
//! │                                                                         │
//! │  sweeper task         ──► purge_expired() every few minutes            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Entries expire lazily on read; the sweeper only reclaims memory held by
//! keys nobody reads again.

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Key/value cache with per-entry TTL and prefix invalidation.
pub trait ReadCache: Send + Sync {
    /// Returns the value if present and not expired.
    fn get(&self, key: &str) -> Option<Value>;

    fn set(&self, key: &str, value: Value, ttl: Duration);

    /// Removes every key starting with `prefix`. Returns how many were removed.
    fn clear(&self, prefix: &str) -> usize;

    /// Drops expired entries. Returns how many were removed.
    fn purge_expired(&self) -> usize;
}

#[derive(Debug, Clone)]
struct Entry {
    value: Value,
    expires_at: Instant,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// Process-local [`ReadCache`] over a `DashMap`.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: DashMap<String, Entry>,
}

impl MemoryCache {
    pub fn new() -> Self {
        MemoryCache::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ReadCache for MemoryCache {
    fn get(&self, key: &str) -> Option<Value> {
        let now = Instant::now();

        if let Some(entry) = self.entries.get(key) {
            if !entry.is_expired(now) {
                return Some(entry.value.clone());
            }
        }

        // Expired: drop it unless a writer replaced it meanwhile
        self.entries.remove_if(key, |_, entry| entry.is_expired(now));
        None
    }

    fn set(&self, key: &str, value: Value, ttl: Duration) {
        self.entries.insert(
            key.to_string(),
            Entry {
                value,
                expires_at: Instant::now() + ttl,
            },
        );
    }

    fn clear(&self, prefix: &str) -> usize {
        let before = self.entries.len();
        self.entries.retain(|key, _| !key.starts_with(prefix));
        let removed = before.saturating_sub(self.entries.len());
        if removed > 0 {
            debug!(prefix, removed, "Cleared cache entries");
        }
        removed
    }

    fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired(now));
        before.saturating_sub(self.entries.len())
    }
}

/// Typed read. An entry that no longer decodes is treated as a miss.
pub fn get_json<T: DeserializeOwned>(cache: &dyn ReadCache, key: &str) -> Option<T> {
    let value = cache.get(key)?;
    match serde_json::from_value(value) {
        Ok(decoded) => Some(decoded),
        Err(e) => {
            warn!(key, error = %e, "Discarding undecodable cache entry");
            cache.clear(key);
            None
        }
    }
}

/// Typed write. Values that fail to serialize are simply not cached.
pub fn set_json<T: Serialize>(cache: &dyn ReadCache, key: &str, value: &T, ttl: Duration) {
    match serde_json::to_value(value) {
        Ok(json) => cache.set(key, json, ttl),
        Err(e) => warn!(key, error = %e, "Skipping cache write"),
    }
}

/// Spawns the background task that purges expired entries every `interval`.
pub fn spawn_sweeper(cache: Arc<dyn ReadCache>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // First tick completes immediately
        ticker.tick().await;

        loop {
            ticker.tick().await;
            let purged = cache.purge_expired();
            if purged > 0 {
                debug!(purged, "Swept expired cache entries");
            }
        }
    })
}
