//! In-memory store of provider responses with per-entry expiry.
//!
//! Entries are keyed by [`CacheKey`] and hold the normalised postings of
//! one successful provider call. Uses [`moka`] for concurrent access:
//! operations on distinct keys never block each other, and an entry is
//! replaced atomically so readers see either the old or the new entry in
//! full.
//!
//! Expiry is evaluated lazily on read. An expired entry is reported as
//! absent by [`JobCache::get`] but stays retrievable through
//! [`JobCache::get_stale`] until it is replaced, invalidated or evicted by
//! capacity pressure.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use moka::future::Cache;
use tokio::time::Instant;

use crate::types::{CacheKey, NormalizedPosting};

/// One cached provider response. Immutable once inserted.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// Key the entry is stored under.
    pub key: CacheKey,
    /// Postings in provider order.
    pub postings: Vec<NormalizedPosting>,
    /// Monotonic insertion time, used for expiry.
    pub created_at: Instant,
    /// Wall-clock insertion time, for display.
    pub fetched_at: DateTime<Utc>,
    /// Time-to-live fixed at insertion.
    pub ttl: Duration,
}

impl CacheEntry {
    /// Whether the entry is still valid at `now`.
    pub fn is_valid_at(&self, now: Instant) -> bool {
        now < self.created_at + self.ttl
    }

    /// Whether the entry is still valid.
    pub fn is_valid(&self) -> bool {
        self.is_valid_at(Instant::now())
    }

    /// Time since insertion.
    pub fn age(&self) -> Duration {
        Instant::now().saturating_duration_since(self.created_at)
    }
}

/// Concurrent response cache with a fixed TTL.
#[derive(Clone)]
pub struct JobCache {
    inner: Cache<CacheKey, Arc<CacheEntry>>,
    ttl: Duration,
}

impl JobCache {
    /// Create a cache holding at most `max_entries` responses, each valid for `ttl`.
    pub fn new(ttl: Duration, max_entries: u64) -> Self {
        Self {
            inner: Cache::builder().max_capacity(max_entries).build(),
            ttl,
        }
    }

    /// Look up a still-valid entry.
    ///
    /// Returns `None` on a miss or when the stored entry has expired.
    pub async fn get(&self, key: &CacheKey) -> Option<Arc<CacheEntry>> {
        let entry = self.inner.get(key).await?;
        if entry.is_valid() {
            Some(entry)
        } else {
            tracing::debug!(%key, age_secs = entry.age().as_secs(), "cache entry expired");
            None
        }
    }

    /// Look up an entry regardless of expiry.
    pub async fn get_stale(&self, key: &CacheKey) -> Option<Arc<CacheEntry>> {
        self.inner.get(key).await
    }

    /// Insert or replace the entry for `key`, stamped with the current time.
    pub async fn put(&self, key: CacheKey, postings: Vec<NormalizedPosting>) -> Arc<CacheEntry> {
        let entry = Arc::new(CacheEntry {
            key,
            postings,
            created_at: Instant::now(),
            fetched_at: Utc::now(),
            ttl: self.ttl,
        });
        self.inner.insert(key, Arc::clone(&entry)).await;
        tracing::debug!(%key, count = entry.postings.len(), "cache entry stored");
        entry
    }

    /// Remove the entry for `key`, if any.
    pub async fn invalidate(&self, key: &CacheKey) {
        self.inner.invalidate(key).await;
        tracing::debug!(%key, "cache entry invalidated");
    }

    /// Configured time-to-live.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

impl std::fmt::Debug for JobCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobCache")
            .field("ttl", &self.ttl)
            .field("entries", &self.inner.entry_count())
            .finish()
    }
}
