//! Bounded in-process LRU cache with per-entry TTL (L1).
//!
//! Design: LRU ordering plus a lazy expiry check on read keeps every
//! operation O(1) expected; [`LocalCache::cleanup_expired`] sweeps from the
//! least-recently-used end, where expired entries concentrate, so the
//! periodic sweep stays cheap without a separate expiry index.
//!
//! The LRU structure and the hit/miss counters live behind one lock, so a
//! lookup and its counter update are atomic and every instance keeps
//! independent statistics.

use std::num::NonZeroUsize;
use std::time::{Duration, Instant};

use lru::LruCache;
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::debug;

const DEFAULT_MAX_SIZE: usize = 1000;
const DEFAULT_TTL: Duration = Duration::from_secs(300);

/// Snapshot of cache counters.
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    /// Percentage in `[0, 100]`.
    pub hit_rate: f64,
    pub size: usize,
    pub max_size: usize,
}

struct CacheEntry<V> {
    value: V,
    expires_at: Instant,
}

impl<V> CacheEntry<V> {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

struct LocalCacheInner<V> {
    entries: LruCache<String, CacheEntry<V>>,
    hits: u64,
    misses: u64,
}

/// Thread-safe bounded LRU cache with TTL.
///
/// Values are returned by clone, never by reference into the cache, so a
/// caller can not mutate a cached value in place.
pub struct LocalCache<V> {
    inner: RwLock<LocalCacheInner<V>>,
    max_size: usize,
    default_ttl: Duration,
}

impl<V: Clone> LocalCache<V> {
    /// Creates a cache holding at most `max_size` entries with the given
    /// default TTL. Zero values fall back to 1000 entries / 5 minutes.
    pub fn new(max_size: usize, default_ttl: Duration) -> Self {
        let max_size = if max_size == 0 {
            DEFAULT_MAX_SIZE
        } else {
            max_size
        };
        let default_ttl = if default_ttl.is_zero() {
            DEFAULT_TTL
        } else {
            default_ttl
        };
        // max_size was just forced non-zero above
        let capacity = NonZeroUsize::new(max_size).expect("non-zero cache capacity");

        Self {
            inner: RwLock::new(LocalCacheInner {
                entries: LruCache::new(capacity),
                hits: 0,
                misses: 0,
            }),
            max_size,
            default_ttl,
        }
    }

    /// Looks up a key. A hit promotes the entry to most-recently-used; an
    /// expired entry is removed and counted as a miss.
    pub async fn get(&self, key: &str) -> Option<V> {
        let now = Instant::now();
        let mut guard = self.inner.write().await;
        let inner = &mut *guard;

        let expired = match inner.entries.get(key) {
            None => {
                inner.misses += 1;
                return None;
            }
            Some(entry) => entry.is_expired(now),
        };

        if expired {
            inner.entries.pop(key);
            inner.misses += 1;
            return None;
        }

        inner.hits += 1;
        // get() above already moved the entry to the front
        inner.entries.peek(key).map(|entry| entry.value.clone())
    }

    /// Upserts a key with the default TTL.
    pub async fn set(&self, key: impl Into<String>, value: V) {
        self.set_with_ttl(key, value, self.default_ttl).await;
    }

    /// Upserts a key with an explicit TTL. An existing key is overwritten
    /// and promoted; a new key at capacity evicts the LRU tail first.
    pub async fn set_with_ttl(&self, key: impl Into<String>, value: V, ttl: Duration) {
        let entry = CacheEntry {
            value,
            expires_at: Instant::now() + ttl,
        };
        let mut inner = self.inner.write().await;
        // LruCache::put replaces in place on an existing key and evicts the
        // tail when a new key would exceed capacity.
        inner.entries.put(key.into(), entry);
    }

    /// Removes a key if present.
    pub async fn delete(&self, key: &str) {
        let mut inner = self.inner.write().await;
        inner.entries.pop(key);
    }

    /// Removes every key with the given string prefix and returns the count.
    ///
    /// Snapshot-then-delete: keys inserted concurrently after the snapshot
    /// are not covered, which is fine for invalidation fan-out.
    pub async fn delete_prefix(&self, prefix: &str) -> usize {
        let mut inner = self.inner.write().await;
        let matching: Vec<String> = inner
            .entries
            .iter()
            .filter(|(key, _)| key.starts_with(prefix))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &matching {
            inner.entries.pop(key);
        }
        matching.len()
    }

    /// Empties the cache and resets the counters.
    pub async fn clear(&self) {
        let mut inner = self.inner.write().await;
        inner.entries.clear();
        inner.hits = 0;
        inner.misses = 0;
    }

    /// Removes expired entries, scanning from the least-recently-used end
    /// where stale entries concentrate. Returns the number removed.
    /// Intended for periodic invocation, see [`crate::cache::cleanup`].
    pub async fn cleanup_expired(&self) -> usize {
        let now = Instant::now();
        let mut inner = self.inner.write().await;

        let expired: Vec<String> = inner
            .entries
            .iter()
            .rev()
            .filter(|(_, entry)| entry.is_expired(now))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired {
            inner.entries.pop(key);
        }
        if !expired.is_empty() {
            debug!(removed = expired.len(), "removed expired cache entries");
        }
        expired.len()
    }

    /// Snapshot of hits/misses/size.
    pub async fn stats(&self) -> CacheStats {
        let inner = self.inner.read().await;
        let total = inner.hits + inner.misses;
        let hit_rate = if total > 0 {
            inner.hits as f64 / total as f64 * 100.0
        } else {
            0.0
        };

        CacheStats {
            hits: inner.hits,
            misses: inner.misses,
            hit_rate,
            size: inner.entries.len(),
            max_size: self.max_size,
        }
    }

    /// Current number of live entries (expired-but-unswept entries count
    /// until a read or sweep removes them).
    pub async fn len(&self) -> usize {
        self.inner.read().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }
}
