//! Tiered cache orchestrator: L1 (memory) → L2 (Redis) → loader (L3).
//!
//! One read path with transparent backfill. Latency expectations: L1 under
//! a millisecond, L2 under ten, the loader 10–50ms against the database.
//! TTLs are staggered (L1 5 min, L2 30 min by default) so L1 refreshes
//! from Redis before the Redis copy expires.
//!
//! A `TieredCache<String>` gives the plain-string read path; any serde
//! value (e.g. `Vec<String>` permission lists) flows through the same way,
//! JSON-encoded at the Redis boundary.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::cache::local::{CacheStats, LocalCache};
use crate::cache::redis::RedisCache;
use crate::config::CacheConfig;
use crate::errors::CacheError;

const DEFAULT_LOCAL_TTL: Duration = Duration::from_secs(300);
const DEFAULT_REDIS_TTL: Duration = Duration::from_secs(1800);

/// Which tier served a read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheTier {
    L1,
    L2,
    L3,
}

impl fmt::Display for CacheTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheTier::L1 => f.write_str("L1"),
            CacheTier::L2 => f.write_str("L2"),
            CacheTier::L3 => f.write_str("L3"),
        }
    }
}

/// Composes the in-process cache and the optional Redis tier into a single
/// read/write path. Without Redis, reads degrade to L1 → loader.
pub struct TieredCache<V> {
    local: Arc<LocalCache<V>>,
    redis: Option<RedisCache>,
    local_ttl: Duration,
    redis_ttl: Duration,
}

impl<V> TieredCache<V>
where
    V: Clone + Serialize + DeserializeOwned,
{
    pub fn new(local: Arc<LocalCache<V>>, redis: Option<RedisCache>) -> Self {
        Self {
            local,
            redis,
            local_ttl: DEFAULT_LOCAL_TTL,
            redis_ttl: DEFAULT_REDIS_TTL,
        }
    }

    /// Overrides the staggered TTLs (L1, then L2).
    pub fn with_ttls(mut self, local_ttl: Duration, redis_ttl: Duration) -> Self {
        self.local_ttl = local_ttl;
        self.redis_ttl = redis_ttl;
        self
    }

    /// Builds the L1 tier and TTLs from configuration.
    pub fn from_config(config: &CacheConfig, redis: Option<RedisCache>) -> Self {
        let local = Arc::new(LocalCache::new(config.max_size, config.default_ttl()));
        Self::new(local, redis).with_ttls(config.default_ttl(), config.redis_ttl())
    }

    /// Reads through the tiers, backfilling on the way up.
    ///
    /// - L1 hit: returned as is.
    /// - L2 hit: decoded, backfilled into L1 with the L1 TTL. A Redis
    ///   transport or decode failure is logged and degrades to the loader,
    ///   never propagated.
    /// - Loader: on success the exact loaded value is backfilled into L2
    ///   (best-effort) and then L1, L1 last so the fast path is always the
    ///   most current. Loader errors propagate verbatim.
    pub async fn get_with<F, Fut>(&self, key: &str, loader: F) -> Result<(V, CacheTier), CacheError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, CacheError>>,
    {
        if let Some(value) = self.local.get(key).await {
            return Ok((value, CacheTier::L1));
        }

        if let Some(redis) = &self.redis {
            match redis.get_json::<V>(key).await {
                Ok(Some(value)) => {
                    self.local
                        .set_with_ttl(key, value.clone(), self.local_ttl)
                        .await;
                    return Ok((value, CacheTier::L2));
                }
                Ok(None) => {}
                Err(e) => {
                    // Tier unavailable, not a request failure.
                    warn!(key = %key, error = %e, "redis read failed, falling through to loader");
                }
            }
        }

        let value = loader().await?;

        if let Some(redis) = &self.redis {
            if let Err(e) = redis.set_json(key, &value, self.redis_ttl).await {
                warn!(key = %key, error = %e, "redis backfill failed");
            }
        }
        self.local
            .set_with_ttl(key, value.clone(), self.local_ttl)
            .await;

        debug!(key = %key, "loaded from source of truth");
        Ok((value, CacheTier::L3))
    }

    /// Writes to L1 synchronously and to Redis best-effort. A Redis failure
    /// is returned but the L1 write stands; the tiers are eventually
    /// consistent, not atomic.
    pub async fn set(&self, key: &str, value: V) -> Result<(), CacheError> {
        self.local
            .set_with_ttl(key, value.clone(), self.local_ttl)
            .await;

        if let Some(redis) = &self.redis {
            if let Err(e) = redis.set_json(key, &value, self.redis_ttl).await {
                warn!(key = %key, error = %e, "redis write failed, entry only in local tier");
                return Err(e);
            }
        }
        Ok(())
    }

    /// Removes a key from both tiers. A Redis failure surfaces: a failed
    /// invalidation means a stale permission set may still be served
    /// elsewhere, and the caller must know.
    pub async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.local.delete(key).await;

        if let Some(redis) = &self.redis {
            redis.del(std::slice::from_ref(&key.to_string())).await?;
        }
        Ok(())
    }

    /// Removes every key with the prefix from both tiers. Returns the
    /// per-tier counts `(local, redis)` so invalidations can be audited.
    pub async fn delete_prefix(&self, prefix: &str) -> Result<(usize, usize), CacheError> {
        let local_count = self.local.delete_prefix(prefix).await;

        let redis_count = match &self.redis {
            Some(redis) => redis.delete_by_prefix(prefix).await?,
            None => 0,
        };

        debug!(prefix = %prefix, local_count, redis_count, "prefix invalidated");
        Ok((local_count, redis_count))
    }

    /// L1 counters. Redis-side statistics belong to the remote store.
    pub async fn stats(&self) -> CacheStats {
        self.local.stats().await
    }

    pub fn local(&self) -> &Arc<LocalCache<V>> {
        &self.local
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn cache() -> TieredCache<String> {
        TieredCache::new(
            Arc::new(LocalCache::new(100, Duration::from_secs(60))),
            None,
        )
    }

    #[tokio::test]
    async fn loader_runs_once_then_l1_serves() {
        let tiered = cache();
        let calls = AtomicUsize::new(0);

        for i in 0..3 {
            let (value, tier) = tiered
                .get_with("k", || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok("v1".to_string())
                })
                .await
                .unwrap();
            assert_eq!(value, "v1");
            let expected = if i == 0 { CacheTier::L3 } else { CacheTier::L1 };
            assert_eq!(tier, expected);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn loader_error_propagates() {
        let tiered = cache();

        let err = tiered
            .get_with("k", || async {
                Err::<String, _>(CacheError::store("load", "database down"))
            })
            .await
            .unwrap_err();
        assert!(matches!(err, CacheError::Store { .. }));

        // The failed load must not have cached anything.
        assert_eq!(tiered.local().len().await, 0);
    }

    #[tokio::test]
    async fn delete_forces_reload() {
        let tiered = cache();
        let calls = AtomicUsize::new(0);
        let loader = || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok("v".to_string())
        };

        tiered.get_with("k", loader).await.unwrap();
        tiered.delete("k").await.unwrap();

        let (_, tier) = tiered
            .get_with("k", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok("v".to_string())
            })
            .await
            .unwrap();
        assert_eq!(tier, CacheTier::L3);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn delete_prefix_reports_local_count() {
        let tiered = cache();
        tiered.set("user:1:a", "x".to_string()).await.unwrap();
        tiered.set("user:1:b", "y".to_string()).await.unwrap();
        tiered.set("user:2:a", "z".to_string()).await.unwrap();

        let (local, redis) = tiered.delete_prefix("user:1:").await.unwrap();
        assert_eq!((local, redis), (2, 0));
        assert_eq!(tiered.local().len().await, 1);
    }

    #[test]
    fn tier_display() {
        assert_eq!(CacheTier::L1.to_string(), "L1");
        assert_eq!(CacheTier::L2.to_string(), "L2");
        assert_eq!(CacheTier::L3.to_string(), "L3");
    }
}
