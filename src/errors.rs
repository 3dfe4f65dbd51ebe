//! Crate error type.
//!
//! The read path distinguishes three failure classes: a tier miss (not an
//! error at all), a Redis failure (logged and degraded, never surfaced to
//! callers), and a store failure (propagated verbatim). Invalidation is the
//! exception: a Redis error while clearing keys *is* surfaced, because a
//! stale permission set is a security-relevant outcome.

use thiserror::Error;

use crate::cache::warmup::WarmupStats;

/// Error type for cache and permission operations.
#[derive(Debug, Error)]
pub enum CacheError {
    /// A Redis command failed (connection, transport, or server error).
    /// Distinct from a missing key, which is a normal miss.
    #[error("redis {operation} failed")]
    Redis {
        operation: &'static str,
        #[source]
        source: redis::RedisError,
    },

    /// A value crossing the Redis boundary could not be (de)serialized.
    #[error("serialization failed for key {key}")]
    Serialization {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// The authoritative permission store failed. Carries the host
    /// persistence layer's error unmodified.
    #[error("permission store error: {operation}")]
    Store {
        operation: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Every warmup task failed. Partial failure is reported through
    /// [`WarmupStats`] instead; this fires only on a total loss.
    #[error("cache warmup failed: all {} items failed", .stats.total_items)]
    WarmupFailed { stats: WarmupStats },
}

impl CacheError {
    pub(crate) fn redis(operation: &'static str, source: redis::RedisError) -> Self {
        Self::Redis { operation, source }
    }

    /// Wraps a persistence-layer error. Intended for [`PermissionLoader`]
    /// implementations in the host service.
    ///
    /// [`PermissionLoader`]: crate::permission::PermissionLoader
    pub fn store(
        operation: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::Store {
            operation: operation.into(),
            source: source.into(),
        }
    }
}
