//! Redis client wrapper: the shared L2 tier.
//!
//! Thin convenience layer over [`redis::aio::ConnectionManager`]: typed
//! get/set/delete, JSON helpers, and prefix deletion. A missing key is
//! `Ok(None)`, never an error; only transport and server failures surface
//! as [`CacheError::Redis`], which the tiered read path treats as
//! "tier unavailable" and degrades past.

use std::time::Duration;

use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::info;

use crate::config::RedisConfig;
use crate::errors::CacheError;

/// Async Redis client. Cheap to clone; all clones share one multiplexed
/// connection that reconnects on failure.
#[derive(Clone)]
pub struct RedisCache {
    conn: ConnectionManager,
}

impl RedisCache {
    /// Connects and verifies the connection with a PING.
    pub async fn connect(config: &RedisConfig) -> Result<Self, CacheError> {
        let client =
            redis::Client::open(config.url()).map_err(|e| CacheError::redis("connect", e))?;
        let conn = ConnectionManager::new(client)
            .await
            .map_err(|e| CacheError::redis("connect", e))?;

        let cache = Self { conn };
        cache.ping().await?;
        info!(host = %config.host, port = config.port, db = config.db, "redis connected");
        Ok(cache)
    }

    pub async fn ping(&self) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        let _: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(|e| CacheError::redis("ping", e))?;
        Ok(())
    }

    /// Fetches a key. `Ok(None)` means the key does not exist.
    pub async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut conn = self.conn.clone();
        conn.get(key).await.map_err(|e| CacheError::redis("get", e))
    }

    /// Stores a key with an expiry.
    pub async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        let _: () = conn
            .set_ex(key, value, ttl.as_secs().max(1))
            .await
            .map_err(|e| CacheError::redis("set", e))?;
        Ok(())
    }

    /// Deletes the given keys. A no-op for an empty slice.
    pub async fn del(&self, keys: &[String]) -> Result<(), CacheError> {
        if keys.is_empty() {
            return Ok(());
        }
        let mut conn = self.conn.clone();
        let _: () = conn
            .del(keys.to_vec())
            .await
            .map_err(|e| CacheError::redis("del", e))?;
        Ok(())
    }

    /// Returns all keys matching a glob pattern.
    pub async fn keys(&self, pattern: &str) -> Result<Vec<String>, CacheError> {
        let mut conn = self.conn.clone();
        conn.keys(pattern)
            .await
            .map_err(|e| CacheError::redis("keys", e))
    }

    /// Sets a key only if absent, with an expiry. Returns whether the key
    /// was set. Usable as a best-effort distributed lock; nothing in this
    /// crate depends on it for correctness.
    pub async fn set_nx(&self, key: &str, value: &str, ttl: Duration) -> Result<bool, CacheError> {
        let mut conn = self.conn.clone();
        let reply: Option<String> = redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("NX")
            .arg("EX")
            .arg(ttl.as_secs().max(1))
            .query_async(&mut conn)
            .await
            .map_err(|e| CacheError::redis("set_nx", e))?;
        Ok(reply.is_some())
    }

    /// Resets the expiry on a key.
    pub async fn expire(&self, key: &str, ttl: Duration) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        let _: bool = conn
            .expire(key, ttl.as_secs().max(1) as i64)
            .await
            .map_err(|e| CacheError::redis("expire", e))?;
        Ok(())
    }

    /// Fetches a key and decodes it from JSON.
    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, CacheError> {
        match self.get(key).await? {
            None => Ok(None),
            Some(raw) => {
                let value = serde_json::from_str(&raw).map_err(|e| CacheError::Serialization {
                    key: key.to_string(),
                    source: e,
                })?;
                Ok(Some(value))
            }
        }
    }

    /// Encodes a value as JSON and stores it with an expiry.
    pub async fn set_json<T: Serialize>(
        &self,
        key: &str,
        value: &T,
        ttl: Duration,
    ) -> Result<(), CacheError> {
        let raw = serde_json::to_string(value).map_err(|e| CacheError::Serialization {
            key: key.to_string(),
            source: e,
        })?;
        self.set(key, &raw, ttl).await
    }

    /// Deletes every key with the given prefix and returns the count.
    pub async fn delete_by_prefix(&self, prefix: &str) -> Result<usize, CacheError> {
        let keys = self.keys(&format!("{prefix}*")).await?;
        if keys.is_empty() {
            return Ok(0);
        }
        self.del(&keys).await?;
        Ok(keys.len())
    }
}
