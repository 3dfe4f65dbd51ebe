//! Configuration for the cache tiers and the warmer.
//!
//! Plain structs with `Default` impls; the host service owns actual file or
//! environment loading and hands the resolved values in.

use std::time::Duration;

use serde::Deserialize;

/// Redis (L2) connection settings.
#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    pub host: String,
    pub port: u16,
    /// Empty means no AUTH.
    pub password: String,
    pub db: i64,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 6379,
            password: String::new(),
            db: 0,
        }
    }
}

impl RedisConfig {
    /// Connection URL in the form `redis://[:password@]host:port/db`.
    pub fn url(&self) -> String {
        if self.password.is_empty() {
            format!("redis://{}:{}/{}", self.host, self.port, self.db)
        } else {
            format!(
                "redis://:{}@{}:{}/{}",
                self.password, self.host, self.port, self.db
            )
        }
    }
}

/// Tier sizing and TTLs.
///
/// TTLs are staggered (L1 < L2) so L1 entries refresh from Redis before the
/// Redis copy itself expires.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// Maximum number of L1 entries.
    pub max_size: usize,
    /// L1 TTL in seconds.
    pub default_ttl_secs: u64,
    /// L2 (Redis) TTL in seconds.
    pub redis_ttl_secs: u64,
    /// Interval for the background expiry sweep, in seconds.
    pub cleanup_interval_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_size: 1000,
            default_ttl_secs: 300,       // 5 minutes
            redis_ttl_secs: 1800,        // 30 minutes
            cleanup_interval_secs: 60,
        }
    }
}

impl CacheConfig {
    pub fn default_ttl(&self) -> Duration {
        Duration::from_secs(self.default_ttl_secs)
    }

    pub fn redis_ttl(&self) -> Duration {
        Duration::from_secs(self.redis_ttl_secs)
    }

    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.cleanup_interval_secs)
    }
}

/// Targets and limits for startup cache warming.
#[derive(Debug, Clone, Deserialize)]
pub struct WarmupConfig {
    /// Users whose permission sets are preloaded (typically super admins).
    pub user_ids: Vec<u64>,
    /// Frequently assigned roles to preload.
    pub role_ids: Vec<u64>,
    /// Maximum parallel loads. Zero falls back to the default of 5.
    pub concurrency: usize,
    /// Wall-clock limit for the whole run, in seconds. Zero falls back to
    /// the default of 30.
    pub timeout_secs: u64,
    /// Emit per-item progress logs.
    pub log_progress: bool,
}

impl Default for WarmupConfig {
    fn default() -> Self {
        Self {
            user_ids: vec![1],
            role_ids: vec![1, 2, 3],
            concurrency: 5,
            timeout_secs: 30,
            log_progress: true,
        }
    }
}

impl WarmupConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redis_url_with_and_without_auth() {
        let config = RedisConfig::default();
        assert_eq!(config.url(), "redis://localhost:6379/0");

        let config = RedisConfig {
            password: "s3cret".to_string(),
            db: 2,
            ..RedisConfig::default()
        };
        assert_eq!(config.url(), "redis://:s3cret@localhost:6379/2");
    }

    #[test]
    fn cache_ttls_are_staggered_by_default() {
        let config = CacheConfig::default();
        assert!(config.default_ttl() < config.redis_ttl());
    }
}
