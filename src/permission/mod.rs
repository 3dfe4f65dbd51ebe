//! Permission resolution and invalidation on top of the tiered cache.
//!
//! [`PermissionService`] is what controllers and the business layer talk
//! to: resolve a user's patterns, check one request against them, and
//! invalidate on mutation. Persistence stays behind the
//! [`PermissionLoader`] contract.

pub mod matcher;

pub use matcher::{has_permission, matches_pattern};

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::cache::keys;
use crate::cache::local::CacheStats;
use crate::cache::tiered::TieredCache;
use crate::errors::CacheError;

/// Source-of-truth contract for permission lists.
///
/// Implemented by the host's persistence layer (resolving a user's roles
/// transitively to their patterns), and by [`PermissionService`] itself,
/// whose implementation reads through the cache tiers, which is what lets
/// the warmer drive the real read path.
#[async_trait]
pub trait PermissionLoader: Send + Sync {
    /// Full, current pattern list for a user, derived from role membership.
    async fn load_user_permissions(&self, user_id: u64) -> Result<Vec<String>, CacheError>;

    /// Full, current pattern list for a role.
    async fn load_role_permissions(&self, role_id: u64) -> Result<Vec<String>, CacheError>;
}

/// Permission resolution with tiered caching and pattern matching.
pub struct PermissionService {
    cache: TieredCache<Vec<String>>,
    store: Arc<dyn PermissionLoader>,
}

impl PermissionService {
    pub fn new(cache: TieredCache<Vec<String>>, store: Arc<dyn PermissionLoader>) -> Self {
        Self { cache, store }
    }

    /// Resolves a user's permission patterns through L1 → L2 → store.
    pub async fn get_user_permissions(&self, user_id: u64) -> Result<Vec<String>, CacheError> {
        let key = keys::user_permissions(user_id);
        let store = Arc::clone(&self.store);

        let (permissions, tier) = self
            .cache
            .get_with(&key, || async move {
                store.load_user_permissions(user_id).await
            })
            .await?;

        debug!(user_id, tier = %tier, count = permissions.len(), "resolved user permissions");
        Ok(permissions)
    }

    /// Resolves a role's permission patterns through the same tiers.
    pub async fn get_role_permissions(&self, role_id: u64) -> Result<Vec<String>, CacheError> {
        let key = keys::role_permissions(role_id);
        let store = Arc::clone(&self.store);

        let (permissions, tier) = self
            .cache
            .get_with(&key, || async move {
                store.load_role_permissions(role_id).await
            })
            .await?;

        debug!(role_id, tier = %tier, count = permissions.len(), "resolved role permissions");
        Ok(permissions)
    }

    /// Resolves the user's patterns and matches the requested one.
    pub async fn check_permission(
        &self,
        user_id: u64,
        requested: &str,
    ) -> Result<bool, CacheError> {
        let permissions = self.get_user_permissions(user_id).await?;
        Ok(matcher::has_permission(&permissions, requested))
    }

    /// Drops the user's permission entry from both tiers. Call when the
    /// user's role assignments change.
    pub async fn clear_cache(&self, user_id: u64) -> Result<(), CacheError> {
        self.cache.delete(&keys::user_permissions(user_id)).await
    }

    /// Drops every cache entry scoped to the user (`user:<id>:` prefix),
    /// for user deletion.
    pub async fn clear_user_cache(&self, user_id: u64) -> Result<(), CacheError> {
        let (local, redis) = self.cache.delete_prefix(&keys::user_prefix(user_id)).await?;
        debug!(user_id, local, redis, "cleared user cache");
        Ok(())
    }

    /// Drops the role's permission entry and every `role:<id>:`-scoped
    /// entry from both tiers, for role permission changes.
    ///
    /// Users holding the role are *not* fanned out to: their
    /// `user:permissions:<id>` entries stay until their own TTL expires,
    /// a bounded staleness window (at most the L2 TTL) accepted in exchange
    /// for not enumerating role membership on every role mutation. Callers
    /// needing immediate effect can [`clear_cache`](Self::clear_cache) the
    /// affected users explicitly.
    pub async fn clear_role_cache(&self, role_id: u64) -> Result<(), CacheError> {
        self.cache.delete(&keys::role_permissions(role_id)).await?;

        let (local, redis) = self.cache.delete_prefix(&keys::role_prefix(role_id)).await?;
        debug!(role_id, local, redis, "cleared role cache");
        Ok(())
    }

    /// L1 hit/miss counters for observability endpoints.
    pub async fn cache_stats(&self) -> CacheStats {
        self.cache.stats().await
    }

    pub fn cache(&self) -> &TieredCache<Vec<String>> {
        &self.cache
    }
}

/// The cached read path exposed under the loader contract, so the warmer
/// (or any other preloading caller) populates the tiers as a side effect.
#[async_trait]
impl PermissionLoader for PermissionService {
    async fn load_user_permissions(&self, user_id: u64) -> Result<Vec<String>, CacheError> {
        self.get_user_permissions(user_id).await
    }

    async fn load_role_permissions(&self, role_id: u64) -> Result<Vec<String>, CacheError> {
        self.get_role_permissions(role_id).await
    }
}
