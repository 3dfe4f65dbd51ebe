//! Permission resolution with tiered caching for RBAC admin backends.
//!
//! The crate implements the permission subsystem of an administrative
//! backend: resolving a user's granted permission patterns, matching a
//! requested pattern against them, and keeping resolution fast under load
//! with a three-tier cache:
//!
//! - **L1**: in-process bounded LRU with per-entry TTL ([`LocalCache`]),
//!   sub-millisecond, 5 minute default TTL
//! - **L2**: shared Redis tier ([`RedisCache`]), survives restarts and is
//!   shared across instances, 30 minute default TTL
//! - **L3**: the authoritative store, reached through the
//!   [`PermissionLoader`] contract implemented by the host's persistence
//!   layer
//!
//! [`TieredCache`] composes the tiers into one read path with transparent
//! backfill; [`PermissionService`] puts the permission key scheme, the
//! wildcard matcher and the invalidation rules on top. [`PermissionWarmer`]
//! preloads hot permission sets at startup under a bounded worker pool.
//!
//! The Redis tier is best-effort: if it is absent or failing, reads degrade
//! to the loader and the service keeps answering.

pub mod cache;
pub mod config;
pub mod errors;
pub mod permission;

pub use cache::cleanup::{spawn_cleanup_task, CleanupHandle};
pub use cache::local::{CacheStats, LocalCache};
pub use cache::redis::RedisCache;
pub use cache::tiered::{CacheTier, TieredCache};
pub use cache::warmup::{PermissionWarmer, WarmupStats};
pub use config::{CacheConfig, RedisConfig, WarmupConfig};
pub use errors::CacheError;
pub use permission::{PermissionLoader, PermissionService};
