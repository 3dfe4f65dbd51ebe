//! Cache tiers and supporting machinery.
//!
//! `local` is the bounded in-process LRU (L1), `redis` the shared remote
//! tier (L2), and `tiered` the orchestrator that folds both plus a loader
//! closure into a single read path. `keys` fixes the key naming scheme,
//! `cleanup` runs the periodic expiry sweep, and `warmup` preloads hot
//! permission sets at startup.

pub mod cleanup;
pub mod keys;
pub mod local;
pub mod redis;
pub mod tiered;
pub mod warmup;

pub use self::redis::RedisCache;
pub use cleanup::{spawn_cleanup_task, CleanupHandle};
pub use local::{CacheStats, LocalCache};
pub use tiered::{CacheTier, TieredCache};
pub use warmup::{PermissionWarmer, WarmupStats};
