//! Startup cache warming.
//!
//! Preloads hot permission sets (super admins, common roles) before live
//! traffic arrives, so the first requests do not all stampede the database.
//! Loads run under a bounded worker pool (semaphore-gated tokio tasks) with
//! one shared deadline. Warmup is advisory: partial failure is reported in
//! the stats, and only a run where *every* item fails returns an error.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use tokio::sync::{oneshot, Semaphore};
use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::config::WarmupConfig;
use crate::errors::CacheError;
use crate::permission::PermissionLoader;

const DEFAULT_CONCURRENCY: usize = 5;
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Outcome of one warmup run. Created fresh per run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct WarmupStats {
    pub total_items: usize,
    pub success_count: usize,
    pub failure_count: usize,
    pub duration: Duration,
    /// One formatted message per failed item, `"user:<id> - <error>"`.
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, Copy)]
enum WarmItem {
    User(u64),
    Role(u64),
}

impl fmt::Display for WarmItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WarmItem::User(id) => write!(f, "user:{id}"),
            WarmItem::Role(id) => write!(f, "role:{id}"),
        }
    }
}

/// Preloads permission sets through a [`PermissionLoader`].
///
/// Hand it the permission service itself (which also implements the loader
/// contract by reading through the cache tiers) and every successful load
/// lands in L1/L2, which is the point of warming.
pub struct PermissionWarmer {
    config: WarmupConfig,
    loader: Arc<dyn PermissionLoader>,
}

impl PermissionWarmer {
    /// Creates a warmer. Zero concurrency or timeout fall back to 5 / 30s.
    pub fn new(mut config: WarmupConfig, loader: Arc<dyn PermissionLoader>) -> Self {
        if config.concurrency == 0 {
            config.concurrency = DEFAULT_CONCURRENCY;
        }
        if config.timeout_secs == 0 {
            config.timeout_secs = DEFAULT_TIMEOUT.as_secs();
        }
        Self { config, loader }
    }

    /// Runs the warmup to completion and aggregates per-item results.
    ///
    /// Every configured user and role becomes one task; tasks share a
    /// semaphore sized to the configured concurrency and one deadline.
    /// A task still waiting at the deadline is recorded as a failure and
    /// does not linger past it.
    pub async fn warm(&self) -> Result<WarmupStats, CacheError> {
        let started = Instant::now();
        let deadline = tokio::time::Instant::now() + self.config.timeout();

        let mut stats = WarmupStats {
            total_items: self.config.user_ids.len() + self.config.role_ids.len(),
            ..WarmupStats::default()
        };
        if stats.total_items == 0 {
            stats.duration = started.elapsed();
            return Ok(stats);
        }

        if self.config.log_progress {
            info!(
                users = self.config.user_ids.len(),
                roles = self.config.role_ids.len(),
                concurrency = self.config.concurrency,
                "starting cache warmup"
            );
        }

        let semaphore = Arc::new(Semaphore::new(self.config.concurrency));
        let mut tasks = JoinSet::new();

        let items = self
            .config
            .user_ids
            .iter()
            .map(|&id| WarmItem::User(id))
            .chain(self.config.role_ids.iter().map(|&id| WarmItem::Role(id)));

        for item in items {
            let semaphore = Arc::clone(&semaphore);
            let loader = Arc::clone(&self.loader);

            tasks.spawn(async move {
                let outcome = tokio::time::timeout_at(deadline, async move {
                    let _permit = semaphore
                        .acquire_owned()
                        .await
                        .map_err(|_| "worker pool closed".to_string())?;

                    let loaded = match item {
                        WarmItem::User(id) => loader.load_user_permissions(id).await,
                        WarmItem::Role(id) => loader.load_role_permissions(id).await,
                    };
                    loaded.map(|_| ()).map_err(|e| e.to_string())
                })
                .await;

                let result = match outcome {
                    Ok(result) => result,
                    Err(_) => Err("timed out".to_string()),
                };
                (item, result)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((item, Ok(()))) => {
                    stats.success_count += 1;
                    if self.config.log_progress {
                        info!(item = %item, "warmed");
                    }
                }
                Ok((item, Err(message))) => {
                    stats.failure_count += 1;
                    stats.errors.push(format!("{item} - {message}"));
                    if self.config.log_progress {
                        warn!(item = %item, error = %message, "warmup item failed");
                    }
                }
                Err(join_error) => {
                    stats.failure_count += 1;
                    stats.errors.push(format!("task failed: {join_error}"));
                }
            }
        }

        stats.duration = started.elapsed();

        if self.config.log_progress {
            info!(
                success = stats.success_count,
                failed = stats.failure_count,
                total = stats.total_items,
                elapsed_ms = stats.duration.as_millis() as u64,
                "cache warmup finished"
            );
        }

        if stats.failure_count == stats.total_items {
            return Err(CacheError::WarmupFailed { stats });
        }
        Ok(stats)
    }

    /// Launches [`warm`](Self::warm) in the background. The receiver
    /// resolves once with the run's stats, whether or not it succeeded.
    pub fn warm_async(self: Arc<Self>) -> oneshot::Receiver<WarmupStats> {
        let (tx, rx) = oneshot::channel();

        tokio::spawn(async move {
            let stats = match self.warm().await {
                Ok(stats) => stats,
                Err(CacheError::WarmupFailed { stats }) => {
                    warn!(
                        total = stats.total_items,
                        "cache warmup failed for every item"
                    );
                    stats
                }
                Err(e) => {
                    warn!(error = %e, "cache warmup aborted");
                    return;
                }
            };
            let _ = tx.send(stats);
        });

        rx
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::time::sleep;

    struct StubLoader {
        fail_roles: Vec<u64>,
        fail_all: bool,
        delay: Option<Duration>,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    impl StubLoader {
        fn new() -> Self {
            Self {
                fail_roles: Vec::new(),
                fail_all: false,
                delay: None,
                in_flight: AtomicUsize::new(0),
                max_in_flight: AtomicUsize::new(0),
            }
        }

        async fn track<T>(&self, result: T) -> T {
            let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(current, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                sleep(delay).await;
            }
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            result
        }
    }

    #[async_trait]
    impl PermissionLoader for StubLoader {
        async fn load_user_permissions(&self, user_id: u64) -> Result<Vec<String>, CacheError> {
            if self.fail_all {
                return Err(CacheError::store("load_user_permissions", "store down"));
            }
            self.track(Ok(vec![format!("user:{user_id}")])).await
        }

        async fn load_role_permissions(&self, role_id: u64) -> Result<Vec<String>, CacheError> {
            if self.fail_all || self.fail_roles.contains(&role_id) {
                return Err(CacheError::store("load_role_permissions", "store down"));
            }
            self.track(Ok(vec![])).await
        }
    }

    fn config(user_ids: Vec<u64>, role_ids: Vec<u64>) -> WarmupConfig {
        WarmupConfig {
            user_ids,
            role_ids,
            concurrency: 5,
            timeout_secs: 30,
            log_progress: false,
        }
    }

    #[tokio::test]
    async fn partial_failure_is_not_an_error() {
        let mut loader = StubLoader::new();
        loader.fail_roles = vec![99];

        let warmer = PermissionWarmer::new(config(vec![1, 2, 3], vec![5, 99]), Arc::new(loader));
        let stats = warmer.warm().await.unwrap();

        assert_eq!(stats.total_items, 5);
        assert_eq!(stats.success_count, 4);
        assert_eq!(stats.failure_count, 1);
        assert_eq!(stats.errors.len(), 1);
        assert!(stats.errors[0].starts_with("role:99 - "));
    }

    #[tokio::test]
    async fn total_failure_is_an_error() {
        let mut loader = StubLoader::new();
        loader.fail_all = true;

        let warmer = PermissionWarmer::new(config(vec![1, 2, 3], vec![5, 6]), Arc::new(loader));
        let err = warmer.warm().await.unwrap_err();

        match err {
            CacheError::WarmupFailed { stats } => {
                assert_eq!(stats.total_items, 5);
                assert_eq!(stats.failure_count, 5);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn empty_target_list_is_a_no_op() {
        let warmer = PermissionWarmer::new(config(vec![], vec![]), Arc::new(StubLoader::new()));
        let stats = warmer.warm().await.unwrap();
        assert_eq!(stats.total_items, 0);
        assert_eq!(stats.failure_count, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn concurrency_is_bounded() {
        let mut loader = StubLoader::new();
        loader.delay = Some(Duration::from_millis(50));
        let loader = Arc::new(loader);

        let mut cfg = config((1..=10).collect(), vec![]);
        cfg.concurrency = 2;
        let warmer = PermissionWarmer::new(cfg, Arc::clone(&loader) as Arc<dyn PermissionLoader>);

        let stats = warmer.warm().await.unwrap();
        assert_eq!(stats.success_count, 10);
        assert!(loader.max_in_flight.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_turns_slow_loads_into_failures() {
        let mut loader = StubLoader::new();
        loader.delay = Some(Duration::from_secs(3600));

        let mut cfg = config(vec![1, 2], vec![]);
        cfg.timeout_secs = 1;
        let warmer = PermissionWarmer::new(cfg, Arc::new(loader));

        let err = warmer.warm().await.unwrap_err();
        match err {
            CacheError::WarmupFailed { stats } => {
                assert_eq!(stats.failure_count, 2);
                assert!(stats.errors.iter().all(|e| e.contains("timed out")));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn warm_async_delivers_stats_through_the_channel() {
        let warmer = Arc::new(PermissionWarmer::new(
            config(vec![1], vec![2]),
            Arc::new(StubLoader::new()),
        ));

        let stats = warmer.warm_async().await.expect("warmup result");
        assert_eq!(stats.success_count, 2);
    }
}
