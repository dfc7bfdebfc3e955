use blockpulse_config::StatusSettings;
use blockpulse_models::{ServerQuery, StatusFailure, StatusResult};
use dashmap::DashMap;
use moka::future::Cache;
use moka::Expiry;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::time::Instant as TokioInstant;

/// What a resolution produced. Failures are first-class values so they can
/// be cached and served just like successes, only with a shorter lifetime.
pub type ResolveOutcome = std::result::Result<StatusResult, StatusFailure>;

/// Per-entry expiry: successful statuses live for the full cache TTL,
/// failures expire quickly so recovery is picked up fast.
struct OutcomeExpiry {
    success_ttl: Duration,
    error_ttl: Duration,
}

impl Expiry<ServerQuery, ResolveOutcome> for OutcomeExpiry {
    fn expire_after_create(
        &self,
        _key: &ServerQuery,
        value: &ResolveOutcome,
        _created_at: Instant,
    ) -> Option<Duration> {
        match value {
            Ok(_) => Some(self.success_ttl),
            Err(_) => Some(self.error_ttl),
        }
    }
}

/// Status cache with per-key request throttling.
///
/// Concurrent lookups for the same server are serialized behind a per-key
/// lock, so a burst of requests produces at most one upstream call. The
/// throttle enforces a minimum spacing between consecutive upstream calls
/// for the same key by waiting out the remaining interval instead of
/// rejecting.
pub struct StatusCache {
    entries: Cache<ServerQuery, ResolveOutcome>,
    locks: DashMap<ServerQuery, Arc<Mutex<()>>>,
    last_request: DashMap<ServerQuery, TokioInstant>,
    request_interval: Duration,
}

const MAX_CACHED_SERVERS: u64 = 10_000;

impl StatusCache {
    pub fn new(settings: &StatusSettings) -> Self {
        let entries = Cache::builder()
            .max_capacity(MAX_CACHED_SERVERS)
            .expire_after(OutcomeExpiry {
                success_ttl: Duration::from_secs(settings.cache_ttl_secs),
                error_ttl: Duration::from_secs(settings.error_cache_ttl_secs),
            })
            .build();

        Self {
            entries,
            locks: DashMap::new(),
            last_request: DashMap::new(),
            request_interval: Duration::from_secs(settings.request_interval_secs),
        }
    }

    /// Returns the cached outcome for `query`, or runs `resolve` to produce
    /// one. The resolver runs under the key's lock after the throttle wait;
    /// its outcome is cached before being returned.
    pub async fn get_or_resolve<F, Fut>(&self, query: &ServerQuery, resolve: F) -> ResolveOutcome
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = ResolveOutcome>,
    {
        if let Some(cached) = self.entries.get(query).await {
            tracing::debug!("Cache hit for {}", query);
            return cached;
        }

        let lock = self
            .locks
            .entry(query.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let outcome = self.resolve_locked(&lock, query, resolve).await;

        // The last task out drops the per-key lock, so one-off queries do
        // not accumulate entries.
        drop(lock);
        self.locks
            .remove_if(query, |_, existing| Arc::strong_count(existing) == 1);

        outcome
    }

    async fn resolve_locked<F, Fut>(
        &self,
        lock: &Mutex<()>,
        query: &ServerQuery,
        resolve: F,
    ) -> ResolveOutcome
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = ResolveOutcome>,
    {
        let _guard = lock.lock().await;

        // Another task may have resolved this key while we waited.
        if let Some(cached) = self.entries.get(query).await {
            tracing::debug!("Cache hit for {} after lock wait", query);
            return cached;
        }

        self.wait_for_interval(query).await;

        let outcome = resolve().await;
        match &outcome {
            Ok(status) => tracing::debug!(
                "Resolved {} (online: {}), caching",
                query,
                status.online
            ),
            Err(failure) => tracing::warn!("Resolution of {} failed: {}, caching failure", query, failure),
        }
        self.entries.insert(query.clone(), outcome.clone()).await;

        outcome
    }

    /// Stores an outcome directly, used by the background poller.
    pub async fn store(&self, query: &ServerQuery, outcome: ResolveOutcome) {
        self.entries.insert(query.clone(), outcome).await;
    }

    /// Sleeps out the remainder of the minimum spacing since the previous
    /// upstream call for this key. The timestamp is taken before the
    /// upstream call, so the interval is measured start-to-start.
    async fn wait_for_interval(&self, query: &ServerQuery) {
        if self.request_interval.is_zero() {
            return;
        }

        if self.last_request.len() > MAX_CACHED_SERVERS as usize {
            self.prune_throttle_table();
        }

        let now = TokioInstant::now();
        let wait = self
            .last_request
            .get(query)
            .map(|last| self.request_interval.saturating_sub(now.duration_since(*last)))
            .unwrap_or(Duration::ZERO);

        self.last_request.insert(query.clone(), now + wait);

        if !wait.is_zero() {
            tracing::debug!("Throttling {} for {:?}", query, wait);
            tokio::time::sleep(wait).await;
        }
    }

    /// Drops throttle timestamps whose spacing interval has fully elapsed;
    /// those keys no longer need to wait, so the entry carries no state.
    fn prune_throttle_table(&self) {
        let now = TokioInstant::now();
        self.last_request
            .retain(|_, last| now.duration_since(*last) < self.request_interval);
    }
}
