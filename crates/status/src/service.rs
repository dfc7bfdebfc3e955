use super::cache::{ResolveOutcome, StatusCache};
use super::icon::IconResolver;
use super::normalize;
use super::router::SourceRouter;
use super::upstream::UpstreamFetch;
use blockpulse_config::{IconSettings, SourceSettings, StatusSettings};
use blockpulse_models::{FailureKind, ServerQuery, StatusFailure, StatusResult};
use futures::future::join_all;
use std::sync::Arc;

/// Hook invoked whenever a fresh status is resolved from upstream. Cache
/// hits do not fire it. The history recorder plugs in here.
#[async_trait::async_trait]
pub trait StatusObserver: Send + Sync {
    async fn status_resolved(&self, query: &ServerQuery, status: &StatusResult);
}

struct ServiceInner {
    cache: StatusCache,
    router: SourceRouter,
    icons: IconResolver,
    observer: Option<Arc<dyn StatusObserver>>,
}

impl ServiceInner {
    async fn resolve(&self, query: &ServerQuery) -> ResolveOutcome {
        self.cache
            .get_or_resolve(query, || self.resolve_upstream(query))
            .await
    }

    /// One full upstream round trip: route, decode, attach the icon, then
    /// notify the observer.
    async fn resolve_upstream(&self, query: &ServerQuery) -> ResolveOutcome {
        let routed = match self.router.resolve(query).await {
            Ok(routed) => routed,
            Err(err) => return Err(err.to_failure()),
        };

        let mut status = match normalize::normalize(&routed.body, routed.source.schema, query) {
            Ok(status) => status,
            Err(err) => return Err(err.to_failure()),
        };

        if status.online {
            status.server_icon = Some(self.icons.resolve(&query.address).await);
        }

        if let Some(observer) = &self.observer {
            observer.status_resolved(query, &status).await;
        }

        Ok(status)
    }
}

/// Entry point for status lookups. Clones share the underlying cache,
/// router and icon resolver.
#[derive(Clone)]
pub struct StatusService {
    inner: Arc<ServiceInner>,
}

impl StatusService {
    pub fn new(
        status: &StatusSettings,
        sources: SourceSettings,
        icons: &IconSettings,
        fetcher: Arc<dyn UpstreamFetch>,
    ) -> Self {
        Self {
            inner: Arc::new(ServiceInner {
                cache: StatusCache::new(status),
                router: SourceRouter::new(sources, fetcher.clone()),
                icons: IconResolver::new(icons, fetcher),
                observer: None,
            }),
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn StatusObserver>) -> Self {
        let inner = Arc::get_mut(&mut self.inner)
            .expect("observer must be attached before the service is shared");
        inner.observer = Some(observer);
        self
    }

    /// Creates the icon cache directory. Called once at startup.
    pub async fn init(&self) -> Result<(), super::errors::StatusError> {
        self.inner.icons.init().await
    }

    /// Resolves one server's status, serving from cache when possible.
    ///
    /// The resolution runs in a detached task, so an abandoned caller does
    /// not cancel an in-flight upstream call or lose the cache write.
    pub async fn resolve(&self, query: ServerQuery) -> ResolveOutcome {
        let inner = self.inner.clone();
        let task_query = query.clone();
        let handle = tokio::spawn(async move { inner.resolve(&task_query).await });

        match handle.await {
            Ok(outcome) => outcome,
            Err(err) => Err(StatusFailure {
                kind: FailureKind::Transport,
                message: format!("resolution task for {} failed: {}", query, err),
            }),
        }
    }

    /// Resolves a batch of servers concurrently, one task each. Outcomes
    /// come back in input order.
    pub async fn resolve_many(&self, queries: Vec<ServerQuery>) -> Vec<ResolveOutcome> {
        let tasks: Vec<_> = queries
            .into_iter()
            .map(|query| {
                let service = self.clone();
                tokio::spawn(async move { service.resolve(query).await })
            })
            .collect();

        join_all(tasks)
            .await
            .into_iter()
            .map(|joined| {
                joined.unwrap_or_else(|err| {
                    Err(StatusFailure {
                        kind: FailureKind::Transport,
                        message: format!("resolution task failed: {}", err),
                    })
                })
            })
            .collect()
    }

    /// Forces a fresh upstream resolution and replaces the cached entry.
    /// Used by the background poller.
    pub async fn refresh(&self, query: ServerQuery) -> ResolveOutcome {
        let outcome = self.inner.resolve_upstream(&query).await;
        self.inner.cache.store(&query, outcome.clone()).await;
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::StatusError;
    use crate::upstream::UpstreamResponse;
    use blockpulse_config::{SourceEndpoint, UpstreamSchema};
    use blockpulse_models::Edition;
    use bytes::Bytes;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;
    use tokio::sync::Mutex;

    /// Routes by URL prefix: icon requests get PNG bytes, status requests
    /// get the canned JSON body.
    struct RoutingFetch {
        status_body: &'static str,
        status_calls: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl UpstreamFetch for RoutingFetch {
        async fn fetch(&self, url: &str) -> Result<UpstreamResponse, StatusError> {
            if url.starts_with("https://icons.example/") {
                return Ok(UpstreamResponse {
                    status: 200,
                    body: Bytes::from_static(b"\x89PNG"),
                });
            }
            self.status_calls.fetch_add(1, Ordering::SeqCst);
            if self.status_body.is_empty() {
                return Err(StatusError::Transport("connection refused".to_string()));
            }
            Ok(UpstreamResponse {
                status: 200,
                body: Bytes::from(self.status_body),
            })
        }
    }

    struct RecordingObserver {
        seen: Mutex<Vec<(ServerQuery, Option<u32>)>>,
    }

    #[async_trait::async_trait]
    impl StatusObserver for RecordingObserver {
        async fn status_resolved(&self, query: &ServerQuery, status: &StatusResult) {
            self.seen
                .lock()
                .await
                .push((query.clone(), status.players_online));
        }
    }

    fn service(dir: &TempDir, body: &'static str) -> (StatusService, Arc<RoutingFetch>) {
        let fetch = Arc::new(RoutingFetch {
            status_body: body,
            status_calls: AtomicUsize::new(0),
        });
        let status = StatusSettings {
            request_interval_secs: 0,
            ..Default::default()
        };
        let sources = SourceSettings {
            java: vec![SourceEndpoint {
                name: "test".to_string(),
                url: "https://status.example/".to_string(),
                schema: UpstreamSchema::Simple,
            }],
            bedrock: Vec::new(),
        };
        let icons = IconSettings {
            cache_dir: dir.path().to_string_lossy().into_owned(),
            ttl_secs: 86400,
            endpoint: "https://icons.example/".to_string(),
        };
        (
            StatusService::new(&status, sources, &icons, fetch.clone()),
            fetch,
        )
    }

    const ONLINE_BODY: &str = r#"{"online": true, "players": {"online": 5, "max": 20}}"#;

    #[tokio::test]
    async fn resolve_returns_status_with_icon_attached() {
        let dir = TempDir::new().unwrap();
        let (service, _) = service(&dir, ONLINE_BODY);
        service.init().await.unwrap();

        let status = service
            .resolve(ServerQuery::new("play.example.com", Edition::Java))
            .await
            .unwrap();

        assert!(status.online);
        assert_eq!(status.players_online, Some(5));
        assert!(status.server_icon.unwrap().ends_with(".png"));
    }

    #[tokio::test]
    async fn cache_hit_skips_upstream_and_observer() {
        let dir = TempDir::new().unwrap();
        let (service, fetch) = service(&dir, ONLINE_BODY);
        let observer = Arc::new(RecordingObserver {
            seen: Mutex::new(Vec::new()),
        });
        let service = service.with_observer(observer.clone());
        service.init().await.unwrap();

        let query = ServerQuery::new("play.example.com", Edition::Java);
        service.resolve(query.clone()).await.unwrap();
        service.resolve(query).await.unwrap();

        assert_eq!(fetch.status_calls.load(Ordering::SeqCst), 1);
        assert_eq!(observer.seen.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn transport_failure_becomes_exhausted_outcome() {
        let dir = TempDir::new().unwrap();
        let (service, _) = service(&dir, "");
        service.init().await.unwrap();

        let failure = service
            .resolve(ServerQuery::new("down.example.com", Edition::Java))
            .await
            .unwrap_err();

        assert_eq!(failure.kind, FailureKind::AllSourcesExhausted);
        assert!(failure.message.contains("connection refused"));
    }

    #[tokio::test]
    async fn resolve_many_preserves_input_order() {
        let dir = TempDir::new().unwrap();
        let (service, _) = service(&dir, ONLINE_BODY);
        service.init().await.unwrap();

        let queries = vec![
            ServerQuery::new("a.example.com", Edition::Java),
            ServerQuery::new("b.example.com", Edition::Java),
            ServerQuery::new("c.example.com", Edition::Java),
        ];
        let outcomes = service.resolve_many(queries.clone()).await;

        assert_eq!(outcomes.len(), 3);
        for (query, outcome) in queries.iter().zip(&outcomes) {
            let status = outcome.as_ref().unwrap();
            assert_eq!(status.server_address.as_deref(), Some(query.address.as_str()));
        }
    }

    #[tokio::test]
    async fn refresh_replaces_cached_entry() {
        let dir = TempDir::new().unwrap();
        let (service, fetch) = service(&dir, ONLINE_BODY);
        service.init().await.unwrap();

        let query = ServerQuery::new("play.example.com", Edition::Java);
        service.resolve(query.clone()).await.unwrap();
        service.refresh(query.clone()).await.unwrap();

        assert_eq!(fetch.status_calls.load(Ordering::SeqCst), 2);

        // The refreshed entry serves the next lookup.
        service.resolve(query).await.unwrap();
        assert_eq!(fetch.status_calls.load(Ordering::SeqCst), 2);
    }
}
