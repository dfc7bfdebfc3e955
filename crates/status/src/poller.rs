use super::service::StatusService;
use blockpulse_events::{AppEvent, EventBus};
use blockpulse_models::ServerQuery;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

/// Background refresher that keeps tracked servers warm in the cache so
/// interactive lookups rarely pay the upstream latency.
pub struct StatusPoller {
    service: StatusService,
    queries: Vec<ServerQuery>,
    interval: Duration,
    event_bus: Arc<EventBus>,
}

impl StatusPoller {
    /// Returns `None` when polling is disabled (`poll_interval_secs = 0`)
    /// or no servers are tracked.
    pub fn new(
        service: StatusService,
        queries: Vec<ServerQuery>,
        interval_secs: u64,
        event_bus: Arc<EventBus>,
    ) -> Option<Self> {
        if interval_secs == 0 || queries.is_empty() {
            return None;
        }
        Some(Self {
            service,
            queries,
            interval: Duration::from_secs(interval_secs),
            event_bus,
        })
    }

    /// Runs until the shutdown channel fires. The first sweep starts one
    /// full interval after startup; initial lookups populate the cache on
    /// demand.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        ticker.tick().await;

        self.event_bus.emit(AppEvent::PollingEnabled {
            interval: self.interval.as_secs(),
        });

        loop {
            tokio::select! {
                _ = ticker.tick() => self.sweep().await,
                _ = shutdown.recv() => {
                    tracing::debug!("Poller shutting down");
                    return;
                }
            }
        }
    }

    async fn sweep(&self) {
        let outcomes = futures::future::join_all(
            self.queries
                .iter()
                .map(|query| self.service.refresh(query.clone())),
        )
        .await;

        let resolved = outcomes.iter().filter(|outcome| outcome.is_ok()).count();
        let failed = outcomes.len() - resolved;

        for (query, outcome) in self.queries.iter().zip(&outcomes) {
            if let Err(failure) = outcome {
                tracing::warn!("Poll of {} failed: {}", query, failure);
            }
        }

        self.event_bus.emit(AppEvent::PollCompleted { resolved, failed });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blockpulse_models::Edition;

    fn bus() -> Arc<EventBus> {
        EventBus::new(true)
    }

    fn service() -> StatusService {
        use crate::errors::StatusError;
        use crate::upstream::{UpstreamFetch, UpstreamResponse};
        use blockpulse_config::{
            IconSettings, SourceEndpoint, SourceSettings, StatusSettings, UpstreamSchema,
        };
        use bytes::Bytes;

        struct OnlineFetch;

        #[async_trait::async_trait]
        impl UpstreamFetch for OnlineFetch {
            async fn fetch(&self, _url: &str) -> Result<UpstreamResponse, StatusError> {
                Ok(UpstreamResponse {
                    status: 200,
                    body: Bytes::from_static(br#"{"online": false}"#),
                })
            }
        }

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
        StatusService::new(&status, sources, &IconSettings::default(), Arc::new(OnlineFetch))
    }

    #[test]
    fn disabled_interval_yields_no_poller() {
        let queries = vec![ServerQuery::new("play.example.com", Edition::Java)];
        assert!(StatusPoller::new(service(), queries, 0, bus()).is_none());
    }

    #[test]
    fn empty_poll_set_yields_no_poller() {
        assert!(StatusPoller::new(service(), Vec::new(), 300, bus()).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_stops_the_loop() {
        let queries = vec![ServerQuery::new("play.example.com", Edition::Java)];
        let poller = StatusPoller::new(service(), queries, 300, bus()).unwrap();

        let (tx, rx) = broadcast::channel(1);
        let handle = tokio::spawn(poller.run(rx));

        tokio::time::sleep(Duration::from_millis(10)).await;
        tx.send(()).unwrap();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn sweep_runs_once_per_interval() {
        let queries = vec![ServerQuery::new("play.example.com", Edition::Java)];
        let service = service();
        let poller = StatusPoller::new(service.clone(), queries.clone(), 300, bus()).unwrap();

        let (tx, rx) = broadcast::channel(1);
        let handle = tokio::spawn(poller.run(rx));

        // One interval elapses, so one sweep has stored an outcome.
        tokio::time::sleep(Duration::from_secs(301)).await;
        tx.send(()).unwrap();
        handle.await.unwrap();

        let outcome = service.resolve(queries[0].clone()).await;
        assert!(!outcome.unwrap().online);
    }
}
