use blockpulse_history::HistoryStore;
use blockpulse_models::{ServerQuery, StatusResult};
use blockpulse_status::StatusObserver;
use chrono::Utc;

/// Feeds freshly resolved statuses into the player-history store. Only
/// tracked servers with history enabled produce samples.
pub struct HistoryRecorder {
    store: HistoryStore,
}

impl HistoryRecorder {
    pub fn new(store: HistoryStore) -> Self {
        Self { store }
    }
}

#[async_trait::async_trait]
impl StatusObserver for HistoryRecorder {
    async fn status_resolved(&self, query: &ServerQuery, status: &StatusResult) {
        if !status.online {
            return;
        }

        let server = match self.store.get_server_by_address(&query.address).await {
            Ok(Some(server)) if server.show_player_history => server,
            Ok(_) => return,
            Err(err) => {
                tracing::error!("History lookup for {} failed: {}", query.address, err);
                return;
            }
        };

        let count = i64::from(status.players_online.unwrap_or(0));
        let list = status.player_list.as_deref();
        if let Err(err) = self.store.record(server.id, count, list, Utc::now()).await {
            tracing::error!("Recording history for {} failed: {}", query.address, err);
        }
    }
}
