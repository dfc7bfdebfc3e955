use anyhow::Result;
use blockpulse_config::Config;
use blockpulse_events::{AppEvent, EventBus};
use std::sync::Arc;

pub async fn load(config_path: &str, events: &Arc<EventBus>) -> Result<Config> {
    events.emit(AppEvent::ConfigLoading {
        path: config_path.to_string(),
    });

    let config = Config::from_file_with_events(config_path, Some(events)).await?;

    events.emit(AppEvent::ConfigLoaded {
        servers_count: config.servers.len(),
    });
    events.emit(AppEvent::SourcesLoaded {
        java: config.sources.java.len(),
        bedrock: config.sources.bedrock.len(),
    });

    Ok(config)
}
