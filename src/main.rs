mod bootstrap;

use crate::bootstrap::{config, logging, observer::HistoryRecorder, router};
use anyhow::Result;
use blockpulse_api::AppState;
use blockpulse_events::{AppEvent, EventBus};
use blockpulse_history::HistoryStore;
use blockpulse_models::ServerQuery;
use blockpulse_status::{StatusPoller, StatusService, UpstreamClient};
use std::sync::Arc;
use tokio::sync::broadcast;

#[tokio::main]
async fn main() -> Result<()> {
    logging::initialize();

    let events = EventBus::new(false);
    events.emit(AppEvent::Starting);

    let config_path =
        std::env::var("BLOCKPULSE_CONFIG").unwrap_or_else(|_| "config.toml".to_string());
    let config = config::load(&config_path, &events).await?;

    let history = HistoryStore::connect(&config.database.url).await?;
    events.emit(AppEvent::DatabaseReady {
        url: config.database.url.clone(),
    });

    for server in &config.servers {
        history.ensure_server(server).await?;
        events.emit(AppEvent::ServerRegistered {
            name: server.name.clone(),
            address: server.address.clone(),
        });
    }

    let fetcher = Arc::new(UpstreamClient::new(&config.status)?);
    let status = StatusService::new(
        &config.status,
        config.sources.clone(),
        &config.icons,
        fetcher,
    )
    .with_observer(Arc::new(HistoryRecorder::new(history.clone())));

    status.init().await?;
    events.emit(AppEvent::IconCacheDir {
        path: config.icons.cache_dir.clone(),
    });

    let (shutdown_tx, _) = broadcast::channel(1);
    let poll_queries: Vec<ServerQuery> = config
        .servers
        .iter()
        .map(|server| ServerQuery::new(server.address.clone(), server.edition))
        .collect();
    let poller_handle = StatusPoller::new(
        status.clone(),
        poll_queries,
        config.status.poll_interval_secs,
        Arc::clone(&events),
    )
    .map(|poller| tokio::spawn(poller.run(shutdown_tx.subscribe())));

    let app_state = AppState {
        status,
        history,
    };
    let app = router::build(&config, app_state);
    let addr = format!("{}:{}", config.server.host, config.server.port);

    let listener = bind_server(&addr).await?;

    events.emit(AppEvent::Ready {
        addr: addr.clone(),
        base_url: config.server.base_url.clone(),
    });

    let shutdown_signal = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
        tracing::info!("Shutdown signal received, initiating graceful shutdown...");
    };

    axum::serve(listener, app.into_make_service())
        .tcp_nodelay(config.server.tcp_nodelay)
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    // Stop the poller before reporting shutdown.
    let _ = shutdown_tx.send(());
    if let Some(handle) = poller_handle {
        let _ = handle.await;
    }

    events.emit(AppEvent::Shutdown);
    Ok(())
}

async fn bind_server(addr: &str) -> Result<tokio::net::TcpListener> {
    tokio::net::TcpListener::bind(addr).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::AddrInUse {
            let port = addr.split(':').last().unwrap_or("unknown");
            tracing::error!("Port {} is already in use", port);
            tracing::error!("Stop the other application or change the port in config.toml");
        } else {
            tracing::error!("Failed to bind server on {}: {}", addr, e);
        }
        anyhow::anyhow!("Failed to bind server: {}", e)
    })
}
