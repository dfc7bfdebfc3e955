use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum AppEvent {
    // Application lifecycle
    Starting,
    Ready { addr: String, base_url: String },
    Shutdown,

    // Configuration
    ConfigLoading { path: String },
    ConfigLoaded { servers_count: usize },
    ConfigCreated { path: String },
    ConfigError { error: String },

    // Upstream sources
    SourcesLoaded { java: usize, bedrock: usize },

    // Persistence
    DatabaseReady { url: String },
    ServerRegistered { name: String, address: String },

    // Icon cache
    IconCacheDir { path: String },

    // Background polling
    PollingEnabled { interval: u64 },
    PollCompleted { resolved: usize, failed: usize },

    // Errors
    Error { context: String, error: String },
}

pub struct EventBus {
    pub(super) silent_mode: bool,
}
