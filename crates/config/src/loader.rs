use super::defaults::DEFAULT_CONFIG_TEMPLATE;
use super::errors::ConfigError;
use super::models::Config;
use blockpulse_events::{AppEvent, EventBus};
use std::path::Path;
use std::sync::Arc;

impl Config {
    /// Loads configuration from a file
    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        Self::from_file_with_events(path, None).await
    }

    /// Loads configuration from a file with optional event bus for notifications
    pub async fn from_file_with_events<P: AsRef<Path>>(
        path: P,
        events: Option<&Arc<EventBus>>,
    ) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        // Create default config if it doesn't exist
        if !path.exists() {
            create_default_config(path).await?;
            if let Some(events) = events {
                events.emit(AppEvent::ConfigCreated {
                    path: path.display().to_string(),
                });
            }
        }

        // Read and parse config
        let content = tokio::fs::read_to_string(path).await?;
        let config: Config = toml::from_str(&content)?;

        Ok(config)
    }
}

/// Creates a default configuration file
async fn create_default_config<P: AsRef<Path>>(path: P) -> Result<(), ConfigError> {
    tokio::fs::write(path, DEFAULT_CONFIG_TEMPLATE).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use blockpulse_models::Edition;

    #[test]
    fn default_template_parses() {
        let config: Config = toml::from_str(DEFAULT_CONFIG_TEMPLATE).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.status.cache_ttl_secs, 300);
        assert_eq!(config.status.request_interval_secs, 5);
        assert_eq!(config.icons.ttl_secs, 86400);
        assert_eq!(config.sources.java.len(), 1);
        assert_eq!(config.sources.bedrock.len(), 1);
        assert!(config.servers.is_empty());
    }

    #[test]
    fn tracked_server_defaults_apply() {
        let toml_src = r#"
            [server]
            host = "127.0.0.1"
            port = 9000
            base_url = "http://localhost:9000"

            [[servers]]
            name = "Survival"
            address = "play.example.com"
        "#;
        let config: Config = toml::from_str(toml_src).unwrap();
        let server = &config.servers[0];
        assert_eq!(server.edition, Edition::Java);
        assert_eq!(server.sort_weight, 1000);
        assert!(server.show_player_history);
        assert!(server.show_ip);
        assert!(server.ip_description.is_empty());
    }

    #[test]
    fn source_lists_preserve_priority_order() {
        let toml_src = r#"
            [server]
            host = "0.0.0.0"
            port = 8080
            base_url = "http://localhost:8080"

            [[sources.java]]
            name = "first"
            url = "https://one.example/status/"
            schema = "rich"

            [[sources.java]]
            name = "second"
            url = "https://two.example/raw/"
            schema = "simple"
        "#;
        let config: Config = toml::from_str(toml_src).unwrap();
        let java = config.sources.for_edition(Edition::Java);
        assert_eq!(java.len(), 2);
        assert_eq!(java[0].name, "first");
        assert_eq!(java[1].name, "second");
    }
}
