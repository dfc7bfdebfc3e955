use blockpulse_models::Edition;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub server: ServerSettings,
    #[serde(default)]
    pub status: StatusSettings,
    #[serde(default)]
    pub icons: IconSettings,
    #[serde(default)]
    pub database: DatabaseSettings,
    #[serde(default)]
    pub sources: SourceSettings,
    #[serde(default)]
    #[serde(deserialize_with = "deserialize_arc_servers")]
    #[serde(serialize_with = "serialize_arc_servers")]
    pub servers: Vec<Arc<TrackedServer>>,
}

// Custom deserializer to wrap TrackedServer in Arc
fn deserialize_arc_servers<'de, D>(deserializer: D) -> Result<Vec<Arc<TrackedServer>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let servers: Vec<TrackedServer> = Vec::deserialize(deserializer)?;
    Ok(servers.into_iter().map(Arc::new).collect())
}

// Custom serializer to unwrap Arc<TrackedServer>
fn serialize_arc_servers<S>(servers: &Vec<Arc<TrackedServer>>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    use serde::ser::SerializeSeq;
    let mut seq = serializer.serialize_seq(Some(servers.len()))?;
    for server in servers {
        seq.serialize_element(server.as_ref())?;
    }
    seq.end()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub base_url: String,
    #[serde(default = "super::defaults::tcp_nodelay")]
    pub tcp_nodelay: bool,
    #[serde(default = "super::defaults::timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "super::defaults::allowed_origins")]
    pub allowed_origins: Vec<String>,
    #[serde(default = "super::defaults::max_concurrent_requests")]
    pub max_concurrent_requests: usize,
    #[serde(default = "super::defaults::enable_compression")]
    pub enable_compression: bool,
}

/// Tuning for the status resolution engine: cache TTLs, throttle spacing,
/// upstream timeouts and the background poll interval.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StatusSettings {
    #[serde(default = "super::defaults::status_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
    #[serde(default = "super::defaults::error_cache_ttl_secs")]
    pub error_cache_ttl_secs: u64,
    #[serde(default = "super::defaults::request_interval_secs")]
    pub request_interval_secs: u64,
    #[serde(default = "super::defaults::connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    #[serde(default = "super::defaults::request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "super::defaults::user_agent")]
    pub user_agent: String,
    #[serde(default = "super::defaults::poll_interval_secs")]
    pub poll_interval_secs: u64,
}

impl Default for StatusSettings {
    fn default() -> Self {
        Self {
            cache_ttl_secs: super::defaults::status_cache_ttl_secs(),
            error_cache_ttl_secs: super::defaults::error_cache_ttl_secs(),
            request_interval_secs: super::defaults::request_interval_secs(),
            connect_timeout_secs: super::defaults::connect_timeout_secs(),
            request_timeout_secs: super::defaults::request_timeout_secs(),
            user_agent: super::defaults::user_agent(),
            poll_interval_secs: super::defaults::poll_interval_secs(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct IconSettings {
    #[serde(default = "super::defaults::icon_cache_dir")]
    pub cache_dir: String,
    #[serde(default = "super::defaults::icon_ttl_secs")]
    pub ttl_secs: u64,
    #[serde(default = "super::defaults::icon_endpoint")]
    pub endpoint: String,
}

impl Default for IconSettings {
    fn default() -> Self {
        Self {
            cache_dir: super::defaults::icon_cache_dir(),
            ttl_secs: super::defaults::icon_ttl_secs(),
            endpoint: super::defaults::icon_endpoint(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseSettings {
    #[serde(default = "super::defaults::database_url")]
    pub url: String,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            url: super::defaults::database_url(),
        }
    }
}

/// Response schema family a source speaks. Selected explicitly per source
/// so malformed fields surface as typed decode errors instead of nulls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UpstreamSchema {
    Simple,
    Rich,
}

/// One upstream status-lookup endpoint. The server address is appended to
/// `url` when building the request.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SourceEndpoint {
    pub name: String,
    pub url: String,
    pub schema: UpstreamSchema,
}

/// Ordered endpoint lists per edition, tried strictly in priority order.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SourceSettings {
    #[serde(default = "super::defaults::java_sources")]
    pub java: Vec<SourceEndpoint>,
    #[serde(default = "super::defaults::bedrock_sources")]
    pub bedrock: Vec<SourceEndpoint>,
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            java: super::defaults::java_sources(),
            bedrock: super::defaults::bedrock_sources(),
        }
    }
}

impl SourceSettings {
    pub fn for_edition(&self, edition: Edition) -> &[SourceEndpoint] {
        match edition {
            Edition::Java => &self.java,
            Edition::Bedrock => &self.bedrock,
        }
    }
}

/// A monitored server definition, synced into the database at startup.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TrackedServer {
    pub name: String,
    pub address: String,
    #[serde(default)]
    pub edition: Edition,
    #[serde(default = "super::defaults::sort_weight")]
    pub sort_weight: i64,
    #[serde(default = "super::defaults::show_player_history")]
    pub show_player_history: bool,
    #[serde(default = "super::defaults::show_ip")]
    pub show_ip: bool,
    #[serde(default)]
    pub ip_description: String,
}
