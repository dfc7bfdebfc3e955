/// Default values for configuration fields

use super::models::{SourceEndpoint, UpstreamSchema};

pub fn tcp_nodelay() -> bool {
    true
}

pub fn timeout_secs() -> u64 {
    60
}

pub fn max_concurrent_requests() -> usize {
    1000
}

pub fn allowed_origins() -> Vec<String> {
    vec!["*".to_string()]
}

pub fn enable_compression() -> bool {
    true
}

pub fn status_cache_ttl_secs() -> u64 {
    300 // Serve cached status for 5 minutes before hitting upstreams again
}

pub fn error_cache_ttl_secs() -> u64 {
    30 // Failed lookups are cached briefly to avoid retry storms
}

pub fn request_interval_secs() -> u64 {
    5 // Minimum spacing between upstream calls for the same server
}

pub fn connect_timeout_secs() -> u64 {
    5
}

pub fn request_timeout_secs() -> u64 {
    10
}

pub fn user_agent() -> String {
    "BlockPulse-Server-Status-Monitor/1.0".to_string()
}

pub fn poll_interval_secs() -> u64 {
    300 // Background history poll; 0 disables the loop
}

pub fn icon_cache_dir() -> String {
    "icon_cache".to_string()
}

pub fn icon_ttl_secs() -> u64 {
    86400 // Icons change rarely; keep for 24 hours
}

pub fn icon_endpoint() -> String {
    "https://api.mcsrvstat.us/icon/".to_string()
}

pub fn database_url() -> String {
    "sqlite://blockpulse.db?mode=rwc".to_string()
}

pub fn sort_weight() -> i64 {
    1000
}

pub fn show_player_history() -> bool {
    true
}

pub fn show_ip() -> bool {
    true
}

pub fn java_sources() -> Vec<SourceEndpoint> {
    vec![SourceEndpoint {
        name: "mcsrvstat".to_string(),
        url: "https://api.mcsrvstat.us/3/".to_string(),
        schema: UpstreamSchema::Simple,
    }]
}

pub fn bedrock_sources() -> Vec<SourceEndpoint> {
    vec![SourceEndpoint {
        name: "mcsrvstat-bedrock".to_string(),
        url: "https://api.mcsrvstat.us/bedrock/3/".to_string(),
        schema: UpstreamSchema::Simple,
    }]
}

pub const DEFAULT_CONFIG_TEMPLATE: &str = r#"# ===============================================================================
# BlockPulse Configuration
# ===============================================================================

[server]
# Network
host = "0.0.0.0"                     # Server bind address (0.0.0.0 = all interfaces)
port = 8080                          # Server port
base_url = "http://localhost:8080"   # Public base URL

# Performance
tcp_nodelay = true                   # Disable Nagle's algorithm (lower latency)
timeout_secs = 60                    # Request timeout in seconds
max_concurrent_requests = 1000       # Max simultaneous connections
enable_compression = true            # HTTP compression (gzip/brotli/deflate)

# CORS
allowed_origins = ["*"]              # "*" = all origins | ["https://example.com"] for production

[status]
cache_ttl_secs = 300                 # How long a resolved status is served from cache
error_cache_ttl_secs = 30            # How long a failed lookup is cached
request_interval_secs = 5            # Minimum spacing between upstream calls per server
connect_timeout_secs = 5             # Upstream connect timeout
request_timeout_secs = 10            # Upstream total timeout
poll_interval_secs = 300             # Background history poll interval (0 = disabled)

[icons]
cache_dir = "icon_cache"             # On-disk icon cache directory
ttl_secs = 86400                     # Icon cache lifetime (24 hours)
endpoint = "https://api.mcsrvstat.us/icon/"

[database]
url = "sqlite://blockpulse.db?mode=rwc"

# ===============================================================================
# UPSTREAM STATUS SOURCES
# ===============================================================================
# Tried strictly in the order listed. A source is skipped on transport errors,
# HTTP 429, or an empty body; the first success wins.

[[sources.java]]
name = "mcsrvstat"
url = "https://api.mcsrvstat.us/3/"
schema = "simple"                    # "simple" or "rich"

[[sources.bedrock]]
name = "mcsrvstat-bedrock"
url = "https://api.mcsrvstat.us/bedrock/3/"
schema = "simple"

# ===============================================================================
# TRACKED SERVERS
# ===============================================================================

#[[servers]]
#name = "Survival"                   # Display name
#address = "play.example.com"        # host[:port] forwarded to upstreams as-is
#edition = "java"                    # "java" or "bedrock"
#sort_weight = 1000                  # Lower sorts first in listings
#show_player_history = true          # Record and expose player-count history
#show_ip = true                      # Expose the address in listings
#ip_description = ""                 # Text shown instead of the address when hidden
"#;
