use serde::{Deserialize, Serialize};
use std::fmt;

/// The two mutually incompatible server families. Each edition has its own
/// upstream endpoint list and response schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Edition {
    #[serde(alias = "primary")]
    Java,
    #[serde(alias = "alternate")]
    Bedrock,
}

impl Default for Edition {
    fn default() -> Self {
        Edition::Java
    }
}

impl fmt::Display for Edition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Edition::Java => write!(f, "java"),
            Edition::Bedrock => write!(f, "bedrock"),
        }
    }
}

impl Edition {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "java" | "primary" => Some(Edition::Java),
            "bedrock" | "alternate" => Some(Edition::Bedrock),
            _ => None,
        }
    }
}

/// Cache and throttle key for one tracked server. The address is an opaque
/// host[:port] or domain string; it is forwarded to upstreams, never parsed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ServerQuery {
    pub address: String,
    #[serde(rename = "type", default)]
    pub edition: Edition,
}

impl ServerQuery {
    pub fn new(address: impl Into<String>, edition: Edition) -> Self {
        Self {
            address: address.into(),
            edition,
        }
    }
}

impl fmt::Display for ServerQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.address, self.edition)
    }
}

/// Canonical decoded server status. Field names match the wire format the
/// UI layer consumes; absent fields are omitted from the JSON payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatusResult {
    pub online: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub players_online: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub players_max: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub player_list: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Plain-text MOTD with all styling stripped.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub motd: Option<String>,
    /// HTML-rendered MOTD with color and style spans.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub motd_html: Option<String>,
    /// Opaque icon handle: a cache file path or a fallback URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server_icon: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
}

/// Placeholder MOTD for servers that report offline without a message.
pub const OFFLINE_MOTD: &str = "Server is currently offline";

impl StatusResult {
    pub fn offline() -> Self {
        Self {
            online: false,
            motd: Some(OFFLINE_MOTD.to_string()),
            motd_html: Some(OFFLINE_MOTD.to_string()),
            ..Default::default()
        }
    }

    /// Applies the offline-placeholder invariant after decoding.
    pub fn fill_offline_defaults(&mut self) {
        if !self.online && self.motd.is_none() {
            self.motd = Some(OFFLINE_MOTD.to_string());
            self.motd_html = Some(OFFLINE_MOTD.to_string());
        }
    }
}

/// Classification of a failed resolution, mirroring the error taxonomy of
/// the status engine. Cloneable so failures can be cached like successes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Transport,
    RateLimited,
    MalformedResponse,
    AllSourcesExhausted,
    AllSourcesRateLimited,
}

/// Typed error result handed to callers instead of an exception. The UI is
/// expected to render a degraded "unavailable" state from this.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl fmt::Display for StatusFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edition_parses_names_and_aliases() {
        assert_eq!(Edition::parse("primary"), Some(Edition::Java));
        assert_eq!(Edition::parse("alternate"), Some(Edition::Bedrock));
        assert_eq!(Edition::parse("java"), Some(Edition::Java));
        assert_eq!(Edition::parse("modded"), None);
    }

    #[test]
    fn offline_defaults_only_fill_missing_motd() {
        let mut status = StatusResult {
            online: false,
            motd: Some("maintenance".to_string()),
            ..Default::default()
        };
        status.fill_offline_defaults();
        assert_eq!(status.motd.as_deref(), Some("maintenance"));

        let mut status = StatusResult::default();
        status.fill_offline_defaults();
        assert_eq!(status.motd.as_deref(), Some(OFFLINE_MOTD));
        assert_eq!(status.motd_html.as_deref(), Some(OFFLINE_MOTD));
    }
}
