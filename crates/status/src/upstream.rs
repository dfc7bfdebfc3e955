use super::errors::StatusError;
use blockpulse_config::StatusSettings;
use bytes::Bytes;
use std::time::Duration;

type Result<T> = std::result::Result<T, StatusError>;

/// Raw reply from one upstream endpoint, before any schema decoding.
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: u16,
    pub body: Bytes,
}

impl UpstreamResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_rate_limited(&self) -> bool {
        self.status == 429
    }
}

/// Transport seam for upstream HTTP calls. The router and the icon resolver
/// go through this trait so tests can script upstream behavior.
#[async_trait::async_trait]
pub trait UpstreamFetch: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<UpstreamResponse>;
}

/// reqwest-backed client with bounded connect and total timeouts.
pub struct UpstreamClient {
    client: reqwest::Client,
}

impl UpstreamClient {
    pub fn new(settings: &StatusSettings) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(settings.connect_timeout_secs))
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .user_agent(settings.user_agent.clone())
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait::async_trait]
impl UpstreamFetch for UpstreamClient {
    async fn fetch(&self, url: &str) -> Result<UpstreamResponse> {
        let response = self.client.get(url).send().await?;
        let status = response.status().as_u16();
        let body = response.bytes().await?;
        Ok(UpstreamResponse { status, body })
    }
}
