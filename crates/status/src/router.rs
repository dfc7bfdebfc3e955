use super::errors::StatusError;
use super::upstream::UpstreamFetch;
use blockpulse_config::{SourceEndpoint, SourceSettings};
use blockpulse_models::ServerQuery;
use bytes::Bytes;
use std::sync::Arc;

type Result<T> = std::result::Result<T, StatusError>;

/// A usable upstream body together with the source that produced it, so the
/// caller can pick the matching schema decoder.
#[derive(Debug, Clone)]
pub struct RoutedResponse {
    pub body: Bytes,
    pub source: SourceEndpoint,
}

/// Tries the edition's upstream endpoints strictly in priority order until
/// one yields a non-empty success body. Retry is by failover only; a single
/// candidate is never retried.
pub struct SourceRouter {
    sources: SourceSettings,
    fetcher: Arc<dyn UpstreamFetch>,
}

impl SourceRouter {
    pub fn new(sources: SourceSettings, fetcher: Arc<dyn UpstreamFetch>) -> Self {
        Self { sources, fetcher }
    }

    pub async fn resolve(&self, query: &ServerQuery) -> Result<RoutedResponse> {
        let candidates = self.sources.for_edition(query.edition);
        if candidates.is_empty() {
            return Err(StatusError::AllSourcesExhausted {
                last_error: format!("no upstream sources configured for {}", query.edition),
            });
        }

        let mut last_error = StatusError::AllSourcesExhausted {
            last_error: "unreachable".to_string(),
        };

        for source in candidates {
            let url = format!("{}{}", source.url, query.address);
            tracing::debug!("Trying source '{}' for {}: {}", source.name, query, url);

            match self.fetcher.fetch(&url).await {
                Ok(response) if response.is_rate_limited() => {
                    tracing::warn!("Source '{}' rate limited (HTTP 429), failing over", source.name);
                    last_error = StatusError::RateLimited;
                }
                Ok(response) if !response.is_success() => {
                    tracing::warn!(
                        "Source '{}' returned HTTP {}, failing over",
                        source.name,
                        response.status
                    );
                    last_error =
                        StatusError::Transport(format!("HTTP {} from {}", response.status, source.name));
                }
                Ok(response) if response.body.is_empty() => {
                    tracing::warn!("Source '{}' returned an empty body, failing over", source.name);
                    last_error = StatusError::Transport(format!("empty response from {}", source.name));
                }
                Ok(response) => {
                    tracing::debug!(
                        "Source '{}' answered with {} bytes",
                        source.name,
                        response.body.len()
                    );
                    return Ok(RoutedResponse {
                        body: response.body,
                        source: source.clone(),
                    });
                }
                Err(err) => {
                    tracing::warn!("Source '{}' failed: {}, failing over", source.name, err);
                    last_error = err;
                }
            }
        }

        // A 429 on the final candidate gets the distinguished error so
        // callers can apply a longer backoff.
        match last_error {
            StatusError::RateLimited => Err(StatusError::AllSourcesRateLimited),
            other => Err(StatusError::AllSourcesExhausted {
                last_error: other.to_string(),
            }),
        }
    }
}
