use blockpulse_models::{FailureKind, StatusFailure};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StatusError {
    #[error("Upstream request failed: {0}")]
    Transport(String),

    #[error("Upstream rate limited (HTTP 429)")]
    RateLimited,

    #[error("Malformed upstream response: {reason}")]
    Malformed { reason: String, excerpt: String },

    #[error("All upstream sources failed: {last_error}")]
    AllSourcesExhausted { last_error: String },

    #[error("All upstream sources are rate limited")]
    AllSourcesRateLimited,

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

// Convert reqwest errors to StatusError
impl From<reqwest::Error> for StatusError {
    fn from(err: reqwest::Error) -> Self {
        StatusError::Transport(err.to_string())
    }
}

impl StatusError {
    /// Builds a malformed-response error carrying a truncated raw excerpt
    /// for diagnostics.
    pub fn malformed(reason: impl Into<String>, raw: &[u8]) -> Self {
        const EXCERPT_LIMIT: usize = 200;
        let text = String::from_utf8_lossy(raw);
        let excerpt = if text.chars().count() > EXCERPT_LIMIT {
            let cut: String = text.chars().take(EXCERPT_LIMIT).collect();
            format!("{}...", cut)
        } else {
            text.into_owned()
        };
        StatusError::Malformed {
            reason: reason.into(),
            excerpt,
        }
    }

    /// Converts into the cloneable failure result handed to callers and
    /// stored in the cache.
    pub fn to_failure(&self) -> StatusFailure {
        let kind = match self {
            StatusError::Transport(_) | StatusError::IoError(_) => FailureKind::Transport,
            StatusError::RateLimited => FailureKind::RateLimited,
            StatusError::Malformed { .. } => FailureKind::MalformedResponse,
            StatusError::AllSourcesExhausted { .. } => FailureKind::AllSourcesExhausted,
            StatusError::AllSourcesRateLimited => FailureKind::AllSourcesRateLimited,
        };
        let message = match self {
            StatusError::Malformed { reason, excerpt } if !excerpt.is_empty() => {
                format!("Malformed upstream response: {} (raw: {})", reason, excerpt)
            }
            other => other.to_string(),
        };
        StatusFailure { kind, message }
    }
}
