use crate::models::ErrorEnvelope;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use blockpulse_models::{FailureKind, StatusFailure};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Unknown action: {0}")]
    UnknownAction(String),

    #[error("Missing parameter: {0}")]
    MissingParameter(&'static str),

    #[error("Invalid parameter '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("Unknown server: {0}")]
    ServerNotFound(String),

    #[error("Player history is disabled for: {0}")]
    HistoryDisabled(String),

    #[error("{0}")]
    Upstream(StatusFailure),

    #[error("History error: {0}")]
    History(#[from] blockpulse_history::HistoryError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::UnknownAction(_)
            | ApiError::MissingParameter(_)
            | ApiError::InvalidParameter { .. } => StatusCode::BAD_REQUEST,
            ApiError::ServerNotFound(_) => StatusCode::NOT_FOUND,
            ApiError::HistoryDisabled(_) => StatusCode::FORBIDDEN,
            ApiError::Upstream(failure) => match failure.kind {
                FailureKind::RateLimited | FailureKind::AllSourcesRateLimited => {
                    StatusCode::TOO_MANY_REQUESTS
                }
                _ => StatusCode::BAD_GATEWAY,
            },
            ApiError::History(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            tracing::error!("API request failed: {}", self);
        }

        let envelope = ErrorEnvelope {
            success: false,
            error: self.to_string(),
        };
        (status, Json(envelope)).into_response()
    }
}
