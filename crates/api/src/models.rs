use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use blockpulse_history::HistoryStore;
use blockpulse_models::StatusResult;
use blockpulse_status::StatusService;
use serde::{Deserialize, Serialize};

#[derive(Clone)]
pub struct AppState {
    pub status: StatusService,
    pub history: HistoryStore,
}

/// Query string of the single API endpoint. Which fields are required
/// depends on the action.
#[derive(Debug, Deserialize)]
pub struct ApiParams {
    pub action: String,
    /// Server address for the status actions.
    pub server: Option<String>,
    #[serde(rename = "type")]
    pub edition: Option<String>,
    /// Tracked server id for the history actions.
    pub server_id: Option<i64>,
    pub days: Option<f64>,
    /// JSON array of `{address, type}` objects for the parallel action.
    pub servers: Option<String>,
}

/// Success envelope. Everything the API returns is wrapped in
/// `{"success": ..., "data"/"error": ...}`.
#[derive(Debug, Serialize)]
pub struct Envelope<T: Serialize> {
    pub success: bool,
    pub data: T,
}

impl<T: Serialize> Envelope<T> {
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

impl<T: Serialize> IntoResponse for Envelope<T> {
    fn into_response(self) -> Response {
        match serde_json::to_string(&self) {
            Ok(body) => (
                StatusCode::OK,
                [(header::CONTENT_TYPE, "application/json")],
                body,
            )
                .into_response(),
            // The envelope itself failed to encode. Degrade to plain text
            // rather than an empty reply.
            Err(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                [(header::CONTENT_TYPE, "text/plain")],
                format!("Response encoding failed: {}", err),
            )
                .into_response(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorEnvelope {
    pub success: bool,
    pub error: String,
}

/// One value of the parallel status map: the resolved status, or an error
/// marker for that server alone.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ParallelOutcome {
    Resolved(StatusResult),
    Failed { success: bool, error: String },
}
