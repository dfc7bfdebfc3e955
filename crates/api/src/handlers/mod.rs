mod history;
mod status;

use crate::errors::ApiError;
use crate::models::{ApiParams, AppState, Envelope};
use axum::extract::{Query, State};
use axum::response::{IntoResponse, Response};
use blockpulse_history::ServerRow;
use blockpulse_models::Edition;

/// Single API endpoint, dispatched on the `action` query parameter.
pub async fn dispatch(
    State(state): State<AppState>,
    Query(params): Query<ApiParams>,
) -> Result<Response, ApiError> {
    tracing::debug!("API request: action={}", params.action);

    match params.action.as_str() {
        "get_server_status" => status::get_server_status(state, params)
            .await
            .map(IntoResponse::into_response),
        "get_servers_status_parallel" => status::get_servers_status_parallel(state, params)
            .await
            .map(IntoResponse::into_response),
        "get_player_history" => history::get_player_history(state, params)
            .await
            .map(IntoResponse::into_response),
        "get_raw_player_history" => history::get_raw_player_history(state, params)
            .await
            .map(IntoResponse::into_response),
        other => Err(ApiError::UnknownAction(other.to_string())),
    }
}

/// Root listing of the tracked servers, in display order.
pub async fn list_servers(
    State(state): State<AppState>,
) -> Result<Envelope<Vec<ServerRow>>, ApiError> {
    let servers = state.history.list_servers().await?;
    Ok(Envelope::new(servers))
}

fn require_server(params: &ApiParams) -> Result<String, ApiError> {
    params
        .server
        .as_deref()
        .filter(|address| !address.is_empty())
        .map(str::to_string)
        .ok_or(ApiError::MissingParameter("server"))
}

fn parse_edition(raw: Option<&str>) -> Result<Edition, ApiError> {
    match raw {
        None => Ok(Edition::default()),
        Some(value) => Edition::parse(value).ok_or_else(|| ApiError::InvalidParameter {
            name: "type",
            reason: format!("unknown edition '{}'", value),
        }),
    }
}

/// History range in days. Zero means unbounded; anything else is clamped
/// to between a few minutes and thirty days.
fn clamp_days(days: f64) -> f64 {
    if !days.is_finite() {
        return 1.0;
    }
    if days == 0.0 {
        0.0
    } else {
        days.clamp(0.01, 30.0)
    }
}
