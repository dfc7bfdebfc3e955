use super::clamp_days;
use crate::errors::ApiError;
use crate::models::{ApiParams, AppState, Envelope};
use blockpulse_history::{ChartSeries, RawSeries, ServerRow};
use chrono::Utc;

pub async fn get_player_history(
    state: AppState,
    params: ApiParams,
) -> Result<Envelope<ChartSeries>, ApiError> {
    let server = lookup_server(&state, &params).await?;
    let days = clamp_days(params.days.unwrap_or(1.0));

    let series = state
        .history
        .bucketed_series(server.id, days, Utc::now())
        .await?;
    Ok(Envelope::new(series))
}

pub async fn get_raw_player_history(
    state: AppState,
    params: ApiParams,
) -> Result<Envelope<RawSeries>, ApiError> {
    let server = lookup_server(&state, &params).await?;
    let days = clamp_days(params.days.unwrap_or(1.0));

    let series = state.history.raw_series(server.id, days, Utc::now()).await?;
    Ok(Envelope::new(series))
}

/// History actions only serve servers that are tracked and have history
/// enabled.
async fn lookup_server(state: &AppState, params: &ApiParams) -> Result<ServerRow, ApiError> {
    let id = params
        .server_id
        .ok_or(ApiError::MissingParameter("server_id"))?;
    let server = state
        .history
        .get_server_by_id(id)
        .await?
        .ok_or_else(|| ApiError::ServerNotFound(id.to_string()))?;
    if !server.show_player_history {
        return Err(ApiError::HistoryDisabled(server.address.clone()));
    }
    Ok(server)
}
