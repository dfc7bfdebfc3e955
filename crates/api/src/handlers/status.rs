use super::{parse_edition, require_server};
use crate::errors::ApiError;
use crate::models::{ApiParams, AppState, Envelope, ParallelOutcome};
use blockpulse_models::{ServerQuery, StatusResult};
use std::collections::BTreeMap;

pub async fn get_server_status(
    state: AppState,
    params: ApiParams,
) -> Result<Envelope<StatusResult>, ApiError> {
    let address = require_server(&params)?;
    let edition = parse_edition(params.edition.as_deref())?;

    match state.status.resolve(ServerQuery::new(address, edition)).await {
        Ok(status) => Ok(Envelope::new(status)),
        Err(failure) => Err(ApiError::Upstream(failure)),
    }
}

/// Resolves a batch of servers concurrently and returns a map keyed by
/// address. Individual failures do not fail the request; a failed server
/// maps to an error marker instead of a status.
pub async fn get_servers_status_parallel(
    state: AppState,
    params: ApiParams,
) -> Result<Envelope<BTreeMap<String, ParallelOutcome>>, ApiError> {
    let raw = params
        .servers
        .as_deref()
        .ok_or(ApiError::MissingParameter("servers"))?;
    let queries: Vec<ServerQuery> =
        serde_json::from_str(raw).map_err(|err| ApiError::InvalidParameter {
            name: "servers",
            reason: err.to_string(),
        })?;
    if queries.is_empty() {
        return Err(ApiError::InvalidParameter {
            name: "servers",
            reason: "at least one server is required".to_string(),
        });
    }

    let outcomes = state.status.resolve_many(queries.clone()).await;

    let entries = queries
        .into_iter()
        .zip(outcomes)
        .map(|(query, outcome)| {
            let value = match outcome {
                Ok(status) => ParallelOutcome::Resolved(status),
                Err(failure) => ParallelOutcome::Failed {
                    success: false,
                    error: failure.message,
                },
            };
            (query.address, value)
        })
        .collect();

    Ok(Envelope::new(entries))
}
