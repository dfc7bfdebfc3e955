use serde::Serialize;

/// A tracked server row, synced from configuration at startup.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct ServerRow {
    pub id: i64,
    pub name: String,
    pub address: String,
    pub edition: String,
    pub sort_weight: i64,
    pub show_player_history: bool,
    pub show_ip: bool,
    pub ip_description: String,
}

/// One stored player-count sample. The list is kept as JSON text.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct HistoryRecord {
    pub id: i64,
    pub player_count: i64,
    pub player_list: Option<String>,
    pub record_time: String,
}

/// Bucketed averages ready for charting. `labels[i]` pairs with `values[i]`.
#[derive(Debug, Clone, Serialize)]
pub struct ChartSeries {
    pub labels: Vec<String>,
    pub values: Vec<i64>,
}

/// Compacted raw samples: only change points survive, plus the first and
/// last sample of the range.
#[derive(Debug, Clone, Serialize)]
pub struct RawSeries {
    pub labels: Vec<String>,
    pub values: Vec<i64>,
    #[serde(rename = "playerLists")]
    pub player_lists: Vec<Option<Vec<String>>>,
}
