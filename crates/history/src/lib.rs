//! Player-history persistence: tracked server registry, coalesced
//! player-count samples and the chart series derived from them.

mod errors;
mod models;
mod store;

pub use errors::HistoryError;
pub use models::{ChartSeries, HistoryRecord, RawSeries, ServerRow};
pub use store::HistoryStore;
