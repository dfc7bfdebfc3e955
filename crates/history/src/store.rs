use super::errors::HistoryError;
use super::models::{ChartSeries, HistoryRecord, RawSeries, ServerRow};
use blockpulse_config::TrackedServer;
use chrono::{DateTime, Duration, Utc};
use sqlx::sqlite::SqlitePool;
use std::collections::BTreeSet;

type Result<T> = std::result::Result<T, HistoryError>;

/// Timestamps are stored as UTC text so they sort lexicographically and
/// feed straight into strftime bucketing.
const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

fn format_time(time: DateTime<Utc>) -> String {
    time.format(TIME_FORMAT).to_string()
}

/// SQLite-backed store for tracked servers and their player-count history.
#[derive(Clone)]
pub struct HistoryStore {
    pool: SqlitePool,
}

impl HistoryStore {
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = SqlitePool::connect(url).await?;
        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS servers (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                address TEXT NOT NULL UNIQUE,
                edition TEXT NOT NULL,
                sort_weight INTEGER NOT NULL DEFAULT 1000,
                show_player_history INTEGER NOT NULL DEFAULT 1,
                show_ip INTEGER NOT NULL DEFAULT 1,
                ip_description TEXT NOT NULL DEFAULT ''
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS player_history (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                server_id INTEGER NOT NULL REFERENCES servers(id),
                player_count INTEGER NOT NULL,
                player_list TEXT,
                record_time TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_player_history_server_time
             ON player_history (server_id, record_time)",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Upserts a configured server by address and returns its row id.
    pub async fn ensure_server(&self, server: &TrackedServer) -> Result<i64> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO servers (name, address, edition, sort_weight, show_player_history, show_ip, ip_description)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(address) DO UPDATE SET
                name = excluded.name,
                edition = excluded.edition,
                sort_weight = excluded.sort_weight,
                show_player_history = excluded.show_player_history,
                show_ip = excluded.show_ip,
                ip_description = excluded.ip_description
            RETURNING id
            "#,
        )
        .bind(&server.name)
        .bind(&server.address)
        .bind(server.edition.to_string())
        .bind(server.sort_weight)
        .bind(server.show_player_history)
        .bind(server.show_ip)
        .bind(&server.ip_description)
        .fetch_one(&self.pool)
        .await?;

        Ok(id)
    }

    pub async fn get_server_by_id(&self, id: i64) -> Result<Option<ServerRow>> {
        let row = sqlx::query_as::<_, ServerRow>(
            "SELECT id, name, address, edition, sort_weight, show_player_history, show_ip, ip_description
             FROM servers WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn get_server_by_address(&self, address: &str) -> Result<Option<ServerRow>> {
        let row = sqlx::query_as::<_, ServerRow>(
            "SELECT id, name, address, edition, sort_weight, show_player_history, show_ip, ip_description
             FROM servers WHERE address = ?",
        )
        .bind(address)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn list_servers(&self) -> Result<Vec<ServerRow>> {
        let rows = sqlx::query_as::<_, ServerRow>(
            "SELECT id, name, address, edition, sort_weight, show_player_history, show_ip, ip_description
             FROM servers ORDER BY sort_weight, name",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Records a player-count sample, coalescing with the most recent one.
    ///
    /// A sample equal to the latest stored one (same count, and same player
    /// set regardless of order when both carry a list) only advances that
    /// row's timestamp, so a stable population occupies one row per plateau
    /// instead of one per poll.
    pub async fn record(
        &self,
        server_id: i64,
        player_count: i64,
        player_list: Option<&[String]>,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let timestamp = format_time(now);

        let latest = sqlx::query_as::<_, HistoryRecord>(
            "SELECT id, player_count, player_list, record_time
             FROM player_history WHERE server_id = ?
             ORDER BY record_time DESC, id DESC LIMIT 1",
        )
        .bind(server_id)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(latest) = latest {
            if latest.player_count == player_count
                && lists_equal(latest.player_list.as_deref(), player_list)?
            {
                sqlx::query("UPDATE player_history SET record_time = ? WHERE id = ?")
                    .bind(&timestamp)
                    .bind(latest.id)
                    .execute(&self.pool)
                    .await?;
                tracing::debug!(
                    "Coalesced sample for server {} (count {})",
                    server_id,
                    player_count
                );
                return Ok(());
            }
        }

        let list_json = player_list.map(serde_json::to_string).transpose()?;
        sqlx::query(
            "INSERT INTO player_history (server_id, player_count, player_list, record_time)
             VALUES (?, ?, ?, ?)",
        )
        .bind(server_id)
        .bind(player_count)
        .bind(list_json)
        .bind(&timestamp)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Averaged player counts grouped into time buckets.
    ///
    /// Ranges up to seven days use hourly buckets, longer ranges daily
    /// ones. `days = 0` means the entire history, bucketed daily.
    pub async fn bucketed_series(
        &self,
        server_id: i64,
        days: f64,
        now: DateTime<Utc>,
    ) -> Result<ChartSeries> {
        let hourly = days > 0.0 && days <= 7.0;
        let bucket_format = if hourly { "%Y-%m-%d %H:00" } else { "%Y-%m-%d" };

        let rows: Vec<(String, i64)> = if days > 0.0 {
            let cutoff = format_time(now - Duration::seconds((days * 86400.0) as i64));
            sqlx::query_as(
                "SELECT strftime(?, record_time) AS bucket,
                        CAST(ROUND(AVG(player_count)) AS INTEGER) AS value
                 FROM player_history
                 WHERE server_id = ? AND record_time >= ?
                 GROUP BY bucket ORDER BY bucket",
            )
            .bind(bucket_format)
            .bind(server_id)
            .bind(cutoff)
            .fetch_all(&self.pool)
            .await?
        } else {
            sqlx::query_as(
                "SELECT strftime(?, record_time) AS bucket,
                        CAST(ROUND(AVG(player_count)) AS INTEGER) AS value
                 FROM player_history
                 WHERE server_id = ?
                 GROUP BY bucket ORDER BY bucket",
            )
            .bind(bucket_format)
            .bind(server_id)
            .fetch_all(&self.pool)
            .await?
        };

        let (labels, values) = rows.into_iter().unzip();
        Ok(ChartSeries { labels, values })
    }

    /// Raw samples for the range, compacted to change points. The first and
    /// last sample are always kept so the series spans the full range.
    pub async fn raw_series(
        &self,
        server_id: i64,
        days: f64,
        now: DateTime<Utc>,
    ) -> Result<RawSeries> {
        let rows: Vec<(i64, Option<String>, String)> = if days > 0.0 {
            let cutoff = format_time(now - Duration::seconds((days * 86400.0) as i64));
            sqlx::query_as(
                "SELECT player_count, player_list, record_time
                 FROM player_history
                 WHERE server_id = ? AND record_time >= ?
                 ORDER BY record_time, id",
            )
            .bind(server_id)
            .bind(cutoff)
            .fetch_all(&self.pool)
            .await?
        } else {
            sqlx::query_as(
                "SELECT player_count, player_list, record_time
                 FROM player_history
                 WHERE server_id = ?
                 ORDER BY record_time, id",
            )
            .bind(server_id)
            .fetch_all(&self.pool)
            .await?
        };

        let mut series = RawSeries {
            labels: Vec::new(),
            values: Vec::new(),
            player_lists: Vec::new(),
        };

        for (index, (count, list_json, time)) in rows.iter().enumerate() {
            let is_edge = index == 0 || index == rows.len() - 1;
            let is_change = index > 0 && rows[index - 1].0 != *count;
            if !is_edge && !is_change {
                continue;
            }

            let list = list_json
                .as_deref()
                .map(serde_json::from_str::<Vec<String>>)
                .transpose()?;
            series.labels.push(time.clone());
            series.values.push(*count);
            series.player_lists.push(list);
        }

        Ok(series)
    }
}

/// Order-insensitive comparison of stored and incoming player lists. A
/// sample without a list cannot contradict the stored one, so it compares
/// equal; a stored row without a list only matches an empty incoming list.
fn lists_equal(stored_json: Option<&str>, incoming: Option<&[String]>) -> Result<bool> {
    match (stored_json, incoming) {
        (_, None) => Ok(true),
        (None, Some(incoming)) => Ok(incoming.is_empty()),
        (Some(stored), Some(incoming)) => {
            let stored: Vec<String> = serde_json::from_str(stored)?;
            let stored: BTreeSet<&str> = stored.iter().map(String::as_str).collect();
            let incoming: BTreeSet<&str> = incoming.iter().map(String::as_str).collect();
            Ok(stored == incoming)
        }
    }
}
