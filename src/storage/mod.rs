//! Historical signal store (read-only).
//!
//! Queries the signals database owned by the upstream generator. This crate
//! never writes to it: the two queries below feed the engine bulk loads at
//! startup, and a failed query degrades to zero rows at the call site.

use anyhow::{Context, Result};
use sqlx::sqlite::SqlitePool;
use sqlx::Row;
use tracing::{info, warn};

use crate::config::StoreConfig;
use crate::types::{ConvergenceAggregate, Direction, Outcome, OutcomeEvent};

/// Read-only handle on the external signals database.
pub struct SignalStore {
    pool: SqlitePool,
}

impl SignalStore {
    /// Open the signals database.
    pub async fn connect(config: &StoreConfig) -> Result<Self> {
        let pool = SqlitePool::connect(&config.database_url)
            .await
            .with_context(|| format!("Failed to open signals database: {}", config.database_url))?;
        Ok(Self { pool })
    }

    /// Wrap an existing pool (tests, shared connections).
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Per-token convergence aggregates over a trailing window, filtered to
    /// tokens with at least `min_samples` signals. Wins and draws count as
    /// converged; timing comes from the created→closed interval, with
    /// never-closed tokens defaulting to a slow 3600s average.
    pub async fn convergence_aggregates(
        &self,
        window_days: i64,
        min_samples: i64,
    ) -> Result<Vec<ConvergenceAggregate>> {
        let window = format!("-{window_days} days");

        let rows = sqlx::query(
            r#"
            SELECT
                token,
                COUNT(*) AS total,
                SUM(CASE WHEN outcome IN ('win', 'draw') THEN 1 ELSE 0 END) AS converged,
                CAST(COALESCE(AVG(CASE WHEN closed_at IS NOT NULL
                    THEN CAST((julianday(closed_at) - julianday(created_at)) * 86400 AS INTEGER)
                    ELSE NULL END), 3600) AS REAL) AS avg_time,
                CAST(COALESCE(MIN(CASE WHEN closed_at IS NOT NULL
                    THEN CAST((julianday(closed_at) - julianday(created_at)) * 86400 AS INTEGER)
                    ELSE NULL END), 0) AS REAL) AS min_time,
                CAST(COALESCE(MAX(CASE WHEN closed_at IS NOT NULL
                    THEN CAST((julianday(closed_at) - julianday(created_at)) * 86400 AS INTEGER)
                    ELSE NULL END), 0) AS REAL) AS max_time,
                CAST(COALESCE(AVG(CASE WHEN outcome = 'win' THEN price_change_percent ELSE 0 END), 0) AS REAL) AS avg_profit
            FROM signals
            WHERE created_at > datetime('now', ?1)
            GROUP BY token
            HAVING total >= ?2
            "#,
        )
        .bind(&window)
        .bind(min_samples)
        .fetch_all(&self.pool)
        .await
        .context("Convergence aggregate query failed")?;

        let mut aggregates = Vec::with_capacity(rows.len());
        for row in &rows {
            aggregates.push(ConvergenceAggregate {
                symbol: row.try_get("token")?,
                total_signals: row.try_get::<i64, _>("total")? as u64,
                converged_signals: row.try_get::<i64, _>("converged")? as u64,
                avg_time_secs: row.try_get("avg_time")?,
                fastest_secs: row.try_get("min_time")?,
                slowest_secs: row.try_get("max_time")?,
                avg_profit: row.try_get("avg_profit")?,
            });
        }

        info!(tokens = aggregates.len(), window_days, "Loaded convergence aggregates");
        Ok(aggregates)
    }

    /// Closed signals joined with their outcomes over a trailing window,
    /// newest first. Rows with unparseable direction or outcome strings
    /// are skipped, not fatal.
    pub async fn outcome_events(&self, window_days: i64) -> Result<Vec<OutcomeEvent>> {
        let window = format!("-{window_days} days");

        let rows = sqlx::query(
            r#"
            SELECT
                s.token,
                s.direction,
                so.outcome,
                CAST(COALESCE(so.price_change_percent, 0) AS REAL) AS pnl,
                CAST(COALESCE(CAST((julianday(s.closed_at) - julianday(s.created_at)) * 86400 AS INTEGER), 0) AS REAL) AS duration
            FROM signals s
            JOIN signal_outcomes so ON so.signal_id = s.id
            WHERE s.closed_at IS NOT NULL
              AND s.created_at > datetime('now', ?1)
            ORDER BY s.created_at DESC
            "#,
        )
        .bind(&window)
        .fetch_all(&self.pool)
        .await
        .context("Outcome event query failed")?;

        let mut events = Vec::with_capacity(rows.len());
        for row in &rows {
            let symbol: String = row.try_get("token")?;
            let direction_raw: String = row.try_get("direction")?;
            let outcome_raw: String = row.try_get("outcome")?;

            let (direction, outcome) = match (
                direction_raw.parse::<Direction>(),
                outcome_raw.parse::<Outcome>(),
            ) {
                (Ok(direction), Ok(outcome)) => (direction, outcome),
                _ => {
                    warn!(
                        symbol = %symbol,
                        direction = %direction_raw,
                        outcome = %outcome_raw,
                        "Skipping malformed outcome row"
                    );
                    continue;
                }
            };

            events.push(OutcomeEvent {
                symbol,
                direction,
                outcome,
                profit_percent: row.try_get("pnl")?,
                duration_secs: row.try_get("duration")?,
            });
        }

        info!(events = events.len(), window_days, "Loaded outcome events");
        Ok(events)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
