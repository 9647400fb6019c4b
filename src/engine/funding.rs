//! Funding-cost estimation.
//!
//! Caches periodic funding-rate data from the exchange and converts it into
//! the expected cost — or gain — of holding a directional position while a
//! spread converges. A long pays positive funding; a short receives it.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Duration, Utc};
use futures::future::join_all;
use tracing::{debug, info, warn};

use crate::config::FundingConfig;
use crate::exchange::{FundingData, FundingSource};
use crate::types::Direction;

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// Cached funding-rate snapshot for one symbol.
#[derive(Debug, Clone)]
pub struct FundingSnapshot {
    pub symbol: String,
    /// Current period funding rate as a fraction (0.0001 = 0.01%).
    pub funding_rate: f64,
    /// Exchange-predicted next-period rate; 0 when unpublished.
    pub predicted_rate: f64,
    pub next_funding_time: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

impl FundingSnapshot {
    fn from_data(data: FundingData, at: DateTime<Utc>) -> Self {
        Self {
            symbol: data.symbol,
            funding_rate: data.funding_rate,
            predicted_rate: data.predicted_rate,
            next_funding_time: data.next_funding_time,
            last_updated: at,
        }
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Tracks exchange funding rates and prices the cost of holding a position.
pub struct FundingEngine {
    config: FundingConfig,
    source: Arc<dyn FundingSource>,
    cache: RwLock<HashMap<String, FundingSnapshot>>,
}

impl FundingEngine {
    pub fn new(config: FundingConfig, source: Arc<dyn FundingSource>) -> Self {
        Self { config, source, cache: RwLock::new(HashMap::new()) }
    }

    fn ttl(&self) -> Duration {
        Duration::seconds(self.config.cache_ttl_secs as i64)
    }

    /// Cached snapshot for a symbol, fresh or stale.
    pub fn cached(&self, symbol: &str) -> Option<FundingSnapshot> {
        self.cache.read().unwrap().get(symbol).cloned()
    }

    /// Cached funding rate; 0 when the symbol has never been fetched.
    pub fn cached_rate(&self, symbol: &str) -> f64 {
        self.cache.read().unwrap().get(symbol).map(|s| s.funding_rate).unwrap_or(0.0)
    }

    /// Insert a snapshot directly (bulk loads and replay).
    pub fn prime(&self, snapshot: FundingSnapshot) {
        self.cache.write().unwrap().insert(snapshot.symbol.clone(), snapshot);
    }

    /// Funding data for one symbol, served from cache within the TTL.
    ///
    /// Fetch failures resolve to `None` and leave any cached entry
    /// untouched; they never propagate.
    pub async fn fetch_one(&self, symbol: &str) -> Option<FundingSnapshot> {
        let now = Utc::now();
        {
            let cache = self.cache.read().unwrap();
            if let Some(snapshot) = cache.get(symbol) {
                if now - snapshot.last_updated < self.ttl() {
                    return Some(snapshot.clone());
                }
            }
        }

        match self.source.fetch_one(symbol).await {
            Ok(Some(data)) => {
                let snapshot = FundingSnapshot::from_data(data, Utc::now());
                self.cache
                    .write()
                    .unwrap()
                    .insert(snapshot.symbol.clone(), snapshot.clone());
                Some(snapshot)
            }
            Ok(None) => {
                debug!(symbol, source = self.source.name(), "No funding data for symbol");
                None
            }
            Err(e) => {
                warn!(symbol, source = self.source.name(), error = %e, "Funding fetch failed");
                None
            }
        }
    }

    /// Fetch several symbols concurrently. Returns how many resolved.
    pub async fn fetch_many(&self, symbols: &[&str]) -> usize {
        let fetches = symbols.iter().map(|symbol| self.fetch_one(symbol));
        join_all(fetches).await.into_iter().flatten().count()
    }

    /// Refresh the cache from the bulk endpoint. Returns the number of
    /// symbols cached; a failed fetch leaves the cache untouched.
    pub async fn fetch_all(&self) -> usize {
        match self.source.fetch_all().await {
            Ok(rates) => {
                let count = rates.len();
                let now = Utc::now();
                let mut cache = self.cache.write().unwrap();
                for data in rates {
                    let snapshot = FundingSnapshot::from_data(data, now);
                    cache.insert(snapshot.symbol.clone(), snapshot);
                }
                info!(count, source = self.source.name(), "Loaded funding rates");
                count
            }
            Err(e) => {
                warn!(source = self.source.name(), error = %e, "Bulk funding fetch failed");
                0
            }
        }
    }

    /// Expected funding cost of holding a position, as a PnL percentage.
    /// Negative = the position pays funding, positive = it collects.
    /// Returns 0 without cached data.
    pub fn funding_cost(&self, symbol: &str, direction: Direction, hold_hours: f64) -> f64 {
        let Some(snapshot) = self.cached(symbol) else {
            return 0.0;
        };

        let periods = hold_hours / self.config.funding_period_hours;
        let rate_pct = snapshot.funding_rate * 100.0;

        match direction {
            Direction::Long => -rate_pct * periods,
            Direction::Short => rate_pct * periods,
        }
    }

    /// Funding adjustment for profit estimates, over the settlement events
    /// an average hold straddles. Prefers the predicted rate when the
    /// exchange publishes one. Same sign convention as `funding_cost`.
    pub fn funding_adjustment(&self, symbol: &str, direction: Direction) -> f64 {
        let Some(snapshot) = self.cached(symbol) else {
            return 0.0;
        };

        let rate = if snapshot.predicted_rate != 0.0 {
            snapshot.predicted_rate
        } else {
            snapshot.funding_rate
        };
        let rate_pct = rate * 100.0;

        match direction {
            Direction::Long => -rate_pct * self.config.expected_funding_events,
            Direction::Short => rate_pct * self.config.expected_funding_events,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
