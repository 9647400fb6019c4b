//! Funding-rate source integrations.
//!
//! Defines the `FundingSource` trait the `FundingEngine` consumes and
//! provides the MEXC contract-API implementation. Sources surface transport
//! and API failures as errors; the engine degrades them to "no data".

pub mod mexc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// One funding-rate reading for a USDT-margined perpetual contract.
#[derive(Debug, Clone)]
pub struct FundingData {
    /// Base token symbol, quote suffix stripped (e.g. "BTC").
    pub symbol: String,
    /// Current period funding rate as a fraction (0.0001 = 0.01%).
    pub funding_rate: f64,
    /// Exchange-predicted rate for the next period; 0 when unpublished.
    pub predicted_rate: f64,
    /// Next settlement time.
    pub next_funding_time: DateTime<Utc>,
}

/// Abstraction over the exchange endpoint that publishes funding rates.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FundingSource: Send + Sync {
    /// Fetch the funding rate for one symbol. `Ok(None)` when the exchange
    /// lists no contract for it.
    async fn fetch_one(&self, symbol: &str) -> Result<Option<FundingData>>;

    /// Fetch funding rates for all active USDT-margined contracts.
    async fn fetch_all(&self) -> Result<Vec<FundingData>>;

    /// Source name for logging and identification.
    fn name(&self) -> &'static str;
}
