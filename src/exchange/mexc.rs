//! MEXC contract-API funding-rate client.
//!
//! Both endpoints are public (no authentication):
//! - Per-symbol: `GET /api/v1/contract/funding_rate/{SYMBOL}_USDT`
//! - Bulk:       `GET /api/v1/contract/funding_rate`
//!
//! Responses arrive in a `{ success, code, data }` envelope; `success:
//! false` or a missing payload is an API-level failure.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use super::{FundingData, FundingSource};
use crate::config::FundingSourceConfig;

const SOURCE_NAME: &str = "mexc";

/// Quote suffix on every contract symbol we track.
const USDT_SUFFIX: &str = "_USDT";

// ---------------------------------------------------------------------------
// API response types (MEXC JSON → Rust)
// ---------------------------------------------------------------------------

/// Envelope every contract-API response arrives in.
#[derive(Debug, Deserialize)]
struct MexcEnvelope<T> {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    code: i64,
    data: Option<T>,
}

/// Funding-rate payload for one contract.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MexcFundingRate {
    #[serde(default)]
    symbol: String,
    #[serde(default)]
    funding_rate: f64,
    /// Predicted rate for the next period, when the exchange publishes one.
    #[serde(default)]
    expected_funding_rate: f64,
    /// Next settlement, ms since epoch.
    #[serde(default)]
    next_settle_time: i64,
}

impl MexcFundingRate {
    /// Convert a bulk-endpoint row, keeping only USDT-margined contracts.
    fn into_funding_data(self) -> Option<FundingData> {
        let symbol = self.symbol.strip_suffix(USDT_SUFFIX)?.to_string();
        Some(FundingData {
            symbol,
            funding_rate: self.funding_rate,
            predicted_rate: self.expected_funding_rate,
            next_funding_time: ms_to_datetime(self.next_settle_time),
        })
    }
}

/// Convert an MEXC timestamp (ms since epoch) to `DateTime<Utc>`.
fn ms_to_datetime(ms: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(ms).single().unwrap_or_else(Utc::now)
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// MEXC funding-rate client.
pub struct MexcFundingClient {
    http: Client,
    base_url: String,
}

impl MexcFundingClient {
    pub fn new(config: &FundingSourceConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .user_agent("leadlag-gate/0.1.0")
            .build()
            .context("Failed to build HTTP client for MEXC")?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn get_envelope<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<MexcEnvelope<T>> {
        debug!(url, "Fetching MEXC funding data");

        let resp = self
            .http
            .get(url)
            .send()
            .await
            .context("MEXC funding-rate request failed")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("MEXC API error {status}: {body}");
        }

        let envelope: MexcEnvelope<T> = resp
            .json()
            .await
            .context("Failed to parse MEXC funding-rate response")?;

        if !envelope.success {
            anyhow::bail!("MEXC API rejected request (code {})", envelope.code);
        }

        Ok(envelope)
    }
}

#[async_trait]
impl FundingSource for MexcFundingClient {
    async fn fetch_one(&self, symbol: &str) -> Result<Option<FundingData>> {
        let url = format!(
            "{}/api/v1/contract/funding_rate/{}{USDT_SUFFIX}",
            self.base_url,
            urlencoding::encode(symbol),
        );

        let envelope: MexcEnvelope<MexcFundingRate> = self.get_envelope(&url).await?;

        Ok(envelope.data.map(|rate| FundingData {
            symbol: symbol.to_string(),
            funding_rate: rate.funding_rate,
            predicted_rate: rate.expected_funding_rate,
            next_funding_time: ms_to_datetime(rate.next_settle_time),
        }))
    }

    async fn fetch_all(&self) -> Result<Vec<FundingData>> {
        let url = format!("{}/api/v1/contract/funding_rate", self.base_url);

        let envelope: MexcEnvelope<Vec<MexcFundingRate>> = self.get_envelope(&url).await?;

        Ok(envelope
            .data
            .unwrap_or_default()
            .into_iter()
            .filter_map(MexcFundingRate::into_funding_data)
            .collect())
    }

    fn name(&self) -> &'static str {
        SOURCE_NAME
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
