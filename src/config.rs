//! Configuration loading from TOML.
//!
//! Reads `config.toml` and deserializes into strongly-typed, fully defaulted
//! structs — an absent file or section yields the documented defaults, so the
//! engines can always be constructed. No secrets: every endpoint this crate
//! talks to is public.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;

/// Top-level configuration for the gating layer.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct GateConfig {
    pub store: StoreConfig,
    pub funding_source: FundingSourceConfig,
    pub convergence: ConvergenceConfig,
    pub funding: FundingConfig,
    pub momentum: MomentumConfig,
    pub intelligence: IntelligenceConfig,
}

/// Historical signal store (read-only) connection and query windows.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StoreConfig {
    pub database_url: String,
    /// Trailing window for convergence aggregates, days.
    pub convergence_window_days: i64,
    /// Minimum closed signals for a token to appear in the aggregates.
    pub convergence_min_samples: i64,
    /// Trailing window for per-event outcome history, days.
    pub outcome_window_days: i64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite://signals.db".to_string(),
            convergence_window_days: 7,
            convergence_min_samples: 3,
            outcome_window_days: 14,
        }
    }
}

/// Funding-rate source endpoint.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct FundingSourceConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for FundingSourceConfig {
    fn default() -> Self {
        Self {
            base_url: "https://contract.mexc.com".to_string(),
            timeout_secs: 10,
        }
    }
}

/// ConvergenceEngine tuning.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ConvergenceConfig {
    /// EMA smoothing factor for timing and profit averages.
    pub ema_alpha: f64,
    /// Below this many signals a token scores neutral and passes by default.
    pub score_min_samples: u64,
    /// Live allow/deny membership requires at least this many signals.
    pub membership_min_samples: u64,
    /// Convergence rate at or above this admits a token to the allow-set.
    pub allow_rate: f64,
    /// Convergence rate below this puts a token in the deny-set.
    pub deny_rate: f64,
}

impl Default for ConvergenceConfig {
    fn default() -> Self {
        Self {
            ema_alpha: 0.3,
            score_min_samples: 3,
            membership_min_samples: 5,
            allow_rate: 0.6,
            deny_rate: 0.3,
        }
    }
}

/// FundingEngine tuning.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct FundingConfig {
    /// Cached snapshots older than this are refetched.
    pub cache_ttl_secs: u64,
    /// Funding settles once per this many hours.
    pub funding_period_hours: f64,
    /// Settlement events an average hold straddles (~2–4h against 8h).
    pub expected_funding_events: f64,
}

impl Default for FundingConfig {
    fn default() -> Self {
        Self {
            cache_ttl_secs: 300,
            funding_period_hours: 8.0,
            expected_funding_events: 0.3,
        }
    }
}

/// MomentumEngine tuning.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct MomentumConfig {
    /// Price samples older than this are evicted.
    pub retention_secs: u64,
    /// Hard ceiling on retained samples per symbol.
    pub max_samples: usize,
}

impl Default for MomentumConfig {
    fn default() -> Self {
        Self {
            retention_secs: 600,
            max_samples: 1000,
        }
    }
}

/// TokenIntelligenceEngine tuning.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct IntelligenceConfig {
    /// Below this many outcomes a token scores neutral and passes by default.
    pub min_samples: u64,
    /// Most-recent outcomes retained for consistency and streak checks.
    pub recent_window: usize,
    /// EMA smoothing factor for convergence timing.
    pub ema_alpha: f64,
}

impl Default for IntelligenceConfig {
    fn default() -> Self {
        Self {
            min_samples: 3,
            recent_window: 10,
            ema_alpha: 0.3,
        }
    }
}

impl GateConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        let config: GateConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {path}"))?;
        Ok(config)
    }
}
