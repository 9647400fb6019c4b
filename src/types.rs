//! Shared types for the gating engines.
//!
//! These types form the data model used across all modules. The engines
//! depend on them without depending on each other, and the storage layer
//! produces the row types the bulk-load entry points consume.

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Position direction for a candidate signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Long,
    Short,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Long => write!(f, "LONG"),
            Direction::Short => write!(f, "SHORT"),
        }
    }
}

impl std::str::FromStr for Direction {
    type Err = GateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "LONG" => Ok(Direction::Long),
            "SHORT" => Ok(Direction::Short),
            _ => Err(GateError::InvalidRecord(format!("Unknown direction: {s}"))),
        }
    }
}

/// Resolved outcome of a closed signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Win,
    Lose,
    Draw,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Win => write!(f, "win"),
            Outcome::Lose => write!(f, "lose"),
            Outcome::Draw => write!(f, "draw"),
        }
    }
}

impl std::str::FromStr for Outcome {
    type Err = GateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "win" => Ok(Outcome::Win),
            "lose" | "loss" => Ok(Outcome::Lose),
            "draw" => Ok(Outcome::Draw),
            _ => Err(GateError::InvalidRecord(format!("Unknown outcome: {s}"))),
        }
    }
}

/// Short-term price trend classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Trend {
    Bullish,
    Bearish,
    Neutral,
}

impl Trend {
    /// Whether this trend points the same way as the given direction.
    pub fn matches(&self, direction: Direction) -> bool {
        matches!(
            (self, direction),
            (Trend::Bullish, Direction::Long) | (Trend::Bearish, Direction::Short)
        )
    }

    /// Whether this trend points against the given direction.
    pub fn opposes(&self, direction: Direction) -> bool {
        matches!(
            (self, direction),
            (Trend::Bearish, Direction::Long) | (Trend::Bullish, Direction::Short)
        )
    }
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trend::Bullish => write!(f, "bullish"),
            Trend::Bearish => write!(f, "bearish"),
            Trend::Neutral => write!(f, "neutral"),
        }
    }
}

// ---------------------------------------------------------------------------
// Verdict
// ---------------------------------------------------------------------------

/// The answer every gate gives: emit the signal or hold it, and why.
#[derive(Debug, Clone)]
pub struct Verdict {
    pub approved: bool,
    pub reason: String,
}

impl Verdict {
    /// Let the signal through.
    pub fn approve(reason: impl Into<String>) -> Self {
        Self { approved: true, reason: reason.into() }
    }

    /// Block the signal.
    pub fn veto(reason: impl Into<String>) -> Self {
        Self { approved: false, reason: reason.into() }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.approved {
            write!(f, "PASS: {}", self.reason)
        } else {
            write!(f, "VETO: {}", self.reason)
        }
    }
}

// ---------------------------------------------------------------------------
// Store rows
// ---------------------------------------------------------------------------

/// Per-token convergence aggregate over a trailing window, as produced by
/// the historical store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConvergenceAggregate {
    pub symbol: String,
    pub total_signals: u64,
    pub converged_signals: u64,
    pub avg_time_secs: f64,
    pub fastest_secs: f64,
    pub slowest_secs: f64,
    /// Win profits averaged across all signals in the window (losses
    /// contribute zero).
    pub avg_profit: f64,
}

/// One closed signal with its joined outcome, as produced by the
/// historical store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutcomeEvent {
    pub symbol: String,
    pub direction: Direction,
    pub outcome: Outcome,
    pub profit_percent: f64,
    pub duration_secs: f64,
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Domain-specific error types for the gating layer.
#[derive(Debug, thiserror::Error)]
pub enum GateError {
    #[error("Funding source error ({source_name}): {message}")]
    FundingSource { source_name: String, message: String },

    #[error("Store error: {0}")]
    Store(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid record: {0}")]
    InvalidRecord(String),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
