//! Convergence-rate tracking.
//!
//! Tracks how often and how fast each token's spread has historically
//! closed. Fast, reliable convergers get priority; tokens whose spreads
//! rarely close are denied before a signal is emitted.

use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::config::ConvergenceConfig;
use crate::engine::{ema, round2, speed_score};
use crate::types::{ConvergenceAggregate, Verdict};

// ---------------------------------------------------------------------------
// Scoring constants
// ---------------------------------------------------------------------------

const RATE_WEIGHT: f64 = 0.4;
const SPEED_WEIGHT: f64 = 0.3;
const PROFIT_WEIGHT: f64 = 0.3;

/// Score for tokens with no usable history.
const NEUTRAL_SCORE: f64 = 5.0;

/// Convergence rate below this vetoes a signal outright.
const MIN_RATE_TO_SIGNAL: f64 = 0.3;

// ---------------------------------------------------------------------------
// Per-token record
// ---------------------------------------------------------------------------

/// Rolling convergence statistics for one token.
#[derive(Debug, Clone)]
pub struct ConvergenceStats {
    pub symbol: String,
    pub total_signals: u64,
    pub converged_signals: u64,
    /// EMA of time-to-convergence, seconds. Stays 0 until the first
    /// converged signal.
    pub avg_convergence_time_secs: f64,
    pub fastest_secs: f64,
    pub slowest_secs: f64,
    pub convergence_rate: f64,
    /// EMA of PnL percent on converged signals.
    pub avg_profit_on_converge: f64,
    pub last_updated: DateTime<Utc>,
}

impl ConvergenceStats {
    fn new(symbol: &str) -> Self {
        Self {
            symbol: symbol.to_string(),
            total_signals: 0,
            converged_signals: 0,
            avg_convergence_time_secs: 0.0,
            fastest_secs: f64::INFINITY,
            slowest_secs: 0.0,
            convergence_rate: 0.0,
            avg_profit_on_converge: 0.0,
            last_updated: Utc::now(),
        }
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

#[derive(Default)]
struct State {
    records: HashMap<String, ConvergenceStats>,
    /// First-seen order, so equal-score rankings stay stable.
    order: Vec<String>,
    allow: HashSet<String>,
    deny: HashSet<String>,
}

/// Tracks spread-convergence behavior per token and gates signals on it.
pub struct ConvergenceEngine {
    config: ConvergenceConfig,
    state: RwLock<State>,
}

impl ConvergenceEngine {
    pub fn new(config: ConvergenceConfig) -> Self {
        Self { config, state: RwLock::new(State::default()) }
    }

    /// Replace per-symbol records with aggregates from the historical store
    /// and rebuild allow/deny membership from scratch.
    ///
    /// Aggregates arrive pre-filtered to tokens with enough samples, so the
    /// allow side needs no extra sample gate here; the deny side keeps it.
    pub fn bulk_load(&self, rows: &[ConvergenceAggregate]) {
        let mut state = self.state.write().unwrap();
        let now = Utc::now();

        for row in rows {
            let rate = if row.total_signals > 0 {
                row.converged_signals as f64 / row.total_signals as f64
            } else {
                0.0
            };
            let stats = ConvergenceStats {
                symbol: row.symbol.clone(),
                total_signals: row.total_signals,
                converged_signals: row.converged_signals,
                avg_convergence_time_secs: row.avg_time_secs,
                fastest_secs: row.fastest_secs,
                slowest_secs: row.slowest_secs,
                convergence_rate: rate,
                avg_profit_on_converge: row.avg_profit,
                last_updated: now,
            };
            if !state.records.contains_key(&row.symbol) {
                state.order.push(row.symbol.clone());
            }
            state.records.insert(row.symbol.clone(), stats);
        }

        let State { records, allow, deny, .. } = &mut *state;
        allow.clear();
        deny.clear();
        for stats in records.values() {
            if stats.convergence_rate >= self.config.allow_rate {
                allow.insert(stats.symbol.clone());
            } else if stats.convergence_rate < self.config.deny_rate
                && stats.total_signals >= self.config.membership_min_samples
            {
                deny.insert(stats.symbol.clone());
            }
        }

        info!(
            tokens = records.len(),
            allowed = allow.len(),
            denied = deny.len(),
            "Loaded convergence stats"
        );
    }

    /// Record one convergence observation for a token.
    ///
    /// `time_secs` is the time-to-convergence, or the maximum tracking time
    /// when the spread never closed. Timing and profit only feed the
    /// averages on converged signals.
    pub fn record_convergence(
        &self,
        symbol: &str,
        converged: bool,
        time_secs: f64,
        profit_percent: f64,
    ) {
        let mut state = self.state.write().unwrap();
        let State { records, order, allow, deny } = &mut *state;

        let stats = records.entry(symbol.to_string()).or_insert_with(|| {
            order.push(symbol.to_string());
            ConvergenceStats::new(symbol)
        });

        stats.total_signals += 1;
        if converged {
            stats.converged_signals += 1;
            if time_secs < stats.fastest_secs {
                stats.fastest_secs = time_secs;
            }
            if time_secs > stats.slowest_secs {
                stats.slowest_secs = time_secs;
            }
            stats.avg_convergence_time_secs =
                ema(self.config.ema_alpha, stats.avg_convergence_time_secs, time_secs);
            stats.avg_profit_on_converge =
                ema(self.config.ema_alpha, stats.avg_profit_on_converge, profit_percent);
        }
        stats.convergence_rate = stats.converged_signals as f64 / stats.total_signals as f64;
        stats.last_updated = Utc::now();

        // Membership only moves once a token has enough history, and only
        // on the two explicit conditions — in between, it is sticky.
        if stats.total_signals >= self.config.membership_min_samples {
            if stats.convergence_rate >= self.config.allow_rate {
                allow.insert(symbol.to_string());
                deny.remove(symbol);
                debug!(symbol, rate = stats.convergence_rate, "Token allowed on convergence history");
            } else if stats.convergence_rate < self.config.deny_rate {
                deny.insert(symbol.to_string());
                allow.remove(symbol);
                debug!(symbol, rate = stats.convergence_rate, "Token denied on convergence history");
            }
        }
    }

    /// Convergence stats for a token, when known.
    pub fn stats(&self, symbol: &str) -> Option<ConvergenceStats> {
        self.state.read().unwrap().records.get(symbol).cloned()
    }

    /// Whether a token is in the allow-set (reliable converger).
    pub fn is_allowed(&self, symbol: &str) -> bool {
        self.state.read().unwrap().allow.contains(symbol)
    }

    /// Whether a token is in the deny-set (spreads rarely close).
    pub fn is_denied(&self, symbol: &str) -> bool {
        self.state.read().unwrap().deny.contains(symbol)
    }

    /// Priority score 0–10. Unknown or under-sampled tokens score a
    /// neutral 5.
    pub fn priority_score(&self, symbol: &str) -> f64 {
        let state = self.state.read().unwrap();
        match state.records.get(symbol) {
            Some(stats) => self.score_for(stats),
            None => NEUTRAL_SCORE,
        }
    }

    fn score_for(&self, stats: &ConvergenceStats) -> f64 {
        if stats.total_signals < self.config.score_min_samples {
            return NEUTRAL_SCORE;
        }

        let rate_score = stats.convergence_rate * 10.0;
        // A zero average means counted signals but no convergence yet —
        // neutral, not top speed.
        let speed = if stats.avg_convergence_time_secs <= 0.0 {
            NEUTRAL_SCORE
        } else {
            speed_score(stats.avg_convergence_time_secs)
        };
        let profit_score = (stats.avg_profit_on_converge * 2.0).clamp(0.0, 10.0);

        round2(rate_score * RATE_WEIGHT + speed * SPEED_WEIGHT + profit_score * PROFIT_WEIGHT)
    }

    /// Gate a candidate signal on convergence history.
    ///
    /// Deny-set membership vetoes immediately; unknown or under-sampled
    /// tokens pass by default.
    pub fn should_signal(&self, symbol: &str, min_score: f64) -> Verdict {
        let state = self.state.read().unwrap();

        if state.deny.contains(symbol) {
            return Verdict::veto("Token denied (poor convergence history)");
        }

        let Some(stats) = state.records.get(symbol) else {
            return Verdict::approve("New token, no history");
        };
        if stats.total_signals < self.config.score_min_samples {
            return Verdict::approve("Insufficient data");
        }

        let score = self.score_for(stats);
        if score < min_score {
            return Verdict::veto(format!("Low priority score: {score:.1} < {min_score}"));
        }
        if stats.convergence_rate < MIN_RATE_TO_SIGNAL {
            return Verdict::veto(format!(
                "Low convergence rate: {:.0}%",
                stats.convergence_rate * 100.0
            ));
        }

        Verdict::approve(format!(
            "Score: {score:.1}, Rate: {:.0}%",
            stats.convergence_rate * 100.0
        ))
    }

    /// All known tokens ranked by priority score, best first, truncated
    /// to `n`. Equal scores keep first-seen order.
    pub fn top_tokens(&self, n: usize) -> Vec<(String, f64)> {
        let state = self.state.read().unwrap();
        let mut scored: Vec<(String, f64)> = state
            .order
            .iter()
            .filter_map(|symbol| {
                state.records.get(symbol).map(|stats| (symbol.clone(), self.score_for(stats)))
            })
            .collect();
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(n);
        scored
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
