//! Price-momentum detection.
//!
//! Keeps a short rolling window of live DEX prices per token and derives a
//! trend classification used to confirm — or veto — a signal direction.

use std::collections::{HashMap, VecDeque};
use std::sync::RwLock;

use chrono::{DateTime, Duration, Utc};
use tracing::trace;

use crate::config::MomentumConfig;
use crate::engine::round1;
use crate::types::{Direction, Trend, Verdict};

// ---------------------------------------------------------------------------
// Classification constants
// ---------------------------------------------------------------------------

/// Lookback ages for the short and long change legs, seconds.
const SHORT_AGE_SECS: f64 = 60.0;
const LONG_AGE_SECS: f64 = 300.0;

/// A nearest sample is usable when its distance from the target age is
/// within this fraction of the age.
const AGE_TOLERANCE: f64 = 0.3;

/// Weighting of the short vs long change legs.
const SHORT_WEIGHT: f64 = 0.6;
const LONG_WEIGHT: f64 = 0.4;

/// Weighted change (percent) beyond which the trend stops being neutral.
const TREND_THRESHOLD: f64 = 0.5;

/// Strength scaling when the two legs agree / disagree in sign.
const CONSISTENT_BOOST: f64 = 1.3;
const MIXED_DAMPING: f64 = 0.7;

/// Strength points per unit of aligned/opposing strength in the bonus
/// multiplier.
const BONUS_PER_STRENGTH: f64 = 0.05;

// ---------------------------------------------------------------------------
// Samples and snapshots
// ---------------------------------------------------------------------------

/// One observed price.
#[derive(Debug, Clone, Copy)]
struct PriceSample {
    price: f64,
    at: DateTime<Utc>,
}

/// Momentum analysis result for one token.
#[derive(Debug, Clone)]
pub struct MomentumSnapshot {
    pub symbol: String,
    pub current_price: f64,
    /// Price ~1 minute ago, when a usable sample exists.
    pub price_1m: Option<f64>,
    /// Price ~5 minutes ago, when a usable sample exists.
    pub price_5m: Option<f64>,
    /// Percent change over the last minute; 0 without a usable sample.
    pub change_1m: f64,
    pub change_5m: f64,
    pub trend: Trend,
    /// 0–10, rounded to one decimal.
    pub strength: f64,
    pub last_updated: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

#[derive(Default)]
struct State {
    history: HashMap<String, VecDeque<PriceSample>>,
    snapshots: HashMap<String, MomentumSnapshot>,
}

/// Tracks DEX price changes over time and classifies short-term momentum.
pub struct MomentumEngine {
    config: MomentumConfig,
    state: RwLock<State>,
}

impl MomentumEngine {
    pub fn new(config: MomentumConfig) -> Self {
        Self { config, state: RwLock::new(State::default()) }
    }

    /// Record a live price observation for a token.
    pub fn record_price(&self, symbol: &str, price: f64) {
        self.record_price_at(symbol, price, Utc::now());
    }

    /// Record a price observed at an explicit instant (replay and tests).
    pub fn record_price_at(&self, symbol: &str, price: f64, at: DateTime<Utc>) {
        let mut state = self.state.write().unwrap();
        let window = state.history.entry(symbol.to_string()).or_default();
        push_and_trim(window, PriceSample { price, at }, &self.config);
    }

    /// Record `current_price`, then classify the trend from the retained
    /// window. The snapshot is cached and returned.
    pub fn analyze(&self, symbol: &str, current_price: f64) -> MomentumSnapshot {
        self.analyze_at(symbol, current_price, Utc::now())
    }

    /// `analyze` with an explicit observation instant (replay and tests).
    pub fn analyze_at(
        &self,
        symbol: &str,
        current_price: f64,
        at: DateTime<Utc>,
    ) -> MomentumSnapshot {
        let mut state = self.state.write().unwrap();

        let window = state.history.entry(symbol.to_string()).or_default();
        push_and_trim(window, PriceSample { price: current_price, at }, &self.config);

        let price_1m = price_at_age(window, at, SHORT_AGE_SECS);
        let price_5m = price_at_age(window, at, LONG_AGE_SECS);
        let change_1m = percent_change(price_1m, current_price);
        let change_5m = percent_change(price_5m, current_price);
        let (trend, strength) = classify(change_1m, change_5m);

        trace!(symbol, change_1m, change_5m, ?trend, strength, "Momentum analyzed");

        let snapshot = MomentumSnapshot {
            symbol: symbol.to_string(),
            current_price,
            price_1m,
            price_5m,
            change_1m,
            change_5m,
            trend,
            strength,
            last_updated: at,
        };
        state.snapshots.insert(symbol.to_string(), snapshot.clone());
        snapshot
    }

    /// Most recent snapshot for a token, when one has been computed.
    pub fn cached(&self, symbol: &str) -> Option<MomentumSnapshot> {
        self.state.read().unwrap().snapshots.get(symbol).cloned()
    }

    /// Number of retained price samples for a token.
    pub fn sample_count(&self, symbol: &str) -> usize {
        self.state
            .read()
            .unwrap()
            .history
            .get(symbol)
            .map(VecDeque::len)
            .unwrap_or(0)
    }

    /// Check whether momentum confirms the signal direction.
    ///
    /// Missing data passes; an opposing trend at or above `min_strength`
    /// vetoes; a matching one confirms; anything weaker passes without
    /// asserting confirmation.
    pub fn confirms_direction(
        &self,
        symbol: &str,
        direction: Direction,
        min_strength: f64,
    ) -> Verdict {
        let Some(momentum) = self.cached(symbol) else {
            return Verdict::approve("No momentum data");
        };

        if momentum.trend.opposes(direction) && momentum.strength >= min_strength {
            return Verdict::veto(format!(
                "{} momentum ({:+.1}% 1m) contradicts {direction}",
                momentum.trend, momentum.change_1m
            ));
        }
        if momentum.trend.matches(direction) && momentum.strength >= min_strength {
            return Verdict::approve(format!(
                "Strong {} momentum confirms {direction} (+{:.1})",
                momentum.trend, momentum.strength
            ));
        }

        Verdict::approve(format!("Neutral/weak momentum (strength: {:.1})", momentum.strength))
    }

    /// Signal-quality multiplier from momentum alignment: 1.0 neutral,
    /// up to 1.5 aligned, down to 0.5 opposing.
    pub fn momentum_bonus(&self, symbol: &str, direction: Direction) -> f64 {
        let Some(momentum) = self.cached(symbol) else {
            return 1.0;
        };

        if momentum.trend.matches(direction) {
            1.0 + momentum.strength * BONUS_PER_STRENGTH
        } else if momentum.trend.opposes(direction) {
            1.0 - momentum.strength * BONUS_PER_STRENGTH
        } else {
            1.0
        }
    }
}

// ---------------------------------------------------------------------------
// Window helpers
// ---------------------------------------------------------------------------

fn push_and_trim(window: &mut VecDeque<PriceSample>, sample: PriceSample, config: &MomentumConfig) {
    if window.len() == config.max_samples {
        window.pop_front();
    }
    window.push_back(sample);

    let cutoff = sample.at - Duration::seconds(config.retention_secs as i64);
    while window.front().is_some_and(|s| s.at < cutoff) {
        window.pop_front();
    }
}

/// Closest retained sample to `age_secs` before `now`, when one lies within
/// the tolerance. Linear scan over the window — O(window size) per call; a
/// ring buffer with binary search on timestamp would behave identically.
fn price_at_age(window: &VecDeque<PriceSample>, now: DateTime<Utc>, age_secs: f64) -> Option<f64> {
    let target = now - Duration::milliseconds((age_secs * 1000.0) as i64);

    let mut closest: Option<(f64, f64)> = None; // (distance_secs, price)
    for sample in window {
        let distance = (sample.at - target).num_milliseconds().abs() as f64 / 1000.0;
        if closest.map_or(true, |(best, _)| distance < best) {
            closest = Some((distance, sample.price));
        }
    }

    match closest {
        Some((distance, price)) if distance < age_secs * AGE_TOLERANCE => Some(price),
        _ => None,
    }
}

fn percent_change(past: Option<f64>, current: f64) -> f64 {
    match past {
        Some(p) if p > 0.0 => ((current - p) / p) * 100.0,
        _ => 0.0,
    }
}

fn classify(change_1m: f64, change_5m: f64) -> (Trend, f64) {
    let weighted = change_1m * SHORT_WEIGHT + change_5m * LONG_WEIGHT;

    let trend = if weighted > TREND_THRESHOLD {
        Trend::Bullish
    } else if weighted < -TREND_THRESHOLD {
        Trend::Bearish
    } else {
        Trend::Neutral
    };

    let mut strength = (weighted.abs() * 2.0).min(10.0);
    if change_1m * change_5m > 0.0 {
        strength = (strength * CONSISTENT_BOOST).min(10.0);
    } else if change_1m * change_5m < 0.0 {
        strength *= MIXED_DAMPING;
    }

    (trend, round1(strength))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
