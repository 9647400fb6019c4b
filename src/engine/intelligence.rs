//! Token-level outcome intelligence.
//!
//! Aggregates realised trade outcomes per token — wins, profit, timing,
//! direction splits, recent form — into a composite quality score and a
//! final signal-admission decision. Consistently losing tokens get filtered
//! before they cost anything else.

use std::collections::{HashMap, VecDeque};
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use tracing::info;

use crate::config::IntelligenceConfig;
use crate::engine::{ema, round2, speed_score};
use crate::types::{Direction, Outcome, OutcomeEvent, Verdict};

// ---------------------------------------------------------------------------
// Scoring constants
// ---------------------------------------------------------------------------

const NEUTRAL_SCORE: f64 = 5.0;

const WIN_RATE_WEIGHT: f64 = 0.35;
const PROFIT_WEIGHT: f64 = 0.25;
const SPEED_WEIGHT: f64 = 0.20;
const CONSISTENCY_WEIGHT: f64 = 0.10;
const SAMPLE_WEIGHT: f64 = 0.10;

/// Sample count at which the confidence component maxes out.
const FULL_CONFIDENCE_SAMPLES: f64 = 20.0;

/// Direction-specific gating kicks in at this many samples per direction.
const DIRECTION_MIN_SAMPLES: u64 = 3;
const DIRECTION_MIN_WIN_RATE: f64 = 0.3;

/// Streak veto: this many losses within the last `STREAK_WINDOW` outcomes.
const STREAK_WINDOW: usize = 5;
const STREAK_LOSSES: usize = 4;

/// Recommendation and avoid lists require this many samples.
const LIST_MIN_SAMPLES: u64 = 5;
const AVOID_MAX_SCORE: f64 = 3.0;

// ---------------------------------------------------------------------------
// Per-token record
// ---------------------------------------------------------------------------

/// Complete outcome statistics for one token.
#[derive(Debug, Clone)]
pub struct TokenStats {
    pub symbol: String,

    // Signal history
    pub total_signals: u64,
    pub wins: u64,
    pub losses: u64,
    pub draws: u64,

    // Performance
    pub total_profit: f64,
    pub avg_profit: f64,
    pub best_trade: f64,
    pub worst_trade: f64,

    // Timing
    /// EMA of time-to-convergence, seconds. Stays 0 until seeded.
    pub avg_convergence_secs: f64,
    pub fastest_convergence_secs: f64,

    // Direction performance
    pub long_wins: u64,
    pub long_total: u64,
    pub short_wins: u64,
    pub short_total: u64,

    /// Most recent outcomes, oldest first, bounded by the configured window.
    pub recent_outcomes: VecDeque<Outcome>,

    // Derived
    pub win_rate: f64,
    pub quality_score: f64,

    pub last_updated: DateTime<Utc>,
}

impl TokenStats {
    fn new(symbol: &str) -> Self {
        Self {
            symbol: symbol.to_string(),
            total_signals: 0,
            wins: 0,
            losses: 0,
            draws: 0,
            total_profit: 0.0,
            avg_profit: 0.0,
            best_trade: 0.0,
            worst_trade: 0.0,
            avg_convergence_secs: 0.0,
            fastest_convergence_secs: f64::INFINITY,
            long_wins: 0,
            long_total: 0,
            short_wins: 0,
            short_total: 0,
            recent_outcomes: VecDeque::new(),
            win_rate: 0.0,
            quality_score: NEUTRAL_SCORE,
            last_updated: Utc::now(),
        }
    }

    /// (wins, total) for one direction.
    pub fn direction_split(&self, direction: Direction) -> (u64, u64) {
        match direction {
            Direction::Long => (self.long_wins, self.long_total),
            Direction::Short => (self.short_wins, self.short_total),
        }
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

#[derive(Default)]
struct State {
    records: HashMap<String, TokenStats>,
    /// First-seen order, so equal-score listings stay stable.
    order: Vec<String>,
}

/// Scores tokens on their realised trading history and gates signals on it.
pub struct TokenIntelligenceEngine {
    config: IntelligenceConfig,
    state: RwLock<State>,
}

impl TokenIntelligenceEngine {
    pub fn new(config: IntelligenceConfig) -> Self {
        Self { config, state: RwLock::new(State::default()) }
    }

    /// Replay historical outcome events from the store, then recompute
    /// every score.
    pub fn load_from_store(&self, rows: &[OutcomeEvent]) {
        for row in rows {
            self.record_outcome(
                &row.symbol,
                row.direction,
                row.outcome,
                row.profit_percent,
                row.duration_secs,
            );
        }

        let mut state = self.state.write().unwrap();
        for stats in state.records.values_mut() {
            Self::recompute_score(&self.config, stats);
        }
        info!(tokens = state.records.len(), events = rows.len(), "Loaded token intelligence");
    }

    /// Record one resolved trade outcome.
    ///
    /// Timing only feeds the averages on non-losing outcomes with a
    /// positive duration; the quality score is recomputed before the lock
    /// is released.
    pub fn record_outcome(
        &self,
        symbol: &str,
        direction: Direction,
        outcome: Outcome,
        profit_percent: f64,
        convergence_secs: f64,
    ) {
        let mut state = self.state.write().unwrap();
        let State { records, order } = &mut *state;

        let stats = records.entry(symbol.to_string()).or_insert_with(|| {
            order.push(symbol.to_string());
            TokenStats::new(symbol)
        });

        stats.total_signals += 1;
        match outcome {
            Outcome::Win => {
                stats.wins += 1;
                match direction {
                    Direction::Long => stats.long_wins += 1,
                    Direction::Short => stats.short_wins += 1,
                }
            }
            Outcome::Lose => stats.losses += 1,
            Outcome::Draw => stats.draws += 1,
        }
        match direction {
            Direction::Long => stats.long_total += 1,
            Direction::Short => stats.short_total += 1,
        }

        stats.total_profit += profit_percent;
        if profit_percent > stats.best_trade {
            stats.best_trade = profit_percent;
        }
        if profit_percent < stats.worst_trade {
            stats.worst_trade = profit_percent;
        }

        if convergence_secs > 0.0 && outcome != Outcome::Lose {
            if convergence_secs < stats.fastest_convergence_secs {
                stats.fastest_convergence_secs = convergence_secs;
            }
            stats.avg_convergence_secs =
                ema(self.config.ema_alpha, stats.avg_convergence_secs, convergence_secs);
        }

        if stats.recent_outcomes.len() == self.config.recent_window {
            stats.recent_outcomes.pop_front();
        }
        stats.recent_outcomes.push_back(outcome);

        stats.avg_profit = stats.total_profit / stats.total_signals as f64;
        stats.win_rate = stats.wins as f64 / stats.total_signals as f64;
        stats.last_updated = Utc::now();

        Self::recompute_score(&self.config, stats);
    }

    fn recompute_score(config: &IntelligenceConfig, stats: &mut TokenStats) {
        if stats.total_signals < config.min_samples {
            stats.quality_score = NEUTRAL_SCORE;
            return;
        }

        let win_score = stats.win_rate * 10.0;
        let profit_score = (5.0 + stats.avg_profit * 0.5).clamp(0.0, 10.0);
        let speed = speed_score(stats.avg_convergence_secs);

        let consistency = if stats.recent_outcomes.is_empty() {
            NEUTRAL_SCORE
        } else {
            let recent_wins =
                stats.recent_outcomes.iter().filter(|o| **o == Outcome::Win).count();
            recent_wins as f64 / stats.recent_outcomes.len() as f64 * 10.0
        };

        let sample_confidence =
            (stats.total_signals as f64 / FULL_CONFIDENCE_SAMPLES * 10.0).min(10.0);

        stats.quality_score = round2(
            win_score * WIN_RATE_WEIGHT
                + profit_score * PROFIT_WEIGHT
                + speed * SPEED_WEIGHT
                + consistency * CONSISTENCY_WEIGHT
                + sample_confidence * SAMPLE_WEIGHT,
        );
    }

    /// Full stats for a token, when known.
    pub fn stats(&self, symbol: &str) -> Option<TokenStats> {
        self.state.read().unwrap().records.get(symbol).cloned()
    }

    /// Quality score 0–10; unknown tokens score a neutral 5.
    pub fn score(&self, symbol: &str) -> f64 {
        self.state
            .read()
            .unwrap()
            .records
            .get(symbol)
            .map(|s| s.quality_score)
            .unwrap_or(NEUTRAL_SCORE)
    }

    /// Gate a candidate signal on outcome history.
    ///
    /// Tokens under the sample threshold pass unconditionally; beyond it,
    /// a low score, low win rate, poor direction-specific record, or a
    /// recent losing streak vetoes.
    pub fn should_signal(
        &self,
        symbol: &str,
        direction: Direction,
        min_score: f64,
        min_win_rate: f64,
    ) -> Verdict {
        let state = self.state.read().unwrap();

        let Some(stats) = state.records.get(symbol) else {
            return Verdict::approve("New token, no history");
        };
        if stats.total_signals < self.config.min_samples {
            return Verdict::approve(format!("Insufficient data ({} trades)", stats.total_signals));
        }

        if stats.quality_score < min_score {
            return Verdict::veto(format!(
                "Low quality score: {:.1} < {min_score}",
                stats.quality_score
            ));
        }
        if stats.win_rate < min_win_rate {
            return Verdict::veto(format!(
                "Low win rate: {:.0}% < {:.0}%",
                stats.win_rate * 100.0,
                min_win_rate * 100.0
            ));
        }

        let (dir_wins, dir_total) = stats.direction_split(direction);
        if dir_total >= DIRECTION_MIN_SAMPLES {
            let dir_rate = dir_wins as f64 / dir_total as f64;
            if dir_rate < DIRECTION_MIN_WIN_RATE {
                return Verdict::veto(format!(
                    "Poor {direction} performance: {:.0}%",
                    dir_rate * 100.0
                ));
            }
        }

        if stats.recent_outcomes.len() >= STREAK_WINDOW {
            let recent_losses = stats
                .recent_outcomes
                .iter()
                .rev()
                .take(STREAK_WINDOW)
                .filter(|o| **o == Outcome::Lose)
                .count();
            if recent_losses >= STREAK_LOSSES {
                return Verdict::veto("Recent losing streak (4/5 losses)");
            }
        }

        Verdict::approve(format!(
            "Score: {:.1}, Win: {:.0}%",
            stats.quality_score,
            stats.win_rate * 100.0
        ))
    }

    /// Profit-expectation multiplier from token history, 0.5–1.5. Averages
    /// a score-derived term with a direction-performance term.
    pub fn signal_modifier(&self, symbol: &str, direction: Direction) -> f64 {
        let state = self.state.read().unwrap();

        let Some(stats) = state.records.get(symbol) else {
            return 1.0;
        };
        if stats.total_signals < self.config.min_samples {
            return 1.0;
        }

        let score_modifier = 0.5 + stats.quality_score / 10.0;

        let (dir_wins, dir_total) = stats.direction_split(direction);
        let dir_modifier = if dir_total >= DIRECTION_MIN_SAMPLES {
            0.7 + (dir_wins as f64 / dir_total as f64) * 0.6
        } else {
            1.0
        };

        (score_modifier + dir_modifier) / 2.0
    }

    /// Well-proven tokens at or above `min_score`, best first, truncated.
    pub fn recommended_tokens(&self, min_score: f64, limit: usize) -> Vec<(String, f64)> {
        let state = self.state.read().unwrap();
        let mut list: Vec<(String, f64)> = state
            .order
            .iter()
            .filter_map(|symbol| state.records.get(symbol))
            .filter(|s| s.quality_score >= min_score && s.total_signals >= LIST_MIN_SAMPLES)
            .map(|s| (s.symbol.clone(), s.quality_score))
            .collect();
        list.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        list.truncate(limit);
        list
    }

    /// Well-proven tokens whose score has collapsed.
    pub fn avoid_tokens(&self) -> Vec<String> {
        let state = self.state.read().unwrap();
        state
            .order
            .iter()
            .filter_map(|symbol| state.records.get(symbol))
            .filter(|s| s.quality_score < AVOID_MAX_SCORE && s.total_signals >= LIST_MIN_SAMPLES)
            .map(|s| s.symbol.clone())
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> TokenIntelligenceEngine {
        TokenIntelligenceEngine::new(IntelligenceConfig::default())
    }

    fn record_win(engine: &TokenIntelligenceEngine, symbol: &str, direction: Direction) {
        engine.record_outcome(symbol, direction, Outcome::Win, 2.0, 200.0);
    }

    fn record_loss(engine: &TokenIntelligenceEngine, symbol: &str, direction: Direction) {
        engine.record_outcome(symbol, direction, Outcome::Lose, -1.5, 0.0);
    }

    // -- record_outcome tests --

    #[test]
    fn test_outcome_counters_sum_to_total() {
        let engine = engine();
        engine.record_outcome("BTC", Direction::Long, Outcome::Win, 2.0, 300.0);
        engine.record_outcome("BTC", Direction::Short, Outcome::Lose, -1.0, 0.0);
        engine.record_outcome("BTC", Direction::Long, Outcome::Draw, 0.1, 500.0);
        engine.record_outcome("BTC", Direction::Long, Outcome::Win, 3.0, 250.0);

        let stats = engine.stats("BTC").unwrap();
        assert_eq!(stats.total_signals, 4);
        assert_eq!(stats.wins + stats.losses + stats.draws, stats.total_signals);
        assert_eq!(stats.wins, 2);
        assert_eq!(stats.losses, 1);
        assert_eq!(stats.draws, 1);
        assert!((stats.win_rate - 0.5).abs() < 1e-10);
    }

    #[test]
    fn test_direction_counters() {
        let engine = engine();
        engine.record_outcome("BTC", Direction::Long, Outcome::Win, 2.0, 300.0);
        engine.record_outcome("BTC", Direction::Long, Outcome::Lose, -1.0, 0.0);
        engine.record_outcome("BTC", Direction::Short, Outcome::Win, 1.0, 400.0);
        engine.record_outcome("BTC", Direction::Short, Outcome::Draw, 0.0, 100.0);

        let stats = engine.stats("BTC").unwrap();
        assert_eq!(stats.long_total, 2);
        assert_eq!(stats.long_wins, 1);
        assert_eq!(stats.short_total, 2);
        assert_eq!(stats.short_wins, 1); // draws don't count as direction wins
    }

    #[test]
    fn test_profit_aggregates_and_extremes() {
        let engine = engine();
        engine.record_outcome("BTC", Direction::Long, Outcome::Win, 4.0, 300.0);
        engine.record_outcome("BTC", Direction::Long, Outcome::Lose, -2.5, 0.0);
        engine.record_outcome("BTC", Direction::Long, Outcome::Win, 1.0, 300.0);

        let stats = engine.stats("BTC").unwrap();
        assert!((stats.total_profit - 2.5).abs() < 1e-10);
        assert!((stats.avg_profit - 2.5 / 3.0).abs() < 1e-10);
        assert_eq!(stats.best_trade, 4.0);
        assert_eq!(stats.worst_trade, -2.5);
    }

    #[test]
    fn test_timing_skips_losses_and_zero_durations() {
        let engine = engine();
        engine.record_outcome("BTC", Direction::Long, Outcome::Lose, -1.0, 500.0);
        engine.record_outcome("BTC", Direction::Long, Outcome::Win, 2.0, 0.0);

        let stats = engine.stats("BTC").unwrap();
        assert_eq!(stats.avg_convergence_secs, 0.0);
        assert_eq!(stats.fastest_convergence_secs, f64::INFINITY);

        engine.record_outcome("BTC", Direction::Long, Outcome::Win, 2.0, 240.0);
        let stats = engine.stats("BTC").unwrap();
        assert_eq!(stats.avg_convergence_secs, 240.0); // EMA seeded
        assert_eq!(stats.fastest_convergence_secs, 240.0);
    }

    #[test]
    fn test_timing_ema_bounded() {
        let engine = engine();
        engine.record_outcome("BTC", Direction::Long, Outcome::Win, 2.0, 100.0);
        engine.record_outcome("BTC", Direction::Long, Outcome::Win, 2.0, 500.0);

        let stats = engine.stats("BTC").unwrap();
        assert!(stats.avg_convergence_secs > 100.0 && stats.avg_convergence_secs < 500.0);
        assert!((stats.avg_convergence_secs - 220.0).abs() < 1e-10); // 0.3*500 + 0.7*100
    }

    #[test]
    fn test_recent_outcomes_bounded_at_window() {
        let engine = engine();
        for _ in 0..25 {
            record_win(&engine, "BTC", Direction::Long);
        }
        let stats = engine.stats("BTC").unwrap();
        assert_eq!(stats.recent_outcomes.len(), 10);
    }

    #[test]
    fn test_recent_outcomes_evict_oldest() {
        let engine = engine();
        record_loss(&engine, "BTC", Direction::Long);
        for _ in 0..10 {
            record_win(&engine, "BTC", Direction::Long);
        }
        let stats = engine.stats("BTC").unwrap();
        assert!(stats.recent_outcomes.iter().all(|o| *o == Outcome::Win));
    }

    // -- quality_score tests --

    #[test]
    fn test_score_neutral_under_sample_threshold() {
        let engine = engine();
        assert_eq!(engine.score("UNKNOWN"), 5.0);

        record_win(&engine, "BTC", Direction::Long);
        record_win(&engine, "BTC", Direction::Long);
        assert_eq!(engine.score("BTC"), 5.0);
    }

    #[test]
    fn test_score_components_for_known_history() {
        let engine = engine();
        // 4 wins at 200s, +2% each: win 10, profit 5+1=6, speed 10,
        // consistency 10, confidence 4/20*10 = 2.
        for _ in 0..4 {
            record_win(&engine, "BTC", Direction::Long);
        }
        let expected = 10.0 * 0.35 + 6.0 * 0.25 + 10.0 * 0.20 + 10.0 * 0.10 + 2.0 * 0.10;
        assert!((engine.score("BTC") - round2(expected)).abs() < 1e-10);
    }

    #[test]
    fn test_score_in_range_at_time_boundaries() {
        let engine = engine();
        for _ in 0..3 {
            engine.record_outcome("FAST", Direction::Long, Outcome::Win, 0.0, 300.0);
            engine.record_outcome("SLOW", Direction::Long, Outcome::Win, 0.0, 3600.0);
        }
        for symbol in ["FAST", "SLOW"] {
            let score = engine.score(symbol);
            assert!((0.0..=10.0).contains(&score), "{symbol} score {score} out of range");
        }
        assert!(engine.score("FAST") > engine.score("SLOW"));
    }

    #[test]
    fn test_score_recomputed_after_every_mutation() {
        let engine = engine();
        for _ in 0..5 {
            record_win(&engine, "BTC", Direction::Long);
        }
        let high = engine.score("BTC");

        for _ in 0..5 {
            record_loss(&engine, "BTC", Direction::Long);
        }
        let low = engine.score("BTC");
        assert!(low < high);
    }

    #[test]
    fn test_score_clamps_extreme_losses() {
        let engine = engine();
        for _ in 0..5 {
            engine.record_outcome("RUG", Direction::Long, Outcome::Lose, -50.0, 0.0);
        }
        let score = engine.score("RUG");
        assert!((0.0..=10.0).contains(&score));
    }

    // -- should_signal tests --

    #[test]
    fn test_should_signal_unknown_and_undersampled_pass() {
        let engine = engine();
        assert!(engine.should_signal("NEW", Direction::Long, 4.0, 0.35).approved);

        record_loss(&engine, "BTC", Direction::Long);
        record_loss(&engine, "BTC", Direction::Long);
        let verdict = engine.should_signal("BTC", Direction::Long, 4.0, 0.35);
        assert!(verdict.approved);
        assert!(verdict.reason.contains("Insufficient data"));
    }

    #[test]
    fn test_should_signal_low_score_vetoes() {
        let engine = engine();
        for _ in 0..5 {
            record_loss(&engine, "DOGE", Direction::Long);
        }
        let verdict = engine.should_signal("DOGE", Direction::Long, 4.0, 0.0);
        assert!(!verdict.approved);
        assert!(verdict.reason.contains("Low quality score"));
    }

    #[test]
    fn test_should_signal_low_win_rate_vetoes() {
        let engine = engine();
        // Profitable but rarely winning: 1 win, 2 draws with profit.
        engine.record_outcome("ETH", Direction::Long, Outcome::Win, 5.0, 200.0);
        engine.record_outcome("ETH", Direction::Long, Outcome::Draw, 4.0, 200.0);
        engine.record_outcome("ETH", Direction::Long, Outcome::Draw, 4.0, 200.0);

        let verdict = engine.should_signal("ETH", Direction::Long, 0.0, 0.5);
        assert!(!verdict.approved);
        assert!(verdict.reason.contains("Low win rate"));
    }

    #[test]
    fn test_should_signal_direction_specific_veto() {
        let engine = engine();
        // Shorts win, longs always lose.
        for _ in 0..5 {
            record_win(&engine, "SOL", Direction::Short);
        }
        for _ in 0..3 {
            record_loss(&engine, "SOL", Direction::Long);
        }

        let long = engine.should_signal("SOL", Direction::Long, 0.0, 0.0);
        assert!(!long.approved);
        assert!(long.reason.contains("Poor LONG performance"));

        let short = engine.should_signal("SOL", Direction::Short, 0.0, 0.0);
        assert!(short.approved);
    }

    #[test]
    fn test_should_signal_streak_veto_overrides_good_score() {
        let engine = engine();
        // A long profitable history, then 4 losses in the last 5.
        for _ in 0..20 {
            record_win(&engine, "BTC", Direction::Long);
        }
        for _ in 0..4 {
            record_loss(&engine, "BTC", Direction::Long);
        }
        record_win(&engine, "BTC", Direction::Long);

        let verdict = engine.should_signal("BTC", Direction::Long, 0.0, 0.0);
        assert!(!verdict.approved);
        assert!(verdict.reason.contains("losing streak"));
    }

    #[test]
    fn test_should_signal_approves_with_summary() {
        let engine = engine();
        for _ in 0..6 {
            record_win(&engine, "BTC", Direction::Long);
        }
        let verdict = engine.should_signal("BTC", Direction::Long, 4.0, 0.35);
        assert!(verdict.approved);
        assert!(verdict.reason.contains("Score"));
        assert!(verdict.reason.contains("Win"));
    }

    // -- signal_modifier tests --

    #[test]
    fn test_modifier_neutral_without_history() {
        let engine = engine();
        assert_eq!(engine.signal_modifier("NEW", Direction::Long), 1.0);

        record_win(&engine, "BTC", Direction::Long);
        assert_eq!(engine.signal_modifier("BTC", Direction::Long), 1.0);
    }

    #[test]
    fn test_modifier_combines_score_and_direction_terms() {
        let engine = engine();
        for _ in 0..4 {
            record_win(&engine, "BTC", Direction::Long);
        }
        let stats = engine.stats("BTC").unwrap();
        let expected = ((0.5 + stats.quality_score / 10.0) + (0.7 + 1.0 * 0.6)) / 2.0;
        assert!((engine.signal_modifier("BTC", Direction::Long) - expected).abs() < 1e-10);

        // Short side has no samples → neutral direction term.
        let expected_short = ((0.5 + stats.quality_score / 10.0) + 1.0) / 2.0;
        assert!((engine.signal_modifier("BTC", Direction::Short) - expected_short).abs() < 1e-10);
    }

    #[test]
    fn test_modifier_stays_in_band() {
        let engine = engine();
        for _ in 0..20 {
            record_win(&engine, "GOOD", Direction::Long);
            record_loss(&engine, "BAD", Direction::Long);
        }
        for symbol in ["GOOD", "BAD"] {
            for direction in [Direction::Long, Direction::Short] {
                let m = engine.signal_modifier(symbol, direction);
                assert!((0.5..=1.5).contains(&m), "{symbol} {direction} modifier {m}");
            }
        }
    }

    // -- recommended / avoid tests --

    #[test]
    fn test_recommended_tokens_filtered_sorted_truncated() {
        let engine = engine();
        for _ in 0..10 {
            record_win(&engine, "GREAT", Direction::Long);
        }
        for i in 0..10 {
            // Mostly losing record → mid-low score.
            if i % 3 == 0 {
                record_win(&engine, "OKAY", Direction::Long);
            } else {
                record_loss(&engine, "OKAY", Direction::Long);
            }
        }
        for _ in 0..2 {
            record_win(&engine, "THIN", Direction::Long); // under 5 samples
        }

        let recommended = engine.recommended_tokens(6.0, 10);
        assert_eq!(recommended.len(), 1);
        assert_eq!(recommended[0].0, "GREAT");

        let top_all = engine.recommended_tokens(0.0, 1);
        assert_eq!(top_all.len(), 1);
        assert_eq!(top_all[0].0, "GREAT");
    }

    #[test]
    fn test_avoid_tokens_requires_samples() {
        let engine = engine();
        for _ in 0..6 {
            engine.record_outcome("RUG", Direction::Long, Outcome::Lose, -6.0, 0.0);
        }
        for _ in 0..2 {
            engine.record_outcome("THIN", Direction::Long, Outcome::Lose, -6.0, 0.0);
        }

        let avoid = engine.avoid_tokens();
        assert_eq!(avoid, vec!["RUG".to_string()]);
    }

    // -- load_from_store tests --

    fn event(symbol: &str, direction: Direction, outcome: Outcome, pnl: f64) -> OutcomeEvent {
        OutcomeEvent {
            symbol: symbol.to_string(),
            direction,
            outcome,
            profit_percent: pnl,
            duration_secs: 300.0,
        }
    }

    #[test]
    fn test_load_from_store_replays_history() {
        let engine = engine();
        engine.load_from_store(&[
            event("BTC", Direction::Long, Outcome::Win, 2.0),
            event("BTC", Direction::Long, Outcome::Win, 1.0),
            event("BTC", Direction::Short, Outcome::Lose, -1.0),
            event("ETH", Direction::Short, Outcome::Win, 3.0),
        ]);

        let btc = engine.stats("BTC").unwrap();
        assert_eq!(btc.total_signals, 3);
        assert_eq!(btc.wins, 2);
        assert_eq!(btc.long_total, 2);
        assert_eq!(btc.short_total, 1);
        assert_ne!(btc.quality_score, 5.0); // scored, not neutral

        let eth = engine.stats("ETH").unwrap();
        assert_eq!(eth.total_signals, 1);
        assert_eq!(eth.quality_score, 5.0); // still under threshold
    }
}
