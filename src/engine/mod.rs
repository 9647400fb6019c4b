//! The four gating engines.
//!
//! Each engine owns a symbol-keyed map of mutable records behind a single
//! lock: every mutation is applied as one atomic increment-then-recompute
//! step, and queries see records all-or-nothing. Engines never call each
//! other; the orchestrating caller combines their verdicts.

pub mod convergence;
pub mod funding;
pub mod intelligence;
pub mod momentum;

pub use convergence::ConvergenceEngine;
pub use funding::FundingEngine;
pub use intelligence::TokenIntelligenceEngine;
pub use momentum::MomentumEngine;

/// Average convergence time at or below this earns the full speed score.
pub(crate) const IDEAL_CONVERGENCE_SECS: f64 = 300.0;
/// Average convergence time at or above this earns no speed score.
pub(crate) const WORST_CONVERGENCE_SECS: f64 = 3600.0;

/// Exponential moving average, seeded by the first observed value.
pub(crate) fn ema(alpha: f64, current: f64, sample: f64) -> f64 {
    if current == 0.0 {
        sample
    } else {
        alpha * sample + (1.0 - alpha) * current
    }
}

/// Speed component of a composite score: 10 for fast convergence, 0 for
/// slow, linear in between.
pub(crate) fn speed_score(avg_secs: f64) -> f64 {
    if avg_secs <= IDEAL_CONVERGENCE_SECS {
        10.0
    } else if avg_secs >= WORST_CONVERGENCE_SECS {
        0.0
    } else {
        10.0 * (1.0 - (avg_secs - IDEAL_CONVERGENCE_SECS) / (WORST_CONVERGENCE_SECS - IDEAL_CONVERGENCE_SECS))
    }
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub(crate) fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ema_seeds_with_first_value() {
        assert_eq!(ema(0.3, 0.0, 120.0), 120.0);
    }

    #[test]
    fn test_ema_stays_between_old_and_new() {
        let updated = ema(0.3, 100.0, 200.0);
        assert!(updated > 100.0 && updated < 200.0);
        assert!((updated - 130.0).abs() < 1e-10);

        let down = ema(0.3, 200.0, 100.0);
        assert!(down > 100.0 && down < 200.0);
    }

    #[test]
    fn test_speed_score_boundaries() {
        assert_eq!(speed_score(0.0), 10.0);
        assert_eq!(speed_score(300.0), 10.0);
        assert_eq!(speed_score(3600.0), 0.0);
        assert_eq!(speed_score(7200.0), 0.0);

        let mid = speed_score(1950.0); // halfway between 300 and 3600
        assert!((mid - 5.0).abs() < 1e-10);
    }

    #[test]
    fn test_rounding() {
        assert_eq!(round2(3.14159), 3.14);
        assert_eq!(round2(3.145), 3.15);
        assert_eq!(round1(7.26), 7.3);
    }
}
