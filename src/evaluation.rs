//! End-to-end evaluation of a set of matches
//!
//! raw odds -> fair market -> favorite backtest, Brier score and
//! calibration curve.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::backtesting::{BacktestConfig, BacktestResult, FavoriteBacktester, DEFAULT_STAKE};
use crate::core::calibration::{brier_score, calibration_curve, CalibrationBin};
use crate::core::devig::{margin, normalize, FairMarket, MarginPolicy};
use crate::error::{ensure_same_len, OddsError};
use crate::models::{OddsRow, Outcome};

pub const DEFAULT_BINS: usize = 10;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationOptions {
    #[serde(default)]
    pub policy: MarginPolicy,
    #[serde(default = "default_stake")]
    pub stake: f64,
    #[serde(default = "default_bins")]
    pub bins: usize,
}

fn default_stake() -> f64 {
    DEFAULT_STAKE
}

fn default_bins() -> usize {
    DEFAULT_BINS
}

impl Default for EvaluationOptions {
    fn default() -> Self {
        Self {
            policy: MarginPolicy::default(),
            stake: DEFAULT_STAKE,
            bins: DEFAULT_BINS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Evaluation {
    pub policy: MarginPolicy,
    pub matches: usize,
    pub avg_margin: f64,
    pub fair: FairMarket,
    pub backtest: BacktestResult,
    pub brier_score: f64,
    pub calibration: Vec<CalibrationBin>,
}

/// Run every computation over one co-indexed set of matches
///
/// Nothing is returned unless every step succeeds.
pub fn evaluate(
    odds: &[OddsRow],
    outcomes: &[Outcome],
    options: &EvaluationOptions,
) -> Result<Evaluation, OddsError> {
    ensure_same_len(odds.len(), outcomes.len(), "odds/outcomes")?;

    let fair = normalize(options.policy, odds)?;

    let backtester = FavoriteBacktester::new(BacktestConfig {
        stake: options.stake,
    });
    let backtest = backtester.run(odds, outcomes, Some(&fair.probs))?;

    let brier_score = brier_score(&fair.probs, outcomes)?;
    let calibration = calibration_curve(&fair.probs, outcomes, options.bins)?;

    let avg_margin = odds.iter().map(margin).sum::<f64>() / odds.len() as f64;

    debug!(
        "Evaluated {} matches ({} policy): brier {:.4}, profit {:.2}",
        odds.len(),
        options.policy,
        brier_score,
        backtest.total_profit()
    );

    Ok(Evaluation {
        policy: options.policy,
        matches: odds.len(),
        avg_margin,
        fair,
        backtest,
        brier_score,
        calibration,
    })
}
