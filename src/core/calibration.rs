//! Calibration scoring for two-outcome probability forecasts

use serde::{Deserialize, Serialize};

use crate::error::{ensure_same_len, OddsError};
use crate::models::{Outcome, ProbabilityRow};

/// Brier score over co-indexed forecasts and outcomes
///
/// Each row contributes the squared distance between `[p_home, p_away]` and
/// the one-hot outcome `[o, 1 - o]`, so a row ranges from 0 (certain and
/// right) to 2 (certain and wrong). Row sums of `probs` are taken as given.
///
/// # Examples
/// ```
/// use fairline::core::calibration::brier_score;
/// use fairline::{Outcome, ProbabilityRow};
///
/// let score = brier_score(&[ProbabilityRow::new(0.5, 0.5)], &[Outcome::Home]).unwrap();
/// assert!((score - 0.5).abs() < 1e-12);
/// ```
pub fn brier_score(probs: &[ProbabilityRow], outcomes: &[Outcome]) -> Result<f64, OddsError> {
    ensure_same_len(probs.len(), outcomes.len(), "probabilities/outcomes")?;
    if probs.is_empty() {
        return Err(OddsError::Shape(
            "cannot score an empty forecast set".to_string(),
        ));
    }

    let total: f64 = probs
        .iter()
        .zip(outcomes)
        .map(|(p, o)| {
            let home_actual = o.as_indicator();
            let away_actual = 1.0 - home_actual;
            (p.home_prob - home_actual).powi(2) + (p.away_prob - away_actual).powi(2)
        })
        .sum();

    Ok(total / probs.len() as f64)
}

/// One bucket of a calibration curve
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationBin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
    /// Mean forecast home-win probability inside the bin
    pub avg_predicted: f64,
    /// Fraction of matches in the bin the home side actually won
    pub observed_rate: f64,
}

impl CalibrationBin {
    pub fn center(&self) -> f64 {
        (self.lower + self.upper) / 2.0
    }

    /// Observed minus predicted; positive when home wins were under-priced
    pub fn gap(&self) -> f64 {
        self.observed_rate - self.avg_predicted
    }
}

/// Largest bin count `calibration_curve` accepts
pub const MAX_BINS: usize = 1000;

/// Group forecasts into `n_bins` equal-width buckets of home-win probability
/// and compare the mean forecast with the observed home-win rate.
///
/// Buckets are `[i/n, (i+1)/n)` with the index taken as `floor(p * n)`; a
/// forecast of exactly 1.0 lands in the last bucket. Forecasts sitting exactly
/// on a decimal edge follow the floor, so with ten bins 0.3 lands in
/// `[0.3, 0.4)`, whereas digitizing against `linspace(0, 1, 11)` (whose fourth
/// edge is 0.30000000000000004) would put it in `[0.2, 0.3)`. Empty buckets
/// are left out. `n_bins` must be in `1..=MAX_BINS`.
pub fn calibration_curve(
    probs: &[ProbabilityRow],
    outcomes: &[Outcome],
    n_bins: usize,
) -> Result<Vec<CalibrationBin>, OddsError> {
    if n_bins == 0 || n_bins > MAX_BINS {
        return Err(OddsError::InvalidBinCount);
    }
    ensure_same_len(probs.len(), outcomes.len(), "probabilities/outcomes")?;

    // (count, predicted sum, observed sum)
    let mut sums = vec![(0usize, 0.0f64, 0.0f64); n_bins];

    for (p, o) in probs.iter().zip(outcomes) {
        let home = p.home_prob.clamp(0.0, 1.0);
        let idx = ((home * n_bins as f64).floor() as usize).min(n_bins - 1);
        let slot = &mut sums[idx];
        slot.0 += 1;
        slot.1 += home;
        slot.2 += o.as_indicator();
    }

    let width = 1.0 / n_bins as f64;

    Ok(sums
        .into_iter()
        .enumerate()
        .filter(|(_, (count, _, _))| *count > 0)
        .map(|(i, (count, predicted, observed))| CalibrationBin {
            lower: i as f64 * width,
            upper: (i + 1) as f64 * width,
            count,
            avg_predicted: predicted / count as f64,
            observed_rate: observed / count as f64,
        })
        .collect())
}
