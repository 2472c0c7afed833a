//! Margin removal ("de-vigging") for two-outcome markets
//!
//! Bookmaker odds imply probabilities that sum to more than 1. The excess is
//! the margin (overround):
//!
//! ```text
//! margin = 1/home_odds + 1/away_odds - 1
//! ```
//!
//! Two policies redistribute it so the fair probabilities sum to exactly 1:
//!
//! - [`MarginPolicy::Uniform`]: divide each implied probability by the row
//!   total.
//! - [`MarginPolicy::Weighted`]: allocate the margin with weights
//!   proportional to `(home_odds + away_odds) / odds`, so the favorite is
//!   charged the larger share, then subtract each allocation from the
//!   implied probability.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::OddsError;
use crate::models::{OddsRow, ProbabilityRow};

/// How the bookmaker margin is taken back out of the odds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarginPolicy {
    #[default]
    Uniform,
    Weighted,
}

impl fmt::Display for MarginPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarginPolicy::Uniform => write!(f, "uniform"),
            MarginPolicy::Weighted => write!(f, "weighted"),
        }
    }
}

impl FromStr for MarginPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "uniform" | "proportional" => Ok(MarginPolicy::Uniform),
            "weighted" => Ok(MarginPolicy::Weighted),
            other => Err(format!(
                "unknown margin policy '{}', expected uniform or weighted",
                other
            )),
        }
    }
}

/// Fair odds and probabilities, co-indexed with the input rows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FairMarket {
    pub odds: Vec<OddsRow>,
    pub probs: Vec<ProbabilityRow>,
}

impl FairMarket {
    pub fn len(&self) -> usize {
        self.odds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.odds.is_empty()
    }
}

/// Raw implied probabilities `1/odds`, margin included
pub fn implied_probabilities(row: &OddsRow) -> ProbabilityRow {
    ProbabilityRow::new(1.0 / row.home_odds, 1.0 / row.away_odds)
}

/// Bookmaker margin for one row; negative for arbitrage prices
pub fn margin(row: &OddsRow) -> f64 {
    implied_probabilities(row).total() - 1.0
}

/// De-vig with the given policy
pub fn normalize(policy: MarginPolicy, odds: &[OddsRow]) -> Result<FairMarket, OddsError> {
    match policy {
        MarginPolicy::Uniform => normalize_uniform(odds),
        MarginPolicy::Weighted => normalize_weighted(odds),
    }
}

/// Proportional normalization: each implied probability divided by the row total
///
/// # Examples
/// ```
/// use fairline::core::devig::normalize_uniform;
/// use fairline::OddsRow;
///
/// let fair = normalize_uniform(&[OddsRow::new(1.8, 2.0)]).unwrap();
/// let p = fair.probs[0];
/// assert!((p.home_prob + p.away_prob - 1.0).abs() < 1e-9);
/// ```
pub fn normalize_uniform(odds: &[OddsRow]) -> Result<FairMarket, OddsError> {
    validate_rows(odds)?;

    let probs: Vec<ProbabilityRow> = odds
        .iter()
        .map(|row| {
            let implied = implied_probabilities(row);
            let total = implied.total();
            ProbabilityRow::new(implied.home_prob / total, implied.away_prob / total)
        })
        .collect();

    Ok(to_market(probs))
}

/// Weighted normalization: the margin is shared out with weights
/// proportional to `row_total_odds / outcome_odds` and subtracted from the
/// implied probabilities.
pub fn normalize_weighted(odds: &[OddsRow]) -> Result<FairMarket, OddsError> {
    validate_rows(odds)?;

    let probs: Vec<ProbabilityRow> = odds
        .iter()
        .map(|row| {
            let implied = implied_probabilities(row);
            let margin = implied.total() - 1.0;

            let total_odds = row.home_odds + row.away_odds;
            let home_weight = total_odds / row.home_odds;
            let away_weight = total_odds / row.away_odds;
            let weight_sum = home_weight + away_weight;

            let home_allocation = home_weight / weight_sum * margin;
            let away_allocation = away_weight / weight_sum * margin;

            ProbabilityRow::new(
                implied.home_prob - home_allocation,
                implied.away_prob - away_allocation,
            )
        })
        .collect();

    Ok(to_market(probs))
}

fn validate_rows(odds: &[OddsRow]) -> Result<(), OddsError> {
    if odds.is_empty() {
        return Err(OddsError::Shape("no odds rows to normalize".to_string()));
    }
    for (i, row) in odds.iter().enumerate() {
        row.validate(i)?;
    }
    Ok(())
}

fn to_market(probs: Vec<ProbabilityRow>) -> FairMarket {
    let odds = probs
        .iter()
        .map(|p| OddsRow::new(1.0 / p.home_prob, 1.0 / p.away_prob))
        .collect();
    FairMarket { odds, probs }
}
