use serde::{Deserialize, Serialize};
use std::fmt;

use crate::core::devig::{FairMarket, MarginPolicy};
use crate::error::OddsError;
use crate::evaluation::EvaluationOptions;

/// Side of a two-outcome market
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Home,
    Away,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Home => write!(f, "home"),
            Side::Away => write!(f, "away"),
        }
    }
}

/// Decimal odds quoted for one match at one point in time
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OddsRow {
    pub home_odds: f64,
    pub away_odds: f64,
}

impl OddsRow {
    pub fn new(home_odds: f64, away_odds: f64) -> Self {
        Self {
            home_odds,
            away_odds,
        }
    }

    /// Odds quoted for the given side
    pub fn get(&self, side: Side) -> f64 {
        match side {
            Side::Home => self.home_odds,
            Side::Away => self.away_odds,
        }
    }

    /// Market favorite: the side with the strictly lower odds.
    ///
    /// Equal odds resolve to [`Side::Home`].
    pub fn favorite(&self) -> Side {
        if self.away_odds < self.home_odds {
            Side::Away
        } else {
            Side::Home
        }
    }

    /// Check that both prices are finite decimal odds above 1.0
    ///
    /// `row` is only used to locate the offending value in the error.
    pub fn validate(&self, row: usize) -> Result<(), OddsError> {
        for side in [Side::Home, Side::Away] {
            let value = self.get(side);
            if !value.is_finite() || value <= 1.0 {
                return Err(OddsError::InvalidOdds { row, side, value });
            }
        }
        Ok(())
    }
}

/// Home/away probabilities for one match
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProbabilityRow {
    pub home_prob: f64,
    pub away_prob: f64,
}

impl ProbabilityRow {
    pub fn new(home_prob: f64, away_prob: f64) -> Self {
        Self {
            home_prob,
            away_prob,
        }
    }

    pub fn get(&self, side: Side) -> f64 {
        match side {
            Side::Home => self.home_prob,
            Side::Away => self.away_prob,
        }
    }

    pub fn total(&self) -> f64 {
        self.home_prob + self.away_prob
    }
}

/// Realized result of a two-outcome match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum Outcome {
    Away = 0,
    Home = 1,
}

impl Outcome {
    /// 1.0 for a home win, 0.0 for an away win
    pub fn as_indicator(self) -> f64 {
        match self {
            Outcome::Home => 1.0,
            Outcome::Away => 0.0,
        }
    }

    pub fn from_indicator(value: i64) -> Option<Self> {
        match value {
            1 => Some(Outcome::Home),
            0 => Some(Outcome::Away),
            _ => None,
        }
    }

    pub fn winner(self) -> Side {
        match self {
            Outcome::Home => Side::Home,
            Outcome::Away => Side::Away,
        }
    }
}

impl TryFrom<i64> for Outcome {
    type Error = String;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Outcome::from_indicator(value)
            .ok_or_else(|| format!("outcome must be 0 (away) or 1 (home), got {}", value))
    }
}

impl From<Outcome> for i64 {
    fn from(outcome: Outcome) -> Self {
        outcome as i64
    }
}

/// Build odds rows from separate home and away columns
pub fn odds_rows_from_columns(home: &[f64], away: &[f64]) -> Result<Vec<OddsRow>, OddsError> {
    if home.len() != away.len() {
        return Err(OddsError::Shape(format!(
            "home column has {} values, away column has {}",
            home.len(),
            away.len()
        )));
    }

    Ok(home
        .iter()
        .zip(away)
        .map(|(&h, &a)| OddsRow::new(h, a))
        .collect())
}

/// Request for `POST /devig`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DevigRequest {
    pub odds: Vec<OddsRow>,
    #[serde(default)]
    pub policy: MarginPolicy,
}

/// Fair market plus the per-row margin that was removed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DevigResponse {
    pub policy: MarginPolicy,
    pub margins: Vec<f64>,
    pub fair: FairMarket,
}

/// Request for `POST /evaluate`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluateRequest {
    pub odds: Vec<OddsRow>,
    pub outcomes: Vec<Outcome>,
    #[serde(flatten)]
    pub options: EvaluationOptions,
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}
