//! Synthetic Market Generation
//!
//! Generate bookmaker-style two-way odds from known probabilities, for
//! demos and for checking that de-vigging recovers the true prices.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::models::{OddsRow, Outcome};

/// Lowest price a synthetic book will quote
const MIN_QUOTED_ODDS: f64 = 1.01;

/// Synthetic odds generator
pub struct SyntheticOddsGenerator {
    /// Commission rate taken off the fair price
    margin: f64,
    /// Decimal places quoted prices are rounded to, if any
    decimals: Option<i32>,
}

impl SyntheticOddsGenerator {
    /// Create a new synthetic odds generator
    ///
    /// # Arguments
    /// * `margin` - Commission rate. Default is 0.05 (5%)
    pub fn new(margin: f64) -> Self {
        Self {
            margin,
            decimals: Some(2),
        }
    }

    /// Quote unrounded prices
    pub fn exact(mut self) -> Self {
        self.decimals = None;
        self
    }

    pub fn margin(&self) -> f64 {
        self.margin
    }

    /// Quote a two-way market whose true home-win probability is `home_prob`
    ///
    /// Odds = 1 / probability × (1 - commission rate)
    pub fn quote(&self, home_prob: f64) -> OddsRow {
        OddsRow::new(self.price(home_prob), self.price(1.0 - home_prob))
    }

    fn price(&self, prob: f64) -> f64 {
        let fair_odds = 1.0 / prob;
        let quoted = fair_odds * (1.0 - self.margin);
        let quoted = match self.decimals {
            Some(d) => {
                let scale = 10f64.powi(d);
                (quoted * scale).round() / scale
            }
            None => quoted,
        };
        quoted.max(MIN_QUOTED_ODDS)
    }

    /// Generate a seeded season of matches
    ///
    /// True home probabilities are drawn from `[0.15, 0.85]` and each match is
    /// settled against its own true probability.
    pub fn generate_season(&self, matches: usize, seed: u64) -> SyntheticSeason {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut season = SyntheticSeason::default();

        for _ in 0..matches {
            let home_prob: f64 = rng.gen_range(0.15..0.85);
            let outcome = if rng.gen::<f64>() < home_prob {
                Outcome::Home
            } else {
                Outcome::Away
            };
            season.true_home_probs.push(home_prob);
            season.odds.push(self.quote(home_prob));
            season.outcomes.push(outcome);
        }

        season
    }
}

impl Default for SyntheticOddsGenerator {
    fn default() -> Self {
        Self::new(0.05)
    }
}

/// Generated matches, co-indexed
#[derive(Debug, Clone, Default)]
pub struct SyntheticSeason {
    pub true_home_probs: Vec<f64>,
    pub odds: Vec<OddsRow>,
    pub outcomes: Vec<Outcome>,
}
