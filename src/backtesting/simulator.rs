//! Backtest Simulator
//!
//! Level-stake betting on the market favorite over historical odds

use super::metrics::{calculate_metrics, BacktestMetrics};
use crate::error::{ensure_same_len, validate_stake, OddsError};
use crate::models::{OddsRow, Outcome, ProbabilityRow, Side};
use serde::{Deserialize, Serialize};

/// Default stake per bet
pub const DEFAULT_STAKE: f64 = 10.0;

/// Individual bet record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BetRecord {
    /// Position of the match in the input sequence
    pub index: usize,
    pub side: Side,
    pub odds: f64,
    /// Fair probability of the backed side, when supplied
    #[serde(skip_serializing_if = "Option::is_none")]
    pub probability: Option<f64>,
    pub stake: f64,
    pub won: bool,
    pub profit: f64,
}

/// Backtest result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestResult {
    pub bets: Vec<BetRecord>,
    pub total_stake: f64,
    pub total_payout: f64,
    pub metrics: Option<BacktestMetrics>,
}

impl BacktestResult {
    pub fn new() -> Self {
        Self {
            bets: Vec::new(),
            total_stake: 0.0,
            total_payout: 0.0,
            metrics: None,
        }
    }

    pub fn total_profit(&self) -> f64 {
        self.total_payout - self.total_stake
    }

    pub fn total_wins(&self) -> usize {
        self.bets.iter().filter(|b| b.won).count()
    }

    /// Per-bet profit series, in input order
    pub fn profits(&self) -> Vec<f64> {
        self.bets.iter().map(|b| b.profit).collect()
    }

    pub fn roi(&self) -> f64 {
        if self.total_stake == 0.0 {
            0.0
        } else {
            self.total_profit() / self.total_stake
        }
    }

    pub fn finalize(&mut self) {
        self.metrics = Some(calculate_metrics(&self.bets, self.total_stake));
    }
}

impl Default for BacktestResult {
    fn default() -> Self {
        Self::new()
    }
}

/// Backtest configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestConfig {
    pub stake: f64,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            stake: DEFAULT_STAKE,
        }
    }
}

/// Favorite-betting backtester
pub struct FavoriteBacktester {
    pub config: BacktestConfig,
}

impl FavoriteBacktester {
    pub fn new(config: BacktestConfig) -> Self {
        Self { config }
    }

    /// Back the favorite of every match with a level stake
    ///
    /// `probs`, when given, must be co-indexed with `odds`; the fair
    /// probability of the backed side is copied into each [`BetRecord`].
    pub fn run(
        &self,
        odds: &[OddsRow],
        outcomes: &[Outcome],
        probs: Option<&[ProbabilityRow]>,
    ) -> Result<BacktestResult, OddsError> {
        let stake = self.config.stake;
        validate_stake(stake)?;
        ensure_same_len(odds.len(), outcomes.len(), "odds/outcomes")?;
        if let Some(p) = probs {
            ensure_same_len(odds.len(), p.len(), "odds/probabilities")?;
        }

        let mut result = BacktestResult::new();
        result.bets.reserve(odds.len());

        for (index, (row, outcome)) in odds.iter().zip(outcomes).enumerate() {
            let side = row.favorite();
            let bet_odds = row.get(side);
            let won = outcome.winner() == side;

            let (payout, profit) = if won {
                (stake * bet_odds, stake * (bet_odds - 1.0))
            } else {
                (0.0, -stake)
            };

            result.bets.push(BetRecord {
                index,
                side,
                odds: bet_odds,
                probability: probs.map(|p| p[index].get(side)),
                stake,
                won,
                profit,
            });
            result.total_stake += stake;
            result.total_payout += payout;
        }

        result.finalize();
        Ok(result)
    }

    /// Print summary of backtest result
    pub fn print_summary(&self, result: &BacktestResult) {
        println!("\n{}", "=".repeat(60));
        println!("FAVORITE BACKTEST");
        println!("{}", "=".repeat(60));
        println!("Stake per bet: {:.2}", self.config.stake);
        println!("{}", "-".repeat(60));
        println!("Total bets: {}", result.bets.len());
        println!("Favorite wins: {}", result.total_wins());
        println!(
            "Home favorites: {}",
            result.bets.iter().filter(|b| b.side == Side::Home).count()
        );
        println!("{}", "-".repeat(60));
        println!("Total stake: {:.2}", result.total_stake);
        println!("Total payout: {:.2}", result.total_payout);
        println!("Total profit: {:.2}", result.total_profit());
        println!("ROI: {:.1}%", result.roi() * 100.0);

        if let Some(ref metrics) = result.metrics {
            println!("{}", "-".repeat(60));
            println!("Hit rate: {:.1}%", metrics.hit_rate * 100.0);
            println!("Average odds: {:.2}", metrics.avg_odds);
            println!("Profit factor: {:.2}", metrics.profit_factor);
            println!(
                "Max drawdown: {:.2} ({:.1}% of staked)",
                metrics.max_drawdown,
                metrics.max_drawdown_pct * 100.0
            );
        }

        println!("{}", "=".repeat(60));
    }
}

/// Bet `stake` on the favorite of every match
///
/// Returns the per-match profit series and the number of matches the
/// favorite won. Equal odds back the home side.
pub fn simulate_favorite(
    odds: &[OddsRow],
    outcomes: &[Outcome],
    stake: f64,
) -> Result<(Vec<f64>, usize), OddsError> {
    let backtester = FavoriteBacktester::new(BacktestConfig { stake });
    let result = backtester.run(odds, outcomes, None)?;
    Ok((result.profits(), result.total_wins()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_even_odds_home_wins() {
        let (profits, wins) =
            simulate_favorite(&[OddsRow::new(2.0, 2.0)], &[Outcome::Home], 10.0).unwrap();
        assert_eq!(profits, vec![10.0]);
        assert_eq!(wins, 1);
    }

    #[test]
    fn test_favorite_loses() {
        let (profits, wins) =
            simulate_favorite(&[OddsRow::new(1.5, 3.0)], &[Outcome::Away], 10.0).unwrap();
        assert_eq!(profits, vec![-10.0]);
        assert_eq!(wins, 0);
    }

    #[test]
    fn test_away_favorite_wins() {
        let (profits, wins) =
            simulate_favorite(&[OddsRow::new(3.0, 1.4)], &[Outcome::Away], 25.0).unwrap();
        assert!((profits[0] - 25.0 * 0.4).abs() < 1e-9);
        assert_eq!(wins, 1);
    }

    #[test]
    fn test_profit_rules_over_sequence() {
        let odds = vec![
            OddsRow::new(1.5, 2.7),
            OddsRow::new(2.4, 1.6),
            OddsRow::new(1.2, 5.0),
            OddsRow::new(1.9, 1.9),
        ];
        let outcomes = vec![Outcome::Home, Outcome::Home, Outcome::Home, Outcome::Away];
        let stake = 10.0;

        let (profits, wins) = simulate_favorite(&odds, &outcomes, stake).unwrap();

        assert_eq!(profits.len(), odds.len());
        assert!(wins <= odds.len());
        assert_eq!(wins, 2);
        assert!((profits[0] - stake * 0.5).abs() < 1e-9);
        assert_eq!(profits[1], -stake);
        assert!((profits[2] - stake * 0.2).abs() < 1e-9);
        // Tie backs home, away won
        assert_eq!(profits[3], -stake);
    }

    #[test]
    fn test_length_mismatch() {
        let err = simulate_favorite(
            &[OddsRow::new(1.5, 2.7), OddsRow::new(2.0, 1.8)],
            &[Outcome::Home],
            10.0,
        )
        .unwrap_err();
        assert!(matches!(err, OddsError::Shape(_)));
    }

    #[test]
    fn test_invalid_stake() {
        let odds = [OddsRow::new(1.5, 2.7)];
        let outcomes = [Outcome::Home];
        assert_eq!(
            simulate_favorite(&odds, &outcomes, 0.0).unwrap_err(),
            OddsError::InvalidStake(0.0)
        );
        assert!(simulate_favorite(&odds, &outcomes, -1.0).is_err());
    }

    #[test]
    fn test_empty_input() {
        let (profits, wins) = simulate_favorite(&[], &[], 10.0).unwrap();
        assert!(profits.is_empty());
        assert_eq!(wins, 0);
    }

    #[test]
    fn test_backtester_records_probability() {
        let odds = vec![OddsRow::new(1.5, 2.7), OddsRow::new(2.4, 1.6)];
        let probs = vec![ProbabilityRow::new(0.64, 0.36), ProbabilityRow::new(0.4, 0.6)];
        let outcomes = vec![Outcome::Home, Outcome::Away];

        let backtester = FavoriteBacktester::new(BacktestConfig::default());
        let result = backtester.run(&odds, &outcomes, Some(&probs)).unwrap();

        assert_eq!(result.bets[0].side, Side::Home);
        assert_eq!(result.bets[0].probability, Some(0.64));
        assert_eq!(result.bets[1].side, Side::Away);
        assert_eq!(result.bets[1].probability, Some(0.6));
        assert!((result.total_stake - 20.0).abs() < 1e-9);
        assert!((result.total_payout - (15.0 + 16.0)).abs() < 1e-9);
        assert!((result.total_profit() - 11.0).abs() < 1e-9);
        assert!(result.metrics.is_some());
    }

    #[test]
    fn test_backtester_probability_length_mismatch() {
        let odds = vec![OddsRow::new(1.5, 2.7)];
        let probs: Vec<ProbabilityRow> = Vec::new();
        let backtester = FavoriteBacktester::new(BacktestConfig::default());
        assert!(backtester
            .run(&odds, &[Outcome::Home], Some(&probs))
            .is_err());
    }

    #[test]
    fn test_backtest_result_roi_zero_stake() {
        let result = BacktestResult::new();
        assert_eq!(result.roi(), 0.0);
    }

    #[test]
    fn test_bet_record_serialization() {
        let record = BetRecord {
            index: 4,
            side: Side::Away,
            odds: 1.8,
            probability: None,
            stake: 10.0,
            won: true,
            profit: 8.0,
        };

        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"side\":\"away\""));
        assert!(!json.contains("probability"));

        let deserialized: BetRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, record);
    }
}
