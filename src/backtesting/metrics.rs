//! Backtest Metrics
//!
//! Calculate metrics such as ROI, hit rate, drawdown, etc.

use super::simulator::BetRecord;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;

/// Backtest evaluation metrics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestMetrics {
    // Basic metrics
    pub total_bets: usize,
    pub winning_bets: usize,
    pub hit_rate: f64,
    pub roi: f64,

    // Price related
    pub avg_odds: f64,
    /// Mean fair probability of the backed side; 0 when none was recorded
    pub avg_probability: f64,

    // Risk metrics
    /// Infinite when nothing was lost; serialized as `null` in JSON
    #[serde(deserialize_with = "infinite_if_null")]
    pub profit_factor: f64,
    pub max_drawdown: f64,
    pub max_drawdown_pct: f64,

    // Win/Loss
    pub gross_profit: f64,
    pub gross_loss: f64,
    pub net_profit: f64,
}

impl Default for BacktestMetrics {
    fn default() -> Self {
        Self {
            total_bets: 0,
            winning_bets: 0,
            hit_rate: 0.0,
            roi: 0.0,
            avg_odds: 0.0,
            avg_probability: 0.0,
            profit_factor: 0.0,
            max_drawdown: 0.0,
            max_drawdown_pct: 0.0,
            gross_profit: 0.0,
            gross_loss: 0.0,
            net_profit: 0.0,
        }
    }
}

fn infinite_if_null<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::INFINITY))
}

/// Running total of a profit series
pub fn cumulative_profit(profits: &[f64]) -> Vec<f64> {
    profits
        .iter()
        .scan(0.0, |sum, &p| {
            *sum += p;
            Some(*sum)
        })
        .collect()
}

/// Largest peak-to-trough fall of the cumulative profit curve.
///
/// The curve starts at zero before the first bet.
pub fn max_drawdown(profits: &[f64]) -> f64 {
    let mut peak = 0.0f64;
    let mut worst = 0.0f64;
    for value in cumulative_profit(profits) {
        peak = peak.max(value);
        worst = worst.max(peak - value);
    }
    worst
}

/// Calculate metrics from bet records
pub fn calculate_metrics(bets: &[BetRecord], total_stake: f64) -> BacktestMetrics {
    if bets.is_empty() {
        return BacktestMetrics::default();
    }

    let total_bets = bets.len();
    let winning_bets = bets.iter().filter(|b| b.won).count();
    let hit_rate = winning_bets as f64 / total_bets as f64;

    let avg_odds: f64 = bets.iter().map(|b| b.odds).sum::<f64>() / total_bets as f64;
    let with_probability: Vec<f64> = bets.iter().filter_map(|b| b.probability).collect();
    let avg_probability = if with_probability.is_empty() {
        0.0
    } else {
        with_probability.iter().sum::<f64>() / with_probability.len() as f64
    };

    // Profit/Loss calculation
    let profits: Vec<f64> = bets.iter().map(|b| b.profit).collect();
    let gross_profit: f64 = profits.iter().filter(|&&p| p > 0.0).sum();
    let gross_loss: f64 = profits.iter().filter(|&&p| p < 0.0).map(|p| p.abs()).sum();
    let net_profit: f64 = profits.iter().sum();

    // Profit Factor
    let profit_factor = if gross_loss > 0.0 {
        gross_profit / gross_loss
    } else if gross_profit > 0.0 {
        f64::INFINITY
    } else {
        0.0
    };

    let max_drawdown = max_drawdown(&profits);

    let max_drawdown_pct = if total_stake > 0.0 {
        max_drawdown / total_stake
    } else {
        0.0
    };

    let roi = if total_stake > 0.0 {
        net_profit / total_stake
    } else {
        0.0
    };

    BacktestMetrics {
        total_bets,
        winning_bets,
        hit_rate,
        roi,
        avg_odds,
        avg_probability,
        profit_factor,
        max_drawdown,
        max_drawdown_pct,
        gross_profit,
        gross_loss,
        net_profit,
    }
}

/// Calculate Sharpe ratio of per-bet returns
pub fn calculate_sharpe_ratio(bets: &[BetRecord], risk_free_rate: f64) -> f64 {
    if bets.is_empty() {
        return 0.0;
    }

    let returns: Vec<f64> = bets.iter().map(|b| b.profit / b.stake).collect();

    let mean_return: f64 = returns.iter().sum::<f64>() / returns.len() as f64;

    let variance: f64 = returns
        .iter()
        .map(|r| (r - mean_return).powi(2))
        .sum::<f64>()
        / returns.len() as f64;

    let std_return = variance.sqrt();

    if std_return == 0.0 {
        return 0.0;
    }

    (mean_return - risk_free_rate) / std_return
}

/// Analysis results by dimension
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DimensionAnalysis {
    pub key: String,
    pub bets: usize,
    pub wins: usize,
    pub hit_rate: f64,
    pub stake: f64,
    pub profit: f64,
    pub roi: f64,
}

fn summarize(key: &str, group: &[&BetRecord]) -> DimensionAnalysis {
    let total = group.len();
    let wins = group.iter().filter(|b| b.won).count();
    let stake: f64 = group.iter().map(|b| b.stake).sum();
    let profit: f64 = group.iter().map(|b| b.profit).sum();

    DimensionAnalysis {
        key: key.to_string(),
        bets: total,
        wins,
        hit_rate: if total > 0 {
            wins as f64 / total as f64
        } else {
            0.0
        },
        stake,
        profit,
        roi: if stake > 0.0 { profit / stake } else { 0.0 },
    }
}

/// Analyze bet results by the side that was backed
pub fn analyze_by_side(bets: &[BetRecord]) -> Vec<DimensionAnalysis> {
    let mut grouped: HashMap<String, Vec<&BetRecord>> = HashMap::new();
    for bet in bets {
        grouped.entry(bet.side.to_string()).or_default().push(bet);
    }

    let mut results: Vec<DimensionAnalysis> = grouped
        .iter()
        .map(|(key, group)| summarize(key, group))
        .collect();

    results.sort_by(|a, b| a.key.cmp(&b.key));
    results
}

/// Analyze bet results by favorite odds range
pub fn analyze_by_odds_range(bets: &[BetRecord]) -> Vec<DimensionAnalysis> {
    let mut grouped: HashMap<&str, Vec<&BetRecord>> = HashMap::new();
    for bet in bets {
        let key = if bet.odds < 1.5 {
            "short (<1.5)"
        } else if bet.odds < 2.0 {
            "mid (1.5-2.0)"
        } else {
            "long (>=2.0)"
        };
        grouped.entry(key).or_default().push(bet);
    }

    let mut results: Vec<DimensionAnalysis> = grouped
        .iter()
        .map(|(key, group)| summarize(key, group))
        .collect();

    results.sort_by(|a, b| a.key.cmp(&b.key));
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Side;

    fn bet(index: usize, side: Side, odds: f64, won: bool) -> BetRecord {
        let stake = 10.0;
        BetRecord {
            index,
            side,
            odds,
            probability: None,
            stake,
            won,
            profit: if won { stake * (odds - 1.0) } else { -stake },
        }
    }

    fn create_test_bets() -> Vec<BetRecord> {
        vec![
            bet(0, Side::Home, 1.4, true),   // +4
            bet(1, Side::Away, 1.8, false),  // -10
            bet(2, Side::Home, 2.0, true),   // +10
        ]
    }

    #[test]
    fn test_calculate_metrics() {
        let bets = create_test_bets();
        let metrics = calculate_metrics(&bets, 30.0);

        assert_eq!(metrics.total_bets, 3);
        assert_eq!(metrics.winning_bets, 2);
        assert!((metrics.hit_rate - 0.6667).abs() < 0.01);
        assert!((metrics.gross_profit - 14.0).abs() < 1e-9);
        assert!((metrics.gross_loss - 10.0).abs() < 1e-9);
        assert!((metrics.net_profit - 4.0).abs() < 1e-9);
        assert!((metrics.profit_factor - 1.4).abs() < 1e-9);
        assert!((metrics.roi - 4.0 / 30.0).abs() < 1e-9);
        assert!((metrics.avg_odds - 1.7333).abs() < 0.001);
        assert_eq!(metrics.avg_probability, 0.0);
    }

    #[test]
    fn test_calculate_metrics_empty() {
        let metrics = calculate_metrics(&[], 0.0);

        assert_eq!(metrics.total_bets, 0);
        assert_eq!(metrics.winning_bets, 0);
        assert_eq!(metrics.hit_rate, 0.0);
    }

    #[test]
    fn test_profit_factor_without_losses() {
        let bets = vec![bet(0, Side::Home, 1.5, true)];
        let metrics = calculate_metrics(&bets, 10.0);
        assert!(metrics.profit_factor.is_infinite());

        let json = serde_json::to_string(&metrics).unwrap();
        assert!(json.contains("\"profit_factor\":null"));
        let back: BacktestMetrics = serde_json::from_str(&json).unwrap();
        assert!(back.profit_factor.is_infinite());
    }

    #[test]
    fn test_avg_probability_uses_recorded_values() {
        let mut bets = create_test_bets();
        bets[0].probability = Some(0.7);
        bets[2].probability = Some(0.5);
        let metrics = calculate_metrics(&bets, 30.0);
        assert!((metrics.avg_probability - 0.6).abs() < 1e-9);
    }

    #[test]
    fn test_cumulative_profit() {
        assert_eq!(cumulative_profit(&[5.0, -10.0, 2.5]), vec![5.0, -5.0, -2.5]);
        assert!(cumulative_profit(&[]).is_empty());
    }

    #[test]
    fn test_max_drawdown() {
        // Cumulative: 9, 8, 7 -> peak 9, drawdown 2
        assert!((max_drawdown(&[9.0, -1.0, -1.0]) - 2.0).abs() < 1e-9);
        // Losing from the start counts against the zero baseline
        assert!((max_drawdown(&[-10.0, -10.0, 5.0]) - 20.0).abs() < 1e-9);
        assert_eq!(max_drawdown(&[1.0, 2.0, 3.0]), 0.0);
    }

    #[test]
    fn test_calculate_sharpe_ratio() {
        let bets = create_test_bets();
        // Returns: 0.4, -1.0, 1.0 -> positive mean
        assert!(calculate_sharpe_ratio(&bets, 0.0) > 0.0);
        assert_eq!(calculate_sharpe_ratio(&[], 0.0), 0.0);
    }

    #[test]
    fn test_analyze_by_side() {
        let analysis = analyze_by_side(&create_test_bets());
        assert_eq!(analysis.len(), 2);

        let home = analysis.iter().find(|a| a.key == "home").unwrap();
        assert_eq!(home.bets, 2);
        assert_eq!(home.wins, 2);

        let away = analysis.iter().find(|a| a.key == "away").unwrap();
        assert_eq!(away.bets, 1);
        assert!((away.roi + 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_analyze_by_odds_range() {
        let analysis = analyze_by_odds_range(&create_test_bets());

        // odds: 1.4 (short), 1.8 (mid), 2.0 (long)
        assert_eq!(analysis.len(), 3);
        for range in &analysis {
            assert_eq!(range.bets, 1);
        }
        let short = analysis.iter().find(|a| a.key == "short (<1.5)").unwrap();
        assert_eq!(short.wins, 1);
    }
}
