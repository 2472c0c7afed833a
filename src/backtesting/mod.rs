//! Backtesting engine for the favorite-betting strategy

pub mod metrics;
pub mod simulator;
pub mod synthetic;

pub use metrics::{calculate_metrics, cumulative_profit, BacktestMetrics};
pub use simulator::{
    simulate_favorite, BacktestConfig, BacktestResult, BetRecord, FavoriteBacktester,
    DEFAULT_STAKE,
};
pub use synthetic::{SyntheticOddsGenerator, SyntheticSeason};
