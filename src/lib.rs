//! Fairline - fair odds and favorite backtests for two-way sports markets
//!
//! This library provides:
//! - Margin removal ("de-vigging") under uniform and weighted policies
//! - Level-stake favorite backtests with ROI, drawdown and hit-rate metrics
//! - Brier score and calibration curves for fair probabilities
//! - The Odds API payload reshaping and CSV match tables
//!
//! # Example
//!
//! ```
//! use fairline::backtesting::simulate_favorite;
//! use fairline::core::{brier_score, normalize_uniform};
//! use fairline::{OddsRow, Outcome};
//!
//! let odds = vec![OddsRow::new(2.0, 2.0)];
//! let outcomes = vec![Outcome::Home];
//!
//! let fair = normalize_uniform(&odds).unwrap();
//! let (profits, wins) = simulate_favorite(&odds, &outcomes, 10.0).unwrap();
//! let score = brier_score(&fair.probs, &outcomes).unwrap();
//!
//! assert_eq!(profits, vec![10.0]);
//! assert_eq!(wins, 1);
//! assert!((score - 0.5).abs() < 1e-12);
//! ```

pub mod backtesting;
pub mod config;
pub mod core;
pub mod data;
pub mod error;
pub mod evaluation;
pub mod models;

#[cfg(feature = "fetch")]
pub mod client;

#[cfg(feature = "plot")]
pub mod plot;

// Re-export commonly used types
pub use core::{FairMarket, MarginPolicy};
pub use error::OddsError;
pub use evaluation::{evaluate, Evaluation, EvaluationOptions};
pub use models::{OddsRow, Outcome, ProbabilityRow, Side};
