//! Core probability and scoring modules

pub mod calibration;
pub mod devig;

// Re-export commonly used types
pub use calibration::{brier_score, calibration_curve, CalibrationBin};
pub use devig::{
    implied_probabilities, margin, normalize, normalize_uniform, normalize_weighted, FairMarket,
    MarginPolicy,
};
