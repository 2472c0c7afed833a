use thiserror::Error;

use crate::models::Side;

/// Errors raised by the odds, backtest and scoring computations
#[derive(Debug, Clone, PartialEq, Error)]
pub enum OddsError {
    /// Odds at or below 1.0, or not a finite number
    #[error("Invalid odds at row {row} ({side}): {value} (must be a finite value > 1.0)")]
    InvalidOdds { row: usize, side: Side, value: f64 },

    /// Empty input, mismatched sequence lengths or missing columns
    #[error("Shape error: {0}")]
    Shape(String),

    /// Stake at or below zero, or not a finite number
    #[error("Invalid stake: {0} (must be > 0)")]
    InvalidStake(f64),

    /// Zero bins, or more than the calibration curve allows
    #[error(
        "Calibration needs between 1 and {} bins",
        crate::core::calibration::MAX_BINS
    )]
    InvalidBinCount,
}

/// Ensure two co-indexed sequences have the same length
pub fn ensure_same_len(left: usize, right: usize, what: &str) -> Result<(), OddsError> {
    if left != right {
        return Err(OddsError::Shape(format!(
            "{} length mismatch: {} vs {}",
            what, left, right
        )));
    }
    Ok(())
}

pub fn validate_stake(stake: f64) -> Result<(), OddsError> {
    if !stake.is_finite() || stake <= 0.0 {
        return Err(OddsError::InvalidStake(stake));
    }
    Ok(())
}

#[cfg(feature = "api")]
mod response {
    use actix_web::{http::StatusCode, HttpResponse, ResponseError};

    use super::OddsError;
    use crate::models::ErrorResponse;

    impl ResponseError for OddsError {
        fn status_code(&self) -> StatusCode {
            StatusCode::BAD_REQUEST
        }

        fn error_response(&self) -> HttpResponse {
            let error_code = match self {
                OddsError::InvalidOdds { .. } => "invalid_odds",
                OddsError::Shape(_) => "shape_error",
                OddsError::InvalidStake(_) => "invalid_stake",
                OddsError::InvalidBinCount => "invalid_bins",
            };

            HttpResponse::build(self.status_code()).json(ErrorResponse {
                error: error_code.to_string(),
                message: self.to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_same_len() {
        assert!(ensure_same_len(3, 3, "odds/outcomes").is_ok());
        let err = ensure_same_len(3, 2, "odds/outcomes").unwrap_err();
        assert!(err.to_string().contains("odds/outcomes length mismatch: 3 vs 2"));
    }

    #[test]
    fn test_validate_stake() {
        assert!(validate_stake(10.0).is_ok());
        assert!(validate_stake(0.01).is_ok());
        assert_eq!(validate_stake(0.0), Err(OddsError::InvalidStake(0.0)));
        assert_eq!(validate_stake(-5.0), Err(OddsError::InvalidStake(-5.0)));
        assert!(validate_stake(f64::NAN).is_err());
    }

    #[test]
    fn test_error_display() {
        let err = OddsError::InvalidOdds {
            row: 2,
            side: Side::Away,
            value: 0.9,
        };
        let msg = err.to_string();
        assert!(msg.contains("row 2"));
        assert!(msg.contains("away"));
    }

    #[cfg(feature = "api")]
    #[test]
    fn test_error_status_codes() {
        use actix_web::{http::StatusCode, ResponseError};

        assert_eq!(
            OddsError::Shape("".to_string()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            OddsError::InvalidStake(0.0).status_code(),
            StatusCode::BAD_REQUEST
        );
    }
}
