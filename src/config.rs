//! Odds API configuration
//!
//! Passed explicitly to the client; nothing here is process-global.

use serde::{Deserialize, Serialize};
use std::env;

pub const DEFAULT_BASE_URL: &str = "https://api.the-odds-api.com/v4";
pub const DEFAULT_SPORT: &str = "basketball_nba";
pub const DEFAULT_REGIONS: &str = "uk";

/// The scores endpoint only looks back this many days
const MAX_DAYS_FROM: u32 = 3;

/// Settings for talking to The Odds API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OddsApiConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    /// Sport key, e.g. `basketball_nba`
    pub sport: String,
    /// Comma-separated bookmaker regions: uk, us, eu, au
    pub regions: String,
    pub markets: String,
    pub odds_format: String,
    pub date_format: String,
    /// Days of completed scores to request (1-3)
    pub days_from: u32,
    /// Preferred bookmaker key; the first one quoting a usable market otherwise
    pub bookmaker: Option<String>,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for OddsApiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            sport: DEFAULT_SPORT.to_string(),
            regions: DEFAULT_REGIONS.to_string(),
            markets: "h2h".to_string(),
            odds_format: "decimal".to_string(),
            date_format: "iso".to_string(),
            days_from: 1,
            bookmaker: None,
            timeout_secs: 30,
            user_agent: concat!("fairline/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl OddsApiConfig {
    /// Build from `ODDS_*` environment variables, falling back to defaults
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let non_empty = |key: &str| {
            env::var(key)
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        Self {
            api_key: non_empty("ODDS_API_KEY"),
            base_url: non_empty("ODDS_API_BASE_URL").unwrap_or(defaults.base_url),
            sport: non_empty("ODDS_SPORT").unwrap_or(defaults.sport),
            regions: non_empty("ODDS_REGIONS")
                .map(|r| r.to_ascii_lowercase())
                .unwrap_or(defaults.regions),
            bookmaker: non_empty("ODDS_BOOKMAKER"),
            days_from: non_empty("ODDS_DAYS_FROM")
                .and_then(|v| v.parse::<u32>().ok())
                .map(clamp_days_from)
                .unwrap_or(defaults.days_from),
            ..defaults
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_sport(mut self, sport: impl Into<String>) -> Self {
        self.sport = sport.into();
        self
    }

    pub fn with_days_from(mut self, days_from: u32) -> Self {
        self.days_from = clamp_days_from(days_from);
        self
    }
}

fn clamp_days_from(days: u32) -> u32 {
    days.clamp(1, MAX_DAYS_FROM)
}
