//! HTTP client for The Odds API
//!
//! Fetches sports, odds and scores. Requests are made once; there is no
//! retry or rate limiting, only logging of the quota headers the API returns.
//!
//! # Example
//!
//! ```no_run
//! use fairline::client::OddsApiClient;
//! use fairline::config::OddsApiConfig;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> anyhow::Result<()> {
//!     let client = OddsApiClient::new(OddsApiConfig::from_env())?;
//!     let records = client.fetch_records().await?;
//!     println!("Fetched {} matches", records.len());
//!     Ok(())
//! }
//! ```

use reqwest::header::HeaderMap;
use serde::de::DeserializeOwned;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

use crate::config::OddsApiConfig;
use crate::data::odds_api::{extract_h2h, join_results, MatchRecord, OddsEvent, ScoreEvent, Sport};

/// Client errors
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("Odds API returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("No API key configured (set ODDS_API_KEY)")]
    MissingApiKey,

    #[error("Failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Remaining/used request quota reported by the API
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Quota {
    pub remaining: Option<u64>,
    pub used: Option<u64>,
}

impl Quota {
    fn from_headers(headers: &HeaderMap) -> Self {
        let read = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok())
        };
        Self {
            remaining: read("x-requests-remaining"),
            used: read("x-requests-used"),
        }
    }
}

/// Odds API client
pub struct OddsApiClient {
    client: reqwest::Client,
    config: OddsApiConfig,
}

impl OddsApiClient {
    /// Create a new client with the given configuration
    pub fn new(config: OddsApiConfig) -> Result<Self, FetchError> {
        if config.api_key.is_none() {
            return Err(FetchError::MissingApiKey);
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(&config.user_agent)
            .build()?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &OddsApiConfig {
        &self.config
    }

    fn build_url(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
    }

    fn api_key(&self) -> &str {
        self.config.api_key.as_deref().unwrap_or_default()
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, FetchError> {
        let url = self.build_url(path);
        debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .query(&[("apiKey", self.api_key())])
            .query(query)
            .send()
            .await?;

        let quota = Quota::from_headers(response.headers());
        if let (Some(remaining), Some(used)) = (quota.remaining, quota.used) {
            info!("Odds API quota: {} remaining, {} used", remaining, used);
        }

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            let snippet: String = body.trim().chars().take(200).collect();
            return Err(FetchError::Status {
                status: status.as_u16(),
                body: snippet,
            });
        }

        Ok(serde_json::from_str(&body)?)
    }

    /// List in-season sports
    pub async fn list_sports(&self) -> Result<Vec<Sport>, FetchError> {
        self.get_json("sports", &[]).await
    }

    /// Upcoming and live matches with bookmaker prices
    pub async fn fetch_odds(&self) -> Result<Vec<OddsEvent>, FetchError> {
        let path = format!("sports/{}/odds", self.config.sport);
        let events: Vec<OddsEvent> = self
            .get_json(
                &path,
                &[
                    ("regions", self.config.regions.clone()),
                    ("markets", self.config.markets.clone()),
                    ("oddsFormat", self.config.odds_format.clone()),
                    ("dateFormat", self.config.date_format.clone()),
                ],
            )
            .await?;
        info!("Fetched odds for {} {} events", events.len(), self.config.sport);
        Ok(events)
    }

    /// Live and recently completed matches with scores
    pub async fn fetch_scores(&self) -> Result<Vec<ScoreEvent>, FetchError> {
        let path = format!("sports/{}/scores", self.config.sport);
        let events: Vec<ScoreEvent> = self
            .get_json(
                &path,
                &[
                    ("daysFrom", self.config.days_from.to_string()),
                    ("dateFormat", self.config.date_format.clone()),
                ],
            )
            .await?;
        info!(
            "Fetched scores for {} {} events",
            events.len(),
            self.config.sport
        );
        Ok(events)
    }

    /// Prices from `odds` joined with freshly fetched scores
    pub async fn settle(&self, odds: &[OddsEvent]) -> Result<Vec<MatchRecord>, FetchError> {
        let scores = self.fetch_scores().await?;
        let matches = extract_h2h(odds, self.config.bookmaker.as_deref());
        Ok(join_results(matches, &scores))
    }

    /// Fetch odds and scores and join them
    pub async fn fetch_records(&self) -> Result<Vec<MatchRecord>, FetchError> {
        let odds = self.fetch_odds().await?;
        self.settle(&odds).await
    }
}
