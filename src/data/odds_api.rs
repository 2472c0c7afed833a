//! The Odds API (v4) payloads and their reshaping into aligned rows
//!
//! `/odds` returns one event per match with every bookmaker's markets nested
//! inside; `/scores` returns the same events with a completion flag and
//! per-team scores. Only two-outcome head-to-head (`h2h`) markets are kept.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

use crate::models::{OddsRow, Outcome};

/// Head-to-head market key
pub const H2H_MARKET: &str = "h2h";

/// Sport listed by `/sports`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sport {
    pub key: String,
    #[serde(default)]
    pub group: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub has_outrights: bool,
}

/// Match with bookmaker prices, from `/sports/{sport}/odds`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OddsEvent {
    pub id: String,
    pub sport_key: String,
    pub commence_time: DateTime<Utc>,
    pub home_team: String,
    pub away_team: String,
    #[serde(default)]
    pub bookmakers: Vec<Bookmaker>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bookmaker {
    pub key: String,
    pub title: String,
    #[serde(default)]
    pub markets: Vec<Market>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Market {
    pub key: String,
    #[serde(default)]
    pub outcomes: Vec<MarketOutcome>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketOutcome {
    pub name: String,
    pub price: f64,
}

/// Match status and scores, from `/sports/{sport}/scores`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreEvent {
    pub id: String,
    pub sport_key: String,
    pub commence_time: DateTime<Utc>,
    #[serde(default)]
    pub completed: bool,
    pub home_team: String,
    pub away_team: String,
    #[serde(default)]
    pub scores: Option<Vec<TeamScore>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamScore {
    pub name: String,
    pub score: String,
}

/// One match's two-way prices from a single bookmaker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchOdds {
    pub event_id: String,
    pub commence_time: DateTime<Utc>,
    pub home_team: String,
    pub away_team: String,
    pub bookmaker: String,
    pub odds: OddsRow,
}

/// Match prices joined with the result, when one is known
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRecord {
    #[serde(flatten)]
    pub odds: MatchOdds,
    pub outcome: Option<Outcome>,
}

/// Home/away prices from a bookmaker's h2h market
///
/// Returns `None` unless the market has exactly two outcomes named after the
/// two teams; three-way markets with a draw are not two-outcome markets.
fn h2h_prices(bookmaker: &Bookmaker, home_team: &str, away_team: &str) -> Option<OddsRow> {
    let market = bookmaker.markets.iter().find(|m| m.key == H2H_MARKET)?;
    if market.outcomes.len() != 2 {
        return None;
    }

    let price_of = |team: &str| {
        market
            .outcomes
            .iter()
            .find(|o| o.name == team)
            .map(|o| o.price)
    };

    Some(OddsRow::new(price_of(home_team)?, price_of(away_team)?))
}

/// Extract one two-way price per event
///
/// With `bookmaker` set only that bookmaker is used; otherwise the first
/// bookmaker quoting a usable h2h market wins. Events without one are
/// skipped.
pub fn extract_h2h(events: &[OddsEvent], bookmaker: Option<&str>) -> Vec<MatchOdds> {
    events
        .iter()
        .filter_map(|event| {
            let found = event
                .bookmakers
                .iter()
                .filter(|b| bookmaker.map_or(true, |key| b.key == key))
                .find_map(|b| {
                    h2h_prices(b, &event.home_team, &event.away_team).map(|row| (b, row))
                });

            match found {
                Some((book, odds)) => Some(MatchOdds {
                    event_id: event.id.clone(),
                    commence_time: event.commence_time,
                    home_team: event.home_team.clone(),
                    away_team: event.away_team.clone(),
                    bookmaker: book.key.clone(),
                    odds,
                }),
                None => {
                    debug!(
                        "No two-way h2h market for {} vs {} ({})",
                        event.home_team, event.away_team, event.id
                    );
                    None
                }
            }
        })
        .collect()
}

/// Settled result of a score event
///
/// `None` while the match is in play, when a score is missing or not a
/// number, or when it ended level.
pub fn resolve_outcome(event: &ScoreEvent) -> Option<Outcome> {
    if !event.completed {
        return None;
    }
    let scores = event.scores.as_ref()?;

    let score_of = |team: &str| -> Option<f64> {
        scores
            .iter()
            .find(|s| s.name == team)
            .and_then(|s| s.score.trim().parse::<f64>().ok())
    };

    let home = score_of(&event.home_team)?;
    let away = score_of(&event.away_team)?;

    if home > away {
        Some(Outcome::Home)
    } else if away > home {
        Some(Outcome::Away)
    } else {
        None
    }
}

/// Attach results to prices by event id, keeping the order of `odds`
pub fn join_results(odds: Vec<MatchOdds>, scores: &[ScoreEvent]) -> Vec<MatchRecord> {
    let outcomes: HashMap<&str, Option<Outcome>> = scores
        .iter()
        .map(|s| (s.id.as_str(), resolve_outcome(s)))
        .collect();

    odds.into_iter()
        .map(|m| {
            let outcome = outcomes.get(m.event_id.as_str()).copied().flatten();
            MatchRecord { odds: m, outcome }
        })
        .collect()
}

/// Co-indexed odds and outcomes for every settled match
pub fn aligned_rows(records: &[MatchRecord]) -> (Vec<OddsRow>, Vec<Outcome>) {
    records
        .iter()
        .filter_map(|r| r.outcome.map(|o| (r.odds.odds, o)))
        .unzip()
}

#[cfg(test)]
mod tests {
    use super::*;

    const ODDS_JSON: &str = r#"[
        {
            "id": "evt1",
            "sport_key": "basketball_nba",
            "sport_title": "NBA",
            "commence_time": "2024-11-02T00:10:00Z",
            "home_team": "Boston Celtics",
            "away_team": "Charlotte Hornets",
            "bookmakers": [
                {
                    "key": "williamhill",
                    "title": "William Hill",
                    "last_update": "2024-11-01T22:00:00Z",
                    "markets": [
                        {
                            "key": "h2h",
                            "last_update": "2024-11-01T22:00:00Z",
                            "outcomes": [
                                { "name": "Charlotte Hornets", "price": 6.5 },
                                { "name": "Boston Celtics", "price": 1.12 }
                            ]
                        }
                    ]
                },
                {
                    "key": "betfair",
                    "title": "Betfair",
                    "markets": [
                        {
                            "key": "h2h",
                            "outcomes": [
                                { "name": "Boston Celtics", "price": 1.14 },
                                { "name": "Charlotte Hornets", "price": 7.0 }
                            ]
                        }
                    ]
                }
            ]
        },
        {
            "id": "evt2",
            "sport_key": "basketball_nba",
            "commence_time": "2024-11-02T01:00:00Z",
            "home_team": "Denver Nuggets",
            "away_team": "Utah Jazz",
            "bookmakers": [
                {
                    "key": "betfair",
                    "title": "Betfair",
                    "markets": [
                        {
                            "key": "spreads",
                            "outcomes": [
                                { "name": "Denver Nuggets", "price": 1.91 },
                                { "name": "Utah Jazz", "price": 1.91 }
                            ]
                        },
                        {
                            "key": "h2h",
                            "outcomes": [
                                { "name": "Denver Nuggets", "price": 1.3 },
                                { "name": "Utah Jazz", "price": 3.6 }
                            ]
                        }
                    ]
                }
            ]
        },
        {
            "id": "evt3",
            "sport_key": "soccer_epl",
            "commence_time": "2024-11-02T15:00:00Z",
            "home_team": "Arsenal",
            "away_team": "Chelsea",
            "bookmakers": [
                {
                    "key": "betfair",
                    "title": "Betfair",
                    "markets": [
                        {
                            "key": "h2h",
                            "outcomes": [
                                { "name": "Arsenal", "price": 2.1 },
                                { "name": "Chelsea", "price": 3.4 },
                                { "name": "Draw", "price": 3.5 }
                            ]
                        }
                    ]
                }
            ]
        }
    ]"#;

    const SCORES_JSON: &str = r#"[
        {
            "id": "evt1",
            "sport_key": "basketball_nba",
            "commence_time": "2024-11-02T00:10:00Z",
            "completed": true,
            "home_team": "Boston Celtics",
            "away_team": "Charlotte Hornets",
            "scores": [
                { "name": "Boston Celtics", "score": "124" },
                { "name": "Charlotte Hornets", "score": "109" }
            ],
            "last_update": "2024-11-02T02:40:00Z"
        },
        {
            "id": "evt2",
            "sport_key": "basketball_nba",
            "commence_time": "2024-11-02T01:00:00Z",
            "completed": false,
            "home_team": "Denver Nuggets",
            "away_team": "Utah Jazz",
            "scores": null,
            "last_update": null
        }
    ]"#;

    fn events() -> Vec<OddsEvent> {
        serde_json::from_str(ODDS_JSON).unwrap()
    }

    fn scores() -> Vec<ScoreEvent> {
        serde_json::from_str(SCORES_JSON).unwrap()
    }

    #[test]
    fn test_extract_first_bookmaker() {
        let matches = extract_h2h(&events(), None);

        // The three-way soccer market is dropped
        assert_eq!(matches.len(), 2);

        assert_eq!(matches[0].event_id, "evt1");
        assert_eq!(matches[0].bookmaker, "williamhill");
        // Outcome order in the payload does not matter
        assert_eq!(matches[0].odds, OddsRow::new(1.12, 6.5));

        assert_eq!(matches[1].odds, OddsRow::new(1.3, 3.6));
    }

    #[test]
    fn test_extract_preferred_bookmaker() {
        let matches = extract_h2h(&events(), Some("betfair"));
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].bookmaker, "betfair");
        assert_eq!(matches[0].odds, OddsRow::new(1.14, 7.0));

        assert!(extract_h2h(&events(), Some("pinnacle")).is_empty());
    }

    #[test]
    fn test_resolve_outcome() {
        let scores = scores();
        assert_eq!(resolve_outcome(&scores[0]), Some(Outcome::Home));
        // Not completed
        assert_eq!(resolve_outcome(&scores[1]), None);

        let mut level = scores[0].clone();
        level.scores = Some(vec![
            TeamScore {
                name: "Boston Celtics".to_string(),
                score: "100".to_string(),
            },
            TeamScore {
                name: "Charlotte Hornets".to_string(),
                score: "100".to_string(),
            },
        ]);
        assert_eq!(resolve_outcome(&level), None);

        let mut away_win = scores[0].clone();
        away_win.scores = Some(vec![
            TeamScore {
                name: "Charlotte Hornets".to_string(),
                score: "99".to_string(),
            },
            TeamScore {
                name: "Boston Celtics".to_string(),
                score: "98".to_string(),
            },
        ]);
        assert_eq!(resolve_outcome(&away_win), Some(Outcome::Away));
    }

    #[test]
    fn test_join_and_align() {
        let records = join_results(extract_h2h(&events(), None), &scores());
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].outcome, Some(Outcome::Home));
        assert_eq!(records[1].outcome, None);

        let (odds, outcomes) = aligned_rows(&records);
        assert_eq!(odds, vec![OddsRow::new(1.12, 6.5)]);
        assert_eq!(outcomes, vec![Outcome::Home]);
    }

    #[test]
    fn test_sports_payload() {
        let json = r#"[{
            "key": "basketball_nba",
            "group": "Basketball",
            "title": "NBA",
            "description": "US Basketball",
            "active": true,
            "has_outrights": false
        }]"#;
        let sports: Vec<Sport> = serde_json::from_str(json).unwrap();
        assert_eq!(sports[0].key, "basketball_nba");
        assert!(sports[0].active);
    }
}
