//! Match data: API payload reshaping and CSV tables

pub mod csv_loader;
pub mod odds_api;

// Re-export commonly used types
pub use csv_loader::{load_matches, write_matches, DataError, MatchTable};
pub use odds_api::{
    aligned_rows, extract_h2h, join_results, resolve_outcome, MatchOdds, MatchRecord, OddsEvent,
    ScoreEvent, Sport,
};
