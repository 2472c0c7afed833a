//! CSV loading and writing for historical match tables
//!
//! The table has one row per match with at least `home_odds`, `away_odds`
//! and `outcome` (1 = home win, 0 = away win). Files written by
//! [`write_matches`] add event id, kick-off, teams and bookmaker columns.

use polars::prelude::*;
use std::io::Write;
use std::path::Path;
use thiserror::Error;
use tracing::info;

use super::odds_api::MatchRecord;
use crate::error::OddsError;
use crate::models::{odds_rows_from_columns, OddsRow, Outcome};

pub const HOME_ODDS_COLUMN: &str = "home_odds";
pub const AWAY_ODDS_COLUMN: &str = "away_odds";
pub const OUTCOME_COLUMN: &str = "outcome";

/// Data loading errors
#[derive(Debug, Error)]
pub enum DataError {
    #[error("Failed to read table: {0}")]
    Polars(#[from] PolarsError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Missing required column '{0}'")]
    MissingColumn(String),

    #[error("Invalid value in row {row}: {reason}")]
    InvalidRow { row: usize, reason: String },

    #[error(transparent)]
    Odds(#[from] OddsError),
}

/// Historical matches as co-indexed columns
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchTable {
    pub odds: Vec<OddsRow>,
    pub outcomes: Vec<Outcome>,
}

impl MatchTable {
    pub fn len(&self) -> usize {
        self.odds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.odds.is_empty()
    }
}

fn float_column(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>, DataError> {
    let column = df
        .column(name)
        .map_err(|_| DataError::MissingColumn(name.to_string()))?
        .cast(&DataType::Float64)?;
    Ok(column.f64()?.into_iter().collect())
}

/// Load a match table from CSV
///
/// Every row must carry both prices and a 0/1 outcome; a blank or
/// non-numeric cell fails the whole load. Price validity (> 1.0) is left
/// to the computations that consume the table.
pub fn load_matches<P: AsRef<Path>>(csv_path: P) -> Result<MatchTable, DataError> {
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(csv_path.as_ref().to_path_buf()))?
        .finish()?;

    let home = float_column(&df, HOME_ODDS_COLUMN)?;
    let away = float_column(&df, AWAY_ODDS_COLUMN)?;
    let outcome = float_column(&df, OUTCOME_COLUMN)?;

    let mut home_odds = Vec::with_capacity(df.height());
    let mut away_odds = Vec::with_capacity(df.height());
    let mut outcomes = Vec::with_capacity(df.height());

    for (row, ((h, a), o)) in home.into_iter().zip(away).zip(outcome).enumerate() {
        let (Some(h), Some(a), Some(o)) = (h, a, o) else {
            return Err(DataError::InvalidRow {
                row,
                reason: "missing odds or outcome".to_string(),
            });
        };

        let outcome = if o.fract() == 0.0 {
            Outcome::from_indicator(o as i64)
        } else {
            None
        };
        let Some(outcome) = outcome else {
            return Err(DataError::InvalidRow {
                row,
                reason: format!("outcome must be 0 or 1, got {}", o),
            });
        };

        home_odds.push(h);
        away_odds.push(a);
        outcomes.push(outcome);
    }

    let table = MatchTable {
        odds: odds_rows_from_columns(&home_odds, &away_odds)?,
        outcomes,
    };

    info!(
        "Loaded {} matches from {}",
        table.len(),
        csv_path.as_ref().display()
    );
    Ok(table)
}

fn escape(value: &str) -> String {
    if value.contains(',') || value.contains('"') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Write settled matches as CSV
///
/// Records without a result are skipped. Returns the number of rows written.
pub fn write_matches<P: AsRef<Path>>(path: P, records: &[MatchRecord]) -> Result<usize, DataError> {
    let mut file = std::fs::File::create(path.as_ref())?;

    writeln!(
        file,
        "event_id,commence_time,home_team,away_team,bookmaker,{},{},{}",
        HOME_ODDS_COLUMN, AWAY_ODDS_COLUMN, OUTCOME_COLUMN
    )?;

    let mut written = 0;
    for record in records {
        let Some(outcome) = record.outcome else {
            continue;
        };
        let m = &record.odds;
        writeln!(
            file,
            "{},{},{},{},{},{},{},{}",
            escape(&m.event_id),
            m.commence_time.to_rfc3339(),
            escape(&m.home_team),
            escape(&m.away_team),
            escape(&m.bookmaker),
            m.odds.home_odds,
            m.odds.away_odds,
            i64::from(outcome)
        )?;
        written += 1;
    }

    info!("Wrote {} matches to {}", written, path.as_ref().display());
    Ok(written)
}
