use std::path::Path;

use anyhow::{Context, Result};
use thiserror::Error;

use crate::table::{Cell, Table};

/// Row markers for schedule lines that are not games.
pub const NON_GAME_MARKERS: [&str; 4] = ["Bye Week", "Playoffs", "preview", "Canceled"];

/// Positional column names for the scraped games table.
pub const STATS_COLUMNS: [&str; 25] = [
    "Week",
    "Day",
    "Date",
    "Time",
    "Boxscore",
    "Result",
    "OT",
    "Record",
    "Location",
    "Opponent",
    "Points Scored",
    "Points Allowed",
    "Off 1stD",
    "Off TotYd",
    "Off PassY",
    "Off RushY",
    "Off To",
    "Def 1stD",
    "Def TotYd",
    "Def PassY",
    "Def RushY",
    "Def To",
    "Off ExP",
    "Def ExP",
    "ST ExP",
];

#[derive(Debug, Error)]
pub enum StatsError {
    #[error("stats table has {found} columns, schema expects {expected}")]
    SchemaWidth { expected: usize, found: usize },
    #[error(transparent)]
    Table(#[from] crate::table::TableError),
}

/// Reads a stats file with a two-level header, keeping the second level.
pub fn read_stats_table(path: &Path) -> Result<Table> {
    Table::read_csv(path, 2).with_context(|| format!("read stats table {}", path.display()))
}

/// True when any cell of the row contains a non-game marker. Missing cells
/// render as `nan`.
pub fn is_non_game_row(row: &[Cell]) -> bool {
    row.iter().any(|cell| {
        let text = cell.as_deref().unwrap_or("nan");
        NON_GAME_MARKERS.iter().any(|marker| text.contains(marker))
    })
}

pub fn clean_stats(mut table: Table) -> Result<Table, StatsError> {
    table.retain_rows(|row| !is_non_game_row(row));

    if table.width() != STATS_COLUMNS.len() {
        return Err(StatsError::SchemaWidth {
            expected: STATS_COLUMNS.len(),
            found: table.width(),
        });
    }
    table.set_columns(STATS_COLUMNS.iter().map(|c| c.to_string()).collect())?;
    table.drop_columns(&["Date", "Boxscore", "Opponent"])?;
    Ok(table)
}
