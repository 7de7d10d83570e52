use std::path::Path;

use anyhow::{Context, Result, anyhow};

use crate::config::UnknownOpponentPolicy;
use crate::mapping::TeamMapping;
use crate::table::Table;

/// Team and season encoded in a `{team}_{year}.csv` file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamYear {
    pub team: String,
    pub year: i32,
}

impl TeamYear {
    pub fn from_file_name(name: &str) -> Result<Self> {
        let Some((team, rest)) = name.split_once('_') else {
            return Err(anyhow!("file name {name:?} is not of the form team_year.csv"));
        };
        let year_part = rest.split('.').next().unwrap_or(rest);
        let year = year_part
            .parse::<i32>()
            .with_context(|| format!("file name {name:?} has non-numeric year {year_part:?}"))?;
        if team.is_empty() {
            return Err(anyhow!("file name {name:?} has an empty team"));
        }
        Ok(Self {
            team: team.to_string(),
            year,
        })
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .with_context(|| format!("no file name in {}", path.display()))?;
        Self::from_file_name(name)
    }

    pub fn file_name(&self) -> String {
        format!("{}_{}.csv", self.team, self.year)
    }
}

pub fn read_penalty_table(path: &Path) -> Result<Table> {
    Table::read_csv(path, 1).with_context(|| format!("read penalty table {}", path.display()))
}

/// Cleans one team-season penalty table into per-week rows.
///
/// The trailing season-total row is removed, `Team` and `Year` are attached
/// from the file name, and opponent codes are mapped to canonical names.
pub fn clean_penalty(
    mut table: Table,
    team_year: &TeamYear,
    mapping: &TeamMapping,
    unknown: UnknownOpponentPolicy,
) -> Result<Table> {
    table.drop_last_row();
    table.add_constant_column("Team", &team_year.team);

    for (row, cell) in table.column_cells_mut("Opponent")?.enumerate() {
        let mapped = cell.as_deref().and_then(|code| mapping.get(code));
        match (mapped, unknown) {
            (Some(name), _) => *cell = Some(name.to_string()),
            (None, UnknownOpponentPolicy::NullFill) => *cell = None,
            (None, UnknownOpponentPolicy::Fail) => {
                return Err(anyhow!(
                    "{}: opponent {:?} in row {row} has no mapping",
                    team_year.file_name(),
                    cell.as_deref().unwrap_or("")
                ));
            }
        }
    }

    table.add_constant_column("Year", &team_year.year.to_string());
    table.drop_columns(&["Outcome", "Week"])?;
    table.rename_columns(&[
        ("Total Count", "Penalty Count"),
        ("Total Yards", "Penalty Yards"),
    ]);
    Ok(table)
}
