use std::collections::HashMap;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use thiserror::Error;

use crate::config::GameIdOrder;
use crate::table::{Table, TableError};

/// Column order of the merged table before derived columns are added.
pub const CANONICAL_COLUMNS: [&str; 35] = [
    "Team",
    "Opponent",
    "Time",
    "Day",
    "Week",
    "Year",
    "Date",
    "Result",
    "OT",
    "Location",
    "Record",
    "Ref Crew",
    "Penalty Count",
    "Penalty Yards",
    "Off Count",
    "Off Yards",
    "Def Count",
    "Def Yards",
    "ST Count",
    "ST Yards",
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

/// Playoff round labels and the week numbers they stand for.
pub const PLAYOFF_WEEKS: [(&str, i64); 4] = [
    ("Wild Card", 19),
    ("Division", 20),
    ("Conf. Champ.", 21),
    ("SuperBowl", 22),
];

#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error(transparent)]
    Table(#[from] TableError),
    #[error("row {row}: column {column:?} value {value:?} is not an integer")]
    NotInteger {
        row: usize,
        column: &'static str,
        value: Option<String>,
    },
}

/// One team's view of one game, as written to the merged output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GameRecord {
    #[serde(rename = "Team")]
    pub team: String,
    #[serde(rename = "Opponent")]
    pub opponent: Option<String>,
    #[serde(rename = "Time")]
    pub time: Option<String>,
    #[serde(rename = "Day")]
    pub day: Option<String>,
    #[serde(rename = "Week")]
    pub week: i64,
    #[serde(rename = "Year")]
    pub year: i64,
    /// Game date as printed on the penalty page.
    #[serde(rename = "Date")]
    pub date: Option<String>,
    /// 1 for a win; losses and ties are both 0.
    #[serde(rename = "Result")]
    pub result: Option<i64>,
    #[serde(rename = "OT")]
    pub ot: i64,
    #[serde(rename = "Location")]
    pub location: i64,
    #[serde(rename = "Record")]
    pub record: Option<String>,
    #[serde(rename = "Ref Crew")]
    pub ref_crew: Option<String>,
    #[serde(rename = "Penalty Count")]
    pub penalty_count: Option<String>,
    #[serde(rename = "Penalty Yards")]
    pub penalty_yards: Option<String>,
    #[serde(rename = "Off Count")]
    pub off_count: Option<String>,
    #[serde(rename = "Off Yards")]
    pub off_yards: Option<String>,
    #[serde(rename = "Def Count")]
    pub def_count: Option<String>,
    #[serde(rename = "Def Yards")]
    pub def_yards: Option<String>,
    #[serde(rename = "ST Count")]
    pub st_count: Option<String>,
    #[serde(rename = "ST Yards")]
    pub st_yards: Option<String>,
    #[serde(rename = "Points Scored")]
    pub points_scored: i64,
    #[serde(rename = "Points Allowed")]
    pub points_allowed: i64,
    #[serde(rename = "Point Differential")]
    pub point_differential: i64,
    #[serde(rename = "Off 1stD")]
    pub off_first_downs: i64,
    #[serde(rename = "Off TotYd")]
    pub off_total_yards: i64,
    #[serde(rename = "Off PassY")]
    pub off_pass_yards: i64,
    #[serde(rename = "Off RushY")]
    pub off_rush_yards: i64,
    #[serde(rename = "Off To")]
    pub off_turnovers: i64,
    #[serde(rename = "Def 1stD")]
    pub def_first_downs: i64,
    #[serde(rename = "Def TotYd")]
    pub def_total_yards: i64,
    #[serde(rename = "Def PassY")]
    pub def_pass_yards: i64,
    #[serde(rename = "Def RushY")]
    pub def_rush_yards: i64,
    #[serde(rename = "Def To")]
    pub def_turnovers: i64,
    #[serde(rename = "Off ExP")]
    pub off_expected_points: Option<String>,
    #[serde(rename = "Def ExP")]
    pub def_expected_points: Option<String>,
    #[serde(rename = "ST ExP")]
    pub st_expected_points: Option<String>,
    #[serde(rename = "Game ID")]
    pub game_id: usize,
}

/// Identifies a physical game regardless of which side's row it came from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GameKey {
    pub year: i64,
    pub week: i64,
    pub teams: (String, String),
}

impl GameRecord {
    /// A missing opponent keys as the empty name, so such a row only shares
    /// an id with rows of the same team, week and year that also lack one.
    pub fn game_key(&self) -> GameKey {
        let a = self.team.clone();
        let b = self.opponent.clone().unwrap_or_default();
        let teams = if a <= b { (a, b) } else { (b, a) };
        GameKey {
            year: self.year,
            week: self.week,
            teams,
        }
    }
}

/// Parses integer text, accepting integral float renderings such as `24.0`.
pub fn parse_int(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    if let Ok(v) = raw.parse::<i64>() {
        return Some(v);
    }
    let f = raw.parse::<f64>().ok()?;
    (f.is_finite() && f.fract() == 0.0).then_some(f as i64)
}

/// Playoff labels map to weeks 19-22; anything else must be a week number.
pub fn map_week(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    PLAYOFF_WEEKS
        .iter()
        .find(|(label, _)| *label == raw)
        .map(|(_, week)| *week)
        .or_else(|| parse_int(raw))
}

pub fn map_result(raw: Option<&str>) -> Option<i64> {
    match raw {
        Some("W") => Some(1),
        Some("L") | Some("T") => Some(0),
        _ => None,
    }
}

pub fn map_ot(raw: Option<&str>) -> i64 {
    i64::from(raw == Some("OT"))
}

pub fn map_location(raw: Option<&str>) -> i64 {
    i64::from(raw == Some("@"))
}

pub fn normalize_name(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// One row of the selected table, read by column name.
struct RowView<'a> {
    idx: usize,
    cells: &'a [Option<String>],
    index: &'a HashMap<&'static str, usize>,
}

impl RowView<'_> {
    fn text(&self, column: &str) -> Option<&str> {
        self.index
            .get(column)
            .and_then(|&col| self.cells.get(col))
            .and_then(|cell| cell.as_deref())
    }

    fn owned(&self, column: &str) -> Option<String> {
        self.text(column).map(str::to_string)
    }

    fn int(&self, column: &'static str) -> Result<i64, NormalizeError> {
        self.text(column)
            .and_then(parse_int)
            .ok_or_else(|| self.not_integer(column))
    }

    fn int_or_zero(&self, column: &'static str) -> Result<i64, NormalizeError> {
        match self.text(column) {
            None => Ok(0),
            Some(raw) => parse_int(raw).ok_or_else(|| self.not_integer(column)),
        }
    }

    fn week(&self, column: &'static str) -> Result<i64, NormalizeError> {
        self.text(column)
            .and_then(map_week)
            .ok_or_else(|| self.not_integer(column))
    }

    fn not_integer(&self, column: &'static str) -> NormalizeError {
        NormalizeError::NotInteger {
            row: self.idx,
            column,
            value: self.owned(column),
        }
    }
}

/// Reorders the merged table into the canonical schema, coerces every typed
/// column and computes point differentials. Game IDs are left at zero; see
/// [`assign_game_ids`].
pub fn normalize(merged: &Table) -> Result<Vec<GameRecord>, NormalizeError> {
    let table = merged.select(&CANONICAL_COLUMNS)?;
    let index: HashMap<&'static str, usize> = CANONICAL_COLUMNS
        .iter()
        .enumerate()
        .map(|(col, name)| (*name, col))
        .collect();
    let mut out = Vec::with_capacity(table.len());

    for (idx, cells) in table.rows().iter().enumerate() {
        let r = RowView {
            idx,
            cells,
            index: &index,
        };
        let points_scored = r.int("Points Scored")?;
        let points_allowed = r.int("Points Allowed")?;
        out.push(GameRecord {
            team: r.text("Team").map(normalize_name).unwrap_or_default(),
            opponent: r.text("Opponent").map(normalize_name),
            time: r.owned("Time"),
            day: r.owned("Day"),
            week: r.week("Week")?,
            year: r.int("Year")?,
            date: r.owned("Date"),
            result: map_result(r.text("Result")),
            ot: map_ot(r.text("OT")),
            location: map_location(r.text("Location")),
            record: r.owned("Record"),
            ref_crew: r.owned("Ref Crew"),
            penalty_count: r.owned("Penalty Count"),
            penalty_yards: r.owned("Penalty Yards"),
            off_count: r.owned("Off Count"),
            off_yards: r.owned("Off Yards"),
            def_count: r.owned("Def Count"),
            def_yards: r.owned("Def Yards"),
            st_count: r.owned("ST Count"),
            st_yards: r.owned("ST Yards"),
            points_scored,
            points_allowed,
            point_differential: points_scored - points_allowed,
            off_first_downs: r.int("Off 1stD")?,
            off_total_yards: r.int("Off TotYd")?,
            off_pass_yards: r.int("Off PassY")?,
            off_rush_yards: r.int("Off RushY")?,
            off_turnovers: r.int_or_zero("Off To")?,
            def_first_downs: r.int("Def 1stD")?,
            def_total_yards: r.int("Def TotYd")?,
            def_pass_yards: r.int("Def PassY")?,
            def_rush_yards: r.int("Def RushY")?,
            def_turnovers: r.int_or_zero("Def To")?,
            off_expected_points: r.owned("Off ExP"),
            def_expected_points: r.owned("Def ExP"),
            st_expected_points: r.owned("ST ExP"),
            game_id: 0,
        });
    }
    Ok(out)
}

/// Gives every record sharing a [`GameKey`] the same dense id. Returns the
/// number of distinct games.
pub fn assign_game_ids(games: &mut [GameRecord], order: GameIdOrder) -> usize {
    let keys: Vec<GameKey> = games.iter().map(GameRecord::game_key).collect();
    let mut ids: HashMap<&GameKey, usize> = HashMap::new();

    match order {
        GameIdOrder::FirstSeen => {
            for key in &keys {
                let next = ids.len();
                ids.entry(key).or_insert(next);
            }
        }
        GameIdOrder::KeySorted => {
            let mut sorted: Vec<&GameKey> = keys.iter().collect();
            sorted.sort();
            sorted.dedup();
            for (id, key) in sorted.into_iter().enumerate() {
                ids.insert(key, id);
            }
        }
    }

    for (game, key) in games.iter_mut().zip(&keys) {
        game.game_id = ids[key];
    }
    ids.len()
}

pub fn write_games_to<W: Write>(writer: W, games: &[GameRecord]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    for game in games {
        wtr.serialize(game).context("serialize game record")?;
    }
    wtr.flush().context("flush merged output")?;
    Ok(())
}

pub fn write_games(path: &Path, games: &[GameRecord]) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("create merged output {}", path.display()))?;
    write_games_to(file, games)
}
