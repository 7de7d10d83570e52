use std::ops::RangeInclusive;
use std::path::PathBuf;

use thiserror::Error;

use crate::retry::RetryPolicy;

pub const TEAMS_FILE: &str = "teams.txt";
pub const TEAM_CODES_FILE: &str = "teams_codes.txt";
pub const TEAM_MAPPING_FILE: &str = "teams_mapping.txt";
pub const PENALTY_DIR: &str = "team_weekly_penalty";
pub const STATS_DIR: &str = "team_weekly_stats";
pub const MERGED_FILE: &str = "merged_data.txt";

const DEFAULT_PENALTY_YEARS: RangeInclusive<i32> = 2009..=2009;
const DEFAULT_STATS_YEARS: RangeInclusive<i32> = 2010..=2024;
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{key}={value:?} is not valid; expected {expected}")]
    Invalid {
        key: &'static str,
        value: String,
        expected: &'static str,
    },
}

/// What the merge does when a penalty table and its stats table disagree on
/// row count after cleaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MismatchPolicy {
    /// Log the mismatch and join anyway; the shorter side is padded.
    #[default]
    Warn,
    Fail,
}

/// What the penalty cleaner does with an opponent code absent from the mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnknownOpponentPolicy {
    #[default]
    NullFill,
    Fail,
}

/// Numbering order for Game IDs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GameIdOrder {
    /// Dense ids in order of first appearance in the merged table.
    #[default]
    FirstSeen,
    /// Dense ids in ascending Game Key order.
    KeySorted,
}

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub data_dir: PathBuf,
    pub penalty_years: RangeInclusive<i32>,
    pub stats_years: RangeInclusive<i32>,
    pub mismatch_policy: MismatchPolicy,
    pub unknown_opponent: UnknownOpponentPolicy,
    pub game_id_order: GameIdOrder,
    pub http_timeout_secs: u64,
    pub retry: RetryPolicy,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("."),
            penalty_years: DEFAULT_PENALTY_YEARS,
            stats_years: DEFAULT_STATS_YEARS,
            mismatch_policy: MismatchPolicy::default(),
            unknown_opponent: UnknownOpponentPolicy::default(),
            game_id_order: GameIdOrder::default(),
            http_timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
            retry: RetryPolicy::default(),
        }
    }
}

impl PipelineConfig {
    /// Defaults overridden by environment variables. Call after the binary
    /// has loaded its `.env` files. A set but unparseable value is an error.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// As [`PipelineConfig::from_env`], reading variables through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut cfg = Self::default();
        if let Some(dir) = nonempty(lookup("TEAM_WEEKLY_DATA_DIR")) {
            cfg.data_dir = PathBuf::from(dir);
        }
        const YEARS: &str = "YYYY or YYYY-YYYY";
        if let Some(years) =
            parsed(lookup("PENALTY_YEARS"), "PENALTY_YEARS", YEARS, parse_year_range)?
        {
            cfg.penalty_years = years;
        }
        if let Some(years) =
            parsed(lookup("STATS_YEARS"), "STATS_YEARS", YEARS, parse_year_range)?
        {
            cfg.stats_years = years;
        }
        if let Some(policy) = parsed(
            lookup("MISMATCH_POLICY"),
            "MISMATCH_POLICY",
            "warn or fail",
            parse_mismatch,
        )? {
            cfg.mismatch_policy = policy;
        }
        if let Some(policy) = parsed(
            lookup("UNKNOWN_OPPONENT"),
            "UNKNOWN_OPPONENT",
            "null or fail",
            parse_unknown_opponent,
        )? {
            cfg.unknown_opponent = policy;
        }
        if let Some(order) = parsed(
            lookup("GAME_ID_ORDER"),
            "GAME_ID_ORDER",
            "first-seen or sorted",
            parse_game_id_order,
        )? {
            cfg.game_id_order = order;
        }
        if let Some(secs) = parsed(
            lookup("HTTP_TIMEOUT_SECS"),
            "HTTP_TIMEOUT_SECS",
            "a positive number of seconds",
            |v| v.parse::<u64>().ok().filter(|secs| *secs > 0),
        )? {
            cfg.http_timeout_secs = secs;
        }
        cfg.retry = RetryPolicy::from_lookup(&lookup)?;
        Ok(cfg)
    }

    pub fn teams_path(&self) -> PathBuf {
        self.data_dir.join(TEAMS_FILE)
    }

    pub fn team_codes_path(&self) -> PathBuf {
        self.data_dir.join(TEAM_CODES_FILE)
    }

    pub fn mapping_path(&self) -> PathBuf {
        self.data_dir.join(TEAM_MAPPING_FILE)
    }

    pub fn penalty_dir(&self) -> PathBuf {
        self.data_dir.join(PENALTY_DIR)
    }

    pub fn stats_dir(&self) -> PathBuf {
        self.data_dir.join(STATS_DIR)
    }

    pub fn output_path(&self) -> PathBuf {
        self.data_dir.join(MERGED_FILE)
    }
}

fn nonempty(raw: Option<String>) -> Option<String> {
    raw.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Parses an optional variable; a present value that `parse` rejects is an error.
pub(crate) fn parsed<T>(
    raw: Option<String>,
    key: &'static str,
    expected: &'static str,
    parse: impl FnOnce(&str) -> Option<T>,
) -> Result<Option<T>, ConfigError> {
    let Some(value) = nonempty(raw) else {
        return Ok(None);
    };
    match parse(&value) {
        Some(v) => Ok(Some(v)),
        None => Err(ConfigError::Invalid {
            key,
            value,
            expected,
        }),
    }
}

/// Accepts `2010-2024` or a single year such as `2009`.
pub fn parse_year_range(raw: &str) -> Option<RangeInclusive<i32>> {
    let raw = raw.trim();
    let (start, end) = match raw.split_once('-') {
        Some((a, b)) => (a.trim().parse().ok()?, b.trim().parse().ok()?),
        None => {
            let year = raw.parse().ok()?;
            (year, year)
        }
    };
    (start <= end).then_some(start..=end)
}

pub fn parse_mismatch(raw: &str) -> Option<MismatchPolicy> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "warn" => Some(MismatchPolicy::Warn),
        "fail" => Some(MismatchPolicy::Fail),
        _ => None,
    }
}

pub fn parse_unknown_opponent(raw: &str) -> Option<UnknownOpponentPolicy> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "null" | "null-fill" => Some(UnknownOpponentPolicy::NullFill),
        "fail" => Some(UnknownOpponentPolicy::Fail),
        _ => None,
    }
}

pub fn parse_game_id_order(raw: &str) -> Option<GameIdOrder> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "first-seen" => Some(GameIdOrder::FirstSeen),
        "sorted" => Some(GameIdOrder::KeySorted),
        _ => None,
    }
}

/// Loads `.env.local` then `.env`; existing variables win.
pub fn load_dotenv() {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
}

/// `--data-dir <dir>` or `--data-dir=<dir>` from the process arguments.
pub fn parse_data_dir_arg() -> Option<PathBuf> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    data_dir_from_args(&args)
}

fn data_dir_from_args(args: &[String]) -> Option<PathBuf> {
    for (idx, arg) in args.iter().enumerate() {
        if let Some(path) = arg.strip_prefix("--data-dir=") {
            let trimmed = path.trim();
            if !trimmed.is_empty() {
                return Some(PathBuf::from(trimmed));
            }
        }
        if arg == "--data-dir" {
            let Some(next) = args.get(idx + 1) else {
                continue;
            };
            if !next.trim().is_empty() {
                return Some(PathBuf::from(next));
            }
        }
    }
    None
}

pub fn has_flag(flag: &str) -> bool {
    std::env::args().skip(1).any(|a| a == flag)
}
