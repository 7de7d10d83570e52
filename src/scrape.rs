use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use reqwest::StatusCode;
use reqwest::blocking::Client;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::PipelineConfig;
use crate::html_table::{ExtractedTable, TableSelector, extract_table};
use crate::retry::{RetryPolicy, Retryable};
use crate::roster::TeamRoster;

const PENALTY_URL: &str = "https://www.nflpenalties.com/team";
const STATS_URL: &str = "https://www.pro-football-reference.com/teams";
pub const STATS_TABLE_ID: &str = "games";

#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} returned http {status}")]
    Status { url: String, status: StatusCode },
    #[error("no table matching {0:?} in page")]
    TableNotFound(String),
    #[error("invalid selector {0}")]
    Selector(String),
}

impl Retryable for ScrapeError {
    fn is_transient(&self) -> bool {
        match self {
            ScrapeError::Request { .. } => true,
            ScrapeError::Status { status, .. } => {
                status.is_server_error() || *status == StatusCode::TOO_MANY_REQUESTS
            }
            ScrapeError::TableNotFound(_) | ScrapeError::Selector(_) => false,
        }
    }
}

pub fn penalty_url(team: &str, year: i32) -> String {
    format!("{PENALTY_URL}/{team}?year={year}")
}

pub fn stats_url(code: &str, year: i32) -> String {
    format!("{STATS_URL}/{code}/{year}.htm")
}

pub fn fetch_page(client: &Client, url: &str) -> Result<String, ScrapeError> {
    let request_err = |source| ScrapeError::Request {
        url: url.to_string(),
        source,
    };
    let resp = client.get(url).send().map_err(request_err)?;
    let status = resp.status();
    if !status.is_success() {
        return Err(ScrapeError::Status {
            url: url.to_string(),
            status,
        });
    }
    resp.text().map_err(request_err)
}

pub fn fetch_table(
    client: &Client,
    url: &str,
    which: TableSelector<'_>,
) -> Result<ExtractedTable, ScrapeError> {
    let html = fetch_page(client, url)?;
    extract_table(&html, which)
}

pub fn write_extracted(path: &Path, table: &ExtractedTable) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("create output dir {}", dir.display()))?;
    }
    let file = std::fs::File::create(path)
        .with_context(|| format!("create table file {}", path.display()))?;
    table
        .to_csv_writer(file)
        .with_context(|| format!("write table file {}", path.display()))
}

#[derive(Debug, Clone)]
pub struct ScrapeSummary {
    pub started_at: String,
    pub finished_at: String,
    pub attempted: usize,
    pub written: Vec<PathBuf>,
    pub errors: Vec<String>,
}

impl ScrapeSummary {
    fn start() -> Self {
        Self {
            started_at: Utc::now().to_rfc3339(),
            finished_at: String::new(),
            attempted: 0,
            written: Vec::new(),
            errors: Vec::new(),
        }
    }

    fn finish(mut self) -> Self {
        self.finished_at = Utc::now().to_rfc3339();
        self
    }
}

/// Fetches the first table of each team's penalty page for every configured
/// year. A failed team-year is logged and skipped; there is no retry.
pub fn scrape_penalties(
    client: &Client,
    cfg: &PipelineConfig,
    teams: &[String],
) -> Result<ScrapeSummary> {
    let out_dir = cfg.penalty_dir();
    let mut summary = ScrapeSummary::start();

    for year in cfg.penalty_years.clone() {
        for team in teams {
            summary.attempted += 1;
            let url = penalty_url(team, year);
            info!(team = %team, year, "fetching penalties");
            match fetch_table(client, &url, TableSelector::First) {
                Ok(table) => {
                    let path = out_dir.join(format!("{team}_{year}.csv"));
                    write_extracted(&path, &table)?;
                    summary.written.push(path);
                }
                Err(err) => {
                    warn!(team = %team, year, error = %err, "penalty scrape failed, skipping");
                    summary.errors.push(format!("{team} {year}: {err}"));
                }
            }
        }
    }
    Ok(summary.finish())
}

/// Fetches the games table of each roster team for every configured year,
/// retrying transient failures under `retry`. Files are named after the
/// team's display name.
pub fn scrape_stats(
    client: &Client,
    cfg: &PipelineConfig,
    roster: &TeamRoster,
    retry: &RetryPolicy,
) -> Result<ScrapeSummary> {
    let out_dir = cfg.stats_dir();
    let mut summary = ScrapeSummary::start();

    for year in cfg.stats_years.clone() {
        for entry in roster.entries() {
            summary.attempted += 1;
            let url = stats_url(&entry.code, year);
            info!(code = %entry.code, team = %entry.name, year, "fetching stats");
            let label = format!("{} {year}", entry.code);
            let fetched = retry.run(&label, || {
                fetch_table(client, &url, TableSelector::Id(STATS_TABLE_ID))
            });
            match fetched {
                Ok(table) => {
                    let path = out_dir.join(format!("{}_{year}.csv", entry.name));
                    write_extracted(&path, &table)?;
                    summary.written.push(path);
                }
                Err(err) => {
                    warn!(code = %entry.code, year, error = %err, "stats scrape failed, skipping");
                    summary.errors.push(format!("{} {year}: {err}", entry.code));
                }
            }
        }
    }
    Ok(summary.finish())
}

#[cfg(test)]
mod tests {
    use reqwest::StatusCode;

    use super::{ScrapeError, penalty_url, stats_url};
    use crate::retry::Retryable;

    #[test]
    fn urls_follow_site_templates() {
        assert_eq!(
            penalty_url("giants", 2009),
            "https://www.nflpenalties.com/team/giants?year=2009"
        );
        assert_eq!(
            stats_url("nyg", 2020),
            "https://www.pro-football-reference.com/teams/nyg/2020.htm"
        );
    }

    #[test]
    fn status_classification() {
        let err = |status| ScrapeError::Status {
            url: "u".to_string(),
            status,
        };
        assert!(err(StatusCode::BAD_GATEWAY).is_transient());
        assert!(err(StatusCode::TOO_MANY_REQUESTS).is_transient());
        assert!(!err(StatusCode::NOT_FOUND).is_transient());
        assert!(!ScrapeError::TableNotFound("table#games".to_string()).is_transient());
    }
}
