use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::{MismatchPolicy, PipelineConfig, UnknownOpponentPolicy};
use crate::mapping::TeamMapping;
use crate::penalty::{TeamYear, clean_penalty, read_penalty_table};
use crate::stats::{clean_stats, read_stats_table};
use crate::table::Table;

/// Paired penalty and stats tables that clean to different lengths. The
/// positional join pads the shorter side, so rows after the first gap are
/// misaligned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowCountMismatch {
    pub file: String,
    pub penalty_rows: usize,
    pub stats_rows: usize,
}

impl fmt::Display for RowCountMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "row count mismatch for {}: penalty={} stats={}",
            self.file, self.penalty_rows, self.stats_rows
        )
    }
}

#[derive(Debug, Error)]
pub enum MergeError {
    #[error("no stats file {stats} for penalty file {penalty}")]
    MissingPair { penalty: PathBuf, stats: PathBuf },
    #[error("{0}")]
    RowCountMismatch(RowCountMismatch),
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MergeOptions {
    pub mismatch: MismatchPolicy,
    pub unknown_opponent: UnknownOpponentPolicy,
}

impl From<&PipelineConfig> for MergeOptions {
    fn from(cfg: &PipelineConfig) -> Self {
        Self {
            mismatch: cfg.mismatch_policy,
            unknown_opponent: cfg.unknown_opponent,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MergeOutcome {
    pub table: Table,
    pub files: usize,
    pub mismatches: Vec<RowCountMismatch>,
}

/// Every `*.csv` file in `dir`, sorted by file name.
pub fn list_penalty_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let entries =
        std::fs::read_dir(dir).with_context(|| format!("list penalty dir {}", dir.display()))?;
    for entry in entries {
        let path = entry
            .with_context(|| format!("read entry in {}", dir.display()))?
            .path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "csv") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// The stats file sharing `penalty_path`'s basename under `stats_dir`.
pub fn paired_stats_path(penalty_path: &Path, stats_dir: &Path) -> Result<PathBuf, MergeError> {
    let stats = match penalty_path.file_name() {
        Some(name) => stats_dir.join(name),
        None => stats_dir.to_path_buf(),
    };
    if !stats.is_file() {
        return Err(MergeError::MissingPair {
            penalty: penalty_path.to_path_buf(),
            stats,
        });
    }
    Ok(stats)
}

/// Joins two cleaned tables by row position, checking their lengths first.
pub fn join_cleaned(
    file: &str,
    penalty: &Table,
    stats: &Table,
    policy: MismatchPolicy,
) -> Result<(Table, Option<RowCountMismatch>), MergeError> {
    let mismatch = (penalty.len() != stats.len()).then(|| RowCountMismatch {
        file: file.to_string(),
        penalty_rows: penalty.len(),
        stats_rows: stats.len(),
    });
    if let Some(m) = &mismatch {
        match policy {
            MismatchPolicy::Fail => return Err(MergeError::RowCountMismatch(m.clone())),
            MismatchPolicy::Warn => {
                warn!(
                    file = %m.file,
                    penalty_rows = m.penalty_rows,
                    stats_rows = m.stats_rows,
                    "WARNING: Row count mismatch for {}\n{}\n{}",
                    m.file,
                    penalty,
                    stats
                );
            }
        }
    }
    Ok((Table::hconcat(penalty, stats), mismatch))
}

/// Cleans one penalty file and its stats counterpart and joins them.
pub fn merge_pair(
    penalty_path: &Path,
    stats_dir: &Path,
    mapping: &TeamMapping,
    opts: MergeOptions,
) -> Result<(Table, Option<RowCountMismatch>)> {
    let stats_path = paired_stats_path(penalty_path, stats_dir)?;
    let team_year = TeamYear::from_path(penalty_path)?;
    let file = team_year.file_name();

    let penalty = clean_penalty(
        read_penalty_table(penalty_path)?,
        &team_year,
        mapping,
        opts.unknown_opponent,
    )
    .with_context(|| format!("clean penalty table {}", penalty_path.display()))?;
    let stats = clean_stats(read_stats_table(&stats_path)?)
        .with_context(|| format!("clean stats table {}", stats_path.display()))?;

    debug!(file = %file, penalty_rows = penalty.len(), stats_rows = stats.len(), "cleaned pair");
    let joined = join_cleaned(&file, &penalty, &stats, opts.mismatch)?;
    Ok(joined)
}

/// Merges every penalty file in the configured directory with its stats
/// pair and stacks the results.
pub fn merge_data(cfg: &PipelineConfig, mapping: &TeamMapping) -> Result<MergeOutcome> {
    let files = list_penalty_files(&cfg.penalty_dir())?;
    merge_files(&files, &cfg.stats_dir(), mapping, MergeOptions::from(cfg))
}

pub fn merge_files(
    penalty_files: &[PathBuf],
    stats_dir: &Path,
    mapping: &TeamMapping,
    opts: MergeOptions,
) -> Result<MergeOutcome> {
    let mut parts = Vec::with_capacity(penalty_files.len());
    let mut mismatches = Vec::new();
    for path in penalty_files {
        let (table, mismatch) = merge_pair(path, stats_dir, mapping, opts)?;
        mismatches.extend(mismatch);
        parts.push(table);
    }

    let table = Table::vconcat(&parts);
    info!(
        files = penalty_files.len(),
        rows = table.len(),
        mismatches = mismatches.len(),
        "merged team-week tables"
    );
    Ok(MergeOutcome {
        table,
        files: penalty_files.len(),
        mismatches,
    })
}
