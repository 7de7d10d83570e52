use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::info;

use crate::config::PipelineConfig;
use crate::mapping::TeamMapping;
use crate::merge::{RowCountMismatch, merge_data};
use crate::normalize::{assign_game_ids, normalize, write_games};

#[derive(Debug, Clone)]
pub struct CleanSummary {
    pub output: PathBuf,
    pub files: usize,
    pub rows: usize,
    pub games: usize,
    pub mismatches: Vec<RowCountMismatch>,
}

/// Merges every penalty/stats pair under the configured data directory,
/// normalizes the result, numbers games and writes the merged output.
/// `raw_output`, when set, also receives the merged table before
/// normalization.
pub fn clean_merged(cfg: &PipelineConfig, raw_output: Option<&Path>) -> Result<CleanSummary> {
    let mapping = TeamMapping::load(&cfg.mapping_path())?;
    info!(entries = mapping.len(), "loaded team mapping");

    let merged = merge_data(cfg, &mapping)?;
    if let Some(path) = raw_output {
        merged
            .table
            .write_csv(path)
            .with_context(|| format!("write raw merged table {}", path.display()))?;
    }

    let mut games = normalize(&merged.table).context("normalize merged table")?;
    let distinct = assign_game_ids(&mut games, cfg.game_id_order);

    let output = cfg.output_path();
    write_games(&output, &games)?;
    info!(rows = games.len(), games = distinct, output = %output.display(), "wrote merged data");

    Ok(CleanSummary {
        output,
        files: merged.files,
        rows: games.len(),
        games: distinct,
        mismatches: merged.mismatches,
    })
}
