use anyhow::Result;

use team_weekly::config::{self, MismatchPolicy, PipelineConfig};
use team_weekly::{logging, pipeline};

fn main() -> Result<()> {
    config::load_dotenv();
    logging::init();

    let mut cfg = PipelineConfig::from_env()?;
    if let Some(dir) = config::parse_data_dir_arg() {
        cfg.data_dir = dir;
    }
    if config::has_flag("--fail-on-mismatch") {
        cfg.mismatch_policy = MismatchPolicy::Fail;
    }
    let raw_output = config::has_flag("--raw").then(|| cfg.data_dir.join("merged_raw.txt"));

    let summary = pipeline::clean_merged(&cfg, raw_output.as_deref())?;

    println!("Merge complete");
    println!("Output: {}", summary.output.display());
    println!("Files merged: {}", summary.files);
    println!("Rows: {}", summary.rows);
    println!("Distinct games: {}", summary.games);
    if !summary.mismatches.is_empty() {
        println!("Row count mismatches: {}", summary.mismatches.len());
        for m in &summary.mismatches {
            println!(" - {m}");
        }
    }

    Ok(())
}
