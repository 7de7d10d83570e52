use anyhow::{Result, anyhow};

use team_weekly::config::{self, PipelineConfig};
use team_weekly::http_client::http_client;
use team_weekly::roster::TeamRoster;
use team_weekly::{logging, scrape};

fn main() -> Result<()> {
    config::load_dotenv();
    logging::init();

    let mut cfg = PipelineConfig::from_env()?;
    if let Some(dir) = config::parse_data_dir_arg() {
        cfg.data_dir = dir;
    }

    let roster = TeamRoster::load(&cfg.teams_path(), &cfg.team_codes_path())?;
    if roster.is_empty() {
        return Err(anyhow!("team roster is empty"));
    }

    let client = http_client(cfg.http_timeout_secs)?;
    let summary = scrape::scrape_stats(client, &cfg, &roster, &cfg.retry)?;

    println!("Stats scrape complete");
    println!("Started: {}", summary.started_at);
    println!("Finished: {}", summary.finished_at);
    println!("Pages: {}/{}", summary.written.len(), summary.attempted);
    if !summary.errors.is_empty() {
        println!("Errors: {}", summary.errors.len());
        for err in summary.errors.iter().take(8) {
            println!(" - {err}");
        }
    }

    Ok(())
}
