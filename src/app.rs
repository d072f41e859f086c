// Pipeline orchestration.
//
// Runs the stages strictly in sequence: load plays, aggregate, fit
// stability, scrape each configured board, reconcile the first two boards
// that parsed. A board that fails to fetch or parse is logged and dropped;
// it never takes the rest of the run down with it.

use crate::config::Config;
use crate::metrics::{aggregate_team_seasons, analyze_stability, StabilityReport, TeamSeasonMetric};
use crate::plays;
use crate::reconcile::{reconcile, Reconciliation};
use crate::scrape::{self, fetch::BoardFetcher, ScrapedBoard};

use anyhow::Context;
use std::path::Path;
use tracing::{error, info, warn};

/// Everything one run produced; the binary renders it.
#[derive(Debug)]
pub struct WorkbenchOutcome {
    pub metrics: Vec<TeamSeasonMetric>,
    pub stability: StabilityReport,
    pub boards: Vec<ScrapedBoard>,
    pub reconciliation: Option<Reconciliation>,
}

/// Execute the full pipeline. Relative data paths resolve against
/// `base_dir`.
pub async fn run(
    base_dir: &Path,
    config: &Config,
    fetcher: &dyn BoardFetcher,
) -> anyhow::Result<WorkbenchOutcome> {
    let plays_path = base_dir.join(&config.data.plays);
    info!("loading plays from {}", plays_path.display());
    let plays = plays::load_plays(&plays_path, config.seasons)
        .context("failed to load play-by-play data")?;
    info!(
        "loaded {} plays for seasons {}-{}",
        plays.len(),
        config.seasons.first,
        config.seasons.last
    );

    let metrics = aggregate_team_seasons(&plays);
    info!("aggregated {} team-season rows", metrics.len());

    let stability = analyze_stability(&metrics);
    info!(
        "fitted {} stability pairs ({} skipped)",
        stability.fits.len(),
        stability.skipped.len()
    );

    let mut boards = Vec::new();
    for board_cfg in &config.boards {
        match scrape::scrape_board(board_cfg, fetcher).await {
            Ok(board) => boards.push(board),
            Err(e) => {
                error!("board '{}' failed, continuing without it: {e}", board_cfg.name);
            }
        }
    }

    let reconciliation = if boards.len() >= 2 {
        Some(reconcile(&boards[0], &boards[1]))
    } else {
        warn!(
            "only {} board(s) scraped; skipping reconciliation",
            boards.len()
        );
        None
    };

    Ok(WorkbenchOutcome {
        metrics,
        stability,
        boards,
        reconciliation,
    })
}
