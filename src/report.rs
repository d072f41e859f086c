// Report rendering and CSV export.
//
// Fixed-width tables for stdout, and the same data as CSV files when an
// export directory is configured. Rendering never consumes its inputs; the
// binary prints whatever stages actually ran.

use crate::metrics::aggregate::TeamSeasonMetric;
use crate::metrics::stability::StabilityReport;
use crate::reconcile::Reconciliation;
use crate::scrape::ScrapedBoard;
use std::path::{Path, PathBuf};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Formatting helpers
// ---------------------------------------------------------------------------

/// Missing means are rendered as a dash, never as 0 or NaN.
fn fmt_opt(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{v:.3}"),
        None => "-".to_string(),
    }
}

fn fmt_opt_rank(value: Option<u32>) -> String {
    match value {
        Some(v) => v.to_string(),
        None => "-".to_string(),
    }
}

// ---------------------------------------------------------------------------
// Tables
// ---------------------------------------------------------------------------

/// Team-season efficiency summary.
pub fn render_metrics_table(metrics: &[TeamSeasonMetric]) -> String {
    let mut out = String::new();
    out.push_str("Team-season efficiency\n");
    out.push_str(&format!(
        "{:<8} {:<6} {:<8} {:>6} {:>7} {:>7} {:>9} {:>9}\n",
        "season", "team", "role", "plays", "passes", "rushes", "epa/pass", "epa/rush"
    ));
    for m in metrics {
        out.push_str(&format!(
            "{:<8} {:<6} {:<8} {:>6} {:>7} {:>7} {:>9} {:>9}\n",
            m.season,
            m.team,
            m.role.label(),
            m.plays,
            m.passes,
            m.rushes,
            fmt_opt(m.epa_per_pass),
            fmt_opt(m.epa_per_rush),
        ));
    }
    out
}

/// Stability fits sorted by R-squared, plus the pairs that were skipped.
pub fn render_stability_table(report: &StabilityReport) -> String {
    let mut out = String::new();
    out.push_str("Year-over-year stability (current ~ prior season)\n");
    out.push_str(&format!(
        "{:<8} {:<14} {:<14} {:>4} {:>8} {:>10} {:>6} {:>8}\n",
        "role", "target", "predictor", "n", "slope", "intercept", "r^2", "p"
    ));
    for f in &report.fits {
        out.push_str(&format!(
            "{:<8} {:<14} {:<14} {:>4} {:>8.3} {:>10.3} {:>6.3} {:>8.4}\n",
            f.role.label(),
            f.target.label(),
            f.predictor.label(),
            f.fit.n,
            f.fit.slope,
            f.fit.intercept,
            f.fit.r_squared,
            f.fit.p_value,
        ));
    }
    for s in &report.skipped {
        out.push_str(&format!(
            "skipped: {} {} ~ {} (n={}): {}\n",
            s.role.label(),
            s.target.label(),
            s.predictor.label(),
            s.n,
            s.reason.label(),
        ));
    }
    out
}

/// Per-board scrape accounting: rows kept, rows dropped, failure samples.
pub fn render_board_summary(board: &ScrapedBoard) -> String {
    let mut out = String::new();
    let r = &board.report;
    out.push_str(&format!(
        "Board '{}' (fetched {}): kept {} of {} rows, {} dropped\n",
        board.source,
        board.fetched_at.format("%Y-%m-%d %H:%M:%S UTC"),
        r.rows_kept,
        r.rows_seen,
        r.failures_total,
    ));
    for failure in &r.failure_samples {
        out.push_str(&format!(
            "  dropped ({}): {}\n",
            failure.reason, failure.fragment
        ));
    }
    if r.failures_total > r.failure_samples.len() {
        out.push_str(&format!(
            "  ... and {} more\n",
            r.failures_total - r.failure_samples.len()
        ));
    }
    out
}

/// The reconciled board: biggest rank disagreements first, then the join
/// accounting, including everything only the right board carries.
pub fn render_reconciliation(rec: &Reconciliation) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "Board comparison: {} (left) vs {} (right)\n",
        rec.left_source, rec.right_source
    ));
    out.push_str(&format!(
        "{:<26} {:<6} {:>6} {:>7} {:>6}\n",
        "player", "pos", "left", "right", "diff"
    ));
    for row in &rec.rows {
        out.push_str(&format!(
            "{:<26} {:<6} {:>6} {:>7} {:>6}\n",
            row.player_name,
            row.position,
            row.left_rank,
            fmt_opt_rank(row.right_rank),
            fmt_opt_rank(row.rank_diff),
        ));
    }
    let r = &rec.report;
    out.push_str(&format!(
        "matched: {}, left-only: {}, right-only: {}\n",
        r.matched,
        r.unmatched_left,
        r.unmatched_right.len()
    ));
    if !r.unmatched_right.is_empty() {
        out.push_str(&format!(
            "only on {}: {}\n",
            rec.right_source,
            r.unmatched_right.join(", ")
        ));
    }
    out
}

// ---------------------------------------------------------------------------
// CSV export
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to create export directory {path}: {source}")]
    Dir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Csv { path: PathBuf, source: csv::Error },
}

fn csv_field(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn write_metrics_csv(path: &Path, metrics: &[TeamSeasonMetric]) -> Result<(), csv::Error> {
    let mut w = csv::Writer::from_path(path)?;
    w.write_record([
        "season",
        "team",
        "role",
        "plays",
        "passes",
        "rushes",
        "epa_per_pass",
        "epa_per_rush",
    ])?;
    for m in metrics {
        w.write_record([
            m.season.to_string(),
            m.team.clone(),
            m.role.label().to_string(),
            m.plays.to_string(),
            m.passes.to_string(),
            m.rushes.to_string(),
            csv_field(m.epa_per_pass),
            csv_field(m.epa_per_rush),
        ])?;
    }
    w.flush()?;
    Ok(())
}

fn write_stability_csv(path: &Path, stability: &StabilityReport) -> Result<(), csv::Error> {
    let mut w = csv::Writer::from_path(path)?;
    w.write_record([
        "role",
        "target",
        "predictor",
        "n",
        "slope",
        "intercept",
        "r_squared",
        "p_value",
    ])?;
    for f in &stability.fits {
        w.write_record([
            f.role.label().to_string(),
            f.target.label().to_string(),
            f.predictor.label().to_string(),
            f.fit.n.to_string(),
            f.fit.slope.to_string(),
            f.fit.intercept.to_string(),
            f.fit.r_squared.to_string(),
            f.fit.p_value.to_string(),
        ])?;
    }
    w.flush()?;
    Ok(())
}

fn write_reconciliation_csv(path: &Path, rec: &Reconciliation) -> Result<(), csv::Error> {
    let mut w = csv::Writer::from_path(path)?;
    w.write_record(["player", "position", "left_rank", "right_rank", "rank_diff"])?;
    for row in &rec.rows {
        w.write_record([
            row.player_name.clone(),
            row.position.clone(),
            row.left_rank.to_string(),
            row.right_rank.map(|r| r.to_string()).unwrap_or_default(),
            row.rank_diff.map(|d| d.to_string()).unwrap_or_default(),
        ])?;
    }
    w.flush()?;
    Ok(())
}

/// Write the run's tables as CSV files into `dir`. Returns the paths written.
pub fn export_csv(
    dir: &Path,
    metrics: &[TeamSeasonMetric],
    stability: &StabilityReport,
    reconciliation: Option<&Reconciliation>,
) -> Result<Vec<PathBuf>, ExportError> {
    std::fs::create_dir_all(dir).map_err(|e| ExportError::Dir {
        path: dir.to_path_buf(),
        source: e,
    })?;

    let mut written = Vec::new();

    let path = dir.join("team_season_metrics.csv");
    write_metrics_csv(&path, metrics).map_err(|e| ExportError::Csv {
        path: path.clone(),
        source: e,
    })?;
    written.push(path);

    let path = dir.join("stability_fits.csv");
    write_stability_csv(&path, stability).map_err(|e| ExportError::Csv {
        path: path.clone(),
        source: e,
    })?;
    written.push(path);

    if let Some(rec) = reconciliation {
        let path = dir.join("reconciled_board.csv");
        write_reconciliation_csv(&path, rec).map_err(|e| ExportError::Csv {
            path: path.clone(),
            source: e,
        })?;
        written.push(path);
    }

    Ok(written)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
