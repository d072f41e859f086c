// Integration tests for the workbench.
//
// These drive the full pipeline through the library crate's public API with
// recorded fixture pages and a synthetic play-by-play file whose EPA means
// and regression statistics are computed by hand below.

use downfield::app;
use downfield::config::{BoardConfig, BoardStrategy, Config, DataConfig, FetchConfig, SeasonRange};
use downfield::metrics::aggregate::Role;
use downfield::metrics::stability::EpaMetric;
use downfield::report;
use downfield::scrape::fetch::FixtureFetcher;

use std::path::Path;

// ===========================================================================
// Test helpers
// ===========================================================================

/// Fixture directory path (relative to the package root, which is the cwd
/// for `cargo test`).
const FIXTURES: &str = "tests/fixtures";

fn approx_eq(a: f64, b: f64, epsilon: f64) -> bool {
    (a - b).abs() < epsilon
}

/// Build a test-ready Config pointing at the recorded fixtures (no files
/// under config/ are read).
fn inline_config() -> Config {
    Config {
        seasons: SeasonRange {
            first: 2019,
            last: 2021,
        },
        data: DataConfig {
            plays: "tests/fixtures/plays.csv".into(),
            export_dir: None,
        },
        boards: vec![
            BoardConfig {
                name: "drafttek".into(),
                url: "https://boards.test/table".into(),
                strategy: BoardStrategy::Table,
                selector: None,
            },
            BoardConfig {
                name: "jeremiah".into(),
                url: "https://boards.test/text".into(),
                strategy: BoardStrategy::Text,
                selector: Some("p.board-entry".into()),
            },
        ],
        fetch: FetchConfig {
            user_agent: "downfield/0.1 (tests)".into(),
            timeout_secs: 5,
            fixture_dir: Some(FIXTURES.into()),
            offline: true,
        },
    }
}

async fn run_pipeline(config: &Config) -> app::WorkbenchOutcome {
    let fetcher = FixtureFetcher::new(FIXTURES);
    app::run(Path::new("."), config, &fetcher)
        .await
        .expect("pipeline should run")
}

// ===========================================================================
// Aggregation
// ===========================================================================

#[tokio::test]
async fn aggregates_hand_computed_epa_means() {
    let outcome = run_pipeline(&inline_config()).await;

    // The fixture gives ATL's offense two passes and one rush per season,
    // with pass EPA means 0.1 / 0.2 / 0.3 across 2019-2021.
    let atl_2019 = outcome
        .metrics
        .iter()
        .find(|m| m.season == 2019 && m.team == "ATL" && m.role == Role::Offense)
        .expect("ATL 2019 offense row");

    assert_eq!(atl_2019.plays, 3);
    assert_eq!(atl_2019.passes, 2);
    assert_eq!(atl_2019.rushes, 1);
    assert!(approx_eq(atl_2019.epa_per_pass.unwrap(), 0.1, 1e-9));
    assert!(approx_eq(atl_2019.epa_per_rush.unwrap(), 0.0, 1e-9));

    // ATL only plays CAR, so CAR's defense saw exactly these plays.
    let car_def_2019 = outcome
        .metrics
        .iter()
        .find(|m| m.season == 2019 && m.team == "CAR" && m.role == Role::Defense)
        .expect("CAR 2019 defense row");
    assert_eq!(car_def_2019.plays, 3);
    assert!(approx_eq(car_def_2019.epa_per_pass.unwrap(), 0.1, 1e-9));

    // The 2018 row and the penalty/kickoff/punt rows are excluded: every
    // metric row partitions into passes + rushes.
    assert!(outcome.metrics.iter().all(|m| m.season >= 2019));
    for m in &outcome.metrics {
        assert_eq!(m.passes + m.rushes, m.plays);
    }
}

#[tokio::test]
async fn pipeline_is_deterministic() {
    let config = inline_config();
    let first = run_pipeline(&config).await;
    let second = run_pipeline(&config).await;
    assert_eq!(first.metrics, second.metrics);
}

// ===========================================================================
// Stability
// ===========================================================================

#[tokio::test]
async fn reproduces_hand_computed_regression() {
    let outcome = run_pipeline(&inline_config()).await;

    // Offense pass EPA on prior-season pass EPA. The fixture means follow
    // y = x + 0.1 exactly:
    //   ATL: (0.1, 0.2), (0.2, 0.3)   CAR: (0.0, 0.1), (0.1, 0.2)
    // so slope = 1, intercept = 0.1, R^2 = 1, and the p-value collapses
    // to 0 for the exact fit.
    let fit = outcome
        .stability
        .fits
        .iter()
        .find(|f| {
            f.role == Role::Offense
                && f.target == EpaMetric::Pass
                && f.predictor == EpaMetric::Pass
        })
        .expect("offense pass-on-pass fit");

    assert_eq!(fit.fit.n, 4);
    assert!(approx_eq(fit.fit.slope, 1.0, 1e-9));
    assert!(approx_eq(fit.fit.intercept, 0.1, 1e-9));
    assert!(approx_eq(fit.fit.r_squared, 1.0, 1e-9));
    assert_eq!(fit.fit.p_value, 0.0);

    // Defense mirrors it: each defense's pass EPA is its opponent's
    // offensive pass EPA, which is just as linear.
    let def_fit = outcome
        .stability
        .fits
        .iter()
        .find(|f| {
            f.role == Role::Defense
                && f.target == EpaMetric::Pass
                && f.predictor == EpaMetric::Pass
        })
        .expect("defense pass-on-pass fit");
    assert!(approx_eq(def_fit.fit.r_squared, 1.0, 1e-9));

    // Rush EPA is constant 0.0 in the fixture, so every pair involving it
    // is skipped rather than fitted.
    assert!(!outcome.stability.skipped.is_empty());
    assert!(outcome
        .stability
        .fits
        .iter()
        .all(|f| f.target == EpaMetric::Pass && f.predictor == EpaMetric::Pass));
}

// ===========================================================================
// Scraping
// ===========================================================================

#[tokio::test]
async fn table_board_drops_placeholders_and_reports_them() {
    let outcome = run_pipeline(&inline_config()).await;

    let drafttek = outcome
        .boards
        .iter()
        .find(|b| b.source == "drafttek")
        .expect("drafttek board");

    let names: Vec<&str> = drafttek
        .entries
        .iter()
        .map(|e| e.player_name.as_str())
        .collect();
    assert_eq!(
        names,
        vec!["Alice Quarter", "Bob Edge", "Cam Corner", "Dan Lineman"]
    );
    assert_eq!(drafttek.entries[0].overall_rank, 1);
    assert_eq!(drafttek.entries[0].school.as_deref(), Some("State"));
    assert_eq!(drafttek.entries[0].weight, Some(210.0));

    // 3 placeholder rows and the "Ad break" row are rejected by content,
    // and the rejection is reported, not silent.
    assert_eq!(drafttek.report.rows_seen, 8);
    assert_eq!(drafttek.report.rows_kept, 4);
    assert_eq!(drafttek.report.failures_total, 4);
}

#[tokio::test]
async fn text_board_parses_entries_and_reports_failures() {
    let outcome = run_pipeline(&inline_config()).await;

    let jeremiah = outcome
        .boards
        .iter()
        .find(|b| b.source == "jeremiah")
        .expect("jeremiah board");

    assert_eq!(jeremiah.entries.len(), 3);
    assert_eq!(jeremiah.entries[0].overall_rank, 1);
    assert_eq!(jeremiah.entries[0].player_name, "Alice Quarter");
    assert_eq!(jeremiah.entries[0].position, "QB");
    assert_eq!(jeremiah.entries[0].note.as_deref(), Some("6'2\" 210 lbs"));

    // The "Best available" paragraph has no leading rank token.
    assert_eq!(jeremiah.report.rows_seen, 4);
    assert_eq!(jeremiah.report.failures_total, 1);
    assert_eq!(
        jeremiah.report.failure_samples[0].reason,
        "no leading rank token"
    );
}

// ===========================================================================
// Reconciliation
// ===========================================================================

#[tokio::test]
async fn reconciliation_ranks_disagreements_and_reports_both_sides() {
    let outcome = run_pipeline(&inline_config()).await;
    let rec = outcome.reconciliation.as_ref().expect("reconciliation");

    assert_eq!(rec.left_source, "drafttek");
    assert_eq!(rec.right_source, "jeremiah");

    // Matched rows lead, sorted by descending disagreement; unmatched left
    // rows trail in rank order.
    let names: Vec<&str> = rec.rows.iter().map(|r| r.player_name.as_str()).collect();
    assert_eq!(
        names,
        vec!["Cam Corner", "Alice Quarter", "Bob Edge", "Dan Lineman"]
    );

    let cam = &rec.rows[0];
    assert_eq!(cam.left_rank, 3);
    assert_eq!(cam.right_rank, Some(2));
    assert_eq!(cam.rank_diff, Some(1));

    assert_eq!(rec.report.matched, 2);
    assert_eq!(rec.report.unmatched_left, 2);
    assert_eq!(rec.report.unmatched_right, vec!["Eve Safety".to_string()]);
}

// ===========================================================================
// Failure isolation and rendering
// ===========================================================================

#[tokio::test]
async fn failed_board_does_not_abort_the_run() {
    let mut config = inline_config();
    // No fixture exists for this URL, so the fetch fails for this source.
    config.boards[1].url = "https://boards.test/missing".into();

    let outcome = run_pipeline(&config).await;

    assert_eq!(outcome.boards.len(), 1);
    assert_eq!(outcome.boards[0].source, "drafttek");
    assert!(outcome.reconciliation.is_none());
    // The metric pipeline still ran in full.
    assert!(!outcome.metrics.is_empty());
    assert!(!outcome.stability.fits.is_empty());
}

#[tokio::test]
async fn rendered_report_covers_every_stage() {
    let outcome = run_pipeline(&inline_config()).await;

    let metrics_table = report::render_metrics_table(&outcome.metrics);
    assert!(metrics_table.contains("ATL"));
    assert!(metrics_table.contains("defense"));

    let stability_table = report::render_stability_table(&outcome.stability);
    assert!(stability_table.contains("epa_per_pass"));
    assert!(stability_table.contains("skipped:"));

    for board in &outcome.boards {
        let summary = report::render_board_summary(board);
        assert!(summary.contains(&board.source));
        assert!(summary.contains("dropped"));
    }

    let rec = outcome.reconciliation.as_ref().unwrap();
    let rendered = report::render_reconciliation(rec);
    assert!(rendered.contains("Cam Corner"));
    assert!(rendered.contains("Eve Safety"));
}
