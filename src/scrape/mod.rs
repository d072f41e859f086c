// Draft big-board scraping.
//
// Two parsing strategies (structured table, free-text list) against
// configured ranking pages, both producing the same canonical entry schema.
// Malformed rows are never silently dropped: every strategy returns a
// ParseReport with counts and failure samples alongside its entries.

pub mod board_table;
pub mod board_text;
pub mod fetch;

use crate::config::{BoardConfig, BoardStrategy};
use chrono::{DateTime, Utc};
use fetch::{BoardFetcher, FetchError};
use thiserror::Error;
use tracing::{info, warn};

// ---------------------------------------------------------------------------
// Canonical entry schema
// ---------------------------------------------------------------------------

/// One ranked prospect in a source's canonical schema. Optional fields are
/// filled only where the source publishes them.
#[derive(Debug, Clone, PartialEq)]
pub struct RankingEntry {
    pub overall_rank: u32,
    pub player_name: String,
    pub position: String,
    pub position_rank: Option<u32>,
    pub school: Option<String>,
    pub weight: Option<f64>,
    /// Unparsed trailing text from free-text sources (measurables, blurb).
    pub note: Option<String>,
}

// ---------------------------------------------------------------------------
// Parse reporting
// ---------------------------------------------------------------------------

/// Cap on retained failure samples; the total count is always exact.
const MAX_FAILURE_SAMPLES: usize = 5;

/// A row or text entry that could not be parsed.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseFailure {
    pub fragment: String,
    pub reason: String,
}

/// Row-level accounting for one scrape: how many candidate rows were seen,
/// how many survived, and a sample of what was rejected and why.
#[derive(Debug, Clone, Default)]
pub struct ParseReport {
    pub rows_seen: usize,
    pub rows_kept: usize,
    pub failures_total: usize,
    pub failure_samples: Vec<ParseFailure>,
}

impl ParseReport {
    pub(crate) fn saw_row(&mut self) {
        self.rows_seen += 1;
    }

    pub(crate) fn kept_row(&mut self) {
        self.rows_kept += 1;
    }

    pub(crate) fn reject(&mut self, fragment: &str, reason: impl Into<String>) {
        self.failures_total += 1;
        if self.failure_samples.len() < MAX_FAILURE_SAMPLES {
            let mut fragment = fragment.trim().to_string();
            const MAX_FRAGMENT_LEN: usize = 120;
            if fragment.len() > MAX_FRAGMENT_LEN {
                let cut = (0..=MAX_FRAGMENT_LEN)
                    .rev()
                    .find(|&i| fragment.is_char_boundary(i))
                    .unwrap_or(0);
                fragment.truncate(cut);
            }
            self.failure_samples.push(ParseFailure {
                fragment,
                reason: reason.into(),
            });
        }
    }
}

// ---------------------------------------------------------------------------
// Scraped board
// ---------------------------------------------------------------------------

/// The result of scraping one ranking source.
#[derive(Debug, Clone)]
pub struct ScrapedBoard {
    pub source: String,
    pub fetched_at: DateTime<Utc>,
    pub entries: Vec<RankingEntry>,
    pub report: ParseReport,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("no <table> element found on {board}")]
    NoTable { board: String },

    #[error("{board}: table has no recognizable `{column}` column")]
    MissingColumn {
        board: String,
        column: &'static str,
    },

    #[error("{board}: invalid CSS selector `{selector}`")]
    BadSelector { board: String, selector: String },

    #[error("{board}: page yielded zero entries")]
    Empty { board: String },
}

// ---------------------------------------------------------------------------
// Strategy dispatch
// ---------------------------------------------------------------------------

/// Fetch one configured board and parse it with its configured strategy.
///
/// An error here means this source produced nothing usable; callers treat it
/// as source-local and continue with other sources.
pub async fn scrape_board(
    board: &BoardConfig,
    fetcher: &dyn BoardFetcher,
) -> Result<ScrapedBoard, ScrapeError> {
    info!("fetching board '{}' from {}", board.name, board.url);
    let html = fetcher.fetch(&board.url).await?;
    let fetched_at = Utc::now();

    let (entries, report) = match board.strategy {
        BoardStrategy::Table => board_table::parse_table_board(&html, &board.name)?,
        BoardStrategy::Text => {
            let selector = board.selector.as_deref().unwrap_or_default();
            board_text::parse_text_board(&html, selector, &board.name)?
        }
    };

    if entries.is_empty() {
        return Err(ScrapeError::Empty {
            board: board.name.clone(),
        });
    }

    if report.failures_total > 0 {
        warn!(
            "board '{}': dropped {} of {} rows while parsing",
            board.name, report.failures_total, report.rows_seen
        );
    }
    info!(
        "board '{}': kept {} of {} rows",
        board.name, report.rows_kept, report.rows_seen
    );

    Ok(ScrapedBoard {
        source: board.name.clone(),
        fetched_at,
        entries,
        report,
    })
}

// ---------------------------------------------------------------------------
// Shared text helpers
// ---------------------------------------------------------------------------

/// Collapse all runs of whitespace to single spaces and trim the ends.
pub(crate) fn normalize_ws(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
