// Structured-table board strategy.
//
// Takes the first <table> on the page, maps its header row onto the
// canonical schema, and keeps exactly the rows whose rank cell parses as a
// positive integer. Placeholder and decoration rows are dropped by that
// content predicate, never by row position.

use crate::scrape::{normalize_ws, ParseReport, RankingEntry, ScrapeError};
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use tracing::warn;

// ---------------------------------------------------------------------------
// Header mapping
// ---------------------------------------------------------------------------

/// Normalize a header cell to a comparable key: lowercase with runs of
/// non-alphanumerics collapsed to single underscores.
fn normalize_header(raw: &str) -> String {
    let mut key = String::with_capacity(raw.len());
    let mut last_underscore = true;
    for c in raw.trim().chars() {
        if c.is_ascii_alphanumeric() {
            key.push(c.to_ascii_lowercase());
            last_underscore = false;
        } else if !last_underscore {
            key.push('_');
            last_underscore = true;
        }
    }
    while key.ends_with('_') {
        key.pop();
    }
    key
}

/// Column indices resolved from the normalized header row.
#[derive(Debug)]
struct ColumnMap {
    rank: usize,
    player: usize,
    position: usize,
    position_rank: Option<usize>,
    school: Option<usize>,
    weight: Option<usize>,
}

impl ColumnMap {
    fn resolve(headers: &[String], source: &str) -> Result<Self, ScrapeError> {
        let find = |pred: &dyn Fn(&str) -> bool| headers.iter().position(|h| pred(h));

        let rank = find(&|h| {
            matches!(h, "rank" | "rk" | "overall" | "ovr" | "overall_rank" | "no" | "num")
                || (h.contains("rank") && !h.contains("pos"))
        })
        .ok_or(ScrapeError::MissingColumn {
            board: source.to_string(),
            column: "rank",
        })?;

        let player = find(&|h| h.contains("player") || h.contains("name")).ok_or(
            ScrapeError::MissingColumn {
                board: source.to_string(),
                column: "player",
            },
        )?;

        let position = find(&|h| {
            matches!(h, "pos" | "position") || (h.contains("pos") && !h.contains("rank"))
        })
        .ok_or(ScrapeError::MissingColumn {
            board: source.to_string(),
            column: "position",
        })?;

        Ok(ColumnMap {
            rank,
            player,
            position,
            position_rank: find(&|h| h.contains("pos") && h.contains("rank")),
            school: find(&|h| h.contains("school") || h.contains("college")),
            weight: find(&|h| h == "wt" || h.contains("weight")),
        })
    }

    fn max_required(&self) -> usize {
        self.rank.max(self.player).max(self.position)
    }
}

// ---------------------------------------------------------------------------
// Cell coercion
// ---------------------------------------------------------------------------

/// Parse a rank cell as a positive integer; tolerates a trailing period.
fn parse_rank(raw: &str) -> Option<u32> {
    raw.trim()
        .trim_end_matches('.')
        .parse::<u32>()
        .ok()
        .filter(|&r| r > 0)
}

/// Parse a numeric cell leniently: the first whitespace token, so "210 lbs"
/// coerces to 210.0. Non-numeric cells become `None`, not errors.
fn parse_numeric(raw: &str) -> Option<f64> {
    raw.split_whitespace()
        .next()?
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}

fn cell_texts(row: ElementRef<'_>, cell_selector: &Selector) -> Vec<String> {
    row.select(cell_selector)
        .map(|c| normalize_ws(&c.text().collect::<String>()))
        .collect()
}

fn optional_cell(cells: &[String], idx: Option<usize>) -> Option<&str> {
    idx.and_then(|i| cells.get(i))
        .map(String::as_str)
        .filter(|s| !s.is_empty())
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Parse the first table on the page into canonical ranking entries.
pub fn parse_table_board(
    html: &str,
    source: &str,
) -> Result<(Vec<RankingEntry>, ParseReport), ScrapeError> {
    let document = Html::parse_document(html);
    let table_selector = Selector::parse("table").unwrap();
    let row_selector = Selector::parse("tr").unwrap();
    let cell_selector = Selector::parse("td, th").unwrap();

    let table = document
        .select(&table_selector)
        .next()
        .ok_or(ScrapeError::NoTable {
            board: source.to_string(),
        })?;

    let mut rows = table.select(&row_selector);

    let header_row = rows.next().ok_or(ScrapeError::NoTable {
        board: source.to_string(),
    })?;
    let headers: Vec<String> = cell_texts(header_row, &cell_selector)
        .iter()
        .map(|h| normalize_header(h))
        .collect();
    let columns = ColumnMap::resolve(&headers, source)?;

    let mut entries = Vec::new();
    let mut report = ParseReport::default();
    let mut seen_ranks: HashSet<u32> = HashSet::new();

    for row in rows {
        report.saw_row();
        let cells = cell_texts(row, &cell_selector);
        let fragment = cells.join(" | ");

        if cells.len() <= columns.max_required() {
            report.reject(&fragment, "row has fewer cells than the header");
            continue;
        }

        let Some(rank) = parse_rank(&cells[columns.rank]) else {
            report.reject(
                &fragment,
                "rank cell does not parse as a positive integer",
            );
            continue;
        };

        let player_name = cells[columns.player].clone();
        if player_name.is_empty() {
            report.reject(&fragment, "empty player name");
            continue;
        }

        let position = cells[columns.position].clone();
        if position.is_empty() {
            report.reject(&fragment, "empty position");
            continue;
        }

        if !seen_ranks.insert(rank) {
            warn!("board '{source}': duplicate overall rank {rank}");
        }

        report.kept_row();
        entries.push(RankingEntry {
            overall_rank: rank,
            player_name,
            position,
            position_rank: optional_cell(&cells, columns.position_rank).and_then(parse_rank),
            school: optional_cell(&cells, columns.school).map(str::to_string),
            weight: optional_cell(&cells, columns.weight).and_then(parse_numeric),
            note: None,
        });
    }

    Ok((entries, report))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
