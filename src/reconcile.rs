// Big-board reconciliation.
//
// Left join of two scraped boards keyed on player name (trimmed, whitespace
// collapsed, case-insensitive). Every left entry produces a row; matched
// rows carry both ranks and their absolute difference, and the rows sort
// descending by that difference so the biggest disagreements lead. Entries
// that only the right board carries are reported, not absorbed.

use crate::scrape::{RankingEntry, ScrapedBoard};
use std::collections::HashMap;
use tracing::warn;

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// One left-board entry with its right-board counterpart, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconciledRanking {
    pub player_name: String,
    pub position: String,
    pub left_rank: u32,
    pub right_rank: Option<u32>,
    pub rank_diff: Option<u32>,
}

/// Join accounting: what matched and what each side had alone.
#[derive(Debug, Clone, Default)]
pub struct JoinReport {
    pub matched: usize,
    pub unmatched_left: usize,
    /// Names only the right board carries, in right-board rank order.
    pub unmatched_right: Vec<String>,
}

/// The reconciled comparison of two boards.
#[derive(Debug, Clone)]
pub struct Reconciliation {
    pub left_source: String,
    pub right_source: String,
    pub rows: Vec<ReconciledRanking>,
    pub report: JoinReport,
}

// ---------------------------------------------------------------------------
// Join key
// ---------------------------------------------------------------------------

/// Normalize a player name for joining: trim, collapse inner whitespace,
/// fold case. Suffixes and punctuation are left alone; residual mismatches
/// surface in the join report instead.
fn join_key(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

// ---------------------------------------------------------------------------
// Reconciliation
// ---------------------------------------------------------------------------

/// Join `left` against `right` by player name.
pub fn reconcile(left: &ScrapedBoard, right: &ScrapedBoard) -> Reconciliation {
    let mut right_by_name: HashMap<String, &RankingEntry> = HashMap::new();
    for entry in &right.entries {
        let key = join_key(&entry.player_name);
        if right_by_name.insert(key, entry).is_some() {
            warn!(
                "board '{}': duplicate player name '{}', keeping the later entry",
                right.source, entry.player_name
            );
        }
    }

    let mut report = JoinReport::default();
    let mut matched_right_keys: Vec<String> = Vec::new();

    let mut rows: Vec<ReconciledRanking> = left
        .entries
        .iter()
        .map(|entry| {
            let key = join_key(&entry.player_name);
            match right_by_name.get(&key) {
                Some(counterpart) => {
                    report.matched += 1;
                    matched_right_keys.push(key);
                    ReconciledRanking {
                        player_name: entry.player_name.clone(),
                        position: entry.position.clone(),
                        left_rank: entry.overall_rank,
                        right_rank: Some(counterpart.overall_rank),
                        rank_diff: Some(entry.overall_rank.abs_diff(counterpart.overall_rank)),
                    }
                }
                None => {
                    report.unmatched_left += 1;
                    ReconciledRanking {
                        player_name: entry.player_name.clone(),
                        position: entry.position.clone(),
                        left_rank: entry.overall_rank,
                        right_rank: None,
                        rank_diff: None,
                    }
                }
            }
        })
        .collect();

    // Matched rows first, descending by disagreement; unmatched rows trail
    // in left-rank order.
    rows.sort_by(|a, b| match (a.rank_diff, b.rank_diff) {
        (Some(da), Some(db)) => db.cmp(&da).then(a.left_rank.cmp(&b.left_rank)),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => a.left_rank.cmp(&b.left_rank),
    });

    for key in matched_right_keys {
        right_by_name.remove(&key);
    }
    let mut leftovers: Vec<&RankingEntry> = right_by_name.into_values().collect();
    leftovers.sort_by_key(|e| e.overall_rank);
    report.unmatched_right = leftovers
        .into_iter()
        .map(|e| e.player_name.clone())
        .collect();

    Reconciliation {
        left_source: left.source.clone(),
        right_source: right.source.clone(),
        rows,
        report,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
