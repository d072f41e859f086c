// Free-text board strategy.
//
// Some outlets publish their board as prose: one paragraph-like element per
// prospect, each starting with a "<number>." rank token followed by
// comma-separated name, position, and free text. The elements to read are
// chosen by a CSS selector from config, since every outlet nests them
// differently.

use crate::scrape::{normalize_ws, ParseReport, RankingEntry, ScrapeError};
use regex::Regex;
use scraper::{Html, Selector};

/// Parse free-text entries selected by `selector` into canonical entries.
pub fn parse_text_board(
    html: &str,
    selector: &str,
    source: &str,
) -> Result<(Vec<RankingEntry>, ParseReport), ScrapeError> {
    let entry_selector = Selector::parse(selector).map_err(|_| ScrapeError::BadSelector {
        board: source.to_string(),
        selector: selector.to_string(),
    })?;

    let document = Html::parse_document(html);
    let mut entries = Vec::new();
    let mut report = ParseReport::default();

    // Leading "<number>." token; everything after is the entry body.
    let rank_pattern = Regex::new(r"^(\d+)\s*\.\s*(.*)$").unwrap();

    for element in document.select(&entry_selector) {
        report.saw_row();
        let text = normalize_ws(&element.text().collect::<String>());

        let Some(caps) = rank_pattern.captures(&text) else {
            report.reject(&text, "no leading rank token");
            continue;
        };

        // Guaranteed to match digits; may still overflow u32
        let Ok(rank) = caps[1].parse::<u32>() else {
            report.reject(&text, "rank token out of range");
            continue;
        };
        if rank == 0 {
            report.reject(&text, "rank must be positive");
            continue;
        }

        let body = caps[2].trim();
        let mut segments = body.splitn(3, ',');

        let player_name = segments.next().map(str::trim).unwrap_or_default();
        if player_name.is_empty() {
            report.reject(&text, "empty player name");
            continue;
        }

        let Some(position) = segments.next().map(str::trim).filter(|p| !p.is_empty()) else {
            report.reject(&text, "missing position segment");
            continue;
        };

        let note = segments
            .next()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string);

        report.kept_row();
        entries.push(RankingEntry {
            overall_rank: rank,
            player_name: player_name.to_string(),
            position: position.to_string(),
            position_rank: None,
            school: None,
            weight: None,
            note,
        });
    }

    Ok((entries, report))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn wrap_entries(entries: &[&str]) -> String {
        let body: String = entries
            .iter()
            .map(|e| format!("<p class=\"board-entry\">{e}</p>\n"))
            .collect();
        format!("<html><body><div class=\"article\">{body}</div></body></html>")
    }

    #[test]
    fn parses_rank_name_position_and_rest() {
        let html = wrap_entries(&["12. Jane Doe, WR, 6'1\" 210 lbs"]);

        let (entries, report) = parse_text_board(&html, "p.board-entry", "test").unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(report.rows_kept, 1);

        assert_eq!(entries[0].overall_rank, 12);
        assert_eq!(entries[0].player_name, "Jane Doe");
        assert_eq!(entries[0].position, "WR");
        assert_eq!(entries[0].note.as_deref(), Some("6'1\" 210 lbs"));
    }

    #[test]
    fn entry_without_rank_token_is_a_parse_failure() {
        let html = wrap_entries(&[
            "1. Alice Quarter, QB, State",
            "Scouting notes: a player to watch",
        ]);

        let (entries, report) = parse_text_board(&html, "p.board-entry", "test").unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].overall_rank, 1);

        assert_eq!(report.rows_seen, 2);
        assert_eq!(report.failures_total, 1);
        assert_eq!(report.failure_samples[0].reason, "no leading rank token");
        // The malformed entry must never be coerced to rank 0
        assert!(entries.iter().all(|e| e.overall_rank > 0));
    }

    #[test]
    fn rank_zero_is_rejected() {
        let html = wrap_entries(&["0. Ghost Player, QB, Nowhere"]);

        let (entries, report) = parse_text_board(&html, "p.board-entry", "test").unwrap();
        assert!(entries.is_empty());
        assert_eq!(report.failure_samples[0].reason, "rank must be positive");
    }

    #[test]
    fn missing_position_segment_is_rejected() {
        let html = wrap_entries(&["4. Dan Lineman"]);

        let (entries, report) = parse_text_board(&html, "p.board-entry", "test").unwrap();
        assert!(entries.is_empty());
        assert_eq!(report.failure_samples[0].reason, "missing position segment");
    }

    #[test]
    fn note_is_optional() {
        let html = wrap_entries(&["7. Eve Safety, S"]);

        let (entries, _) = parse_text_board(&html, "p.board-entry", "test").unwrap();
        assert_eq!(entries[0].position, "S");
        assert_eq!(entries[0].note, None);
    }

    #[test]
    fn whitespace_and_markup_are_collapsed() {
        let html = "<html><body>\
                    <p class=\"board-entry\">  3.   <b>Cam</b>\n Corner ,  CB , quick feet </p>\
                    </body></html>";

        let (entries, _) = parse_text_board(html, "p.board-entry", "test").unwrap();
        assert_eq!(entries[0].overall_rank, 3);
        assert_eq!(entries[0].player_name, "Cam Corner");
        assert_eq!(entries[0].position, "CB");
        assert_eq!(entries[0].note.as_deref(), Some("quick feet"));
    }

    #[test]
    fn selector_chooses_which_elements_to_read() {
        let html = "<html><body>\
                    <p class=\"board-entry\">1. Alice Quarter, QB, State</p>\
                    <p class=\"sidebar\">99. Not A Prospect, XX, ignore me</p>\
                    </body></html>";

        let (entries, report) = parse_text_board(html, "p.board-entry", "test").unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(report.rows_seen, 1);
        assert_eq!(entries[0].player_name, "Alice Quarter");
    }

    #[test]
    fn invalid_selector_is_an_error() {
        let err = parse_text_board("<html></html>", "p..[", "test").unwrap_err();
        match err {
            ScrapeError::BadSelector { selector, .. } => assert_eq!(selector, "p..["),
            other => panic!("expected BadSelector, got: {other}"),
        }
    }

    #[test]
    fn no_matching_elements_yields_empty_with_zero_rows() {
        let html = "<html><body><p>prose only</p></body></html>";
        let (entries, report) = parse_text_board(html, "p.board-entry", "test").unwrap();
        assert!(entries.is_empty());
        assert_eq!(report.rows_seen, 0);
    }
}
