// Play-by-play data loading and normalization.
//
// Reads nflfastR-style CSV exports: one row per play with season, offensive
// and defensive team codes, down, play type, penalty flag, and EPA. Extra
// provider columns are absorbed and ignored.

use crate::config::SeasonRange;
use serde::Deserialize;
use std::io::Read;
use std::path::Path;
use tracing::warn;

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// Play call classification for scrimmage plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlayType {
    Pass,
    Rush,
}

/// One play as loaded from the provider export.
///
/// Fields the provider leaves blank (kneel-downs, kickoffs, timeouts) come
/// through as `None`; the aggregation stage decides which plays qualify.
#[derive(Debug, Clone)]
pub struct PlayRecord {
    pub season: u16,
    pub offense: String,
    pub defense: String,
    pub down: Option<u8>,
    pub play_type: Option<PlayType>,
    pub penalty: bool,
    pub epa: Option<f64>,
}

impl PlayRecord {
    /// A scrimmage play that qualifies for efficiency aggregation: a pass or
    /// rush on a real down, no penalty, finite EPA, both teams known.
    ///
    /// Returns the play type so callers never have to re-check `play_type`
    /// after filtering.
    pub fn qualifying_type(&self) -> Option<PlayType> {
        if self.penalty || self.offense.is_empty() || self.defense.is_empty() {
            return None;
        }
        if !self.down.is_some_and(|d| (1..=4).contains(&d)) {
            return None;
        }
        if !self.epa.is_some_and(f64::is_finite) {
            return None;
        }
        self.play_type
    }
}

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum PlayLoadError {
    #[error("failed to read file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("CSV error in {path}: {source}")]
    Csv { path: String, source: csv::Error },

    #[error("validation error: {0}")]
    Validation(String),
}

// ---------------------------------------------------------------------------
// Raw CSV serde struct (private) — nflfastR column names
// ---------------------------------------------------------------------------

/// Raw play row. Downs and flags are f64 because the provider writes them as
/// floating-point; blanks deserialize to `None`. Columns the struct does not
/// name are ignored by the CSV deserializer.
#[derive(Debug, Deserialize)]
struct RawPlayRow {
    season: u16,
    #[serde(default)]
    posteam: String,
    #[serde(default)]
    defteam: String,
    #[serde(default)]
    down: Option<f64>,
    #[serde(default)]
    play_type: String,
    #[serde(default)]
    penalty: Option<f64>,
    #[serde(default)]
    epa: Option<f64>,
}

fn classify_play_type(raw: &str) -> Option<PlayType> {
    match raw.trim() {
        "pass" => Some(PlayType::Pass),
        "run" => Some(PlayType::Rush),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Reader-based loader (private, enables testing without temp files)
// ---------------------------------------------------------------------------

fn load_plays_from_reader<R: Read>(rdr: R) -> Result<Vec<PlayRecord>, csv::Error> {
    let mut reader = csv::Reader::from_reader(rdr);
    let mut plays = Vec::new();
    for result in reader.deserialize::<RawPlayRow>() {
        match result {
            Ok(raw) => {
                let down = raw
                    .down
                    .filter(|d| d.is_finite())
                    .map(|d| d.round())
                    .filter(|d| (1.0..=4.0).contains(d))
                    .map(|d| d as u8);
                plays.push(PlayRecord {
                    season: raw.season,
                    offense: raw.posteam.trim().to_string(),
                    defense: raw.defteam.trim().to_string(),
                    down,
                    play_type: classify_play_type(&raw.play_type),
                    penalty: raw.penalty.is_some_and(|p| p != 0.0),
                    epa: raw.epa.filter(|e| e.is_finite()),
                });
            }
            Err(e) => {
                warn!("skipping malformed play row: {}", e);
            }
        }
    }
    Ok(plays)
}

// ---------------------------------------------------------------------------
// Public path-based loader
// ---------------------------------------------------------------------------

/// Load plays for the given seasons from a CSV file. Rows outside the season
/// range are dropped; the file may span more seasons than requested.
pub fn load_plays(path: &Path, seasons: SeasonRange) -> Result<Vec<PlayRecord>, PlayLoadError> {
    let file = std::fs::File::open(path).map_err(|e| PlayLoadError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    let mut plays = load_plays_from_reader(file).map_err(|e| PlayLoadError::Csv {
        path: path.display().to_string(),
        source: e,
    })?;
    plays.retain(|p| seasons.contains(p.season));

    if plays.is_empty() {
        return Err(PlayLoadError::Validation(format!(
            "play CSV produced zero rows for seasons {}-{}",
            seasons.first, seasons.last
        )));
    }

    Ok(plays)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
