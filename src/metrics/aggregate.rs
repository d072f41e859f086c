// Per-team-season efficiency aggregation.
//
// Reduces qualifying scrimmage plays into one row per (season, team, role)
// with play counts and mean EPA conditioned on play type. The offense and
// defense views are computed identically except for which team identifier
// keys the group; both views are emitted, tagged with the role.

use crate::plays::{PlayRecord, PlayType};
use std::collections::BTreeMap;

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// Which side of the ball a metric row describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Role {
    Offense,
    Defense,
}

impl Role {
    pub fn label(&self) -> &'static str {
        match self {
            Role::Offense => "offense",
            Role::Defense => "defense",
        }
    }
}

/// Efficiency summary for one (season, team, role) group.
///
/// `epa_per_pass` / `epa_per_rush` are `None` when the group has no plays of
/// that type; a mean over an empty set is not a number and must never leak
/// out as NaN or 0.0.
#[derive(Debug, Clone, PartialEq)]
pub struct TeamSeasonMetric {
    pub season: u16,
    pub team: String,
    pub role: Role,
    pub plays: u32,
    pub passes: u32,
    pub rushes: u32,
    pub epa_per_pass: Option<f64>,
    pub epa_per_rush: Option<f64>,
}

// ---------------------------------------------------------------------------
// Accumulation
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct Accumulator {
    passes: u32,
    pass_epa_sum: f64,
    rushes: u32,
    rush_epa_sum: f64,
}

impl Accumulator {
    fn add(&mut self, play_type: PlayType, epa: f64) {
        match play_type {
            PlayType::Pass => {
                self.passes += 1;
                self.pass_epa_sum += epa;
            }
            PlayType::Rush => {
                self.rushes += 1;
                self.rush_epa_sum += epa;
            }
        }
    }

    fn into_metric(self, season: u16, team: String, role: Role) -> TeamSeasonMetric {
        let epa_per_pass = (self.passes > 0).then(|| self.pass_epa_sum / self.passes as f64);
        let epa_per_rush = (self.rushes > 0).then(|| self.rush_epa_sum / self.rushes as f64);
        TeamSeasonMetric {
            season,
            team,
            role,
            plays: self.passes + self.rushes,
            passes: self.passes,
            rushes: self.rushes,
            epa_per_pass,
            epa_per_rush,
        }
    }
}

/// Aggregate qualifying plays into per-(season, team, role) metrics.
///
/// Every qualifying play contributes to exactly two groups: the offensive
/// team's Offense row and the defensive team's Defense row. Output ordering
/// is deterministic: ascending by (season, team, role).
pub fn aggregate_team_seasons(plays: &[PlayRecord]) -> Vec<TeamSeasonMetric> {
    let mut groups: BTreeMap<(u16, String, Role), Accumulator> = BTreeMap::new();

    for play in plays {
        let Some(play_type) = play.qualifying_type() else {
            continue;
        };
        // qualifying_type() guarantees epa is present and finite
        let Some(epa) = play.epa else { continue };

        groups
            .entry((play.season, play.offense.clone(), Role::Offense))
            .or_default()
            .add(play_type, epa);
        groups
            .entry((play.season, play.defense.clone(), Role::Defense))
            .or_default()
            .add(play_type, epa);
    }

    groups
        .into_iter()
        .map(|((season, team, role), acc)| acc.into_metric(season, team, role))
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
