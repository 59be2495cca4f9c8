//! Captaincy and chip multipliers applied to a lineup's base points.

use crate::domain::{AthleteId, ChipKind};
use serde::Serialize;

/// Points of the final lineup, ready for the armband and chip rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoredLineup {
    /// Individual points of each final starter, in lineup order.
    pub starters: Vec<(AthleteId, i32)>,
    /// Individual points of each final bench athlete, in lineup order.
    pub bench: Vec<(AthleteId, i32)>,
    pub captain: Option<AthleteId>,
    pub vice_captain: Option<AthleteId>,
    /// Captain is a starter with nonzero minutes.
    pub captain_played: bool,
    /// Vice-captain is a starter with nonzero minutes.
    pub vice_played: bool,
}

impl ScoredLineup {
    fn points_of(&self, id: Option<AthleteId>) -> i32 {
        id.and_then(|id| self.starters.iter().find(|(a, _)| *a == id))
            .map(|(_, p)| *p)
            .unwrap_or(0)
    }

    pub fn captain_points(&self) -> i32 {
        if self.captain_played {
            self.points_of(self.captain)
        } else {
            0
        }
    }

    pub fn vice_points(&self) -> i32 {
        if self.vice_played {
            self.points_of(self.vice_captain)
        } else {
            0
        }
    }
}

/// Pre-penalty round score split into its parts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundScore {
    pub starting_points: i32,
    pub bench_points: i32,
    pub armband_bonus: i32,
}

impl RoundScore {
    pub fn total(&self) -> i32 {
        self.starting_points
            .saturating_add(self.bench_points)
            .saturating_add(self.armband_bonus)
    }
}

/// Single extra multiple for the captain, falling back to the vice.
fn default_bonus(lineup: &ScoredLineup) -> i32 {
    if lineup.captain_played {
        lineup.captain_points()
    } else {
        lineup.vice_points()
    }
}

/// Combine base points with the armband and the round's chip.
///
/// `UnlimitedTransfers` only affects the transfer penalty and scores like no chip.
pub fn apply_chip(lineup: &ScoredLineup, chip: Option<ChipKind>) -> RoundScore {
    let starting_points = saturating_sum(&lineup.starters);

    let bench_points = match chip {
        Some(ChipKind::BenchCountsToo) => saturating_sum(&lineup.bench),
        _ => 0,
    };

    let armband_bonus = match chip {
        None | Some(ChipKind::UnlimitedTransfers) | Some(ChipKind::BenchCountsToo) => {
            default_bonus(lineup)
        }
        Some(ChipKind::TripleCaptain) => {
            if lineup.captain_played {
                lineup.captain_points().saturating_mul(2)
            } else {
                lineup.vice_points()
            }
        }
        // No safety net: each armband earns its double only if that holder played.
        Some(ChipKind::DualCaptain) => lineup.captain_points().saturating_add(lineup.vice_points()),
    };

    RoundScore {
        starting_points,
        bench_points,
        armband_bonus,
    }
}

fn saturating_sum(points: &[(AthleteId, i32)]) -> i32 {
    points.iter().fold(0i32, |acc, (_, p)| acc.saturating_add(*p))
}
