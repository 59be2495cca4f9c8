//! Formation and bench predicates shared by lineup validation and auto-substitution.
//!
//! A single formation rule is used everywhere: a lineup accepted at save time is
//! always one the auto-substitution resolver considers valid, and vice versa.

use crate::domain::{AthleteId, Lineup, Position, BENCH, STARTERS};
use serde::Serialize;
use std::collections::HashMap;

/// Minimum number of starters per position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormationRule {
    pub min_keepers: usize,
    pub min_defenders: usize,
    pub min_midfielders: usize,
    pub min_forwards: usize,
}

impl FormationRule {
    pub const CANONICAL: FormationRule = FormationRule {
        min_keepers: 1,
        min_defenders: 3,
        min_midfielders: 3,
        min_forwards: 2,
    };

    pub fn minimum(&self, position: Position) -> usize {
        match position {
            Position::Keeper => self.min_keepers,
            Position::Defender => self.min_defenders,
            Position::Midfielder => self.min_midfielders,
            Position::Forward => self.min_forwards,
        }
    }
}

impl Default for FormationRule {
    fn default() -> Self {
        Self::CANONICAL
    }
}

/// Per-position head count of a set of athletes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PositionCounts {
    pub keepers: usize,
    pub defenders: usize,
    pub midfielders: usize,
    pub forwards: usize,
    /// Ids with no known position.
    pub unknown: usize,
}

impl PositionCounts {
    pub fn tally(ids: &[AthleteId], positions: &HashMap<AthleteId, Position>) -> Self {
        let mut counts = PositionCounts::default();
        for id in ids {
            match positions.get(id) {
                Some(Position::Keeper) => counts.keepers += 1,
                Some(Position::Defender) => counts.defenders += 1,
                Some(Position::Midfielder) => counts.midfielders += 1,
                Some(Position::Forward) => counts.forwards += 1,
                None => counts.unknown += 1,
            }
        }
        counts
    }

    pub fn get(&self, position: Position) -> usize {
        match position {
            Position::Keeper => self.keepers,
            Position::Defender => self.defenders,
            Position::Midfielder => self.midfielders,
            Position::Forward => self.forwards,
        }
    }
}

/// Starters are valid iff there are exactly 11, all positions known, and every
/// position meets the rule's minimum.
pub fn is_valid_formation(
    starters: &[AthleteId],
    positions: &HashMap<AthleteId, Position>,
    rule: &FormationRule,
) -> bool {
    if starters.len() != STARTERS {
        return false;
    }
    let counts = PositionCounts::tally(starters, positions);
    counts.unknown == 0
        && Position::ALL
            .iter()
            .all(|p| counts.get(*p) >= rule.minimum(*p))
}

/// Bench is valid iff there are exactly 4 athletes and exactly one keeper.
pub fn is_valid_bench(bench: &[AthleteId], positions: &HashMap<AthleteId, Position>) -> bool {
    if bench.len() != BENCH {
        return false;
    }
    let counts = PositionCounts::tally(bench, positions);
    counts.unknown == 0 && counts.keepers == 1
}

/// Reasons a lineup is rejected at save time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum LineupViolation {
    StarterCount { found: usize },
    BenchCount { found: usize },
    DuplicateAthlete { athlete: AthleteId },
    UnknownPosition { athlete: AthleteId },
    Formation { position: Position, minimum: usize, found: usize },
    BenchKeepers { found: usize },
    MissingCaptain,
    MissingViceCaptain,
    CaptainNotStarting { athlete: AthleteId },
    ViceCaptainNotStarting { athlete: AthleteId },
    CaptainIsViceCaptain,
}

impl std::fmt::Display for LineupViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LineupViolation::StarterCount { found } => {
                write!(f, "expected {} starters, found {}", STARTERS, found)
            }
            LineupViolation::BenchCount { found } => {
                write!(f, "expected {} bench athletes, found {}", BENCH, found)
            }
            LineupViolation::DuplicateAthlete { athlete } => {
                write!(f, "athlete {} appears more than once", athlete)
            }
            LineupViolation::UnknownPosition { athlete } => {
                write!(f, "athlete {} has no known position", athlete)
            }
            LineupViolation::Formation {
                position,
                minimum,
                found,
            } => write!(
                f,
                "formation needs at least {} {} starters, found {}",
                minimum, position, found
            ),
            LineupViolation::BenchKeepers { found } => {
                write!(f, "bench needs exactly 1 keeper, found {}", found)
            }
            LineupViolation::MissingCaptain => write!(f, "no captain selected"),
            LineupViolation::MissingViceCaptain => write!(f, "no vice-captain selected"),
            LineupViolation::CaptainNotStarting { athlete } => {
                write!(f, "captain {} is not a starter", athlete)
            }
            LineupViolation::ViceCaptainNotStarting { athlete } => {
                write!(f, "vice-captain {} is not a starter", athlete)
            }
            LineupViolation::CaptainIsViceCaptain => {
                write!(f, "captain and vice-captain must differ")
            }
        }
    }
}

/// Every structural problem with an authored lineup. Empty means valid.
pub fn lineup_violations(
    lineup: &Lineup,
    positions: &HashMap<AthleteId, Position>,
    rule: &FormationRule,
) -> Vec<LineupViolation> {
    let mut violations = Vec::new();

    if lineup.starters.len() != STARTERS {
        violations.push(LineupViolation::StarterCount {
            found: lineup.starters.len(),
        });
    }
    if lineup.bench.len() != BENCH {
        violations.push(LineupViolation::BenchCount {
            found: lineup.bench.len(),
        });
    }

    let mut seen = std::collections::HashSet::new();
    for id in lineup.athlete_ids() {
        if !seen.insert(*id) {
            violations.push(LineupViolation::DuplicateAthlete { athlete: *id });
        }
        if !positions.contains_key(id) {
            violations.push(LineupViolation::UnknownPosition { athlete: *id });
        }
    }

    let starters = PositionCounts::tally(&lineup.starters, positions);
    for position in Position::ALL {
        let minimum = rule.minimum(position);
        let found = starters.get(position);
        if found < minimum {
            violations.push(LineupViolation::Formation {
                position,
                minimum,
                found,
            });
        }
    }

    let bench = PositionCounts::tally(&lineup.bench, positions);
    if bench.keepers != 1 {
        violations.push(LineupViolation::BenchKeepers {
            found: bench.keepers,
        });
    }

    match lineup.captain {
        None => violations.push(LineupViolation::MissingCaptain),
        Some(c) if !lineup.is_starter(c) => {
            violations.push(LineupViolation::CaptainNotStarting { athlete: c })
        }
        Some(_) => {}
    }
    match lineup.vice_captain {
        None => violations.push(LineupViolation::MissingViceCaptain),
        Some(v) if !lineup.is_starter(v) => {
            violations.push(LineupViolation::ViceCaptainNotStarting { athlete: v })
        }
        Some(_) => {}
    }
    if lineup.captain.is_some() && lineup.captain == lineup.vice_captain {
        violations.push(LineupViolation::CaptainIsViceCaptain);
    }

    violations
}
