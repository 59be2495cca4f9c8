//! Transfer ledger: squad validation, transfer counting and free-transfer banking.

use crate::domain::{
    AthleteId, Catalogue, ChipKind, Club, Decimal, ParticipantId, Position, RoundId,
    TransferRecord, SQUAD_SIZE,
};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

pub const FREE_TRANSFER_MIN: u8 = 1;
pub const FREE_TRANSFER_MAX: u8 = 5;
pub const POINTS_PER_EXTRA_TRANSFER: i32 = 4;
pub const MAX_PER_CLUB: usize = 3;
pub const DEFAULT_BUDGET_CEILING: &str = "100.0";

/// Squad composition limits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SquadRules {
    pub budget_ceiling: Decimal,
    pub max_per_club: usize,
}

impl SquadRules {
    pub fn new(budget_ceiling: Decimal) -> Self {
        SquadRules {
            budget_ceiling,
            max_per_club: MAX_PER_CLUB,
        }
    }

    /// Exact number of athletes required per position in a 15-man squad.
    pub fn quota(&self, position: Position) -> usize {
        match position {
            Position::Keeper => 2,
            Position::Defender => 5,
            Position::Midfielder => 5,
            Position::Forward => 3,
        }
    }
}

impl Default for SquadRules {
    fn default() -> Self {
        let ceiling = Decimal::from_str(DEFAULT_BUDGET_CEILING).unwrap_or_default();
        SquadRules::new(ceiling)
    }
}

/// A reason a proposed squad is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum RosterViolation {
    SquadSize { found: usize },
    DuplicateAthlete { athlete: AthleteId },
    UnknownAthlete { athlete: AthleteId },
    PositionQuota { position: Position, expected: usize, found: usize },
    ClubCap { club: Club, found: usize, max: usize },
    OverBudget { spent: Decimal, ceiling: Decimal },
}

impl fmt::Display for RosterViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RosterViolation::SquadSize { found } => {
                write!(f, "squad must have {} athletes, found {}", SQUAD_SIZE, found)
            }
            RosterViolation::DuplicateAthlete { athlete } => {
                write!(f, "athlete {} selected more than once", athlete)
            }
            RosterViolation::UnknownAthlete { athlete } => {
                write!(f, "athlete {} does not exist", athlete)
            }
            RosterViolation::PositionQuota {
                position,
                expected,
                found,
            } => write!(f, "squad needs {} {}s, found {}", expected, position, found),
            RosterViolation::ClubCap { club, found, max } => {
                write!(f, "{} athletes from {} (max {})", found, club, max)
            }
            RosterViolation::OverBudget { spent, ceiling } => {
                write!(f, "squad costs {} over budget of {}", spent, ceiling)
            }
        }
    }
}

/// All violations of a proposed squad, checks in order: size and uniqueness,
/// position quotas, club cap, budget. Empty means valid.
pub fn roster_violations(
    candidate: &[AthleteId],
    catalogue: &Catalogue,
    rules: &SquadRules,
) -> Vec<RosterViolation> {
    let mut violations = Vec::new();

    if candidate.len() != SQUAD_SIZE {
        violations.push(RosterViolation::SquadSize {
            found: candidate.len(),
        });
    }

    let mut seen = HashSet::new();
    let mut athletes = Vec::with_capacity(candidate.len());
    for id in candidate {
        if !seen.insert(*id) {
            violations.push(RosterViolation::DuplicateAthlete { athlete: *id });
            continue;
        }
        match catalogue.get(*id) {
            Some(athlete) => athletes.push(athlete),
            None => violations.push(RosterViolation::UnknownAthlete { athlete: *id }),
        }
    }

    for position in Position::ALL {
        let expected = rules.quota(position);
        let found = athletes.iter().filter(|a| a.position == position).count();
        if found != expected {
            violations.push(RosterViolation::PositionQuota {
                position,
                expected,
                found,
            });
        }
    }

    let mut per_club: HashMap<&Club, usize> = HashMap::new();
    for athlete in &athletes {
        *per_club.entry(&athlete.club).or_default() += 1;
    }
    let mut over_cap: Vec<_> = per_club
        .into_iter()
        .filter(|(_, n)| *n > rules.max_per_club)
        .collect();
    over_cap.sort_by(|a, b| a.0.cmp(b.0));
    for (club, found) in over_cap {
        violations.push(RosterViolation::ClubCap {
            club: club.clone(),
            found,
            max: rules.max_per_club,
        });
    }

    let spent: Decimal = athletes.iter().map(|a| a.price).sum();
    if spent > rules.budget_ceiling {
        violations.push(RosterViolation::OverBudget {
            spent,
            ceiling: rules.budget_ceiling,
        });
    }

    violations
}

/// First violation of a proposed squad, if any.
pub fn validate_roster(
    candidate: &[AthleteId],
    catalogue: &Catalogue,
    rules: &SquadRules,
) -> Result<(), RosterViolation> {
    match roster_violations(candidate, catalogue, rules).into_iter().next() {
        Some(violation) => Err(violation),
        None => Ok(()),
    }
}

/// Result of diffing a squad against the previous round's squad.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferOutcome {
    pub transfers_made: u32,
    pub next_free_transfers: u8,
    pub point_penalty: i32,
}

impl TransferOutcome {
    pub fn into_record(
        self,
        participant: ParticipantId,
        round: RoundId,
        free_transfers: u8,
    ) -> TransferRecord {
        TransferRecord {
            participant,
            round,
            transfers_made: self.transfers_made,
            free_transfers,
            next_free_transfers: self.next_free_transfers,
            point_penalty: self.point_penalty,
        }
    }
}

/// Number of athletes in `previous` that are absent from `candidate`.
pub fn count_transfers(previous: &[AthleteId], candidate: &[AthleteId]) -> u32 {
    let incoming: HashSet<&AthleteId> = candidate.iter().collect();
    let outgoing: HashSet<&AthleteId> = previous
        .iter()
        .filter(|id| !incoming.contains(id))
        .collect();
    u32::try_from(outgoing.len()).unwrap_or(u32::MAX)
}

/// Banked balance after a round: +1 per round, minus transfers, within [1, 5].
pub fn next_free_transfers(free_transfers: u8, transfers_made: u32) -> u8 {
    let next = i64::from(free_transfers) - i64::from(transfers_made) + 1;
    let clamped = next.clamp(
        i64::from(FREE_TRANSFER_MIN),
        i64::from(FREE_TRANSFER_MAX),
    );
    u8::try_from(clamped).unwrap_or(FREE_TRANSFER_MIN)
}

/// Points deducted for transfers beyond the free allowance.
pub fn penalty_for(transfers_made: u32, free_transfers: u8, chip: Option<ChipKind>) -> i32 {
    if chip == Some(ChipKind::UnlimitedTransfers) {
        return 0;
    }
    let extra = i64::from(transfers_made) - i64::from(free_transfers);
    let extra = i32::try_from(extra.max(0)).unwrap_or(i32::MAX);
    extra.saturating_mul(POINTS_PER_EXTRA_TRANSFER)
}

pub fn compute_transfers(
    previous: &[AthleteId],
    candidate: &[AthleteId],
    free_transfers: u8,
    chip: Option<ChipKind>,
) -> TransferOutcome {
    let transfers_made = count_transfers(previous, candidate);
    TransferOutcome {
        transfers_made,
        next_free_transfers: next_free_transfers(free_transfers, transfers_made),
        point_penalty: penalty_for(transfers_made, free_transfers, chip),
    }
}
