//! Pure, deterministic rule evaluation: scoring, lineup repair, multipliers and
//! the transfer ledger arithmetic. Nothing here touches the store.

pub mod armband;
pub mod autosub;
pub mod formation;
pub mod scoring;
pub mod transfers;

pub use armband::{apply_chip, RoundScore, ScoredLineup};
pub use autosub::{resolve, resolve_armband, Resolution, Substitution};
pub use formation::{
    is_valid_bench, is_valid_formation, lineup_violations, FormationRule, LineupViolation,
    PositionCounts,
};
pub use scoring::points;
pub use transfers::{
    compute_transfers, count_transfers, next_free_transfers, penalty_for, roster_violations,
    validate_roster, RosterViolation, SquadRules, TransferOutcome, FREE_TRANSFER_MAX,
    FREE_TRANSFER_MIN,
};
