//! Domain types for the fantasy competition rules engine.
//!
//! This module provides:
//! - Identity primitives: AthleteId, ParticipantId, FixtureId, RoundId, Club
//! - Lossless Decimal for prices and budgets
//! - Athlete catalogue, match stat lines, rosters and chips
//! - Per-round ledger rows (transfer records, point totals, settlement runs)

pub mod athlete;
pub mod chip;
pub mod decimal;
pub mod primitives;
pub mod round;
pub mod roster;
pub mod stats;

pub use athlete::{Athlete, Catalogue, Position, Status};
pub use chip::{ChipAvailability, ChipKind, ChipSelectionRecord, ChipUsageRecord};
pub use decimal::Decimal;
pub use primitives::{AthleteId, Club, FixtureId, ParticipantId, RoundId};
pub use round::{PointsBreakdown, RoundPointTotal, SettlementRun, TransferRecord};
pub use roster::{Lineup, Roster, BENCH, SQUAD_SIZE, STARTERS};
pub use stats::MatchStatLine;
