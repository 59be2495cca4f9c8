//! Store abstraction over the competition's persistent entities.
//!
//! The rules engine reads athletes, stat lines, rosters, chip selections and
//! ledgers through this trait and writes back round totals and ledger updates.
//! `Repository` (SQLite) and `InMemoryStore` implement it.

use crate::domain::{
    Athlete, ChipKind, ChipSelectionRecord, ChipUsageRecord, FixtureId, Lineup, MatchStatLine, ParticipantId, Roster,
    RoundId, RoundPointTotal, SettlementRun, TransferRecord,
};
use async_trait::async_trait;
use std::fmt;
use thiserror::Error;

pub mod memory;

pub use memory::InMemoryStore;

#[async_trait]
pub trait LeagueStore: Send + Sync + fmt::Debug {
    /// Whole athlete catalogue.
    async fn athletes(&self) -> Result<Vec<Athlete>, StoreError>;

    /// Fixtures scheduled in the round.
    async fn round_fixtures(&self, round: RoundId) -> Result<Vec<FixtureId>, StoreError>;

    /// Every stat line entered for the round, in entry order.
    async fn stat_lines(&self, round: RoundId) -> Result<Vec<MatchStatLine>, StoreError>;

    /// Participants who have saved a roster for the round or any earlier one,
    /// ascending by id. A roster carries forward until it is replaced.
    async fn participants(&self, round: RoundId) -> Result<Vec<ParticipantId>, StoreError>;

    async fn roster(
        &self,
        participant: ParticipantId,
        round: RoundId,
    ) -> Result<Option<Roster>, StoreError>;

    /// Most recent roster saved for a round strictly before `round`.
    async fn latest_roster_before(
        &self,
        participant: ParticipantId,
        round: RoundId,
    ) -> Result<Option<Roster>, StoreError>;

    /// Upsert the participant-authored roster for its round.
    async fn save_roster(&self, roster: &Roster) -> Result<(), StoreError>;

    /// Lineup after auto-substitution, as shown to later "live" reads.
    async fn resolved_lineup(
        &self,
        participant: ParticipantId,
        round: RoundId,
    ) -> Result<Option<Lineup>, StoreError>;

    async fn save_resolved_lineup(
        &self,
        participant: ParticipantId,
        round: RoundId,
        lineup: &Lineup,
    ) -> Result<(), StoreError>;

    async fn chip_selection(
        &self,
        participant: ParticipantId,
        round: RoundId,
    ) -> Result<Option<ChipKind>, StoreError>;

    /// Every pending chip selection of the participant, ascending by round.
    async fn chip_selections(
        &self,
        participant: ParticipantId,
    ) -> Result<Vec<ChipSelectionRecord>, StoreError>;

    /// Set or clear (`None`) the chip played in a round.
    async fn save_chip_selection(
        &self,
        participant: ParticipantId,
        round: RoundId,
        chip: Option<ChipKind>,
    ) -> Result<(), StoreError>;

    async fn chip_usages(
        &self,
        participant: ParticipantId,
    ) -> Result<Vec<ChipUsageRecord>, StoreError>;

    /// Insert-if-absent keyed by participant and chip. Returns true if inserted.
    async fn record_chip_usage(&self, record: &ChipUsageRecord) -> Result<bool, StoreError>;

    /// Free transfers banked when entering the round, if known.
    async fn free_transfer_balance(
        &self,
        participant: ParticipantId,
        round: RoundId,
    ) -> Result<Option<u8>, StoreError>;

    async fn upsert_free_transfer_balance(
        &self,
        participant: ParticipantId,
        round: RoundId,
        balance: u8,
    ) -> Result<(), StoreError>;

    async fn transfer_record(
        &self,
        participant: ParticipantId,
        round: RoundId,
    ) -> Result<Option<TransferRecord>, StoreError>;

    async fn save_transfer_record(&self, record: &TransferRecord) -> Result<(), StoreError>;

    /// Upsert by (participant, round).
    async fn upsert_round_total(&self, total: &RoundPointTotal) -> Result<(), StoreError>;

    /// Totals of the round, ascending by participant.
    async fn round_totals(&self, round: RoundId) -> Result<Vec<RoundPointTotal>, StoreError>;

    async fn record_settlement_run(&self, run: &SettlementRun) -> Result<(), StoreError>;
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Db(#[from] sqlx::Error),
    #[error("corrupt row: {0}")]
    Corrupt(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Corrupt(err.to_string())
    }
}
