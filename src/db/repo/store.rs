//! `LeagueStore` backed by SQLite.

use super::Repository;
use crate::domain::{
    Athlete, ChipKind, ChipSelectionRecord, ChipUsageRecord, FixtureId, Lineup, MatchStatLine,
    ParticipantId, Roster, RoundId, RoundPointTotal, SettlementRun, TransferRecord,
};
use crate::store::{LeagueStore, StoreError};
use async_trait::async_trait;

#[async_trait]
impl LeagueStore for Repository {
    async fn athletes(&self) -> Result<Vec<Athlete>, StoreError> {
        self.query_athletes().await
    }

    async fn round_fixtures(&self, round: RoundId) -> Result<Vec<FixtureId>, StoreError> {
        self.query_round_fixtures(round).await
    }

    async fn stat_lines(&self, round: RoundId) -> Result<Vec<MatchStatLine>, StoreError> {
        self.query_stat_lines(round).await
    }

    async fn participants(&self, round: RoundId) -> Result<Vec<ParticipantId>, StoreError> {
        self.query_participants(round).await
    }

    async fn roster(
        &self,
        participant: ParticipantId,
        round: RoundId,
    ) -> Result<Option<Roster>, StoreError> {
        self.get_roster(participant, round).await
    }

    async fn latest_roster_before(
        &self,
        participant: ParticipantId,
        round: RoundId,
    ) -> Result<Option<Roster>, StoreError> {
        self.get_latest_roster_before(participant, round).await
    }

    async fn save_roster(&self, roster: &Roster) -> Result<(), StoreError> {
        self.upsert_roster(roster).await
    }

    async fn resolved_lineup(
        &self,
        participant: ParticipantId,
        round: RoundId,
    ) -> Result<Option<Lineup>, StoreError> {
        self.get_resolved_lineup(participant, round).await
    }

    async fn save_resolved_lineup(
        &self,
        participant: ParticipantId,
        round: RoundId,
        lineup: &Lineup,
    ) -> Result<(), StoreError> {
        self.upsert_resolved_lineup(participant, round, lineup).await
    }

    async fn chip_selection(
        &self,
        participant: ParticipantId,
        round: RoundId,
    ) -> Result<Option<ChipKind>, StoreError> {
        self.get_chip_selection(participant, round).await
    }

    async fn chip_selections(
        &self,
        participant: ParticipantId,
    ) -> Result<Vec<ChipSelectionRecord>, StoreError> {
        self.query_chip_selections(participant).await
    }

    async fn save_chip_selection(
        &self,
        participant: ParticipantId,
        round: RoundId,
        chip: Option<ChipKind>,
    ) -> Result<(), StoreError> {
        self.set_chip_selection(participant, round, chip).await
    }

    async fn chip_usages(
        &self,
        participant: ParticipantId,
    ) -> Result<Vec<ChipUsageRecord>, StoreError> {
        self.query_chip_usages(participant).await
    }

    async fn record_chip_usage(&self, record: &ChipUsageRecord) -> Result<bool, StoreError> {
        self.insert_chip_usage(record).await
    }

    async fn free_transfer_balance(
        &self,
        participant: ParticipantId,
        round: RoundId,
    ) -> Result<Option<u8>, StoreError> {
        self.get_free_transfer_balance(participant, round).await
    }

    async fn upsert_free_transfer_balance(
        &self,
        participant: ParticipantId,
        round: RoundId,
        balance: u8,
    ) -> Result<(), StoreError> {
        self.store_free_transfer_balance(participant, round, balance)
            .await
    }

    async fn transfer_record(
        &self,
        participant: ParticipantId,
        round: RoundId,
    ) -> Result<Option<TransferRecord>, StoreError> {
        self.get_transfer_record(participant, round).await
    }

    async fn save_transfer_record(&self, record: &TransferRecord) -> Result<(), StoreError> {
        self.upsert_transfer_record(record).await
    }

    async fn upsert_round_total(&self, total: &RoundPointTotal) -> Result<(), StoreError> {
        self.upsert_round_point_total(total).await
    }

    async fn round_totals(&self, round: RoundId) -> Result<Vec<RoundPointTotal>, StoreError> {
        self.query_round_totals(round).await
    }

    async fn record_settlement_run(&self, run: &SettlementRun) -> Result<(), StoreError> {
        self.insert_settlement_run(run).await
    }
}
