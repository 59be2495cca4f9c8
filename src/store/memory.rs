//! In-memory store for tests and local runs without a database.

use super::{LeagueStore, StoreError};
use crate::domain::{
    Athlete, ChipKind, ChipSelectionRecord, ChipUsageRecord, FixtureId, Lineup, MatchStatLine, ParticipantId, Roster,
    RoundId, RoundPointTotal, SettlementRun, TransferRecord,
};
use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

type Key = (ParticipantId, RoundId);

#[derive(Debug, Default)]
struct State {
    athletes: BTreeMap<i64, Athlete>,
    fixtures: BTreeMap<RoundId, Vec<FixtureId>>,
    stat_lines: BTreeMap<RoundId, Vec<MatchStatLine>>,
    rosters: BTreeMap<Key, Roster>,
    resolved: HashMap<Key, Lineup>,
    chip_selections: HashMap<Key, ChipKind>,
    chip_usages: Vec<ChipUsageRecord>,
    balances: HashMap<Key, u8>,
    transfers: HashMap<Key, TransferRecord>,
    totals: BTreeMap<Key, RoundPointTotal>,
    runs: Vec<SettlementRun>,
}

/// Store backed by process memory.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: RwLock<State>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, State> {
        self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, State> {
        self.state.write().unwrap_or_else(|e| e.into_inner())
    }

    fn state_mut(&mut self) -> &mut State {
        self.state.get_mut().unwrap_or_else(|e| e.into_inner())
    }

    pub fn with_athlete(mut self, athlete: Athlete) -> Self {
        self.state_mut().athletes.insert(athlete.id.as_i64(), athlete);
        self
    }

    pub fn with_athletes(mut self, athletes: impl IntoIterator<Item = Athlete>) -> Self {
        let state = self.state_mut();
        for athlete in athletes {
            state.athletes.insert(athlete.id.as_i64(), athlete);
        }
        self
    }

    pub fn with_fixture(mut self, round: RoundId, fixture: FixtureId) -> Self {
        self.state_mut().fixtures.entry(round).or_default().push(fixture);
        self
    }

    pub fn with_stat_line(mut self, round: RoundId, line: MatchStatLine) -> Self {
        self.state_mut()
            .stat_lines
            .entry(round)
            .or_default()
            .push(line);
        self
    }

    pub fn with_stat_lines(
        mut self,
        round: RoundId,
        lines: impl IntoIterator<Item = MatchStatLine>,
    ) -> Self {
        self.state_mut()
            .stat_lines
            .entry(round)
            .or_default()
            .extend(lines);
        self
    }

    pub fn with_roster(mut self, roster: Roster) -> Self {
        self.state_mut()
            .rosters
            .insert((roster.participant, roster.round), roster);
        self
    }

    pub fn with_chip_selection(
        mut self,
        participant: ParticipantId,
        round: RoundId,
        chip: ChipKind,
    ) -> Self {
        self.state_mut()
            .chip_selections
            .insert((participant, round), chip);
        self
    }

    pub fn with_chip_usage(mut self, record: ChipUsageRecord) -> Self {
        self.state_mut().chip_usages.push(record);
        self
    }

    pub fn with_free_transfer_balance(
        mut self,
        participant: ParticipantId,
        round: RoundId,
        balance: u8,
    ) -> Self {
        self.state_mut()
            .balances
            .insert((participant, round), balance);
        self
    }

    pub fn with_transfer_record(mut self, record: TransferRecord) -> Self {
        self.state_mut()
            .transfers
            .insert((record.participant, record.round), record);
        self
    }

    /// Replace an athlete's stat lines for a round (re-entry before settlement).
    pub fn replace_stat_lines(&self, round: RoundId, lines: Vec<MatchStatLine>) {
        self.write().stat_lines.insert(round, lines);
    }

    pub fn settlement_runs(&self) -> Vec<SettlementRun> {
        self.read().runs.clone()
    }
}

#[async_trait]
impl LeagueStore for InMemoryStore {
    async fn athletes(&self) -> Result<Vec<Athlete>, StoreError> {
        Ok(self.read().athletes.values().cloned().collect())
    }

    async fn round_fixtures(&self, round: RoundId) -> Result<Vec<FixtureId>, StoreError> {
        Ok(self.read().fixtures.get(&round).cloned().unwrap_or_default())
    }

    async fn stat_lines(&self, round: RoundId) -> Result<Vec<MatchStatLine>, StoreError> {
        Ok(self.read().stat_lines.get(&round).cloned().unwrap_or_default())
    }

    async fn participants(&self, round: RoundId) -> Result<Vec<ParticipantId>, StoreError> {
        let participants: BTreeSet<ParticipantId> = self
            .read()
            .rosters
            .keys()
            .filter(|(_, r)| *r <= round)
            .map(|(p, _)| *p)
            .collect();
        Ok(participants.into_iter().collect())
    }

    async fn roster(
        &self,
        participant: ParticipantId,
        round: RoundId,
    ) -> Result<Option<Roster>, StoreError> {
        Ok(self.read().rosters.get(&(participant, round)).cloned())
    }

    async fn latest_roster_before(
        &self,
        participant: ParticipantId,
        round: RoundId,
    ) -> Result<Option<Roster>, StoreError> {
        Ok(self
            .read()
            .rosters
            .range((participant, RoundId(0))..(participant, round))
            .next_back()
            .map(|(_, roster)| roster.clone()))
    }

    async fn save_roster(&self, roster: &Roster) -> Result<(), StoreError> {
        self.write()
            .rosters
            .insert((roster.participant, roster.round), roster.clone());
        Ok(())
    }

    async fn resolved_lineup(
        &self,
        participant: ParticipantId,
        round: RoundId,
    ) -> Result<Option<Lineup>, StoreError> {
        Ok(self.read().resolved.get(&(participant, round)).cloned())
    }

    async fn save_resolved_lineup(
        &self,
        participant: ParticipantId,
        round: RoundId,
        lineup: &Lineup,
    ) -> Result<(), StoreError> {
        self.write()
            .resolved
            .insert((participant, round), lineup.clone());
        Ok(())
    }

    async fn chip_selection(
        &self,
        participant: ParticipantId,
        round: RoundId,
    ) -> Result<Option<ChipKind>, StoreError> {
        Ok(self
            .read()
            .chip_selections
            .get(&(participant, round))
            .copied())
    }

    async fn chip_selections(
        &self,
        participant: ParticipantId,
    ) -> Result<Vec<ChipSelectionRecord>, StoreError> {
        let mut selections: Vec<ChipSelectionRecord> = self
            .read()
            .chip_selections
            .iter()
            .filter(|((p, _), _)| *p == participant)
            .map(|((p, r), chip)| ChipSelectionRecord {
                participant: *p,
                round: *r,
                chip: *chip,
            })
            .collect();
        selections.sort_by_key(|s| s.round);
        Ok(selections)
    }

    async fn save_chip_selection(
        &self,
        participant: ParticipantId,
        round: RoundId,
        chip: Option<ChipKind>,
    ) -> Result<(), StoreError> {
        let mut state = self.write();
        match chip {
            Some(chip) => state.chip_selections.insert((participant, round), chip),
            None => state.chip_selections.remove(&(participant, round)),
        };
        Ok(())
    }

    async fn chip_usages(
        &self,
        participant: ParticipantId,
    ) -> Result<Vec<ChipUsageRecord>, StoreError> {
        Ok(self
            .read()
            .chip_usages
            .iter()
            .filter(|u| u.participant == participant)
            .copied()
            .collect())
    }

    async fn record_chip_usage(&self, record: &ChipUsageRecord) -> Result<bool, StoreError> {
        let mut state = self.write();
        let exists = state
            .chip_usages
            .iter()
            .any(|u| u.participant == record.participant && u.chip == record.chip);
        if exists {
            return Ok(false);
        }
        state.chip_usages.push(*record);
        Ok(true)
    }

    async fn free_transfer_balance(
        &self,
        participant: ParticipantId,
        round: RoundId,
    ) -> Result<Option<u8>, StoreError> {
        Ok(self.read().balances.get(&(participant, round)).copied())
    }

    async fn upsert_free_transfer_balance(
        &self,
        participant: ParticipantId,
        round: RoundId,
        balance: u8,
    ) -> Result<(), StoreError> {
        self.write().balances.insert((participant, round), balance);
        Ok(())
    }

    async fn transfer_record(
        &self,
        participant: ParticipantId,
        round: RoundId,
    ) -> Result<Option<TransferRecord>, StoreError> {
        Ok(self.read().transfers.get(&(participant, round)).copied())
    }

    async fn save_transfer_record(&self, record: &TransferRecord) -> Result<(), StoreError> {
        self.write()
            .transfers
            .insert((record.participant, record.round), *record);
        Ok(())
    }

    async fn upsert_round_total(&self, total: &RoundPointTotal) -> Result<(), StoreError> {
        self.write()
            .totals
            .insert((total.participant, total.round), *total);
        Ok(())
    }

    async fn round_totals(&self, round: RoundId) -> Result<Vec<RoundPointTotal>, StoreError> {
        Ok(self
            .read()
            .totals
            .values()
            .filter(|t| t.round == round)
            .copied()
            .collect())
    }

    async fn record_settlement_run(&self, run: &SettlementRun) -> Result<(), StoreError> {
        self.write().runs.push(run.clone());
        Ok(())
    }
}
