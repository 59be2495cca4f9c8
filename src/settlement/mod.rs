//! Round settlement: turns a round's stat lines and every participant's roster
//! into one authoritative point total per participant.
//!
//! This module provides:
//! - `RoundStats`: the round's stat lines aggregated per athlete
//! - `SettlementPhase`: progress of a settlement run
//! - `settle_participant`: the pure per-participant pipeline
//! - `ParticipantError`: why a single participant could not be settled
//!
//! Stat lines are aggregated before scoring: all lines of an athlete within the
//! round are merged (numeric fields summed, flags OR'd) and the merged line is
//! scored once. This is applied uniformly, including single-fixture rounds.
//! The minutes bands and the goals-conceded halving are not additive, so an
//! athlete with two fixtures is scored on combined minutes and combined goals
//! conceded rather than per fixture.

use crate::domain::{AthleteId, FixtureId, MatchStatLine, Position, RoundId};
use crate::engine::scoring;
use crate::store::{LeagueStore, StoreError};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use thiserror::Error;

pub mod participant;

pub use participant::{settle_participant, ParticipantInput, ParticipantSettlement};

/// Progress of a round settlement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SettlementPhase {
    NotStarted,
    StatsLoaded,
    ParticipantsSettled,
    Finalized,
}

impl SettlementPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            SettlementPhase::NotStarted => "not_started",
            SettlementPhase::StatsLoaded => "stats_loaded",
            SettlementPhase::ParticipantsSettled => "participants_settled",
            SettlementPhase::Finalized => "finalized",
        }
    }
}

impl std::fmt::Display for SettlementPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why one participant could not be settled. Never aborts the batch.
#[derive(Debug, Error)]
pub enum ParticipantError {
    /// Inputs reference something that does not exist or is malformed.
    #[error("data integrity: {0}")]
    DataIntegrity(String),
    /// A post-condition failed after resolution. Prior totals are kept.
    #[error("invariant violation: {0}")]
    InvariantViolation(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ParticipantError {
    pub fn kind(&self) -> &'static str {
        match self {
            ParticipantError::DataIntegrity(_) => "data_integrity",
            ParticipantError::InvariantViolation(_) => "invariant_violation",
            ParticipantError::Store(_) => "store",
        }
    }
}

/// A round's stat lines, merged per athlete.
#[derive(Debug, Clone)]
pub struct RoundStats {
    round: RoundId,
    lines: HashMap<AthleteId, MatchStatLine>,
    /// Fixtures referenced by an athlete's lines that are not in the round.
    orphans: BTreeMap<AthleteId, Vec<FixtureId>>,
}

impl RoundStats {
    /// Merge `lines` per athlete. Lines whose fixture is not one of `fixtures`
    /// are set aside as orphans instead of being scored.
    pub fn aggregate(
        round: RoundId,
        fixtures: &[FixtureId],
        lines: impl IntoIterator<Item = MatchStatLine>,
    ) -> Self {
        let scheduled: HashSet<FixtureId> = fixtures.iter().copied().collect();
        let mut merged: HashMap<AthleteId, MatchStatLine> = HashMap::new();
        let mut orphans: BTreeMap<AthleteId, Vec<FixtureId>> = BTreeMap::new();

        for line in lines {
            if !scheduled.contains(&line.fixture) {
                orphans.entry(line.athlete).or_default().push(line.fixture);
                continue;
            }
            merged
                .entry(line.athlete)
                .and_modify(|acc| *acc = acc.merge(&line))
                .or_insert(line);
        }

        RoundStats {
            round,
            lines: merged,
            orphans,
        }
    }

    /// Read the round's fixtures and stat lines from the store and aggregate them.
    pub async fn load(store: &dyn LeagueStore, round: RoundId) -> Result<Self, StoreError> {
        let fixtures = store.round_fixtures(round).await?;
        let lines = store.stat_lines(round).await?;
        Ok(Self::aggregate(round, &fixtures, lines))
    }

    pub fn round(&self) -> RoundId {
        self.round
    }

    /// Aggregated line of an athlete, if any stats were entered.
    pub fn line(&self, athlete: AthleteId) -> Option<&MatchStatLine> {
        self.lines.get(&athlete)
    }

    /// Minutes across the round. Absent athletes did not play.
    pub fn minutes(&self, athlete: AthleteId) -> u32 {
        self.line(athlete).map(|l| l.minutes).unwrap_or(0)
    }

    pub fn minutes_for<'a>(
        &self,
        athletes: impl IntoIterator<Item = &'a AthleteId>,
    ) -> HashMap<AthleteId, u32> {
        athletes
            .into_iter()
            .map(|id| (*id, self.minutes(*id)))
            .collect()
    }

    /// Points of the athlete's aggregated line. No stats scores zero.
    pub fn points(&self, athlete: AthleteId, position: Position) -> i32 {
        self.line(athlete)
            .map(|line| scoring::points(line, position))
            .unwrap_or(0)
    }

    /// Out-of-round fixtures referenced by the athlete's lines.
    pub fn orphan_fixtures(&self, athlete: AthleteId) -> Option<&[FixtureId]> {
        self.orphans.get(&athlete).map(|f| f.as_slice())
    }

    pub fn orphan_count(&self) -> usize {
        self.orphans.values().map(Vec::len).sum()
    }

    pub fn athlete_count(&self) -> usize {
        self.lines.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(athlete: i64, fixture: i64, minutes: u32) -> MatchStatLine {
        let mut line = MatchStatLine::empty(AthleteId::new(athlete), FixtureId::new(fixture));
        line.minutes = minutes;
        line
    }

    #[test]
    fn test_aggregate_merges_fixtures_before_scoring() {
        let mut first = line(1, 10, 30);
        first.goals = 1;
        let mut second = line(1, 11, 40);
        second.clean_sheet = true;

        let stats = RoundStats::aggregate(
            RoundId::new(1),
            &[FixtureId::new(10), FixtureId::new(11)],
            vec![first, second],
        );

        assert_eq!(stats.minutes(AthleteId::new(1)), 70);
        // 70 combined minutes earn the 60+ band once: 2 + 5 (goal) + 1 (clean sheet)
        assert_eq!(stats.points(AthleteId::new(1), Position::Midfielder), 8);
        assert_eq!(stats.athlete_count(), 1);
    }

    #[test]
    fn test_orphan_lines_are_not_scored() {
        let stats = RoundStats::aggregate(
            RoundId::new(2),
            &[FixtureId::new(20)],
            vec![line(1, 20, 90), line(2, 99, 90)],
        );

        assert_eq!(stats.orphan_fixtures(AthleteId::new(1)), None);
        assert_eq!(
            stats.orphan_fixtures(AthleteId::new(2)),
            Some(&[FixtureId::new(99)][..])
        );
        assert_eq!(stats.minutes(AthleteId::new(2)), 0);
        assert_eq!(stats.orphan_count(), 1);
    }

    #[test]
    fn test_missing_athlete_scores_zero() {
        let stats = RoundStats::aggregate(RoundId::new(1), &[], Vec::new());
        assert_eq!(stats.points(AthleteId::new(5), Position::Forward), 0);
        assert_eq!(stats.minutes(AthleteId::new(5)), 0);
    }

    #[test]
    fn test_phase_display() {
        assert_eq!(SettlementPhase::StatsLoaded.to_string(), "stats_loaded");
        assert_eq!(
            serde_json::to_string(&SettlementPhase::Finalized).unwrap(),
            "\"finalized\""
        );
    }
}
