//! Rosters: a participant's 15 athletes for a round, split into starters and bench.

use crate::domain::{AthleteId, ParticipantId, RoundId};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

pub const SQUAD_SIZE: usize = 15;
pub const STARTERS: usize = 11;
pub const BENCH: usize = 4;

/// Ordered starters and bench with the armband holders.
///
/// Order is significant: auto-substitution scans starters and bench in the
/// stored order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lineup {
    pub starters: Vec<AthleteId>,
    pub bench: Vec<AthleteId>,
    pub captain: Option<AthleteId>,
    pub vice_captain: Option<AthleteId>,
}

impl Lineup {
    pub fn new(
        starters: Vec<AthleteId>,
        bench: Vec<AthleteId>,
        captain: AthleteId,
        vice_captain: AthleteId,
    ) -> Self {
        Lineup {
            starters,
            bench,
            captain: Some(captain),
            vice_captain: Some(vice_captain),
        }
    }

    /// All squad ids, starters first, in stored order.
    pub fn athlete_ids(&self) -> impl Iterator<Item = &AthleteId> {
        self.starters.iter().chain(self.bench.iter())
    }

    pub fn squad(&self) -> Vec<AthleteId> {
        self.athlete_ids().copied().collect()
    }

    pub fn is_starter(&self, id: AthleteId) -> bool {
        self.starters.contains(&id)
    }

    pub fn is_on_bench(&self, id: AthleteId) -> bool {
        self.bench.contains(&id)
    }

    pub fn has_duplicates(&self) -> bool {
        let mut seen = HashSet::new();
        self.athlete_ids().any(|id| !seen.insert(*id))
    }
}

/// A participant's lineup for one round as authored by the participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Roster {
    pub participant: ParticipantId,
    pub round: RoundId,
    pub lineup: Lineup,
}

impl Roster {
    pub fn new(participant: ParticipantId, round: RoundId, lineup: Lineup) -> Self {
        Roster {
            participant,
            round,
            lineup,
        }
    }
}
