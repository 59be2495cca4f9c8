//! One-time chip modifiers and their usage ledger.

use crate::domain::{ParticipantId, RoundId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A one-time-per-season modifier. A round with no chip is `Option::<ChipKind>::None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChipKind {
    /// The four bench athletes' points count too.
    BenchCountsToo,
    /// Captain counted three times instead of twice.
    TripleCaptain,
    /// Both captain and vice-captain are doubled.
    DualCaptain,
    /// Transfer point penalties are waived for the round.
    UnlimitedTransfers,
}

impl ChipKind {
    pub const ALL: [ChipKind; 4] = [
        ChipKind::BenchCountsToo,
        ChipKind::TripleCaptain,
        ChipKind::DualCaptain,
        ChipKind::UnlimitedTransfers,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ChipKind::BenchCountsToo => "bench_counts_too",
            ChipKind::TripleCaptain => "triple_captain",
            ChipKind::DualCaptain => "dual_captain",
            ChipKind::UnlimitedTransfers => "unlimited_transfers",
        }
    }
}

impl fmt::Display for ChipKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChipKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ChipKind::ALL
            .into_iter()
            .find(|c| c.as_str() == s.trim())
            .ok_or_else(|| format!("unknown chip: {}", s))
    }
}

/// Append-only ledger row: `chip` was consumed by `participant` in `round`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChipUsageRecord {
    pub participant: ParticipantId,
    pub chip: ChipKind,
    pub round: RoundId,
}

/// A pending pick: `chip` is selected for `round` but not yet consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChipSelectionRecord {
    pub participant: ParticipantId,
    pub round: RoundId,
    pub chip: ChipKind,
}

/// Answer to "may this participant play this chip in this round?".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChipAvailability {
    pub chip: ChipKind,
    pub available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl ChipAvailability {
    /// Availability of `chip` for `round` given the participant's usage ledger.
    ///
    /// A chip consumed in the same round stays available so that re-selecting
    /// it (or re-running settlement) is harmless.
    pub fn evaluate(chip: ChipKind, round: RoundId, usages: &[ChipUsageRecord]) -> Self {
        match usages
            .iter()
            .find(|u| u.chip == chip && u.round != round)
        {
            Some(used) => ChipAvailability {
                chip,
                available: false,
                reason: Some(format!("{} already used in round {}", chip, used.round)),
            },
            None => ChipAvailability {
                chip,
                available: true,
                reason: None,
            },
        }
    }

    /// Availability at selection time: the usage ledger first, then any
    /// pending selection of the same chip for a different round.
    pub fn for_selection(
        chip: ChipKind,
        round: RoundId,
        usages: &[ChipUsageRecord],
        selections: &[ChipSelectionRecord],
    ) -> Self {
        let availability = Self::evaluate(chip, round, usages);
        if !availability.available {
            return availability;
        }
        match selections
            .iter()
            .find(|s| s.chip == chip && s.round != round)
        {
            Some(pending) => ChipAvailability {
                chip,
                available: false,
                reason: Some(format!("{} already selected for round {}", chip, pending.round)),
            },
            None => availability,
        }
    }
}
