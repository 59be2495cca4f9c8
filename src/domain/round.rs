//! Per-round ledger rows: transfer records, point totals and settlement runs.

use crate::domain::{ParticipantId, RoundId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Transfers a participant made for a round, recorded when the roster is saved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferRecord {
    pub participant: ParticipantId,
    pub round: RoundId,
    pub transfers_made: u32,
    /// Free transfers banked when entering the round.
    pub free_transfers: u8,
    /// Balance carried into the following round.
    pub next_free_transfers: u8,
    /// Penalty with the chip selected when last saved. Settlement recomputes it.
    pub point_penalty: i32,
}

/// How a round total was assembled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointsBreakdown {
    pub starting_points: i32,
    pub bench_points: i32,
    pub armband_bonus: i32,
    pub transfer_penalty: i32,
}

impl PointsBreakdown {
    pub fn total(&self) -> i32 {
        self.starting_points
            .saturating_add(self.bench_points)
            .saturating_add(self.armband_bonus)
            .saturating_sub(self.transfer_penalty)
    }
}

/// Authoritative settlement output for one participant in one round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundPointTotal {
    pub participant: ParticipantId,
    pub round: RoundId,
    pub points: i32,
    pub breakdown: PointsBreakdown,
}

impl RoundPointTotal {
    pub fn new(participant: ParticipantId, round: RoundId, breakdown: PointsBreakdown) -> Self {
        RoundPointTotal {
            participant,
            round,
            points: breakdown.total(),
            breakdown,
        }
    }
}

/// Audit row written when a settlement run reaches `Finalized`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettlementRun {
    pub run_id: Uuid,
    pub round: RoundId,
    pub settled: u32,
    pub failed: u32,
    pub finished_at: DateTime<Utc>,
}
