//! Settlement of a single participant, given everything already loaded.

use super::{ParticipantError, RoundStats};
use crate::domain::{
    AthleteId, Catalogue, ChipAvailability, ChipKind, ChipUsageRecord, Lineup, ParticipantId,
    PointsBreakdown, Position, RoundId, RoundPointTotal, TransferRecord,
};
use crate::engine::{
    apply_chip, is_valid_bench, is_valid_formation, lineup_violations, next_free_transfers,
    penalty_for, resolve, FormationRule, ScoredLineup, Substitution,
};
use std::collections::{HashMap, HashSet};

/// Per-participant inputs of one round.
#[derive(Debug, Clone)]
pub struct ParticipantInput<'a> {
    pub participant: ParticipantId,
    pub round: RoundId,
    /// Lineup as authored by the participant, never the previously resolved one.
    pub lineup: &'a Lineup,
    pub chip: Option<ChipKind>,
    pub chip_usages: &'a [ChipUsageRecord],
    /// Transfers recorded when the roster was saved. `None` means no changes.
    pub transfers: Option<TransferRecord>,
    /// Free transfers banked entering the round.
    pub free_transfers: u8,
}

/// Everything settlement writes back for one participant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParticipantSettlement {
    pub total: RoundPointTotal,
    /// Lineup after auto-substitution and armband resolution.
    pub lineup: Lineup,
    pub substitutions: Vec<Substitution>,
    /// Chip that was actually applied.
    pub chip: Option<ChipKind>,
    /// Balance carried into the following round.
    pub next_free_transfers: u8,
    pub warnings: Vec<String>,
}

impl ParticipantSettlement {
    /// Ledger row to insert-if-absent for the applied chip.
    pub fn chip_usage(&self) -> Option<ChipUsageRecord> {
        self.chip.map(|chip| ChipUsageRecord {
            participant: self.total.participant,
            chip,
            round: self.total.round,
        })
    }
}

/// Settle one participant.
///
/// The authored lineup is checked first; a lineup that references unknown
/// athletes, out-of-round stat lines or breaks the lineup rules is a data
/// integrity failure. Auto-substitution is skipped under `BenchCountsToo`.
/// The transfer count is looked up from the stored transfer record, not
/// recomputed from rosters.
pub fn settle_participant(
    input: &ParticipantInput<'_>,
    catalogue: &Catalogue,
    stats: &RoundStats,
    rule: &FormationRule,
) -> Result<ParticipantSettlement, ParticipantError> {
    let lineup = input.lineup;

    let unknown: Vec<String> = lineup
        .athlete_ids()
        .filter(|id| catalogue.get(**id).is_none())
        .map(|id| id.to_string())
        .collect();
    if !unknown.is_empty() {
        return Err(ParticipantError::DataIntegrity(format!(
            "roster references unknown athletes: {}",
            unknown.join(", ")
        )));
    }

    if let Some((athlete, fixtures)) = lineup
        .athlete_ids()
        .find_map(|id| stats.orphan_fixtures(*id).map(|f| (*id, f)))
    {
        let fixtures: Vec<String> = fixtures.iter().map(|f| f.to_string()).collect();
        return Err(ParticipantError::DataIntegrity(format!(
            "stat lines of athlete {} reference fixtures outside round {}: {}",
            athlete,
            input.round,
            fixtures.join(", ")
        )));
    }

    let positions = catalogue.positions_for(lineup.athlete_ids());
    let violations = lineup_violations(lineup, &positions, rule);
    if !violations.is_empty() {
        let reasons: Vec<String> = violations.iter().map(|v| v.to_string()).collect();
        return Err(ParticipantError::DataIntegrity(format!(
            "stored lineup is invalid: {}",
            reasons.join("; ")
        )));
    }

    let mut warnings = Vec::new();
    let chip = effective_chip(input, &mut warnings);

    let (resolved, substitutions) = if chip == Some(ChipKind::BenchCountsToo) {
        (lineup.clone(), Vec::new())
    } else {
        let minutes = stats.minutes_for(lineup.athlete_ids());
        let resolution = resolve(lineup, &positions, &minutes, rule);
        (resolution.lineup, resolution.substitutions)
    };

    verify_resolution(lineup, &resolved, &positions, rule)?;

    let scored = ScoredLineup {
        starters: score_all(&resolved.starters, &positions, stats),
        bench: score_all(&resolved.bench, &positions, stats),
        captain: resolved.captain,
        vice_captain: resolved.vice_captain,
        captain_played: played_starter(&resolved, resolved.captain, stats),
        vice_played: played_starter(&resolved, resolved.vice_captain, stats),
    };
    let score = apply_chip(&scored, chip);

    let transfers_made = input.transfers.map(|t| t.transfers_made).unwrap_or(0);
    let transfer_penalty = penalty_for(transfers_made, input.free_transfers, chip);
    let next_balance = next_free_transfers(input.free_transfers, transfers_made);

    let breakdown = PointsBreakdown {
        starting_points: score.starting_points,
        bench_points: score.bench_points,
        armband_bonus: score.armband_bonus,
        transfer_penalty,
    };

    Ok(ParticipantSettlement {
        total: RoundPointTotal::new(input.participant, input.round, breakdown),
        lineup: resolved,
        substitutions,
        chip,
        next_free_transfers: next_balance,
        warnings,
    })
}

/// The selected chip, unless the ledger shows it was consumed in another round.
fn effective_chip(input: &ParticipantInput<'_>, warnings: &mut Vec<String>) -> Option<ChipKind> {
    let chip = input.chip?;
    let availability = ChipAvailability::evaluate(chip, input.round, input.chip_usages);
    if availability.available {
        return Some(chip);
    }
    warnings.push(format!(
        "chip ignored: {}",
        availability
            .reason
            .unwrap_or_else(|| format!("{} unavailable", chip))
    ));
    None
}

/// Post-conditions of auto-substitution. Failing any of them is a bug, not bad input.
fn verify_resolution(
    authored: &Lineup,
    resolved: &Lineup,
    positions: &HashMap<AthleteId, Position>,
    rule: &FormationRule,
) -> Result<(), ParticipantError> {
    if !is_valid_formation(&resolved.starters, positions, rule) {
        return Err(ParticipantError::InvariantViolation(format!(
            "resolved starters break the formation rule: {:?}",
            resolved.starters
        )));
    }
    if !is_valid_bench(&resolved.bench, positions) {
        return Err(ParticipantError::InvariantViolation(format!(
            "resolved bench is invalid: {:?}",
            resolved.bench
        )));
    }

    let before: HashSet<&AthleteId> = authored.athlete_ids().collect();
    let after: HashSet<&AthleteId> = resolved.athlete_ids().collect();
    if before != after || resolved.has_duplicates() {
        return Err(ParticipantError::InvariantViolation(
            "resolution changed the squad".to_string(),
        ));
    }

    if let (Some(c), Some(v)) = (resolved.captain, resolved.vice_captain) {
        if c == v {
            return Err(ParticipantError::InvariantViolation(format!(
                "athlete {} holds both armbands",
                c
            )));
        }
    }

    Ok(())
}

fn score_all(
    ids: &[AthleteId],
    positions: &HashMap<AthleteId, Position>,
    stats: &RoundStats,
) -> Vec<(AthleteId, i32)> {
    ids.iter()
        .filter_map(|id| positions.get(id).map(|p| (*id, stats.points(*id, *p))))
        .collect()
}

fn played_starter(lineup: &Lineup, id: Option<AthleteId>, stats: &RoundStats) -> bool {
    id.is_some_and(|id| lineup.is_starter(id) && stats.minutes(id) > 0)
}
