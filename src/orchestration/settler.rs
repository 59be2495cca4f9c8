use crate::config::Config;
use crate::domain::{
    Catalogue, ChipKind, ParticipantId, RoundId, RoundPointTotal, SettlementRun,
};
use crate::engine::{FormationRule, Substitution, FREE_TRANSFER_MIN};
use crate::settlement::{
    settle_participant, ParticipantError, ParticipantInput, ParticipantSettlement, RoundStats,
    SettlementPhase,
};
use crate::store::{LeagueStore, StoreError};
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Drives a round through `NotStarted -> StatsLoaded -> ParticipantsSettled -> Finalized`.
#[derive(Debug, Clone)]
pub struct RoundSettler {
    store: Arc<dyn LeagueStore>,
    rule: FormationRule,
    concurrency: usize,
}

impl RoundSettler {
    pub fn new(store: Arc<dyn LeagueStore>, config: &Config) -> Self {
        Self {
            store,
            rule: FormationRule::CANONICAL,
            concurrency: config.settlement_concurrency.max(1),
        }
    }

    /// Settle every participant holding a roster for `round`, including those
    /// whose latest roster was saved in an earlier round and carries forward.
    ///
    /// Safe to re-run: totals, resolved lineups and balances are upserts and chip
    /// usage is insert-if-absent. A failing participant is reported and skipped;
    /// only a failure to load the round's shared inputs aborts the run.
    pub async fn settle_round(&self, round: RoundId) -> Result<SettlementReport, SettlementError> {
        let run_id = Uuid::new_v4();
        let mut phase = SettlementPhase::NotStarted;
        info!(%run_id, round = %round, phase = %phase, "Settlement started");

        let catalogue = Catalogue::new(self.store.athletes().await?);
        let stats = RoundStats::load(self.store.as_ref(), round).await?;
        let participants = self.store.participants(round).await?;
        phase = SettlementPhase::StatsLoaded;
        info!(
            %run_id,
            round = %round,
            phase = %phase,
            athletes_with_stats = stats.athlete_count(),
            participants = participants.len(),
            "Round stats loaded"
        );
        if stats.orphan_count() > 0 {
            warn!(
                %run_id,
                round = %round,
                orphan_lines = stats.orphan_count(),
                "Stat lines reference fixtures outside the round"
            );
        }

        // Each task owns its handles so the stream stays Send for the axum handler.
        let catalogue = Arc::new(catalogue);
        let stats = Arc::new(stats);
        let outcomes: Vec<(ParticipantId, Result<ParticipantSettlement, ParticipantError>)> =
            stream::iter(participants)
                .map(|participant| {
                    let settler = self.clone();
                    let catalogue = Arc::clone(&catalogue);
                    let stats = Arc::clone(&stats);
                    async move {
                        let outcome = settler
                            .settle_one(participant, round, &catalogue, &stats)
                            .await;
                        (participant, outcome)
                    }
                })
                .buffer_unordered(self.concurrency)
                .collect()
                .await;
        phase = SettlementPhase::ParticipantsSettled;
        debug!(%run_id, round = %round, phase = %phase, outcomes = outcomes.len(), "Participants processed");

        let mut settled = Vec::new();
        let mut failures = Vec::new();
        for (participant, outcome) in outcomes {
            match outcome {
                Ok(settlement) => settled.push(SettledParticipant::from(settlement)),
                Err(err) => {
                    match &err {
                        ParticipantError::InvariantViolation(_) => error!(
                            %run_id,
                            participant = %participant,
                            round = %round,
                            error = %err,
                            "Invariant violated during settlement, prior total kept"
                        ),
                        ParticipantError::DataIntegrity(_) => warn!(
                            %run_id,
                            participant = %participant,
                            round = %round,
                            error = %err,
                            "Participant skipped"
                        ),
                        ParticipantError::Store(_) => error!(
                            %run_id,
                            participant = %participant,
                            round = %round,
                            error = %err,
                            "Store failure while settling participant"
                        ),
                    }
                    failures.push(SettlementFailure {
                        participant,
                        kind: err.kind(),
                        reason: err.to_string(),
                    });
                }
            }
        }
        settled.sort_by_key(|s| s.total.participant);
        failures.sort_by_key(|f| f.participant);

        let finished_at = Utc::now();
        let run = SettlementRun {
            run_id,
            round,
            settled: count(settled.len()),
            failed: count(failures.len()),
            finished_at,
        };
        self.store.record_settlement_run(&run).await?;
        phase = SettlementPhase::Finalized;

        info!(
            %run_id,
            round = %round,
            phase = %phase,
            settled = run.settled,
            failed = run.failed,
            "Settlement finished"
        );

        Ok(SettlementReport {
            run_id,
            round,
            phase,
            settled,
            failures,
            finished_at,
        })
    }

    async fn settle_one(
        &self,
        participant: ParticipantId,
        round: RoundId,
        catalogue: &Catalogue,
        stats: &RoundStats,
    ) -> Result<ParticipantSettlement, ParticipantError> {
        let roster = match self.store.roster(participant, round).await? {
            Some(roster) => roster,
            None => {
                let carried = self
                    .store
                    .latest_roster_before(participant, round)
                    .await?
                    .ok_or_else(|| {
                        ParticipantError::DataIntegrity(format!("no roster for round {}", round))
                    })?;
                debug!(
                    participant = %participant,
                    round = %round,
                    from_round = %carried.round,
                    "Roster carried forward"
                );
                carried
            }
        };
        let chip = self.store.chip_selection(participant, round).await?;
        let chip_usages = self.store.chip_usages(participant).await?;
        let transfers = self.store.transfer_record(participant, round).await?;
        let free_transfers = self
            .store
            .free_transfer_balance(participant, round)
            .await?
            .or(transfers.map(|t| t.free_transfers))
            .unwrap_or(FREE_TRANSFER_MIN);

        let input = ParticipantInput {
            participant,
            round,
            lineup: &roster.lineup,
            chip,
            chip_usages: &chip_usages,
            transfers,
            free_transfers,
        };
        let settlement = settle_participant(&input, catalogue, stats, &self.rule)?;

        for warning in &settlement.warnings {
            warn!(participant = %participant, round = %round, "{}", warning);
        }

        self.store
            .save_resolved_lineup(participant, round, &settlement.lineup)
            .await?;
        if let Some(usage) = settlement.chip_usage() {
            let inserted = self.store.record_chip_usage(&usage).await?;
            debug!(participant = %participant, chip = %usage.chip, inserted, "Chip usage recorded");
        }
        self.store
            .upsert_free_transfer_balance(participant, round.next(), settlement.next_free_transfers)
            .await?;
        self.store.upsert_round_total(&settlement.total).await?;

        debug!(
            participant = %participant,
            round = %round,
            points = settlement.total.points,
            substitutions = settlement.substitutions.len(),
            "Participant settled"
        );
        Ok(settlement)
    }
}

fn count(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

/// Outcome of one settlement run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettlementReport {
    pub run_id: Uuid,
    pub round: RoundId,
    pub phase: SettlementPhase,
    /// Ascending by participant.
    pub settled: Vec<SettledParticipant>,
    /// Ascending by participant.
    pub failures: Vec<SettlementFailure>,
    pub finished_at: DateTime<Utc>,
}

impl SettlementReport {
    pub fn total_for(&self, participant: ParticipantId) -> Option<&RoundPointTotal> {
        self.settled
            .iter()
            .find(|s| s.total.participant == participant)
            .map(|s| &s.total)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettledParticipant {
    pub total: RoundPointTotal,
    pub chip: Option<ChipKind>,
    pub substitutions: Vec<Substitution>,
    pub next_free_transfers: u8,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl From<ParticipantSettlement> for SettledParticipant {
    fn from(s: ParticipantSettlement) -> Self {
        SettledParticipant {
            total: s.total,
            chip: s.chip,
            substitutions: s.substitutions,
            next_free_transfers: s.next_free_transfers,
            warnings: s.warnings,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettlementFailure {
    pub participant: ParticipantId,
    pub kind: &'static str,
    pub reason: String,
}

#[derive(Debug, Error)]
pub enum SettlementError {
    #[error(transparent)]
    Store(#[from] StoreError),
}
