use crate::config::Config;
use crate::domain::{
    AthleteId, Catalogue, ChipAvailability, ChipKind, Lineup, ParticipantId, Roster, RoundId,
    TransferRecord,
};
use crate::engine::{
    compute_transfers, lineup_violations, penalty_for, roster_violations, FormationRule,
    LineupViolation, RosterViolation, SquadRules, FREE_TRANSFER_MIN,
};
use crate::store::{LeagueStore, StoreError};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

/// Selection-time checks: squads, lineups and chips are rejected here before
/// settlement ever sees them.
#[derive(Debug, Clone)]
pub struct SelectionService {
    store: Arc<dyn LeagueStore>,
    rules: SquadRules,
    formation: FormationRule,
}

/// Every reason a squad or lineup is rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterCheck {
    pub valid: bool,
    pub squad_violations: Vec<RosterViolation>,
    pub lineup_violations: Vec<LineupViolation>,
}

impl RosterCheck {
    fn new(squad_violations: Vec<RosterViolation>, lineup_violations: Vec<LineupViolation>) -> Self {
        RosterCheck {
            valid: squad_violations.is_empty() && lineup_violations.is_empty(),
            squad_violations,
            lineup_violations,
        }
    }
}

impl fmt::Display for RosterCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reasons: Vec<String> = self
            .squad_violations
            .iter()
            .map(|v| v.to_string())
            .chain(self.lineup_violations.iter().map(|v| v.to_string()))
            .collect();
        f.write_str(&reasons.join("; "))
    }
}

#[derive(Debug, Error)]
pub enum SelectionError {
    #[error("invalid roster: {0}")]
    InvalidRoster(RosterCheck),
    #[error("chip unavailable: {0}")]
    ChipUnavailable(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl SelectionService {
    pub fn new(store: Arc<dyn LeagueStore>, config: &Config) -> Self {
        Self {
            store,
            rules: SquadRules::new(config.budget_ceiling),
            formation: FormationRule::CANONICAL,
        }
    }

    async fn catalogue(&self) -> Result<Catalogue, StoreError> {
        Ok(Catalogue::new(self.store.athletes().await?))
    }

    /// Squad rules only: size, uniqueness, position quotas, club cap and budget.
    pub async fn validate_squad(&self, candidate: &[AthleteId]) -> Result<RosterCheck, SelectionError> {
        let catalogue = self.catalogue().await?;
        let squad = roster_violations(candidate, &catalogue, &self.rules);
        Ok(RosterCheck::new(squad, Vec::new()))
    }

    /// Squad rules plus the lineup rules (formation, bench, armband).
    pub async fn validate_lineup(&self, lineup: &Lineup) -> Result<RosterCheck, SelectionError> {
        let catalogue = self.catalogue().await?;
        Ok(self.check(lineup, &catalogue))
    }

    fn check(&self, lineup: &Lineup, catalogue: &Catalogue) -> RosterCheck {
        let squad = roster_violations(&lineup.squad(), catalogue, &self.rules);
        let positions = catalogue.positions_for(lineup.athlete_ids());
        let lineup = lineup_violations(lineup, &positions, &self.formation);
        RosterCheck::new(squad, lineup)
    }

    /// Validate and store a participant's roster for a round, recording the
    /// transfers it makes against the most recent roster saved before it.
    ///
    /// Skipped rounds carry the older roster forward, so the diff spans them.
    /// Only a participant with no earlier roster at all makes no transfers.
    /// Re-saving the same round diffs against that earlier roster again, not
    /// the earlier save.
    pub async fn save_roster(
        &self,
        participant: ParticipantId,
        round: RoundId,
        lineup: Lineup,
    ) -> Result<TransferRecord, SelectionError> {
        let catalogue = self.catalogue().await?;
        let check = self.check(&lineup, &catalogue);
        if !check.valid {
            return Err(SelectionError::InvalidRoster(check));
        }

        let previous = self.store.latest_roster_before(participant, round).await?;
        let chip = self.store.chip_selection(participant, round).await?;
        let free_transfers = self
            .store
            .free_transfer_balance(participant, round)
            .await?
            .unwrap_or(FREE_TRANSFER_MIN);

        let squad = lineup.squad();
        // Initial squad: diffing it against itself yields zero transfers.
        let previous_squad = previous.map(|r| r.lineup.squad()).unwrap_or_else(|| squad.clone());
        let outcome = compute_transfers(&previous_squad, &squad, free_transfers, chip);
        let record = outcome.into_record(participant, round, free_transfers);

        self.store
            .save_roster(&Roster::new(participant, round, lineup))
            .await?;
        self.store.save_transfer_record(&record).await?;

        info!(
            participant = %participant,
            round = %round,
            transfers = record.transfers_made,
            free_transfers = record.free_transfers,
            penalty = record.point_penalty,
            "Roster saved"
        );
        Ok(record)
    }

    /// Availability of every chip for the round.
    pub async fn chip_availability(
        &self,
        participant: ParticipantId,
        round: RoundId,
    ) -> Result<Vec<ChipAvailability>, SelectionError> {
        let usages = self.store.chip_usages(participant).await?;
        let selections = self.store.chip_selections(participant).await?;
        Ok(ChipKind::ALL
            .iter()
            .map(|chip| ChipAvailability::for_selection(*chip, round, &usages, &selections))
            .collect())
    }

    /// Select a chip for the round, or clear the selection with `None`.
    ///
    /// A chip consumed in another round, or still selected for another
    /// round, is rejected. Selecting a chip replaces any other chip chosen for
    /// the same round.
    pub async fn select_chip(
        &self,
        participant: ParticipantId,
        round: RoundId,
        chip: Option<ChipKind>,
    ) -> Result<Option<ChipKind>, SelectionError> {
        if let Some(chip) = chip {
            let usages = self.store.chip_usages(participant).await?;
            let selections = self.store.chip_selections(participant).await?;
            let availability = ChipAvailability::for_selection(chip, round, &usages, &selections);
            if !availability.available {
                return Err(SelectionError::ChipUnavailable(
                    availability
                        .reason
                        .unwrap_or_else(|| format!("{} unavailable", chip)),
                ));
            }
        }

        self.store
            .save_chip_selection(participant, round, chip)
            .await?;

        // Keep the saved penalty in step with the chip now in play.
        if let Some(mut record) = self.store.transfer_record(participant, round).await? {
            record.point_penalty = penalty_for(record.transfers_made, record.free_transfers, chip);
            self.store.save_transfer_record(&record).await?;
        }

        info!(
            participant = %participant,
            round = %round,
            chip = chip.map(|c| c.as_str()).unwrap_or("none"),
            "Chip selection updated"
        );
        Ok(chip)
    }
}
