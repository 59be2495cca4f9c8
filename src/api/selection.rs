use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use super::{parse_participant, parse_round, AppState};
use crate::domain::{
    AthleteId, ChipAvailability, ChipKind, Lineup, ParticipantId, RoundId, TransferRecord,
};
use crate::error::AppError;
use crate::orchestration::RosterCheck;

/// Either a bare squad or a full lineup. A lineup is checked against both the
/// squad and the lineup rules.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateRequest {
    pub athletes: Option<Vec<AthleteId>>,
    pub lineup: Option<Lineup>,
}

pub async fn validate_roster(
    State(state): State<AppState>,
    Json(request): Json<ValidateRequest>,
) -> Result<Json<RosterCheck>, AppError> {
    let check = match (request.lineup, request.athletes) {
        (Some(lineup), _) => state.selection.validate_lineup(&lineup).await?,
        (None, Some(athletes)) => state.selection.validate_squad(&athletes).await?,
        (None, None) => {
            return Err(AppError::BadRequest(
                "expected either `athletes` or `lineup`".into(),
            ))
        }
    };
    Ok(Json(check))
}

pub async fn put_roster(
    Path((participant, round)): Path<(i64, u32)>,
    State(state): State<AppState>,
    Json(lineup): Json<Lineup>,
) -> Result<Json<TransferRecord>, AppError> {
    let participant = parse_participant(participant)?;
    let round = parse_round(round)?;

    let record = state
        .selection
        .save_roster(participant, round, lineup)
        .await?;
    Ok(Json(record))
}

#[derive(Debug, Deserialize)]
pub struct ChipsQuery {
    pub round: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChipsResponse {
    pub participant: ParticipantId,
    pub round: RoundId,
    pub chips: Vec<ChipAvailability>,
}

pub async fn get_chip_availability(
    Path(participant): Path<i64>,
    Query(params): Query<ChipsQuery>,
    State(state): State<AppState>,
) -> Result<Json<ChipsResponse>, AppError> {
    let participant = parse_participant(participant)?;
    let round = parse_round(params.round)?;

    let chips = state.selection.chip_availability(participant, round).await?;
    Ok(Json(ChipsResponse {
        participant,
        round,
        chips,
    }))
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChipSelection {
    /// `null` clears the round's chip.
    pub chip: Option<ChipKind>,
}

pub async fn put_chip(
    Path((participant, round)): Path<(i64, u32)>,
    State(state): State<AppState>,
    Json(selection): Json<ChipSelection>,
) -> Result<Json<ChipSelection>, AppError> {
    let participant = parse_participant(participant)?;
    let round = parse_round(round)?;

    let chip = state
        .selection
        .select_chip(participant, round, selection.chip)
        .await?;
    Ok(Json(ChipSelection { chip }))
}
