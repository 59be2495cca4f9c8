use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;

use super::{parse_round, AppState};
use crate::domain::{RoundId, RoundPointTotal};
use crate::error::AppError;
use crate::orchestration::SettlementReport;

/// Operator trigger: settle every participant of the round.
pub async fn settle_round(
    Path(round): Path<u32>,
    State(state): State<AppState>,
) -> Result<Json<SettlementReport>, AppError> {
    let round = parse_round(round)?;
    let report = state.settler.settle_round(round).await?;
    Ok(Json(report))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TotalsResponse {
    pub round: RoundId,
    pub totals: Vec<RoundPointTotal>,
}

/// Persisted totals of a round. 404 until at least one participant is settled.
pub async fn get_round_totals(
    Path(round): Path<u32>,
    State(state): State<AppState>,
) -> Result<Json<TotalsResponse>, AppError> {
    let round = parse_round(round)?;
    let totals = state.store.round_totals(round).await?;
    if totals.is_empty() {
        return Err(AppError::NotFound(format!("no totals for round {}", round)));
    }
    Ok(Json(TotalsResponse { round, totals }))
}
