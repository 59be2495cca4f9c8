pub mod health;
pub mod rounds;
pub mod selection;

use crate::config::Config;
use crate::domain::{ParticipantId, RoundId};
use crate::error::AppError;
use crate::orchestration::{RoundSettler, SelectionService};
use crate::store::LeagueStore;
use axum::{
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn LeagueStore>,
    pub config: Config,
    pub settler: Arc<RoundSettler>,
    pub selection: Arc<SelectionService>,
}

impl AppState {
    pub fn new(store: Arc<dyn LeagueStore>, config: Config) -> Self {
        let settler = Arc::new(RoundSettler::new(store.clone(), &config));
        let selection = Arc::new(SelectionService::new(store.clone(), &config));
        Self {
            store,
            config,
            settler,
            selection,
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health::health))
        .route("/ready", get(health::ready))
        .route("/v1/rosters/validate", post(selection::validate_roster))
        .route(
            "/v1/participants/:participant/rounds/:round/roster",
            put(selection::put_roster),
        )
        .route(
            "/v1/participants/:participant/rounds/:round/chip",
            put(selection::put_chip),
        )
        .route(
            "/v1/participants/:participant/chips",
            get(selection::get_chip_availability),
        )
        .route("/v1/rounds/:round/settle", post(rounds::settle_round))
        .route("/v1/rounds/:round/totals", get(rounds::get_round_totals))
        .layer(cors)
        .with_state(state)
}

/// Rounds are numbered from 1.
fn parse_round(round: u32) -> Result<RoundId, AppError> {
    if round == 0 {
        return Err(AppError::BadRequest("round must be at least 1".into()));
    }
    Ok(RoundId::new(round))
}

fn parse_participant(participant: i64) -> Result<ParticipantId, AppError> {
    if participant <= 0 {
        return Err(AppError::BadRequest("invalid participant id".into()));
    }
    Ok(ParticipantId::new(participant))
}
