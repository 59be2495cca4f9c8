pub mod api;
pub mod config;
pub mod db;
pub mod domain;
pub mod engine;
pub mod error;
pub mod orchestration;
pub mod settlement;
pub mod store;

pub use config::Config;
pub use db::{init_db, Repository};
pub use domain::{
    Athlete, AthleteId, ChipKind, Decimal, Lineup, MatchStatLine, ParticipantId, Position, Roster,
    RoundId, RoundPointTotal,
};
pub use error::AppError;
pub use orchestration::{RoundSettler, SelectionService, SettlementReport};
pub use store::{InMemoryStore, LeagueStore, StoreError};
