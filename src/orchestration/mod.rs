//! Services that drive the rules engine against a `LeagueStore`.
//!
//! - `selection`: roster and chip selection, rejected before settlement
//! - `settler`: operator-triggered round settlement

pub mod selection;
pub mod settler;

pub use selection::{RosterCheck, SelectionError, SelectionService};
pub use settler::{
    RoundSettler, SettledParticipant, SettlementError, SettlementFailure, SettlementReport,
};
