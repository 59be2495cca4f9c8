//! Athlete catalogue entries.

use crate::domain::{AthleteId, Club, Decimal};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Playing position. Fixed for an athlete for the whole season.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Position {
    Keeper,
    Defender,
    Midfielder,
    Forward,
}

impl Position {
    pub const ALL: [Position; 4] = [
        Position::Keeper,
        Position::Defender,
        Position::Midfielder,
        Position::Forward,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Position::Keeper => "keeper",
            Position::Defender => "defender",
            Position::Midfielder => "midfielder",
            Position::Forward => "forward",
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Position {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "keeper" | "gk" => Ok(Position::Keeper),
            "defender" | "def" => Ok(Position::Defender),
            "midfielder" | "mid" => Ok(Position::Midfielder),
            "forward" | "fwd" => Ok(Position::Forward),
            other => Err(format!("unknown position: {}", other)),
        }
    }
}

/// Fitness status as maintained by the roster-admin layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    #[default]
    Available,
    Doubtful,
    Injured,
    Suspended,
    Unavailable,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Available => "available",
            Status::Doubtful => "doubtful",
            Status::Injured => "injured",
            Status::Suspended => "suspended",
            Status::Unavailable => "unavailable",
        }
    }
}

impl FromStr for Status {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "available" => Ok(Status::Available),
            "doubtful" => Ok(Status::Doubtful),
            "injured" => Ok(Status::Injured),
            "suspended" => Ok(Status::Suspended),
            "unavailable" => Ok(Status::Unavailable),
            other => Err(format!("unknown status: {}", other)),
        }
    }
}

/// A real-world athlete. Immutable within a round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Athlete {
    pub id: AthleteId,
    pub name: String,
    pub position: Position,
    pub price: Decimal,
    pub club: Club,
    #[serde(default)]
    pub status: Status,
}

impl Athlete {
    pub fn new(
        id: AthleteId,
        name: impl Into<String>,
        position: Position,
        price: Decimal,
        club: Club,
    ) -> Self {
        Athlete {
            id,
            name: name.into(),
            position,
            price,
            club,
            status: Status::Available,
        }
    }

    pub fn with_status(mut self, status: Status) -> Self {
        self.status = status;
        self
    }
}

/// Id-indexed view over the athlete catalogue.
#[derive(Debug, Clone, Default)]
pub struct Catalogue {
    athletes: HashMap<AthleteId, Athlete>,
}

impl Catalogue {
    pub fn new(athletes: impl IntoIterator<Item = Athlete>) -> Self {
        Catalogue {
            athletes: athletes.into_iter().map(|a| (a.id, a)).collect(),
        }
    }

    pub fn get(&self, id: AthleteId) -> Option<&Athlete> {
        self.athletes.get(&id)
    }

    pub fn position_of(&self, id: AthleteId) -> Option<Position> {
        self.athletes.get(&id).map(|a| a.position)
    }

    /// Position map restricted to the given ids; unknown ids are skipped.
    pub fn positions_for<'a>(
        &self,
        ids: impl IntoIterator<Item = &'a AthleteId>,
    ) -> HashMap<AthleteId, Position> {
        ids.into_iter()
            .filter_map(|id| self.position_of(*id).map(|p| (*id, p)))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.athletes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.athletes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_serialization() {
        let json = serde_json::to_string(&Position::Midfielder).unwrap();
        assert_eq!(json, "\"midfielder\"");
        assert_eq!("GK".parse::<Position>().unwrap(), Position::Keeper);
        assert!("winger".parse::<Position>().is_err());
    }

    #[test]
    fn test_catalogue_positions_for_skips_unknown() {
        let catalogue = Catalogue::new(vec![Athlete::new(
            AthleteId::new(1),
            "Keeper One",
            Position::Keeper,
            Decimal::from_str_canonical("4.5").unwrap(),
            Club::new("Rovers"),
        )]);

        let ids = [AthleteId::new(1), AthleteId::new(2)];
        let positions = catalogue.positions_for(ids.iter());
        assert_eq!(positions.len(), 1);
        assert_eq!(positions[&AthleteId::new(1)], Position::Keeper);
    }

    #[test]
    fn test_athlete_status_defaults_to_available() {
        let json = r#"{"id":7,"name":"A","position":"forward","price":7.5,"club":"City"}"#;
        let athlete: Athlete = serde_json::from_str(json).unwrap();
        assert_eq!(athlete.status, Status::Available);
        assert_eq!(athlete.position, Position::Forward);
    }
}
