//! Per-fixture match statistics for one athlete.

use crate::domain::{AthleteId, FixtureId};
use serde::{Deserialize, Serialize};

/// Raw statistics for one athlete in one real-world fixture.
///
/// Every counter defaults to zero and every flag to false when absent, so a
/// sparse data-entry row is still a complete stat line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchStatLine {
    pub athlete: AthleteId,
    pub fixture: FixtureId,
    #[serde(default)]
    pub minutes: u32,
    #[serde(default)]
    pub goals: u32,
    #[serde(default)]
    pub assists: u32,
    #[serde(default)]
    pub clean_sheet: bool,
    #[serde(default)]
    pub goals_conceded: u32,
    #[serde(default)]
    pub penalty_saves: u32,
    #[serde(default)]
    pub penalty_misses: u32,
    #[serde(default)]
    pub yellow_cards: u32,
    #[serde(default)]
    pub red_cards: u32,
    #[serde(default)]
    pub own_goals: u32,
    #[serde(default)]
    pub man_of_the_match: bool,
}

impl MatchStatLine {
    /// An all-zero line for the athlete in the fixture.
    pub fn empty(athlete: AthleteId, fixture: FixtureId) -> Self {
        MatchStatLine {
            athlete,
            fixture,
            minutes: 0,
            goals: 0,
            assists: 0,
            clean_sheet: false,
            goals_conceded: 0,
            penalty_saves: 0,
            penalty_misses: 0,
            yellow_cards: 0,
            red_cards: 0,
            own_goals: 0,
            man_of_the_match: false,
        }
    }

    /// Combine two lines of the same athlete: counters are summed, flags OR-ed.
    ///
    /// The fixture of `self` is kept; the merged line represents the round.
    pub fn merge(&self, other: &MatchStatLine) -> MatchStatLine {
        MatchStatLine {
            athlete: self.athlete,
            fixture: self.fixture,
            minutes: self.minutes.saturating_add(other.minutes),
            goals: self.goals.saturating_add(other.goals),
            assists: self.assists.saturating_add(other.assists),
            clean_sheet: self.clean_sheet || other.clean_sheet,
            goals_conceded: self.goals_conceded.saturating_add(other.goals_conceded),
            penalty_saves: self.penalty_saves.saturating_add(other.penalty_saves),
            penalty_misses: self.penalty_misses.saturating_add(other.penalty_misses),
            yellow_cards: self.yellow_cards.saturating_add(other.yellow_cards),
            red_cards: self.red_cards.saturating_add(other.red_cards),
            own_goals: self.own_goals.saturating_add(other.own_goals),
            man_of_the_match: self.man_of_the_match || other.man_of_the_match,
        }
    }

    pub fn played(&self) -> bool {
        self.minutes > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sparse_line_defaults_to_zero() {
        let line: MatchStatLine =
            serde_json::from_str(r#"{"athlete":3,"fixture":9,"minutes":12}"#).unwrap();
        assert_eq!(line.minutes, 12);
        assert_eq!(line.goals, 0);
        assert!(!line.clean_sheet);
        assert!(!line.man_of_the_match);
    }

    #[test]
    fn test_merge_sums_counters_and_ors_flags() {
        let mut a = MatchStatLine::empty(AthleteId::new(1), FixtureId::new(10));
        a.minutes = 90;
        a.goals = 1;
        a.clean_sheet = true;
        let mut b = MatchStatLine::empty(AthleteId::new(1), FixtureId::new(11));
        b.minutes = 30;
        b.goals = 2;
        b.yellow_cards = 1;
        b.man_of_the_match = true;

        let merged = a.merge(&b);
        assert_eq!(merged.minutes, 120);
        assert_eq!(merged.goals, 3);
        assert_eq!(merged.yellow_cards, 1);
        assert!(merged.clean_sheet);
        assert!(merged.man_of_the_match);
        assert_eq!(merged.fixture, FixtureId::new(10));
    }
}
