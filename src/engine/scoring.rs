//! Scoring table: raw match statistics to fantasy points.
//!
//! Every rule is additive. The function is total: any well-typed stat line
//! produces a number, there is no failure path.

use crate::domain::{MatchStatLine, Position};

const MINUTES_FULL_THRESHOLD: u32 = 60;
const ASSIST_POINTS: i32 = 3;
const PENALTY_SAVE_POINTS: i32 = 5;
const PENALTY_MISS_POINTS: i32 = -2;
const YELLOW_CARD_POINTS: i32 = -1;
const RED_CARD_POINTS: i32 = -3;
const OWN_GOAL_POINTS: i32 = -2;
const MAN_OF_THE_MATCH_POINTS: i32 = 2;

/// Fantasy points for one stat line scored at `position`.
///
/// Accumulates in `i64`; a line with absurd counters clamps to the `i32` range.
pub fn points(stat: &MatchStatLine, position: Position) -> i32 {
    let total = i64::from(minutes_points(stat.minutes))
        + weighted(stat.goals, goal_value(position))
        + weighted(stat.assists, ASSIST_POINTS)
        + i64::from(clean_sheet_points(stat.clean_sheet, position))
        + i64::from(goals_conceded_points(stat.goals_conceded, position))
        + weighted(stat.penalty_saves, PENALTY_SAVE_POINTS)
        + weighted(stat.penalty_misses, PENALTY_MISS_POINTS)
        + weighted(stat.yellow_cards, YELLOW_CARD_POINTS)
        + weighted(stat.red_cards, RED_CARD_POINTS)
        + weighted(stat.own_goals, OWN_GOAL_POINTS)
        + if stat.man_of_the_match {
            i64::from(MAN_OF_THE_MATCH_POINTS)
        } else {
            0
        };
    clamp(total)
}

/// 0 for no appearance, 1 for a cameo, 2 for 60 minutes or more.
pub fn minutes_points(minutes: u32) -> i32 {
    match minutes {
        0 => 0,
        m if m < MINUTES_FULL_THRESHOLD => 1,
        _ => 2,
    }
}

pub fn goal_value(position: Position) -> i32 {
    match position {
        Position::Keeper | Position::Defender => 6,
        Position::Midfielder => 5,
        Position::Forward => 4,
    }
}

pub fn clean_sheet_points(clean_sheet: bool, position: Position) -> i32 {
    if !clean_sheet {
        return 0;
    }
    match position {
        Position::Keeper | Position::Defender => 4,
        Position::Midfielder => 1,
        Position::Forward => 0,
    }
}

/// -1 per full two goals conceded, keepers and defenders only.
pub fn goals_conceded_points(goals_conceded: u32, position: Position) -> i32 {
    match position {
        Position::Keeper | Position::Defender => clamp(-i64::from(goals_conceded / 2)),
        Position::Midfielder | Position::Forward => 0,
    }
}

fn weighted(n: u32, value: i32) -> i64 {
    i64::from(n) * i64::from(value)
}

fn clamp(total: i64) -> i32 {
    i32::try_from(total).unwrap_or(if total < 0 { i32::MIN } else { i32::MAX })
}
