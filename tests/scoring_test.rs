//! Scoring table scenarios and the additivity the round aggregation relies on.

use gameweek::domain::{AthleteId, FixtureId, MatchStatLine, Position};
use gameweek::engine::points;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn line(minutes: u32) -> MatchStatLine {
    let mut line = MatchStatLine::empty(AthleteId::new(7), FixtureId::new(1));
    line.minutes = minutes;
    line
}

#[test]
fn test_keeper_clean_sheet() {
    let mut stat = line(90);
    stat.clean_sheet = true;
    assert_eq!(points(&stat, Position::Keeper), 6);
}

#[test]
fn test_midfielder_goal_assist_booking() {
    let mut stat = line(75);
    stat.goals = 1;
    stat.assists = 1;
    stat.yellow_cards = 1;
    assert_eq!(points(&stat, Position::Midfielder), 9);
}

#[test]
fn test_defender_goals_conceded_floor() {
    let mut stat = line(90);
    stat.goals_conceded = 5;
    assert_eq!(points(&stat, Position::Defender), 0);
}

#[test]
fn test_forward_ignores_clean_sheet_and_conceded() {
    let mut stat = line(90);
    stat.clean_sheet = true;
    stat.goals_conceded = 4;
    stat.goals = 2;
    assert_eq!(points(&stat, Position::Forward), 2 + 8);
}

#[test]
fn test_no_appearance_scores_nothing() {
    assert_eq!(points(&line(0), Position::Keeper), 0);
    assert_eq!(points(&line(1), Position::Keeper), 1);
    assert_eq!(points(&line(59), Position::Keeper), 1);
    assert_eq!(points(&line(60), Position::Keeper), 2);
}

#[test]
fn test_man_of_the_match_and_discipline() {
    let mut stat = line(90);
    stat.man_of_the_match = true;
    stat.red_cards = 1;
    stat.own_goals = 1;
    stat.penalty_misses = 1;
    // 2 + 2 - 3 - 2 - 2
    assert_eq!(points(&stat, Position::Forward), -3);
}

#[test]
fn test_counter_fields_are_additive_under_merge() {
    let mut rng = StdRng::seed_from_u64(0x5eed);

    for _ in 0..500 {
        let position = Position::ALL[rng.gen_range(0..Position::ALL.len())];

        let mut first = line(rng.gen_range(0..=120));
        first.clean_sheet = rng.gen_bool(0.5);
        first.goals_conceded = rng.gen_range(0..6);
        first.goals = rng.gen_range(0..4);
        first.assists = rng.gen_range(0..4);

        // Minutes and conceded goals stay on the first line: their bands are not additive.
        let mut second = line(0);
        second.fixture = FixtureId::new(2);
        second.goals = rng.gen_range(0..4);
        second.assists = rng.gen_range(0..4);
        second.penalty_saves = rng.gen_range(0..2);
        second.penalty_misses = rng.gen_range(0..2);
        second.yellow_cards = rng.gen_range(0..2);
        second.red_cards = rng.gen_range(0..2);
        second.own_goals = rng.gen_range(0..2);

        assert_eq!(
            points(&first, position) + points(&second, position),
            points(&first.merge(&second), position),
            "first={:?} second={:?} position={}",
            first,
            second,
            position
        );
    }
}
