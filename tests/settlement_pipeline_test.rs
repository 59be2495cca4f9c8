//! Round settlement end to end, against the in-memory store and SQLite.

use gameweek::domain::{
    Athlete, AthleteId, ChipKind, ChipUsageRecord, Club, Decimal, FixtureId, Lineup,
    MatchStatLine, ParticipantId, Position, Roster, RoundId, TransferRecord,
};
use gameweek::settlement::SettlementPhase;
use gameweek::{init_db, Config, InMemoryStore, LeagueStore, Repository, RoundSettler};
use std::sync::Arc;
use tempfile::TempDir;

const ROUND: RoundId = RoundId(4);
const FIXTURE: FixtureId = FixtureId(40);

fn id(n: i64) -> AthleteId {
    AthleteId::new(n)
}

fn pid(n: i64) -> ParticipantId {
    ParticipantId::new(n)
}

/// K1 D1 D2 D3 M1 M2 M3 F1 F2 D4 M4 | K2 D5 M5 F3, ids 1..=15 in that order.
fn athletes() -> Vec<Athlete> {
    use Position::*;
    let layout = [
        Keeper, Defender, Defender, Defender, Midfielder, Midfielder, Midfielder, Forward,
        Forward, Defender, Midfielder, Keeper, Defender, Midfielder, Forward,
    ];
    layout
        .iter()
        .enumerate()
        .map(|(i, position)| {
            let n = i as i64 + 1;
            Athlete::new(
                id(n),
                format!("Athlete {}", n),
                *position,
                Decimal::from_str_canonical("6.5").unwrap(),
                Club::new(format!("Club {}", n % 5)),
            )
        })
        .collect()
}

fn lineup() -> Lineup {
    Lineup::new(
        (1..=11).map(id).collect(),
        (12..=15).map(id).collect(),
        id(1),
        id(2),
    )
}

/// 90 minutes for everyone except `absent`, who have no stat line at all.
fn stat_lines(absent: &[i64]) -> Vec<MatchStatLine> {
    (1..=15)
        .filter(|n| !absent.contains(n))
        .map(|n| {
            let mut line = MatchStatLine::empty(id(n), FIXTURE);
            line.minutes = 90;
            line
        })
        .collect()
}

fn settler(store: Arc<dyn LeagueStore>) -> RoundSettler {
    RoundSettler::new(store, &Config::with_database_path(":memory:"))
}

fn base_store(absent: &[i64]) -> InMemoryStore {
    InMemoryStore::new()
        .with_athletes(athletes())
        .with_fixture(ROUND, FIXTURE)
        .with_stat_lines(ROUND, stat_lines(absent))
}

#[tokio::test]
async fn test_settling_twice_yields_identical_totals() {
    let store = Arc::new(
        base_store(&[11, 12, 14])
            .with_roster(Roster::new(pid(1), ROUND, lineup()))
            .with_roster(Roster::new(pid(3), ROUND, lineup()))
            .with_chip_selection(pid(3), ROUND, ChipKind::BenchCountsToo),
    );
    let settler = settler(store.clone());

    let first = settler.settle_round(ROUND).await.unwrap();
    let second = settler.settle_round(ROUND).await.unwrap();

    assert_eq!(first.phase, SettlementPhase::Finalized);
    assert_eq!(first.settled.len(), 2);
    assert!(first.failures.is_empty());
    for participant in [pid(1), pid(3)] {
        assert_eq!(first.total_for(participant), second.total_for(participant));
    }
    assert_eq!(first.total_for(pid(1)).map(|t| t.points), Some(24));
    assert_eq!(first.total_for(pid(3)).map(|t| t.points), Some(26));

    let totals = store.round_totals(ROUND).await.unwrap();
    assert_eq!(totals.len(), 2);
    assert_eq!(totals[0].participant, pid(1));
    assert_eq!(totals[1].participant, pid(3));

    // The chip ledger holds a single row no matter how often the round is settled.
    let usages = store.chip_usages(pid(3)).await.unwrap();
    assert_eq!(
        usages,
        vec![ChipUsageRecord {
            participant: pid(3),
            chip: ChipKind::BenchCountsToo,
            round: ROUND,
        }]
    );
    assert_eq!(store.settlement_runs().len(), 2);
}

#[tokio::test]
async fn test_resolved_lineup_stored_apart_from_roster() {
    let store = Arc::new(base_store(&[11, 12, 14]).with_roster(Roster::new(pid(1), ROUND, lineup())));
    let settler = settler(store.clone());

    let report = settler.settle_round(ROUND).await.unwrap();
    assert_eq!(report.settled[0].substitutions.len(), 1);

    let authored = store.roster(pid(1), ROUND).await.unwrap().unwrap();
    assert_eq!(authored.lineup, lineup());

    let resolved = store.resolved_lineup(pid(1), ROUND).await.unwrap().unwrap();
    assert_eq!(resolved.starters[10], id(13));
    assert_eq!(resolved.bench, vec![id(12), id(11), id(14), id(15)]);

    // Re-running starts again from the authored roster.
    let again = settler.settle_round(ROUND).await.unwrap();
    assert_eq!(again.settled[0].substitutions, report.settled[0].substitutions);
    assert_eq!(
        store.resolved_lineup(pid(1), ROUND).await.unwrap().unwrap(),
        resolved
    );
}

#[tokio::test]
async fn test_failing_participant_does_not_abort_round() {
    let mut broken = lineup();
    broken.bench[3] = id(99);
    let store = Arc::new(
        base_store(&[])
            .with_roster(Roster::new(pid(1), ROUND, lineup()))
            .with_roster(Roster::new(pid(2), ROUND, broken))
            .with_roster(Roster::new(pid(3), ROUND, lineup())),
    );

    let report = settler(store.clone()).settle_round(ROUND).await.unwrap();

    assert_eq!(report.settled.len(), 2);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].participant, pid(2));
    assert_eq!(report.failures[0].kind, "data_integrity");
    assert!(report.failures[0].reason.contains("99"));

    let totals = store.round_totals(ROUND).await.unwrap();
    let settled: Vec<ParticipantId> = totals.iter().map(|t| t.participant).collect();
    assert_eq!(settled, vec![pid(1), pid(3)]);

    let runs = store.settlement_runs();
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].settled, 2);
    assert_eq!(runs[0].failed, 1);
}

#[tokio::test]
async fn test_orphan_stat_line_fails_only_squads_fielding_it() {
    let mut stray = MatchStatLine::empty(id(7), FixtureId::new(777));
    stray.goals = 2;
    let store = Arc::new(
        base_store(&[])
            .with_stat_line(ROUND, stray)
            .with_roster(Roster::new(pid(1), ROUND, lineup())),
    );

    let report = settler(store.clone()).settle_round(ROUND).await.unwrap();
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].kind, "data_integrity");
    assert!(report.failures[0].reason.contains("777"));
    assert!(store.round_totals(ROUND).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_orphan_stat_line_ignored_for_unrelated_squads() {
    let stray_athlete = Athlete::new(
        id(50),
        "Unpicked",
        Position::Forward,
        Decimal::from_str_canonical("4.5").unwrap(),
        Club::new("Club 9"),
    );
    let mut stray = MatchStatLine::empty(id(50), FixtureId::new(777));
    stray.minutes = 90;

    let store = Arc::new(
        base_store(&[])
            .with_athlete(stray_athlete)
            .with_stat_line(ROUND, stray)
            .with_roster(Roster::new(pid(1), ROUND, lineup())),
    );

    let report = settler(store).settle_round(ROUND).await.unwrap();
    assert!(report.failures.is_empty());
    assert_eq!(report.total_for(pid(1)).map(|t| t.points), Some(24));
}

#[tokio::test]
async fn test_transfer_penalty_and_next_balance() {
    let store = Arc::new(
        base_store(&[])
            .with_roster(Roster::new(pid(1), ROUND, lineup()))
            .with_transfer_record(TransferRecord {
                participant: pid(1),
                round: ROUND,
                transfers_made: 3,
                free_transfers: 1,
                next_free_transfers: 1,
                point_penalty: 8,
            })
            .with_roster(Roster::new(pid(2), ROUND, lineup()))
            .with_free_transfer_balance(pid(2), ROUND, 2),
    );

    let report = settler(store.clone()).settle_round(ROUND).await.unwrap();

    let first = report.total_for(pid(1)).unwrap();
    assert_eq!(first.breakdown.transfer_penalty, 8);
    assert_eq!(first.points, 16);
    assert_eq!(
        store.free_transfer_balance(pid(1), ROUND.next()).await.unwrap(),
        Some(1)
    );

    let second = report.total_for(pid(2)).unwrap();
    assert_eq!(second.breakdown.transfer_penalty, 0);
    assert_eq!(
        store.free_transfer_balance(pid(2), ROUND.next()).await.unwrap(),
        Some(3)
    );
}

#[tokio::test]
async fn test_roster_from_earlier_round_carries_forward() {
    let store = Arc::new(
        base_store(&[])
            .with_roster(Roster::new(pid(1), ROUND, lineup()))
            .with_roster(Roster::new(pid(2), RoundId::new(2), lineup()))
            .with_roster(Roster::new(pid(3), ROUND.next(), lineup())),
    );

    let report = settler(store.clone()).settle_round(ROUND).await.unwrap();

    assert!(report.failures.is_empty());
    let settled: Vec<ParticipantId> = report.settled.iter().map(|s| s.total.participant).collect();
    assert_eq!(settled, vec![pid(1), pid(2)]);
    assert_eq!(report.total_for(pid(2)).map(|t| t.points), Some(24));

    // No transfers while idle: the free transfer is banked.
    assert_eq!(
        store.free_transfer_balance(pid(2), ROUND.next()).await.unwrap(),
        Some(2)
    );
    assert!(store.resolved_lineup(pid(2), ROUND).await.unwrap().is_some());
    assert!(store.roster(pid(2), ROUND).await.unwrap().is_none());
    assert!(store.free_transfer_balance(pid(3), ROUND.next()).await.unwrap().is_none());
}

#[tokio::test]
async fn test_chip_consumed_elsewhere_is_ignored_with_warning() {
    let store = Arc::new(
        base_store(&[])
            .with_roster(Roster::new(pid(1), ROUND, lineup()))
            .with_chip_selection(pid(1), ROUND, ChipKind::TripleCaptain)
            .with_chip_usage(ChipUsageRecord {
                participant: pid(1),
                chip: ChipKind::TripleCaptain,
                round: RoundId::new(2),
            }),
    );

    let report = settler(store.clone()).settle_round(ROUND).await.unwrap();

    let settled = &report.settled[0];
    assert_eq!(settled.chip, None);
    assert_eq!(settled.warnings.len(), 1);
    assert_eq!(settled.total.points, 24);
    assert_eq!(store.chip_usages(pid(1)).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_empty_round_finalizes() {
    let store = Arc::new(InMemoryStore::new());
    let report = settler(store.clone()).settle_round(ROUND).await.unwrap();

    assert_eq!(report.phase, SettlementPhase::Finalized);
    assert!(report.settled.is_empty());
    assert!(report.failures.is_empty());
    assert_eq!(store.settlement_runs().len(), 1);
}

async fn sqlite_store() -> (Repository, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("test.db");
    let pool = init_db(db_path.to_str().unwrap()).await.unwrap();
    let repo = Repository::new(pool);

    for athlete in athletes() {
        repo.upsert_athlete(&athlete).await.unwrap();
    }
    repo.upsert_fixture(FIXTURE, ROUND).await.unwrap();
    for line in stat_lines(&[11, 12, 14]) {
        repo.upsert_stat_line(ROUND, &line).await.unwrap();
    }
    (repo, temp_dir)
}

#[tokio::test]
async fn test_sqlite_settlement_is_idempotent() {
    let (repo, _temp_dir) = sqlite_store().await;
    repo.save_roster(&Roster::new(pid(1), ROUND, lineup())).await.unwrap();
    repo.save_roster(&Roster::new(pid(2), ROUND, lineup())).await.unwrap();
    repo.save_chip_selection(pid(2), ROUND, Some(ChipKind::DualCaptain))
        .await
        .unwrap();

    let store: Arc<dyn LeagueStore> = Arc::new(repo.clone());
    let settler = settler(store);

    let first = settler.settle_round(ROUND).await.unwrap();
    let second = settler.settle_round(ROUND).await.unwrap();
    assert!(first.failures.is_empty());

    let totals = repo.round_totals(ROUND).await.unwrap();
    assert_eq!(totals.len(), 2);
    for total in &totals {
        assert_eq!(first.total_for(total.participant), Some(total));
        assert_eq!(second.total_for(total.participant), Some(total));
    }
    // Captain and vice both played: dual captain doubles both.
    assert_eq!(totals[0].points, 24);
    assert_eq!(totals[1].points, 26);

    assert_eq!(repo.chip_usages(pid(2)).await.unwrap().len(), 1);
    assert_eq!(repo.count_settlement_runs(ROUND).await.unwrap(), 2);

    let resolved = repo.resolved_lineup(pid(1), ROUND).await.unwrap().unwrap();
    assert_ne!(resolved, lineup());
    let authored = repo.roster(pid(1), ROUND).await.unwrap().unwrap();
    assert_eq!(authored.lineup, lineup());
}
