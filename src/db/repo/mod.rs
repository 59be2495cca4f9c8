//! Repository layer for database operations.
//!
//! This module provides the `Repository` struct for all database operations.
//! Methods are organized across submodules by domain:
//! - `mod.rs` - Athlete catalogue, fixtures and stat lines
//! - `rosters.rs` - Rosters, resolved lineups, chips and transfer ledgers
//! - `rounds.rs` - Round point totals and settlement runs
//! - `store.rs` - `LeagueStore` implementation

mod rosters;
mod rounds;
mod store;

use crate::domain::{
    Athlete, AthleteId, Club, Decimal, FixtureId, MatchStatLine, Position, RoundId, Status,
};
use crate::store::StoreError;
use sqlx::sqlite::{SqlitePool, SqliteRow};
use sqlx::Row;
use std::str::FromStr;

/// Repository for database operations.
#[derive(Debug, Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Repository { pool }
    }

    // =========================================================================
    // Athlete catalogue
    // =========================================================================

    /// Insert or replace a catalogue entry.
    ///
    /// # Errors
    /// Returns an error if the upsert fails.
    pub async fn upsert_athlete(&self, athlete: &Athlete) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO athletes (id, name, position, price, club, status)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                position = excluded.position,
                price = excluded.price,
                club = excluded.club,
                status = excluded.status
            "#,
        )
        .bind(athlete.id.as_i64())
        .bind(&athlete.name)
        .bind(athlete.position.as_str())
        .bind(athlete.price.to_canonical_string())
        .bind(athlete.club.as_str())
        .bind(athlete.status.as_str())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Query the whole catalogue ordered by id.
    ///
    /// # Errors
    /// Returns an error if the query fails or a row cannot be decoded.
    pub async fn query_athletes(&self) -> Result<Vec<Athlete>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, name, position, price, club, status FROM athletes ORDER BY id ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(athlete_from_row).collect()
    }

    // =========================================================================
    // Fixtures and stat lines
    // =========================================================================

    /// Schedule a fixture in a round. Re-scheduling moves it.
    pub async fn upsert_fixture(&self, fixture: FixtureId, round: RoundId) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO fixtures (id, round) VALUES (?, ?)
            ON CONFLICT(id) DO UPDATE SET round = excluded.round
            "#,
        )
        .bind(fixture.as_i64())
        .bind(i64::from(round.as_u32()))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn query_round_fixtures(&self, round: RoundId) -> Result<Vec<FixtureId>, StoreError> {
        let rows = sqlx::query("SELECT id FROM fixtures WHERE round = ? ORDER BY id ASC")
            .bind(i64::from(round.as_u32()))
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|row| Ok(FixtureId::new(row.try_get("id")?)))
            .collect()
    }

    /// Enter a stat line for a round. Re-entry for the same fixture and athlete
    /// overwrites the previous line.
    ///
    /// # Errors
    /// Returns an error if the upsert fails.
    pub async fn upsert_stat_line(
        &self,
        round: RoundId,
        line: &MatchStatLine,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO match_stat_lines (
                round, fixture_id, athlete_id, minutes, goals, assists, clean_sheet,
                goals_conceded, penalty_saves, penalty_misses, yellow_cards, red_cards,
                own_goals, man_of_the_match, entered_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(fixture_id, athlete_id) DO UPDATE SET
                round = excluded.round,
                minutes = excluded.minutes,
                goals = excluded.goals,
                assists = excluded.assists,
                clean_sheet = excluded.clean_sheet,
                goals_conceded = excluded.goals_conceded,
                penalty_saves = excluded.penalty_saves,
                penalty_misses = excluded.penalty_misses,
                yellow_cards = excluded.yellow_cards,
                red_cards = excluded.red_cards,
                own_goals = excluded.own_goals,
                man_of_the_match = excluded.man_of_the_match,
                entered_at = excluded.entered_at
            "#,
        )
        .bind(i64::from(round.as_u32()))
        .bind(line.fixture.as_i64())
        .bind(line.athlete.as_i64())
        .bind(i64::from(line.minutes))
        .bind(i64::from(line.goals))
        .bind(i64::from(line.assists))
        .bind(line.clean_sheet)
        .bind(i64::from(line.goals_conceded))
        .bind(i64::from(line.penalty_saves))
        .bind(i64::from(line.penalty_misses))
        .bind(i64::from(line.yellow_cards))
        .bind(i64::from(line.red_cards))
        .bind(i64::from(line.own_goals))
        .bind(line.man_of_the_match)
        .bind(chrono::Utc::now().timestamp_millis())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Stat lines entered for the round, in a stable order.
    pub async fn query_stat_lines(&self, round: RoundId) -> Result<Vec<MatchStatLine>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT fixture_id, athlete_id, minutes, goals, assists, clean_sheet,
                   goals_conceded, penalty_saves, penalty_misses, yellow_cards,
                   red_cards, own_goals, man_of_the_match
            FROM match_stat_lines
            WHERE round = ?
            ORDER BY fixture_id ASC, athlete_id ASC
            "#,
        )
        .bind(i64::from(round.as_u32()))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(stat_line_from_row).collect()
    }
}

fn athlete_from_row(row: &SqliteRow) -> Result<Athlete, StoreError> {
    let position: String = row.try_get("position")?;
    let price: String = row.try_get("price")?;
    let status: String = row.try_get("status")?;

    Ok(Athlete {
        id: AthleteId::new(row.try_get("id")?),
        name: row.try_get("name")?,
        position: Position::from_str(&position).map_err(StoreError::Corrupt)?,
        price: Decimal::from_str(&price)
            .map_err(|e| StoreError::Corrupt(format!("price {}: {}", price, e)))?,
        club: Club::new(row.try_get::<String, _>("club")?),
        status: Status::from_str(&status).map_err(StoreError::Corrupt)?,
    })
}

fn stat_line_from_row(row: &SqliteRow) -> Result<MatchStatLine, StoreError> {
    Ok(MatchStatLine {
        athlete: AthleteId::new(row.try_get("athlete_id")?),
        fixture: FixtureId::new(row.try_get("fixture_id")?),
        minutes: counter(row, "minutes")?,
        goals: counter(row, "goals")?,
        assists: counter(row, "assists")?,
        clean_sheet: row.try_get("clean_sheet")?,
        goals_conceded: counter(row, "goals_conceded")?,
        penalty_saves: counter(row, "penalty_saves")?,
        penalty_misses: counter(row, "penalty_misses")?,
        yellow_cards: counter(row, "yellow_cards")?,
        red_cards: counter(row, "red_cards")?,
        own_goals: counter(row, "own_goals")?,
        man_of_the_match: row.try_get("man_of_the_match")?,
    })
}

/// Non-negative integer column.
fn counter(row: &SqliteRow, column: &str) -> Result<u32, StoreError> {
    let value: i64 = row.try_get(column)?;
    u32::try_from(value).map_err(|_| StoreError::Corrupt(format!("{} = {}", column, value)))
}

fn round_column(row: &SqliteRow) -> Result<RoundId, StoreError> {
    Ok(RoundId::new(counter(row, "round")?))
}

fn encode_ids(ids: &[AthleteId]) -> Result<String, StoreError> {
    Ok(serde_json::to_string(ids)?)
}

fn decode_ids(raw: &str) -> Result<Vec<AthleteId>, StoreError> {
    Ok(serde_json::from_str(raw)?)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::db::migrations::init_db;
    use tempfile::TempDir;

    pub(crate) async fn setup_test_db() -> (Repository, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir
            .path()
            .join("test.db")
            .to_string_lossy()
            .to_string();
        let pool = init_db(&db_path).await.expect("init_db failed");
        (Repository::new(pool), temp_dir)
    }

    #[tokio::test]
    async fn test_upsert_and_query_athletes() {
        let (repo, _temp) = setup_test_db().await;

        let athlete = Athlete::new(
            AthleteId::new(7),
            "Winger",
            Position::Midfielder,
            Decimal::from_str("8.5").unwrap(),
            Club::new("United"),
        );
        repo.upsert_athlete(&athlete).await.expect("upsert failed");

        let injured = athlete.clone().with_status(Status::Injured);
        repo.upsert_athlete(&injured).await.expect("re-upsert failed");

        let athletes = repo.query_athletes().await.expect("query failed");
        assert_eq!(athletes, vec![injured]);
    }

    #[tokio::test]
    async fn test_stat_line_reentry_overwrites() {
        let (repo, _temp) = setup_test_db().await;
        let round = RoundId::new(3);

        let mut line = MatchStatLine::empty(AthleteId::new(1), FixtureId::new(30));
        line.minutes = 45;
        repo.upsert_stat_line(round, &line).await.unwrap();

        line.minutes = 90;
        line.clean_sheet = true;
        repo.upsert_stat_line(round, &line).await.unwrap();

        let lines = repo.query_stat_lines(round).await.unwrap();
        assert_eq!(lines, vec![line]);
        assert!(repo.query_stat_lines(RoundId::new(4)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_round_fixtures() {
        let (repo, _temp) = setup_test_db().await;
        repo.upsert_fixture(FixtureId::new(2), RoundId::new(1)).await.unwrap();
        repo.upsert_fixture(FixtureId::new(1), RoundId::new(1)).await.unwrap();
        repo.upsert_fixture(FixtureId::new(3), RoundId::new(2)).await.unwrap();

        let fixtures = repo.query_round_fixtures(RoundId::new(1)).await.unwrap();
        assert_eq!(fixtures, vec![FixtureId::new(1), FixtureId::new(2)]);
    }
}
