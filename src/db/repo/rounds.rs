//! Round point totals, participants and settlement runs.

use super::{round_column, Repository};
use crate::domain::{ParticipantId, PointsBreakdown, RoundId, RoundPointTotal, SettlementRun};
use crate::store::StoreError;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

impl Repository {
    /// Participants with a roster saved for the round or any earlier one,
    /// ascending by id.
    pub async fn query_participants(
        &self,
        round: RoundId,
    ) -> Result<Vec<ParticipantId>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT DISTINCT participant_id FROM rosters
            WHERE round <= ?
            ORDER BY participant_id ASC
            "#,
        )
        .bind(i64::from(round.as_u32()))
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| Ok(ParticipantId::new(row.try_get("participant_id")?)))
            .collect()
    }

    /// Upsert by (participant, round). Re-settlement overwrites.
    pub async fn upsert_round_point_total(&self, total: &RoundPointTotal) -> Result<(), StoreError> {
        let b = &total.breakdown;
        sqlx::query(
            r#"
            INSERT INTO round_point_totals (
                participant_id, round, points, starting_points, bench_points,
                armband_bonus, transfer_penalty, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(participant_id, round) DO UPDATE SET
                points = excluded.points,
                starting_points = excluded.starting_points,
                bench_points = excluded.bench_points,
                armband_bonus = excluded.armband_bonus,
                transfer_penalty = excluded.transfer_penalty,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(total.participant.as_i64())
        .bind(i64::from(total.round.as_u32()))
        .bind(i64::from(total.points))
        .bind(i64::from(b.starting_points))
        .bind(i64::from(b.bench_points))
        .bind(i64::from(b.armband_bonus))
        .bind(i64::from(b.transfer_penalty))
        .bind(chrono::Utc::now().timestamp_millis())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn query_round_totals(
        &self,
        round: RoundId,
    ) -> Result<Vec<RoundPointTotal>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT participant_id, round, points, starting_points, bench_points,
                   armband_bonus, transfer_penalty
            FROM round_point_totals
            WHERE round = ?
            ORDER BY participant_id ASC
            "#,
        )
        .bind(i64::from(round.as_u32()))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(total_from_row).collect()
    }

    pub async fn insert_settlement_run(&self, run: &SettlementRun) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO settlement_runs (run_id, round, settled, failed, finished_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(run.run_id.to_string())
        .bind(i64::from(run.round.as_u32()))
        .bind(i64::from(run.settled))
        .bind(i64::from(run.failed))
        .bind(run.finished_at.timestamp_millis())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Number of recorded runs for a round.
    pub async fn count_settlement_runs(&self, round: RoundId) -> Result<i64, StoreError> {
        let row = sqlx::query("SELECT COUNT(*) AS runs FROM settlement_runs WHERE round = ?")
            .bind(i64::from(round.as_u32()))
            .fetch_one(&self.pool)
            .await?;
        Ok(row.try_get("runs")?)
    }
}

fn total_from_row(row: &SqliteRow) -> Result<RoundPointTotal, StoreError> {
    let int = |column: &str| -> Result<i32, StoreError> {
        let value: i64 = row.try_get(column)?;
        i32::try_from(value).map_err(|_| StoreError::Corrupt(format!("{} = {}", column, value)))
    };

    let breakdown = PointsBreakdown {
        starting_points: int("starting_points")?,
        bench_points: int("bench_points")?,
        armband_bonus: int("armband_bonus")?,
        transfer_penalty: int("transfer_penalty")?,
    };

    Ok(RoundPointTotal {
        participant: ParticipantId::new(row.try_get("participant_id")?),
        round: round_column(row)?,
        points: int("points")?,
        breakdown,
    })
}
