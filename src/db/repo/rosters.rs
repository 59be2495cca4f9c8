//! Rosters, resolved lineups, chips and the free-transfer ledger.

use super::{counter, decode_ids, encode_ids, round_column, Repository};
use crate::domain::{
    AthleteId, ChipKind, ChipSelectionRecord, ChipUsageRecord, Lineup, ParticipantId, Roster,
    RoundId, TransferRecord,
};
use crate::store::StoreError;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use std::str::FromStr;

/// Which lineup table a query targets.
#[derive(Debug, Clone, Copy)]
enum LineupTable {
    Authored,
    Resolved,
}

impl LineupTable {
    fn name(self) -> &'static str {
        match self {
            LineupTable::Authored => "rosters",
            LineupTable::Resolved => "resolved_lineups",
        }
    }
}

impl Repository {
    // =========================================================================
    // Rosters
    // =========================================================================

    pub async fn get_roster(
        &self,
        participant: ParticipantId,
        round: RoundId,
    ) -> Result<Option<Roster>, StoreError> {
        let lineup = self
            .get_lineup(LineupTable::Authored, participant, round)
            .await?;
        Ok(lineup.map(|lineup| Roster::new(participant, round, lineup)))
    }

    /// Most recent authored roster for a round strictly before `round`.
    pub async fn get_latest_roster_before(
        &self,
        participant: ParticipantId,
        round: RoundId,
    ) -> Result<Option<Roster>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT round, starters, bench, captain_id, vice_captain_id
            FROM rosters
            WHERE participant_id = ? AND round < ?
            ORDER BY round DESC
            LIMIT 1
            "#,
        )
        .bind(participant.as_i64())
        .bind(i64::from(round.as_u32()))
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        Ok(Some(Roster::new(
            participant,
            round_column(&row)?,
            lineup_from_row(&row)?,
        )))
    }

    /// Insert or replace the authored roster for its round.
    pub async fn upsert_roster(&self, roster: &Roster) -> Result<(), StoreError> {
        self.upsert_lineup(
            LineupTable::Authored,
            roster.participant,
            roster.round,
            &roster.lineup,
        )
        .await
    }

    pub async fn get_resolved_lineup(
        &self,
        participant: ParticipantId,
        round: RoundId,
    ) -> Result<Option<Lineup>, StoreError> {
        self.get_lineup(LineupTable::Resolved, participant, round)
            .await
    }

    pub async fn upsert_resolved_lineup(
        &self,
        participant: ParticipantId,
        round: RoundId,
        lineup: &Lineup,
    ) -> Result<(), StoreError> {
        self.upsert_lineup(LineupTable::Resolved, participant, round, lineup)
            .await
    }

    async fn get_lineup(
        &self,
        table: LineupTable,
        participant: ParticipantId,
        round: RoundId,
    ) -> Result<Option<Lineup>, StoreError> {
        let sql = format!(
            "SELECT starters, bench, captain_id, vice_captain_id FROM {} \
             WHERE participant_id = ? AND round = ?",
            table.name()
        );
        let row = sqlx::query(&sql)
            .bind(participant.as_i64())
            .bind(i64::from(round.as_u32()))
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(lineup_from_row).transpose()
    }

    async fn upsert_lineup(
        &self,
        table: LineupTable,
        participant: ParticipantId,
        round: RoundId,
        lineup: &Lineup,
    ) -> Result<(), StoreError> {
        let sql = format!(
            r#"
            INSERT INTO {} (
                participant_id, round, starters, bench, captain_id, vice_captain_id, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(participant_id, round) DO UPDATE SET
                starters = excluded.starters,
                bench = excluded.bench,
                captain_id = excluded.captain_id,
                vice_captain_id = excluded.vice_captain_id,
                updated_at = excluded.updated_at
            "#,
            table.name()
        );
        sqlx::query(&sql)
            .bind(participant.as_i64())
            .bind(i64::from(round.as_u32()))
            .bind(encode_ids(&lineup.starters)?)
            .bind(encode_ids(&lineup.bench)?)
            .bind(lineup.captain.map(|id| id.as_i64()))
            .bind(lineup.vice_captain.map(|id| id.as_i64()))
            .bind(chrono::Utc::now().timestamp_millis())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    // =========================================================================
    // Chips
    // =========================================================================

    pub async fn get_chip_selection(
        &self,
        participant: ParticipantId,
        round: RoundId,
    ) -> Result<Option<ChipKind>, StoreError> {
        let row = sqlx::query(
            "SELECT chip FROM chip_selections WHERE participant_id = ? AND round = ?",
        )
        .bind(participant.as_i64())
        .bind(i64::from(round.as_u32()))
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(chip_column(&row)?)),
            None => Ok(None),
        }
    }

    pub async fn query_chip_selections(
        &self,
        participant: ParticipantId,
    ) -> Result<Vec<ChipSelectionRecord>, StoreError> {
        let rows = sqlx::query(
            "SELECT round, chip FROM chip_selections WHERE participant_id = ? ORDER BY round ASC",
        )
        .bind(participant.as_i64())
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                Ok(ChipSelectionRecord {
                    participant,
                    round: round_column(row)?,
                    chip: chip_column(row)?,
                })
            })
            .collect()
    }

    /// Set the chip for a round, or clear it with `None`.
    pub async fn set_chip_selection(
        &self,
        participant: ParticipantId,
        round: RoundId,
        chip: Option<ChipKind>,
    ) -> Result<(), StoreError> {
        match chip {
            Some(chip) => {
                sqlx::query(
                    r#"
                    INSERT INTO chip_selections (participant_id, round, chip) VALUES (?, ?, ?)
                    ON CONFLICT(participant_id, round) DO UPDATE SET chip = excluded.chip
                    "#,
                )
                .bind(participant.as_i64())
                .bind(i64::from(round.as_u32()))
                .bind(chip.as_str())
                .execute(&self.pool)
                .await?;
            }
            None => {
                sqlx::query("DELETE FROM chip_selections WHERE participant_id = ? AND round = ?")
                    .bind(participant.as_i64())
                    .bind(i64::from(round.as_u32()))
                    .execute(&self.pool)
                    .await?;
            }
        }

        Ok(())
    }

    pub async fn query_chip_usages(
        &self,
        participant: ParticipantId,
    ) -> Result<Vec<ChipUsageRecord>, StoreError> {
        let rows = sqlx::query(
            "SELECT chip, round FROM chip_usages WHERE participant_id = ? ORDER BY round ASC, chip ASC",
        )
        .bind(participant.as_i64())
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                Ok(ChipUsageRecord {
                    participant,
                    chip: chip_column(row)?,
                    round: round_column(row)?,
                })
            })
            .collect()
    }

    /// Insert-if-absent. The first round a chip is recorded in wins.
    ///
    /// Returns `true` if a row was inserted.
    pub async fn insert_chip_usage(&self, record: &ChipUsageRecord) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO chip_usages (participant_id, chip, round, created_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(participant_id, chip) DO NOTHING
            "#,
        )
        .bind(record.participant.as_i64())
        .bind(record.chip.as_str())
        .bind(i64::from(record.round.as_u32()))
        .bind(chrono::Utc::now().timestamp_millis())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    // =========================================================================
    // Free transfers
    // =========================================================================

    pub async fn get_free_transfer_balance(
        &self,
        participant: ParticipantId,
        round: RoundId,
    ) -> Result<Option<u8>, StoreError> {
        let row = sqlx::query(
            "SELECT balance FROM free_transfer_balances WHERE participant_id = ? AND round = ?",
        )
        .bind(participant.as_i64())
        .bind(i64::from(round.as_u32()))
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(small_counter(&row, "balance")?)),
            None => Ok(None),
        }
    }

    pub async fn store_free_transfer_balance(
        &self,
        participant: ParticipantId,
        round: RoundId,
        balance: u8,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO free_transfer_balances (participant_id, round, balance) VALUES (?, ?, ?)
            ON CONFLICT(participant_id, round) DO UPDATE SET balance = excluded.balance
            "#,
        )
        .bind(participant.as_i64())
        .bind(i64::from(round.as_u32()))
        .bind(i64::from(balance))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn get_transfer_record(
        &self,
        participant: ParticipantId,
        round: RoundId,
    ) -> Result<Option<TransferRecord>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT transfers_made, free_transfers, next_free_transfers, point_penalty
            FROM transfer_records
            WHERE participant_id = ? AND round = ?
            "#,
        )
        .bind(participant.as_i64())
        .bind(i64::from(round.as_u32()))
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let point_penalty: i64 = row.try_get("point_penalty")?;
        Ok(Some(TransferRecord {
            participant,
            round,
            transfers_made: counter(&row, "transfers_made")?,
            free_transfers: small_counter(&row, "free_transfers")?,
            next_free_transfers: small_counter(&row, "next_free_transfers")?,
            point_penalty: i32::try_from(point_penalty)
                .map_err(|_| StoreError::Corrupt(format!("point_penalty = {}", point_penalty)))?,
        }))
    }

    pub async fn upsert_transfer_record(&self, record: &TransferRecord) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO transfer_records (
                participant_id, round, transfers_made, free_transfers,
                next_free_transfers, point_penalty
            ) VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(participant_id, round) DO UPDATE SET
                transfers_made = excluded.transfers_made,
                free_transfers = excluded.free_transfers,
                next_free_transfers = excluded.next_free_transfers,
                point_penalty = excluded.point_penalty
            "#,
        )
        .bind(record.participant.as_i64())
        .bind(i64::from(record.round.as_u32()))
        .bind(i64::from(record.transfers_made))
        .bind(i64::from(record.free_transfers))
        .bind(i64::from(record.next_free_transfers))
        .bind(i64::from(record.point_penalty))
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

fn lineup_from_row(row: &SqliteRow) -> Result<Lineup, StoreError> {
    let starters: String = row.try_get("starters")?;
    let bench: String = row.try_get("bench")?;
    let captain: Option<i64> = row.try_get("captain_id")?;
    let vice_captain: Option<i64> = row.try_get("vice_captain_id")?;

    Ok(Lineup {
        starters: decode_ids(&starters)?,
        bench: decode_ids(&bench)?,
        captain: captain.map(AthleteId::new),
        vice_captain: vice_captain.map(AthleteId::new),
    })
}

fn chip_column(row: &SqliteRow) -> Result<ChipKind, StoreError> {
    let chip: String = row.try_get("chip")?;
    ChipKind::from_str(&chip).map_err(StoreError::Corrupt)
}

fn small_counter(row: &SqliteRow, column: &str) -> Result<u8, StoreError> {
    let value = counter(row, column)?;
    u8::try_from(value).map_err(|_| StoreError::Corrupt(format!("{} = {}", column, value)))
}

#[cfg(test)]
mod tests {
    use super::super::tests::setup_test_db;
    use super::*;

    fn ids(range: std::ops::Range<i64>) -> Vec<AthleteId> {
        range.map(AthleteId::new).collect()
    }

    #[tokio::test]
    async fn test_roster_roundtrip_preserves_order() {
        let (repo, _temp) = setup_test_db().await;
        let lineup = Lineup::new(
            vec![11, 3, 7, 1, 2, 4, 5, 6, 8, 9, 10]
                .into_iter()
                .map(AthleteId::new)
                .collect(),
            ids(12..16),
            AthleteId::new(7),
            AthleteId::new(3),
        );
        let roster = Roster::new(ParticipantId::new(1), RoundId::new(2), lineup);

        repo.upsert_roster(&roster).await.unwrap();
        let stored = repo
            .get_roster(ParticipantId::new(1), RoundId::new(2))
            .await
            .unwrap();
        assert_eq!(stored, Some(roster));

        let missing = repo
            .get_roster(ParticipantId::new(1), RoundId::new(3))
            .await
            .unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_latest_roster_before_skips_gaps() {
        let (repo, _temp) = setup_test_db().await;
        let p = ParticipantId::new(4);
        let lineup = Lineup::new(ids(1..12), ids(12..16), AthleteId::new(1), AthleteId::new(2));
        let mut later = lineup.clone();
        later.captain = Some(AthleteId::new(5));

        repo.upsert_roster(&Roster::new(p, RoundId::new(1), lineup.clone()))
            .await
            .unwrap();
        repo.upsert_roster(&Roster::new(p, RoundId::new(4), later.clone()))
            .await
            .unwrap();
        repo.upsert_roster(&Roster::new(ParticipantId::new(5), RoundId::new(3), lineup.clone()))
            .await
            .unwrap();

        let carried = repo
            .get_latest_roster_before(p, RoundId::new(4))
            .await
            .unwrap();
        assert_eq!(carried, Some(Roster::new(p, RoundId::new(1), lineup)));

        let newest = repo
            .get_latest_roster_before(p, RoundId::new(7))
            .await
            .unwrap();
        assert_eq!(newest, Some(Roster::new(p, RoundId::new(4), later)));

        assert!(repo
            .get_latest_roster_before(p, RoundId::new(1))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_resolved_lineup_is_separate_from_roster() {
        let (repo, _temp) = setup_test_db().await;
        let p = ParticipantId::new(5);
        let r = RoundId::new(1);
        let authored = Lineup::new(ids(1..12), ids(12..16), AthleteId::new(1), AthleteId::new(2));
        let mut resolved = authored.clone();
        std::mem::swap(&mut resolved.starters[0], &mut resolved.bench[1]);
        resolved.captain = Some(AthleteId::new(2));
        resolved.vice_captain = None;

        repo.upsert_roster(&Roster::new(p, r, authored.clone()))
            .await
            .unwrap();
        repo.upsert_resolved_lineup(p, r, &resolved).await.unwrap();

        let roster = repo.get_roster(p, r).await.unwrap().unwrap();
        assert_eq!(roster.lineup, authored);
        assert_eq!(repo.get_resolved_lineup(p, r).await.unwrap(), Some(resolved));
    }

    #[tokio::test]
    async fn test_chip_usage_first_round_wins() {
        let (repo, _temp) = setup_test_db().await;
        let record = ChipUsageRecord {
            participant: ParticipantId::new(9),
            chip: ChipKind::BenchCountsToo,
            round: RoundId::new(4),
        };

        assert!(repo.insert_chip_usage(&record).await.unwrap());
        let later = ChipUsageRecord {
            round: RoundId::new(6),
            ..record
        };
        assert!(!repo.insert_chip_usage(&later).await.unwrap());

        let usages = repo.query_chip_usages(ParticipantId::new(9)).await.unwrap();
        assert_eq!(usages, vec![record]);
    }

    #[tokio::test]
    async fn test_chip_selection_set_and_clear() {
        let (repo, _temp) = setup_test_db().await;
        let p = ParticipantId::new(2);
        let r = RoundId::new(8);

        repo.set_chip_selection(p, r, Some(ChipKind::TripleCaptain))
            .await
            .unwrap();
        repo.set_chip_selection(p, r, Some(ChipKind::DualCaptain))
            .await
            .unwrap();
        assert_eq!(
            repo.get_chip_selection(p, r).await.unwrap(),
            Some(ChipKind::DualCaptain)
        );

        repo.set_chip_selection(p, RoundId::new(3), Some(ChipKind::BenchCountsToo))
            .await
            .unwrap();
        let pending = repo.query_chip_selections(p).await.unwrap();
        assert_eq!(
            pending.iter().map(|s| (s.round, s.chip)).collect::<Vec<_>>(),
            vec![
                (RoundId::new(3), ChipKind::BenchCountsToo),
                (r, ChipKind::DualCaptain),
            ]
        );

        repo.set_chip_selection(p, r, None).await.unwrap();
        assert_eq!(repo.get_chip_selection(p, r).await.unwrap(), None);
        assert_eq!(repo.query_chip_selections(p).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_transfer_ledger_roundtrip() {
        let (repo, _temp) = setup_test_db().await;
        let record = TransferRecord {
            participant: ParticipantId::new(3),
            round: RoundId::new(5),
            transfers_made: 3,
            free_transfers: 1,
            next_free_transfers: 1,
            point_penalty: 8,
        };

        repo.upsert_transfer_record(&record).await.unwrap();
        repo.store_free_transfer_balance(record.participant, RoundId::new(6), 1)
            .await
            .unwrap();

        assert_eq!(
            repo.get_transfer_record(record.participant, record.round)
                .await
                .unwrap(),
            Some(record)
        );
        assert_eq!(
            repo.get_free_transfer_balance(record.participant, RoundId::new(6))
                .await
                .unwrap(),
            Some(1)
        );
        assert_eq!(
            repo.get_free_transfer_balance(record.participant, RoundId::new(7))
                .await
                .unwrap(),
            None
        );
    }
}
