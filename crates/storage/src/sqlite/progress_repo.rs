use chrono::NaiveDate;
use vocab_core::model::{UserId, Word, WordId, WordProgress};

use super::SqliteRepository;
use super::mapping::{conn, id_i64, map_progress_row, map_word_row};
use crate::repository::{ProgressRepository, StorageError};

const PROGRESS_COLUMNS: &str = r"
    user_id, word_id, box, due_date, consecutive_correct, total_reviews,
    total_correct, last_difficulty, first_seen_on, last_reviewed_on
";

#[async_trait::async_trait]
impl ProgressRepository for SqliteRepository {
    async fn get_progress(
        &self,
        user_id: UserId,
        word_id: WordId,
    ) -> Result<Option<WordProgress>, StorageError> {
        let sql = format!(
            "SELECT {PROGRESS_COLUMNS} FROM word_progress WHERE user_id = ?1 AND word_id = ?2"
        );
        let row = sqlx::query(&sql)
            .bind(id_i64("user_id", user_id.value())?)
            .bind(id_i64("word_id", word_id.value())?)
            .fetch_optional(&self.pool)
            .await
            .map_err(conn)?;

        row.as_ref().map(map_progress_row).transpose()
    }

    async fn upsert_progress(&self, progress: &WordProgress) -> Result<(), StorageError> {
        // One statement per row: box and due date always land together.
        sqlx::query(
            r"
            INSERT INTO word_progress (
                user_id, word_id, box, due_date, consecutive_correct, total_reviews,
                total_correct, last_difficulty, first_seen_on, last_reviewed_on
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            ON CONFLICT(user_id, word_id) DO UPDATE SET
                -- first_seen_on is fixed at first exposure
                box = excluded.box,
                due_date = excluded.due_date,
                consecutive_correct = excluded.consecutive_correct,
                total_reviews = excluded.total_reviews,
                total_correct = excluded.total_correct,
                last_difficulty = excluded.last_difficulty,
                last_reviewed_on = excluded.last_reviewed_on
            ",
        )
        .bind(id_i64("user_id", progress.user_id().value())?)
        .bind(id_i64("word_id", progress.word_id().value())?)
        .bind(i64::from(progress.leitner_box().value()))
        .bind(progress.due_date())
        .bind(i64::from(progress.consecutive_correct()))
        .bind(i64::from(progress.total_reviews()))
        .bind(i64::from(progress.total_correct()))
        .bind(progress.last_difficulty().map(|d| d.as_str()))
        .bind(progress.first_seen_on())
        .bind(progress.last_reviewed_on())
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        Ok(())
    }

    async fn due_progress(
        &self,
        user_id: UserId,
        today: NaiveDate,
        limit: u32,
    ) -> Result<Vec<WordProgress>, StorageError> {
        let sql = format!(
            r"
            SELECT {PROGRESS_COLUMNS}
            FROM word_progress
            WHERE user_id = ?1 AND due_date <= ?2
            ORDER BY due_date ASC, box ASC, word_id ASC
            LIMIT ?3
            "
        );
        let rows = sqlx::query(&sql)
            .bind(id_i64("user_id", user_id.value())?)
            .bind(today)
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await
            .map_err(conn)?;

        rows.iter().map(map_progress_row).collect()
    }

    async fn unseen_words(&self, user_id: UserId, limit: u32) -> Result<Vec<Word>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT
                w.id, w.text, w.definition, w.example, w.translation,
                w.added_by, w.created_at, w.is_active
            FROM words w
            WHERE w.is_active = 1
              AND NOT EXISTS (
                  SELECT 1 FROM word_progress p
                  WHERE p.user_id = ?1 AND p.word_id = w.id
              )
            ORDER BY w.created_at ASC, w.id ASC
            LIMIT ?2
            ",
        )
        .bind(id_i64("user_id", user_id.value())?)
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter().map(map_word_row).collect()
    }

    async fn all_progress(&self, user_id: UserId) -> Result<Vec<WordProgress>, StorageError> {
        let sql = format!(
            "SELECT {PROGRESS_COLUMNS} FROM word_progress WHERE user_id = ?1 ORDER BY word_id ASC"
        );
        let rows = sqlx::query(&sql)
            .bind(id_i64("user_id", user_id.value())?)
            .fetch_all(&self.pool)
            .await
            .map_err(conn)?;

        rows.iter().map(map_progress_row).collect()
    }
}
