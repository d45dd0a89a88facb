use vocab_core::model::{SessionSummary, UserId};

use super::SqliteRepository;
use super::mapping::{conn, id_i64, map_summary_row, map_summary_row_with_id};
use crate::repository::{SessionSummaryRepository, SessionSummaryRow, StorageError};

#[async_trait::async_trait]
impl SessionSummaryRepository for SqliteRepository {
    async fn append_summary(&self, summary: &SessionSummary) -> Result<i64, StorageError> {
        let user_id = id_i64("user_id", summary.user_id().value())?;

        let res = sqlx::query(
            r"
                INSERT INTO session_summaries (
                    user_id, started_at, completed_at, reviewed,
                    correct, incorrect, new_words
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ",
        )
        .bind(user_id)
        .bind(summary.started_at())
        .bind(summary.completed_at())
        .bind(i64::from(summary.reviewed()))
        .bind(i64::from(summary.correct()))
        .bind(i64::from(summary.incorrect()))
        .bind(i64::from(summary.new_words()))
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        Ok(res.last_insert_rowid())
    }

    async fn get_summary(&self, id: i64) -> Result<SessionSummary, StorageError> {
        let row = sqlx::query(
            r"
                SELECT
                    user_id, started_at, completed_at, reviewed,
                    correct, incorrect, new_words
                FROM session_summaries
                WHERE id = ?1
            ",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?
        .ok_or(StorageError::NotFound)?;

        map_summary_row(&row)
    }

    async fn list_summaries(
        &self,
        user_id: UserId,
        limit: u32,
    ) -> Result<Vec<SessionSummaryRow>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT
                    id, user_id, started_at, completed_at, reviewed,
                    correct, incorrect, new_words
                FROM session_summaries
                WHERE user_id = ?1
                ORDER BY completed_at DESC, id DESC
                LIMIT ?2
            ",
        )
        .bind(id_i64("user_id", user_id.value())?)
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter().map(map_summary_row_with_id).collect()
    }
}
