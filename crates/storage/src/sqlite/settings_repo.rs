use async_trait::async_trait;
use vocab_core::model::{UserId, UserSettings};

use super::SqliteRepository;
use super::mapping::{conn, id_i64, map_settings_row};
use crate::repository::{StorageError, UserSettingsRepository};

#[async_trait]
impl UserSettingsRepository for SqliteRepository {
    async fn get_settings(&self, user_id: UserId) -> Result<Option<UserSettings>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT daily_word_limit, reminder_enabled, reminder_time
            FROM user_settings
            WHERE user_id = ?1
            ",
        )
        .bind(id_i64("user_id", user_id.value())?)
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?;

        let Some(row) = row else {
            return Ok(None);
        };
        map_settings_row(&row).map(Some)
    }

    async fn save_settings(
        &self,
        user_id: UserId,
        settings: &UserSettings,
    ) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO user_settings (user_id, daily_word_limit, reminder_enabled, reminder_time)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(user_id) DO UPDATE SET
                daily_word_limit = excluded.daily_word_limit,
                reminder_enabled = excluded.reminder_enabled,
                reminder_time = excluded.reminder_time
            ",
        )
        .bind(id_i64("user_id", user_id.value())?)
        .bind(i64::from(settings.daily_word_limit()))
        .bind(settings.reminder_enabled())
        .bind(settings.reminder_time_hhmm())
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        Ok(())
    }
}
