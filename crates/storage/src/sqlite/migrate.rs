use chrono::Utc;
use sqlx::SqlitePool;
use tracing::info;

use super::SqliteInitError;

/// Applies versioned migrations that are not yet recorded.
///
/// Version 1 creates words, word progress, session summaries, user settings
/// and their indexes; version 2 adds the word edit history.
#[allow(clippy::too_many_lines)]
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), SqliteInitError> {
    async fn is_applied(pool: &SqlitePool, version: i64) -> Result<bool, sqlx::Error> {
        let row = sqlx::query("SELECT 1 FROM schema_migrations WHERE version = ?1")
            .bind(version)
            .fetch_optional(pool)
            .await?;
        Ok(row.is_some())
    }

    sqlx::query(
        r"
            CREATE TABLE IF NOT EXISTS schema_migrations (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL
            );
            ",
    )
    .execute(pool)
    .await?;

    // Version 1: full schema.
    if !is_applied(pool, 1).await? {
        let mut tx = pool.begin().await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS words (
                    id INTEGER PRIMARY KEY,
                    text TEXT NOT NULL COLLATE NOCASE UNIQUE,
                    definition TEXT NOT NULL,
                    example TEXT,
                    translation TEXT,
                    added_by INTEGER,
                    created_at TEXT NOT NULL,
                    is_active INTEGER NOT NULL DEFAULT 1 CHECK (is_active IN (0, 1))
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS word_progress (
                    user_id INTEGER NOT NULL,
                    word_id INTEGER NOT NULL,
                    box INTEGER NOT NULL CHECK (box BETWEEN 1 AND 7),
                    due_date TEXT NOT NULL,
                    consecutive_correct INTEGER NOT NULL CHECK (consecutive_correct >= 0),
                    total_reviews INTEGER NOT NULL CHECK (total_reviews >= 0),
                    total_correct INTEGER NOT NULL CHECK (total_correct >= 0),
                    last_difficulty TEXT CHECK (last_difficulty IN ('easy', 'normal', 'hard')),
                    first_seen_on TEXT NOT NULL,
                    last_reviewed_on TEXT,
                    PRIMARY KEY (user_id, word_id),
                    FOREIGN KEY (word_id) REFERENCES words(id)
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS session_summaries (
                    id INTEGER PRIMARY KEY,
                    user_id INTEGER NOT NULL,
                    started_at TEXT NOT NULL,
                    completed_at TEXT NOT NULL,
                    reviewed INTEGER NOT NULL CHECK (reviewed >= 0),
                    correct INTEGER NOT NULL CHECK (correct >= 0),
                    incorrect INTEGER NOT NULL CHECK (incorrect >= 0),
                    new_words INTEGER NOT NULL CHECK (new_words >= 0)
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS user_settings (
                    user_id INTEGER PRIMARY KEY,
                    daily_word_limit INTEGER NOT NULL CHECK (daily_word_limit > 0),
                    reminder_enabled INTEGER NOT NULL CHECK (reminder_enabled IN (0, 1)),
                    reminder_time TEXT NOT NULL
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE INDEX IF NOT EXISTS idx_word_progress_user_due
                    ON word_progress (user_id, due_date, box, word_id);
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE INDEX IF NOT EXISTS idx_words_active_created
                    ON words (is_active, created_at, id);
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE INDEX IF NOT EXISTS idx_session_summaries_user_completed
                    ON session_summaries (user_id, completed_at);
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                INSERT INTO schema_migrations (version, applied_at)
                VALUES (?1, ?2)
                ON CONFLICT(version) DO NOTHING
            ",
        )
        .bind(1_i64)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        info!(version = 1, "applied sqlite migration");
    }

    // Version 2: audit trail of word edits.
    if !is_applied(pool, 2).await? {
        let mut tx = pool.begin().await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS word_edit_history (
                    id INTEGER PRIMARY KEY,
                    word_id INTEGER NOT NULL,
                    edited_by INTEGER NOT NULL,
                    field_name TEXT NOT NULL
                        CHECK (field_name IN ('text', 'definition', 'example', 'translation')),
                    old_value TEXT,
                    new_value TEXT,
                    edited_at TEXT NOT NULL,
                    FOREIGN KEY (word_id) REFERENCES words(id)
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE INDEX IF NOT EXISTS idx_word_edit_history_word
                    ON word_edit_history (word_id, edited_at);
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                INSERT INTO schema_migrations (version, applied_at)
                VALUES (?1, ?2)
                ON CONFLICT(version) DO NOTHING
            ",
        )
        .bind(2_i64)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        info!(version = 2, "applied sqlite migration");
    }

    Ok(())
}
