use sqlx::SqliteConnection;
use vocab_core::model::{UserId, ValidatedWord, Word, WordEdit, WordId};

use super::SqliteRepository;
use super::mapping::{conn, id_i64, map_edit_row, map_word_row, word_id_from_i64, write_err};
use crate::repository::{StorageError, WordCatalog};

const WORD_COLUMNS: &str = r"
    id, text, definition, example, translation, added_by, created_at, is_active
";

#[async_trait::async_trait]
impl WordCatalog for SqliteRepository {
    async fn get_word(&self, id: WordId) -> Result<Option<Word>, StorageError> {
        let sql = format!("SELECT {WORD_COLUMNS} FROM words WHERE id = ?1");
        let row = sqlx::query(&sql)
            .bind(id_i64("word_id", id.value())?)
            .fetch_optional(&self.pool)
            .await
            .map_err(conn)?;

        row.as_ref().map(map_word_row).transpose()
    }

    async fn add_word(
        &self,
        word: &ValidatedWord,
        added_by: Option<UserId>,
    ) -> Result<Word, StorageError> {
        let added_by_i64 = added_by
            .map(|id| id_i64("added_by", id.value()))
            .transpose()?;

        let res = sqlx::query(
            r"
            INSERT INTO words (
                text, definition, example, translation, added_by, created_at, is_active
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, 1)
            ",
        )
        .bind(&word.text)
        .bind(&word.definition)
        .bind(word.example.as_deref())
        .bind(word.translation.as_deref())
        .bind(added_by_i64)
        .bind(word.created_at)
        .execute(&self.pool)
        .await
        .map_err(write_err)?;

        let id = word_id_from_i64(res.last_insert_rowid())?;
        Ok(word.clone().assign_id(id, added_by))
    }

    async fn update_word(&self, word: &Word) -> Result<(), StorageError> {
        let mut db = self.pool.acquire().await.map_err(conn)?;
        write_word(&mut *db, word).await
    }

    async fn find_by_text(&self, text: &str) -> Result<Option<Word>, StorageError> {
        // `text` is declared COLLATE NOCASE, so equality ignores ASCII case.
        let sql = format!("SELECT {WORD_COLUMNS} FROM words WHERE text = ?1");
        let row = sqlx::query(&sql)
            .bind(text.trim())
            .fetch_optional(&self.pool)
            .await
            .map_err(conn)?;

        row.as_ref().map(map_word_row).transpose()
    }

    async fn list_words(&self, limit: u32) -> Result<Vec<Word>, StorageError> {
        let sql = format!(
            "SELECT {WORD_COLUMNS} FROM words ORDER BY created_at ASC, id ASC LIMIT ?1"
        );
        let rows = sqlx::query(&sql)
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await
            .map_err(conn)?;

        rows.iter().map(map_word_row).collect()
    }

    async fn apply_edit(&self, word: &Word, edit: &WordEdit) -> Result<(), StorageError> {
        let mut tx = self.pool.begin().await.map_err(conn)?;
        write_word(&mut *tx, word).await?;

        sqlx::query(
            r"
            INSERT INTO word_edit_history (
                word_id, edited_by, field_name, old_value, new_value, edited_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ",
        )
        .bind(id_i64("word_id", edit.word_id.value())?)
        .bind(id_i64("edited_by", edit.edited_by.value())?)
        .bind(edit.field.as_str())
        .bind(edit.old_value.as_deref())
        .bind(edit.new_value.as_deref())
        .bind(edit.edited_at)
        .execute(&mut *tx)
        .await
        .map_err(write_err)?;

        tx.commit().await.map_err(conn)
    }

    async fn edit_history(
        &self,
        word_id: WordId,
        limit: u32,
    ) -> Result<Vec<WordEdit>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT word_id, edited_by, field_name, old_value, new_value, edited_at
            FROM word_edit_history
            WHERE word_id = ?1
            ORDER BY edited_at DESC, id DESC
            LIMIT ?2
            ",
        )
        .bind(id_i64("word_id", word_id.value())?)
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter().map(map_edit_row).collect()
    }
}

async fn write_word(db: &mut SqliteConnection, word: &Word) -> Result<(), StorageError> {
    let res = sqlx::query(
        r"
        UPDATE words SET
            text = ?2,
            definition = ?3,
            example = ?4,
            translation = ?5,
            is_active = ?6
        WHERE id = ?1
        ",
    )
    .bind(id_i64("word_id", word.id.value())?)
    .bind(&word.text)
    .bind(&word.definition)
    .bind(word.example.as_deref())
    .bind(word.translation.as_deref())
    .bind(word.is_active)
    .execute(&mut *db)
    .await
    .map_err(write_err)?;

    if res.rows_affected() == 0 {
        return Err(StorageError::NotFound);
    }
    Ok(())
}
