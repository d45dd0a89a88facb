use chrono::{DateTime, NaiveDate, Utc};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;
use vocab_core::model::{
    SessionSummary, UserId, UserSettings, Word, WordEdit, WordField, WordId, WordProgress,
};
use vocab_core::{Difficulty, LeitnerBox};

use crate::repository::{SessionSummaryRow, StorageError};

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn conn<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

/// Unique-constraint violations become `Conflict`; everything else is a
/// connection failure.
pub(crate) fn write_err(e: sqlx::Error) -> StorageError {
    match e.as_database_error() {
        Some(db) if db.is_unique_violation() => StorageError::Conflict,
        _ => conn(e),
    }
}

fn i64_to_u64(field: &'static str, v: i64) -> Result<u64, StorageError> {
    u64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} sign overflow")))
}

pub(crate) fn id_i64(field: &'static str, v: u64) -> Result<i64, StorageError> {
    i64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} overflow")))
}

pub(crate) fn u32_from_i64(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

pub(crate) fn user_id_from_i64(v: i64) -> Result<UserId, StorageError> {
    Ok(UserId::new(i64_to_u64("user_id", v)?))
}

pub(crate) fn word_id_from_i64(v: i64) -> Result<WordId, StorageError> {
    Ok(WordId::new(i64_to_u64("word_id", v)?))
}

fn get_u32(row: &SqliteRow, field: &'static str) -> Result<u32, StorageError> {
    u32_from_i64(field, row.try_get::<i64, _>(field).map_err(ser)?)
}

pub(crate) fn map_word_row(row: &SqliteRow) -> Result<Word, StorageError> {
    let added_by = row
        .try_get::<Option<i64>, _>("added_by")
        .map_err(ser)?
        .map(user_id_from_i64)
        .transpose()?;
    let created_at: DateTime<Utc> = row.try_get("created_at").map_err(ser)?;

    Ok(Word {
        id: word_id_from_i64(row.try_get::<i64, _>("id").map_err(ser)?)?,
        text: row.try_get("text").map_err(ser)?,
        definition: row.try_get("definition").map_err(ser)?,
        example: row.try_get("example").map_err(ser)?,
        translation: row.try_get("translation").map_err(ser)?,
        added_by,
        created_at,
        is_active: row.try_get("is_active").map_err(ser)?,
    })
}

pub(crate) fn map_edit_row(row: &SqliteRow) -> Result<WordEdit, StorageError> {
    let field: String = row.try_get("field_name").map_err(ser)?;
    Ok(WordEdit {
        word_id: word_id_from_i64(row.try_get::<i64, _>("word_id").map_err(ser)?)?,
        edited_by: user_id_from_i64(row.try_get::<i64, _>("edited_by").map_err(ser)?)?,
        field: field.parse::<WordField>().map_err(ser)?,
        old_value: row.try_get("old_value").map_err(ser)?,
        new_value: row.try_get("new_value").map_err(ser)?,
        edited_at: row.try_get("edited_at").map_err(ser)?,
    })
}

pub(crate) fn map_progress_row(row: &SqliteRow) -> Result<WordProgress, StorageError> {
    let box_value: i64 = row.try_get("box").map_err(ser)?;
    let leitner_box = u8::try_from(box_value)
        .map_err(|_| StorageError::Serialization(format!("invalid box: {box_value}")))
        .and_then(|v| LeitnerBox::new(v).map_err(ser))?;

    let last_difficulty = row
        .try_get::<Option<String>, _>("last_difficulty")
        .map_err(ser)?
        .map(|raw| raw.parse::<Difficulty>().map_err(ser))
        .transpose()?;

    let due_date: NaiveDate = row.try_get("due_date").map_err(ser)?;
    let first_seen_on: NaiveDate = row.try_get("first_seen_on").map_err(ser)?;
    let last_reviewed_on: Option<NaiveDate> = row.try_get("last_reviewed_on").map_err(ser)?;

    WordProgress::from_persisted(
        user_id_from_i64(row.try_get::<i64, _>("user_id").map_err(ser)?)?,
        word_id_from_i64(row.try_get::<i64, _>("word_id").map_err(ser)?)?,
        leitner_box,
        due_date,
        get_u32(row, "consecutive_correct")?,
        get_u32(row, "total_reviews")?,
        get_u32(row, "total_correct")?,
        last_difficulty,
        first_seen_on,
        last_reviewed_on,
    )
    .map_err(ser)
}

pub(crate) fn map_summary_row(row: &SqliteRow) -> Result<SessionSummary, StorageError> {
    SessionSummary::from_persisted(
        user_id_from_i64(row.try_get::<i64, _>("user_id").map_err(ser)?)?,
        row.try_get("started_at").map_err(ser)?,
        row.try_get("completed_at").map_err(ser)?,
        get_u32(row, "reviewed")?,
        get_u32(row, "correct")?,
        get_u32(row, "incorrect")?,
        get_u32(row, "new_words")?,
    )
    .map_err(ser)
}

pub(crate) fn map_summary_row_with_id(row: &SqliteRow) -> Result<SessionSummaryRow, StorageError> {
    let id: i64 = row.try_get("id").map_err(ser)?;
    let summary = map_summary_row(row)?;
    Ok(SessionSummaryRow::new(id, summary))
}

pub(crate) fn map_settings_row(row: &SqliteRow) -> Result<UserSettings, StorageError> {
    let reminder_time: String = row.try_get("reminder_time").map_err(ser)?;
    UserSettings::from_persisted(
        get_u32(row, "daily_word_limit")?,
        row.try_get("reminder_enabled").map_err(ser)?,
        &reminder_time,
    )
    .map_err(ser)
}
