use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;
use vocab_core::model::{
    SessionSummary, UserId, UserSettings, ValidatedWord, Word, WordEdit, WordId, WordProgress,
};

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Per-user word progress: the store the scheduler reads from and commits to.
///
/// Every write replaces one full `WordProgress` row in a single statement, so
/// two interleaved sessions can never leave a row with a box from one commit and
/// a due date from another.
#[async_trait]
pub trait ProgressRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError` on backend failure.
    async fn get_progress(
        &self,
        user_id: UserId,
        word_id: WordId,
    ) -> Result<Option<WordProgress>, StorageError>;

    /// Insert or replace the progress row for `(user, word)`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the write does not land.
    async fn upsert_progress(&self, progress: &WordProgress) -> Result<(), StorageError>;

    /// Rows with `due_date <= today`, ordered by due date, then box, then word id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failure.
    async fn due_progress(
        &self,
        user_id: UserId,
        today: NaiveDate,
        limit: u32,
    ) -> Result<Vec<WordProgress>, StorageError>;

    /// Active catalog words the user has no progress row for, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failure.
    async fn unseen_words(&self, user_id: UserId, limit: u32) -> Result<Vec<Word>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` on backend failure.
    async fn all_progress(&self, user_id: UserId) -> Result<Vec<WordProgress>, StorageError>;
}

/// Catalog of words shared by all users.
#[async_trait]
pub trait WordCatalog: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError` on backend failure.
    async fn get_word(&self, id: WordId) -> Result<Option<Word>, StorageError>;

    /// Store a validated word and assign it the next id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if a word with the same text (ignoring
    /// case) already exists.
    async fn add_word(
        &self,
        word: &ValidatedWord,
        added_by: Option<UserId>,
    ) -> Result<Word, StorageError>;

    /// Persist edits to an existing word.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the word is missing,
    /// `StorageError::Conflict` if the new text collides with another word.
    async fn update_word(&self, word: &Word) -> Result<(), StorageError>;

    /// Case-insensitive lookup by text.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failure.
    async fn find_by_text(&self, text: &str) -> Result<Option<Word>, StorageError>;

    /// Words in catalog order, inactive ones included.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failure.
    async fn list_words(&self, limit: u32) -> Result<Vec<Word>, StorageError>;

    /// Store an edited word together with its audit entry, both or neither.
    ///
    /// # Errors
    ///
    /// Same as [`WordCatalog::update_word`]; no history is written on failure.
    async fn apply_edit(&self, word: &Word, edit: &WordEdit) -> Result<(), StorageError>;

    /// Edit history of a word, newest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failure.
    async fn edit_history(
        &self,
        word_id: WordId,
        limit: u32,
    ) -> Result<Vec<WordEdit>, StorageError>;
}

/// Persisted session summary with its storage id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSummaryRow {
    pub id: i64,
    pub summary: SessionSummary,
}

impl SessionSummaryRow {
    #[must_use]
    pub fn new(id: i64, summary: SessionSummary) -> Self {
        Self { id, summary }
    }
}

#[async_trait]
pub trait SessionSummaryRepository: Send + Sync {
    /// Append a summary and return its id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the summary cannot be stored.
    async fn append_summary(&self, summary: &SessionSummary) -> Result<i64, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if missing.
    async fn get_summary(&self, id: i64) -> Result<SessionSummary, StorageError>;

    /// Newest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failure.
    async fn list_summaries(
        &self,
        user_id: UserId,
        limit: u32,
    ) -> Result<Vec<SessionSummaryRow>, StorageError>;
}

#[async_trait]
pub trait UserSettingsRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError` on backend failure.
    async fn get_settings(&self, user_id: UserId) -> Result<Option<UserSettings>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the settings cannot be stored.
    async fn save_settings(
        &self,
        user_id: UserId,
        settings: &UserSettings,
    ) -> Result<(), StorageError>;
}

//
// ─── IN-MEMORY ─────────────────────────────────────────────────────────────────
//

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    progress: Arc<Mutex<HashMap<(UserId, WordId), WordProgress>>>,
    words: Arc<Mutex<HashMap<WordId, Word>>>,
    edits: Arc<Mutex<Vec<WordEdit>>>,
    summaries: Arc<Mutex<Vec<SessionSummaryRow>>>,
    settings: Arc<Mutex<HashMap<UserId, UserSettings>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, StorageError> {
    mutex
        .lock()
        .map_err(|e| StorageError::Connection(e.to_string()))
}

fn catalog_order(words: &mut [Word]) {
    words.sort_by(|a, b| (a.created_at, a.id).cmp(&(b.created_at, b.id)));
}

fn replace_word(words: &mut HashMap<WordId, Word>, word: &Word) -> Result<(), StorageError> {
    if !words.contains_key(&word.id) {
        return Err(StorageError::NotFound);
    }
    let key = word.normalized_text();
    if words
        .values()
        .any(|w| w.id != word.id && w.normalized_text() == key)
    {
        return Err(StorageError::Conflict);
    }
    words.insert(word.id, word.clone());
    Ok(())
}

fn limit_len(limit: u32) -> usize {
    usize::try_from(limit).unwrap_or(usize::MAX)
}

#[async_trait]
impl ProgressRepository for InMemoryRepository {
    async fn get_progress(
        &self,
        user_id: UserId,
        word_id: WordId,
    ) -> Result<Option<WordProgress>, StorageError> {
        let guard = lock(&self.progress)?;
        Ok(guard.get(&(user_id, word_id)).cloned())
    }

    async fn upsert_progress(&self, progress: &WordProgress) -> Result<(), StorageError> {
        let mut guard = lock(&self.progress)?;
        guard.insert((progress.user_id(), progress.word_id()), progress.clone());
        Ok(())
    }

    async fn due_progress(
        &self,
        user_id: UserId,
        today: NaiveDate,
        limit: u32,
    ) -> Result<Vec<WordProgress>, StorageError> {
        let guard = lock(&self.progress)?;
        let mut due: Vec<WordProgress> = guard
            .values()
            .filter(|p| p.user_id() == user_id && p.is_due(today))
            .cloned()
            .collect();
        due.sort_by_key(|p| (p.due_date(), p.leitner_box(), p.word_id()));
        due.truncate(limit_len(limit));
        Ok(due)
    }

    async fn unseen_words(&self, user_id: UserId, limit: u32) -> Result<Vec<Word>, StorageError> {
        let progress = lock(&self.progress)?;
        let words = lock(&self.words)?;
        let mut unseen: Vec<Word> = words
            .values()
            .filter(|w| w.is_active && !progress.contains_key(&(user_id, w.id)))
            .cloned()
            .collect();
        catalog_order(&mut unseen);
        unseen.truncate(limit_len(limit));
        Ok(unseen)
    }

    async fn all_progress(&self, user_id: UserId) -> Result<Vec<WordProgress>, StorageError> {
        let guard = lock(&self.progress)?;
        let mut rows: Vec<WordProgress> = guard
            .values()
            .filter(|p| p.user_id() == user_id)
            .cloned()
            .collect();
        rows.sort_by_key(WordProgress::word_id);
        Ok(rows)
    }
}

#[async_trait]
impl WordCatalog for InMemoryRepository {
    async fn get_word(&self, id: WordId) -> Result<Option<Word>, StorageError> {
        let guard = lock(&self.words)?;
        Ok(guard.get(&id).cloned())
    }

    async fn add_word(
        &self,
        word: &ValidatedWord,
        added_by: Option<UserId>,
    ) -> Result<Word, StorageError> {
        let mut guard = lock(&self.words)?;
        let key = word.text.to_lowercase();
        if guard.values().any(|w| w.normalized_text() == key) {
            return Err(StorageError::Conflict);
        }
        let next_id = guard.keys().map(WordId::value).max().unwrap_or(0) + 1;
        let stored = word.clone().assign_id(WordId::new(next_id), added_by);
        guard.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn update_word(&self, word: &Word) -> Result<(), StorageError> {
        let mut guard = lock(&self.words)?;
        replace_word(&mut guard, word)
    }

    async fn find_by_text(&self, text: &str) -> Result<Option<Word>, StorageError> {
        let guard = lock(&self.words)?;
        let key = text.trim().to_lowercase();
        Ok(guard.values().find(|w| w.normalized_text() == key).cloned())
    }

    async fn list_words(&self, limit: u32) -> Result<Vec<Word>, StorageError> {
        let guard = lock(&self.words)?;
        let mut words: Vec<Word> = guard.values().cloned().collect();
        catalog_order(&mut words);
        words.truncate(limit_len(limit));
        Ok(words)
    }

    async fn apply_edit(&self, word: &Word, edit: &WordEdit) -> Result<(), StorageError> {
        let mut words = lock(&self.words)?;
        let mut edits = lock(&self.edits)?;
        replace_word(&mut words, word)?;
        edits.push(edit.clone());
        Ok(())
    }

    async fn edit_history(
        &self,
        word_id: WordId,
        limit: u32,
    ) -> Result<Vec<WordEdit>, StorageError> {
        let guard = lock(&self.edits)?;
        Ok(guard
            .iter()
            .rev()
            .filter(|edit| edit.word_id == word_id)
            .take(limit_len(limit))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl SessionSummaryRepository for InMemoryRepository {
    async fn append_summary(&self, summary: &SessionSummary) -> Result<i64, StorageError> {
        let mut guard = lock(&self.summaries)?;
        let id = guard.iter().map(|row| row.id).max().unwrap_or(0) + 1;
        guard.push(SessionSummaryRow::new(id, summary.clone()));
        Ok(id)
    }

    async fn get_summary(&self, id: i64) -> Result<SessionSummary, StorageError> {
        let guard = lock(&self.summaries)?;
        guard
            .iter()
            .find(|row| row.id == id)
            .map(|row| row.summary.clone())
            .ok_or(StorageError::NotFound)
    }

    async fn list_summaries(
        &self,
        user_id: UserId,
        limit: u32,
    ) -> Result<Vec<SessionSummaryRow>, StorageError> {
        let guard = lock(&self.summaries)?;
        let mut rows: Vec<SessionSummaryRow> = guard
            .iter()
            .filter(|row| row.summary.user_id() == user_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| {
            (b.summary.completed_at(), b.id).cmp(&(a.summary.completed_at(), a.id))
        });
        rows.truncate(limit_len(limit));
        Ok(rows)
    }
}

#[async_trait]
impl UserSettingsRepository for InMemoryRepository {
    async fn get_settings(&self, user_id: UserId) -> Result<Option<UserSettings>, StorageError> {
        let guard = lock(&self.settings)?;
        Ok(guard.get(&user_id).cloned())
    }

    async fn save_settings(
        &self,
        user_id: UserId,
        settings: &UserSettings,
    ) -> Result<(), StorageError> {
        let mut guard = lock(&self.settings)?;
        guard.insert(user_id, settings.clone());
        Ok(())
    }
}

/// Aggregates the repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub progress: Arc<dyn ProgressRepository>,
    pub words: Arc<dyn WordCatalog>,
    pub summaries: Arc<dyn SessionSummaryRepository>,
    pub settings: Arc<dyn UserSettingsRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        let progress: Arc<dyn ProgressRepository> = Arc::new(repo.clone());
        let words: Arc<dyn WordCatalog> = Arc::new(repo.clone());
        let summaries: Arc<dyn SessionSummaryRepository> = Arc::new(repo.clone());
        let settings: Arc<dyn UserSettingsRepository> = Arc::new(repo);
        Self {
            progress,
            words,
            summaries,
            settings,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use vocab_core::model::{ReviewOutcome, WordDraft, WordField};
    use vocab_core::time::{fixed_now, fixed_today};
    use vocab_core::Difficulty;

    fn draft(text: &str) -> ValidatedWord {
        WordDraft::new(text, format!("meaning of {text}"))
            .validate(fixed_now())
            .unwrap()
    }

    #[tokio::test]
    async fn add_word_assigns_ids_and_rejects_case_duplicates() {
        let repo = InMemoryRepository::new();
        let first = repo.add_word(&draft("Apple"), None).await.unwrap();
        let second = repo.add_word(&draft("pear"), Some(UserId::new(3))).await.unwrap();

        assert_eq!(first.id, WordId::new(1));
        assert_eq!(second.id, WordId::new(2));
        assert_eq!(second.added_by, Some(UserId::new(3)));
        assert!(matches!(
            repo.add_word(&draft("APPLE"), None).await,
            Err(StorageError::Conflict)
        ));
        assert_eq!(
            repo.find_by_text("aPPle").await.unwrap().map(|w| w.id),
            Some(first.id)
        );
    }

    #[tokio::test]
    async fn unseen_words_skip_seen_and_inactive() {
        let repo = InMemoryRepository::new();
        let user = UserId::new(1);
        let a = repo.add_word(&draft("a"), None).await.unwrap();
        let b = repo.add_word(&draft("b"), None).await.unwrap();
        let c = repo.add_word(&draft("c"), None).await.unwrap();

        repo.upsert_progress(&WordProgress::first_exposure(user, a.id, fixed_today()))
            .await
            .unwrap();
        repo.update_word(&Word {
            is_active: false,
            ..c.clone()
        })
        .await
        .unwrap();

        let unseen = repo.unseen_words(user, 10).await.unwrap();
        assert_eq!(unseen.iter().map(|w| w.id).collect::<Vec<_>>(), vec![b.id]);

        let other_user = repo.unseen_words(UserId::new(2), 10).await.unwrap();
        assert_eq!(other_user.len(), 2);
    }

    #[tokio::test]
    async fn due_progress_orders_by_date_then_box_then_id() {
        let repo = InMemoryRepository::new();
        let user = UserId::new(1);
        let today = fixed_today();
        let knew = |id: u64| ReviewOutcome::new(WordId::new(id), true, Difficulty::Normal);

        // Word 1: box 2, due today + 2 (not due yet).
        let later = WordProgress::first_exposure(user, WordId::new(1), today)
            .after_review(&knew(1), today)
            .unwrap();
        // Word 2: box 2 reviewed four days ago, now overdue by two days.
        let overdue = WordProgress::first_exposure(user, WordId::new(2), today)
            .after_review(&knew(2), today - Duration::days(4))
            .unwrap();
        // Words 3 and 4: fresh, box 1, due today.
        let fresh_4 = WordProgress::first_exposure(user, WordId::new(4), today);
        let fresh_3 = WordProgress::first_exposure(user, WordId::new(3), today);

        for p in [&later, &overdue, &fresh_4, &fresh_3] {
            repo.upsert_progress(p).await.unwrap();
        }

        let due = repo.due_progress(user, today, 10).await.unwrap();
        let ids: Vec<u64> = due.iter().map(|p| p.word_id().value()).collect();
        assert_eq!(ids, vec![2, 3, 4]);

        let capped = repo.due_progress(user, today, 1).await.unwrap();
        assert_eq!(capped.len(), 1);
    }

    #[tokio::test]
    async fn summaries_are_listed_newest_first_per_user() {
        let repo = InMemoryRepository::new();
        let user = UserId::new(1);
        let now = fixed_now();
        let older = SessionSummary::from_persisted(user, now, now, 1, 1, 0, 1).unwrap();
        let newer = SessionSummary::from_persisted(
            user,
            now,
            now + Duration::minutes(5),
            2,
            1,
            1,
            0,
        )
        .unwrap();
        let foreign = SessionSummary::from_persisted(UserId::new(2), now, now, 0, 0, 0, 0).unwrap();

        let older_id = repo.append_summary(&older).await.unwrap();
        let newer_id = repo.append_summary(&newer).await.unwrap();
        repo.append_summary(&foreign).await.unwrap();

        let rows = repo.list_summaries(user, 10).await.unwrap();
        assert_eq!(
            rows.iter().map(|r| r.id).collect::<Vec<_>>(),
            vec![newer_id, older_id]
        );
        assert_eq!(repo.get_summary(older_id).await.unwrap(), older);
        assert!(matches!(
            repo.get_summary(99).await,
            Err(StorageError::NotFound)
        ));
    }

    #[tokio::test]
    async fn settings_round_trip() {
        let repo = InMemoryRepository::new();
        let user = UserId::new(9);
        assert!(repo.get_settings(user).await.unwrap().is_none());

        let settings = UserSettings::default().with_daily_word_limit(25).unwrap();
        repo.save_settings(user, &settings).await.unwrap();
        assert_eq!(repo.get_settings(user).await.unwrap(), Some(settings));
    }

    #[tokio::test]
    async fn apply_edit_keeps_history_only_for_stored_edits() {
        let repo = InMemoryRepository::new();
        let editor = UserId::new(6);
        let word = repo.add_word(&draft("brisk"), None).await.unwrap();
        repo.add_word(&draft("brusque"), None).await.unwrap();

        let edited = word.edited(WordField::Definition, "quick and lively").unwrap();
        let edit = WordEdit::between(&word, &edited, WordField::Definition, editor, fixed_now());
        repo.apply_edit(&edited, &edit).await.unwrap();

        let clash = word.edited(WordField::Text, "Brusque").unwrap();
        let clash_edit = WordEdit::between(&word, &clash, WordField::Text, editor, fixed_now());
        assert!(matches!(
            repo.apply_edit(&clash, &clash_edit).await,
            Err(StorageError::Conflict)
        ));

        let history = repo.edit_history(word.id, 10).await.unwrap();
        assert_eq!(history, vec![edit]);
        assert_eq!(history[0].old_value.as_deref(), Some("meaning of brisk"));
        assert_eq!(repo.get_word(word.id).await.unwrap(), Some(edited));
    }
}
