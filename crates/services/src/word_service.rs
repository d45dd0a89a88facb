use std::sync::Arc;
use tracing::info;

use storage::repository::{StorageError, WordCatalog};
use vocab_core::model::{UserId, Word, WordDraft, WordEdit, WordField, WordId};

use crate::Clock;
use crate::error::WordServiceError;

/// Catalog management: add, edit, deactivate and browse words.
#[derive(Clone)]
pub struct WordService {
    clock: Clock,
    words: Arc<dyn WordCatalog>,
}

impl WordService {
    #[must_use]
    pub fn new(clock: Clock, words: Arc<dyn WordCatalog>) -> Self {
        Self { clock, words }
    }

    /// Validate and store a new word.
    ///
    /// # Errors
    ///
    /// Returns `WordServiceError::Word` for invalid input,
    /// `WordServiceError::Duplicate` if the text exists in any letter case.
    pub async fn add_word(
        &self,
        draft: WordDraft,
        added_by: Option<UserId>,
    ) -> Result<Word, WordServiceError> {
        let validated = draft.validate(self.clock.now())?;
        if self.words.find_by_text(&validated.text).await?.is_some() {
            return Err(WordServiceError::Duplicate {
                text: validated.text,
            });
        }

        let word = match self.words.add_word(&validated, added_by).await {
            Ok(word) => word,
            Err(StorageError::Conflict) => {
                return Err(WordServiceError::Duplicate {
                    text: validated.text,
                });
            }
            Err(err) => return Err(err.into()),
        };
        info!(word_id = %word.id, text = %word.text, "word added");
        Ok(word)
    }

    /// Replace one field of a word, re-validate it and record who changed
    /// what in the word's edit history.
    ///
    /// # Errors
    ///
    /// Returns `WordServiceError::NotFound` for an unknown id,
    /// `WordServiceError::Duplicate` if a text edit collides with another word.
    pub async fn edit_word(
        &self,
        id: WordId,
        field: WordField,
        value: impl Into<String>,
        edited_by: UserId,
    ) -> Result<Word, WordServiceError> {
        let current = self.get_word(id).await?;
        let edited = current.edited(field, value)?;
        let edit = WordEdit::between(&current, &edited, field, edited_by, self.clock.now());
        self.words
            .apply_edit(&edited, &edit)
            .await
            .map_err(|err| catalog_error(err, &edited))?;
        info!(word_id = %id, field = %field, edited_by = %edited_by, "word edited");
        Ok(edited)
    }

    /// Recorded edits of a word, newest first.
    ///
    /// # Errors
    ///
    /// Returns `WordServiceError::NotFound` for an unknown id.
    pub async fn edit_history(
        &self,
        id: WordId,
        limit: u32,
    ) -> Result<Vec<WordEdit>, WordServiceError> {
        self.get_word(id).await?;
        Ok(self.words.edit_history(id, limit).await?)
    }

    /// Hide a word from new-word selection. Existing progress is kept.
    ///
    /// # Errors
    ///
    /// Returns `WordServiceError::NotFound` for an unknown id.
    pub async fn deactivate_word(&self, id: WordId) -> Result<Word, WordServiceError> {
        let mut word = self.get_word(id).await?;
        if !word.is_active {
            return Ok(word);
        }
        word.is_active = false;
        self.store(&word).await?;
        info!(word_id = %id, "word deactivated");
        Ok(word)
    }

    /// # Errors
    ///
    /// Returns `WordServiceError::NotFound` for an unknown id.
    pub async fn get_word(&self, id: WordId) -> Result<Word, WordServiceError> {
        self.words
            .get_word(id)
            .await?
            .ok_or(WordServiceError::NotFound(id))
    }

    /// Words in catalog order, active or not.
    ///
    /// # Errors
    ///
    /// Returns `WordServiceError::Storage` on repository failures.
    pub async fn list_words(&self, limit: u32) -> Result<Vec<Word>, WordServiceError> {
        Ok(self.words.list_words(limit).await?)
    }

    async fn store(&self, word: &Word) -> Result<(), WordServiceError> {
        self.words
            .update_word(word)
            .await
            .map_err(|err| catalog_error(err, word))
    }
}

fn catalog_error(err: StorageError, word: &Word) -> WordServiceError {
    match err {
        StorageError::Conflict => WordServiceError::Duplicate {
            text: word.text.clone(),
        },
        StorageError::NotFound => WordServiceError::NotFound(word.id),
        err => err.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storage::repository::{InMemoryRepository, ProgressRepository};
    use vocab_core::model::WordError;
    use vocab_core::time::{fixed_clock, fixed_now};

    fn service(repo: &InMemoryRepository) -> WordService {
        WordService::new(fixed_clock(), Arc::new(repo.clone()))
    }

    #[tokio::test]
    async fn add_trims_and_rejects_case_duplicates() {
        let repo = InMemoryRepository::new();
        let svc = service(&repo);

        let word = svc
            .add_word(
                WordDraft::new("  Candid ", "truthful and straightforward").with_example("   "),
                Some(UserId::new(2)),
            )
            .await
            .unwrap();
        assert_eq!(word.text, "Candid");
        assert_eq!(word.example, None);
        assert_eq!(word.added_by, Some(UserId::new(2)));
        assert_eq!(word.created_at, fixed_now());

        let err = svc
            .add_word(WordDraft::new("candid", "again"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, WordServiceError::Duplicate { ref text } if text == "candid"));

        assert!(matches!(
            svc.add_word(WordDraft::new("", "x"), None).await,
            Err(WordServiceError::Word(WordError::EmptyText))
        ));
    }

    #[tokio::test]
    async fn edit_revalidates_and_detects_collisions() {
        let repo = InMemoryRepository::new();
        let svc = service(&repo);
        let a = svc.add_word(WordDraft::new("brisk", "quick"), None).await.unwrap();
        svc.add_word(WordDraft::new("brusque", "abrupt"), None).await.unwrap();

        let editor = UserId::new(7);

        let edited = svc
            .edit_word(a.id, WordField::Translation, "enérgico", editor)
            .await
            .unwrap();
        assert_eq!(edited.translation.as_deref(), Some("enérgico"));
        assert_eq!(svc.get_word(a.id).await.unwrap(), edited);

        assert!(matches!(
            svc.edit_word(a.id, WordField::Definition, "  ", editor).await,
            Err(WordServiceError::Word(WordError::EmptyDefinition))
        ));
        assert!(matches!(
            svc.edit_word(a.id, WordField::Text, "BRUSQUE", editor).await,
            Err(WordServiceError::Duplicate { .. })
        ));
        assert!(matches!(
            svc.edit_word(WordId::new(99), WordField::Text, "x", editor).await,
            Err(WordServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn edits_record_editor_with_old_and_new_values() {
        let repo = InMemoryRepository::new();
        let svc = service(&repo);
        let word = svc
            .add_word(WordDraft::new("brisk", "quick").with_translation("rápido"), None)
            .await
            .unwrap();

        svc.edit_word(word.id, WordField::Definition, "active and energetic", UserId::new(3))
            .await
            .unwrap();
        svc.edit_word(word.id, WordField::Translation, "   ", UserId::new(4))
            .await
            .unwrap();
        // Rejected edits leave no trace.
        let _ = svc
            .edit_word(word.id, WordField::Definition, "", UserId::new(5))
            .await
            .unwrap_err();

        let history = svc.edit_history(word.id, 10).await.unwrap();
        assert_eq!(history.len(), 2);

        assert_eq!(history[0].field, WordField::Translation);
        assert_eq!(history[0].edited_by, UserId::new(4));
        assert_eq!(history[0].old_value.as_deref(), Some("rápido"));
        assert_eq!(history[0].new_value, None);

        assert_eq!(history[1].field, WordField::Definition);
        assert_eq!(history[1].edited_by, UserId::new(3));
        assert_eq!(history[1].old_value.as_deref(), Some("quick"));
        assert_eq!(history[1].new_value.as_deref(), Some("active and energetic"));
        assert_eq!(history[1].edited_at, fixed_now());

        assert_eq!(svc.edit_history(word.id, 1).await.unwrap().len(), 1);
        assert!(matches!(
            svc.edit_history(WordId::new(42), 10).await,
            Err(WordServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn deactivated_words_leave_new_word_pool() {
        let repo = InMemoryRepository::new();
        let svc = service(&repo);
        let word = svc.add_word(WordDraft::new("moot", "debatable"), None).await.unwrap();

        let hidden = svc.deactivate_word(word.id).await.unwrap();
        assert!(!hidden.is_active);
        assert!(repo.unseen_words(UserId::new(1), 10).await.unwrap().is_empty());
        assert_eq!(svc.list_words(10).await.unwrap(), vec![hidden]);
    }
}
