use chrono::NaiveDate;
use rand::rng;
use rand::seq::SliceRandom;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

use storage::repository::{ProgressRepository, StorageError};
use vocab_core::model::{UserId, Word, WordId, WordProgress};

use super::machine::SessionBatch;

/// Words picked for one session: due reviews first, then never-seen words.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Selection {
    pub due: Vec<WordProgress>,
    pub new: Vec<Word>,
}

impl Selection {
    /// Total number of words in this selection.
    #[must_use]
    pub fn total(&self) -> usize {
        self.due.len() + self.new.len()
    }

    /// Returns true when nothing was selected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.due.is_empty() && self.new.is_empty()
    }

    /// Ordered batch of ids: the review segment followed by the new segment.
    #[must_use]
    pub fn batch(&self) -> SessionBatch {
        SessionBatch::new(
            self.due.iter().map(WordProgress::word_id),
            self.new.iter().map(|w| w.id),
        )
    }
}

/// Picks due and new words for a session of at most `capacity` words.
pub struct BatchBuilder {
    capacity: usize,
    shuffle_new: bool,
}

impl BatchBuilder {
    #[must_use]
    pub fn new(capacity: u32) -> Self {
        Self {
            capacity: usize::try_from(capacity).unwrap_or(usize::MAX),
            shuffle_new: false,
        }
    }

    /// Enable or disable shuffling among new words before selection.
    #[must_use]
    pub fn with_shuffle_new(mut self, shuffle: bool) -> Self {
        self.shuffle_new = shuffle;
        self
    }

    /// Build a selection from storage-provided lists of due and unseen words.
    ///
    /// - `due` is sorted by due date, then box, then word id, and truncated to capacity.
    /// - `new` fills the remaining room, in catalog order unless shuffling is on.
    pub fn build(
        self,
        due: impl IntoIterator<Item = WordProgress>,
        new: impl IntoIterator<Item = Word>,
    ) -> Selection {
        let mut due: Vec<WordProgress> = due.into_iter().collect();
        due.sort_by_key(|p| (p.due_date(), p.leitner_box(), p.word_id()));
        due.truncate(self.capacity);

        let remaining = self.capacity.saturating_sub(due.len());
        if remaining == 0 {
            return Selection {
                due,
                new: Vec::new(),
            };
        }

        let due_ids: HashSet<WordId> = due.iter().map(WordProgress::word_id).collect();
        let mut candidates: Vec<Word> = new
            .into_iter()
            .filter(|w| w.is_active && !due_ids.contains(&w.id))
            .collect();

        if self.shuffle_new {
            let mut rng = rng();
            candidates.as_mut_slice().shuffle(&mut rng);
        } else {
            candidates.sort_by_key(|w| (w.created_at, w.id));
        }
        candidates.truncate(remaining);

        Selection {
            due,
            new: candidates,
        }
    }
}

/// Read-only query producing the batch for a user's next session.
#[derive(Clone)]
pub struct ReviewSelector {
    progress: Arc<dyn ProgressRepository>,
    shuffle_new: bool,
}

impl ReviewSelector {
    #[must_use]
    pub fn new(progress: Arc<dyn ProgressRepository>) -> Self {
        Self {
            progress,
            shuffle_new: false,
        }
    }

    #[must_use]
    pub fn with_shuffle_new(mut self, shuffle_new: bool) -> Self {
        self.shuffle_new = shuffle_new;
        self
    }

    /// Select up to `capacity` words for `user_id` as of `today`.
    ///
    /// A capacity of 0 yields an empty selection without touching the store.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if either store query fails.
    pub async fn select_batch(
        &self,
        user_id: UserId,
        capacity: u32,
        today: NaiveDate,
    ) -> Result<Selection, StorageError> {
        if capacity == 0 {
            return Ok(Selection::default());
        }

        let due = self.progress.due_progress(user_id, today, capacity).await?;
        let room = capacity.saturating_sub(u32::try_from(due.len()).unwrap_or(u32::MAX));
        let new = if room > 0 {
            self.progress.unseen_words(user_id, room).await?
        } else {
            Vec::new()
        };

        let selection = BatchBuilder::new(capacity)
            .with_shuffle_new(self.shuffle_new)
            .build(due, new);
        debug!(
            user_id = %user_id,
            capacity,
            due = selection.due.len(),
            new = selection.new.len(),
            "selected batch"
        );
        Ok(selection)
    }
}
