use chrono::NaiveDate;
use tracing::debug;

use storage::repository::ProgressRepository;
use vocab_core::model::{ReviewOutcome, UserId, WordProgress};
use vocab_core::time::Clock;

use crate::error::ReviewServiceError;

/// Applies ratings to word progress using the Leitner model.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReviewService {
    clock: Clock,
}

impl ReviewService {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the clock (usually for deterministic testing).
    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Scheduling date according to the service's clock.
    #[must_use]
    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    /// Compute the record that results from applying `outcome` to `base`.
    ///
    /// `base` is the stored progress, or `None` for a word the user has never
    /// seen, in which case a first-exposure record is used. Nothing is written,
    /// so the same inputs always produce the same record.
    ///
    /// # Errors
    ///
    /// Returns `ReviewServiceError::Progress` if `base` belongs to another word.
    pub fn next_progress(
        &self,
        user_id: UserId,
        base: Option<&WordProgress>,
        outcome: &ReviewOutcome,
    ) -> Result<WordProgress, ReviewServiceError> {
        let today = self.today();
        let next = match base {
            Some(base) => base.after_review(outcome, today)?,
            None => WordProgress::first_exposure(user_id, outcome.word_id, today)
                .after_review(outcome, today)?,
        };
        Ok(next)
    }

    /// Load, apply and store one rating outside of a session.
    ///
    /// # Errors
    ///
    /// Returns `ReviewServiceError::Storage` if the read or the write fails.
    pub async fn review_persisted(
        &self,
        user_id: UserId,
        outcome: &ReviewOutcome,
        progress: &dyn ProgressRepository,
    ) -> Result<WordProgress, ReviewServiceError> {
        let base = progress.get_progress(user_id, outcome.word_id).await?;
        let next = self.next_progress(user_id, base.as_ref(), outcome)?;
        progress.upsert_progress(&next).await?;
        debug!(
            user_id = %user_id,
            word_id = %outcome.word_id,
            leitner_box = next.leitner_box().value(),
            due = %next.due_date(),
            "review stored"
        );
        Ok(next)
    }
}
