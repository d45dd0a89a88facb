use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::leitner::{self, Difficulty, LeitnerBox};
use crate::model::ids::{UserId, WordId};
use crate::model::review::ReviewOutcome;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum WordProgressError {
    #[error("total_correct ({correct}) exceeds total_reviews ({reviews})")]
    CorrectExceedsReviews { correct: u32, reviews: u32 },
    #[error("consecutive_correct ({consecutive}) exceeds total_correct ({correct})")]
    StreakExceedsCorrect { consecutive: u32, correct: u32 },
    #[error("outcome for word {outcome} applied to progress of word {progress}")]
    WordMismatch { outcome: WordId, progress: WordId },
}

/// Per-user, per-word Leitner state.
///
/// Created on first exposure (box 1, due the same day), then only ever replaced
/// by [`WordProgress::after_review`]. Rows are never deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordProgress {
    user_id: UserId,
    word_id: WordId,
    leitner_box: LeitnerBox,
    due_date: NaiveDate,
    consecutive_correct: u32,
    total_reviews: u32,
    total_correct: u32,
    last_difficulty: Option<Difficulty>,
    first_seen_on: NaiveDate,
    last_reviewed_on: Option<NaiveDate>,
}

impl WordProgress {
    /// Fresh record for a word the user has never seen.
    #[must_use]
    pub fn first_exposure(user_id: UserId, word_id: WordId, today: NaiveDate) -> Self {
        Self {
            user_id,
            word_id,
            leitner_box: LeitnerBox::FIRST,
            due_date: today,
            consecutive_correct: 0,
            total_reviews: 0,
            total_correct: 0,
            last_difficulty: None,
            first_seen_on: today,
            last_reviewed_on: None,
        }
    }

    /// Rehydrate a record from storage.
    ///
    /// # Errors
    ///
    /// Returns `WordProgressError` when the counters contradict each other.
    #[allow(clippy::too_many_arguments)]
    pub fn from_persisted(
        user_id: UserId,
        word_id: WordId,
        leitner_box: LeitnerBox,
        due_date: NaiveDate,
        consecutive_correct: u32,
        total_reviews: u32,
        total_correct: u32,
        last_difficulty: Option<Difficulty>,
        first_seen_on: NaiveDate,
        last_reviewed_on: Option<NaiveDate>,
    ) -> Result<Self, WordProgressError> {
        if total_correct > total_reviews {
            return Err(WordProgressError::CorrectExceedsReviews {
                correct: total_correct,
                reviews: total_reviews,
            });
        }
        if consecutive_correct > total_correct {
            return Err(WordProgressError::StreakExceedsCorrect {
                consecutive: consecutive_correct,
                correct: total_correct,
            });
        }

        Ok(Self {
            user_id,
            word_id,
            leitner_box,
            due_date,
            consecutive_correct,
            total_reviews,
            total_correct,
            last_difficulty,
            first_seen_on,
            last_reviewed_on,
        })
    }

    /// State after applying `outcome` on `today`.
    ///
    /// Pure: applying the same outcome to the same record always yields the same
    /// result, so a retried commit writes identical values.
    ///
    /// # Errors
    ///
    /// Returns `WordProgressError::WordMismatch` if the outcome is for another word.
    pub fn after_review(
        &self,
        outcome: &ReviewOutcome,
        today: NaiveDate,
    ) -> Result<Self, WordProgressError> {
        if outcome.word_id != self.word_id {
            return Err(WordProgressError::WordMismatch {
                outcome: outcome.word_id,
                progress: self.word_id,
            });
        }

        let next = leitner::next_state(self.leitner_box, outcome.knew_it, outcome.difficulty);

        let (consecutive_correct, total_correct) = if outcome.knew_it {
            (
                self.consecutive_correct.saturating_add(1),
                self.total_correct.saturating_add(1),
            )
        } else {
            (0, self.total_correct)
        };

        Ok(Self {
            leitner_box: next.new_box,
            due_date: next.due_date(today),
            consecutive_correct,
            total_reviews: self.total_reviews.saturating_add(1),
            total_correct,
            last_difficulty: Some(outcome.difficulty),
            last_reviewed_on: Some(today),
            ..self.clone()
        })
    }

    #[must_use]
    pub fn is_due(&self, today: NaiveDate) -> bool {
        self.due_date <= today
    }

    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    #[must_use]
    pub fn word_id(&self) -> WordId {
        self.word_id
    }

    #[must_use]
    pub fn leitner_box(&self) -> LeitnerBox {
        self.leitner_box
    }

    #[must_use]
    pub fn due_date(&self) -> NaiveDate {
        self.due_date
    }

    #[must_use]
    pub fn consecutive_correct(&self) -> u32 {
        self.consecutive_correct
    }

    #[must_use]
    pub fn total_reviews(&self) -> u32 {
        self.total_reviews
    }

    #[must_use]
    pub fn total_correct(&self) -> u32 {
        self.total_correct
    }

    #[must_use]
    pub fn total_incorrect(&self) -> u32 {
        self.total_reviews - self.total_correct
    }

    #[must_use]
    pub fn last_difficulty(&self) -> Option<Difficulty> {
        self.last_difficulty
    }

    #[must_use]
    pub fn first_seen_on(&self) -> NaiveDate {
        self.first_seen_on
    }

    #[must_use]
    pub fn last_reviewed_on(&self) -> Option<NaiveDate> {
        self.last_reviewed_on
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_today;
    use chrono::Duration;

    fn fresh() -> WordProgress {
        WordProgress::first_exposure(UserId::new(1), WordId::new(10), fixed_today())
    }

    #[test]
    fn first_exposure_is_box_one_due_today() {
        let p = fresh();
        assert_eq!(p.leitner_box(), LeitnerBox::FIRST);
        assert_eq!(p.due_date(), fixed_today());
        assert!(p.is_due(fixed_today()));
        assert_eq!(p.total_reviews(), 0);
    }

    #[test]
    fn correct_review_promotes_and_counts() {
        let outcome = ReviewOutcome::new(WordId::new(10), true, Difficulty::Normal);
        let p = fresh().after_review(&outcome, fixed_today()).unwrap();

        assert_eq!(p.leitner_box().value(), 2);
        assert_eq!(p.due_date(), fixed_today() + Duration::days(2));
        assert_eq!(p.consecutive_correct(), 1);
        assert_eq!(p.total_reviews(), 1);
        assert_eq!(p.total_correct(), 1);
        assert_eq!(p.last_difficulty(), Some(Difficulty::Normal));
        assert_eq!(p.last_reviewed_on(), Some(fixed_today()));
        assert_eq!(p.first_seen_on(), fixed_today());
    }

    #[test]
    fn failed_review_resets_box_and_streak_but_keeps_totals() {
        let good = ReviewOutcome::new(WordId::new(10), true, Difficulty::Easy);
        let bad = ReviewOutcome::new(WordId::new(10), false, Difficulty::Hard);

        let p = fresh()
            .after_review(&good, fixed_today())
            .and_then(|p| p.after_review(&good, fixed_today()))
            .and_then(|p| p.after_review(&bad, fixed_today()))
            .unwrap();

        assert_eq!(p.leitner_box(), LeitnerBox::FIRST);
        assert_eq!(p.due_date(), fixed_today() + Duration::days(1));
        assert_eq!(p.consecutive_correct(), 0);
        assert_eq!(p.total_reviews(), 3);
        assert_eq!(p.total_correct(), 2);
        assert_eq!(p.total_incorrect(), 1);
    }

    #[test]
    fn recomputing_from_same_base_is_idempotent() {
        let base = fresh();
        let outcome = ReviewOutcome::new(WordId::new(10), true, Difficulty::Hard);
        let once = base.after_review(&outcome, fixed_today()).unwrap();
        let retried = base.after_review(&outcome, fixed_today()).unwrap();
        assert_eq!(once, retried);
        assert_eq!(retried.leitner_box().value(), 2);
    }

    #[test]
    fn outcome_for_other_word_is_rejected() {
        let outcome = ReviewOutcome::new(WordId::new(11), true, Difficulty::Normal);
        assert!(matches!(
            fresh().after_review(&outcome, fixed_today()),
            Err(WordProgressError::WordMismatch { .. })
        ));
    }

    #[test]
    fn from_persisted_checks_counters() {
        let err = WordProgress::from_persisted(
            UserId::new(1),
            WordId::new(1),
            LeitnerBox::FIRST,
            fixed_today(),
            0,
            1,
            2,
            None,
            fixed_today(),
            None,
        )
        .unwrap_err();
        assert!(matches!(err, WordProgressError::CorrectExceedsReviews { .. }));
    }
}
