use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::UserId;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionSummaryError {
    #[error("completed_at is before started_at")]
    InvalidTimeRange,

    #[error("reviewed ({reviewed}) does not match correct + incorrect ({sum})")]
    CountMismatch { reviewed: u32, sum: u32 },

    #[error("new words ({new_words}) exceed reviewed ({reviewed})")]
    TooManyNewWords { new_words: u32, reviewed: u32 },
}

/// Running tallies of one review session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionCounters {
    pub reviewed: u32,
    pub correct: u32,
    pub incorrect: u32,
    pub new_words: u32,
    /// Entries dropped because the word or its progress no longer resolved.
    pub skipped: u32,
}

impl SessionCounters {
    /// Counters after one committed rating.
    #[must_use]
    pub fn record(self, knew_it: bool, is_new: bool) -> Self {
        Self {
            reviewed: self.reviewed.saturating_add(1),
            correct: self.correct.saturating_add(u32::from(knew_it)),
            incorrect: self.incorrect.saturating_add(u32::from(!knew_it)),
            new_words: self.new_words.saturating_add(u32::from(is_new)),
            skipped: self.skipped,
        }
    }

    #[must_use]
    pub fn record_skip(self) -> Self {
        Self {
            skipped: self.skipped.saturating_add(1),
            ..self
        }
    }

    /// `correct / reviewed`, or 0 when nothing was reviewed.
    #[must_use]
    pub fn accuracy(&self) -> f64 {
        ratio(self.correct, self.reviewed)
    }
}

fn ratio(part: u32, whole: u32) -> f64 {
    if whole == 0 {
        0.0
    } else {
        f64::from(part) / f64::from(whole)
    }
}

/// Persisted record of a finished study session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSummary {
    user_id: UserId,
    started_at: DateTime<Utc>,
    completed_at: DateTime<Utc>,
    reviewed: u32,
    correct: u32,
    incorrect: u32,
    new_words: u32,
}

impl SessionSummary {
    /// Rehydrate a session summary from persisted storage.
    ///
    /// # Errors
    ///
    /// Returns `SessionSummaryError` if the time range or the tallies are inconsistent.
    #[allow(clippy::too_many_arguments)]
    pub fn from_persisted(
        user_id: UserId,
        started_at: DateTime<Utc>,
        completed_at: DateTime<Utc>,
        reviewed: u32,
        correct: u32,
        incorrect: u32,
        new_words: u32,
    ) -> Result<Self, SessionSummaryError> {
        if completed_at < started_at {
            return Err(SessionSummaryError::InvalidTimeRange);
        }
        let sum = correct.saturating_add(incorrect);
        if sum != reviewed {
            return Err(SessionSummaryError::CountMismatch { reviewed, sum });
        }
        if new_words > reviewed {
            return Err(SessionSummaryError::TooManyNewWords {
                new_words,
                reviewed,
            });
        }

        Ok(Self {
            user_id,
            started_at,
            completed_at,
            reviewed,
            correct,
            incorrect,
            new_words,
        })
    }

    /// Build a summary from the counters of a finished session.
    ///
    /// # Errors
    ///
    /// Returns `SessionSummaryError::InvalidTimeRange` if `completed_at` is before `started_at`.
    pub fn from_counters(
        user_id: UserId,
        started_at: DateTime<Utc>,
        completed_at: DateTime<Utc>,
        counters: &SessionCounters,
    ) -> Result<Self, SessionSummaryError> {
        Self::from_persisted(
            user_id,
            started_at,
            completed_at,
            counters.reviewed,
            counters.correct,
            counters.incorrect,
            counters.new_words,
        )
    }

    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn completed_at(&self) -> DateTime<Utc> {
        self.completed_at
    }

    #[must_use]
    pub fn reviewed(&self) -> u32 {
        self.reviewed
    }

    #[must_use]
    pub fn correct(&self) -> u32 {
        self.correct
    }

    #[must_use]
    pub fn incorrect(&self) -> u32 {
        self.incorrect
    }

    #[must_use]
    pub fn new_words(&self) -> u32 {
        self.new_words
    }

    #[must_use]
    pub fn accuracy(&self) -> f64 {
        ratio(self.correct, self.reviewed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    #[test]
    fn accuracy_of_three_out_of_four() {
        let counters = SessionCounters::default()
            .record(true, false)
            .record(true, true)
            .record(false, true)
            .record(true, false);

        assert_eq!(counters.reviewed, 4);
        assert_eq!(counters.correct, 3);
        assert_eq!(counters.incorrect, 1);
        assert_eq!(counters.new_words, 2);
        assert!((counters.accuracy() - 0.75).abs() < f64::EPSILON);
    }

    #[test]
    fn accuracy_is_zero_without_reviews() {
        assert_eq!(SessionCounters::default().accuracy(), 0.0);
    }

    #[test]
    fn skips_do_not_count_as_reviews() {
        let counters = SessionCounters::default().record_skip();
        assert_eq!(counters.skipped, 1);
        assert_eq!(counters.reviewed, 0);
    }

    #[test]
    fn summary_from_counters_keeps_tallies() {
        let counters = SessionCounters::default().record(true, true).record(false, false);
        let summary =
            SessionSummary::from_counters(UserId::new(5), fixed_now(), fixed_now(), &counters)
                .unwrap();

        assert_eq!(summary.reviewed(), 2);
        assert_eq!(summary.correct(), 1);
        assert_eq!(summary.incorrect(), 1);
        assert_eq!(summary.new_words(), 1);
        assert!((summary.accuracy() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn summary_rejects_inconsistent_rows() {
        let now = fixed_now();
        assert_eq!(
            SessionSummary::from_persisted(UserId::new(1), now, now, 3, 1, 1, 0).unwrap_err(),
            SessionSummaryError::CountMismatch { reviewed: 3, sum: 2 }
        );
        assert_eq!(
            SessionSummary::from_persisted(
                UserId::new(1),
                now,
                now - chrono::Duration::seconds(1),
                0,
                0,
                0,
                0
            )
            .unwrap_err(),
            SessionSummaryError::InvalidTimeRange
        );
    }
}
