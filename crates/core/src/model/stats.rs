use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::leitner::LeitnerBox;
use crate::model::progress::WordProgress;

/// Aggregate learning statistics for one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearningStats {
    pub total_words: u32,
    pub mastered_words: u32,
    /// Word count per box, index 0 is box 1.
    pub box_distribution: [u32; 7],
    pub total_reviews: u32,
    pub total_correct: u32,
    pub total_incorrect: u32,
    /// Percentage, two decimals; 0 when there are no reviews.
    pub accuracy_percent: f64,
    pub due_today: u32,
}

impl LearningStats {
    #[must_use]
    pub fn from_progress<'a>(
        records: impl IntoIterator<Item = &'a WordProgress>,
        today: NaiveDate,
    ) -> Self {
        let mut stats = Self {
            total_words: 0,
            mastered_words: 0,
            box_distribution: [0; 7],
            total_reviews: 0,
            total_correct: 0,
            total_incorrect: 0,
            accuracy_percent: 0.0,
            due_today: 0,
        };

        // Tallies saturate at `u32::MAX`.
        for record in records {
            stats.total_words = stats.total_words.saturating_add(1);
            let slot = &mut stats.box_distribution[record.leitner_box().index()];
            *slot = slot.saturating_add(1);
            stats.total_reviews = stats.total_reviews.saturating_add(record.total_reviews());
            stats.total_correct = stats.total_correct.saturating_add(record.total_correct());
            stats.total_incorrect = stats
                .total_incorrect
                .saturating_add(record.total_incorrect());
            if record.is_due(today) {
                stats.due_today = stats.due_today.saturating_add(1);
            }
        }

        stats.mastered_words = stats.box_distribution[LeitnerBox::MASTERED.index()];
        if stats.total_reviews > 0 {
            let percent = f64::from(stats.total_correct) / f64::from(stats.total_reviews) * 100.0;
            stats.accuracy_percent = (percent * 100.0).round() / 100.0;
        }
        stats
    }

    /// Count of words sitting in `leitner_box`.
    #[must_use]
    pub fn in_box(&self, leitner_box: LeitnerBox) -> u32 {
        self.box_distribution[leitner_box.index()]
    }
}
