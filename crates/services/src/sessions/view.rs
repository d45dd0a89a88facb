use chrono::{DateTime, Utc};
use std::sync::Arc;

use storage::repository::{SessionSummaryRepository, SessionSummaryRow};
use vocab_core::model::{SessionSummary, UserId};

use crate::error::SessionError;

/// Storage identifier for a persisted session summary.
///
/// NOTE: This is currently `i64` to match `SQLite` row IDs.
pub type SessionSummaryId = i64;

/// Presentation-agnostic list item for a session summary.
///
/// No pre-formatted strings; callers format timestamps and percentages.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSummaryListItem {
    pub id: SessionSummaryId,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,

    pub reviewed: u32,
    pub correct: u32,
    pub incorrect: u32,
    pub new_words: u32,
    pub accuracy: f64,
}

impl SessionSummaryListItem {
    #[must_use]
    pub fn from_summary(id: SessionSummaryId, summary: &SessionSummary) -> Self {
        Self {
            id,
            started_at: summary.started_at(),
            completed_at: summary.completed_at(),
            reviewed: summary.reviewed(),
            correct: summary.correct(),
            incorrect: summary.incorrect(),
            new_words: summary.new_words(),
            accuracy: summary.accuracy(),
        }
    }

    #[must_use]
    pub fn from_row(row: &SessionSummaryRow) -> Self {
        Self::from_summary(row.id, &row.summary)
    }
}

/// Read side of stored session summaries.
#[derive(Clone)]
pub struct SessionSummaryService {
    summaries: Arc<dyn SessionSummaryRepository>,
}

impl SessionSummaryService {
    #[must_use]
    pub fn new(summaries: Arc<dyn SessionSummaryRepository>) -> Self {
        Self { summaries }
    }

    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(Arc::new(storage::repository::InMemoryRepository::new()))
    }

    /// Most recent summaries for a user, newest first.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` on repository failures.
    pub async fn list_recent(
        &self,
        user_id: UserId,
        limit: u32,
    ) -> Result<Vec<SessionSummaryListItem>, SessionError> {
        let rows = self.summaries.list_summaries(user_id, limit).await?;
        Ok(rows.iter().map(SessionSummaryListItem::from_row).collect())
    }

    /// Fetch a session summary by ID.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` when the summary is missing or the
    /// repository fails.
    pub async fn get_summary(&self, id: SessionSummaryId) -> Result<SessionSummary, SessionError> {
        Ok(self.summaries.get_summary(id).await?)
    }
}
