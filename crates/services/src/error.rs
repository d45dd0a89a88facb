//! Shared error types for the services crate.

use thiserror::Error;

use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;
use vocab_core::LeitnerError;
use vocab_core::model::{
    SessionSummaryError, SettingsError, WordError, WordId, WordProgressError,
};

use crate::presentation::ChannelError;

/// Errors emitted by `ReviewService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ReviewServiceError {
    #[error(transparent)]
    Progress(#[from] WordProgressError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by session services.
///
/// Rejected signals leave the session exactly as it was. A failed commit keeps
/// the session in its rating step with the computed record, so the caller can
/// retry with `commit_pending`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("{signal} signal is not accepted while {phase}")]
    UnexpectedSignal {
        signal: &'static str,
        phase: &'static str,
    },
    #[error(transparent)]
    Leitner(#[from] LeitnerError),
    #[error("failed to commit progress for word {word_id}")]
    CommitFailed { word_id: WordId, source: StorageError },
    #[error("presentation channel failed")]
    Presentation(#[source] ChannelError),
    #[error(transparent)]
    Review(#[from] ReviewServiceError),
    #[error(transparent)]
    Summary(#[from] SessionSummaryError),
    #[error(transparent)]
    Settings(#[from] SettingsServiceError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl SessionError {
    /// True when repeating the same call may succeed: a failed progress commit
    /// or a failed summary write.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, SessionError::CommitFailed { .. } | SessionError::Storage(_))
    }
}

/// Errors emitted by `WordService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum WordServiceError {
    #[error("word {text:?} already exists")]
    Duplicate { text: String },
    #[error("word {0} not found")]
    NotFound(WordId),
    #[error(transparent)]
    Word(#[from] WordError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `SettingsService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SettingsServiceError {
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `StatsService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StatsServiceError {
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while bootstrapping trainer services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TrainerServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
}
