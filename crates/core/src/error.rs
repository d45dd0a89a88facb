use thiserror::Error;

use crate::leitner::LeitnerError;
use crate::model::{SessionSummaryError, SettingsError, WordError, WordProgressError};

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Leitner(#[from] LeitnerError),
    #[error(transparent)]
    Word(#[from] WordError),
    #[error(transparent)]
    Progress(#[from] WordProgressError),
    #[error(transparent)]
    SessionSummary(#[from] SessionSummaryError),
    #[error(transparent)]
    Settings(#[from] SettingsError),
}
