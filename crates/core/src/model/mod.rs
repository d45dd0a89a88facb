mod ids;
mod progress;
mod review;
mod session;
mod settings;
mod stats;
mod word;

pub use ids::{ParseIdError, UserId, WordId};

pub use progress::{WordProgress, WordProgressError};
pub use review::ReviewOutcome;
pub use session::{SessionCounters, SessionSummary, SessionSummaryError};
pub use settings::{
    DEFAULT_DAILY_WORD_LIMIT, SettingsError, UserSettings, UserSettingsDraft, parse_reminder_time,
};
pub use stats::LearningStats;
pub use word::{ValidatedWord, Word, WordDraft, WordEdit, WordError, WordField};
