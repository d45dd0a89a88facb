#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod presentation;
pub mod review_service;
pub mod sessions;
pub mod settings_service;
pub mod stats_service;
pub mod trainer_services;
pub mod word_service;

pub use vocab_core::Clock;
pub use sessions as session;

pub use config::TrainerConfig;
pub use error::{
    ReviewServiceError, SessionError, SettingsServiceError, StatsServiceError,
    TrainerServicesError, WordServiceError,
};
pub use presentation::{
    ChannelError, PresentationChannel, SessionReport, SilentChannel, WordPrompt,
};
pub use review_service::ReviewService;
pub use settings_service::SettingsService;
pub use stats_service::StatsService;
pub use trainer_services::TrainerServices;
pub use word_service::WordService;

pub use sessions::{
    CommitResult, ReviewSelector, ReviewSession, SessionLoopService, SessionPhase,
    SessionSummaryId, SessionSummaryListItem, SessionSummaryService,
};
