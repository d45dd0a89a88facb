use std::sync::Arc;

use storage::repository::Storage;

use crate::Clock;
use crate::config::TrainerConfig;
use crate::error::TrainerServicesError;
use crate::presentation::PresentationChannel;
use crate::review_service::ReviewService;
use crate::sessions::{SessionLoopService, SessionSummaryService};
use crate::settings_service::SettingsService;
use crate::stats_service::StatsService;
use crate::word_service::WordService;

/// Assembles the trainer's services over one storage backend.
#[derive(Clone)]
pub struct TrainerServices {
    review: ReviewService,
    session_loop: Arc<SessionLoopService>,
    session_summaries: Arc<SessionSummaryService>,
    words: Arc<WordService>,
    settings: Arc<SettingsService>,
    stats: Arc<StatsService>,
}

impl TrainerServices {
    #[must_use]
    pub fn new(
        storage: &Storage,
        config: &TrainerConfig,
        clock: Clock,
        channel: Arc<dyn PresentationChannel>,
    ) -> Self {
        let session_loop = SessionLoopService::new(
            clock,
            Arc::clone(&storage.words),
            Arc::clone(&storage.progress),
            Arc::clone(&storage.summaries),
            Arc::clone(&storage.settings),
            channel,
        )
        .with_shuffle_new(config.shuffle_new)
        .with_default_daily_limit(config.default_daily_limit);
        let settings = SettingsService::new(Arc::clone(&storage.settings))
            .with_default_daily_limit(config.default_daily_limit);

        Self {
            review: ReviewService::new().with_clock(clock),
            session_loop: Arc::new(session_loop),
            session_summaries: Arc::new(SessionSummaryService::new(Arc::clone(
                &storage.summaries,
            ))),
            words: Arc::new(WordService::new(clock, Arc::clone(&storage.words))),
            settings: Arc::new(settings),
            stats: Arc::new(StatsService::new(clock, Arc::clone(&storage.progress))),
        }
    }

    /// Build services backed by `SQLite` at `config.database_url`.
    ///
    /// # Errors
    ///
    /// Returns `TrainerServicesError` if storage initialization fails.
    pub async fn sqlite(
        config: &TrainerConfig,
        clock: Clock,
        channel: Arc<dyn PresentationChannel>,
    ) -> Result<Self, TrainerServicesError> {
        let storage = Storage::sqlite(&config.database_url).await?;
        Ok(Self::new(&storage, config, clock, channel))
    }

    #[must_use]
    pub fn in_memory(
        config: &TrainerConfig,
        clock: Clock,
        channel: Arc<dyn PresentationChannel>,
    ) -> Self {
        Self::new(&Storage::in_memory(), config, clock, channel)
    }

    #[must_use]
    pub fn review(&self) -> ReviewService {
        self.review
    }

    #[must_use]
    pub fn session_loop(&self) -> Arc<SessionLoopService> {
        Arc::clone(&self.session_loop)
    }

    #[must_use]
    pub fn session_summaries(&self) -> Arc<SessionSummaryService> {
        Arc::clone(&self.session_summaries)
    }

    #[must_use]
    pub fn words(&self) -> Arc<WordService> {
        Arc::clone(&self.words)
    }

    #[must_use]
    pub fn settings(&self) -> Arc<SettingsService> {
        Arc::clone(&self.settings)
    }

    #[must_use]
    pub fn stats(&self) -> Arc<StatsService> {
        Arc::clone(&self.stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vocab_core::model::{UserId, WordDraft};
    use vocab_core::time::fixed_clock;

    use crate::presentation::SilentChannel;

    #[tokio::test]
    async fn services_share_one_store() {
        let config = TrainerConfig {
            default_daily_limit: 1,
            ..TrainerConfig::default()
        };
        let services = TrainerServices::in_memory(&config, fixed_clock(), Arc::new(SilentChannel));
        let user = UserId::new(1);

        for text in ["one", "two"] {
            services
                .words()
                .add_word(WordDraft::new(text, "n."), None)
                .await
                .unwrap();
        }
        assert_eq!(services.settings().settings(user).await.unwrap().daily_word_limit(), 1);

        let loop_service = services.session_loop();
        let mut session = loop_service.start_session(user).await.unwrap();
        assert_eq!(session.state().batch().len(), 1);

        loop_service.answer_knowledge(&mut session, true).await.unwrap();
        let result = loop_service
            .rate_difficulty(&mut session, vocab_core::Difficulty::Normal)
            .await
            .unwrap();
        assert!(result.is_complete);

        let stats = services.stats().learning_stats(user).await.unwrap();
        assert_eq!(stats.total_words, 1);
        assert_eq!(stats.total_correct, 1);

        let recent = services.session_summaries().list_recent(user, 5).await.unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(Some(recent[0].id), result.summary_id);
    }
}
