use std::sync::Arc;

use storage::repository::ProgressRepository;
use vocab_core::model::{LearningStats, UserId};

use crate::Clock;
use crate::error::StatsServiceError;

#[derive(Clone)]
pub struct StatsService {
    clock: Clock,
    progress: Arc<dyn ProgressRepository>,
}

impl StatsService {
    #[must_use]
    pub fn new(clock: Clock, progress: Arc<dyn ProgressRepository>) -> Self {
        Self { clock, progress }
    }

    /// Aggregate every progress record of `user_id` as of today.
    ///
    /// # Errors
    ///
    /// Returns `StatsServiceError::Storage` on repository failures.
    pub async fn learning_stats(
        &self,
        user_id: UserId,
    ) -> Result<LearningStats, StatsServiceError> {
        let records = self.progress.all_progress(user_id).await?;
        Ok(LearningStats::from_progress(&records, self.clock.today()))
    }
}
