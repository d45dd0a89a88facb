use std::sync::Arc;
use tracing::info;

use storage::repository::UserSettingsRepository;
use vocab_core::model::{UserId, UserSettings, parse_reminder_time};

use crate::error::SettingsServiceError;

#[derive(Clone)]
pub struct SettingsService {
    repo: Arc<dyn UserSettingsRepository>,
    defaults: UserSettings,
}

impl SettingsService {
    #[must_use]
    pub fn new(repo: Arc<dyn UserSettingsRepository>) -> Self {
        Self {
            repo,
            defaults: UserSettings::default(),
        }
    }

    /// Daily limit for users who never saved settings. Zero keeps the
    /// built-in default.
    #[must_use]
    pub fn with_default_daily_limit(mut self, limit: u32) -> Self {
        if let Ok(defaults) = self.defaults.clone().with_daily_word_limit(limit) {
            self.defaults = defaults;
        }
        self
    }

    /// Load persisted settings (or defaults if missing).
    ///
    /// # Errors
    ///
    /// Returns `SettingsServiceError` on storage failures.
    pub async fn settings(&self, user_id: UserId) -> Result<UserSettings, SettingsServiceError> {
        let settings = self.repo.get_settings(user_id).await?;
        Ok(settings.unwrap_or_else(|| self.defaults.clone()))
    }

    /// Validate and persist a new daily word limit.
    ///
    /// # Errors
    ///
    /// Returns `SettingsServiceError::Settings` for a zero limit, or a storage
    /// error if persistence fails.
    pub async fn set_daily_word_limit(
        &self,
        user_id: UserId,
        limit: u32,
    ) -> Result<UserSettings, SettingsServiceError> {
        let settings = self.settings(user_id).await?.with_daily_word_limit(limit)?;
        self.repo.save_settings(user_id, &settings).await?;
        info!(user_id = %user_id, limit, "daily word limit updated");
        Ok(settings)
    }

    /// Validate and persist the reminder preference. `at` is `HH:MM`.
    ///
    /// # Errors
    ///
    /// Returns `SettingsServiceError::Settings` for a malformed time, or a
    /// storage error if persistence fails.
    pub async fn set_reminder(
        &self,
        user_id: UserId,
        enabled: bool,
        at: &str,
    ) -> Result<UserSettings, SettingsServiceError> {
        let time = parse_reminder_time(at)?;
        let settings = self.settings(user_id).await?.with_reminder(enabled, time);
        self.repo.save_settings(user_id, &settings).await?;
        info!(user_id = %user_id, enabled, at = %settings.reminder_time_hhmm(), "reminder updated");
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storage::repository::InMemoryRepository;
    use vocab_core::model::{DEFAULT_DAILY_WORD_LIMIT, SettingsError};

    #[tokio::test]
    async fn defaults_until_saved() {
        let svc = SettingsService::new(Arc::new(InMemoryRepository::new()));
        let settings = svc.settings(UserId::new(1)).await.unwrap();
        assert_eq!(settings.daily_word_limit(), DEFAULT_DAILY_WORD_LIMIT);
        assert!(settings.reminder_enabled());
        assert_eq!(settings.reminder_time_hhmm(), "09:00");

        let svc = svc.with_default_daily_limit(25);
        assert_eq!(svc.settings(UserId::new(1)).await.unwrap().daily_word_limit(), 25);
    }

    #[tokio::test]
    async fn updates_validate_and_persist() {
        let repo = InMemoryRepository::new();
        let svc = SettingsService::new(Arc::new(repo.clone()));
        let user = UserId::new(3);

        assert!(matches!(
            svc.set_daily_word_limit(user, 0).await,
            Err(SettingsServiceError::Settings(SettingsError::NonPositiveDailyLimit))
        ));
        assert!(matches!(
            svc.set_reminder(user, true, "25:00").await,
            Err(SettingsServiceError::Settings(SettingsError::InvalidReminderTime(_)))
        ));
        assert!(repo.get_settings(user).await.unwrap().is_none());

        svc.set_daily_word_limit(user, 4).await.unwrap();
        let saved = svc.set_reminder(user, false, "07:30").await.unwrap();
        assert_eq!(saved.daily_word_limit(), 4);
        assert_eq!(repo.get_settings(user).await.unwrap(), Some(saved));
    }
}
