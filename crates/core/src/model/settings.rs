use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_DAILY_WORD_LIMIT: u32 = 10;
pub const REMINDER_TIME_FORMAT: &str = "%H:%M";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SettingsError {
    #[error("daily word limit must be a positive integer")]
    NonPositiveDailyLimit,
    #[error("reminder time must be HH:MM (24-hour), got {0:?}")]
    InvalidReminderTime(String),
}

/// Per-user study preferences.
///
/// `daily_word_limit` is the capacity handed to batch selection.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSettings {
    daily_word_limit: u32,
    reminder_enabled: bool,
    reminder_time: NaiveTime,
}

/// Partial settings; missing fields fall back to defaults on validation.
#[derive(Clone, Debug, Default)]
pub struct UserSettingsDraft {
    pub daily_word_limit: Option<u32>,
    pub reminder_enabled: Option<bool>,
    pub reminder_time: Option<String>,
}

impl UserSettingsDraft {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and normalize the draft into persisted settings.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError` for a zero daily limit or a malformed reminder time.
    pub fn validate(self) -> Result<UserSettings, SettingsError> {
        let daily_word_limit = self.daily_word_limit.unwrap_or(DEFAULT_DAILY_WORD_LIMIT);
        if daily_word_limit == 0 {
            return Err(SettingsError::NonPositiveDailyLimit);
        }

        let reminder_time = match self.reminder_time {
            Some(raw) => parse_reminder_time(&raw)?,
            None => default_reminder_time(),
        };

        Ok(UserSettings {
            daily_word_limit,
            reminder_enabled: self.reminder_enabled.unwrap_or(true),
            reminder_time,
        })
    }
}

/// Parses a 24-hour `HH:MM` string.
///
/// # Errors
///
/// Returns `SettingsError::InvalidReminderTime` when the string does not match.
pub fn parse_reminder_time(raw: &str) -> Result<NaiveTime, SettingsError> {
    NaiveTime::parse_from_str(raw.trim(), REMINDER_TIME_FORMAT)
        .map_err(|_| SettingsError::InvalidReminderTime(raw.to_owned()))
}

fn default_reminder_time() -> NaiveTime {
    NaiveTime::from_hms_opt(9, 0, 0).unwrap_or(NaiveTime::MIN)
}

impl UserSettings {
    /// # Errors
    ///
    /// Returns `SettingsError` if the stored values no longer validate.
    pub fn from_persisted(
        daily_word_limit: u32,
        reminder_enabled: bool,
        reminder_time: &str,
    ) -> Result<Self, SettingsError> {
        UserSettingsDraft {
            daily_word_limit: Some(daily_word_limit),
            reminder_enabled: Some(reminder_enabled),
            reminder_time: Some(reminder_time.to_owned()),
        }
        .validate()
    }

    #[must_use]
    pub fn daily_word_limit(&self) -> u32 {
        self.daily_word_limit
    }

    #[must_use]
    pub fn reminder_enabled(&self) -> bool {
        self.reminder_enabled
    }

    #[must_use]
    pub fn reminder_time(&self) -> NaiveTime {
        self.reminder_time
    }

    /// Reminder time rendered as `HH:MM`.
    #[must_use]
    pub fn reminder_time_hhmm(&self) -> String {
        self.reminder_time.format(REMINDER_TIME_FORMAT).to_string()
    }

    /// # Errors
    ///
    /// Returns `SettingsError::NonPositiveDailyLimit` for zero.
    pub fn with_daily_word_limit(mut self, limit: u32) -> Result<Self, SettingsError> {
        if limit == 0 {
            return Err(SettingsError::NonPositiveDailyLimit);
        }
        self.daily_word_limit = limit;
        Ok(self)
    }

    #[must_use]
    pub fn with_reminder(mut self, enabled: bool, at: NaiveTime) -> Self {
        self.reminder_enabled = enabled;
        self.reminder_time = at;
        self
    }
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            daily_word_limit: DEFAULT_DAILY_WORD_LIMIT,
            reminder_enabled: true,
            reminder_time: default_reminder_time(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_draft_yields_defaults() {
        let settings = UserSettingsDraft::new().validate().unwrap();
        assert_eq!(settings, UserSettings::default());
        assert_eq!(settings.daily_word_limit(), 10);
        assert_eq!(settings.reminder_time_hhmm(), "09:00");
    }

    #[test]
    fn zero_limit_is_rejected() {
        let draft = UserSettingsDraft {
            daily_word_limit: Some(0),
            ..UserSettingsDraft::default()
        };
        assert_eq!(draft.validate().unwrap_err(), SettingsError::NonPositiveDailyLimit);
        assert!(UserSettings::default().with_daily_word_limit(0).is_err());
    }

    #[test]
    fn reminder_time_must_be_hhmm() {
        assert_eq!(parse_reminder_time("21:30").unwrap().to_string(), "21:30:00");
        assert!(matches!(
            parse_reminder_time("9pm"),
            Err(SettingsError::InvalidReminderTime(raw)) if raw == "9pm"
        ));
        assert!(parse_reminder_time("25:00").is_err());
    }
}
