use tracing::warn;

use vocab_core::model::DEFAULT_DAILY_WORD_LIMIT;

pub const DB_URL_VAR: &str = "VOCAB_DB_URL";
pub const DEFAULT_DAILY_LIMIT_VAR: &str = "VOCAB_DEFAULT_DAILY_LIMIT";
pub const SHUFFLE_NEW_VAR: &str = "VOCAB_SHUFFLE_NEW";

pub const DEFAULT_DB_URL: &str = "sqlite:vocab.sqlite3";

/// Process-level trainer configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainerConfig {
    pub database_url: String,
    /// Daily limit for users who never saved their own settings.
    pub default_daily_limit: u32,
    /// Shuffle the never-seen words instead of taking them in catalog order.
    pub shuffle_new: bool,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DB_URL.to_owned(),
            default_daily_limit: DEFAULT_DAILY_WORD_LIMIT,
            shuffle_new: false,
        }
    }
}

impl TrainerConfig {
    /// Create config from environment variables.
    ///
    /// Reads:
    /// - `VOCAB_DB_URL` (default: `sqlite:vocab.sqlite3`)
    /// - `VOCAB_DEFAULT_DAILY_LIMIT` (default: 10)
    /// - `VOCAB_SHUFFLE_NEW` (default: false)
    ///
    /// Unparseable values are logged and replaced by the default.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`TrainerConfig::from_env`] with a custom variable source.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(url) = lookup(DB_URL_VAR) {
            if url.trim().is_empty() {
                warn!(var = DB_URL_VAR, "empty database url, using default");
            } else {
                config.database_url = url;
            }
        }

        if let Some(raw) = lookup(DEFAULT_DAILY_LIMIT_VAR) {
            match raw.trim().parse::<u32>() {
                Ok(limit) if limit > 0 => config.default_daily_limit = limit,
                _ => warn!(
                    var = DEFAULT_DAILY_LIMIT_VAR,
                    value = %raw,
                    "expected a positive integer, using default"
                ),
            }
        }

        if let Some(raw) = lookup(SHUFFLE_NEW_VAR) {
            match parse_flag(&raw) {
                Some(flag) => config.shuffle_new = flag,
                None => warn!(
                    var = SHUFFLE_NEW_VAR,
                    value = %raw,
                    "expected a boolean, using default"
                ),
            }
        }

        config
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn missing_vars_use_defaults() {
        let config = TrainerConfig::from_lookup(lookup(&[]));
        assert_eq!(config, TrainerConfig::default());
        assert_eq!(config.default_daily_limit, 10);
        assert_eq!(config.database_url, "sqlite:vocab.sqlite3");
    }

    #[test]
    fn reads_all_vars() {
        let config = TrainerConfig::from_lookup(lookup(&[
            (DB_URL_VAR, "sqlite::memory:"),
            (DEFAULT_DAILY_LIMIT_VAR, " 25 "),
            (SHUFFLE_NEW_VAR, "Yes"),
        ]));
        assert_eq!(config.database_url, "sqlite::memory:");
        assert_eq!(config.default_daily_limit, 25);
        assert!(config.shuffle_new);
    }

    #[test]
    fn invalid_values_fall_back() {
        let config = TrainerConfig::from_lookup(lookup(&[
            (DB_URL_VAR, "  "),
            (DEFAULT_DAILY_LIMIT_VAR, "0"),
            (SHUFFLE_NEW_VAR, "maybe"),
        ]));
        assert_eq!(config, TrainerConfig::default());
    }
}
