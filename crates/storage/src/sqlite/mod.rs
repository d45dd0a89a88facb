use std::sync::Arc;
use std::time::Duration;

use sqlx::{SqlitePool, sqlite::SqlitePoolOptions};
use thiserror::Error;
use tracing::debug;

use crate::repository::Storage;

mod mapping;
mod migrate;
mod progress_repo;
mod session_summary_repo;
mod settings_repo;
mod word_repo;

/// Pragmas applied to every pooled connection.
const CONNECTION_PRAGMAS: [&str; 3] = [
    "PRAGMA foreign_keys = ON;",
    "PRAGMA journal_mode = WAL;",
    "PRAGMA busy_timeout = 5000;",
];

/// Word catalog, progress, summaries and settings in one `SQLite` database.
#[derive(Clone)]
pub struct SqliteRepository {
    pool: SqlitePool,
}

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SqliteInitError {
    #[error("database url is empty")]
    EmptyUrl,
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Pool sizing for [`SqliteRepository::connect_with`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolSettings {
    pub max_connections: u32,
    pub acquire_timeout: Duration,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            max_connections: 5,
            acquire_timeout: Duration::from_secs(5),
        }
    }
}

impl SqliteRepository {
    /// Connect with default pool settings.
    ///
    /// # Errors
    ///
    /// Returns `SqliteInitError` if the url is empty or a connection (or one
    /// of its pragmas) fails.
    pub async fn connect(database_url: &str) -> Result<Self, SqliteInitError> {
        Self::connect_with(database_url, PoolSettings::default()).await
    }

    /// # Errors
    ///
    /// Same as [`SqliteRepository::connect`].
    pub async fn connect_with(
        database_url: &str,
        settings: PoolSettings,
    ) -> Result<Self, SqliteInitError> {
        if database_url.trim().is_empty() {
            return Err(SqliteInitError::EmptyUrl);
        }

        let pool = SqlitePoolOptions::new()
            .max_connections(settings.max_connections)
            .acquire_timeout(settings.acquire_timeout)
            .after_connect(|conn, _meta| {
                Box::pin(async move {
                    for pragma in CONNECTION_PRAGMAS {
                        sqlx::query(pragma).execute(&mut *conn).await?;
                    }
                    Ok(())
                })
            })
            .connect(database_url)
            .await?;
        debug!(
            database_url,
            max_connections = settings.max_connections,
            "sqlite pool ready"
        );
        Ok(Self { pool })
    }

    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Apply pending schema migrations.
    ///
    /// # Errors
    ///
    /// Returns `SqliteInitError` if a migration query fails.
    pub async fn migrate(&self) -> Result<(), SqliteInitError> {
        migrate::run_migrations(&self.pool).await
    }

    /// Every repository trait served by this one pool.
    #[must_use]
    pub fn into_storage(self) -> Storage {
        let repo = Arc::new(self);
        Storage {
            progress: repo.clone(),
            words: repo.clone(),
            summaries: repo.clone(),
            settings: repo,
        }
    }
}

impl Storage {
    /// Connect to `SQLite`, migrate, and expose it through every repository.
    ///
    /// # Errors
    ///
    /// Returns `SqliteInitError` if connection or migrations cannot be
    /// completed.
    pub async fn sqlite(database_url: &str) -> Result<Self, SqliteInitError> {
        let repo = SqliteRepository::connect(database_url).await?;
        repo.migrate().await?;
        Ok(repo.into_storage())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::{UserSettingsRepository, WordCatalog};

    #[test]
    fn repository_can_back_shared_trait_objects() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SqliteRepository>();
    }

    #[tokio::test]
    async fn empty_url_is_rejected_before_connecting() {
        assert!(matches!(
            SqliteRepository::connect("  ").await,
            Err(SqliteInitError::EmptyUrl)
        ));
    }

    #[tokio::test]
    async fn storage_reaches_one_database_through_every_trait() {
        let storage = Storage::sqlite("sqlite:file:memdb_storage?mode=memory&cache=shared")
            .await
            .unwrap();
        assert!(storage.words.list_words(10).await.unwrap().is_empty());
        assert!(
            storage
                .settings
                .get_settings(vocab_core::model::UserId::new(1))
                .await
                .unwrap()
                .is_none()
        );
    }
}
