//! Builder for [`Finvault`] instances
//!
//! Storage must be chosen before anything can be built; the builder's type
//! parameter tracks whether it has been.
//!
//! # Example
//!
//! ```rust,no_run
//! use finvault::{FinvaultBuilder, SecurityConfig};
//! use chrono::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let finvault = FinvaultBuilder::new()
//!     .with_sqlite("sqlite://finvault.db")
//!     .await?
//!     .with_config(SecurityConfig {
//!         max_failed_attempts: 5,
//!         lockout_duration: Duration::minutes(15),
//!         ..SecurityConfig::default()
//!     })
//!     .apply_migrations(true)
//!     .build()
//!     .await?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use finvault_core::{AccountRepository, Clock, Notifier, SecurityConfig, SystemClock, TracingNotifier};

use crate::Finvault;

#[cfg(feature = "mailer")]
use crate::MailerConfig;

/// Errors that can occur when building a [`Finvault`] instance.
#[derive(Debug, thiserror::Error)]
pub enum FinvaultBuilderError {
    #[error("Storage connection failed: {0}")]
    StorageConnection(String),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[cfg(feature = "mailer")]
    #[error("Mailer configuration failed: {0}")]
    MailerConfiguration(String),
}

/// No storage configured yet.
pub struct NoStorage;

/// Storage configured.
pub struct WithStorage<R: AccountRepository> {
    repository: Arc<R>,
    #[cfg(feature = "sqlite")]
    sqlite: Option<crate::SqliteStorage>,
}

pub struct FinvaultBuilder<Storage> {
    storage: Storage,
    config: SecurityConfig,
    notifier: Option<Arc<dyn Notifier>>,
    clock: Arc<dyn Clock>,
    apply_migrations: bool,
    #[cfg(feature = "mailer")]
    mailer_config: Option<MailerConfig>,
}

impl Default for FinvaultBuilder<NoStorage> {
    fn default() -> Self {
        Self::new()
    }
}

impl FinvaultBuilder<NoStorage> {
    /// A builder with the default [`SecurityConfig`], the system clock and
    /// notifications written to the log.
    pub fn new() -> Self {
        Self {
            storage: NoStorage,
            config: SecurityConfig::default(),
            notifier: None,
            clock: Arc::new(SystemClock),
            apply_migrations: false,
            #[cfg(feature = "mailer")]
            mailer_config: None,
        }
    }

    /// Use any [`AccountRepository`], for example
    /// [`InMemoryAccountRepository`](crate::InMemoryAccountRepository).
    pub fn with_repository<R: AccountRepository>(
        self,
        repository: Arc<R>,
    ) -> FinvaultBuilder<WithStorage<R>> {
        self.with_storage(WithStorage {
            repository,
            #[cfg(feature = "sqlite")]
            sqlite: None,
        })
    }

    fn with_storage<R: AccountRepository>(
        self,
        storage: WithStorage<R>,
    ) -> FinvaultBuilder<WithStorage<R>> {
        FinvaultBuilder {
            storage,
            config: self.config,
            notifier: self.notifier,
            clock: self.clock,
            apply_migrations: self.apply_migrations,
            #[cfg(feature = "mailer")]
            mailer_config: self.mailer_config,
        }
    }
}

#[cfg(feature = "sqlite")]
impl FinvaultBuilder<NoStorage> {
    /// Connect to SQLite at `url` ("sqlite::memory:" or "sqlite://path/to/db").
    pub async fn with_sqlite(
        self,
        url: &str,
    ) -> Result<FinvaultBuilder<WithStorage<crate::sqlite::SqliteAccountRepository>>, FinvaultBuilderError>
    {
        let storage = crate::SqliteStorage::connect(url)
            .await
            .map_err(|e| FinvaultBuilderError::StorageConnection(e.to_string()))?;

        Ok(self.with_sqlite_storage(storage))
    }

    /// Share an existing SQLite pool.
    pub fn with_sqlite_pool(
        self,
        pool: finvault_storage_sqlite::SqlitePool,
    ) -> FinvaultBuilder<WithStorage<crate::sqlite::SqliteAccountRepository>> {
        self.with_sqlite_storage(crate::SqliteStorage::new(pool))
    }

    fn with_sqlite_storage(
        self,
        storage: crate::SqliteStorage,
    ) -> FinvaultBuilder<WithStorage<crate::sqlite::SqliteAccountRepository>> {
        self.with_storage(WithStorage {
            repository: storage.accounts(),
            sqlite: Some(storage),
        })
    }
}

impl<S> FinvaultBuilder<S> {
    pub fn with_config(mut self, config: SecurityConfig) -> Self {
        self.config = config;
        self
    }

    /// Deliver passcodes and lockout notices through `notifier`.
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Apply database migrations during [`build`](FinvaultBuilder::build).
    ///
    /// Default: false. Only SQLite storage has migrations.
    pub fn apply_migrations(mut self, apply: bool) -> Self {
        self.apply_migrations = apply;
        self
    }

    /// Email passcodes and lockout notices. Ignored if a notifier was set
    /// with [`with_notifier`](FinvaultBuilder::with_notifier).
    #[cfg(feature = "mailer")]
    pub fn with_mailer(mut self, config: MailerConfig) -> Self {
        self.mailer_config = Some(config);
        self
    }
}

impl<R: AccountRepository> FinvaultBuilder<WithStorage<R>> {
    pub async fn build(self) -> Result<Finvault<R>, FinvaultBuilderError> {
        self.config
            .validate()
            .map_err(|e| FinvaultBuilderError::InvalidConfiguration(e.to_string()))?;

        if self.apply_migrations {
            self.migrate().await?;
        }

        let notifier = self.resolve_notifier()?;

        Ok(Finvault::from_parts(
            self.storage.repository,
            self.config,
            notifier,
            self.clock,
        ))
    }

    async fn migrate(&self) -> Result<(), FinvaultBuilderError> {
        #[cfg(feature = "sqlite")]
        if let Some(storage) = &self.storage.sqlite {
            return storage
                .migrate()
                .await
                .map_err(|e| FinvaultBuilderError::Migration(e.to_string()));
        }

        Err(FinvaultBuilderError::InvalidConfiguration(
            "this storage backend has no migrations".to_string(),
        ))
    }

    fn resolve_notifier(&self) -> Result<Arc<dyn Notifier>, FinvaultBuilderError> {
        if let Some(notifier) = &self.notifier {
            return Ok(notifier.clone());
        }

        #[cfg(feature = "mailer")]
        if let Some(config) = &self.mailer_config {
            let notifier = crate::MailerNotifier::new(config.clone())
                .map_err(|e| FinvaultBuilderError::MailerConfiguration(e.to_string()))?;
            return Ok(Arc::new(notifier));
        }

        Ok(Arc::new(TracingNotifier))
    }
}
