//! SQLite storage backend for finvault
//!
//! ```rust,ignore
//! use finvault_storage_sqlite::SqliteStorage;
//!
//! let storage = SqliteStorage::connect("sqlite://finvault.db?mode=rwc").await?;
//! storage.migrate().await?;
//! let accounts = storage.accounts();
//! ```
pub mod migrations;
pub mod repositories;

use std::{str::FromStr, sync::Arc};

use finvault_core::{Error, error::StorageError};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

use crate::migrations::{MIGRATIONS, SqliteMigrationManager};
pub use repositories::SqliteAccountRepository;
pub use sqlx::SqlitePool;

pub struct SqliteStorage {
    pool: SqlitePool,
    accounts: Arc<SqliteAccountRepository>,
}

impl SqliteStorage {
    pub fn new(pool: SqlitePool) -> Self {
        let accounts = Arc::new(SqliteAccountRepository::new(pool.clone()));
        Self { pool, accounts }
    }

    /// Open a pool for `database_url`, creating the database file if needed.
    pub async fn connect(database_url: &str) -> Result<Self, Error> {
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(|e| {
                tracing::error!(error = %e, "Invalid SQLite connection string");
                StorageError::Connection(format!("Invalid SQLite connection string: {e}"))
            })?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .connect_with(options)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to connect to SQLite");
                StorageError::Connection("Failed to connect to SQLite".to_string())
            })?;

        Ok(Self::new(pool))
    }

    /// Bring the schema up to date. Safe to run repeatedly.
    pub async fn migrate(&self) -> Result<(), Error> {
        let manager = SqliteMigrationManager::new(self.pool.clone());
        manager.initialize().await.map_err(|e| {
            tracing::error!(error = %e, "Failed to initialize migrations");
            StorageError::Migration("Failed to initialize migrations".to_string())
        })?;

        let applied = manager.up(MIGRATIONS).await.map_err(|e| {
            tracing::error!(error = %e, "Failed to run migrations");
            StorageError::Migration(e.to_string())
        })?;

        if applied > 0 {
            tracing::info!(applied, "Database migrations applied");
        }
        Ok(())
    }

    pub fn accounts(&self) -> Arc<SqliteAccountRepository> {
        self.accounts.clone()
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}
