//! Schema migrations
//!
//! Each migration runs once, inside its own transaction, and is recorded by
//! version in the `finvault_migrations` table.

use chrono::Utc;
use sqlx::SqlitePool;
use thiserror::Error;

const MIGRATION_TABLE: &str = "finvault_migrations";

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration {version} ({name}) failed: {source}")]
    Failed {
        version: i64,
        name: &'static str,
        source: sqlx::Error,
    },
}

#[derive(Debug, Clone, Copy)]
pub struct Migration {
    pub version: i64,
    pub name: &'static str,
    up: &'static str,
}

pub const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "CreateAccountsTable",
        up: r#"
            CREATE TABLE IF NOT EXISTS accounts (
                id TEXT PRIMARY KEY,
                email TEXT NOT NULL,
                username TEXT NOT NULL,
                first_name TEXT,
                last_name TEXT,
                role TEXT NOT NULL DEFAULT 'customer',
                credential_hash TEXT NOT NULL,
                account_status TEXT NOT NULL DEFAULT 'active',
                failed_attempt_count INTEGER NOT NULL DEFAULT 0,
                last_failed_attempt_at INTEGER,
                otp_code TEXT,
                otp_expires_at INTEGER,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL,
                UNIQUE(email),
                UNIQUE(username),
                CHECK (account_status IN ('active', 'locked')),
                CHECK ((otp_code IS NULL) = (otp_expires_at IS NULL))
            );"#,
    },
    Migration {
        version: 2,
        name: "CreateAccountStatusIndex",
        up: "CREATE INDEX IF NOT EXISTS idx_accounts_status ON accounts(account_status);",
    },
    Migration {
        version: 3,
        name: "AddAccountMiddleName",
        up: "ALTER TABLE accounts ADD COLUMN middle_name TEXT;",
    },
];

pub struct SqliteMigrationManager {
    pool: SqlitePool,
}

impl SqliteMigrationManager {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn initialize(&self) -> Result<(), MigrationError> {
        sqlx::query(&format!(
            r#"
            CREATE TABLE IF NOT EXISTS {MIGRATION_TABLE} (
                version INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                applied_at INTEGER NOT NULL DEFAULT (unixepoch())
            );"#
        ))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Apply every migration not yet recorded. Returns how many ran.
    pub async fn up(&self, migrations: &[Migration]) -> Result<usize, MigrationError> {
        let mut applied = 0;
        for migration in migrations {
            if self.is_applied(migration.version).await? {
                continue;
            }

            tracing::info!(
                version = migration.version,
                name = migration.name,
                "Applying migration"
            );

            let mut tx = self.pool.begin().await?;
            sqlx::query(migration.up)
                .execute(&mut *tx)
                .await
                .map_err(|source| MigrationError::Failed {
                    version: migration.version,
                    name: migration.name,
                    source,
                })?;

            sqlx::query(&format!(
                "INSERT INTO {MIGRATION_TABLE} (version, name, applied_at) VALUES (?, ?, ?)"
            ))
            .bind(migration.version)
            .bind(migration.name)
            .bind(Utc::now().timestamp())
            .execute(&mut *tx)
            .await?;

            tx.commit().await?;
            applied += 1;
        }
        Ok(applied)
    }

    pub async fn applied_versions(&self) -> Result<Vec<i64>, MigrationError> {
        let versions = sqlx::query_scalar(&format!(
            "SELECT version FROM {MIGRATION_TABLE} ORDER BY version"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(versions)
    }

    async fn is_applied(&self, version: i64) -> Result<bool, MigrationError> {
        let applied: bool = sqlx::query_scalar(&format!(
            "SELECT EXISTS(SELECT 1 FROM {MIGRATION_TABLE} WHERE version = ?)"
        ))
        .bind(version)
        .fetch_one(&self.pool)
        .await?;
        Ok(applied)
    }
}
