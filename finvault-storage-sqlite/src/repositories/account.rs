//! SQLite implementation of the account repository.
//!
//! Timestamps are stored as unix milliseconds.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use finvault_core::{
    Account, AccountId, AccountStatus, CredentialHash, Error, PendingOtp, Role,
    error::StorageError, repositories::AccountRepository,
};
use sqlx::SqlitePool;

pub struct SqliteAccountRepository {
    pool: SqlitePool,
}

impl SqliteAccountRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct SqliteAccount {
    id: String,
    email: String,
    username: String,
    first_name: Option<String>,
    middle_name: Option<String>,
    last_name: Option<String>,
    role: String,
    credential_hash: String,
    account_status: String,
    failed_attempt_count: i64,
    last_failed_attempt_at: Option<i64>,
    otp_code: Option<String>,
    otp_expires_at: Option<i64>,
    created_at: i64,
    updated_at: i64,
}

impl TryFrom<SqliteAccount> for Account {
    type Error = StorageError;

    fn try_from(row: SqliteAccount) -> Result<Self, Self::Error> {
        let otp = match (row.otp_code, row.otp_expires_at) {
            (Some(code), Some(expires_at)) => Some(PendingOtp {
                code,
                expires_at: timestamp(expires_at)?,
            }),
            (None, None) => None,
            _ => {
                tracing::warn!(
                    account_id = %row.id,
                    "Account has only one of otp_code and otp_expires_at; ignoring the passcode"
                );
                None
            }
        };

        Ok(Account {
            id: AccountId::new(&row.id),
            email: row.email,
            username: row.username,
            first_name: row.first_name,
            middle_name: row.middle_name,
            last_name: row.last_name,
            role: row
                .role
                .parse::<Role>()
                .map_err(|e| StorageError::Corrupt(e.to_string()))?,
            credential_hash: CredentialHash::new(row.credential_hash),
            status: row
                .account_status
                .parse::<AccountStatus>()
                .map_err(|e| StorageError::Corrupt(e.to_string()))?,
            failed_attempt_count: u32::try_from(row.failed_attempt_count).map_err(|_| {
                StorageError::Corrupt(format!(
                    "failed_attempt_count out of range: {}",
                    row.failed_attempt_count
                ))
            })?,
            last_failed_attempt_at: row.last_failed_attempt_at.map(timestamp).transpose()?,
            otp,
            created_at: timestamp(row.created_at)?,
            updated_at: timestamp(row.updated_at)?,
        })
    }
}

fn timestamp(millis: i64) -> Result<DateTime<Utc>, StorageError> {
    DateTime::from_timestamp_millis(millis)
        .ok_or_else(|| StorageError::Corrupt(format!("Invalid timestamp: {millis}")))
}

fn storage_error(e: sqlx::Error, context: &str) -> Error {
    if let sqlx::Error::Database(db) = &e {
        if db.is_unique_violation() {
            return StorageError::Constraint(db.message().to_string()).into();
        }
    }
    tracing::error!(error = %e, "{context}");
    StorageError::Database(context.to_string()).into()
}

#[async_trait]
impl AccountRepository for SqliteAccountRepository {
    async fn create(&self, account: &Account) -> Result<Account, Error> {
        let row = sqlx::query_as::<_, SqliteAccount>(
            r#"
            INSERT INTO accounts (
                id, email, username, first_name, last_name, role, credential_hash,
                account_status, failed_attempt_count, last_failed_attempt_at,
                otp_code, otp_expires_at, created_at, updated_at, middle_name
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
            RETURNING *
            "#,
        )
        .bind(account.id.as_str())
        .bind(&account.email)
        .bind(&account.username)
        .bind(&account.first_name)
        .bind(&account.last_name)
        .bind(account.role.as_str())
        .bind(account.credential_hash.as_str())
        .bind(account.status.as_str())
        .bind(i64::from(account.failed_attempt_count))
        .bind(account.last_failed_attempt_at.map(|dt| dt.timestamp_millis()))
        .bind(account.otp.as_ref().map(|otp| otp.code.as_str()))
        .bind(account.otp.as_ref().map(|otp| otp.expires_at.timestamp_millis()))
        .bind(account.created_at.timestamp_millis())
        .bind(account.updated_at.timestamp_millis())
        .bind(&account.middle_name)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| storage_error(e, "Failed to create account"))?;

        Ok(Account::try_from(row)?)
    }

    async fn find_by_id(&self, id: &AccountId) -> Result<Option<Account>, Error> {
        let row = sqlx::query_as::<_, SqliteAccount>("SELECT * FROM accounts WHERE id = ?1")
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| storage_error(e, "Failed to find account by id"))?;

        Ok(row.map(Account::try_from).transpose()?)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, Error> {
        let row = sqlx::query_as::<_, SqliteAccount>("SELECT * FROM accounts WHERE email = ?1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| storage_error(e, "Failed to find account by email"))?;

        Ok(row.map(Account::try_from).transpose()?)
    }

    async fn save(&self, account: &Account) -> Result<(), Error> {
        let result = sqlx::query(
            r#"
            UPDATE accounts
            SET email = ?2, username = ?3, first_name = ?4, last_name = ?5, role = ?6,
                credential_hash = ?7, account_status = ?8, failed_attempt_count = ?9,
                last_failed_attempt_at = ?10, otp_code = ?11, otp_expires_at = ?12,
                updated_at = ?13, middle_name = ?14
            WHERE id = ?1
            "#,
        )
        .bind(account.id.as_str())
        .bind(&account.email)
        .bind(&account.username)
        .bind(&account.first_name)
        .bind(&account.last_name)
        .bind(account.role.as_str())
        .bind(account.credential_hash.as_str())
        .bind(account.status.as_str())
        .bind(i64::from(account.failed_attempt_count))
        .bind(account.last_failed_attempt_at.map(|dt| dt.timestamp_millis()))
        .bind(account.otp.as_ref().map(|otp| otp.code.as_str()))
        .bind(account.otp.as_ref().map(|otp| otp.expires_at.timestamp_millis()))
        .bind(account.updated_at.timestamp_millis())
        .bind(&account.middle_name)
        .execute(&self.pool)
        .await
        .map_err(|e| storage_error(e, "Failed to save account"))?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound.into());
        }
        Ok(())
    }

    async fn delete(&self, id: &AccountId) -> Result<(), Error> {
        sqlx::query("DELETE FROM accounts WHERE id = ?1")
            .bind(id.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| storage_error(e, "Failed to delete account"))?;

        Ok(())
    }
}
