use async_trait::async_trait;

use crate::{
    Error,
    account::{Account, AccountId},
};

/// Durable storage for accounts, keyed by [`AccountId`].
///
/// Every method is a single-record operation and must be atomic on its own.
/// The services do a read, an in-memory transition and a `save`; there is no
/// locking across those steps, so two concurrent failures against the same
/// account can lose one increment.
#[async_trait]
pub trait AccountRepository: Send + Sync + 'static {
    /// Insert a new account. Fails with a constraint error if the email or
    /// username is already taken.
    async fn create(&self, account: &Account) -> Result<Account, Error>;

    async fn find_by_id(&self, id: &AccountId) -> Result<Option<Account>, Error>;

    /// Look up by normalized email.
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, Error>;

    /// Overwrite the stored record with `account`. Fails with
    /// `StorageError::NotFound` if it does not exist.
    async fn save(&self, account: &Account) -> Result<(), Error>;

    async fn delete(&self, id: &AccountId) -> Result<(), Error>;
}
