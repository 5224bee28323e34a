use async_trait::async_trait;
use dashmap::DashMap;

use crate::{
    Error,
    account::{Account, AccountId},
    error::StorageError,
    repositories::AccountRepository,
};

/// Process-local account storage, for tests and single-node demos.
#[derive(Debug, Default)]
pub struct InMemoryAccountRepository {
    accounts: DashMap<AccountId, Account>,
}

impl InMemoryAccountRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}

#[async_trait]
impl AccountRepository for InMemoryAccountRepository {
    async fn create(&self, account: &Account) -> Result<Account, Error> {
        let taken = self.accounts.iter().any(|entry| {
            entry.email == account.email || entry.username == account.username
        });
        if taken || self.accounts.contains_key(&account.id) {
            return Err(StorageError::Constraint(
                "account email, username or id already exists".to_string(),
            )
            .into());
        }

        self.accounts.insert(account.id.clone(), account.clone());
        Ok(account.clone())
    }

    async fn find_by_id(&self, id: &AccountId) -> Result<Option<Account>, Error> {
        Ok(self.accounts.get(id).map(|entry| entry.clone()))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, Error> {
        Ok(self
            .accounts
            .iter()
            .find(|entry| entry.email == email)
            .map(|entry| entry.clone()))
    }

    async fn save(&self, account: &Account) -> Result<(), Error> {
        match self.accounts.get_mut(&account.id) {
            Some(mut entry) => {
                *entry = account.clone();
                Ok(())
            }
            None => Err(StorageError::NotFound.into()),
        }
    }

    async fn delete(&self, id: &AccountId) -> Result<(), Error> {
        self.accounts.remove(id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::{AccountStatus, CredentialHash};
    use chrono::Utc;

    fn account(email: &str, username: &str) -> Account {
        Account::new(
            email.to_string(),
            username.to_string(),
            CredentialHash::new("hash"),
            Utc::now(),
        )
    }

    #[tokio::test]
    async fn test_create_and_find() {
        let repo = InMemoryAccountRepository::new();
        let created = repo
            .create(&account("a@example.com", "BOF-AAAAAAAAAAAA"))
            .await
            .unwrap();

        let by_id = repo.find_by_id(&created.id).await.unwrap().unwrap();
        assert_eq!(by_id.email, "a@example.com");
        let by_email = repo.find_by_email("a@example.com").await.unwrap().unwrap();
        assert_eq!(by_email.id, created.id);
        assert!(repo.find_by_email("b@example.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let repo = InMemoryAccountRepository::new();
        repo.create(&account("a@example.com", "BOF-AAAAAAAAAAAA"))
            .await
            .unwrap();

        let err = repo
            .create(&account("a@example.com", "BOF-BBBBBBBBBBBB"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Storage(StorageError::Constraint(_))));
        assert_eq!(repo.len(), 1);
    }

    #[tokio::test]
    async fn test_save_overwrites_and_requires_existing() {
        let repo = InMemoryAccountRepository::new();
        let mut account = repo
            .create(&account("a@example.com", "BOF-AAAAAAAAAAAA"))
            .await
            .unwrap();

        account.status = AccountStatus::Locked;
        account.failed_attempt_count = 3;
        repo.save(&account).await.unwrap();
        let stored = repo.find_by_id(&account.id).await.unwrap().unwrap();
        assert_eq!(stored.status, AccountStatus::Locked);
        assert_eq!(stored.failed_attempt_count, 3);

        repo.delete(&account.id).await.unwrap();
        let err = repo.save(&account).await.unwrap_err();
        assert!(matches!(err, Error::Storage(StorageError::NotFound)));
        assert!(repo.is_empty());
    }
}
