use std::sync::Arc;

use crate::{
    Error,
    account::{Account, AccountId, Role},
    clock::Clock,
    crypto::hash_password,
    error::{AuthError, StorageError},
    id::generate_username,
    repositories::AccountRepository,
    validation::{normalize_email, validate_email, validate_name, validate_password},
};

/// Attempts at drawing a username that is not already taken.
const USERNAME_ATTEMPTS: usize = 3;

/// Fields accepted when opening an account.
#[derive(Debug, Clone, Default)]
pub struct RegisterAccount {
    pub email: String,
    pub password: String,
    pub first_name: Option<String>,
    pub middle_name: Option<String>,
    pub last_name: Option<String>,
    pub role: Role,
}

impl RegisterAccount {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
            ..Self::default()
        }
    }

    pub fn with_name(mut self, first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        self.first_name = Some(first_name.into());
        self.last_name = Some(last_name.into());
        self
    }

    pub fn with_middle_name(mut self, middle_name: impl Into<String>) -> Self {
        self.middle_name = Some(middle_name.into());
        self
    }

    pub fn with_role(mut self, role: Role) -> Self {
        self.role = role;
        self
    }
}

/// Service for opening and looking up accounts
pub struct AccountService<R: AccountRepository> {
    repository: Arc<R>,
    clock: Arc<dyn Clock>,
    bank_name: String,
}

impl<R: AccountRepository> AccountService<R> {
    pub fn new(repository: Arc<R>, clock: Arc<dyn Clock>, bank_name: impl Into<String>) -> Self {
        Self {
            repository,
            clock,
            bank_name: bank_name.into(),
        }
    }

    /// Open a new account with a generated username.
    ///
    /// Fails with `AuthError::AccountAlreadyExists` if the email is taken.
    pub async fn register(&self, request: RegisterAccount) -> Result<Account, Error> {
        let email = normalize_email(&request.email);
        validate_email(&email)?;
        validate_password(&request.password)?;
        validate_name(request.first_name.as_deref())?;
        validate_name(request.middle_name.as_deref())?;
        validate_name(request.last_name.as_deref())?;

        if self.repository.find_by_email(&email).await?.is_some() {
            return Err(Error::Auth(AuthError::AccountAlreadyExists));
        }

        let credential_hash = hash_password(&request.password);
        let now = self.clock.now();

        let mut last_error = None;
        for _ in 0..USERNAME_ATTEMPTS {
            let mut account = Account::new(
                email.clone(),
                generate_username(&self.bank_name),
                credential_hash.clone(),
                now,
            );
            account.first_name = request.first_name.clone();
            account.middle_name = request.middle_name.clone();
            account.last_name = request.last_name.clone();
            account.role = request.role;

            match self.repository.create(&account).await {
                Ok(account) => {
                    tracing::info!(
                        account_id = %account.id,
                        username = %account.username,
                        role = %account.role.as_str(),
                        "Account registered"
                    );
                    return Ok(account);
                }
                Err(Error::Storage(StorageError::Constraint(e))) => {
                    // Either the username collided or the email was taken concurrently.
                    if self.repository.find_by_email(&email).await?.is_some() {
                        return Err(Error::Auth(AuthError::AccountAlreadyExists));
                    }
                    tracing::debug!(error = %e, "Generated username already taken; retrying");
                    last_error = Some(StorageError::Constraint(e));
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_error
            .unwrap_or_else(|| StorageError::Constraint("username unavailable".to_string()))
            .into())
    }

    pub async fn get_account(&self, id: &AccountId) -> Result<Option<Account>, Error> {
        self.repository.find_by_id(id).await
    }

    pub async fn get_account_by_email(&self, email: &str) -> Result<Option<Account>, Error> {
        self.repository.find_by_email(&normalize_email(email)).await
    }

    pub async fn delete_account(&self, id: &AccountId) -> Result<(), Error> {
        self.repository.delete(id).await?;
        tracing::info!(account_id = %id, "Account deleted");
        Ok(())
    }
}
