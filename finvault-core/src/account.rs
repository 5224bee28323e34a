//! The account entity and its security state
//!
//! | Field                    | Type                  | Description                                           |
//! | ------------------------ | --------------------- | ----------------------------------------------------- |
//! | `id`                     | `AccountId`           | Opaque unique identifier.                             |
//! | `email`                  | `String`              | Normalized login email.                               |
//! | `username`               | `String`              | Generated customer handle, e.g. `BOF-X7O6QFT8F55R`.   |
//! | `role`                   | `Role`                | Staff or customer role.                               |
//! | `credential_hash`        | `CredentialHash`      | Argon2 PHC string, never the plaintext password.      |
//! | `status`                 | `AccountStatus`       | `Active` or `Locked` as last persisted.               |
//! | `failed_attempt_count`   | `u32`                 | Failed logins since the last reset.                   |
//! | `last_failed_attempt_at` | `Option<DateTime>`    | Time of the most recent failed login.                 |
//! | `otp`                    | `Option<PendingOtp>`  | The one outstanding one-time passcode, if any.        |
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    error::ValidationError,
    id::{generate_prefixed_id, validate_prefixed_id},
    otp::PendingOtp,
};

/// A unique, stable identifier for an account.
///
/// Treat the value as opaque.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccountId(String);

impl AccountId {
    pub fn new(id: &str) -> Self {
        AccountId(id.to_string())
    }

    pub fn new_random() -> Self {
        AccountId(generate_prefixed_id("acc"))
    }

    pub fn into_inner(self) -> String {
        self.0
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_valid(&self) -> bool {
        validate_prefixed_id(&self.0, "acc")
    }
}

impl Default for AccountId {
    fn default() -> Self {
        Self::new_random()
    }
}

impl From<String> for AccountId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for AccountId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountStatus {
    #[default]
    Active,
    Locked,
}

impl AccountStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountStatus::Active => "active",
            AccountStatus::Locked => "locked",
        }
    }
}

impl FromStr for AccountStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(AccountStatus::Active),
            "locked" => Ok(AccountStatus::Locked),
            other => Err(ValidationError::InvalidField(format!(
                "Unknown account status: {other}"
            ))),
        }
    }
}

impl fmt::Display for AccountStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    #[default]
    Customer,
    AccountExecutive,
    Teller,
    BranchManager,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Customer => "customer",
            Role::AccountExecutive => "account_executive",
            Role::Teller => "teller",
            Role::BranchManager => "branch_manager",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Role::Admin => "Admin",
            Role::Customer => "Customer",
            Role::AccountExecutive => "Account Executive",
            Role::Teller => "Teller",
            Role::BranchManager => "Branch Manager",
        }
    }
}

impl FromStr for Role {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "customer" => Ok(Role::Customer),
            "account_executive" => Ok(Role::AccountExecutive),
            "teller" => Ok(Role::Teller),
            "branch_manager" => Ok(Role::BranchManager),
            other => Err(ValidationError::InvalidField(format!("Unknown role: {other}"))),
        }
    }
}

/// A password hash in PHC string format. `Debug` never prints it.
#[derive(Clone, PartialEq, Eq)]
pub struct CredentialHash(String);

impl CredentialHash {
    pub fn new(hash: impl Into<String>) -> Self {
        Self(hash.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for CredentialHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CredentialHash(..)")
    }
}

#[derive(Debug, Clone)]
pub struct Account {
    pub id: AccountId,
    pub email: String,
    pub username: String,
    pub first_name: Option<String>,
    pub middle_name: Option<String>,
    pub last_name: Option<String>,
    pub role: Role,
    pub credential_hash: CredentialHash,

    /// The status as last persisted. An expired lockout still reads `Locked`
    /// here until the next lockout check clears it, so reports should go
    /// through [`crate::LockoutPolicy::check`] rather than this field.
    pub status: AccountStatus,
    pub failed_attempt_count: u32,
    pub last_failed_attempt_at: Option<DateTime<Utc>>,
    pub otp: Option<PendingOtp>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// A freshly registered account: active, no failures, no pending passcode.
    pub fn new(
        email: String,
        username: String,
        credential_hash: CredentialHash,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: AccountId::new_random(),
            email,
            username,
            first_name: None,
            middle_name: None,
            last_name: None,
            role: Role::default(),
            credential_hash,
            status: AccountStatus::Active,
            failed_attempt_count: 0,
            last_failed_attempt_at: None,
            otp: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// First, middle and last name in title case, or `None` if all are blank.
    pub fn full_name(&self) -> Option<String> {
        let name = [
            self.first_name.as_deref(),
            self.middle_name.as_deref(),
            self.last_name.as_deref(),
        ]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

        (!name.is_empty()).then(|| title_case(&name))
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.role == role
    }

    pub fn is_locked(&self) -> bool {
        self.status == AccountStatus::Locked
    }

    /// A passcode is stored, whether or not it has expired.
    pub fn has_pending_otp(&self) -> bool {
        self.otp.is_some()
    }

    /// A passcode is stored and can still be used at `now`.
    pub fn has_usable_otp(&self, now: DateTime<Utc>) -> bool {
        self.otp.as_ref().is_some_and(|otp| !otp.is_expired(now))
    }
}

/// Upper-case the first letter of every run of letters, lower-case the rest.
fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_word = false;
    for c in s.chars() {
        if c.is_alphabetic() {
            if in_word {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            in_word = true;
        } else {
            out.push(c);
            in_word = false;
        }
    }
    out
}

impl fmt::Display for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.full_name() {
            Some(name) => write!(f, "{name} ({}) - {}", self.email, self.role.display_name()),
            None => write!(f, "{} ({}) - {}", self.username, self.email, self.role.display_name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account() -> Account {
        Account::new(
            "ada@example.com".to_string(),
            "BOF-ABCDEF123456".to_string(),
            CredentialHash::new("$argon2id$v=19$secret"),
            Utc::now(),
        )
    }

    #[test]
    fn test_new_account_is_active_and_clean() {
        let account = account();
        assert!(account.id.is_valid());
        assert_eq!(account.status, AccountStatus::Active);
        assert_eq!(account.failed_attempt_count, 0);
        assert!(account.last_failed_attempt_at.is_none());
        assert!(!account.has_pending_otp());
        assert!(account.has_role(Role::Customer));
    }

    #[test]
    fn test_usable_otp_ignores_expired_code() {
        let mut account = account();
        let now = Utc::now();
        assert!(!account.has_usable_otp(now));

        account.otp = Some(PendingOtp {
            code: "482913".to_string(),
            expires_at: now + chrono::Duration::seconds(60),
        });
        assert!(account.has_usable_otp(now));
        assert!(!account.has_usable_otp(now + chrono::Duration::seconds(60)));
        assert!(account.has_pending_otp());
    }

    #[test]
    fn test_debug_redacts_credential_hash() {
        let debug = format!("{:?}", account());
        assert!(!debug.contains("argon2"));
        assert!(debug.contains("CredentialHash(..)"));
    }

    #[test]
    fn test_full_name() {
        let mut account = account();
        assert_eq!(account.full_name(), None);

        account.first_name = Some("Ada".to_string());
        assert_eq!(account.full_name().as_deref(), Some("Ada"));

        account.last_name = Some(" Lovelace ".to_string());
        assert_eq!(account.full_name().as_deref(), Some("Ada Lovelace"));
        assert_eq!(
            account.to_string(),
            "Ada Lovelace (ada@example.com) - Customer"
        );
    }

    #[test]
    fn test_full_name_includes_middle_name_in_title_case() {
        let mut account = account();
        account.first_name = Some("augusta".to_string());
        account.middle_name = Some("ADA".to_string());
        account.last_name = Some("king-noel".to_string());
        assert_eq!(account.full_name().as_deref(), Some("Augusta Ada King-Noel"));

        account.middle_name = Some("  ".to_string());
        assert_eq!(account.full_name().as_deref(), Some("Augusta King-Noel"));

        account.first_name = None;
        account.last_name = Some("o'brien".to_string());
        account.middle_name = None;
        assert_eq!(account.full_name().as_deref(), Some("O'Brien"));
    }

    #[test]
    fn test_status_and_role_round_trip_through_str() {
        for status in [AccountStatus::Active, AccountStatus::Locked] {
            assert_eq!(status.as_str().parse::<AccountStatus>().unwrap(), status);
        }
        assert_eq!("branch_manager".parse::<Role>().unwrap(), Role::BranchManager);
        assert!("frozen".parse::<AccountStatus>().is_err());
        assert!("janitor".parse::<Role>().is_err());
    }
}
