//! Secrets: passcode generation, constant-time comparison, password hashing
//!
//! One-time passcodes are short and low-entropy, so they are compared in
//! constant time to avoid leaking a matching prefix through response timing.
//! Passwords are hashed with Argon2 through `password-auth`.

use rand::Rng;
use subtle::ConstantTimeEq;

use crate::account::CredentialHash;

/// Generate a random numeric passcode of `length` digits.
///
/// Leading zeros are kept, so every code has exactly `length` characters.
pub fn generate_otp(length: usize) -> String {
    let mut rng = rand::rng();
    (0..length)
        .map(|_| char::from(b'0' + rng.random_range(0..10u8)))
        .collect()
}

/// Compare two secrets without short-circuiting on the first mismatch.
pub fn constant_time_eq(a: &str, b: &str) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

pub fn hash_password(password: &str) -> CredentialHash {
    CredentialHash::new(password_auth::generate_hash(password))
}

/// Check `password` against a stored hash. A hash that cannot be parsed is
/// treated as a mismatch.
pub fn verify_password(password: &str, hash: &CredentialHash) -> bool {
    match password_auth::verify_password(password, hash.as_str()) {
        Ok(()) => true,
        Err(password_auth::VerifyError::PasswordInvalid) => false,
        Err(e) => {
            tracing::warn!(error = %e, "Stored credential hash could not be parsed");
            false
        }
    }
}
