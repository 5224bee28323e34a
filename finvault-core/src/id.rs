//! Identifier generation
//!
//! Account ids are opaque, prefixed strings (`acc_…`) carrying 96 bits of
//! randomness. Usernames are the customer-facing handle printed on bank
//! correspondence: the bank's initials, a dash, and random alphanumerics,
//! always [`USERNAME_LENGTH`] characters in total.

use base64::{Engine, prelude::BASE64_URL_SAFE_NO_PAD};
use rand::Rng;

pub const USERNAME_LENGTH: usize = 16;

const USERNAME_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Generate a prefixed ID with 96 bits of entropy, formatted `{prefix}_{base64url}`.
pub fn generate_prefixed_id(prefix: &str) -> String {
    let mut bytes = [0u8; 12];
    rand::rng().fill(&mut bytes);

    format!("{prefix}_{}", BASE64_URL_SAFE_NO_PAD.encode(bytes))
}

/// Check that `id` is `{expected_prefix}_` followed by at least 96 bits of base64url.
pub fn validate_prefixed_id(id: &str, expected_prefix: &str) -> bool {
    let Some(random_part) = id
        .strip_prefix(expected_prefix)
        .and_then(|rest| rest.strip_prefix('_'))
    else {
        return false;
    };

    BASE64_URL_SAFE_NO_PAD
        .decode(random_part)
        .is_ok_and(|decoded| decoded.len() >= 12)
}

/// Generate a username such as `BOF-X7O6QFT8F55R` for "Bank of Finance".
///
/// The prefix is the upper-cased first letter of every word in `bank_name`
/// ("B" if the name is blank). The prefix is truncated so that at least four
/// random characters always remain.
pub fn generate_username(bank_name: &str) -> String {
    let mut prefix: String = bank_name
        .split_whitespace()
        .filter_map(|word| word.chars().next())
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_uppercase())
        .collect();

    if prefix.is_empty() {
        prefix.push('B');
    }
    prefix.truncate(USERNAME_LENGTH - 5);

    // One character is reserved for the dash.
    let remaining = USERNAME_LENGTH - prefix.len() - 1;
    let mut rng = rand::rng();
    let random: String = (0..remaining)
        .map(|_| USERNAME_ALPHABET[rng.random_range(0..USERNAME_ALPHABET.len())] as char)
        .collect();

    format!("{prefix}-{random}")
}
