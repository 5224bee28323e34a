//! Security policy configuration
//!
//! All thresholds are passed to the services explicitly; nothing in the core
//! reads process-wide settings on its own.

use chrono::Duration;

use crate::Error;

/// Configuration for login lockout and one-time passcodes.
///
/// The defaults match a development setup: three attempts, one minute
/// lockout, one minute passcode lifetime. Raise them for production.
#[derive(Debug, Clone)]
pub struct SecurityConfig {
    /// Failed logins that lock the account.
    pub max_failed_attempts: u32,

    /// How long a lock lasts, measured from the most recent failure.
    pub lockout_duration: Duration,

    /// Lifetime of an issued one-time passcode.
    pub otp_ttl: Duration,

    /// Number of digits in a generated one-time passcode.
    pub otp_length: usize,

    /// Source of the username prefix ("Bank of Finance" → `BOF-…`).
    pub bank_name: String,

    /// Whether a login against a locked account says so. When `false` the
    /// caller sees the same invalid-credentials error as for a bad password.
    pub disclose_lockout: bool,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_failed_attempts: 3,
            lockout_duration: Duration::minutes(1),
            otp_ttl: Duration::minutes(1),
            otp_length: 6,
            bank_name: "Bank of Finance".to_string(),
            disclose_lockout: false,
        }
    }
}

pub const MIN_OTP_LENGTH: usize = 4;
pub const MAX_OTP_LENGTH: usize = 10;

/// Upper bound, in days, for `lockout_duration` and `otp_ttl`.
pub const MAX_DURATION_DAYS: i64 = 365;

impl SecurityConfig {
    /// Read overrides from `FINVAULT_*` environment variables, falling back
    /// to [`SecurityConfig::default`] for anything unset.
    ///
    /// | Variable                            | Field                 |
    /// | ----------------------------------- | --------------------- |
    /// | `FINVAULT_MAX_FAILED_ATTEMPTS`      | `max_failed_attempts` |
    /// | `FINVAULT_LOCKOUT_DURATION_SECS`    | `lockout_duration`    |
    /// | `FINVAULT_OTP_TTL_SECS`             | `otp_ttl`             |
    /// | `FINVAULT_OTP_LENGTH`               | `otp_length`          |
    /// | `FINVAULT_BANK_NAME`                | `bank_name`           |
    /// | `FINVAULT_DISCLOSE_LOCKOUT`         | `disclose_lockout`    |
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, Error> {
        let mut config = Self::default();

        if let Some(v) = lookup("FINVAULT_MAX_FAILED_ATTEMPTS") {
            config.max_failed_attempts = parse_var("FINVAULT_MAX_FAILED_ATTEMPTS", &v)?;
        }
        if let Some(v) = lookup("FINVAULT_LOCKOUT_DURATION_SECS") {
            config.lockout_duration = seconds_var("FINVAULT_LOCKOUT_DURATION_SECS", &v)?;
        }
        if let Some(v) = lookup("FINVAULT_OTP_TTL_SECS") {
            config.otp_ttl = seconds_var("FINVAULT_OTP_TTL_SECS", &v)?;
        }
        if let Some(v) = lookup("FINVAULT_OTP_LENGTH") {
            config.otp_length = parse_var("FINVAULT_OTP_LENGTH", &v)?;
        }
        if let Some(v) = lookup("FINVAULT_BANK_NAME") {
            config.bank_name = v;
        }
        if let Some(v) = lookup("FINVAULT_DISCLOSE_LOCKOUT") {
            config.disclose_lockout = matches!(v.to_lowercase().as_str(), "true" | "1" | "yes");
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.max_failed_attempts == 0 {
            return Err(Error::Config(
                "max_failed_attempts must be at least 1".to_string(),
            ));
        }
        check_duration("lockout_duration", self.lockout_duration)?;
        check_duration("otp_ttl", self.otp_ttl)?;
        if !(MIN_OTP_LENGTH..=MAX_OTP_LENGTH).contains(&self.otp_length) {
            return Err(Error::Config(format!(
                "otp_length must be between {MIN_OTP_LENGTH} and {MAX_OTP_LENGTH}"
            )));
        }
        Ok(())
    }

    pub fn otp_expiry_minutes(&self) -> u64 {
        whole_minutes(self.otp_ttl)
    }

    pub fn lockout_minutes(&self) -> u64 {
        whole_minutes(self.lockout_duration)
    }
}

/// Minutes shown to a human, rounded up so "90 seconds" never reads as "1 minute".
pub(crate) fn whole_minutes(duration: Duration) -> u64 {
    let seconds = duration.num_seconds().max(0) as u64;
    seconds.div_ceil(60)
}

fn check_duration(name: &str, duration: Duration) -> Result<(), Error> {
    if duration <= Duration::zero() {
        return Err(Error::Config(format!("{name} must be positive")));
    }
    if duration > Duration::days(MAX_DURATION_DAYS) {
        return Err(Error::Config(format!(
            "{name} must not exceed {MAX_DURATION_DAYS} days"
        )));
    }
    Ok(())
}

fn seconds_var(key: &str, value: &str) -> Result<Duration, Error> {
    Duration::try_seconds(parse_var(key, value)?)
        .ok_or_else(|| Error::Config(format!("Value for {key} is out of range: {value}")))
}

fn parse_var<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, Error> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::Config(format!("Invalid value for {key}: {value}")))
}
