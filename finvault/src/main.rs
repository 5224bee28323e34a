use std::process::ExitCode;

use chrono::{DateTime, Utc};
use clap::Parser;
use finvault::{
    Account, AccountStatus, FinvaultBuilder, LockoutStatus, SecurityConfig, SqliteStorage,
};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

/// Administrative command line for finvault
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Database connection string
    #[arg(long, env = "FINVAULT_DATABASE_URL", default_value = "sqlite://finvault.db")]
    database_url: String,

    /// Command to execute
    #[command(subcommand)]
    command: Commands,
}

/// Available CLI commands
#[derive(clap::Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Show the lockout state of an account as JSON
    Status {
        /// Email address of the account
        email: String,
    },
    /// Lift a lockout by hand
    Unlock {
        /// Email address of the account
        email: String,
    },
    /// Print version information
    Version,
}

#[derive(Serialize)]
struct StatusReport {
    account_id: String,
    email: String,
    username: String,
    status: AccountStatus,
    failed_attempts: u32,
    locked_until: Option<DateTime<Utc>>,
    retry_after_seconds: Option<i64>,
    /// A passcode is stored and has not expired.
    has_pending_otp: bool,
    otp_expires_at: Option<DateTime<Utc>>,
}

impl StatusReport {
    fn new(account: Account, lockout: LockoutStatus, now: DateTime<Utc>) -> Self {
        Self {
            retry_after_seconds: lockout.retry_after_seconds(now),
            status: if lockout.is_locked {
                AccountStatus::Locked
            } else {
                AccountStatus::Active
            },
            failed_attempts: lockout.failed_attempts,
            locked_until: lockout.locked_until,
            has_pending_otp: account.has_usable_otp(now),
            otp_expires_at: account.otp.as_ref().map(|otp| otp.expires_at),
            account_id: account.id.into_inner(),
            email: account.email,
            username: account.username,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => {
            println!("Running migrations...");
            let storage = SqliteStorage::connect(&cli.database_url).await?;
            storage.migrate().await?;
            println!("Done.");
        }
        Commands::Status { email } => {
            let finvault = FinvaultBuilder::new()
                .with_sqlite(&cli.database_url)
                .await?
                .with_config(SecurityConfig::from_env()?)
                .build()
                .await?;

            let account = finvault
                .get_account_by_email(&email)
                .await?
                .ok_or_else(|| format!("no account with email {email}"))?;
            let lockout = finvault.lockout_status(&account.id).await?;

            let report = StatusReport::new(account, lockout, Utc::now());
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Unlock { email } => {
            let finvault = FinvaultBuilder::new()
                .with_sqlite(&cli.database_url)
                .await?
                .with_config(SecurityConfig::from_env()?)
                .build()
                .await?;

            let account = finvault
                .get_account_by_email(&email)
                .await?
                .ok_or_else(|| format!("no account with email {email}"))?;

            if finvault.unlock_account(&account.id).await? {
                println!("Unlocked {}", account.email);
            } else {
                println!("{} was not locked", account.email);
            }
        }
        Commands::Version => {
            println!("finvault v{}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use finvault::{CredentialHash, PendingOtp};

    fn t(seconds: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000 + seconds, 0).unwrap()
    }

    fn account_with_otp(expires_at: DateTime<Utc>) -> Account {
        let mut account = Account::new(
            "ada@example.com".to_string(),
            "BOF-ABCDEF123456".to_string(),
            CredentialHash::new("hash"),
            t(0),
        );
        account.otp = Some(PendingOtp {
            code: "482913".to_string(),
            expires_at,
        });
        account
    }

    fn unlocked() -> LockoutStatus {
        LockoutStatus {
            failed_attempts: 0,
            is_locked: false,
            locked_until: None,
        }
    }

    #[test]
    fn test_status_report_hides_expired_passcode() {
        let report = StatusReport::new(account_with_otp(t(60)), unlocked(), t(30));
        assert!(report.has_pending_otp);

        let report = StatusReport::new(account_with_otp(t(60)), unlocked(), t(60));
        assert!(!report.has_pending_otp);
        assert_eq!(report.otp_expires_at, Some(t(60)));
    }

    #[test]
    fn test_status_report_for_locked_account() {
        let lockout = LockoutStatus {
            failed_attempts: 3,
            is_locked: true,
            locked_until: Some(t(62)),
        };
        let report = StatusReport::new(account_with_otp(t(60)), lockout, t(12));

        assert!(matches!(report.status, AccountStatus::Locked));
        assert_eq!(report.retry_after_seconds, Some(50));

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["failed_attempts"], 3);
        assert_eq!(json["email"], "ada@example.com");
        assert!(json.get("otp_expires_at").is_some());
    }
}
