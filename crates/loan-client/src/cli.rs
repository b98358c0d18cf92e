//! Command-line surface of `loanctl`.

use camino::Utf8PathBuf;
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};

use crate::api::PaymentStatus;

/// Service URL used when none is configured.
pub const DEFAULT_API_URL: &str = "http://localhost:4000";

/// Terminal client for the loan repayment tracker.
#[derive(Debug, Parser)]
#[command(name = "loanctl", version, about)]
pub struct Cli {
    /// Base URL of the loan service.
    #[arg(long, global = true, env = "LOANCTL_API_URL", default_value = DEFAULT_API_URL)]
    pub api_url: String,
    /// Credential file; defaults to `~/.loanctl/token.json`.
    #[arg(long, global = true, env = "LOANCTL_TOKEN_FILE")]
    pub token_file: Option<Utf8PathBuf>,
    /// Action to perform.
    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Credential file path, falling back to the home directory default.
    #[must_use]
    pub fn token_path(&self, home: Option<&str>) -> Utf8PathBuf {
        self.token_file
            .clone()
            .unwrap_or_else(|| default_token_path(home))
    }
}

/// `~/.loanctl/token.json`, or a relative `.loanctl/token.json` without a
/// home directory.
#[must_use]
pub fn default_token_path(home: Option<&str>) -> Utf8PathBuf {
    let base = home
        .filter(|home| !home.trim().is_empty())
        .map_or_else(Utf8PathBuf::new, Utf8PathBuf::from);
    base.join(".loanctl").join("token.json")
}

/// Subcommands.
#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Log in and store the issued token.
    Login {
        /// Account name.
        username: String,
        /// Password; prompted for without echo when omitted.
        #[arg(long, env = "LOANCTL_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    /// Forget the stored token.
    Logout,
    /// Show the account behind the stored token.
    Whoami,
    /// Show the loan dashboard.
    Status,
    /// List every installment with the running balance.
    Payments,
    /// Set a month to paid or unpaid.
    Mark {
        /// 1-based month index.
        month: u32,
        /// Target state.
        state: MarkState,
        /// Payment date; the service uses the current time when omitted.
        #[arg(long)]
        date: Option<NaiveDate>,
        /// Note stored with the payment; omitting it clears the note.
        #[arg(long)]
        note: Option<String>,
    },
    /// Flip a month between paid and unpaid, keeping its note.
    Toggle {
        /// 1-based month index.
        month: u32,
    },
}

/// State accepted by `mark`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MarkState {
    /// Mark as paid.
    Paid,
    /// Mark as unpaid.
    Unpaid,
}

impl From<MarkState> for PaymentStatus {
    fn from(state: MarkState) -> Self {
        match state {
            MarkState::Paid => Self::Paid,
            MarkState::Unpaid => Self::Unpaid,
        }
    }
}
