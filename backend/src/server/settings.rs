//! Service settings loaded via OrthoConfig from `LOAN_*` variables and flags.

use std::net::SocketAddr;
use std::time::Duration as StdDuration;

use chrono::Duration;
use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};

use loan_backend::domain::{LoanTerms, Money, Roster};
use loan_backend::outbound::persistence::PoolConfig;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:4000";
const DEV_TOKEN_SECRET: &str = "loan-app-secret";
const DEFAULT_ROSTER: &str = "Gilbert,Christian,Frank,Jasper,Guest";
const DEFAULT_EDITORS: &str = "Jasper";
const DEFAULT_PASSWORD: &str = "BMW123";

/// Problems detected while turning raw settings into runtime values.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("invalid bind address {value:?}: {reason}")]
    BindAddr { value: String, reason: String },
    #[error("LOAN_TOKEN_SECRET must be set in release builds")]
    MissingTokenSecret,
    #[error("token secret must not be empty")]
    EmptyTokenSecret,
    #[error("token lifetime must be at least one hour")]
    TokenTtl,
    #[error("invalid loan terms: {0}")]
    Terms(String),
    #[error("invalid user roster: {0}")]
    Roster(String),
    #[error("invalid database pool settings: {0}")]
    Pool(String),
}

/// Usernames given either as one comma separated string or as a list.
///
/// Comma separated environment values arrive as lists, single names as plain
/// strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NameList {
    /// Comma separated names in one string.
    Joined(String),
    /// Names already split.
    Split(Vec<String>),
}

impl NameList {
    fn names(&self) -> Vec<String> {
        match self {
            Self::Joined(raw) => split_names(raw),
            Self::Split(names) => names.iter().flat_map(|name| split_names(name)).collect(),
        }
    }
}

/// Raw configuration values for the loan service.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "LOAN")]
pub struct LoanSettings {
    /// Socket address the HTTP server listens on.
    pub bind_addr: Option<String>,
    /// PostgreSQL URL. Without one the service keeps state in memory.
    pub database_url: Option<String>,
    /// Maximum number of pooled database connections.
    #[ortho_config(default = 10)]
    pub db_pool_size: u32,
    /// Seconds to wait for a pooled database connection.
    #[ortho_config(default = 30)]
    pub db_connect_timeout_secs: u64,
    /// HMAC secret for signing access tokens.
    pub token_secret: Option<String>,
    /// Access token lifetime in hours.
    #[ortho_config(default = 12)]
    pub token_ttl_hours: u32,
    /// Principal used when the loan is first created.
    #[ortho_config(default = 2_000_000)]
    pub principal_cents: i64,
    /// Scheduled monthly instalment.
    #[ortho_config(default = 33_000)]
    pub monthly_payment_cents: i64,
    /// Number of scheduled payments.
    #[ortho_config(default = 60)]
    pub total_months: u32,
    /// Usernames seeded at start-up.
    #[ortho_config(skip_cli)]
    pub roster: Option<NameList>,
    /// Roster members granted the editor role.
    #[ortho_config(skip_cli)]
    pub editors: Option<NameList>,
    /// Initial password for seeded accounts.
    pub default_password: Option<String>,
}

impl LoanSettings {
    /// Address to bind, falling back to all interfaces on port 4000.
    pub fn bind_addr(&self) -> Result<SocketAddr, SettingsError> {
        let raw = self.bind_addr.as_deref().unwrap_or(DEFAULT_BIND_ADDR);
        raw.parse().map_err(|err: std::net::AddrParseError| SettingsError::BindAddr {
            value: raw.to_owned(),
            reason: err.to_string(),
        })
    }

    /// Configured database URL, if any. Blank values count as unset.
    pub fn database_url(&self) -> Option<&str> {
        self.database_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }

    /// Pool limits for the configured database, if any.
    pub fn pool_config(&self) -> Result<Option<PoolConfig>, SettingsError> {
        self.database_url()
            .map(|url| {
                PoolConfig::try_new(
                    url,
                    self.db_pool_size,
                    StdDuration::from_secs(self.db_connect_timeout_secs),
                )
                .map_err(|err| SettingsError::Pool(err.to_string()))
            })
            .transpose()
    }

    /// Token signing secret. Debug builds fall back to a development secret.
    pub fn token_secret(&self) -> Result<String, SettingsError> {
        match self.token_secret.as_deref() {
            Some(secret) if secret.is_empty() => Err(SettingsError::EmptyTokenSecret),
            Some(secret) => Ok(secret.to_owned()),
            None if cfg!(debug_assertions) => Ok(DEV_TOKEN_SECRET.to_owned()),
            None => Err(SettingsError::MissingTokenSecret),
        }
    }

    /// Access token lifetime.
    pub fn token_ttl(&self) -> Result<Duration, SettingsError> {
        if self.token_ttl_hours == 0 {
            return Err(SettingsError::TokenTtl);
        }
        Ok(Duration::hours(i64::from(self.token_ttl_hours)))
    }

    /// Terms applied when the loan row is first created.
    pub fn terms(&self) -> Result<LoanTerms, SettingsError> {
        LoanTerms::try_new(
            Money::from_cents(self.principal_cents),
            Money::from_cents(self.monthly_payment_cents),
            self.total_months,
        )
        .map_err(|err| SettingsError::Terms(err.to_string()))
    }

    /// Accounts seeded at start-up.
    pub fn roster(&self) -> Result<Roster, SettingsError> {
        let usernames = self
            .roster
            .as_ref()
            .map_or_else(|| split_names(DEFAULT_ROSTER), NameList::names);
        let editors = self
            .editors
            .as_ref()
            .map_or_else(|| split_names(DEFAULT_EDITORS), NameList::names);
        let password = self.default_password.as_deref().unwrap_or(DEFAULT_PASSWORD);
        Roster::try_new(usernames, editors, password)
            .map_err(|err| SettingsError::Roster(err.to_string()))
    }
}
