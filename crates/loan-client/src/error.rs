//! Error type for the loan client.
//!
//! Every variant renders as a single line suitable for terminal output.

use camino::Utf8PathBuf;
use thiserror::Error;

/// Errors surfaced by client commands.
#[derive(Debug, Error)]
pub enum ClientError {
    /// No credential is stored.
    #[error("not logged in; run `loanctl login <username>` first")]
    NotLoggedIn,
    /// The service rejected the stored credential.
    #[error("session rejected ({message}); log in again")]
    Unauthorized {
        /// Message returned by the service.
        message: String,
    },
    /// Login was refused.
    #[error("login failed: {message}")]
    LoginFailed {
        /// Message returned by the service.
        message: String,
    },
    /// The account may read but not change payments.
    #[error("read-only account: {message}")]
    ReadOnly {
        /// Message returned by the service.
        message: String,
    },
    /// Any other non-success response.
    #[error("request rejected ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Message returned by the service.
        message: String,
    },
    /// The request could not be sent or the response not decoded.
    #[error("could not talk to the loan service: {source}")]
    Transport {
        /// Underlying HTTP client error.
        #[from]
        source: reqwest::Error,
    },
    /// The configured service URL is unusable.
    #[error("invalid API URL '{value}': {message}")]
    InvalidUrl {
        /// Supplied URL.
        value: String,
        /// Parser error message.
        message: String,
    },
    /// The credential file could not be read or written.
    #[error("token file {path}: {message}")]
    TokenStore {
        /// Credential file path.
        path: Utf8PathBuf,
        /// Description of the failure.
        message: String,
    },
    /// The month is not in the fetched schedule.
    #[error("month {month} is not part of the schedule")]
    UnknownMonth {
        /// Requested month.
        month: u32,
    },
    /// The password could not be obtained.
    #[error("password is required")]
    MissingPassword,
    /// Terminal output or input failed.
    #[error("terminal I/O failed: {source}")]
    Io {
        /// Underlying I/O error.
        #[from]
        source: std::io::Error,
    },
}

impl ClientError {
    /// Whether the stored credential should be discarded.
    #[must_use]
    pub const fn clears_session(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }
}
