//! Port for issuing and verifying signed access tokens.

use chrono::{DateTime, Utc};

use crate::domain::{AccessToken, AuthenticatedUser};

use super::define_port_error;

define_port_error! {
    /// Errors raised by token adapters.
    pub enum TokenError {
        /// Signature, structure or claims are invalid.
        Invalid { message: String } => "token rejected: {message}",
        /// The token is past its expiry.
        Expired => "token expired",
        /// Encoding a new token failed.
        Signing { message: String } => "token signing failed: {message}",
    }
}

/// Issues and verifies bearer tokens. Time is supplied by the caller so
/// expiry follows the injected clock.
#[cfg_attr(test, mockall::automock)]
pub trait TokenService: Send + Sync {
    /// Sign a token for `user` valid from `issued_at`.
    fn issue(
        &self,
        user: &AuthenticatedUser,
        issued_at: DateTime<Utc>,
    ) -> Result<AccessToken, TokenError>;

    /// Check signature and expiry at `now` and recover the identity.
    fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<AuthenticatedUser, TokenError>;
}
