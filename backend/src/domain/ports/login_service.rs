//! Driving port for login and bearer-token authentication.
//!
//! Inbound adapters call this port to exchange credentials for a token and
//! to resolve a presented token into an identity, without importing the
//! hashing or signing infrastructure.

use async_trait::async_trait;

use crate::domain::{AuthenticatedUser, Error, LoginCredentials, LoginSession};

/// Domain use-case port for authentication.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LoginService: Send + Sync {
    /// Validate credentials and issue a session token.
    ///
    /// Unknown users and wrong passwords fail identically with
    /// [`ErrorCode::Unauthorized`](crate::domain::ErrorCode::Unauthorized).
    async fn login(&self, credentials: &LoginCredentials) -> Result<LoginSession, Error>;

    /// Verify a bearer token and return the identity it carries.
    fn authenticate(&self, token: &str) -> Result<AuthenticatedUser, Error>;
}
