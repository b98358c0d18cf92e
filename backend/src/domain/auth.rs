//! Authentication primitives: login credentials, verified identities and
//! issued access tokens.
//!
//! Inbound payload parsing stays outside the domain. Handlers build
//! [`LoginCredentials`] through the validating constructor before talking to
//! a [`LoginService`](crate::domain::ports::LoginService).

use std::fmt;

use chrono::{DateTime, Utc};
use zeroize::Zeroizing;

use crate::domain::{Role, User, UserId, Username};

/// Message returned for any failed login, whichever check failed.
pub const INVALID_LOGIN_MESSAGE: &str = "Invalid username or password";
/// Message returned when a protected request carries no credential.
pub const MISSING_TOKEN_MESSAGE: &str = "Authentication required";
/// Message returned when a credential is malformed, forged or expired.
pub const INVALID_TOKEN_MESSAGE: &str = "Invalid or expired token";

/// Domain error returned when login payload values are invalid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginValidationError {
    /// Username was missing or blank once trimmed.
    EmptyUsername,
    /// Password was blank.
    EmptyPassword,
}

impl fmt::Display for LoginValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyUsername => write!(f, "username must not be empty"),
            Self::EmptyPassword => write!(f, "password must not be empty"),
        }
    }
}

impl std::error::Error for LoginValidationError {}

/// Validated login credentials used by authentication services.
///
/// ## Invariants
/// - `username` is trimmed and must not be empty after trimming.
/// - `password` must be non-empty; surrounding whitespace is kept.
///
/// # Examples
/// ```
/// use loan_backend::domain::LoginCredentials;
///
/// let creds = LoginCredentials::try_from_parts(" Jasper ", "BMW123").unwrap();
/// assert_eq!(creds.username(), "Jasper");
/// assert_eq!(creds.password(), "BMW123");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginCredentials {
    username: String,
    password: Zeroizing<String>,
}

impl LoginCredentials {
    /// Construct credentials from raw username/password inputs.
    pub fn try_from_parts(username: &str, password: &str) -> Result<Self, LoginValidationError> {
        let normalized = username.trim();
        if normalized.is_empty() {
            return Err(LoginValidationError::EmptyUsername);
        }

        if password.is_empty() {
            return Err(LoginValidationError::EmptyPassword);
        }

        Ok(Self {
            username: normalized.to_owned(),
            password: Zeroizing::new(password.to_owned()),
        })
    }

    /// Username string suitable for user lookups.
    pub fn username(&self) -> &str {
        self.username.as_str()
    }

    /// Password string provided by the caller.
    pub fn password(&self) -> &str {
        self.password.as_str()
    }
}

/// Identity recovered from a verified access token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    id: UserId,
    username: Username,
    role: Role,
}

impl AuthenticatedUser {
    /// Build an identity from verified parts.
    pub fn new(id: UserId, username: Username, role: Role) -> Self {
        Self { id, username, role }
    }

    /// Stable identifier.
    pub fn id(&self) -> &UserId {
        &self.id
    }

    /// Login name.
    pub fn username(&self) -> &Username {
        &self.username
    }

    /// Permission level carried by the token.
    pub fn role(&self) -> Role {
        self.role
    }

    /// Whether this identity may change payment status.
    pub fn can_edit(&self) -> bool {
        self.role.can_edit()
    }
}

impl From<&User> for AuthenticatedUser {
    fn from(user: &User) -> Self {
        Self::new(*user.id(), user.username().clone(), user.role())
    }
}

/// Signed, time-limited bearer credential.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken {
    value: Zeroizing<String>,
    expires_at: DateTime<Utc>,
}

impl AccessToken {
    /// Wrap an encoded token.
    pub fn new(value: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            value: Zeroizing::new(value.into()),
            expires_at,
        }
    }

    /// Encoded token sent as `Authorization: Bearer <token>`.
    pub fn as_str(&self) -> &str {
        self.value.as_str()
    }

    /// Instant after which verification fails.
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("value", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Result of a successful login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginSession {
    /// Credential to present on later requests.
    pub token: AccessToken,
    /// Identity the credential is bound to.
    pub user: AuthenticatedUser,
}
