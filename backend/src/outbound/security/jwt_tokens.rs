//! HS256 JWT issuing and verification.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::domain::ports::{TokenError, TokenService};
use crate::domain::{AccessToken, AuthenticatedUser, Role, UserId, Username};

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    username: String,
    role: String,
    iat: i64,
    exp: i64,
}

/// [`TokenService`] signing HS256 tokens with a shared secret.
///
/// Expiry is checked against the caller's `now` with zero leeway rather than
/// the system clock.
pub struct JwtTokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl JwtTokenService {
    /// Build a service from a shared secret and token lifetime.
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.leeway = 0;
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            ttl,
        }
    }

    /// Lifetime applied to newly issued tokens.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

fn invalid(message: impl std::fmt::Display) -> TokenError {
    TokenError::invalid(message.to_string())
}

impl TokenService for JwtTokenService {
    fn issue(
        &self,
        user: &AuthenticatedUser,
        issued_at: DateTime<Utc>,
    ) -> Result<AccessToken, TokenError> {
        let expires_at = issued_at + self.ttl;
        let claims = Claims {
            sub: user.id().to_string(),
            username: user.username().to_string(),
            role: user.role().as_str().to_owned(),
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
        };
        let value = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|err| TokenError::signing(err.to_string()))?;
        Ok(AccessToken::new(value, expires_at))
    }

    fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<AuthenticatedUser, TokenError> {
        let claims = decode::<Claims>(token, &self.decoding, &self.validation)
            .map_err(invalid)?
            .claims;
        if claims.exp <= now.timestamp() {
            return Err(TokenError::expired());
        }
        let id = UserId::new(&claims.sub).map_err(invalid)?;
        let username = Username::new(claims.username).map_err(invalid)?;
        let role: Role = claims.role.parse().map_err(invalid)?;
        Ok(AuthenticatedUser::new(id, username, role))
    }
}
