//! Authentication service implementing the [`LoginService`] driving port.
//!
//! Unknown usernames and wrong passwords produce the same error so the
//! response cannot be used to enumerate accounts.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::{debug, error, info};

use crate::domain::ports::{
    LoginService, PasswordHashError, PasswordHasher, TokenError, TokenService,
    UserPersistenceError, UserRepository,
};
use crate::domain::{
    AuthenticatedUser, Error, INVALID_LOGIN_MESSAGE, INVALID_TOKEN_MESSAGE, LoginCredentials,
    LoginSession, Username,
};

/// Login and token verification over the user store.
#[derive(Clone)]
pub struct AuthService<U, H, T> {
    users: Arc<U>,
    hasher: Arc<H>,
    tokens: Arc<T>,
    clock: Arc<dyn Clock>,
}

impl<U, H, T> AuthService<U, H, T> {
    /// Create a new service.
    pub fn new(users: Arc<U>, hasher: Arc<H>, tokens: Arc<T>, clock: Arc<dyn Clock>) -> Self {
        Self {
            users,
            hasher,
            tokens,
            clock,
        }
    }
}

pub(crate) fn map_user_persistence_error(error: UserPersistenceError) -> Error {
    match error {
        UserPersistenceError::Connection { message } => {
            Error::internal(format!("user repository unavailable: {message}"))
        }
        UserPersistenceError::Query { message } => {
            Error::internal(format!("user repository error: {message}"))
        }
    }
}

pub(crate) fn map_hash_error(error: PasswordHashError) -> Error {
    error!(error = %error, "password hashing failed");
    Error::internal(error.to_string())
}

fn invalid_login() -> Error {
    Error::unauthorized(INVALID_LOGIN_MESSAGE)
}

#[async_trait]
impl<U, H, T> LoginService for AuthService<U, H, T>
where
    U: UserRepository,
    H: PasswordHasher,
    T: TokenService,
{
    async fn login(&self, credentials: &LoginCredentials) -> Result<LoginSession, Error> {
        // A name that cannot exist is reported like any other unknown user.
        let Ok(username) = Username::new(credentials.username()) else {
            return Err(invalid_login());
        };

        let Some(account) = self
            .users
            .find_by_username(&username)
            .await
            .map_err(map_user_persistence_error)?
        else {
            debug!(username = %username, "login for unknown user");
            return Err(invalid_login());
        };

        let matches = self
            .hasher
            .verify(credentials.password(), &account.password_hash)
            .await
            .map_err(map_hash_error)?;
        if !matches {
            debug!(username = %username, "login with wrong password");
            return Err(invalid_login());
        }

        let user = AuthenticatedUser::from(&account.user);
        let token = self
            .tokens
            .issue(&user, self.clock.utc())
            .map_err(|err| {
                error!(error = %err, "token issue failed");
                Error::internal(err.to_string())
            })?;
        info!(username = %username, role = %user.role(), "user logged in");
        Ok(LoginSession { token, user })
    }

    fn authenticate(&self, token: &str) -> Result<AuthenticatedUser, Error> {
        self.tokens
            .verify(token, self.clock.utc())
            .map_err(|err: TokenError| {
                debug!(reason = %err, "bearer token rejected");
                Error::unauthorized(INVALID_TOKEN_MESSAGE)
            })
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use crate::domain::ports::{
        MockPasswordHasher, MockTokenService, MockUserRepository, UserAccount,
    };
    use crate::domain::{AccessToken, ErrorCode, Role, User, UserId};
    use chrono::{DateTime, Local, TimeZone, Utc};
    use rstest::rstest;

    struct FixtureClock;

    impl Clock for FixtureClock {
        fn local(&self) -> DateTime<Local> {
            self.utc().with_timezone(&Local)
        }

        fn utc(&self) -> DateTime<Utc> {
            Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0)
                .single()
                .expect("valid fixture timestamp")
        }
    }

    fn account(name: &str, role: Role) -> UserAccount {
        UserAccount {
            user: User::new(
                UserId::random(),
                Username::new(name).expect("valid username"),
                role,
            ),
            password_hash: "$argon2id$stub".to_owned(),
        }
    }

    fn service(
        users: MockUserRepository,
        hasher: MockPasswordHasher,
        tokens: MockTokenService,
    ) -> AuthService<MockUserRepository, MockPasswordHasher, MockTokenService> {
        AuthService::new(
            Arc::new(users),
            Arc::new(hasher),
            Arc::new(tokens),
            Arc::new(FixtureClock),
        )
    }

    fn creds(username: &str, password: &str) -> LoginCredentials {
        LoginCredentials::try_from_parts(username, password).expect("credential shape")
    }

    #[rstest]
    #[tokio::test]
    async fn login_issues_a_token_for_matching_password() {
        let mut users = MockUserRepository::new();
        users
            .expect_find_by_username()
            .times(1)
            .return_once(|_| Ok(Some(account("Jasper", Role::Editor))));
        let mut hasher = MockPasswordHasher::new();
        hasher.expect_verify().times(1).return_once(|_, _| Ok(true));
        let mut tokens = MockTokenService::new();
        tokens
            .expect_issue()
            .times(1)
            .return_once(|_, issued_at| Ok(AccessToken::new("signed", issued_at)));

        let session = service(users, hasher, tokens)
            .login(&creds("Jasper", "BMW123"))
            .await
            .expect("login succeeds");

        assert_eq!(session.token.as_str(), "signed");
        assert_eq!(session.user.username().as_ref(), "Jasper");
        assert!(session.user.can_edit());
    }

    #[rstest]
    #[case(false)]
    #[case(true)]
    #[tokio::test]
    async fn unknown_user_and_wrong_password_look_the_same(#[case] user_exists: bool) {
        let mut users = MockUserRepository::new();
        users.expect_find_by_username().times(1).return_once(move |_| {
            Ok(user_exists.then(|| account("Frank", Role::Viewer)))
        });
        let mut hasher = MockPasswordHasher::new();
        hasher.expect_verify().returning(|_, _| Ok(false));
        let tokens = MockTokenService::new();

        let err = service(users, hasher, tokens)
            .login(&creds("Frank", "wrong"))
            .await
            .expect_err("login fails");

        assert_eq!(err.code(), ErrorCode::Unauthorized);
        assert_eq!(err.message(), INVALID_LOGIN_MESSAGE);
    }

    #[rstest]
    #[tokio::test]
    async fn store_outage_is_an_internal_error() {
        let mut users = MockUserRepository::new();
        users
            .expect_find_by_username()
            .times(1)
            .return_once(|_| Err(UserPersistenceError::connection("refused")));

        let err = service(users, MockPasswordHasher::new(), MockTokenService::new())
            .login(&creds("Guest", "BMW123"))
            .await
            .expect_err("login fails");
        assert_eq!(err.code(), ErrorCode::InternalError);
    }

    #[rstest]
    #[case(TokenError::expired())]
    #[case(TokenError::invalid("bad signature"))]
    fn rejected_tokens_share_one_message(#[case] failure: TokenError) {
        let mut tokens = MockTokenService::new();
        tokens
            .expect_verify()
            .times(1)
            .return_once(move |_, _| Err(failure));

        let err = service(MockUserRepository::new(), MockPasswordHasher::new(), tokens)
            .authenticate("token")
            .expect_err("token rejected");
        assert_eq!(err.code(), ErrorCode::Unauthorized);
        assert_eq!(err.message(), INVALID_TOKEN_MESSAGE);
    }
}
