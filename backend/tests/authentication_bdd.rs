//! Behaviour tests for roster provisioning, login and token verification.
//!
//! Scenarios use the Argon2 hasher and JWT signer against the in-memory user
//! store. The clock is adjustable so token expiry can be exercised.

use std::future::Future;
use std::sync::Arc;

use chrono::{TimeDelta, TimeZone, Utc};
use loan_backend::domain::ports::LoginService;
use loan_backend::domain::{
    AuthService, Error, ErrorCode, LoginCredentials, LoginSession, Role, Roster, ensure_users,
};
use loan_backend::outbound::memory::InMemoryUserRepository;
use loan_backend::outbound::security::{Argon2PasswordHasher, JwtTokenService};
use loan_backend::test_support::MutableClock;
use rstest::fixture;
use rstest_bdd::Slot;
use rstest_bdd_macros::{ScenarioState, given, scenario, then, when};
use tokio::runtime::Runtime;

const SECRET: &[u8] = b"authentication-scenarios";

type Service = AuthService<InMemoryUserRepository, Argon2PasswordHasher, JwtTokenService>;

/// Wrapper for the non-Clone runtime.
#[derive(Clone)]
struct RuntimeHandle(Arc<Runtime>);

#[derive(Default, ScenarioState)]
struct AuthWorld {
    runtime: Slot<RuntimeHandle>,
    users: Slot<Arc<InMemoryUserRepository>>,
    hasher: Slot<Arc<Argon2PasswordHasher>>,
    clock: Slot<Arc<MutableClock>>,
    service: Slot<Arc<Service>>,
    last_login: Slot<Result<LoginSession, Error>>,
    created: Slot<usize>,
}

impl AuthWorld {
    fn block_on<F: Future>(&self, future: F) -> F::Output {
        let runtime = self.runtime.get().expect("runtime");
        runtime.0.block_on(future)
    }

    fn provision(&self, password: &str) -> usize {
        let roster =
            Roster::try_new(["Frank", "Jasper"], ["Jasper"], password).expect("valid roster");
        let users = self.users.get().expect("users");
        let hasher = self.hasher.get().expect("hasher");
        self.block_on(ensure_users(&users, &hasher, &roster))
            .expect("provision roster")
    }

    fn setup(&self, password: &str) {
        let start = Utc
            .with_ymd_and_hms(2024, 1, 15, 9, 0, 0)
            .single()
            .expect("valid timestamp");
        let clock = Arc::new(MutableClock::new(start));
        let users = Arc::new(InMemoryUserRepository::new());
        let hasher = Arc::new(Argon2PasswordHasher::new());
        let tokens = Arc::new(JwtTokenService::new(SECRET, TimeDelta::hours(12)));
        let service = Arc::new(AuthService::new(
            users.clone(),
            hasher.clone(),
            tokens,
            clock.clone(),
        ));

        self.runtime.set(RuntimeHandle(Arc::new(
            Runtime::new().expect("create runtime"),
        )));
        self.users.set(users);
        self.hasher.set(hasher);
        self.clock.set(clock);
        self.service.set(service);
        self.created.set(self.provision(password));
    }

    fn login(&self, username: &str, password: &str) -> Result<LoginSession, Error> {
        let credentials =
            LoginCredentials::try_from_parts(username, password).expect("valid credentials");
        let service = self.service.get().expect("service");
        self.block_on(service.login(&credentials))
    }

    fn session(&self) -> LoginSession {
        self.last_login
            .get()
            .expect("login attempted")
            .expect("login should succeed")
    }
}

#[fixture]
fn world() -> AuthWorld {
    AuthWorld::default()
}

// -----------------------------------------------------------------------------
// Given Steps
// -----------------------------------------------------------------------------

#[given("a provisioned roster with default password {password}")]
fn a_provisioned_roster(world: &AuthWorld, password: String) {
    world.setup(&password);
    assert_eq!(world.created.get(), Some(2));
}

#[given("{name} has logged in with password {password}")]
fn has_logged_in(world: &AuthWorld, name: String, password: String) {
    let result = world.login(&name, &password);
    assert!(result.is_ok(), "setup login failed: {result:?}");
    world.last_login.set(result);
}

// -----------------------------------------------------------------------------
// When Steps
// -----------------------------------------------------------------------------

#[when("{name} logs in with password {password}")]
fn logs_in_with_password(world: &AuthWorld, name: String, password: String) {
    world.last_login.set(world.login(&name, &password));
}

#[when("{hours} hours pass")]
fn hours_pass(world: &AuthWorld, hours: i64) {
    world.clock.get().expect("clock").advance(TimeDelta::hours(hours));
}

#[when("the roster is provisioned again with default password {password}")]
fn the_roster_is_provisioned_again(world: &AuthWorld, password: String) {
    world.created.set(world.provision(&password));
}

// -----------------------------------------------------------------------------
// Then Steps
// -----------------------------------------------------------------------------

#[then("the login succeeds")]
fn the_login_succeeds(world: &AuthWorld) {
    let session = world.session();
    assert!(!session.token.as_str().is_empty());
    assert_eq!(
        session.token.expires_at(),
        Utc.with_ymd_and_hms(2024, 1, 15, 21, 0, 0)
            .single()
            .expect("valid timestamp")
    );
}

#[then("the token identifies {name} with role {role}")]
fn the_token_identifies(world: &AuthWorld, name: String, role: String) {
    let session = world.session();
    let service = world.service.get().expect("service");
    let user = service
        .authenticate(session.token.as_str())
        .expect("token should verify");

    let expected: Role = role.parse().expect("known role");
    assert_eq!(user.username().as_ref(), name);
    assert_eq!(user.role(), expected);
    assert_eq!(user.can_edit(), expected == Role::Editor);
    assert_eq!(user.id(), session.user.id());
}

#[then("the login is rejected as unauthorised")]
fn the_login_is_rejected(world: &AuthWorld) {
    let error = world
        .last_login
        .get()
        .expect("login attempted")
        .expect_err("login should fail");
    assert_eq!(error.code(), ErrorCode::Unauthorized);
}

#[then("the token is rejected as unauthorised")]
fn the_token_is_rejected(world: &AuthWorld) {
    let session = world.session();
    let service = world.service.get().expect("service");
    let error = service
        .authenticate(session.token.as_str())
        .expect_err("expired token should fail");
    assert_eq!(error.code(), ErrorCode::Unauthorized);
}

#[then("no accounts are created")]
fn no_accounts_are_created(world: &AuthWorld) {
    assert_eq!(world.created.get(), Some(0));
}

#[then("{name} can still log in with password {password}")]
fn can_still_log_in(world: &AuthWorld, name: String, password: String) {
    let session = world.login(&name, &password).expect("login should succeed");
    assert_eq!(session.user.username().as_ref(), name);
}

// -----------------------------------------------------------------------------
// Scenario Bindings
// -----------------------------------------------------------------------------

#[scenario(
    path = "tests/features/authentication.feature",
    name = "A roster member logs in with the default password"
)]
fn roster_member_logs_in(world: AuthWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/authentication.feature",
    name = "Viewers receive read-only identities"
)]
fn viewers_receive_read_only_identities(world: AuthWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/authentication.feature",
    name = "Wrong passwords are rejected"
)]
fn wrong_passwords_are_rejected(world: AuthWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/authentication.feature",
    name = "Unknown users are rejected like wrong passwords"
)]
fn unknown_users_are_rejected(world: AuthWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/authentication.feature",
    name = "Tokens expire after their lifetime"
)]
fn tokens_expire(world: AuthWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/authentication.feature",
    name = "Provisioning again leaves existing accounts untouched"
)]
fn provisioning_again_is_idempotent(world: AuthWorld) {
    let _ = world;
}
