//! Test helpers for inbound HTTP components.

use std::sync::Arc;

use actix_web::dev::{Service, ServiceResponse};
use actix_web::{App, test, web};
use mockable::DefaultClock;

use crate::domain::ports::{LoginService, MockLoginService};
use crate::domain::{
    AuthenticatedUser, Error, INVALID_TOKEN_MESSAGE, LoanService, LoanTerms, Money, Role, UserId,
    Username,
};
use crate::outbound::memory::InMemoryLoanRepository;

use super::state::HttpState;
use super::{configure, health};

/// Token accepted for [`editor`] by [`token_login`].
pub const EDITOR_TOKEN: &str = "editor-token";
/// Token accepted for [`viewer`] by [`token_login`].
pub const VIEWER_TOKEN: &str = "viewer-token";

fn identity(name: &str, role: Role) -> AuthenticatedUser {
    AuthenticatedUser::new(
        UserId::random(),
        Username::new(name).expect("valid username"),
        role,
    )
}

/// The editor identity.
pub fn editor() -> AuthenticatedUser {
    identity("Jasper", Role::Editor)
}

/// A read-only identity.
pub fn viewer() -> AuthenticatedUser {
    identity("Frank", Role::Viewer)
}

/// Login port that only authenticates the two fixed test tokens.
pub fn token_login() -> MockLoginService {
    let mut login = MockLoginService::new();
    login.expect_authenticate().returning(|token| match token {
        EDITOR_TOKEN => Ok(editor()),
        VIEWER_TOKEN => Ok(viewer()),
        _ => Err(Error::unauthorized(INVALID_TOKEN_MESSAGE)),
    });
    login
}

/// Default 20 000 / 330 / 60 terms.
pub fn default_terms() -> LoanTerms {
    LoanTerms::try_new(Money::from_units(20_000), Money::from_units(330), 60)
        .expect("valid terms")
}

/// Loan service over a fresh in-memory repository.
pub fn memory_loan_service(
    repo: Arc<InMemoryLoanRepository>,
) -> Arc<LoanService<InMemoryLoanRepository>> {
    Arc::new(LoanService::new(repo, default_terms(), Arc::new(DefaultClock)))
}

/// State with the given login port and an in-memory loan.
pub fn state_with_login(login: impl LoginService + 'static) -> HttpState {
    let loans = memory_loan_service(Arc::new(InMemoryLoanRepository::new()));
    HttpState::new(Arc::new(login), loans.clone(), loans)
}

/// Initialise an app serving the API routes and `GET /` over `state`.
pub async fn init_app(
    state: HttpState,
) -> impl Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error> {
    test::init_service(
        App::new()
            .app_data(web::Data::new(state))
            .configure(configure)
            .service(health::root),
    )
    .await
}
