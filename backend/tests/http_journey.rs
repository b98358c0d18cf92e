//! End-to-end HTTP coverage over the real authentication and loan services.
//!
//! Requests pass through the trace middleware and the full route table; the
//! stores are in-memory so no database is needed.

use std::sync::Arc;

use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::{StatusCode, header};
use actix_web::{App, test, web};
use chrono::TimeDelta;
use loan_backend::Trace;
use loan_backend::domain::{
    AuthService, LoanService, LoanTerms, Money, Roster, TRACE_ID_HEADER, ensure_users,
};
use loan_backend::inbound::http::configure;
use loan_backend::inbound::http::health::root;
use loan_backend::inbound::http::state::HttpState;
use loan_backend::outbound::memory::{InMemoryLoanRepository, InMemoryUserRepository};
use loan_backend::outbound::security::{Argon2PasswordHasher, JwtTokenService};
use mockable::DefaultClock;
use rstest::{fixture, rstest};
use serde_json::{Value, json};

#[fixture]
fn terms() -> LoanTerms {
    LoanTerms::try_new(Money::from_cents(2_000_000), Money::from_cents(33_000), 60)
        .expect("valid terms")
}

async fn seeded_state(terms: LoanTerms) -> HttpState {
    let clock = Arc::new(DefaultClock);
    let users = Arc::new(InMemoryUserRepository::new());
    let hasher = Arc::new(Argon2PasswordHasher::new());
    let roster = Roster::try_new(["Frank", "Jasper"], ["Jasper"], "BMW123").expect("roster");
    ensure_users(&users, &hasher, &roster)
        .await
        .expect("provision roster");

    let tokens = Arc::new(JwtTokenService::new(b"journey-secret", TimeDelta::hours(12)));
    let login = Arc::new(AuthService::new(users, hasher, tokens, clock.clone()));
    let loans = Arc::new(LoanService::new(
        Arc::new(InMemoryLoanRepository::new()),
        terms,
        clock,
    ));
    HttpState::new(login, loans.clone(), loans)
}

async fn app(
    terms: LoanTerms,
) -> impl Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error> {
    test::init_service(
        App::new()
            .app_data(web::Data::new(seeded_state(terms).await))
            .wrap(Trace)
            .configure(configure)
            .service(root),
    )
    .await
}

async fn login<S>(app: &S, username: &str, password: &str) -> ServiceResponse
where
    S: Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let request = test::TestRequest::post()
        .uri("/auth/login")
        .set_json(json!({ "username": username, "password": password }))
        .to_request();
    test::call_service(app, request).await
}

async fn token_for<S>(app: &S, username: &str) -> String
where
    S: Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let response = login(app, username, "BMW123").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = test::read_body_json(response).await;
    body["token"].as_str().expect("token").to_owned()
}

fn bearer(token: &str) -> (header::HeaderName, String) {
    (header::AUTHORIZATION, format!("Bearer {token}"))
}

#[rstest]
#[actix_web::test]
async fn editor_marks_a_payment_and_the_summary_follows(terms: LoanTerms) {
    let app = app(terms).await;
    let token = token_for(&app, "Jasper").await;

    let me = test::TestRequest::get()
        .uri("/auth/me")
        .insert_header(bearer(&token))
        .to_request();
    let me: Value = test::call_and_read_body_json(&app, me).await;
    assert_eq!(me["username"], "Jasper");
    assert_eq!(me["canEdit"], true);

    let mark = test::TestRequest::post()
        .uri("/payments/1")
        .insert_header(bearer(&token))
        .set_json(json!({ "status": "PAID", "paidAt": "2024-02-01", "note": "first" }))
        .to_request();
    let marked: Value = test::call_and_read_body_json(&app, mark).await;
    assert_eq!(marked["status"], "PAID");
    assert_eq!(marked["paidAt"], "2024-02-01T00:00:00Z");
    assert_eq!(marked["note"], "first");

    let loan = test::TestRequest::get()
        .uri("/loan")
        .insert_header(bearer(&token))
        .to_request();
    let loan: Value = test::call_and_read_body_json(&app, loan).await;
    assert_eq!(loan["totalPaid"], 330.0);
    assert_eq!(loan["outstanding"], 19_670.0);
    assert_eq!(loan["paidMonths"], 1);
    assert_eq!(loan["remainingMonths"], 59);
}

#[rstest]
#[actix_web::test]
async fn viewer_reads_but_cannot_change_payments(terms: LoanTerms) {
    let app = app(terms).await;
    let token = token_for(&app, "Frank").await;

    let list = test::TestRequest::get()
        .uri("/payments")
        .insert_header(bearer(&token))
        .to_request();
    let payments: Value = test::call_and_read_body_json(&app, list).await;
    assert_eq!(payments.as_array().map(Vec::len), Some(60));

    let mark = test::TestRequest::post()
        .uri("/payments/1")
        .insert_header(bearer(&token))
        .set_json(json!({ "status": "PAID" }))
        .to_request();
    let response = test::call_service(&app, mark).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert!(response.headers().contains_key(TRACE_ID_HEADER));
    let body: Value = test::read_body_json(response).await;
    assert!(body["message"].is_string());
    assert!(body.get("code").is_none());
}

#[rstest]
#[case("Frank", "wrong")]
#[case("Mallory", "BMW123")]
#[actix_web::test]
async fn bad_credentials_share_one_response(
    terms: LoanTerms,
    #[case] username: &str,
    #[case] password: &str,
) {
    let app = app(terms).await;

    let response = login(&app, username, password).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body: Value = test::read_body_json(response).await;
    assert_eq!(body["message"], "Invalid username or password");
    assert!(body["traceId"].is_string());
}

#[rstest]
#[actix_web::test]
async fn root_reports_the_service_is_running(terms: LoanTerms) {
    let app = app(terms).await;

    let response = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = test::read_body(response).await;
    assert_eq!(body.as_ref(), b"Loan service is running");
}
