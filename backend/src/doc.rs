//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] registers every HTTP handler and payload schema, plus the
//! bearer-token security scheme. The document is served by Swagger UI in
//! debug builds and exported via `cargo run --bin openapi-dump`.

use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::inbound::http::auth::{LoginRequest, LoginResponse, MeResponse};
use crate::inbound::http::error::ErrorBody;
use crate::inbound::http::loan_dto::{
    BalancePointResponse, LoanResponse, PaymentResponse, SetPaymentStatusRequest,
};

/// Enrich the generated document with the bearer token security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        let mut scheme = Http::new(HttpAuthScheme::Bearer);
        scheme.bearer_format = Some("JWT".to_owned());
        scheme.description = Some("Token issued by POST /auth/login.".to_owned());
        components.add_security_scheme("BearerToken", SecurityScheme::Http(scheme));
    }
}

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Loan tracker API",
        description = "Loan summary, payment schedule and editor-only payment status changes."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("BearerToken" = [])),
    paths(
        crate::inbound::http::auth::login,
        crate::inbound::http::auth::me,
        crate::inbound::http::loan::get_loan,
        crate::inbound::http::loan::get_schedule,
        crate::inbound::http::loan::list_payments,
        crate::inbound::http::loan::set_payment_status,
        crate::inbound::http::health::root,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        ErrorBody,
        LoginRequest,
        LoginResponse,
        MeResponse,
        LoanResponse,
        PaymentResponse,
        BalancePointResponse,
        SetPaymentStatusRequest,
    )),
    tags(
        (name = "auth", description = "Login and identity"),
        (name = "loan", description = "Loan summary and balance schedule"),
        (name = "payments", description = "Monthly installments"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;
