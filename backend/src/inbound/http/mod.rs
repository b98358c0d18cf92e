//! HTTP inbound adapter exposing REST endpoints.

pub mod auth;
pub mod bearer;
pub mod error;
pub mod health;
pub mod loan;
pub mod loan_dto;
pub mod state;
#[cfg(test)]
pub mod test_utils;

use actix_web::web;

pub use error::ApiResult;

/// Register the authentication, loan and payment routes.
///
/// Expects a `web::Data<HttpState>` to be registered on the app.
///
/// # Examples
/// ```no_run
/// use actix_web::{App, web};
/// use loan_backend::inbound::http::{configure, state::HttpState};
///
/// fn app(state: HttpState) {
///     let _app = App::new().app_data(web::Data::new(state)).configure(configure);
/// }
/// ```
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(error::json_error_handler))
        .service(auth::login)
        .service(auth::me)
        .service(loan::get_loan)
        .service(loan::get_schedule)
        .service(loan::list_payments)
        .service(loan::set_payment_status);
}
