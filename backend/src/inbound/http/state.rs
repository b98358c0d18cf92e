//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on domain ports (use-cases) and remain testable without I/O.

use std::sync::Arc;

use crate::domain::ports::{LoanQuery, LoginService, PaymentCommand};

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub login: Arc<dyn LoginService>,
    pub loans: Arc<dyn LoanQuery>,
    pub payments: Arc<dyn PaymentCommand>,
}

impl HttpState {
    /// Construct state from port implementations.
    ///
    /// # Examples
    /// ```no_run
    /// use std::sync::Arc;
    ///
    /// use loan_backend::domain::ports::{LoanQuery, LoginService, PaymentCommand};
    /// use loan_backend::inbound::http::state::HttpState;
    ///
    /// fn wire(
    ///     login: Arc<dyn LoginService>,
    ///     loans: Arc<dyn LoanQuery>,
    ///     payments: Arc<dyn PaymentCommand>,
    /// ) -> HttpState {
    ///     HttpState::new(login, loans, payments)
    /// }
    /// ```
    pub fn new(
        login: Arc<dyn LoginService>,
        loans: Arc<dyn LoanQuery>,
        payments: Arc<dyn PaymentCommand>,
    ) -> Self {
        Self {
            login,
            loans,
            payments,
        }
    }
}
