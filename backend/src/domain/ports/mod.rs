//! Domain ports and supporting types for the hexagonal boundary.
//!
//! Driven ports (`LoanRepository`, `UserRepository`, `PasswordHasher`,
//! `TokenService`) are implemented by outbound adapters. Driving ports
//! (`LoanQuery`, `PaymentCommand`, `LoginService`) are implemented by domain
//! services and called by inbound adapters.

mod macros;
pub(crate) use macros::define_port_error;

mod loan_query;
mod loan_repository;
mod login_service;
mod password_hasher;
mod payment_command;
mod token_service;
mod user_repository;

#[cfg(test)]
pub use loan_query::MockLoanQuery;
pub use loan_query::LoanQuery;
#[cfg(test)]
pub use loan_repository::MockLoanRepository;
pub use loan_repository::{LoanPersistenceError, LoanRepository};
#[cfg(test)]
pub use login_service::MockLoginService;
pub use login_service::LoginService;
#[cfg(test)]
pub use password_hasher::MockPasswordHasher;
pub use password_hasher::{PasswordHashError, PasswordHasher};
#[cfg(test)]
pub use payment_command::MockPaymentCommand;
pub use payment_command::PaymentCommand;
#[cfg(test)]
pub use token_service::MockTokenService;
pub use token_service::{TokenError, TokenService};
#[cfg(test)]
pub use user_repository::MockUserRepository;
pub use user_repository::{UserAccount, UserPersistenceError, UserRepository};
