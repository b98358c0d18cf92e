//! Domain primitives, aggregates and services.
//!
//! Purpose: define strongly typed loan and user entities, the pure derivation
//! rules over them, and the services that implement the driving ports. Keep
//! types immutable where possible and document invariants in each type's
//! Rustdoc.
//!
//! Public surface:
//! - Error / ErrorCode: transport-agnostic failure payload.
//! - Loan, LoanTerms, Payment, PaymentStatus, Money: the loan aggregate.
//! - LoanSummary, BalancePoint: derived read models.
//! - LoanService, AuthService, ensure_users: use-case implementations.

pub mod auth;
pub mod auth_service;
pub mod error;
pub mod loan;
pub mod loan_service;
pub mod ports;
pub mod roster;
pub mod trace_id;
pub mod user;

pub use self::auth::{
    AccessToken, AuthenticatedUser, INVALID_LOGIN_MESSAGE, INVALID_TOKEN_MESSAGE,
    LoginCredentials, LoginSession, LoginValidationError, MISSING_TOKEN_MESSAGE,
};
pub use self::auth_service::AuthService;
pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::loan::{
    BalancePoint, DueMonth, Loan, LoanId, LoanSummary, LoanTerms, LoanTermsError, Money, Payment,
    PaymentId, PaymentStatus, PaymentStatusParseError, PaymentUpdate, ScheduledPayment,
    balance_series, default_payments, missing_months,
};
pub use self::loan_service::{
    LoanService, LoanSnapshot, MONTH_OUT_OF_RANGE_MESSAGE, READ_ONLY_MESSAGE, require_editor,
};
pub use self::roster::{Roster, RosterEntry, ensure_users};
pub use self::trace_id::{TRACE_ID_HEADER, TraceId};
pub use self::user::{Role, USERNAME_MAX, User, UserId, UserValidationError, Username};

