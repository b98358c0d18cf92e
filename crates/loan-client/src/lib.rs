//! Terminal client for the loan repayment tracker.
//!
//! `loanctl` logs in against the loan service, stores the issued token, and
//! shows the loan dashboard and payment schedule. Totals are recomputed from
//! the schedule and compared with the service's own summary.

pub mod api;
pub mod cli;
pub mod commands;
pub mod derive;
mod error;
pub mod render;
pub mod token_store;

pub use api::{ApiClient, LoanView, PaymentStatus, PaymentView, StatusChange};
pub use cli::{Cli, Command};
pub use commands::run;
pub use derive::LocalSummary;
pub use error::ClientError;
pub use token_store::{StoredToken, TokenStore};
