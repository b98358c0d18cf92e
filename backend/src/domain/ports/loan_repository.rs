//! Port abstraction for loan and payment persistence adapters.

use async_trait::async_trait;

use crate::domain::{Loan, LoanId, Payment};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by loan repository adapters.
    pub enum LoanPersistenceError {
        /// Repository connection could not be established.
        Connection { message: String } => "loan repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "loan repository query failed: {message}",
    }
}

/// Storage for the singleton loan and its monthly payment rows.
///
/// Payment rows are unique on `(loan_id, month)`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LoanRepository: Send + Sync {
    /// The earliest-created loan, if any exists.
    async fn find_loan(&self) -> Result<Option<Loan>, LoanPersistenceError>;

    /// Persist a new loan together with its initial schedule atomically.
    async fn create_loan(
        &self,
        loan: &Loan,
        payments: &[Payment],
    ) -> Result<(), LoanPersistenceError>;

    /// All payment rows of a loan, ascending by month.
    async fn list_payments(&self, loan_id: &LoanId) -> Result<Vec<Payment>, LoanPersistenceError>;

    /// Insert rows whose `(loan_id, month)` is absent, leaving existing rows
    /// untouched. Returns the number of rows inserted.
    async fn insert_missing_payments(
        &self,
        payments: &[Payment],
    ) -> Result<usize, LoanPersistenceError>;

    /// Insert the row, or on a `(loan_id, month)` conflict overwrite its
    /// status, paid date and note in place. Returns the stored row.
    async fn upsert_payment(&self, payment: &Payment) -> Result<Payment, LoanPersistenceError>;
}
