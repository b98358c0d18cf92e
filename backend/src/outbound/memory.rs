//! In-process repositories used when no database URL is configured.
//!
//! State lives for the lifetime of the process. The adapters honour the same
//! port contracts as the Diesel ones: payments are unique on
//! `(loan_id, month)`, backfill never overwrites, and usernames are unique.

use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use crate::domain::ports::{
    LoanPersistenceError, LoanRepository, UserAccount, UserPersistenceError, UserRepository,
};
use crate::domain::{Loan, LoanId, Payment, Username};

#[derive(Debug, Default)]
struct LoanState {
    loans: Vec<Loan>,
    payments: Vec<Payment>,
}

/// Loan repository backed by process memory.
#[derive(Debug, Default)]
pub struct InMemoryLoanRepository {
    state: Mutex<LoanState>,
}

impl InMemoryLoanRepository {
    /// Create an empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, LoanState>, LoanPersistenceError> {
        self.state
            .lock()
            .map_err(|_| LoanPersistenceError::query("loan store lock poisoned"))
    }

    /// Remove the row for `month`, simulating out-of-band row loss.
    pub fn remove_payment(&self, month: u32) -> Result<bool, LoanPersistenceError> {
        let mut state = self.lock()?;
        let before = state.payments.len();
        state.payments.retain(|p| p.month != month);
        Ok(state.payments.len() != before)
    }
}

fn same_slot(a: &Payment, b: &Payment) -> bool {
    a.loan_id == b.loan_id && a.month == b.month
}

#[async_trait]
impl LoanRepository for InMemoryLoanRepository {
    async fn find_loan(&self) -> Result<Option<Loan>, LoanPersistenceError> {
        Ok(self.lock()?.loans.first().cloned())
    }

    async fn create_loan(
        &self,
        loan: &Loan,
        payments: &[Payment],
    ) -> Result<(), LoanPersistenceError> {
        let mut state = self.lock()?;
        state.loans.push(loan.clone());
        for payment in payments {
            if !state.payments.iter().any(|p| same_slot(p, payment)) {
                state.payments.push(payment.clone());
            }
        }
        Ok(())
    }

    async fn list_payments(&self, loan_id: &LoanId) -> Result<Vec<Payment>, LoanPersistenceError> {
        let state = self.lock()?;
        let mut rows: Vec<Payment> = state
            .payments
            .iter()
            .filter(|p| p.loan_id == *loan_id)
            .cloned()
            .collect();
        rows.sort_by_key(|p| p.month);
        Ok(rows)
    }

    async fn insert_missing_payments(
        &self,
        payments: &[Payment],
    ) -> Result<usize, LoanPersistenceError> {
        let mut state = self.lock()?;
        let mut inserted = 0;
        for payment in payments {
            if !state.payments.iter().any(|p| same_slot(p, payment)) {
                state.payments.push(payment.clone());
                inserted += 1;
            }
        }
        Ok(inserted)
    }

    async fn upsert_payment(&self, payment: &Payment) -> Result<Payment, LoanPersistenceError> {
        let mut state = self.lock()?;
        if let Some(row) = state.payments.iter_mut().find(|p| same_slot(p, payment)) {
            row.status = payment.status;
            row.paid_at = payment.paid_at;
            row.note = payment.note.clone();
            return Ok(row.clone());
        }
        state.payments.push(payment.clone());
        Ok(payment.clone())
    }
}

/// User repository backed by process memory.
#[derive(Debug, Default)]
pub struct InMemoryUserRepository {
    accounts: Mutex<Vec<UserAccount>>,
}

impl InMemoryUserRepository {
    /// Create an empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Vec<UserAccount>>, UserPersistenceError> {
        self.accounts
            .lock()
            .map_err(|_| UserPersistenceError::query("user store lock poisoned"))
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_username(
        &self,
        username: &Username,
    ) -> Result<Option<UserAccount>, UserPersistenceError> {
        Ok(self
            .lock()?
            .iter()
            .find(|account| account.user.username() == username)
            .cloned())
    }

    async fn insert_if_absent(&self, account: &UserAccount) -> Result<bool, UserPersistenceError> {
        let mut accounts = self.lock()?;
        if accounts
            .iter()
            .any(|existing| existing.user.username() == account.user.username())
        {
            return Ok(false);
        }
        accounts.push(account.clone());
        Ok(true)
    }
}
