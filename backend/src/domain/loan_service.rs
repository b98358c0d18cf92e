//! Loan domain service.
//!
//! Implements the [`LoanQuery`] and [`PaymentCommand`] driving ports over a
//! [`LoanRepository`]. Every operation starts from [`LoanService::ensure_loan`]
//! so reads and writes always see a complete schedule.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use serde_json::json;
use tracing::{info, warn};

use crate::domain::ports::{LoanPersistenceError, LoanQuery, LoanRepository, PaymentCommand};
use crate::domain::{
    AuthenticatedUser, BalancePoint, Error, Loan, LoanSummary, LoanTerms, Payment, PaymentUpdate,
    ScheduledPayment, balance_series, default_payments, missing_months,
};

/// Message returned when a non-editor attempts a mutation.
pub const READ_ONLY_MESSAGE: &str = "Only editors may change payments";
/// Message returned when a month lies outside the loan term.
pub const MONTH_OUT_OF_RANGE_MESSAGE: &str = "Month is outside the loan term";

/// The loan and its complete payment list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoanSnapshot {
    pub loan: Loan,
    /// Ascending by month.
    pub payments: Vec<Payment>,
}

/// Reject identities that may not change payment status.
pub fn require_editor(actor: &AuthenticatedUser) -> Result<(), Error> {
    if actor.can_edit() {
        return Ok(());
    }
    warn!(username = %actor.username(), "read-only user attempted a payment change");
    Err(Error::forbidden(READ_ONLY_MESSAGE))
}

/// Loan service implementing the loan driving ports.
#[derive(Clone)]
pub struct LoanService<R> {
    repo: Arc<R>,
    terms: LoanTerms,
    clock: Arc<dyn Clock>,
}

impl<R> LoanService<R> {
    /// Create a service that opens new loans with `terms`.
    pub fn new(repo: Arc<R>, terms: LoanTerms, clock: Arc<dyn Clock>) -> Self {
        Self { repo, terms, clock }
    }
}

impl<R> LoanService<R>
where
    R: LoanRepository,
{
    fn map_persistence_error(error: LoanPersistenceError) -> Error {
        match error {
            LoanPersistenceError::Connection { message } => {
                Error::internal(format!("loan repository unavailable: {message}"))
            }
            LoanPersistenceError::Query { message } => {
                Error::internal(format!("loan repository error: {message}"))
            }
        }
    }

    async fn find_or_open_loan(&self) -> Result<Loan, Error> {
        if let Some(loan) = self
            .repo
            .find_loan()
            .await
            .map_err(Self::map_persistence_error)?
        {
            return Ok(loan);
        }

        let loan = Loan::open(self.terms, self.clock.utc());
        let months: Vec<u32> = (1..=self.terms.total_months()).collect();
        let payments = default_payments(&loan, &months);
        self.repo
            .create_loan(&loan, &payments)
            .await
            .map_err(Self::map_persistence_error)?;
        info!(loan_id = %loan.id(), months = payments.len(), "opened loan");

        // A concurrent opener may have won; the earliest loan is authoritative.
        let stored = self
            .repo
            .find_loan()
            .await
            .map_err(Self::map_persistence_error)?;
        Ok(stored.unwrap_or(loan))
    }

    /// Return the loan with a payment row for every month of its term.
    ///
    /// Opens the loan with the configured terms when none exists, and inserts
    /// exactly the missing months when the schedule has gaps. Idempotent.
    pub async fn ensure_loan(&self) -> Result<LoanSnapshot, Error> {
        let loan = self.find_or_open_loan().await?;
        let mut payments = self
            .repo
            .list_payments(&loan.id())
            .await
            .map_err(Self::map_persistence_error)?;

        let missing = missing_months(
            loan.terms().total_months(),
            payments.iter().map(|p| p.month),
        );
        if !missing.is_empty() {
            let inserted = self
                .repo
                .insert_missing_payments(&default_payments(&loan, &missing))
                .await
                .map_err(Self::map_persistence_error)?;
            info!(loan_id = %loan.id(), inserted, "backfilled payment schedule");
            payments = self
                .repo
                .list_payments(&loan.id())
                .await
                .map_err(Self::map_persistence_error)?;
        }

        payments.sort_by_key(|p| p.month);
        Ok(LoanSnapshot { loan, payments })
    }
}

#[async_trait]
impl<R> LoanQuery for LoanService<R>
where
    R: LoanRepository,
{
    async fn summary(&self) -> Result<LoanSummary, Error> {
        let snapshot = self.ensure_loan().await?;
        Ok(LoanSummary::derive(&snapshot.loan, &snapshot.payments))
    }

    async fn payments(&self) -> Result<Vec<ScheduledPayment>, Error> {
        let LoanSnapshot { loan, payments } = self.ensure_loan().await?;
        Ok(payments
            .into_iter()
            .map(|payment| ScheduledPayment::new(&loan, payment))
            .collect())
    }

    async fn schedule(&self) -> Result<Vec<BalancePoint>, Error> {
        let snapshot = self.ensure_loan().await?;
        Ok(balance_series(&snapshot.loan, &snapshot.payments))
    }
}

#[async_trait]
impl<R> PaymentCommand for LoanService<R>
where
    R: LoanRepository,
{
    async fn set_status(
        &self,
        actor: &AuthenticatedUser,
        update: PaymentUpdate,
    ) -> Result<ScheduledPayment, Error> {
        require_editor(actor)?;

        let LoanSnapshot { loan, payments } = self.ensure_loan().await?;
        if !loan.contains_month(update.month) {
            return Err(
                Error::invalid_request(MONTH_OUT_OF_RANGE_MESSAGE).with_details(json!({
                    "month": update.month,
                    "totalMonths": loan.terms().total_months(),
                })),
            );
        }

        // The row normally exists after backfill; fall back to a default row
        // so the upsert still creates it after out-of-band loss.
        let current = payments
            .into_iter()
            .find(|p| p.month == update.month)
            .unwrap_or_else(|| Payment::unpaid(&loan, update.month));
        let changed = current.apply(&update, self.clock.utc());
        let stored = self
            .repo
            .upsert_payment(&changed)
            .await
            .map_err(Self::map_persistence_error)?;

        info!(
            month = stored.month,
            status = %stored.status,
            username = %actor.username(),
            "payment status updated"
        );
        Ok(ScheduledPayment::new(&loan, stored))
    }
}

#[cfg(test)]
#[path = "loan_service_tests.rs"]
mod tests;
