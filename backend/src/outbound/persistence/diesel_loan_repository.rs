//! PostgreSQL-backed `LoanRepository` implementation using Diesel ORM.
//!
//! Backfill inserts use `ON CONFLICT DO NOTHING` on `(loan_id, month)` so
//! concurrent backfills converge; the status upsert uses `DO UPDATE` on the
//! same key.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};

use crate::domain::ports::{LoanPersistenceError, LoanRepository};
use crate::domain::{Loan, LoanId, LoanTerms, Money, Payment, PaymentId, PaymentStatus};

use super::diesel_error_mapping::{map_diesel_error, map_pool_error};
use super::models::{LoanRow, NewLoanRow, PaymentRow, PaymentStatusChangeset};
use super::pool::{DbPool, PoolError};
use super::schema::{loans, payments};

/// Diesel-backed implementation of the [`LoanRepository`] port.
#[derive(Clone)]
pub struct DieselLoanRepository {
    pool: DbPool,
}

impl DieselLoanRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn pool_error(error: PoolError) -> LoanPersistenceError {
    map_pool_error(error, LoanPersistenceError::connection)
}

fn diesel_error(error: diesel::result::Error) -> LoanPersistenceError {
    map_diesel_error(
        error,
        LoanPersistenceError::query,
        LoanPersistenceError::connection,
    )
}

fn corrupt(what: &str, detail: impl std::fmt::Display) -> LoanPersistenceError {
    LoanPersistenceError::query(format!("invalid stored {what}: {detail}"))
}

fn row_to_loan(row: LoanRow) -> Result<Loan, LoanPersistenceError> {
    let total_months = u32::try_from(row.total_months).map_err(|err| corrupt("term", err))?;
    let terms = LoanTerms::try_new(
        Money::from_cents(row.principal_cents),
        Money::from_cents(row.monthly_payment_cents),
        total_months,
    )
    .map_err(|err| corrupt("terms", err))?;
    Ok(Loan::new(LoanId::from(row.id), terms, row.start_date))
}

fn loan_to_row(loan: &Loan) -> Result<NewLoanRow, LoanPersistenceError> {
    let terms = loan.terms();
    Ok(NewLoanRow {
        id: *loan.id().as_uuid(),
        principal_cents: terms.principal().cents(),
        monthly_payment_cents: terms.monthly_payment().cents(),
        total_months: i32::try_from(terms.total_months())
            .map_err(|_| LoanPersistenceError::query("loan term exceeds storage range"))?,
        start_date: loan.start_date(),
    })
}

fn row_to_payment(row: PaymentRow) -> Result<Payment, LoanPersistenceError> {
    let month = u32::try_from(row.month).map_err(|err| corrupt("month", err))?;
    let status: PaymentStatus = row.status.parse().map_err(|err| corrupt("status", err))?;
    Ok(Payment {
        id: PaymentId::from(row.id),
        loan_id: LoanId::from(row.loan_id),
        month,
        amount: Money::from_cents(row.amount_cents),
        status,
        paid_at: row.paid_at,
        note: row.note,
    })
}

fn payment_to_row(payment: &Payment) -> Result<PaymentRow, LoanPersistenceError> {
    Ok(PaymentRow {
        id: *payment.id.as_uuid(),
        loan_id: *payment.loan_id.as_uuid(),
        month: i32::try_from(payment.month)
            .map_err(|_| LoanPersistenceError::query("month exceeds storage range"))?,
        amount_cents: payment.amount.cents(),
        status: payment.status.as_str().to_owned(),
        paid_at: payment.paid_at,
        note: payment.note.clone(),
    })
}

fn payments_to_rows(payments: &[Payment]) -> Result<Vec<PaymentRow>, LoanPersistenceError> {
    payments.iter().map(payment_to_row).collect()
}

#[async_trait]
impl LoanRepository for DieselLoanRepository {
    async fn find_loan(&self) -> Result<Option<Loan>, LoanPersistenceError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;

        let row = loans::table
            .order((loans::created_at.asc(), loans::id.asc()))
            .select(LoanRow::as_select())
            .first::<LoanRow>(&mut conn)
            .await
            .optional()
            .map_err(diesel_error)?;

        row.map(row_to_loan).transpose()
    }

    async fn create_loan(
        &self,
        loan: &Loan,
        payments: &[Payment],
    ) -> Result<(), LoanPersistenceError> {
        let loan_row = loan_to_row(loan)?;
        let payment_rows = payments_to_rows(payments)?;
        let mut conn = self.pool.get().await.map_err(pool_error)?;

        conn.transaction(|conn| {
            async move {
                diesel::insert_into(loans::table)
                    .values(&loan_row)
                    .execute(conn)
                    .await?;

                if !payment_rows.is_empty() {
                    diesel::insert_into(payments::table)
                        .values(&payment_rows)
                        .on_conflict((payments::loan_id, payments::month))
                        .do_nothing()
                        .execute(conn)
                        .await?;
                }
                Ok::<_, diesel::result::Error>(())
            }
            .scope_boxed()
        })
        .await
        .map_err(diesel_error)
    }

    async fn list_payments(&self, loan_id: &LoanId) -> Result<Vec<Payment>, LoanPersistenceError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;

        let rows: Vec<PaymentRow> = payments::table
            .filter(payments::loan_id.eq(loan_id.as_uuid()))
            .order(payments::month.asc())
            .select(PaymentRow::as_select())
            .load(&mut conn)
            .await
            .map_err(diesel_error)?;

        rows.into_iter().map(row_to_payment).collect()
    }

    async fn insert_missing_payments(
        &self,
        payments: &[Payment],
    ) -> Result<usize, LoanPersistenceError> {
        if payments.is_empty() {
            return Ok(0);
        }
        let rows = payments_to_rows(payments)?;
        let mut conn = self.pool.get().await.map_err(pool_error)?;

        diesel::insert_into(payments::table)
            .values(&rows)
            .on_conflict((payments::loan_id, payments::month))
            .do_nothing()
            .execute(&mut conn)
            .await
            .map_err(diesel_error)
    }

    async fn upsert_payment(&self, payment: &Payment) -> Result<Payment, LoanPersistenceError> {
        let row = payment_to_row(payment)?;
        let changeset = PaymentStatusChangeset {
            status: payment.status.as_str(),
            paid_at: payment.paid_at,
            note: payment.note.as_deref(),
        };
        let mut conn = self.pool.get().await.map_err(pool_error)?;

        let stored = diesel::insert_into(payments::table)
            .values(&row)
            .on_conflict((payments::loan_id, payments::month))
            .do_update()
            .set(&changeset)
            .returning(PaymentRow::as_returning())
            .get_result::<PaymentRow>(&mut conn)
            .await
            .map_err(diesel_error)?;

        row_to_payment(stored)
    }
}
