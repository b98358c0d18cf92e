//! Derived loan summary and remaining-balance series.
//!
//! Both are pure functions of a [`Loan`] and its payments. The client crate
//! recomputes the summary from the same inputs and must agree exactly.

use chrono::{DateTime, Utc};

use super::{DueMonth, Loan, LoanId, Money, Payment};

/// Aggregate view of a loan and its payments.
#[derive(Debug, Clone, PartialEq)]
pub struct LoanSummary {
    pub id: LoanId,
    pub principal: Money,
    pub monthly_payment: Money,
    pub total_months: u32,
    pub start_date: DateTime<Utc>,
    pub total_paid: Money,
    pub outstanding: Money,
    /// Not clamped: exceeds 100 when overpaid.
    pub percent_paid: f64,
    pub paid_months: u32,
    pub remaining_months: u32,
}

impl LoanSummary {
    /// Derive the summary from `loan` and `payments`.
    ///
    /// # Examples
    /// ```
    /// use chrono::Utc;
    /// use loan_backend::domain::{Loan, LoanSummary, LoanTerms, Money, Payment, PaymentStatus};
    ///
    /// let terms = LoanTerms::try_new(Money::from_units(20_000), Money::from_units(330), 60)
    ///     .unwrap();
    /// let loan = Loan::open(terms, Utc::now());
    /// let mut first = Payment::unpaid(&loan, 1);
    /// first.status = PaymentStatus::Paid;
    /// let summary = LoanSummary::derive(&loan, &[first]);
    /// assert_eq!(summary.outstanding, Money::from_units(19_670));
    /// assert_eq!(summary.paid_months, 1);
    /// ```
    pub fn derive(loan: &Loan, payments: &[Payment]) -> Self {
        let terms = loan.terms();
        let paid: Vec<&Payment> = payments.iter().filter(|p| p.is_paid()).collect();
        let total_paid: Money = paid.iter().map(|p| p.amount).sum();
        let paid_months = u32::try_from(paid.len()).unwrap_or(u32::MAX);
        Self {
            id: loan.id(),
            principal: terms.principal(),
            monthly_payment: terms.monthly_payment(),
            total_months: terms.total_months(),
            start_date: loan.start_date(),
            total_paid,
            outstanding: terms.principal().saturating_sub_floor(total_paid),
            percent_paid: percent_of(total_paid, terms.principal()),
            paid_months,
            remaining_months: terms.total_months().saturating_sub(paid_months),
        }
    }

    /// Percentage for progress display, capped at 100.
    pub fn display_progress(&self) -> f64 {
        self.percent_paid.min(100.0)
    }

    /// Whether the display progress has reached 100.
    pub fn is_fully_paid(&self) -> bool {
        self.display_progress() >= 100.0
    }
}

fn percent_of(part: Money, whole: Money) -> f64 {
    if whole.cents() == 0 {
        return 0.0;
    }
    part.as_units() / whole.as_units() * 100.0
}

/// Cumulative position of the loan after a given month.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalancePoint {
    pub month: u32,
    pub due_month: DueMonth,
    /// Sum of paid installments up to and including `month`.
    pub paid_through: Money,
    /// `principal - paid_through`, floored at zero.
    pub remaining: Money,
}

/// Remaining-balance series in ascending month order.
pub fn balance_series(loan: &Loan, payments: &[Payment]) -> Vec<BalancePoint> {
    let mut ordered: Vec<&Payment> = payments.iter().collect();
    ordered.sort_by_key(|p| p.month);

    let principal = loan.terms().principal();
    let mut paid_through = Money::ZERO;
    ordered
        .into_iter()
        .map(|payment| {
            if payment.is_paid() {
                paid_through = paid_through + payment.amount;
            }
            BalancePoint {
                month: payment.month,
                due_month: loan.due_month(payment.month),
                paid_through,
                remaining: principal.saturating_sub_floor(paid_through),
            }
        })
        .collect()
}
