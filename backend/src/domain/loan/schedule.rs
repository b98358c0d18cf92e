//! Schedule backfill helpers.

use std::collections::BTreeSet;

use super::{DueMonth, Loan, Payment};

/// Months in `1..=total_months` with no row in `existing`.
///
/// Out-of-range rows in `existing` are ignored. The result is ascending.
///
/// # Examples
/// ```
/// use loan_backend::domain::missing_months;
///
/// assert_eq!(missing_months(5, [1, 2, 4]), vec![3, 5]);
/// ```
pub fn missing_months(total_months: u32, existing: impl IntoIterator<Item = u32>) -> Vec<u32> {
    let present: BTreeSet<u32> = existing.into_iter().collect();
    (1..=total_months)
        .filter(|month| !present.contains(month))
        .collect()
}

/// Default unpaid rows for the given months.
pub fn default_payments(loan: &Loan, months: &[u32]) -> Vec<Payment> {
    months
        .iter()
        .map(|month| Payment::unpaid(loan, *month))
        .collect()
}

/// A payment paired with the calendar month it falls due.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledPayment {
    pub payment: Payment,
    pub due_month: DueMonth,
}

impl ScheduledPayment {
    /// Pair `payment` with its due month under `loan`.
    pub fn new(loan: &Loan, payment: Payment) -> Self {
        let due_month = loan.due_month(payment.month);
        Self { payment, due_month }
    }
}
