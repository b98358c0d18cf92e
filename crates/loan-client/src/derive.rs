//! Local recomputation of the loan summary.
//!
//! Amounts are summed as integer cents and the percentage is computed with
//! the same float steps the service uses, so a healthy service and this
//! module agree bit for bit. A mismatch means the service and the schedule
//! it returned disagree.

use crate::api::{LoanView, PaymentStatus, PaymentView};

const CENTS_PER_UNIT: f64 = 100.0;

/// Convert a wire amount to whole cents, rounding to the nearest cent.
#[must_use]
#[expect(
    clippy::float_arithmetic,
    clippy::cast_possible_truncation,
    reason = "wire amounts are floats that round to whole cents"
)]
pub fn units_to_cents(units: f64) -> i64 {
    (units * CENTS_PER_UNIT).round() as i64
}

#[expect(
    clippy::float_arithmetic,
    clippy::cast_precision_loss,
    reason = "matches the service's cents-to-units conversion"
)]
const fn cents_to_units(cents: i64) -> f64 {
    cents as f64 / CENTS_PER_UNIT
}

#[expect(
    clippy::float_arithmetic,
    reason = "percentage is computed in floating point like the service"
)]
const fn percent_of(part: i64, whole: i64) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    cents_to_units(part) / cents_to_units(whole) * 100.0
}

/// Summary rebuilt from the payment schedule.
#[derive(Debug, Clone, PartialEq)]
pub struct LocalSummary {
    /// Principal in cents.
    pub principal_cents: i64,
    /// Sum of paid installments in cents.
    pub total_paid_cents: i64,
    /// Principal minus paid, floored at zero.
    pub outstanding_cents: i64,
    /// Unclamped percentage of the principal paid.
    pub percent_paid: f64,
    /// Count of paid installments.
    pub paid_months: u32,
    /// Schedule length minus paid months, floored at zero.
    pub remaining_months: u32,
}

impl LocalSummary {
    /// Derive the summary from the loan terms in `loan` and `payments`.
    ///
    /// Only the principal and schedule length are read from `loan`; every
    /// total is recomputed.
    #[must_use]
    pub fn derive(loan: &LoanView, payments: &[PaymentView]) -> Self {
        let principal_cents = units_to_cents(loan.principal);
        let paid = payments
            .iter()
            .filter(|payment| payment.status == PaymentStatus::Paid);
        let (total_paid_cents, paid_count) = paid.fold((0_i64, 0_usize), |(sum, count), payment| {
            (
                sum.saturating_add(units_to_cents(payment.amount)),
                count.saturating_add(1),
            )
        });
        let paid_months = u32::try_from(paid_count).unwrap_or(u32::MAX);
        Self {
            principal_cents,
            total_paid_cents,
            outstanding_cents: principal_cents.saturating_sub(total_paid_cents).max(0),
            percent_paid: percent_of(total_paid_cents, principal_cents),
            paid_months,
            remaining_months: loan.total_months.saturating_sub(paid_months),
        }
    }

    /// Percentage for progress display, capped at 100.
    #[must_use]
    pub const fn display_progress(&self) -> f64 {
        self.percent_paid.min(100.0)
    }

    /// Whether the display progress has reached 100.
    #[must_use]
    pub const fn is_fully_paid(&self) -> bool {
        self.display_progress() >= 100.0
    }

    /// Names of the server-reported figures that differ from this summary.
    #[must_use]
    pub fn discrepancies(&self, loan: &LoanView) -> Vec<&'static str> {
        let checks = [
            ("totalPaid", units_to_cents(loan.total_paid) == self.total_paid_cents),
            (
                "outstanding",
                units_to_cents(loan.outstanding) == self.outstanding_cents,
            ),
            (
                "percentPaid",
                loan.percent_paid.to_bits() == self.percent_paid.to_bits(),
            ),
            ("paidMonths", loan.paid_months == self.paid_months),
            ("remainingMonths", loan.remaining_months == self.remaining_months),
        ];
        checks
            .into_iter()
            .filter_map(|(name, agrees)| (!agrees).then_some(name))
            .collect()
    }
}

/// Remaining balance after each month, in ascending month order.
#[must_use]
pub fn remaining_after(principal_cents: i64, payments: &[PaymentView]) -> Vec<(u32, i64)> {
    let mut ordered: Vec<&PaymentView> = payments.iter().collect();
    ordered.sort_by_key(|payment| payment.month);
    let mut paid_through = 0_i64;
    ordered
        .into_iter()
        .map(|payment| {
            if payment.status == PaymentStatus::Paid {
                paid_through = paid_through.saturating_add(units_to_cents(payment.amount));
            }
            (
                payment.month,
                principal_cents.saturating_sub(paid_through).max(0),
            )
        })
        .collect()
}
