//! Plain-text rendering of the dashboard and payment table.

use std::io::{self, Write};

use crate::api::{LoanView, PaymentStatus, PaymentView};
use crate::derive::{LocalSummary, remaining_after};

const BAR_WIDTH: i64 = 40;

/// Format cents as `1234.56`.
#[must_use]
pub fn format_cents(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let magnitude = cents.unsigned_abs();
    format!(
        "{sign}{}.{:02}",
        magnitude.div_euclid(100),
        magnitude.rem_euclid(100)
    )
}

/// Progress bar with cells proportional to paid cents, full when overpaid.
#[must_use]
pub fn progress_bar(summary: &LocalSummary) -> String {
    let filled_cells = summary
        .total_paid_cents
        .saturating_mul(BAR_WIDTH)
        .checked_div(summary.principal_cents)
        .unwrap_or(0)
        .clamp(0, BAR_WIDTH);
    let filled = usize::try_from(filled_cells).unwrap_or(0);
    let width = usize::try_from(BAR_WIDTH).unwrap_or(0);
    format!(
        "[{}{}]",
        "#".repeat(filled),
        "-".repeat(width.saturating_sub(filled))
    )
}

/// Write the loan dashboard.
///
/// Figures come from the local derivation; a warning line lists any server
/// figures that disagree with it.
///
/// # Errors
/// Propagates write failures.
pub fn render_dashboard(
    out: &mut impl Write,
    loan: &LoanView,
    summary: &LocalSummary,
) -> io::Result<()> {
    writeln!(
        out,
        "Loan {} opened {}",
        loan.id,
        loan.start_date.format("%Y-%m-%d")
    )?;
    writeln!(
        out,
        "Principal     {}  ({} x {} months)",
        format_cents(summary.principal_cents),
        format_cents(crate::derive::units_to_cents(loan.monthly_payment)),
        loan.total_months
    )?;
    writeln!(out, "Paid          {}", format_cents(summary.total_paid_cents))?;
    writeln!(out, "Outstanding   {}", format_cents(summary.outstanding_cents))?;
    writeln!(
        out,
        "Progress      {} {:.1}%",
        progress_bar(summary),
        summary.display_progress()
    )?;
    writeln!(
        out,
        "Months        {} paid, {} remaining",
        summary.paid_months, summary.remaining_months
    )?;
    if summary.is_fully_paid() {
        writeln!(out, "Loan fully paid")?;
    }
    let mismatched = summary.discrepancies(loan);
    if !mismatched.is_empty() {
        writeln!(
            out,
            "warning: server figures differ from the schedule: {}",
            mismatched.join(", ")
        )?;
    }
    Ok(())
}

/// Write the payment table with a running remaining balance.
///
/// # Errors
/// Propagates write failures.
pub fn render_payments(
    out: &mut impl Write,
    principal_cents: i64,
    payments: &[PaymentView],
) -> io::Result<()> {
    writeln!(
        out,
        "{:>5}  {:<7}  {:>10}  {:<6}  {:<10}  {:>10}  Note",
        "Month", "Due", "Amount", "Status", "Paid on", "Remaining"
    )?;
    let remaining = remaining_after(principal_cents, payments);
    let mut ordered: Vec<&PaymentView> = payments.iter().collect();
    ordered.sort_by_key(|payment| payment.month);
    for (payment, (_, left)) in ordered.into_iter().zip(remaining) {
        let paid_on = match (payment.status, payment.paid_at) {
            (PaymentStatus::Paid, Some(at)) => at.format("%Y-%m-%d").to_string(),
            _ => "-".to_owned(),
        };
        writeln!(
            out,
            "{:>5}  {:<7}  {:>10}  {:<6}  {:<10}  {:>10}  {}",
            payment.month,
            payment.due_month,
            format_cents(crate::derive::units_to_cents(payment.amount)),
            payment.status.as_str(),
            paid_on,
            format_cents(left),
            payment.note.as_deref().unwrap_or("")
        )?;
    }
    Ok(())
}
