//! Request and response payloads for the loan endpoints.
//!
//! Keys are camelCase; amounts are JSON numbers in currency units.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{
    BalancePoint, DueMonth, Error, LoanId, LoanSummary, Money, PaymentId, PaymentStatus,
    ScheduledPayment,
};

/// Message returned for a missing or unknown status value.
pub const INVALID_STATUS_MESSAGE: &str = "status must be PAID or UNPAID";
/// Message returned for an unparsable `paidAt`.
pub const INVALID_PAID_AT_MESSAGE: &str = "paidAt must be an RFC 3339 timestamp or YYYY-MM-DD date";
/// Message returned for a non-numeric month path segment.
pub const INVALID_MONTH_MESSAGE: &str = "month must be a positive integer";

/// Loan summary returned by `GET /loan`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoanResponse {
    pub id: LoanId,
    #[schema(value_type = f64, example = 20000)]
    pub principal: Money,
    #[schema(value_type = f64, example = 330)]
    pub monthly_payment: Money,
    #[schema(example = 60)]
    pub total_months: u32,
    #[schema(value_type = String, format = DateTime)]
    pub start_date: DateTime<Utc>,
    #[schema(value_type = f64, example = 330)]
    pub total_paid: Money,
    #[schema(value_type = f64, example = 19670)]
    pub outstanding: Money,
    /// Unclamped; exceeds 100 when overpaid.
    #[schema(example = 1.65)]
    pub percent_paid: f64,
    pub paid_months: u32,
    pub remaining_months: u32,
}

impl From<LoanSummary> for LoanResponse {
    fn from(summary: LoanSummary) -> Self {
        Self {
            id: summary.id,
            principal: summary.principal,
            monthly_payment: summary.monthly_payment,
            total_months: summary.total_months,
            start_date: summary.start_date,
            total_paid: summary.total_paid,
            outstanding: summary.outstanding,
            percent_paid: summary.percent_paid,
            paid_months: summary.paid_months,
            remaining_months: summary.remaining_months,
        }
    }
}

/// One month's installment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentResponse {
    pub id: PaymentId,
    #[schema(example = 1)]
    pub month: u32,
    #[schema(value_type = f64, example = 330)]
    pub amount: Money,
    pub status: PaymentStatus,
    #[schema(value_type = Option<String>, format = DateTime)]
    pub paid_at: Option<DateTime<Utc>>,
    pub note: Option<String>,
    /// Calendar month the installment falls due, `YYYY-MM`.
    #[schema(value_type = String, example = "2025-01")]
    pub due_month: DueMonth,
}

impl From<ScheduledPayment> for PaymentResponse {
    fn from(scheduled: ScheduledPayment) -> Self {
        let ScheduledPayment { payment, due_month } = scheduled;
        Self {
            id: payment.id,
            month: payment.month,
            amount: payment.amount,
            status: payment.status,
            paid_at: payment.paid_at,
            note: payment.note,
            due_month,
        }
    }
}

/// One point of the remaining-balance series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BalancePointResponse {
    pub month: u32,
    #[schema(value_type = String, example = "2025-01")]
    pub due_month: DueMonth,
    #[schema(value_type = f64)]
    pub paid_through: Money,
    #[schema(value_type = f64)]
    pub remaining: Money,
}

impl From<BalancePoint> for BalancePointResponse {
    fn from(point: BalancePoint) -> Self {
        Self {
            month: point.month,
            due_month: point.due_month,
            paid_through: point.paid_through,
            remaining: point.remaining,
        }
    }
}

/// Body of `POST /payments/{month}`.
///
/// Fields are optional at the JSON layer so authorization is decided
/// before any of them are validated.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SetPaymentStatusRequest {
    #[schema(example = "PAID")]
    pub status: Option<String>,
    /// RFC 3339 timestamp or `YYYY-MM-DD`; ignored for UNPAID.
    #[schema(example = "2025-01-15")]
    pub paid_at: Option<String>,
    /// Stored verbatim; absent clears the note.
    pub note: Option<String>,
}

/// Decode a raw mutation body.
pub fn parse_status_request(raw: &[u8]) -> Result<SetPaymentStatusRequest, Error> {
    serde_json::from_slice(raw)
        .map_err(|err| Error::invalid_request(format!("Invalid request body: {err}")))
}

/// Parse the `status` field.
pub fn parse_status(raw: Option<&str>) -> Result<PaymentStatus, Error> {
    raw.ok_or_else(|| Error::invalid_request(INVALID_STATUS_MESSAGE))?
        .parse()
        .map_err(|_| Error::invalid_request(INVALID_STATUS_MESSAGE))
}

/// Parse `paidAt`: an RFC 3339 timestamp, or a date taken as midnight UTC.
pub fn parse_paid_at(raw: Option<&str>) -> Result<Option<DateTime<Utc>>, Error> {
    let Some(value) = raw.map(str::trim).filter(|value| !value.is_empty()) else {
        return Ok(None);
    };
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(value) {
        return Ok(Some(timestamp.with_timezone(&Utc)));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|midnight| Some(midnight.and_utc()))
        .ok_or_else(|| Error::invalid_request(INVALID_PAID_AT_MESSAGE))
}

/// Parse the `{month}` path segment.
pub fn parse_month(raw: &str) -> Result<u32, Error> {
    raw.trim()
        .parse()
        .map_err(|_| Error::invalid_request(INVALID_MONTH_MESSAGE))
}
