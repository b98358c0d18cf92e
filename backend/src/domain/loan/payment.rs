//! Monthly installment records and their two-state status.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::{Loan, LoanId, Money};

/// Stable payment identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
#[schema(value_type = String, format = Uuid)]
pub struct PaymentId(Uuid);

impl PaymentId {
    /// Generate a new random identifier.
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Access the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl From<Uuid> for PaymentId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl fmt::Display for PaymentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Whether an installment has been paid.
///
/// Either state may always move to the other; there is no terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum PaymentStatus {
    Paid,
    Unpaid,
}

/// Raised when a status string is neither `PAID` nor `UNPAID`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("status must be PAID or UNPAID")]
pub struct PaymentStatusParseError;

impl PaymentStatus {
    /// Wire and storage form.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Paid => "PAID",
            Self::Unpaid => "UNPAID",
        }
    }

    /// The opposite status.
    pub fn toggled(self) -> Self {
        match self {
            Self::Paid => Self::Unpaid,
            Self::Unpaid => Self::Paid,
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = PaymentStatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PAID" => Ok(Self::Paid),
            "UNPAID" => Ok(Self::Unpaid),
            _ => Err(PaymentStatusParseError),
        }
    }
}

/// One month's installment.
///
/// `paid_at` is only ever set while `status` is [`PaymentStatus::Paid`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payment {
    pub id: PaymentId,
    pub loan_id: LoanId,
    pub month: u32,
    pub amount: Money,
    pub status: PaymentStatus,
    pub paid_at: Option<DateTime<Utc>>,
    pub note: Option<String>,
}

impl Payment {
    /// Default row for `month`: the loan's installment, unpaid, no note.
    pub fn unpaid(loan: &Loan, month: u32) -> Self {
        Self {
            id: PaymentId::random(),
            loan_id: loan.id(),
            month,
            amount: loan.terms().monthly_payment(),
            status: PaymentStatus::Unpaid,
            paid_at: None,
            note: None,
        }
    }

    /// Whether the installment is marked paid.
    pub fn is_paid(&self) -> bool {
        self.status == PaymentStatus::Paid
    }

    /// Apply a status change.
    ///
    /// Marking paid records the supplied date or `now`; marking unpaid
    /// clears the date even when one was supplied. The note is replaced
    /// verbatim.
    pub fn apply(mut self, update: &PaymentUpdate, now: DateTime<Utc>) -> Self {
        self.status = update.status;
        self.paid_at = match update.status {
            PaymentStatus::Paid => Some(update.paid_at.unwrap_or(now)),
            PaymentStatus::Unpaid => None,
        };
        self.note = update.note.clone();
        self
    }
}

/// Requested change to a single month.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentUpdate {
    pub month: u32,
    pub status: PaymentStatus,
    pub paid_at: Option<DateTime<Utc>>,
    pub note: Option<String>,
}
