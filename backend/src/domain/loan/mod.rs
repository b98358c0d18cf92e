//! Loan aggregate: terms, payments, schedule backfill and derived summary.
//!
//! A deployment tracks exactly one interest-free [`Loan`]. Its terms never
//! change after creation; only the status of individual [`Payment`]s does.
//! Totals are always derived on read from the payment list and never
//! persisted.

mod money;
mod payment;
mod schedule;
mod summary;

use std::fmt;

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

pub use self::money::Money;
pub use self::payment::{
    Payment, PaymentId, PaymentStatus, PaymentStatusParseError, PaymentUpdate,
};
pub use self::schedule::{ScheduledPayment, default_payments, missing_months};
pub use self::summary::{BalancePoint, LoanSummary, balance_series};

/// Stable loan identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
#[schema(value_type = String, format = Uuid)]
pub struct LoanId(Uuid);

impl LoanId {
    /// Generate a new random identifier.
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Access the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl From<Uuid> for LoanId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl fmt::Display for LoanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Validation errors for [`LoanTerms`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoanTermsError {
    #[error("principal must be positive")]
    NonPositivePrincipal,
    #[error("monthly payment must be positive")]
    NonPositiveMonthlyPayment,
    #[error("total months must be positive")]
    ZeroMonths,
    #[error("monthly payment {monthly} exceeds principal {principal}")]
    PaymentExceedsPrincipal { monthly: Money, principal: Money },
}

/// Fixed terms of an interest-free loan.
///
/// ## Invariants
/// - `principal` and `monthly_payment` are positive.
/// - `total_months` is at least one.
/// - `monthly_payment <= principal`.
///
/// # Examples
/// ```
/// use loan_backend::domain::{LoanTerms, Money};
///
/// let terms = LoanTerms::try_new(Money::from_units(20_000), Money::from_units(330), 60)
///     .expect("valid terms");
/// assert_eq!(terms.total_months(), 60);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoanTerms {
    principal: Money,
    monthly_payment: Money,
    total_months: u32,
}

impl LoanTerms {
    /// Validate and construct loan terms.
    pub fn try_new(
        principal: Money,
        monthly_payment: Money,
        total_months: u32,
    ) -> Result<Self, LoanTermsError> {
        if !principal.is_positive() {
            return Err(LoanTermsError::NonPositivePrincipal);
        }
        if !monthly_payment.is_positive() {
            return Err(LoanTermsError::NonPositiveMonthlyPayment);
        }
        if total_months == 0 {
            return Err(LoanTermsError::ZeroMonths);
        }
        if monthly_payment > principal {
            return Err(LoanTermsError::PaymentExceedsPrincipal {
                monthly: monthly_payment,
                principal,
            });
        }
        Ok(Self {
            principal,
            monthly_payment,
            total_months,
        })
    }

    /// Amount borrowed.
    pub fn principal(&self) -> Money {
        self.principal
    }

    /// Installment due each month.
    pub fn monthly_payment(&self) -> Money {
        self.monthly_payment
    }

    /// Length of the term in months.
    pub fn total_months(&self) -> u32 {
        self.total_months
    }
}

/// Calendar month in which an installment falls due, rendered `YYYY-MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DueMonth {
    year: i32,
    month: u32,
}

impl DueMonth {
    /// Calendar year.
    pub fn year(&self) -> i32 {
        self.year
    }

    /// Calendar month, 1-based.
    pub fn month(&self) -> u32 {
        self.month
    }
}

impl fmt::Display for DueMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl Serialize for DueMonth {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// The tracked loan. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Loan {
    id: LoanId,
    terms: LoanTerms,
    start_date: DateTime<Utc>,
}

impl Loan {
    /// Rehydrate a stored loan.
    pub fn new(id: LoanId, terms: LoanTerms, start_date: DateTime<Utc>) -> Self {
        Self {
            id,
            terms,
            start_date,
        }
    }

    /// Start a new loan with a fresh identifier.
    pub fn open(terms: LoanTerms, start_date: DateTime<Utc>) -> Self {
        Self::new(LoanId::random(), terms, start_date)
    }

    /// Stable identifier.
    pub fn id(&self) -> LoanId {
        self.id
    }

    /// Fixed terms.
    pub fn terms(&self) -> &LoanTerms {
        &self.terms
    }

    /// Moment the loan was opened.
    pub fn start_date(&self) -> DateTime<Utc> {
        self.start_date
    }

    /// Whether `month` lies within `[1, total_months]`.
    pub fn contains_month(&self, month: u32) -> bool {
        (1..=self.terms.total_months).contains(&month)
    }

    /// Calendar month in which installment `month` (1-based) falls due.
    ///
    /// Month 1 is due in the start month; month `n` is `n - 1` months later.
    ///
    /// # Examples
    /// ```
    /// use chrono::{TimeZone, Utc};
    /// use loan_backend::domain::{Loan, LoanTerms, Money};
    ///
    /// let terms = LoanTerms::try_new(Money::from_units(20_000), Money::from_units(330), 60)
    ///     .unwrap();
    /// let start = Utc.with_ymd_and_hms(2024, 11, 15, 9, 0, 0).unwrap();
    /// let loan = Loan::open(terms, start);
    /// assert_eq!(loan.due_month(3).to_string(), "2025-01");
    /// ```
    pub fn due_month(&self, month: u32) -> DueMonth {
        let offset = i64::from(month.saturating_sub(1));
        let base = i64::from(self.start_date.year()) * 12 + i64::from(self.start_date.month0());
        let index = base + offset;
        // Loan terms are bounded by u32 months, so the year always fits.
        let year = i32::try_from(index.div_euclid(12)).unwrap_or(i32::MAX);
        let month0 = u32::try_from(index.rem_euclid(12)).unwrap_or(0);
        DueMonth {
            year,
            month: month0 + 1,
        }
    }
}
