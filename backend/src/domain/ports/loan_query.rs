//! Driving port for loan read models.

use async_trait::async_trait;

use crate::domain::{BalancePoint, Error, LoanSummary, ScheduledPayment};

/// Read-side use cases. Every call backfills the schedule first.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LoanQuery: Send + Sync {
    /// Derived loan summary.
    async fn summary(&self) -> Result<LoanSummary, Error>;

    /// All payments, ascending by month.
    async fn payments(&self) -> Result<Vec<ScheduledPayment>, Error>;

    /// Remaining-balance series, ascending by month.
    async fn schedule(&self) -> Result<Vec<BalancePoint>, Error>;
}
