//! Driving port for changing a month's payment status.

use async_trait::async_trait;

use crate::domain::{AuthenticatedUser, Error, PaymentUpdate, ScheduledPayment};

/// Write-side use case for payments.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PaymentCommand: Send + Sync {
    /// Set the status of one month on behalf of `actor`.
    ///
    /// Fails with `Forbidden` unless `actor` may edit, and with
    /// `InvalidRequest` when the month is outside the loan term.
    async fn set_status(
        &self,
        actor: &AuthenticatedUser,
        update: PaymentUpdate,
    ) -> Result<ScheduledPayment, Error>;
}
