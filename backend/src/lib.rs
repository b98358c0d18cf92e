//! Loan repayment tracker backend.
//!
//! A single interest-free loan, its month-by-month payment schedule, a
//! derived summary, and a bearer-token protected HTTP API in which only
//! editors may change payment status.

pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

/// Public OpenAPI surface used by Swagger UI and tooling.
pub use doc::ApiDoc;
pub use middleware::Trace;
