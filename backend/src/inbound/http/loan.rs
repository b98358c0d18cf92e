//! Loan and payment API handlers.
//!
//! ```text
//! GET  /loan
//! GET  /loan/schedule
//! GET  /payments
//! POST /payments/{month} {"status":"PAID","paidAt":"2025-01-15","note":"cash"}
//! ```
//!
//! Every read runs the schedule backfill before answering. The mutation body
//! is decoded only after the editor check, so read-only callers always see
//! 403 whatever they send.

use actix_web::{get, post, web};

use crate::domain::{PaymentUpdate, require_editor};

use super::ApiResult;
use super::bearer::BearerUser;
use super::error::ErrorBody;
use super::loan_dto::{
    BalancePointResponse, LoanResponse, PaymentResponse, SetPaymentStatusRequest, parse_month,
    parse_paid_at, parse_status, parse_status_request,
};
use super::state::HttpState;

/// Derived loan summary.
#[utoipa::path(
    get,
    path = "/loan",
    responses(
        (status = 200, description = "Loan summary", body = LoanResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorBody),
        (status = 500, description = "Internal server error", body = ErrorBody)
    ),
    tags = ["loan"],
    operation_id = "getLoan"
)]
#[get("/loan")]
pub async fn get_loan(
    _user: BearerUser,
    state: web::Data<HttpState>,
) -> ApiResult<web::Json<LoanResponse>> {
    let summary = state.loans.summary().await?;
    Ok(web::Json(summary.into()))
}

/// Remaining-balance series, one point per month.
#[utoipa::path(
    get,
    path = "/loan/schedule",
    responses(
        (status = 200, description = "Balance series", body = [BalancePointResponse]),
        (status = 401, description = "Missing or invalid token", body = ErrorBody),
        (status = 500, description = "Internal server error", body = ErrorBody)
    ),
    tags = ["loan"],
    operation_id = "getLoanSchedule"
)]
#[get("/loan/schedule")]
pub async fn get_schedule(
    _user: BearerUser,
    state: web::Data<HttpState>,
) -> ApiResult<web::Json<Vec<BalancePointResponse>>> {
    let points = state.loans.schedule().await?;
    Ok(web::Json(points.into_iter().map(Into::into).collect()))
}

/// All payments, ascending by month.
#[utoipa::path(
    get,
    path = "/payments",
    responses(
        (status = 200, description = "Payments", body = [PaymentResponse]),
        (status = 401, description = "Missing or invalid token", body = ErrorBody),
        (status = 500, description = "Internal server error", body = ErrorBody)
    ),
    tags = ["payments"],
    operation_id = "listPayments"
)]
#[get("/payments")]
pub async fn list_payments(
    _user: BearerUser,
    state: web::Data<HttpState>,
) -> ApiResult<web::Json<Vec<PaymentResponse>>> {
    let payments = state.loans.payments().await?;
    Ok(web::Json(payments.into_iter().map(Into::into).collect()))
}

/// Mark one month PAID or UNPAID. Editors only.
#[utoipa::path(
    post,
    path = "/payments/{month}",
    params(("month" = u32, Path, description = "Installment number, 1-based")),
    request_body = SetPaymentStatusRequest,
    responses(
        (status = 200, description = "Updated payment", body = PaymentResponse),
        (status = 400, description = "Invalid status, date or month", body = ErrorBody),
        (status = 401, description = "Missing or invalid token", body = ErrorBody),
        (status = 403, description = "Caller is read-only", body = ErrorBody),
        (status = 500, description = "Internal server error", body = ErrorBody)
    ),
    tags = ["payments"],
    operation_id = "setPaymentStatus"
)]
#[post("/payments/{month}")]
pub async fn set_payment_status(
    user: BearerUser,
    state: web::Data<HttpState>,
    month: web::Path<String>,
    payload: web::Bytes,
) -> ApiResult<web::Json<PaymentResponse>> {
    let actor = user.into_inner();
    require_editor(&actor)?;

    let body = parse_status_request(&payload)?;
    let update = PaymentUpdate {
        month: parse_month(&month)?,
        status: parse_status(body.status.as_deref())?,
        paid_at: parse_paid_at(body.paid_at.as_deref())?,
        note: body.note,
    };
    let stored = state.payments.set_status(&actor, update).await?;
    Ok(web::Json(stored.into()))
}

#[cfg(test)]
#[path = "loan_tests.rs"]
mod tests;
