//! HTTP adapter mapping for domain errors.
//!
//! Purpose: keep the domain error type HTTP-agnostic while allowing Actix
//! handlers to turn domain failures into consistent JSON responses and status
//! codes. The wire body is `{message, traceId?}`; codes travel only as the
//! HTTP status.

use actix_web::error::JsonPayloadError;
use actix_web::{HttpRequest, HttpResponse, ResponseError, http::StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use crate::domain::{Error, ErrorCode, TRACE_ID_HEADER};

/// Convenient result alias for HTTP handlers.
pub type ApiResult<T> = Result<T, Error>;

/// Message sent in place of any internal failure.
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";
/// Message sent in place of any unavailability detail.
pub const UNAVAILABLE_MESSAGE: &str = "Service temporarily unavailable";

/// JSON body of every error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    /// Human-readable message.
    #[schema(example = "Only editors may change payments")]
    pub message: String,
    /// Correlation identifier matching the `trace-id` response header.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(example = "3fa85f64-5717-4562-b3fc-2c963f66afa6")]
    pub trace_id: Option<String>,
}

fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::InvalidRequest => StatusCode::BAD_REQUEST,
        ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
        ErrorCode::Forbidden => StatusCode::FORBIDDEN,
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn body_for(error: &Error) -> ErrorBody {
    let message = match error.code() {
        ErrorCode::InternalError => INTERNAL_ERROR_MESSAGE.to_owned(),
        ErrorCode::ServiceUnavailable => UNAVAILABLE_MESSAGE.to_owned(),
        _ => error.message().to_owned(),
    };
    ErrorBody {
        message,
        trace_id: error.trace_id().map(str::to_owned),
    }
}

fn log_failure(error: &Error) {
    match error.code() {
        ErrorCode::InternalError | ErrorCode::ServiceUnavailable => error!(
            code = ?error.code(),
            trace_id = error.trace_id(),
            message = error.message(),
            "request failed"
        ),
        _ => {
            if let Some(details) = error.details() {
                warn!(code = ?error.code(), %details, message = error.message(), "request rejected");
            }
        }
    }
}

impl ResponseError for Error {
    fn status_code(&self) -> StatusCode {
        status_for(self.code())
    }

    fn error_response(&self) -> HttpResponse {
        log_failure(self);
        let mut builder = HttpResponse::build(self.status_code());
        if let Some(id) = self.trace_id() {
            builder.insert_header((TRACE_ID_HEADER, id.to_owned()));
        }

        builder.json(body_for(self))
    }
}

/// `JsonConfig` error handler: malformed bodies become 400 `{message}`.
pub fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    let message = match &err {
        JsonPayloadError::ContentType => "Request body must be JSON".to_owned(),
        other => format!("Invalid request body: {other}"),
    };
    Error::invalid_request(message).into()
}
