//! HTTP client for the loan service.
//!
//! Wire types mirror the service's camelCase JSON. Amounts stay in currency
//! units here; [`crate::derive`] converts them to cents.

use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use reqwest::{Client, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ClientError;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);
const USER_AGENT: &str = concat!("loanctl/", env!("CARGO_PKG_VERSION"));

/// Payment state as sent on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PaymentStatus {
    /// Installment recorded as paid.
    Paid,
    /// Installment outstanding.
    Unpaid,
}

impl PaymentStatus {
    /// The opposite state.
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Paid => Self::Unpaid,
            Self::Unpaid => Self::Paid,
        }
    }

    /// Wire spelling.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Paid => "PAID",
            Self::Unpaid => "UNPAID",
        }
    }
}

/// Response of `POST /auth/login`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Session {
    /// Bearer token.
    pub token: String,
    /// Canonical username.
    pub username: String,
}

/// Response of `GET /auth/me`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    /// Username.
    pub username: String,
    /// `viewer` or `editor`.
    pub role: String,
    /// Whether payments may be changed.
    pub can_edit: bool,
}

/// Response of `GET /loan`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanView {
    /// Loan identifier.
    pub id: String,
    /// Principal in currency units.
    pub principal: f64,
    /// Installment size in currency units.
    pub monthly_payment: f64,
    /// Schedule length.
    pub total_months: u32,
    /// When the loan was opened.
    pub start_date: DateTime<Utc>,
    /// Sum of paid installments.
    pub total_paid: f64,
    /// Principal minus paid, floored at zero.
    pub outstanding: f64,
    /// Unclamped percentage paid.
    pub percent_paid: f64,
    /// Count of paid installments.
    pub paid_months: u32,
    /// Installments left.
    pub remaining_months: u32,
}

/// One row of `GET /payments`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentView {
    /// Payment identifier.
    pub id: String,
    /// 1-based month index.
    pub month: u32,
    /// Installment amount in currency units.
    pub amount: f64,
    /// Current state.
    pub status: PaymentStatus,
    /// When the installment was paid.
    pub paid_at: Option<DateTime<Utc>>,
    /// Free-form note.
    pub note: Option<String>,
    /// Calendar month due, `YYYY-MM`.
    pub due_month: String,
}

/// Body of `POST /payments/{month}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusChange {
    /// Target state.
    pub status: PaymentStatus,
    /// RFC 3339 timestamp or `YYYY-MM-DD`; the service uses now when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paid_at: Option<String>,
    /// Replacement note; absent clears it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl StatusChange {
    /// Flip `payment`, carrying its paid date and note across.
    #[must_use]
    pub fn toggle(payment: &PaymentView) -> Self {
        Self {
            status: payment.status.toggled(),
            paid_at: payment.paid_at.map(|at| at.to_rfc3339()),
            note: payment.note.clone(),
        }
    }
}

#[derive(Serialize)]
struct LoginBody<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

/// Client bound to one service base URL and optional bearer token.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base: Url,
}

impl ApiClient {
    /// Build an anonymous client for `base_url`.
    ///
    /// # Errors
    /// Returns [`ClientError::InvalidUrl`] when the URL does not parse and
    /// [`ClientError::Transport`] when the HTTP client cannot be built.
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        Self::build(base_url, HeaderMap::new())
    }

    /// Build a client that sends `token` as a bearer credential.
    ///
    /// # Errors
    /// As [`ApiClient::new`]; a token that is not a valid header value is
    /// reported as [`ClientError::Unauthorized`].
    pub fn with_token(base_url: &str, token: &str) -> Result<Self, ClientError> {
        let mut value = HeaderValue::from_str(&format!("Bearer {token}")).map_err(|_| {
            ClientError::Unauthorized {
                message: "stored token is malformed".to_owned(),
            }
        })?;
        value.set_sensitive(true);
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, value);
        Self::build(base_url, headers)
    }

    fn build(base_url: &str, headers: HeaderMap) -> Result<Self, ClientError> {
        let mut base = Url::parse(base_url).map_err(|err| ClientError::InvalidUrl {
            value: base_url.to_owned(),
            message: err.to_string(),
        })?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .build()?;
        Ok(Self { http, base })
    }

    /// Resolve `path` against the base URL.
    ///
    /// # Errors
    /// Returns [`ClientError::InvalidUrl`] when the joined URL is invalid.
    pub fn endpoint(&self, path: &str) -> Result<Url, ClientError> {
        self.base.join(path).map_err(|err| ClientError::InvalidUrl {
            value: path.to_owned(),
            message: err.to_string(),
        })
    }

    /// Exchange credentials for a session.
    ///
    /// # Errors
    /// Returns [`ClientError::LoginFailed`] when the service refuses the
    /// credentials.
    pub async fn login(&self, username: &str, password: &str) -> Result<Session, ClientError> {
        let url = self.endpoint("auth/login")?;
        debug!(%url, username, "logging in");
        let response = self
            .http
            .post(url)
            .json(&LoginBody { username, password })
            .send()
            .await?;
        decode(response).await.map_err(|err| match err {
            ClientError::Unauthorized { message } => ClientError::LoginFailed { message },
            other => other,
        })
    }

    /// Identity behind the current token.
    ///
    /// # Errors
    /// Returns [`ClientError::Unauthorized`] for a missing or rejected token.
    pub async fn me(&self) -> Result<Identity, ClientError> {
        self.get("auth/me").await
    }

    /// Loan summary.
    ///
    /// # Errors
    /// Returns [`ClientError::Unauthorized`] for a missing or rejected token.
    pub async fn loan(&self) -> Result<LoanView, ClientError> {
        self.get("loan").await
    }

    /// Full payment schedule ordered by month.
    ///
    /// # Errors
    /// Returns [`ClientError::Unauthorized`] for a missing or rejected token.
    pub async fn payments(&self) -> Result<Vec<PaymentView>, ClientError> {
        self.get("payments").await
    }

    /// Set the status of `month`.
    ///
    /// # Errors
    /// Returns [`ClientError::ReadOnly`] for viewer accounts and
    /// [`ClientError::Api`] for rejected input.
    pub async fn set_status(
        &self,
        month: u32,
        change: &StatusChange,
    ) -> Result<PaymentView, ClientError> {
        let url = self.endpoint(&format!("payments/{month}"))?;
        debug!(%url, status = change.status.as_str(), "updating payment");
        let response = self.http.post(url).json(change).send().await?;
        decode(response).await
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let url = self.endpoint(path)?;
        debug!(%url, "fetching");
        let response = self.http.get(url).send().await?;
        decode(response).await
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.json().await?);
    }
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&body).map_or_else(
        |_| {
            status
                .canonical_reason()
                .unwrap_or("unexpected response")
                .to_owned()
        },
        |parsed| parsed.message,
    );
    debug!(status = status.as_u16(), reason = %message, "request rejected");
    Err(match status {
        StatusCode::UNAUTHORIZED => ClientError::Unauthorized { message },
        StatusCode::FORBIDDEN => ClientError::ReadOnly { message },
        other => ClientError::Api {
            status: other.as_u16(),
            message,
        },
    })
}
