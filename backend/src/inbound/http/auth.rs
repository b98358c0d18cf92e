//! Authentication API handlers.
//!
//! ```text
//! POST /auth/login {"username":"Jasper","password":"BMW123"}
//! GET  /auth/me
//! ```

use actix_web::{get, post, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{Error, LoginCredentials, LoginValidationError, Role, UserId};

use super::ApiResult;
use super::bearer::BearerUser;
use super::error::ErrorBody;
use super::state::HttpState;

/// Login request body for `POST /auth/login`.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

impl TryFrom<&LoginRequest> for LoginCredentials {
    type Error = LoginValidationError;

    fn try_from(value: &LoginRequest) -> Result<Self, Self::Error> {
        Self::try_from_parts(&value.username, &value.password)
    }
}

/// Successful login payload.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    /// Bearer token for the `Authorization` header.
    pub token: String,
    pub username: String,
}

/// Identity behind the presented token.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MeResponse {
    pub id: UserId,
    pub username: String,
    #[schema(value_type = String, example = "editor")]
    pub role: Role,
    /// Whether the caller may change payment status.
    pub can_edit: bool,
}

fn map_login_validation_error(err: &LoginValidationError) -> Error {
    match err {
        LoginValidationError::EmptyUsername => Error::invalid_request("username is required"),
        LoginValidationError::EmptyPassword => Error::invalid_request("password is required"),
    }
}

/// Exchange credentials for a bearer token.
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login success", body = LoginResponse),
        (status = 400, description = "Missing username or password", body = ErrorBody),
        (status = 401, description = "Invalid credentials", body = ErrorBody),
        (status = 500, description = "Internal server error", body = ErrorBody)
    ),
    tags = ["auth"],
    operation_id = "login",
    security([])
)]
#[post("/auth/login")]
pub async fn login(
    state: web::Data<HttpState>,
    payload: web::Json<LoginRequest>,
) -> ApiResult<web::Json<LoginResponse>> {
    let credentials = LoginCredentials::try_from(&payload.into_inner())
        .map_err(|err| map_login_validation_error(&err))?;
    let session = state.login.login(&credentials).await?;
    Ok(web::Json(LoginResponse {
        token: session.token.as_str().to_owned(),
        username: session.user.username().to_string(),
    }))
}

/// Describe the authenticated caller.
#[utoipa::path(
    get,
    path = "/auth/me",
    responses(
        (status = 200, description = "Current identity", body = MeResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorBody)
    ),
    tags = ["auth"],
    operation_id = "currentUser"
)]
#[get("/auth/me")]
pub async fn me(user: BearerUser) -> ApiResult<web::Json<MeResponse>> {
    let user = user.into_inner();
    Ok(web::Json(MeResponse {
        id: *user.id(),
        username: user.username().to_string(),
        role: user.role(),
        can_edit: user.can_edit(),
    }))
}
