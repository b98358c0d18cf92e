//! Bearer-token extractor.
//!
//! Handlers that take [`BearerUser`] only run once the `Authorization`
//! header has been verified; failures short-circuit with 401.

use actix_web::dev::Payload;
use actix_web::http::header::AUTHORIZATION;
use actix_web::{FromRequest, HttpRequest, web};
use futures_util::future::{Ready, ready};

use crate::domain::{AuthenticatedUser, Error, INVALID_TOKEN_MESSAGE, MISSING_TOKEN_MESSAGE};

use super::state::HttpState;

/// Identity proven by a valid bearer token.
#[derive(Debug, Clone)]
pub struct BearerUser(pub AuthenticatedUser);

impl BearerUser {
    /// The verified identity.
    pub fn into_inner(self) -> AuthenticatedUser {
        self.0
    }
}

fn token_from(req: &HttpRequest) -> Result<&str, Error> {
    let header = req
        .headers()
        .get(AUTHORIZATION)
        .ok_or_else(|| Error::unauthorized(MISSING_TOKEN_MESSAGE))?;
    let value = header
        .to_str()
        .map_err(|_| Error::unauthorized(INVALID_TOKEN_MESSAGE))?;
    let token = value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| Error::unauthorized(INVALID_TOKEN_MESSAGE))?;
    Ok(token)
}

fn extract(req: &HttpRequest) -> Result<BearerUser, Error> {
    let token = token_from(req)?;
    let state = req
        .app_data::<web::Data<HttpState>>()
        .ok_or_else(|| Error::internal("HTTP state is not registered"))?;
    state.login.authenticate(token).map(BearerUser)
}

impl FromRequest for BearerUser {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(extract(req))
    }
}
