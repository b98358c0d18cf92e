//! Builders for HTTP state over the configured repositories.
//!
//! Seeding runs here: roster accounts are created when absent and the loan
//! schedule is opened or backfilled before the first request is served.

use std::sync::Arc;

use actix_web::web;
use mockable::{Clock, DefaultClock};
use tracing::info;

use loan_backend::domain::ports::{LoanRepository, UserRepository};
use loan_backend::domain::{AuthService, Error, LoanService, ensure_users};
use loan_backend::inbound::http::state::HttpState;
use loan_backend::outbound::memory::{InMemoryLoanRepository, InMemoryUserRepository};
use loan_backend::outbound::persistence::{DieselLoanRepository, DieselUserRepository};
use loan_backend::outbound::security::{Argon2PasswordHasher, JwtTokenService};

use super::ServerConfig;

async fn build_with_repositories<R, U>(
    config: &ServerConfig,
    loans: Arc<R>,
    users: Arc<U>,
) -> Result<HttpState, Error>
where
    R: LoanRepository + 'static,
    U: UserRepository + 'static,
{
    let clock: Arc<dyn Clock> = Arc::new(DefaultClock);
    let hasher = Arc::new(Argon2PasswordHasher::new());
    let tokens = Arc::new(JwtTokenService::new(
        config.token_secret.as_bytes(),
        config.token_ttl,
    ));

    let created = ensure_users(&users, &hasher, &config.roster).await?;
    info!(
        created,
        roster = config.roster.entries().len(),
        "user roster provisioned"
    );

    let loan_service = Arc::new(LoanService::new(loans, config.terms, clock.clone()));
    let snapshot = loan_service.ensure_loan().await?;
    info!(
        loan_id = %snapshot.loan.id(),
        payments = snapshot.payments.len(),
        "loan schedule ready"
    );

    let auth_service = Arc::new(AuthService::new(users, hasher, tokens, clock));
    Ok(HttpState::new(
        auth_service,
        loan_service.clone(),
        loan_service,
    ))
}

/// Seed storage and assemble the handler state.
///
/// Uses Diesel repositories when a pool is configured, otherwise in-memory
/// ones that live as long as the process.
pub async fn build_http_state(config: &ServerConfig) -> Result<web::Data<HttpState>, Error> {
    let state = match &config.db_pool {
        Some(pool) => {
            build_with_repositories(
                config,
                Arc::new(DieselLoanRepository::new(pool.clone())),
                Arc::new(DieselUserRepository::new(pool.clone())),
            )
            .await?
        }
        None => {
            info!("no database configured; state is kept in memory");
            build_with_repositories(
                config,
                Arc::new(InMemoryLoanRepository::new()),
                Arc::new(InMemoryUserRepository::new()),
            )
            .await?
        }
    };
    Ok(web::Data::new(state))
}
