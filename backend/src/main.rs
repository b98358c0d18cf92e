//! Backend entry-point: loads settings, prepares storage and serves the API.

mod server;

use actix_web::web;
use color_eyre::eyre::{Context, Result, eyre};
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use loan_backend::inbound::http::health::HealthState;
use loan_backend::outbound::persistence::{DbPool, run_pending_migrations};
use server::{LoanSettings, ServerConfig, create_server};

/// Application bootstrap.
#[actix_web::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = LoanSettings::load().map_err(|e| eyre!("failed to load settings: {e}"))?;
    let bind_addr = settings.bind_addr()?;
    let mut config = ServerConfig::new(
        bind_addr,
        settings.terms()?,
        settings.roster()?,
        settings.token_secret()?,
        settings.token_ttl()?,
    );

    if let Some(pool_config) = settings.pool_config()? {
        run_pending_migrations(pool_config.database_url())
            .await
            .wrap_err("database migrations failed")?;
        let pool = DbPool::new(pool_config)
            .await
            .wrap_err("failed to build database pool")?;
        config = config.with_db_pool(pool);
    }

    let health_state = web::Data::new(HealthState::new());
    let server = create_server(health_state, config).await?;
    info!(%bind_addr, "loan service listening");
    server.await?;
    Ok(())
}
