//! bb8 pool of `diesel-async` PostgreSQL connections.
//!
//! Size and checkout timeout come from the service settings; every failure is
//! reported as a [`PoolError`] and mapped to a port error by the repositories.

use std::time::Duration;

use diesel_async::AsyncPgConnection;
use diesel_async::pooled_connection::AsyncDieselConnectionManager;
use diesel_async::pooled_connection::bb8::{Pool, PooledConnection};
use tracing::debug;

/// Pool construction or checkout failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PoolError {
    /// No connection became available before the timeout.
    #[error("no database connection available: {message}")]
    Checkout { message: String },

    /// The pool could not be created.
    #[error("cannot create database pool: {message}")]
    Build { message: String },
}

impl PoolError {
    /// Checkout failure carrying `message`.
    pub fn checkout(message: impl Into<String>) -> Self {
        Self::Checkout {
            message: message.into(),
        }
    }

    /// Construction failure carrying `message`.
    pub fn build(message: impl Into<String>) -> Self {
        Self::Build {
            message: message.into(),
        }
    }
}

/// Where to connect and how many connections to hold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolConfig {
    database_url: String,
    max_size: u32,
    connection_timeout: Duration,
}

impl PoolConfig {
    /// Pool of at most `max_size` connections to `database_url`, waiting up to
    /// `connection_timeout` for a checkout.
    ///
    /// # Errors
    /// Returns [`PoolError::Build`] when `max_size` or the timeout is zero.
    pub fn try_new(
        database_url: impl Into<String>,
        max_size: u32,
        connection_timeout: Duration,
    ) -> Result<Self, PoolError> {
        if max_size == 0 {
            return Err(PoolError::build("pool size must be at least one"));
        }
        if connection_timeout.is_zero() {
            return Err(PoolError::build("connection timeout must be positive"));
        }
        Ok(Self {
            database_url: database_url.into(),
            max_size,
            connection_timeout,
        })
    }

    /// Database URL.
    pub fn database_url(&self) -> &str {
        &self.database_url
    }

    /// Upper bound on open connections.
    pub fn max_size(&self) -> u32 {
        self.max_size
    }

    /// Checkout timeout.
    pub fn connection_timeout(&self) -> Duration {
        self.connection_timeout
    }
}

/// Shared connection pool handed to the Diesel repositories.
#[derive(Clone)]
pub struct DbPool {
    inner: Pool<AsyncPgConnection>,
}

impl DbPool {
    /// Build the pool. Connections are opened lazily on first checkout.
    ///
    /// # Errors
    /// Returns [`PoolError::Build`] when bb8 rejects the configuration.
    pub async fn new(config: PoolConfig) -> Result<Self, PoolError> {
        let manager = AsyncDieselConnectionManager::<AsyncPgConnection>::new(config.database_url);
        let inner = Pool::builder()
            .max_size(config.max_size)
            .connection_timeout(config.connection_timeout)
            .build(manager)
            .await
            .map_err(|err| PoolError::build(err.to_string()))?;
        debug!(max_size = config.max_size, "database pool ready");
        Ok(Self { inner })
    }

    /// Check out a connection.
    ///
    /// # Errors
    /// Returns [`PoolError::Checkout`] when the timeout elapses first.
    pub async fn get(&self) -> Result<PooledConnection<'_, AsyncPgConnection>, PoolError> {
        self.inner
            .get()
            .await
            .map_err(|err| PoolError::checkout(err.to_string()))
    }
}
