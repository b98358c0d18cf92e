//! HTTP server configuration object and helpers.

use std::net::SocketAddr;

use chrono::Duration;
use loan_backend::domain::{LoanTerms, Roster};
use loan_backend::outbound::persistence::DbPool;

/// Builder-style configuration for creating the HTTP server.
pub struct ServerConfig {
    pub(crate) bind_addr: SocketAddr,
    pub(crate) terms: LoanTerms,
    pub(crate) roster: Roster,
    pub(crate) token_secret: String,
    pub(crate) token_ttl: Duration,
    pub(crate) db_pool: Option<DbPool>,
}

impl ServerConfig {
    /// Construct a configuration that keeps state in process memory.
    #[must_use]
    pub fn new(
        bind_addr: SocketAddr,
        terms: LoanTerms,
        roster: Roster,
        token_secret: String,
        token_ttl: Duration,
    ) -> Self {
        Self {
            bind_addr,
            terms,
            roster,
            token_secret,
            token_ttl,
            db_pool: None,
        }
    }

    /// Attach a database connection pool for persistence adapters.
    ///
    /// When provided, loans, payments and users are stored in PostgreSQL.
    #[must_use]
    pub fn with_db_pool(mut self, pool: DbPool) -> Self {
        self.db_pool = Some(pool);
        self
    }
}
