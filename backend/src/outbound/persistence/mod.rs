//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! Concrete implementations of the loan and user repository ports backed by
//! PostgreSQL through `diesel-async` and a `bb8` pool.
//!
//! - **Thin adapters**: repositories only translate between Diesel rows and
//!   domain types. No business logic resides here.
//! - **Internal models**: row structs (`models.rs`) and table definitions
//!   (`schema.rs`) never leave this module.
//! - **Strongly typed errors**: database failures map to the port error
//!   enums; raw database messages are only logged.
//!
//! # Example
//!
//! ```ignore
//! use loan_backend::outbound::persistence::{DbPool, DieselLoanRepository, PoolConfig};
//!
//! let config = PoolConfig::try_new("postgres://localhost/loan", 10, Duration::from_secs(30))?;
//! let pool = DbPool::new(config).await?;
//! let repo = DieselLoanRepository::new(pool);
//! ```

mod diesel_error_mapping;
mod diesel_loan_repository;
mod diesel_user_repository;
mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_loan_repository::DieselLoanRepository;
pub use diesel_user_repository::DieselUserRepository;
pub use migrations::{MigrationError, run_pending_migrations};
pub use pool::{DbPool, PoolConfig, PoolError};
