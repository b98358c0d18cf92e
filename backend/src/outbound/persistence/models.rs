//! Internal Diesel row structs for database operations.
//!
//! These types are implementation details of the persistence layer and must
//! never be exposed to the domain.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use super::schema::{loans, payments, users};

/// Row struct for reading from the users table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct UserRow {
    pub id: Uuid,
    pub username: String,
    pub password_hash: String,
    pub role: String,
}

/// Insertable struct for creating user records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = users)]
pub(crate) struct NewUserRow<'a> {
    pub id: Uuid,
    pub username: &'a str,
    pub password_hash: &'a str,
    pub role: &'a str,
}

/// Row struct for reading from the loans table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = loans)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct LoanRow {
    pub id: Uuid,
    pub principal_cents: i64,
    pub monthly_payment_cents: i64,
    pub total_months: i32,
    pub start_date: DateTime<Utc>,
}

/// Insertable struct for the loan record.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = loans)]
pub(crate) struct NewLoanRow {
    pub id: Uuid,
    pub principal_cents: i64,
    pub monthly_payment_cents: i64,
    pub total_months: i32,
    pub start_date: DateTime<Utc>,
}

/// Row struct for reading and inserting payments.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = payments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct PaymentRow {
    pub id: Uuid,
    pub loan_id: Uuid,
    pub month: i32,
    pub amount_cents: i64,
    pub status: String,
    pub paid_at: Option<DateTime<Utc>>,
    pub note: Option<String>,
}

/// Changeset applied when a payment upsert hits an existing month.
///
/// `treat_none_as_null` so clearing the date or note is written through.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = payments)]
#[diesel(treat_none_as_null = true)]
pub(crate) struct PaymentStatusChangeset<'a> {
    pub status: &'a str,
    pub paid_at: Option<DateTime<Utc>>,
    pub note: Option<&'a str>,
}
