//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match the database migrations exactly. The
//! `diesel print-schema` command can regenerate them from a live database.

diesel::table! {
    /// Fixed user roster.
    users (id) {
        id -> Uuid,
        /// Unique, case-sensitive login name.
        username -> Varchar,
        /// Argon2 PHC string.
        password_hash -> Text,
        /// `viewer` or `editor`.
        role -> Varchar,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Singleton loan record. Never updated after insert.
    loans (id) {
        id -> Uuid,
        principal_cents -> Int8,
        monthly_payment_cents -> Int8,
        total_months -> Int4,
        start_date -> Timestamptz,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// One row per loan month, unique on `(loan_id, month)`.
    payments (id) {
        id -> Uuid,
        loan_id -> Uuid,
        month -> Int4,
        amount_cents -> Int8,
        /// `PAID` or `UNPAID`.
        status -> Varchar,
        paid_at -> Nullable<Timestamptz>,
        note -> Nullable<Text>,
    }
}

diesel::joinable!(payments -> loans (loan_id));
diesel::allow_tables_to_appear_in_same_query!(loans, payments, users);
