//! PostgreSQL-backed `UserRepository` implementation using Diesel ORM.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{UserAccount, UserPersistenceError, UserRepository};
use crate::domain::{Role, User, UserId, Username};

use super::diesel_error_mapping::{map_diesel_error, map_pool_error};
use super::models::{NewUserRow, UserRow};
use super::pool::{DbPool, PoolError};
use super::schema::users;

/// Diesel-backed implementation of the [`UserRepository`] port.
#[derive(Clone)]
pub struct DieselUserRepository {
    pool: DbPool,
}

impl DieselUserRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn pool_error(error: PoolError) -> UserPersistenceError {
    map_pool_error(error, UserPersistenceError::connection)
}

fn diesel_error(error: diesel::result::Error) -> UserPersistenceError {
    map_diesel_error(
        error,
        UserPersistenceError::query,
        UserPersistenceError::connection,
    )
}

fn row_to_account(row: UserRow) -> Result<UserAccount, UserPersistenceError> {
    let username = Username::new(row.username)
        .map_err(|err| UserPersistenceError::query(format!("invalid stored username: {err}")))?;
    let role: Role = row
        .role
        .parse()
        .map_err(|err| UserPersistenceError::query(format!("invalid stored role: {err}")))?;
    Ok(UserAccount {
        user: User::new(UserId::from(row.id), username, role),
        password_hash: row.password_hash,
    })
}

#[async_trait]
impl UserRepository for DieselUserRepository {
    async fn find_by_username(
        &self,
        username: &Username,
    ) -> Result<Option<UserAccount>, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;

        let row = users::table
            .filter(users::username.eq(username.as_ref()))
            .select(UserRow::as_select())
            .first::<UserRow>(&mut conn)
            .await
            .optional()
            .map_err(diesel_error)?;

        row.map(row_to_account).transpose()
    }

    async fn insert_if_absent(&self, account: &UserAccount) -> Result<bool, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;

        let new_row = NewUserRow {
            id: *account.user.id().as_uuid(),
            username: account.user.username().as_ref(),
            password_hash: account.password_hash.as_str(),
            role: account.user.role().as_str(),
        };

        let inserted = diesel::insert_into(users::table)
            .values(&new_row)
            .on_conflict(users::username)
            .do_nothing()
            .execute(&mut conn)
            .await
            .map_err(diesel_error)?;

        Ok(inserted > 0)
    }
}

#[cfg(test)]
mod tests {
    //! Row conversion coverage; queries need a live database.
    use super::*;
    use rstest::rstest;
    use uuid::Uuid;

    fn row(username: &str, role: &str) -> UserRow {
        UserRow {
            id: Uuid::new_v4(),
            username: username.to_owned(),
            password_hash: "$argon2id$v=19$stub".to_owned(),
            role: role.to_owned(),
        }
    }

    #[rstest]
    #[case("editor", Role::Editor)]
    #[case("viewer", Role::Viewer)]
    fn rows_convert_to_accounts(#[case] stored: &str, #[case] expected: Role) {
        let account = row_to_account(row("Jasper", stored)).expect("valid row");
        assert_eq!(account.user.role(), expected);
        assert_eq!(account.user.username().as_ref(), "Jasper");
    }

    #[rstest]
    #[case(row("Jasper", "owner"))]
    #[case(row("", "viewer"))]
    fn corrupt_rows_are_query_errors(#[case] bad: UserRow) {
        let err = row_to_account(bad).expect_err("corrupt row");
        assert!(matches!(err, UserPersistenceError::Query { .. }));
    }
}
