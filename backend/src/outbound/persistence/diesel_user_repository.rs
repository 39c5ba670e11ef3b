//! PostgreSQL-backed user repository.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{UserRepository, UserStoreError};
use crate::domain::{User, UserId};

use super::error_mapping::{classify_diesel_error, pool_error_message};
use super::models::{NewUserRow, UserRow};
use super::pool::{DbPool, PoolError};
use super::schema::users;

/// Diesel implementation of [`UserRepository`].
#[derive(Clone)]
pub struct DieselUserRepository {
    pool: DbPool,
}

impl DieselUserRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> UserStoreError {
    UserStoreError::connection(pool_error_message(error))
}

fn map_diesel_error(error: diesel::result::Error, operation: &str) -> UserStoreError {
    match classify_diesel_error(error, operation) {
        Ok(message) => UserStoreError::storage(message),
        Err(message) => UserStoreError::connection(message),
    }
}

#[async_trait]
impl UserRepository for DieselUserRepository {
    async fn create(&self, is_admin: bool, tokens: u32) -> Result<User, UserStoreError> {
        let tokens_remaining = i32::try_from(tokens)
            .map_err(|_| UserStoreError::storage(format!("token balance {tokens} too large")))?;
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: UserRow = diesel::insert_into(users::table)
            .values(NewUserRow {
                id: *UserId::random().as_uuid(),
                tokens_remaining,
                is_admin,
            })
            .returning(UserRow::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(|error| map_diesel_error(error, "create user"))?;

        Ok(User::from(row))
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<UserRow> = users::table
            .find(*id.as_uuid())
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(|error| map_diesel_error(error, "find user"))?;

        Ok(row.map(User::from))
    }
}
