//! User repository for async database operations.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use super::sql::{btrim, lower};
use super::{UserRepository, normalize_name};
use crate::db::AsyncDbPool;
use crate::error::{AppError, AppResult};
use crate::models::{NewUser, User};
use crate::schema::users;

/// User repository holding an async connection pool.
///
/// Since `AsyncDbPool` (bb8::Pool) internally uses `Arc`, cloning is cheap.
#[derive(Clone)]
pub struct PgUserRepository {
    pool: AsyncDbPool,
}

impl PgUserRepository {
    pub fn new(pool: AsyncDbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn list(&self) -> AppResult<Vec<User>> {
        let mut conn = self.pool.get().await?;

        users::table
            .select(User::as_select())
            .order((lower(users::name).asc(), users::id.asc()))
            .load(&mut conn)
            .await
            .map_err(AppError::from)
    }

    async fn find_by_id(&self, id: i32) -> AppResult<Option<User>> {
        let mut conn = self.pool.get().await?;

        users::table
            .find(id)
            .select(User::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(AppError::from)
    }

    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>> {
        let mut conn = self.pool.get().await?;

        users::table
            .filter(lower(btrim(users::username)).eq(normalize_name(username)))
            .select(User::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(AppError::from)
    }

    async fn is_unique_username(&self, username: &str) -> AppResult<bool> {
        let mut conn = self.pool.get().await?;

        let taken: i64 = users::table
            .filter(lower(btrim(users::username)).eq(normalize_name(username)))
            .count()
            .get_result(&mut conn)
            .await?;

        Ok(taken == 0)
    }

    async fn create(&self, user: NewUser) -> AppResult<User> {
        let mut conn = self.pool.get().await?;

        let created = diesel::insert_into(users::table)
            .values(&user)
            .returning(User::as_returning())
            .get_result(&mut conn)
            .await?;

        tracing::info!(user_id = created.id, username = %created.username, "Created user");
        Ok(created)
    }
}
