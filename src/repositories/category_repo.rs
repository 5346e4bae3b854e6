//! Category repository for async database operations.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use super::sql::{btrim, lower};
use super::{CategoryOrder, CategoryRepository, normalize_name};
use crate::db::AsyncDbPool;
use crate::error::{AppError, AppResult};
use crate::models::{Category, NewCategory, UpdateCategory};
use crate::schema::categories;

/// Category repository holding an async connection pool.
///
/// `AsyncDbPool` is reference counted, so cloning is cheap.
#[derive(Clone)]
pub struct PgCategoryRepository {
    pool: AsyncDbPool,
}

impl PgCategoryRepository {
    pub fn new(pool: AsyncDbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CategoryRepository for PgCategoryRepository {
    async fn list(&self, order: CategoryOrder) -> AppResult<Vec<Category>> {
        let mut conn = self.pool.get().await?;

        let query = categories::table
            .select(Category::as_select())
            .into_boxed();
        let query = match order {
            CategoryOrder::Name => {
                query.order((lower(categories::name).asc(), categories::id.asc()))
            }
            CategoryOrder::Id => query.order(categories::id.asc()),
        };

        query.load(&mut conn).await.map_err(AppError::from)
    }

    async fn find_by_id(&self, id: i32) -> AppResult<Option<Category>> {
        let mut conn = self.pool.get().await?;

        categories::table
            .find(id)
            .select(Category::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(AppError::from)
    }

    async fn exists_by_id(&self, id: i32) -> AppResult<bool> {
        let mut conn = self.pool.get().await?;

        diesel::select(diesel::dsl::exists(
            categories::table.filter(categories::id.eq(id)),
        ))
        .get_result(&mut conn)
        .await
        .map_err(AppError::from)
    }

    async fn exists_by_name(&self, name: &str, excluding: Option<i32>) -> AppResult<bool> {
        let mut conn = self.pool.get().await?;

        let mut query = categories::table
            .filter(lower(btrim(categories::name)).eq(normalize_name(name)))
            .into_boxed();
        if let Some(id) = excluding {
            query = query.filter(categories::id.ne(id));
        }

        let matches: i64 = query.count().get_result(&mut conn).await?;
        Ok(matches > 0)
    }

    async fn create(&self, category: NewCategory) -> AppResult<Category> {
        let mut conn = self.pool.get().await?;

        let created = diesel::insert_into(categories::table)
            .values(&category)
            .returning(Category::as_returning())
            .get_result(&mut conn)
            .await?;

        tracing::info!(category_id = created.id, "Created category");
        Ok(created)
    }

    async fn update(&self, id: i32, changes: UpdateCategory) -> AppResult<Option<Category>> {
        let mut conn = self.pool.get().await?;

        diesel::update(categories::table.find(id))
            .set(&changes)
            .returning(Category::as_returning())
            .get_result(&mut conn)
            .await
            .optional()
            .map_err(AppError::from)
    }

    async fn delete(&self, id: i32) -> AppResult<bool> {
        let mut conn = self.pool.get().await?;

        let deleted = diesel::delete(categories::table.find(id))
            .execute(&mut conn)
            .await?;

        Ok(deleted > 0)
    }
}
