//! Repository layer for data access operations.
//!
//! Each entity has an async trait with two implementations: Postgres through
//! diesel-async, and an in-memory store used by tests and
//! `database.backend = "memory"`.

mod category_repo;
mod memory;
mod product_repo;
mod user_repo;

use std::sync::Arc;

use async_trait::async_trait;

pub use category_repo::PgCategoryRepository;
pub use memory::{
    InMemoryCategoryRepository, InMemoryProductRepository, InMemoryStore, InMemoryUserRepository,
};
pub use product_repo::PgProductRepository;
pub use user_repo::PgUserRepository;

use crate::db::AsyncDbPool;
use crate::error::AppResult;
use crate::models::{
    Category, NewCategory, NewProduct, NewUser, Product, ProductWithCategory, PurchaseOutcome,
    UpdateCategory, UpdateProduct, User,
};

/// Sort order for category listings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryOrder {
    Name,
    Id,
}

/// SQL functions shared by the Postgres repositories.
mod sql {
    use diesel::sql_types::Text;

    diesel::define_sql_function!(fn lower(x: Text) -> Text);
    diesel::define_sql_function!(fn btrim(x: Text) -> Text);

    /// Escapes `LIKE` wildcards so user input matches literally.
    pub fn escape_like(term: &str) -> String {
        let mut escaped = String::with_capacity(term.len());
        for c in term.chars() {
            if matches!(c, '\\' | '%' | '_') {
                escaped.push('\\');
            }
            escaped.push(c);
        }
        escaped
    }
}

/// Canonical form used for name uniqueness and lookups.
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

#[async_trait]
pub trait CategoryRepository: Send + Sync {
    async fn list(&self, order: CategoryOrder) -> AppResult<Vec<Category>>;

    async fn find_by_id(&self, id: i32) -> AppResult<Option<Category>>;

    async fn exists_by_id(&self, id: i32) -> AppResult<bool>;

    /// Case-insensitive, whitespace-trimmed match, ignoring the row `excluding`.
    async fn exists_by_name(&self, name: &str, excluding: Option<i32>) -> AppResult<bool>;

    async fn create(&self, category: NewCategory) -> AppResult<Category>;

    /// Returns `None` when no category has `id`.
    async fn update(&self, id: i32, changes: UpdateCategory) -> AppResult<Option<Category>>;

    /// Returns `false` when nothing was deleted.
    async fn delete(&self, id: i32) -> AppResult<bool>;
}

#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// All products ordered by name.
    async fn list(&self) -> AppResult<Vec<ProductWithCategory>>;

    /// One page ordered by id, plus the total number of products.
    async fn list_paginated(
        &self,
        offset: i64,
        limit: i64,
    ) -> AppResult<(Vec<ProductWithCategory>, i64)>;

    async fn count(&self) -> AppResult<i64>;

    /// Products of one category ordered by name; empty for ids `<= 0`.
    async fn list_by_category(&self, category_id: i32) -> AppResult<Vec<ProductWithCategory>>;

    /// Case-insensitive substring match over name or description; a blank
    /// term matches everything.
    async fn search(&self, term: &str) -> AppResult<Vec<ProductWithCategory>>;

    /// `None` for ids `<= 0` or unknown ids.
    async fn find_by_id(&self, id: i32) -> AppResult<Option<ProductWithCategory>>;

    async fn exists_by_id(&self, id: i32) -> AppResult<bool>;

    async fn exists_by_name(&self, name: &str, excluding: Option<i32>) -> AppResult<bool>;

    async fn create(&self, product: NewProduct) -> AppResult<ProductWithCategory>;

    async fn update(&self, id: i32, changes: UpdateProduct) -> AppResult<Option<Product>>;

    async fn delete(&self, id: i32) -> AppResult<bool>;

    /// Decrements stock by `quantity` for the product named `name` in a single
    /// conditional step, so concurrent purchases can never oversell.
    async fn buy(&self, name: &str, quantity: i32) -> AppResult<PurchaseOutcome>;
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// All users ordered by name.
    async fn list(&self) -> AppResult<Vec<User>>;

    async fn find_by_id(&self, id: i32) -> AppResult<Option<User>>;

    /// Case-insensitive, whitespace-trimmed lookup.
    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>>;

    async fn is_unique_username(&self, username: &str) -> AppResult<bool>;

    async fn create(&self, user: NewUser) -> AppResult<User>;
}

/// Aggregates all repositories behind trait objects.
///
/// Cloning is cheap: every handle is an `Arc`.
#[derive(Clone)]
pub struct Repositories {
    pub categories: Arc<dyn CategoryRepository>,
    pub products: Arc<dyn ProductRepository>,
    pub users: Arc<dyn UserRepository>,
}

impl Repositories {
    /// Repositories backed by PostgreSQL.
    pub fn postgres(pool: AsyncDbPool) -> Self {
        Self {
            categories: Arc::new(PgCategoryRepository::new(pool.clone())),
            products: Arc::new(PgProductRepository::new(pool.clone())),
            users: Arc::new(PgUserRepository::new(pool)),
        }
    }

    /// Repositories sharing one fresh in-memory store.
    pub fn in_memory() -> Self {
        let store = InMemoryStore::new();
        Self {
            categories: Arc::new(InMemoryCategoryRepository::new(store.clone())),
            products: Arc::new(InMemoryProductRepository::new(store.clone())),
            users: Arc::new(InMemoryUserRepository::new(store)),
        }
    }
}
