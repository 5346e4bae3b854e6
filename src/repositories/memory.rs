//! In-memory repositories.
//!
//! All three repositories share one [`InMemoryStore`] so that cross-entity
//! rules (a product's category must exist, a referenced category cannot be
//! deleted) hold the same way the database constraints enforce them.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use jiff::Timestamp;
use jiff::tz::TimeZone;
use tokio::sync::RwLock;

use super::{
    CategoryOrder, CategoryRepository, ProductRepository, UserRepository, normalize_name,
};
use crate::error::{AppError, AppResult};
use crate::models::{
    Category, NewCategory, NewProduct, NewUser, Product, ProductWithCategory, PurchaseOutcome,
    UpdateCategory, UpdateProduct, User,
};

#[derive(Default)]
struct Tables {
    categories: BTreeMap<i32, Category>,
    products: BTreeMap<i32, Product>,
    users: BTreeMap<i32, User>,
    next_category_id: i32,
    next_product_id: i32,
    next_user_id: i32,
}

fn next_id(counter: &mut i32) -> i32 {
    *counter += 1;
    *counter
}

fn utc_now() -> jiff_diesel::DateTime {
    Timestamp::now().to_zoned(TimeZone::UTC).datetime().into()
}

fn duplicate(entity: &str, field: &str, value: &str) -> AppError {
    AppError::Duplicate {
        entity: entity.to_string(),
        field: field.to_string(),
        value: value.to_string(),
    }
}

impl Tables {
    fn category_name_taken(&self, name: &str, excluding: Option<i32>) -> bool {
        let key = normalize_name(name);
        self.categories
            .values()
            .any(|c| Some(c.id) != excluding && normalize_name(&c.name) == key)
    }

    fn product_name_taken(&self, name: &str, excluding: Option<i32>) -> bool {
        let key = normalize_name(name);
        self.products
            .values()
            .any(|p| Some(p.id) != excluding && normalize_name(&p.name) == key)
    }

    fn require_category(&self, category_id: i32) -> AppResult<()> {
        if self.categories.contains_key(&category_id) {
            Ok(())
        } else {
            Err(AppError::not_found_id("category", category_id))
        }
    }

    /// Products whose category row is missing are skipped, as an inner join would.
    fn joined<'a>(
        &self,
        products: impl Iterator<Item = &'a Product>,
    ) -> Vec<ProductWithCategory> {
        products
            .filter_map(|p| {
                self.categories
                    .get(&p.category_id)
                    .map(|c| ProductWithCategory::from((p.clone(), c.name.clone())))
            })
            .collect()
    }
}

/// Case-insensitive name order with the id as tie-breaker, the same as the
/// `lower(name), id` ordering of the Postgres repositories.
fn by_name(a: (&str, i32), b: (&str, i32)) -> Ordering {
    a.0.to_lowercase()
        .cmp(&b.0.to_lowercase())
        .then(a.1.cmp(&b.1))
}

fn sort_by_name(items: &mut [ProductWithCategory]) {
    items.sort_by(|a, b| {
        by_name(
            (&a.product.name, a.product.id),
            (&b.product.name, b.product.id),
        )
    });
}

/// Shared storage behind the in-memory repositories.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[derive(Clone)]
pub struct InMemoryCategoryRepository {
    store: InMemoryStore,
}

impl InMemoryCategoryRepository {
    pub fn new(store: InMemoryStore) -> Self {
        Self { store }
    }
}

#[async_trait]
impl CategoryRepository for InMemoryCategoryRepository {
    async fn list(&self, order: CategoryOrder) -> AppResult<Vec<Category>> {
        let tables = self.store.tables.read().await;
        let mut categories: Vec<Category> = tables.categories.values().cloned().collect();
        if order == CategoryOrder::Name {
            categories.sort_by(|a, b| by_name((&a.name, a.id), (&b.name, b.id)));
        }
        Ok(categories)
    }

    async fn find_by_id(&self, id: i32) -> AppResult<Option<Category>> {
        let tables = self.store.tables.read().await;
        Ok(tables.categories.get(&id).cloned())
    }

    async fn exists_by_id(&self, id: i32) -> AppResult<bool> {
        let tables = self.store.tables.read().await;
        Ok(tables.categories.contains_key(&id))
    }

    async fn exists_by_name(&self, name: &str, excluding: Option<i32>) -> AppResult<bool> {
        let tables = self.store.tables.read().await;
        Ok(tables.category_name_taken(name, excluding))
    }

    async fn create(&self, category: NewCategory) -> AppResult<Category> {
        let mut tables = self.store.tables.write().await;
        if tables.category_name_taken(&category.name, None) {
            return Err(duplicate("category", "name", &category.name));
        }

        let created = Category {
            id: next_id(&mut tables.next_category_id),
            name: category.name,
            created_at: utc_now(),
        };
        tables.categories.insert(created.id, created.clone());

        tracing::info!(category_id = created.id, "Created category");
        Ok(created)
    }

    async fn update(&self, id: i32, changes: UpdateCategory) -> AppResult<Option<Category>> {
        let mut tables = self.store.tables.write().await;
        if !tables.categories.contains_key(&id) {
            return Ok(None);
        }
        if tables.category_name_taken(&changes.name, Some(id)) {
            return Err(duplicate("category", "name", &changes.name));
        }

        Ok(tables.categories.get_mut(&id).map(|category| {
            category.name = changes.name;
            category.clone()
        }))
    }

    async fn delete(&self, id: i32) -> AppResult<bool> {
        let mut tables = self.store.tables.write().await;
        if tables.products.values().any(|p| p.category_id == id) {
            return Err(AppError::Conflict {
                message: format!("category {} is still referenced by product", id),
            });
        }
        Ok(tables.categories.remove(&id).is_some())
    }
}

#[derive(Clone)]
pub struct InMemoryProductRepository {
    store: InMemoryStore,
}

impl InMemoryProductRepository {
    pub fn new(store: InMemoryStore) -> Self {
        Self { store }
    }
}

#[async_trait]
impl ProductRepository for InMemoryProductRepository {
    async fn list(&self) -> AppResult<Vec<ProductWithCategory>> {
        let tables = self.store.tables.read().await;
        let mut items = tables.joined(tables.products.values());
        sort_by_name(&mut items);
        Ok(items)
    }

    async fn list_paginated(
        &self,
        offset: i64,
        limit: i64,
    ) -> AppResult<(Vec<ProductWithCategory>, i64)> {
        let tables = self.store.tables.read().await;
        let total = tables.products.len() as i64;
        let page = tables.products.values().skip(offset.max(0) as usize);
        let items = tables.joined(page.take(limit.max(0) as usize));
        Ok((items, total))
    }

    async fn count(&self) -> AppResult<i64> {
        let tables = self.store.tables.read().await;
        Ok(tables.products.len() as i64)
    }

    async fn list_by_category(&self, category_id: i32) -> AppResult<Vec<ProductWithCategory>> {
        if category_id <= 0 {
            return Ok(Vec::new());
        }
        let tables = self.store.tables.read().await;
        let mut items = tables.joined(
            tables
                .products
                .values()
                .filter(|p| p.category_id == category_id),
        );
        sort_by_name(&mut items);
        Ok(items)
    }

    async fn search(&self, term: &str) -> AppResult<Vec<ProductWithCategory>> {
        let needle = term.trim().to_lowercase();
        let tables = self.store.tables.read().await;
        let mut items = tables.joined(tables.products.values().filter(|p| {
            needle.is_empty()
                || p.name.to_lowercase().contains(&needle)
                || p.description.to_lowercase().contains(&needle)
        }));
        sort_by_name(&mut items);
        Ok(items)
    }

    async fn find_by_id(&self, id: i32) -> AppResult<Option<ProductWithCategory>> {
        if id <= 0 {
            return Ok(None);
        }
        let tables = self.store.tables.read().await;
        Ok(tables.joined(tables.products.get(&id).into_iter()).pop())
    }

    async fn exists_by_id(&self, id: i32) -> AppResult<bool> {
        let tables = self.store.tables.read().await;
        Ok(tables.products.contains_key(&id))
    }

    async fn exists_by_name(&self, name: &str, excluding: Option<i32>) -> AppResult<bool> {
        let tables = self.store.tables.read().await;
        Ok(tables.product_name_taken(name, excluding))
    }

    async fn create(&self, product: NewProduct) -> AppResult<ProductWithCategory> {
        let mut tables = self.store.tables.write().await;
        tables.require_category(product.category_id)?;
        if tables.product_name_taken(&product.name, None) {
            return Err(duplicate("product", "name", &product.name));
        }

        let created = Product {
            id: next_id(&mut tables.next_product_id),
            name: product.name,
            description: product.description,
            price: product.price,
            image_url: product.image_url,
            sku: product.sku,
            stock: product.stock,
            category_id: product.category_id,
            created_at: utc_now(),
            updated_at: Some(utc_now()),
        };
        tables.products.insert(created.id, created.clone());

        tracing::info!(product_id = created.id, "Created product");
        let category_name = tables
            .categories
            .get(&created.category_id)
            .map(|c| c.name.clone())
            .unwrap_or_default();
        Ok(ProductWithCategory::from((created, category_name)))
    }

    async fn update(&self, id: i32, changes: UpdateProduct) -> AppResult<Option<Product>> {
        let mut tables = self.store.tables.write().await;
        if !tables.products.contains_key(&id) {
            return Ok(None);
        }
        tables.require_category(changes.category_id)?;
        if tables.product_name_taken(&changes.name, Some(id)) {
            return Err(duplicate("product", "name", &changes.name));
        }

        Ok(tables.products.get_mut(&id).map(|product| {
            product.name = changes.name;
            product.description = changes.description;
            product.price = changes.price;
            product.image_url = changes.image_url;
            product.sku = changes.sku;
            product.stock = changes.stock;
            product.category_id = changes.category_id;
            product.updated_at = Some(utc_now());
            product.clone()
        }))
    }

    async fn delete(&self, id: i32) -> AppResult<bool> {
        let mut tables = self.store.tables.write().await;
        Ok(tables.products.remove(&id).is_some())
    }

    async fn buy(&self, name: &str, quantity: i32) -> AppResult<PurchaseOutcome> {
        let key = normalize_name(name);
        // Held for the whole check-and-decrement
        let mut tables = self.store.tables.write().await;

        let Some(product) = tables
            .products
            .values_mut()
            .find(|p| normalize_name(&p.name) == key)
        else {
            return Ok(PurchaseOutcome::NotFound);
        };

        if product.stock < quantity {
            return Ok(PurchaseOutcome::InsufficientStock {
                available: product.stock,
            });
        }

        product.stock -= quantity;
        product.updated_at = Some(utc_now());
        tracing::info!(
            product_id = product.id,
            quantity,
            remaining = product.stock,
            "Product purchased"
        );
        Ok(PurchaseOutcome::Purchased(product.clone()))
    }
}

#[derive(Clone)]
pub struct InMemoryUserRepository {
    store: InMemoryStore,
}

impl InMemoryUserRepository {
    pub fn new(store: InMemoryStore) -> Self {
        Self { store }
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn list(&self) -> AppResult<Vec<User>> {
        let tables = self.store.tables.read().await;
        let mut users: Vec<User> = tables.users.values().cloned().collect();
        users.sort_by(|a, b| by_name((&a.name, a.id), (&b.name, b.id)));
        Ok(users)
    }

    async fn find_by_id(&self, id: i32) -> AppResult<Option<User>> {
        let tables = self.store.tables.read().await;
        Ok(tables.users.get(&id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>> {
        let key = normalize_name(username);
        let tables = self.store.tables.read().await;
        Ok(tables
            .users
            .values()
            .find(|u| normalize_name(&u.username) == key)
            .cloned())
    }

    async fn is_unique_username(&self, username: &str) -> AppResult<bool> {
        Ok(self.find_by_username(username).await?.is_none())
    }

    async fn create(&self, user: NewUser) -> AppResult<User> {
        let mut tables = self.store.tables.write().await;
        let key = normalize_name(&user.username);
        if tables
            .users
            .values()
            .any(|u| normalize_name(&u.username) == key)
        {
            return Err(duplicate("user", "username", &user.username));
        }

        let created = User {
            id: next_id(&mut tables.next_user_id),
            name: user.name,
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
            role: user.role,
            created_at: utc_now(),
        };
        tables.users.insert(created.id, created.clone());

        tracing::info!(user_id = created.id, username = %created.username, "Created user");
        Ok(created)
    }
}
