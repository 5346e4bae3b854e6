//! Product repository for async database operations.
//!
//! Every read joins `categories` so responses can carry the category name.

use async_trait::async_trait;
use diesel::dsl::now;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use super::sql::{btrim, escape_like, lower};
use super::{ProductRepository, normalize_name};
use crate::db::AsyncDbPool;
use crate::error::{AppError, AppResult};
use crate::models::{
    NewProduct, Product, ProductWithCategory, PurchaseOutcome, UpdateProduct,
};
use crate::schema::{categories, products};

#[derive(Clone)]
pub struct PgProductRepository {
    pool: AsyncDbPool,
}

impl PgProductRepository {
    pub fn new(pool: AsyncDbPool) -> Self {
        Self { pool }
    }
}

fn with_category(rows: Vec<(Product, String)>) -> Vec<ProductWithCategory> {
    rows.into_iter().map(ProductWithCategory::from).collect()
}

#[async_trait]
impl ProductRepository for PgProductRepository {
    async fn list(&self) -> AppResult<Vec<ProductWithCategory>> {
        let mut conn = self.pool.get().await?;

        let rows = products::table
            .inner_join(categories::table)
            .select((Product::as_select(), categories::name))
            .order((lower(products::name).asc(), products::id.asc()))
            .load::<(Product, String)>(&mut conn)
            .await?;

        Ok(with_category(rows))
    }

    async fn list_paginated(
        &self,
        offset: i64,
        limit: i64,
    ) -> AppResult<(Vec<ProductWithCategory>, i64)> {
        let mut conn = self.pool.get().await?;

        let total: i64 = products::table.count().get_result(&mut conn).await?;
        let rows = products::table
            .inner_join(categories::table)
            .select((Product::as_select(), categories::name))
            .order(products::id.asc())
            .offset(offset)
            .limit(limit)
            .load::<(Product, String)>(&mut conn)
            .await?;

        Ok((with_category(rows), total))
    }

    async fn count(&self) -> AppResult<i64> {
        let mut conn = self.pool.get().await?;

        products::table
            .count()
            .get_result(&mut conn)
            .await
            .map_err(AppError::from)
    }

    async fn list_by_category(&self, category_id: i32) -> AppResult<Vec<ProductWithCategory>> {
        if category_id <= 0 {
            return Ok(Vec::new());
        }
        let mut conn = self.pool.get().await?;

        let rows = products::table
            .inner_join(categories::table)
            .filter(products::category_id.eq(category_id))
            .select((Product::as_select(), categories::name))
            .order((lower(products::name).asc(), products::id.asc()))
            .load::<(Product, String)>(&mut conn)
            .await?;

        Ok(with_category(rows))
    }

    async fn search(&self, term: &str) -> AppResult<Vec<ProductWithCategory>> {
        let term = term.trim();
        if term.is_empty() {
            return self.list().await;
        }
        let pattern = format!("%{}%", escape_like(term));
        let mut conn = self.pool.get().await?;

        let rows = products::table
            .inner_join(categories::table)
            .filter(
                products::name
                    .ilike(&pattern)
                    .or(products::description.ilike(&pattern)),
            )
            .select((Product::as_select(), categories::name))
            .order((lower(products::name).asc(), products::id.asc()))
            .load::<(Product, String)>(&mut conn)
            .await?;

        Ok(with_category(rows))
    }

    async fn find_by_id(&self, id: i32) -> AppResult<Option<ProductWithCategory>> {
        if id <= 0 {
            return Ok(None);
        }
        let mut conn = self.pool.get().await?;

        let row = products::table
            .inner_join(categories::table)
            .filter(products::id.eq(id))
            .select((Product::as_select(), categories::name))
            .first::<(Product, String)>(&mut conn)
            .await
            .optional()?;

        Ok(row.map(ProductWithCategory::from))
    }

    async fn exists_by_id(&self, id: i32) -> AppResult<bool> {
        let mut conn = self.pool.get().await?;

        diesel::select(diesel::dsl::exists(
            products::table.filter(products::id.eq(id)),
        ))
        .get_result(&mut conn)
        .await
        .map_err(AppError::from)
    }

    async fn exists_by_name(&self, name: &str, excluding: Option<i32>) -> AppResult<bool> {
        let mut conn = self.pool.get().await?;

        let mut query = products::table
            .filter(lower(btrim(products::name)).eq(normalize_name(name)))
            .into_boxed();
        if let Some(id) = excluding {
            query = query.filter(products::id.ne(id));
        }

        let matches: i64 = query.count().get_result(&mut conn).await?;
        Ok(matches > 0)
    }

    async fn create(&self, product: NewProduct) -> AppResult<ProductWithCategory> {
        let mut conn = self.pool.get().await?;

        let created = diesel::insert_into(products::table)
            .values((&product, products::updated_at.eq(now.nullable())))
            .returning(Product::as_returning())
            .get_result(&mut conn)
            .await?;

        let category_name = categories::table
            .find(created.category_id)
            .select(categories::name)
            .first::<String>(&mut conn)
            .await?;

        tracing::info!(product_id = created.id, "Created product");
        Ok(ProductWithCategory::from((created, category_name)))
    }

    async fn update(&self, id: i32, changes: UpdateProduct) -> AppResult<Option<Product>> {
        let mut conn = self.pool.get().await?;

        diesel::update(products::table.find(id))
            .set((&changes, products::updated_at.eq(now.nullable())))
            .returning(Product::as_returning())
            .get_result(&mut conn)
            .await
            .optional()
            .map_err(AppError::from)
    }

    async fn delete(&self, id: i32) -> AppResult<bool> {
        let mut conn = self.pool.get().await?;

        let deleted = diesel::delete(products::table.find(id))
            .execute(&mut conn)
            .await?;

        Ok(deleted > 0)
    }

    async fn buy(&self, name: &str, quantity: i32) -> AppResult<PurchaseOutcome> {
        let key = normalize_name(name);
        let mut conn = self.pool.get().await?;

        // The stock guard lives in the WHERE clause so the check and the
        // decrement happen in one statement.
        let purchased = diesel::update(
            products::table
                .filter(lower(btrim(products::name)).eq(&key))
                .filter(products::stock.ge(quantity)),
        )
        .set((
            products::stock.eq(products::stock - quantity),
            products::updated_at.eq(now.nullable()),
        ))
        .returning(Product::as_returning())
        .get_result(&mut conn)
        .await
        .optional()?;

        if let Some(product) = purchased {
            tracing::info!(
                product_id = product.id,
                quantity,
                remaining = product.stock,
                "Product purchased"
            );
            return Ok(PurchaseOutcome::Purchased(product));
        }

        let available = products::table
            .filter(lower(btrim(products::name)).eq(&key))
            .select(products::stock)
            .first::<i32>(&mut conn)
            .await
            .optional()?;

        Ok(match available {
            Some(available) => PurchaseOutcome::InsufficientStock { available },
            None => PurchaseOutcome::NotFound,
        })
    }
}
