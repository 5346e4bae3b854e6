//! Product rules: category must exist, names are unique, purchases never
//! oversell.

use std::sync::Arc;

use super::{duplicate, ensure_positive_id, required_name};
use crate::error::{AppError, AppResult};
use crate::models::{NewProduct, Product, ProductWithCategory, PurchaseOutcome, UpdateProduct};
use crate::repositories::{CategoryRepository, ProductRepository};

#[derive(Clone)]
pub struct ProductService {
    repo: Arc<dyn ProductRepository>,
    categories: Arc<dyn CategoryRepository>,
}

impl ProductService {
    pub fn new(repo: Arc<dyn ProductRepository>, categories: Arc<dyn CategoryRepository>) -> Self {
        Self { repo, categories }
    }

    pub async fn list(&self) -> AppResult<Vec<ProductWithCategory>> {
        self.repo.list().await
    }

    /// One 1-based page ordered by id, with the total product count.
    pub async fn list_paginated(
        &self,
        page: u32,
        page_size: u32,
    ) -> AppResult<(Vec<ProductWithCategory>, u64)> {
        let offset = i64::from(page.saturating_sub(1)) * i64::from(page_size);
        let (items, total) = self
            .repo
            .list_paginated(offset, i64::from(page_size))
            .await?;
        Ok((items, total.max(0) as u64))
    }

    pub async fn get(&self, id: i32) -> AppResult<ProductWithCategory> {
        ensure_positive_id(id)?;
        self.repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found_id("product", id))
    }

    pub async fn list_by_category(&self, category_id: i32) -> AppResult<Vec<ProductWithCategory>> {
        self.repo.list_by_category(category_id).await
    }

    pub async fn search(&self, term: &str) -> AppResult<Vec<ProductWithCategory>> {
        self.repo.search(term).await
    }

    pub async fn create(&self, mut product: NewProduct) -> AppResult<ProductWithCategory> {
        self.ensure_category(product.category_id).await?;
        product.name = required_name("product", &product.name)?.to_string();
        if self.repo.exists_by_name(&product.name, None).await? {
            return Err(duplicate("product", "name", &product.name));
        }

        self.repo.create(product).await
    }

    pub async fn update(&self, id: i32, mut changes: UpdateProduct) -> AppResult<Product> {
        ensure_positive_id(id)?;
        if !self.repo.exists_by_id(id).await? {
            return Err(AppError::not_found_id("product", id));
        }
        self.ensure_category(changes.category_id).await?;

        changes.name = required_name("product", &changes.name)?.to_string();
        if self.repo.exists_by_name(&changes.name, Some(id)).await? {
            return Err(duplicate("product", "name", &changes.name));
        }

        self.repo
            .update(id, changes)
            .await?
            .ok_or_else(|| AppError::not_found_id("product", id))
    }

    pub async fn delete(&self, id: i32) -> AppResult<()> {
        ensure_positive_id(id)?;
        if !self.repo.delete(id).await? {
            return Err(AppError::not_found_id("product", id));
        }
        tracing::info!(product_id = id, "Deleted product");
        Ok(())
    }

    /// Buys `quantity` units of the product called `name`.
    ///
    /// # Errors
    /// - `BadRequest` when the quantity is not positive, the name is blank,
    ///   or stock is insufficient
    /// - `NotFound` when no product has that name
    pub async fn buy(&self, name: &str, quantity: i32) -> AppResult<Product> {
        if quantity <= 0 {
            return Err(AppError::bad_request("quantity must be greater than zero"));
        }
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::bad_request("product name is required"));
        }

        match self.repo.buy(name, quantity).await? {
            PurchaseOutcome::Purchased(product) => Ok(product),
            PurchaseOutcome::NotFound => Err(AppError::NotFound {
                entity: "product".to_string(),
                field: "name".to_string(),
                value: name.to_string(),
            }),
            PurchaseOutcome::InsufficientStock { available } => {
                tracing::warn!(product = %name, quantity, available, "Purchase rejected");
                Err(AppError::bad_request(format!(
                    "insufficient stock for product '{}': requested {}, available {}",
                    name, quantity, available
                )))
            }
        }
    }

    async fn ensure_category(&self, category_id: i32) -> AppResult<()> {
        if category_id <= 0 || !self.categories.exists_by_id(category_id).await? {
            return Err(AppError::not_found_id("category", category_id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewCategory;
    use crate::repositories::Repositories;
    use bigdecimal::BigDecimal;
    use std::str::FromStr;

    fn new_product(name: &str, category_id: i32, stock: i32) -> NewProduct {
        NewProduct {
            name: name.to_string(),
            description: "A product".to_string(),
            price: BigDecimal::from_str("19.99").unwrap(),
            image_url: Some("https://cdn.example.com/p.png".to_string()),
            sku: "SKU-1".to_string(),
            stock,
            category_id,
        }
    }

    fn changes(name: &str, category_id: i32) -> UpdateProduct {
        UpdateProduct {
            name: name.to_string(),
            description: "Updated".to_string(),
            price: BigDecimal::from(5),
            image_url: None,
            sku: "SKU-2".to_string(),
            stock: 1,
            category_id,
        }
    }

    async fn setup() -> (ProductService, i32) {
        let repos = Repositories::in_memory();
        let category = repos
            .categories
            .create(NewCategory {
                name: "Books".to_string(),
            })
            .await
            .unwrap();
        (
            ProductService::new(repos.products, repos.categories),
            category.id,
        )
    }

    #[tokio::test]
    async fn test_create_requires_known_category() {
        let (service, _) = setup().await;
        let err = service.create(new_product("Atlas", 42, 1)).await.unwrap_err();
        assert_eq!(err.to_string(), "category not found with id 42");
    }

    #[tokio::test]
    async fn test_blank_names_are_rejected() {
        let (service, books) = setup().await;
        match service.create(new_product("  ", books, 1)).await {
            Err(AppError::BadRequest { message }) => assert_eq!(message, "product name is required"),
            other => panic!("Expected BadRequest, got {:?}", other),
        }

        let atlas = service.create(new_product("Atlas", books, 1)).await.unwrap();
        assert!(matches!(
            service.update(atlas.product.id, changes(" ", books)).await,
            Err(AppError::BadRequest { .. })
        ));
    }

    #[tokio::test]
    async fn test_create_rejects_duplicate_names() {
        let (service, books) = setup().await;
        let created = service.create(new_product(" Atlas ", books, 1)).await.unwrap();
        assert_eq!(created.product.name, "Atlas");
        assert_eq!(created.category_name, "Books");

        assert!(matches!(
            service.create(new_product("ATLAS", books, 1)).await,
            Err(AppError::Duplicate { .. })
        ));
    }

    #[tokio::test]
    async fn test_update_rules() {
        let (service, books) = setup().await;
        let atlas = service.create(new_product("Atlas", books, 1)).await.unwrap();
        service.create(new_product("Novel", books, 1)).await.unwrap();
        let id = atlas.product.id;

        let updated = service.update(id, changes("atlas", books)).await.unwrap();
        assert_eq!(updated.name, "atlas");
        assert_eq!(updated.image_url, None);

        assert!(matches!(
            service.update(id, changes("Novel", books)).await,
            Err(AppError::Duplicate { .. })
        ));
        assert!(matches!(
            service.update(id, changes("Atlas", 77)).await,
            Err(AppError::NotFound { .. })
        ));
        assert!(matches!(
            service.update(500, changes("Globe", books)).await,
            Err(AppError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_pagination_offsets() {
        let (service, books) = setup().await;
        for name in ["A", "B", "C", "D", "E"] {
            service.create(new_product(name, books, 1)).await.unwrap();
        }

        let (page, total) = service.list_paginated(2, 2).await.unwrap();
        assert_eq!(total, 5);
        let names: Vec<&str> = page.iter().map(|p| p.product.name.as_str()).collect();
        assert_eq!(names, vec!["C", "D"]);

        let (last, _) = service.list_paginated(3, 2).await.unwrap();
        assert_eq!(last.len(), 1);
    }

    #[tokio::test]
    async fn test_buy_rules() {
        let (service, books) = setup().await;
        service.create(new_product("Atlas", books, 3)).await.unwrap();

        assert!(matches!(
            service.buy("Atlas", 0).await,
            Err(AppError::BadRequest { .. })
        ));
        assert!(matches!(
            service.buy("  ", 1).await,
            Err(AppError::BadRequest { .. })
        ));
        assert!(matches!(
            service.buy("Globe", 1).await,
            Err(AppError::NotFound { .. })
        ));

        let product = service.buy("atlas", 2).await.unwrap();
        assert_eq!(product.stock, 1);

        match service.buy("Atlas", 2).await {
            Err(AppError::BadRequest { message }) => assert!(message.contains("available 1")),
            other => panic!("Expected BadRequest, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_get_and_delete() {
        let (service, books) = setup().await;
        let atlas = service.create(new_product("Atlas", books, 3)).await.unwrap();

        assert_eq!(service.get(atlas.product.id).await.unwrap(), atlas);
        assert!(matches!(service.get(0).await, Err(AppError::BadRequest { .. })));

        service.delete(atlas.product.id).await.unwrap();
        assert!(matches!(
            service.get(atlas.product.id).await,
            Err(AppError::NotFound { .. })
        ));
    }
}
