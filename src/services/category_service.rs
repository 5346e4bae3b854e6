//! Category rules: positive ids, unique names, 404 on unknown ids.

use std::sync::Arc;

use super::{duplicate, ensure_positive_id, required_name};
use crate::error::{AppError, AppResult};
use crate::models::{Category, NewCategory, UpdateCategory};
use crate::repositories::{CategoryOrder, CategoryRepository};

#[derive(Clone)]
pub struct CategoryService {
    repo: Arc<dyn CategoryRepository>,
}

impl CategoryService {
    pub fn new(repo: Arc<dyn CategoryRepository>) -> Self {
        Self { repo }
    }

    pub async fn list(&self, order: CategoryOrder) -> AppResult<Vec<Category>> {
        self.repo.list(order).await
    }

    /// # Errors
    /// `BadRequest` for ids `<= 0`, `NotFound` for unknown ids.
    pub async fn get(&self, id: i32) -> AppResult<Category> {
        ensure_positive_id(id)?;
        self.repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found_id("category", id))
    }

    /// Creates a category; the name is stored trimmed.
    pub async fn create(&self, name: &str) -> AppResult<Category> {
        let name = required_name("category", name)?;
        if self.repo.exists_by_name(name, None).await? {
            return Err(duplicate("category", "name", name));
        }

        self.repo
            .create(NewCategory {
                name: name.to_string(),
            })
            .await
    }

    /// Renames a category. Keeping its own current name is not a conflict.
    pub async fn update(&self, id: i32, name: &str) -> AppResult<Category> {
        ensure_positive_id(id)?;
        if !self.repo.exists_by_id(id).await? {
            return Err(AppError::not_found_id("category", id));
        }

        let name = required_name("category", name)?;
        if self.repo.exists_by_name(name, Some(id)).await? {
            return Err(duplicate("category", "name", name));
        }

        self.repo
            .update(
                id,
                UpdateCategory {
                    name: name.to_string(),
                },
            )
            .await?
            .ok_or_else(|| AppError::not_found_id("category", id))
    }

    /// # Errors
    /// `Conflict` while products still belong to the category.
    pub async fn delete(&self, id: i32) -> AppResult<()> {
        ensure_positive_id(id)?;
        if !self.repo.delete(id).await? {
            return Err(AppError::not_found_id("category", id));
        }
        tracing::info!(category_id = id, "Deleted category");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::Repositories;

    fn service() -> CategoryService {
        CategoryService::new(Repositories::in_memory().categories)
    }

    #[tokio::test]
    async fn test_get_rejects_non_positive_ids() {
        match service().get(0).await {
            Err(AppError::BadRequest { message }) => {
                assert_eq!(message, "id must be greater than zero")
            }
            other => panic!("Expected BadRequest, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_get_unknown_id() {
        let err = service().get(9).await.unwrap_err();
        assert_eq!(err.to_string(), "category not found with id 9");
    }

    #[tokio::test]
    async fn test_create_trims_and_rejects_duplicates() {
        let service = service();
        let created = service.create("  Garden ").await.unwrap();
        assert_eq!(created.name, "Garden");

        let err = service.create("garden").await.unwrap_err();
        assert!(matches!(err, AppError::Duplicate { .. }));
        assert!(err.to_string().starts_with("category already exists"));
    }

    #[tokio::test]
    async fn test_blank_names_are_rejected() {
        let service = service();
        match service.create("   ").await {
            Err(AppError::BadRequest { message }) => {
                assert_eq!(message, "category name is required")
            }
            other => panic!("Expected BadRequest, got {:?}", other),
        }

        let garden = service.create("Garden").await.unwrap();
        assert!(matches!(
            service.update(garden.id, "\t ").await,
            Err(AppError::BadRequest { .. })
        ));
    }

    #[tokio::test]
    async fn test_update_to_own_name_is_allowed() {
        let service = service();
        let garden = service.create("Garden").await.unwrap();
        service.create("Music").await.unwrap();

        let renamed = service.update(garden.id, "GARDEN").await.unwrap();
        assert_eq!(renamed.name, "GARDEN");

        assert!(matches!(
            service.update(garden.id, "music").await,
            Err(AppError::Duplicate { .. })
        ));
        assert!(matches!(
            service.update(99, "Toys").await,
            Err(AppError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_delete() {
        let service = service();
        let garden = service.create("Garden").await.unwrap();

        service.delete(garden.id).await.unwrap();
        assert!(matches!(
            service.delete(garden.id).await,
            Err(AppError::NotFound { .. })
        ));
        assert!(matches!(
            service.delete(-3).await,
            Err(AppError::BadRequest { .. })
        ));
    }
}
