//! Service layer for business logic operations.
//!
//! Services encapsulate business rules and coordinate between
//! repositories and handlers.

mod category_service;
mod product_service;
mod user_service;

pub use category_service::CategoryService;
pub use product_service::ProductService;
pub use user_service::{LoginOutcome, RegisterUser, UserService};

use crate::error::{AppError, AppResult};
use crate::repositories::Repositories;

/// Aggregates all services for convenient access.
///
/// Used as part of the Axum application state; cloning only bumps `Arc` counts.
#[derive(Clone)]
pub struct Services {
    pub categories: CategoryService,
    pub products: ProductService,
    pub users: UserService,
}

impl Services {
    pub fn new(repos: Repositories) -> Self {
        Self {
            categories: CategoryService::new(repos.categories.clone()),
            products: ProductService::new(repos.products, repos.categories),
            users: UserService::new(repos.users),
        }
    }
}

/// Rejects non-positive ids before they reach a repository.
pub(crate) fn ensure_positive_id(id: i32) -> AppResult<()> {
    if id <= 0 {
        return Err(AppError::bad_request("id must be greater than zero"));
    }
    Ok(())
}

/// Trims a name and rejects it when nothing is left.
pub(crate) fn required_name<'a>(entity: &str, name: &'a str) -> AppResult<&'a str> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::bad_request(format!("{} name is required", entity)));
    }
    Ok(name)
}

pub(crate) fn duplicate(entity: &str, field: &str, value: &str) -> AppError {
    AppError::Duplicate {
        entity: entity.to_string(),
        field: field.to_string(),
        value: value.trim().to_string(),
    }
}
