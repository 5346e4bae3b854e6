//! Category request/response DTOs.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use super::{format_timestamp, trimmed};
use crate::models::Category;

/// Body of both create and update requests.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema, Validate)]
pub struct CategoryRequest {
    #[serde(deserialize_with = "trimmed")]
    #[validate(length(min = 3, max = 50, message = "Name must be between 3 and 50 characters"))]
    #[schema(example = "Books", min_length = 3, max_length = 50)]
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CategoryResponse {
    #[schema(example = 1)]
    pub id: i32,
    #[schema(example = "Books")]
    pub name: String,
    #[schema(value_type = String, format = DateTime, example = "2025-01-10T08:30:00.000Z")]
    pub created_at: String,
}

impl From<Category> for CategoryResponse {
    fn from(category: Category) -> Self {
        Self {
            created_at: format_timestamp(&category.created_at),
            id: category.id,
            name: category.name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_length_bounds() {
        let short = CategoryRequest {
            name: "ab".to_string(),
        };
        assert!(short.validate().is_err());

        let long = CategoryRequest {
            name: "x".repeat(51),
        };
        assert!(long.validate().is_err());

        let ok = CategoryRequest {
            name: "Toys".to_string(),
        };
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn test_name_is_trimmed_before_validation() {
        let padded: CategoryRequest = serde_json::from_str(r#"{"name":"  a  "}"#).unwrap();
        assert_eq!(padded.name, "a");
        assert!(padded.validate().is_err());

        let blank: CategoryRequest = serde_json::from_str(r#"{"name":"     "}"#).unwrap();
        assert!(blank.name.is_empty());
        assert!(blank.validate().is_err());
    }
}
