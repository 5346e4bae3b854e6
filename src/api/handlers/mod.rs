//! HTTP request handlers for API endpoints.
//!
//! This module contains all request handlers organized by resource type.

pub mod categories;
pub mod health;
pub mod products;
pub mod users;

use crate::repositories::CategoryOrder;

/// URL-segment API version, added to request extensions by the versioned
/// routers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiVersion {
    V1,
    V2,
}

impl ApiVersion {
    pub fn prefix(&self) -> &'static str {
        match self {
            ApiVersion::V1 => "/api/v1",
            ApiVersion::V2 => "/api/v2",
        }
    }

    /// v1 lists categories alphabetically, v2 by id.
    pub fn category_order(&self) -> CategoryOrder {
        match self {
            ApiVersion::V1 => CategoryOrder::Name,
            ApiVersion::V2 => CategoryOrder::Id,
        }
    }

    /// Absolute path of a created resource, used for `Location` headers.
    pub fn location(&self, resource: &str, id: i32) -> String {
        format!("{}/{}/{}", self.prefix(), resource, id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_includes_version_prefix() {
        assert_eq!(
            ApiVersion::V1.location("categories", 4),
            "/api/v1/categories/4"
        );
        assert_eq!(ApiVersion::V2.location("users", 9), "/api/v2/users/9");
    }

    #[test]
    fn test_category_order_per_version() {
        assert_eq!(ApiVersion::V1.category_order(), CategoryOrder::Name);
        assert_eq!(ApiVersion::V2.category_order(), CategoryOrder::Id);
    }
}
