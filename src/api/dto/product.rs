//! Product request/response DTOs.

use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::{Validate, ValidationError};

use super::{format_timestamp, trimmed};
use crate::models::{NewProduct, Product, ProductWithCategory, UpdateProduct};

fn validate_price(price: &BigDecimal) -> Result<(), ValidationError> {
    if *price < BigDecimal::from(0) {
        return Err(ValidationError::new("range").with_message("Price cannot be negative".into()));
    }
    Ok(())
}

/// Body of both create (POST) and full update (PUT) requests.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema, Validate)]
pub struct ProductRequest {
    #[serde(deserialize_with = "trimmed")]
    #[validate(length(min = 1, max = 100, message = "Name must be between 1 and 100 characters"))]
    #[schema(example = "Trail Running Shoes")]
    pub name: String,

    #[serde(default)]
    #[schema(example = "Lightweight shoes with a grippy sole")]
    pub description: String,

    /// Rounded to two decimal places
    #[validate(custom(function = "validate_price"))]
    #[schema(value_type = String, example = "89.90")]
    pub price: BigDecimal,

    #[validate(
        url(message = "Image URL must be a valid URL"),
        length(max = 500, message = "Image URL cannot exceed 500 characters")
    )]
    pub image_url: Option<String>,

    #[serde(deserialize_with = "trimmed")]
    #[validate(length(min = 1, max = 64, message = "SKU must be between 1 and 64 characters"))]
    #[schema(example = "SHOE-TR-42")]
    pub sku: String,

    #[validate(range(min = 0, message = "Stock cannot be negative"))]
    #[schema(example = 25, minimum = 0)]
    pub stock: i32,

    #[validate(range(min = 1, message = "Category id must be greater than zero"))]
    #[schema(example = 1)]
    pub category_id: i32,
}

impl ProductRequest {
    pub fn into_new_product(self) -> NewProduct {
        NewProduct {
            name: self.name,
            description: self.description,
            price: self.price.round(2),
            image_url: self.image_url,
            sku: self.sku,
            stock: self.stock,
            category_id: self.category_id,
        }
    }

    pub fn into_update_product(self) -> UpdateProduct {
        UpdateProduct {
            name: self.name,
            description: self.description,
            price: self.price.round(2),
            image_url: self.image_url,
            sku: self.sku,
            stock: self.stock,
            category_id: self.category_id,
        }
    }
}

/// Query of `GET /products/search`.
#[derive(Debug, Clone, Default, Deserialize, IntoParams, Validate)]
#[into_params(parameter_in = Query)]
pub struct SearchParams {
    /// Case-insensitive substring of the name or description
    #[serde(default)]
    #[validate(length(max = 100, message = "Search term cannot exceed 100 characters"))]
    pub term: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProductResponse {
    pub id: i32,
    pub name: String,
    pub description: String,
    #[schema(value_type = String, example = "89.90")]
    pub price: BigDecimal,
    pub image_url: Option<String>,
    pub sku: String,
    pub stock: i32,
    pub category_id: i32,
    #[schema(example = "Shoes")]
    pub category_name: String,
    #[schema(value_type = String, format = DateTime)]
    pub created_at: String,
    #[schema(value_type = Option<String>, format = DateTime)]
    pub updated_at: Option<String>,
}

impl From<ProductWithCategory> for ProductResponse {
    fn from(item: ProductWithCategory) -> Self {
        let product = item.product;
        Self {
            created_at: format_timestamp(&product.created_at),
            updated_at: product.updated_at.as_ref().map(format_timestamp),
            id: product.id,
            name: product.name,
            description: product.description,
            price: product.price,
            image_url: product.image_url,
            sku: product.sku,
            stock: product.stock,
            category_id: product.category_id,
            category_name: item.category_name,
        }
    }
}

/// Result of a successful purchase.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PurchaseResponse {
    #[schema(example = "product purchased successfully")]
    pub message: String,
    pub product_id: i32,
    pub name: String,
    pub quantity: i32,
    pub remaining_stock: i32,
}

impl PurchaseResponse {
    pub fn new(product: Product, quantity: i32) -> Self {
        Self {
            message: "product purchased successfully".to_string(),
            product_id: product.id,
            name: product.name,
            quantity,
            remaining_stock: product.stock,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn request() -> ProductRequest {
        ProductRequest {
            name: "Atlas".to_string(),
            description: String::new(),
            price: BigDecimal::from_str("12.346").unwrap(),
            image_url: Some("https://cdn.example.com/atlas.png".to_string()),
            sku: "BK-1".to_string(),
            stock: 0,
            category_id: 1,
        }
    }

    #[test]
    fn test_valid_request() {
        assert!(request().validate().is_ok());
    }

    #[test]
    fn test_field_rules() {
        let mut negative_price = request();
        negative_price.price = BigDecimal::from(-1);
        assert!(negative_price.validate().is_err());

        let mut negative_stock = request();
        negative_stock.stock = -5;
        assert!(negative_stock.validate().is_err());

        let mut empty_name = request();
        empty_name.name.clear();
        assert!(empty_name.validate().is_err());

        let mut bad_url = request();
        bad_url.image_url = Some("not a url".to_string());
        assert!(bad_url.validate().is_err());
    }

    #[test]
    fn test_price_is_rounded_to_cents() {
        let product = request().into_new_product();
        assert_eq!(product.price, BigDecimal::from_str("12.35").unwrap());
    }

    #[test]
    fn test_price_accepts_numbers_and_strings() {
        let from_number: ProductRequest = serde_json::from_str(
            r#"{"name":"A","price":10,"sku":"S","stock":1,"category_id":1}"#,
        )
        .unwrap();
        assert_eq!(from_number.price, BigDecimal::from(10));
        assert_eq!(from_number.image_url, None);

        let from_string: ProductRequest = serde_json::from_str(
            r#"{"name":"A","price":"10.50","sku":"S","stock":1,"category_id":1}"#,
        )
        .unwrap();
        assert_eq!(from_string.price, BigDecimal::from_str("10.50").unwrap());
    }
}
