use bigdecimal::BigDecimal;
use diesel::prelude::*;
use jiff_diesel::DateTime;
use serde::Deserialize;

#[derive(Debug, Queryable, Selectable, Identifiable, Clone, PartialEq)]
#[diesel(table_name = crate::schema::products)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Product {
    pub id: i32,
    pub name: String,
    pub description: String,
    pub price: BigDecimal,
    pub image_url: Option<String>,
    pub sku: String,
    pub stock: i32,
    pub category_id: i32,
    pub created_at: DateTime,
    pub updated_at: Option<DateTime>,
}

/// A product together with the name of its category, the shape every
/// product response is built from.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductWithCategory {
    pub product: Product,
    pub category_name: String,
}

impl From<(Product, String)> for ProductWithCategory {
    fn from((product, category_name): (Product, String)) -> Self {
        Self {
            product,
            category_name,
        }
    }
}

#[derive(Debug, Insertable, Deserialize, Clone)]
#[diesel(table_name = crate::schema::products)]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub price: BigDecimal,
    pub image_url: Option<String>,
    pub sku: String,
    pub stock: i32,
    pub category_id: i32,
}

/// Full replacement of a product's editable fields; a `None` image clears it.
#[derive(Debug, AsChangeset, Deserialize, Clone)]
#[diesel(table_name = crate::schema::products)]
#[diesel(treat_none_as_null = true)]
pub struct UpdateProduct {
    pub name: String,
    pub description: String,
    pub price: BigDecimal,
    pub image_url: Option<String>,
    pub sku: String,
    pub stock: i32,
    pub category_id: i32,
}

/// Result of a purchase attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum PurchaseOutcome {
    /// Stock was decremented; carries the updated product
    Purchased(Product),
    NotFound,
    InsufficientStock { available: i32 },
}
