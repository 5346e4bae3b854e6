use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

pub const CATEGORY_TAG: &str = "Categories";
pub const PRODUCT_TAG: &str = "Products";
pub const USER_TAG: &str = "Users";
pub const HEALTH_TAG: &str = "Health";

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Storefront",
        description = "Catalogue, inventory and account API for the storefront",
    ),
    modifiers(&SecurityAddon),
    components(
        schemas(
            crate::api::dto::ErrorResponse,
            crate::api::dto::PaginationMeta,
            crate::error::ValidationFieldError,
            crate::models::Role,
        )
    ),
    tags(
        (name = CATEGORY_TAG, description = "Product category endpoints"),
        (name = PRODUCT_TAG, description = "Product catalogue and purchase endpoints"),
        (name = USER_TAG, description = "Registration, login and user management endpoints"),
        (name = HEALTH_TAG, description = "Health check endpoints"),
    )
)]
pub struct ApiDoc;

pub struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearerAuth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("JWT Bearer Token Authentication"))
                        .build(),
                ),
            )
        }
    }
}
