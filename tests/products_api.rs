mod common;

use axum::http::{Method, StatusCode};
use serde_json::json;

use common::*;

#[tokio::test]
async fn create_rounds_price_and_reports_category() {
    let app = app();
    let token = admin_token(&app).await;
    let category_id = create_category(&app, &token, "Electronics").await;

    let created = send(
        &app,
        Method::POST,
        "/api/v2/products",
        Some(&token),
        Some(product_body("Laptop", "999.994", 3, category_id)),
    )
    .await;
    assert_eq!(created.status, StatusCode::CREATED, "{}", created.body);
    let id = created.body["id"].as_i64().unwrap();
    assert_eq!(
        created.header("location"),
        Some(format!("/api/v2/products/{}", id).as_str())
    );
    assert_eq!(created.body["price"], "999.99");
    assert_eq!(created.body["category_name"], "Electronics");
    assert!(created.body["updated_at"].is_null());

    let found = get(&app, &format!("/api/v1/products/{}", id)).await;
    assert_eq!(found.status, StatusCode::OK);
    assert_eq!(found.body["sku"], "SKU-LAPTOP");
}

#[tokio::test]
async fn create_validates_request_and_category() {
    let app = app();
    let token = admin_token(&app).await;
    let category_id = create_category(&app, &token, "Kitchen").await;

    let negative = send(
        &app,
        Method::POST,
        "/api/v1/products",
        Some(&token),
        Some(product_body("Pan", "-1.00", -2, category_id)),
    )
    .await;
    assert_eq!(negative.status, StatusCode::BAD_REQUEST);
    let fields: Vec<&str> = negative.body["details"]["errors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["price", "stock"]);

    let orphan = send(
        &app,
        Method::POST,
        "/api/v1/products",
        Some(&token),
        Some(product_body("Pan", "20.00", 1, 999)),
    )
    .await;
    assert_eq!(orphan.status, StatusCode::NOT_FOUND);

    create_product(&app, &token, "Pan", 1, category_id).await;
    let duplicate = send(
        &app,
        Method::POST,
        "/api/v1/products",
        Some(&token),
        Some(product_body("PAN", "20.00", 1, category_id)),
    )
    .await;
    assert_eq!(duplicate.status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn listing_is_paged_only_on_request() {
    let app = app();
    let token = admin_token(&app).await;
    let category_id = create_category(&app, &token, "Office").await;
    for name in ["Stapler", "Desk", "Pencil"] {
        create_product(&app, &token, name, 1, category_id).await;
    }

    let all = get(&app, "/api/v1/products").await;
    let names: Vec<&str> = all.body.as_array().unwrap().iter().map(|p| p["name"].as_str().unwrap()).collect();
    assert_eq!(names, vec!["Desk", "Pencil", "Stapler"]);

    let page = get(&app, "/api/v1/products?page=1&page_size=2").await;
    assert_eq!(page.status, StatusCode::OK);
    assert_eq!(page.body["data"].as_array().unwrap().len(), 2);
    assert_eq!(page.body["data"][0]["name"], "Stapler");
    assert_eq!(page.body["pagination"]["total_items"], 3);
    assert_eq!(page.body["pagination"]["total_pages"], 2);
    assert_eq!(page.body["pagination"]["has_next"], true);

    let last = get(&app, "/api/v1/products?page=2&page_size=2").await;
    assert_eq!(last.body["data"].as_array().unwrap().len(), 1);
    assert_eq!(last.body["pagination"]["has_prev"], true);

    let too_big = get(&app, "/api/v1/products?page_size=500").await;
    assert_eq!(too_big.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn search_and_filter_by_category() {
    let app = app();
    let token = admin_token(&app).await;
    let tools = create_category(&app, &token, "Tools").await;
    let toys = create_category(&app, &token, "Toys").await;
    create_product(&app, &token, "Hammer", 1, tools).await;
    create_product(&app, &token, "Wrench", 1, tools).await;
    create_product(&app, &token, "Yoyo", 1, toys).await;

    let found = get(&app, "/api/v1/products/search?term=hAmM").await;
    assert_eq!(found.status, StatusCode::OK);
    assert_eq!(found.body.as_array().unwrap().len(), 1);
    assert_eq!(found.body[0]["name"], "Hammer");

    let by_category = get(&app, &format!("/api/v1/products/category/{}", tools)).await;
    assert_eq!(by_category.body.as_array().unwrap().len(), 2);

    let empty = get(&app, "/api/v1/products/category/999").await;
    assert_eq!(empty.status, StatusCode::OK);
    assert!(empty.body.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn buying_decrements_stock() {
    let app = app();
    let token = admin_token(&app).await;
    let category_id = create_category(&app, &token, "Electronics").await;
    let id = create_product(&app, &token, "Laptop", 5, category_id).await;
    let customer = login_as(&app, "dave", None).await;

    let anonymous = send(&app, Method::PATCH, "/api/v1/products/buy/Laptop/1", None, None).await;
    assert_eq!(anonymous.status, StatusCode::UNAUTHORIZED);

    let bought = send(&app, Method::PATCH, "/api/v1/products/buy/LAPTOP/2", Some(&customer), None).await;
    assert_eq!(bought.status, StatusCode::OK, "{}", bought.body);
    assert_eq!(bought.body["product_id"], id);
    assert_eq!(bought.body["quantity"], 2);
    assert_eq!(bought.body["remaining_stock"], 3);

    let product = get(&app, &format!("/api/v1/products/{}", id)).await;
    assert_eq!(product.body["stock"], 3);
    assert!(product.body["updated_at"].is_string());

    let too_many = send(&app, Method::PATCH, "/api/v1/products/buy/Laptop/4", Some(&customer), None).await;
    assert_eq!(too_many.status, StatusCode::BAD_REQUEST);
    assert!(too_many.body["message"].as_str().unwrap().contains("available 3"));

    let zero = send(&app, Method::PATCH, "/api/v1/products/buy/Laptop/0", Some(&customer), None).await;
    assert_eq!(zero.status, StatusCode::BAD_REQUEST);

    let unknown = send(&app, Method::PATCH, "/api/v1/products/buy/Phone/1", Some(&customer), None).await;
    assert_eq!(unknown.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn update_and_delete_require_admin() {
    let app = app();
    let token = admin_token(&app).await;
    let category_id = create_category(&app, &token, "Sports").await;
    let id = create_product(&app, &token, "Ball", 10, category_id).await;
    let uri = format!("/api/v1/products/{}", id);
    let customer = login_as(&app, "erin", None).await;

    let forbidden = send(&app, Method::DELETE, &uri, Some(&customer), None).await;
    assert_eq!(forbidden.status, StatusCode::FORBIDDEN);

    let mut body = product_body("Football", "25.50", 7, category_id);
    body["image_url"] = json!("https://cdn.example.com/football.png");
    let updated = send(&app, Method::PUT, &uri, Some(&token), Some(body)).await;
    assert_eq!(updated.status, StatusCode::NO_CONTENT);

    let product = get(&app, &uri).await;
    assert_eq!(product.body["name"], "Football");
    assert_eq!(product.body["price"], "25.50");
    assert_eq!(product.body["image_url"], "https://cdn.example.com/football.png");

    let missing = send(
        &app,
        Method::PUT,
        "/api/v1/products/999",
        Some(&token),
        Some(product_body("Ghost", "1.00", 1, category_id)),
    )
    .await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);

    let deleted = send(&app, Method::DELETE, &uri, Some(&token), None).await;
    assert_eq!(deleted.status, StatusCode::NO_CONTENT);
    assert_eq!(get(&app, &uri).await.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn blank_product_names_are_rejected() {
    let app = app();
    let token = admin_token(&app).await;
    let category = create_category(&app, &token, "Books").await;

    let response = send(
        &app,
        Method::POST,
        "/api/v1/products",
        Some(&token),
        Some(product_body(" ", "1.00", 1, category)),
    )
    .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["code"], "VALIDATION_ERROR");

    let listed = get(&app, "/api/v1/products").await;
    assert!(listed.body.as_array().unwrap().is_empty());
}
