mod common;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
};
use chrono::Utc;
use common::{
    empty_request, get, get_with_token, json_request_with_token, read_json, spawn_app, TestApp,
};
use ctstudio_api::entities::order::{self, OrderStatus};
use rust_decimal_macros::dec;
use sea_orm::{ActiveModelTrait, Set};
use serde_json::json;
use uuid::Uuid;

async fn seed_paid_order(app: &TestApp, total: rust_decimal::Decimal) -> order::Model {
    order::ActiveModel {
        id: Set(Uuid::new_v4()),
        checkout_session_id: Set(format!("cs_{}", Uuid::new_v4().simple())),
        email: Set("max@example.de".to_string()),
        name: Set(Some("Max Mustermann".to_string())),
        phone: Set(None),
        total: Set(total),
        status: Set(OrderStatus::Paid),
        user_id: Set(None),
        created_at: Set(Utc::now()),
    }
    .insert(&*app.state.db)
    .await
    .expect("seed order")
}

#[tokio::test]
async fn admin_routes_are_gated_by_role() {
    let app = spawn_app().await;
    let user_token = app.user_token("user@example.de", "USER").await;
    let admin_token = app.admin_token().await;

    let anonymous = app.send(get("/api/v1/admin/stats")).await;
    assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);

    let forbidden = app
        .send(get_with_token("/api/v1/admin/stats", &user_token))
        .await;
    assert_eq!(forbidden.status(), StatusCode::FORBIDDEN);

    let allowed = app
        .send(get_with_token("/api/v1/admin/stats", &admin_token))
        .await;
    assert_eq!(allowed.status(), StatusCode::OK);
}

#[tokio::test]
async fn admin_manages_the_product_lifecycle() {
    let app = spawn_app().await;
    let token = app.admin_token().await;

    let created = app
        .send(json_request_with_token(
            Method::POST,
            "/api/v1/admin/products",
            &json!({
                "name": "Starter Website",
                "slug": "starter",
                "description": "Entry package",
                "price": "1499",
                "image_url": "/uploads/starter.png",
                "features": ["Responsive", "SEO"],
                "popular": false
            }),
            &token,
        ))
        .await;
    assert_eq!(created.status(), StatusCode::CREATED);
    let product = read_json(created).await;
    let id = product["id"].as_str().unwrap().to_string();

    // Duplicate slug is refused.
    let duplicate = app
        .send(json_request_with_token(
            Method::POST,
            "/api/v1/admin/products",
            &json!({
                "name": "Other",
                "slug": "starter",
                "description": "x",
                "price": "10",
                "image_url": "/uploads/o.png"
            }),
            &token,
        ))
        .await;
    assert_eq!(duplicate.status(), StatusCode::BAD_REQUEST);

    let updated = app
        .send(json_request_with_token(
            Method::PUT,
            &format!("/api/v1/admin/products/{}", id),
            &json!({
                "name": "Starter Website",
                "slug": "starter",
                "description": "Entry package",
                "price": "1799",
                "image_url": "/uploads/starter.png",
                "features": ["Responsive", "SEO"],
                "popular": true
            }),
            &token,
        ))
        .await;
    assert_eq!(updated.status(), StatusCode::OK);
    let updated = read_json(updated).await;
    assert_eq!(updated["price"], "1799");
    assert_eq!(updated["popular"], true);

    let deleted = app
        .send(empty_request(
            Method::DELETE,
            &format!("/api/v1/admin/products/{}", id),
            &token,
        ))
        .await;
    assert_eq!(deleted.status(), StatusCode::NO_CONTENT);

    let public = app.send(get("/api/v1/products")).await;
    assert_eq!(read_json(public).await, json!([]));
}

#[tokio::test]
async fn admin_cannot_delete_their_own_account() {
    let app = spawn_app().await;
    let token = app.admin_token().await;

    let me = app.send(get_with_token("/api/v1/auth/me", &token)).await;
    let admin_id = read_json(me).await["user_id"].as_str().unwrap().to_string();

    let response = app
        .send(empty_request(
            Method::DELETE,
            &format!("/api/v1/admin/users/{}", admin_id),
            &token,
        ))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn admin_manages_other_accounts() {
    let app = spawn_app().await;
    let token = app.admin_token().await;

    let created = app
        .send(json_request_with_token(
            Method::POST,
            "/api/v1/admin/users",
            &json!({
                "email": "worker@example.de",
                "password": "secret-pw",
                "name": "Worker",
                "role": "MODERATOR"
            }),
            &token,
        ))
        .await;
    assert_eq!(created.status(), StatusCode::CREATED);
    let user = read_json(created).await;
    assert_eq!(user["role"], "MODERATOR");
    let user_id = user["id"].as_str().unwrap().to_string();

    let listed = app
        .send(get_with_token("/api/v1/admin/users", &token))
        .await;
    assert_eq!(read_json(listed).await.as_array().unwrap().len(), 2);

    let renamed = app
        .send(json_request_with_token(
            Method::PUT,
            &format!("/api/v1/admin/users/{}", user_id),
            &json!({ "name": "Renamed Worker" }),
            &token,
        ))
        .await;
    assert_eq!(renamed.status(), StatusCode::OK);
    assert_eq!(read_json(renamed).await["name"], "Renamed Worker");

    let deleted = app
        .send(empty_request(
            Method::DELETE,
            &format!("/api/v1/admin/users/{}", user_id),
            &token,
        ))
        .await;
    assert_eq!(deleted.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn admin_updates_order_status() {
    let app = spawn_app().await;
    let token = app.admin_token().await;
    let seeded = seed_paid_order(&app, dec!(1499)).await;

    let updated = app
        .send(json_request_with_token(
            Method::PUT,
            &format!("/api/v1/admin/orders/{}", seeded.id),
            &json!({ "status": "PROCESSING" }),
            &token,
        ))
        .await;
    assert_eq!(updated.status(), StatusCode::OK);
    assert_eq!(read_json(updated).await["status"], "PROCESSING");

    let bogus = app
        .send(json_request_with_token(
            Method::PUT,
            &format!("/api/v1/admin/orders/{}", seeded.id),
            &json!({ "status": "TELEPORTED" }),
            &token,
        ))
        .await;
    assert_eq!(bogus.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn stats_aggregate_catalog_users_and_revenue() {
    let app = spawn_app().await;
    let token = app.admin_token().await;
    app.seed_product("Starter Website", "starter", dec!(1499), false)
        .await;
    seed_paid_order(&app, dec!(1499)).await;
    seed_paid_order(&app, dec!(2999)).await;

    let response = app
        .send(get_with_token("/api/v1/admin/stats", &token))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let stats = read_json(response).await;
    assert_eq!(stats["total_products"], 1);
    assert_eq!(stats["total_users"], 1);
    assert_eq!(stats["total_orders"], 2);
    assert_eq!(stats["total_revenue"], "4498");
    assert_eq!(stats["recent_orders"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn upload_stores_a_sanitized_timestamped_file() {
    let app = spawn_app().await;
    let token = app.admin_token().await;

    let boundary = "test-boundary-7MA4YWxkTrZu0gW";
    let body = format!(
        "--{b}\r\n\
         Content-Disposition: form-data; name=\"file\"; filename=\"mein logo.png\"\r\n\
         Content-Type: image/png\r\n\r\n\
         fake-png-bytes\r\n\
         --{b}--\r\n",
        b = boundary
    );
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/v1/admin/upload")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", boundary),
        )
        .body(Body::from(body))
        .unwrap();

    let response = app.send(request).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let url = read_json(response).await["url"].as_str().unwrap().to_string();
    assert!(url.starts_with("/uploads/"));
    assert!(url.ends_with("-mein_logo.png"));

    let stored = std::path::Path::new(&app.state.config.upload_dir)
        .join(url.trim_start_matches("/uploads/"));
    assert_eq!(std::fs::read(stored).unwrap(), b"fake-png-bytes");
}
