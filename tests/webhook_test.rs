mod common;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
};
use chrono::Utc;
use common::{read_json, session_event, spawn_app, webhook_request, TestApp, WEBHOOK_SECRET};
use ctstudio_api::entities::order::{self, OrderStatus};
use ctstudio_api::payments::sign_payload;
use rust_decimal_macros::dec;
use sea_orm::{ActiveModelTrait, EntityTrait, Set};
use uuid::Uuid;

async fn seed_order(app: &TestApp, session_id: &str) -> order::Model {
    order::ActiveModel {
        id: Set(Uuid::new_v4()),
        checkout_session_id: Set(session_id.to_string()),
        email: Set("max@example.de".to_string()),
        name: Set(Some("Max Mustermann".to_string())),
        phone: Set(Some("+49 170 1234567".to_string())),
        total: Set(dec!(1499)),
        status: Set(OrderStatus::Pending),
        user_id: Set(None),
        created_at: Set(Utc::now()),
    }
    .insert(&*app.state.db)
    .await
    .expect("seed order")
}

async fn order_status(app: &TestApp, id: Uuid) -> OrderStatus {
    order::Entity::find_by_id(id)
        .one(&*app.state.db)
        .await
        .expect("query")
        .expect("order exists")
        .status
}

#[tokio::test]
async fn completed_session_marks_order_paid() {
    let app = spawn_app().await;
    let seeded = seed_order(&app, "cs_test_123").await;

    let response = app
        .send(webhook_request(&session_event(
            "checkout.session.completed",
            "cs_test_123",
        )))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(read_json(response).await["received"], true);
    assert_eq!(order_status(&app, seeded.id).await, OrderStatus::Paid);
}

#[tokio::test]
async fn webhook_delivery_is_idempotent() {
    let app = spawn_app().await;
    let seeded = seed_order(&app, "cs_test_123").await;
    let event = session_event("checkout.session.completed", "cs_test_123");

    for _ in 0..2 {
        let response = app.send(webhook_request(&event)).await;
        assert_eq!(response.status(), StatusCode::OK);
    }
    assert_eq!(order_status(&app, seeded.id).await, OrderStatus::Paid);
}

#[tokio::test]
async fn completed_session_without_order_is_404() {
    let app = spawn_app().await;

    let response = app
        .send(webhook_request(&session_event(
            "checkout.session.completed",
            "cs_unknown",
        )))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn expired_session_cancels_order() {
    let app = spawn_app().await;
    let seeded = seed_order(&app, "cs_test_123").await;

    let response = app
        .send(webhook_request(&session_event(
            "checkout.session.expired",
            "cs_test_123",
        )))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(order_status(&app, seeded.id).await, OrderStatus::Cancelled);
}

#[tokio::test]
async fn expired_session_without_order_is_still_accepted() {
    let app = spawn_app().await;

    let response = app
        .send(webhook_request(&session_event(
            "checkout.session.expired",
            "cs_unknown",
        )))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn unhandled_event_types_are_acknowledged() {
    let app = spawn_app().await;

    let response = app
        .send(webhook_request(&session_event(
            "invoice.paid",
            "in_test_1",
        )))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn unhandled_events_without_a_session_id_are_acknowledged() {
    let app = spawn_app().await;

    // Only checkout session events carry an object id; anything else
    // must still be acknowledged so Stripe stops retrying it.
    let event = serde_json::json!({
        "id": "evt_balance_1",
        "type": "balance.available",
        "data": { "object": { "available": [] } }
    });
    let response = app.send(webhook_request(&event)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(read_json(response).await["received"], true);
}

#[tokio::test]
async fn missing_signature_is_rejected() {
    let app = spawn_app().await;
    let seeded = seed_order(&app, "cs_test_123").await;

    let payload = session_event("checkout.session.completed", "cs_test_123").to_string();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/v1/webhooks/stripe")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(payload))
        .unwrap();

    let response = app.send(request).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(order_status(&app, seeded.id).await, OrderStatus::Pending);
}

#[tokio::test]
async fn tampered_payload_is_rejected() {
    let app = spawn_app().await;
    let seeded = seed_order(&app, "cs_test_123").await;

    let signed = session_event("checkout.session.completed", "cs_test_123").to_string();
    let signature = sign_payload(signed.as_bytes(), WEBHOOK_SECRET, Utc::now().timestamp());
    // Body differs from what was signed.
    let tampered = session_event("checkout.session.completed", "cs_test_456").to_string();

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/v1/webhooks/stripe")
        .header(header::CONTENT_TYPE, "application/json")
        .header("Stripe-Signature", signature)
        .body(Body::from(tampered))
        .unwrap();

    let response = app.send(request).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(order_status(&app, seeded.id).await, OrderStatus::Pending);
}

#[tokio::test]
async fn stale_signature_is_rejected() {
    let app = spawn_app().await;
    let seeded = seed_order(&app, "cs_test_123").await;

    let payload = session_event("checkout.session.completed", "cs_test_123").to_string();
    let old_ts = Utc::now().timestamp() - 3600;
    let signature = sign_payload(payload.as_bytes(), WEBHOOK_SECRET, old_ts);

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/v1/webhooks/stripe")
        .header(header::CONTENT_TYPE, "application/json")
        .header("Stripe-Signature", signature)
        .body(Body::from(payload))
        .unwrap();

    let response = app.send(request).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(order_status(&app, seeded.id).await, OrderStatus::Pending);
}
