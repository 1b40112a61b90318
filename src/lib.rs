//! CT Studio backend: public catalog, Stripe Checkout, webhook-driven
//! order reconciliation, accounts, and the admin back-office.

pub mod auth;
pub mod cart;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod mailer;
pub mod migrator;
pub mod openapi;
pub mod payments;
pub mod services;

use crate::{
    auth::{auth_middleware, require_admin, AuthService},
    config::AppConfig,
    events::EventSender,
    handlers::AppServices,
};
use axum::{middleware, response::IntoResponse, routing::get, Json, Router};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower_http::{services::ServeDir, trace::TraceLayer};
use utoipa::OpenApi;

/// Shared application state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: AppConfig,
    pub auth: Arc<AuthService>,
    pub services: AppServices,
    pub event_sender: EventSender,
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn openapi_spec() -> impl IntoResponse {
    Json(openapi::ApiDoc::openapi())
}

/// Assemble the full application router.
///
/// Route groups and their guards:
/// - public: catalog, checkout, webhooks, register/login, contact
/// - bearer token required: `/auth/me`, `/orders`
/// - bearer token + admin role: everything under `/admin`
pub fn app_router(state: AppState) -> Router {
    let authenticated = Router::new()
        .nest("/auth", handlers::auth::session_routes())
        .nest("/orders", handlers::orders::order_routes())
        .layer(middleware::from_fn_with_state(
            state.auth.clone(),
            auth_middleware,
        ));

    let admin = handlers::admin::admin_routes()
        .layer(middleware::from_fn(require_admin))
        .layer(middleware::from_fn_with_state(
            state.auth.clone(),
            auth_middleware,
        ));

    let api = Router::new()
        .nest("/products", handlers::products::product_routes())
        .nest("/checkout", handlers::checkout::checkout_routes())
        .nest("/webhooks", handlers::webhooks::webhook_routes())
        .nest("/auth", handlers::auth::auth_routes())
        .nest("/contact", handlers::contact::contact_routes())
        .merge(authenticated)
        .nest("/admin", admin);

    Router::new()
        .route("/health", get(health))
        .route("/api-docs/openapi.json", get(openapi_spec))
        .nest("/api/v1", api)
        .nest_service("/uploads", ServeDir::new(&state.config.upload_dir))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
