#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Method, Request},
    response::Response,
    Router,
};
use ctstudio_api::{
    auth::AuthService,
    config::AppConfig,
    db,
    entities::product,
    events::EventSender,
    handlers::AppServices,
    payments::StripeClient,
    services::products::ProductInput,
    AppState,
};
use rust_decimal::Decimal;
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::TempDir;

pub const WEBHOOK_SECRET: &str = "whsec_test_secret";
pub const USER_PASSWORD: &str = "correct-horse-battery";

/// In-process application wired against an in-memory database. Holds the
/// upload dir so it outlives the test.
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    _upload_dir: TempDir,
}

/// Build an app without a payment backend. Checkout returns 500, all
/// other surfaces work.
pub async fn spawn_app() -> TestApp {
    spawn_app_with_stripe(None).await
}

/// Build an app whose Stripe calls go to `stripe_base` (a wiremock URI).
pub async fn spawn_app_with_stripe(stripe_base: Option<String>) -> TestApp {
    let upload_dir = TempDir::new().expect("tempdir");

    let mut config = AppConfig::new(
        "sqlite::memory:".to_string(),
        "integration_test_secret_0123456789abcdef".to_string(),
        "test".to_string(),
    );
    // A single pooled connection keeps every query on the same in-memory
    // database.
    config.db_max_connections = 1;
    config.db_min_connections = 1;
    config.stripe_webhook_secret = Some(WEBHOOK_SECRET.to_string());
    config.upload_dir = upload_dir.path().to_string_lossy().into_owned();
    if stripe_base.is_some() {
        config.stripe_secret_key = Some("sk_test_key".to_string());
    }

    let db = Arc::new(db::establish_connection(&config).await.expect("connect"));
    db::run_migrations(&db).await.expect("migrate");

    let (event_sender, mut event_receiver) = EventSender::channel(64);
    tokio::spawn(async move { while event_receiver.recv().await.is_some() {} });

    let stripe = stripe_base.map(|base| {
        Arc::new(StripeClient::new(
            config.stripe_secret_key.clone().unwrap(),
            base,
        ))
    });

    let auth = Arc::new(AuthService::new(&config));
    let services = AppServices::new(
        db.clone(),
        event_sender.clone(),
        stripe,
        None,
        config.clone(),
    );

    let state = AppState {
        db,
        config,
        auth,
        services,
        event_sender,
    };

    TestApp {
        router: ctstudio_api::app_router(state.clone()),
        state,
        _upload_dir: upload_dir,
    }
}

impl TestApp {
    pub async fn send(&self, request: Request<Body>) -> Response {
        use tower::ServiceExt;
        self.router.clone().oneshot(request).await.expect("request")
    }

    /// Seed a catalog row directly through the service layer.
    pub async fn seed_product(
        &self,
        name: &str,
        slug: &str,
        price: Decimal,
        popular: bool,
    ) -> product::Model {
        self.state
            .services
            .products
            .create(ProductInput {
                name: name.to_string(),
                slug: slug.to_string(),
                description: format!("{} description", name),
                price,
                image_url: format!("/uploads/{}.png", slug),
                features: vec!["Responsive".to_string(), "SEO".to_string()],
                popular,
            })
            .await
            .expect("seed product")
    }

    /// Create an account with the given role and return a bearer token
    /// for it.
    pub async fn user_token(&self, email: &str, role: &str) -> String {
        self.state
            .services
            .users
            .create(ctstudio_api::services::users::CreateUserInput {
                email: email.to_string(),
                password: USER_PASSWORD.to_string(),
                name: "Test User".to_string(),
                role: Some(role.to_string()),
            })
            .await
            .expect("create user");

        let user = self
            .state
            .services
            .users
            .authenticate(email, USER_PASSWORD)
            .await
            .expect("authenticate");
        self.state
            .auth
            .issue_token(&user)
            .expect("issue token")
            .access_token
    }

    pub async fn admin_token(&self) -> String {
        self.user_token("admin@ct-studio.store", "ADMIN").await
    }
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .expect("request")
}

pub fn get_with_token(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method(Method::GET)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .expect("request")
}

pub fn json_request(method: Method, uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

pub fn json_request_with_token(
    method: Method,
    uri: &str,
    body: &Value,
    token: &str,
) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::from(body.to_string()))
        .expect("request")
}

pub fn empty_request(method: Method, uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .expect("request")
}

pub async fn read_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    serde_json::from_slice(&bytes).expect("json body")
}

/// A signed Stripe webhook request for the given event payload.
pub fn webhook_request(event: &Value) -> Request<Body> {
    let payload = event.to_string();
    let signature = ctstudio_api::payments::sign_payload(
        payload.as_bytes(),
        WEBHOOK_SECRET,
        chrono::Utc::now().timestamp(),
    );
    Request::builder()
        .method(Method::POST)
        .uri("/api/v1/webhooks/stripe")
        .header(header::CONTENT_TYPE, "application/json")
        .header("Stripe-Signature", signature)
        .body(Body::from(payload))
        .expect("request")
}

pub fn session_event(event_type: &str, session_id: &str) -> Value {
    json!({
        "id": format!("evt_{}", uuid::Uuid::new_v4().simple()),
        "type": event_type,
        "data": { "object": { "id": session_id } }
    })
}
