use crate::{errors::ServiceError, handlers::AppState, payments::verify_webhook_signature};
use axum::{
    extract::State,
    http::HeaderMap,
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use bytes::Bytes;
use serde_json::{json, Value};
use tracing::{info, warn};

/// Stripe event delivery. Signature is verified against the raw body
/// before anything is parsed; orders are reconciled from the session id
/// carried in the event payload.
#[utoipa::path(
    post,
    path = "/api/v1/webhooks/stripe",
    request_body = String,
    responses(
        (status = 200, description = "Event accepted"),
        (status = 400, description = "Missing or invalid signature", body = crate::errors::ErrorResponse),
        (status = 404, description = "No order for this session", body = crate::errors::ErrorResponse)
    ),
    tag = "webhooks"
)]
pub async fn stripe_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, ServiceError> {
    let secret = state
        .config
        .stripe_webhook_secret
        .as_deref()
        .ok_or_else(|| {
            warn!("webhook received but no signing secret is configured");
            ServiceError::ValidationError("webhook signing secret not configured".to_string())
        })?;

    let signature = headers
        .get("Stripe-Signature")
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| ServiceError::ValidationError("missing signature header".to_string()))?;

    if !verify_webhook_signature(
        signature,
        &body,
        secret,
        state.config.webhook_tolerance_secs,
    ) {
        warn!("webhook signature verification failed");
        return Err(ServiceError::ValidationError(
            "invalid webhook signature".to_string(),
        ));
    }

    let event: Value = serde_json::from_slice(&body)
        .map_err(|e| ServiceError::ValidationError(format!("invalid webhook payload: {}", e)))?;

    let event_type = event.get("type").and_then(|v| v.as_str()).unwrap_or("");

    match event_type {
        "checkout.session.completed" => {
            let session_id = session_id(&event)?;
            state
                .services
                .reconciliation
                .session_completed(session_id)
                .await?;
        }
        "checkout.session.expired" => {
            let session_id = session_id(&event)?;
            state
                .services
                .reconciliation
                .session_expired(session_id)
                .await;
        }
        other => {
            info!(event_type = other, "unhandled webhook event type");
        }
    }

    Ok(Json(json!({ "received": true })))
}

/// Checkout session events carry the session id at `data.object.id`.
fn session_id(event: &Value) -> Result<&str, ServiceError> {
    event
        .pointer("/data/object/id")
        .and_then(|v| v.as_str())
        .ok_or_else(|| {
            ServiceError::ValidationError("webhook payload has no session id".to_string())
        })
}

pub fn webhook_routes() -> Router<AppState> {
    Router::new().route("/stripe", post(stripe_webhook))
}
