use super::common::success_response;
use crate::{
    errors::ServiceError,
    handlers::AppState,
    services::checkout::{CheckoutRequest, CheckoutResponse},
};
use axum::{
    extract::{Json, State},
    http::HeaderMap,
    response::IntoResponse,
    routing::post,
    Router,
};
use tracing::info;

/// Start a Stripe Checkout session from the submitted cart.
///
/// Login is optional: a valid bearer token attaches the resulting order to
/// the account, an absent or invalid one leaves it anonymous.
#[utoipa::path(
    post,
    path = "/api/v1/checkout",
    request_body = CheckoutRequest,
    responses(
        (status = 200, description = "Session created", body = CheckoutResponse),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 500, description = "Payment provider unavailable", body = crate::errors::ErrorResponse)
    ),
    tag = "checkout"
)]
pub async fn create_checkout(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<CheckoutRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let user_id = state.auth.identify(&headers).map(|u| u.user_id);

    let response = state
        .services
        .checkout
        .create_checkout(payload, user_id)
        .await?;

    info!(session_id = %response.session_id, "checkout session created");
    Ok(success_response(response))
}

pub fn checkout_routes() -> Router<AppState> {
    Router::new().route("/", post(create_checkout))
}
