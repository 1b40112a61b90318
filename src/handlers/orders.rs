use super::common::success_response;
use crate::{auth::AuthUser, errors::ServiceError, handlers::AppState};
use axum::{extract::State, response::IntoResponse, routing::get, Router};

/// Order history for the calling account, newest first, items included.
#[utoipa::path(
    get,
    path = "/api/v1/orders/mine",
    responses(
        (status = 200, description = "Orders for the current user"),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse)
    ),
    tag = "orders"
)]
pub async fn my_orders(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<impl IntoResponse, ServiceError> {
    let orders = state.services.orders.list_for_user(user.user_id).await?;
    Ok(success_response(orders))
}

pub fn order_routes() -> Router<AppState> {
    Router::new().route("/mine", get(my_orders))
}
