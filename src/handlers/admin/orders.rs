use crate::{
    entities::order::OrderStatus,
    errors::ServiceError,
    handlers::{
        common::{no_content_response, success_response},
        AppState,
    },
};
use axum::{
    extract::{Json, Path, State},
    response::IntoResponse,
    routing::{get, put},
    Router,
};
use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}

pub async fn list_orders(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ServiceError> {
    let orders = state.services.orders.list_all().await?;
    Ok(success_response(orders))
}

pub async fn update_order_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateStatusRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let status = OrderStatus::parse(&payload.status).ok_or_else(|| {
        ServiceError::ValidationError(format!("Unknown order status '{}'", payload.status))
    })?;
    let order = state.services.orders.update_status(id, status).await?;
    Ok(success_response(order))
}

pub async fn delete_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    state.services.orders.delete(id).await?;
    Ok(no_content_response())
}

pub fn admin_order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_orders))
        .route("/:id", put(update_order_status).delete(delete_order))
}
