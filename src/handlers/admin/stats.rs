use crate::{
    errors::ServiceError,
    handlers::{common::success_response, AppState},
};
use axum::{extract::State, response::IntoResponse, routing::get, Router};

/// Dashboard snapshot: entity counts, lifetime revenue, recent orders.
pub async fn get_stats(State(state): State<AppState>) -> Result<impl IntoResponse, ServiceError> {
    let stats = state.services.orders.stats().await?;
    Ok(success_response(stats))
}

pub fn admin_stats_routes() -> Router<AppState> {
    Router::new().route("/", get(get_stats))
}
