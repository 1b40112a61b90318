use super::common::success_response;
use crate::{errors::ServiceError, handlers::AppState};
use axum::{
    extract::{Path, State},
    response::IntoResponse,
    routing::get,
    Router,
};

/// List the public catalog, popular offerings first.
#[utoipa::path(
    get,
    path = "/api/v1/products",
    responses(
        (status = 200, description = "Product list, popular first"),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse)
    ),
    tag = "products"
)]
pub async fn list_products(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ServiceError> {
    let products = state.services.products.list_public().await?;
    Ok(success_response(products))
}

/// Fetch a single product by UUID or slug.
#[utoipa::path(
    get,
    path = "/api/v1/products/:reference",
    params(("reference" = String, Path, description = "Product UUID or slug")),
    responses(
        (status = 200, description = "Product returned"),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "products"
)]
pub async fn get_product(
    State(state): State<AppState>,
    Path(reference): Path<String>,
) -> Result<impl IntoResponse, ServiceError> {
    let product = state
        .services
        .products
        .find_by_reference(&reference)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("Product '{}' not found", reference)))?;
    Ok(success_response(product))
}

pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_products))
        .route("/:reference", get(get_product))
}
